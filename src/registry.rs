//! Shared model registry: the single authority for the active snapshot.

use crate::OdsError;
use crate::model::ModelSnapshot;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Multi-reader, single-writer holder of the active model. Readers clone the
/// Arc out and release the lock immediately, so an in-flight prediction
/// batch keeps its snapshot while `publish` swaps in a newer version.
pub struct ModelRegistry {
    active: RwLock<Option<Arc<ModelSnapshot>>>,
}

impl ModelRegistry {
    pub fn new(initial: Option<ModelSnapshot>) -> Self {
        ModelRegistry {
            active: RwLock::new(initial.map(Arc::new)),
        }
    }

    /// Registry seeded from the newest persisted snapshot, if any.
    pub fn open(data_dir: &Path) -> Result<Self, OdsError> {
        Ok(ModelRegistry::new(ModelSnapshot::load_latest(data_dir)?))
    }

    /// `None` is the "model unavailable" state — before any training has
    /// published a snapshot, that is a value, not an error.
    pub fn get_active(&self) -> Option<Arc<ModelSnapshot>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Atomically replace the active snapshot. Readers observe either the
    /// old or the new version, never anything in between.
    pub fn publish(&self, snapshot: ModelSnapshot) -> Arc<ModelSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn active_version(&self) -> Option<u32> {
        self.get_active().map(|s| s.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bayes::MultinomialNb;
    use crate::metrics::Metrics;
    use crate::normalize::NormalizerConfig;

    fn mk(version: u32) -> ModelSnapshot {
        ModelSnapshot {
            version,
            trained_at: u64::from(version),
            normalizer: NormalizerConfig::default(),
            classifier: MultinomialNb::fit(&[vec!["agua".into()]], &[6], 1.0).unwrap(),
            metrics: Metrics {
                precision: 1.0,
                recall: 1.0,
                f1: 1.0,
            },
        }
    }

    #[test]
    fn starts_unavailable_until_first_publish() {
        let registry = ModelRegistry::new(None);
        assert!(registry.get_active().is_none());
        assert_eq!(registry.active_version(), None);

        registry.publish(mk(1));
        assert_eq!(registry.active_version(), Some(1));
    }

    #[test]
    fn readers_keep_their_snapshot_across_a_publish() {
        let registry = ModelRegistry::new(Some(mk(1)));
        let held = registry.get_active().unwrap();

        registry.publish(mk(2));

        // the batch that grabbed v1 still computes against v1
        assert_eq!(held.version, 1);
        assert_eq!(registry.get_active().unwrap().version, 2);
    }

    #[test]
    fn publish_is_atomic_under_concurrent_reads() {
        let registry = Arc::new(ModelRegistry::new(Some(mk(1))));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..2000 {
                        let snap = registry.get_active().expect("never unpublished");
                        assert!(snap.classifier.is_coherent());
                        // versions can only move forward
                        assert!(snap.version >= last, "{} < {last}", snap.version);
                        last = snap.version;
                    }
                })
            })
            .collect();

        for v in 2..=20 {
            registry.publish(mk(v));
        }
        for handle in readers {
            handle.join().unwrap();
        }
        assert_eq!(registry.active_version(), Some(20));
    }
}
