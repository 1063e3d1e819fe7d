//! Model snapshots: immutable, versioned, persisted as JSON.
//!
//! A snapshot bundles everything prediction needs — normalizer
//! configuration, trained classifier state, version, training time, and the
//! metrics measured at training. Snapshots are never mutated; retraining
//! produces a new one under a new version, and each version persists under
//! its own file name, so publishing never rewrites an earlier model.

use crate::OdsError;
use crate::bayes::MultinomialNb;
use crate::metrics::Metrics;
use crate::normalize::{self, NormalizerConfig, TextNormalizer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub version: u32,
    /// Unix seconds at fit time.
    pub trained_at: u64,
    pub normalizer: NormalizerConfig,
    pub classifier: MultinomialNb,
    pub metrics: Metrics,
}

impl ModelSnapshot {
    pub fn label_domain(&self) -> &[u32] {
        &self.classifier.classes
    }

    /// Build the reusable classification pipeline for this snapshot. The
    /// pipeline borrows the snapshot, so a whole batch classifies against
    /// one immutable model even while a newer version gets published.
    pub fn pipeline(&self) -> SnapshotPipeline<'_> {
        SnapshotPipeline {
            snapshot: self,
            normalizer: TextNormalizer::new(self.normalizer.clone()),
            stemmer: self.normalizer.language.stemmer(),
        }
    }

    pub fn file_name(version: u32) -> String {
        format!("model.v{version}.json")
    }

    /// Persist under the versioned name, creating the models directory on
    /// first use.
    pub fn save(&self, data_dir: &Path) -> Result<PathBuf, OdsError> {
        let dir = model_dir(data_dir);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(Self::file_name(self.version));
        std::fs::write(&path, serde_json::to_string(self)?)?;
        log::info!("model v{} persisted to {}", self.version, path.display());
        Ok(path)
    }

    /// Load the newest persisted snapshot. `Ok(None)` means no model exists
    /// yet — an expected state, not an error. A present-but-broken file is
    /// reported instead of silently serving an older version.
    pub fn load_latest(data_dir: &Path) -> Result<Option<ModelSnapshot>, OdsError> {
        let dir = model_dir(data_dir);
        if !dir.exists() {
            return Ok(None);
        }

        let mut newest: Option<(u32, PathBuf)> = None;
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(version) = parse_version(&name.to_string_lossy())
                && newest.as_ref().is_none_or(|(v, _)| version > *v)
            {
                newest = Some((version, entry.path()));
            }
        }
        let Some((version, path)) = newest else {
            return Ok(None);
        };

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| OdsError::Unavailable(format!("model {}: {e}", path.display())))?;
        let snapshot: ModelSnapshot = serde_json::from_str(&raw)
            .map_err(|e| OdsError::Unavailable(format!("model {}: {e}", path.display())))?;
        if snapshot.version != version || !snapshot.classifier.is_coherent() {
            return Err(OdsError::Unavailable(format!(
                "model {}: inconsistent snapshot state",
                path.display()
            )));
        }
        log::info!(
            "model v{} loaded: {} label(s), {} vocabulary term(s)",
            snapshot.version,
            snapshot.label_domain().len(),
            snapshot.classifier.vocabulary_size()
        );
        Ok(Some(snapshot))
    }
}

pub fn model_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("models")
}

/// "model.v12.json" → 12
fn parse_version(name: &str) -> Option<u32> {
    name.strip_prefix("model.v")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub struct SnapshotPipeline<'a> {
    snapshot: &'a ModelSnapshot,
    normalizer: TextNormalizer,
    stemmer: rust_stemmers::Stemmer,
}

impl SnapshotPipeline<'_> {
    /// normalize → stem → classify. Deterministic for a given snapshot.
    pub fn classify(&self, text: &str) -> Result<(u32, f64), OdsError> {
        let tokens = self.normalizer.normalize(text);
        let stemmed = normalize::stem_with(&self.stemmer, &tokens);
        self.snapshot.classifier.predict(&stemmed)
    }
}
