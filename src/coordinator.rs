//! Retraining: validate, merge, persist, refit, evaluate, publish.
//!
//! The order is the whole contract here. The merged corpus is persisted
//! before any training starts, so a failed fit never loses submitted
//! examples; the new snapshot is persisted and published only after fit and
//! evaluation succeed, so a failed fit never disturbs the active model.

use crate::OdsError;
use crate::bayes::MultinomialNb;
use crate::config::{self, OdstagConfig};
use crate::corpus::{self, CorpusStore, LabeledExample};
use crate::metrics::{self, Metrics};
use crate::model::{self, ModelSnapshot};
use crate::normalize::{self, NormalizerConfig, TextNormalizer};
use crate::registry::ModelRegistry;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Resolved [model] settings.
#[derive(Debug, Clone, Copy)]
pub struct TrainParams {
    pub alpha: f64,
    pub accept_new_labels: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RetrainOutcome {
    pub version: u32,
    pub corpus_size: usize,
    /// Training-set fit, support-weighted. This is the wire response;
    /// version and corpus size travel through logs and `status` instead.
    pub metrics: Metrics,
}

pub struct RetrainCoordinator {
    registry: Arc<ModelRegistry>,
    store: CorpusStore,
    normalizer_config: NormalizerConfig,
    params: TrainParams,
    data_dir: PathBuf,
    retrain_lock: Mutex<()>,
}

impl RetrainCoordinator {
    pub fn new(data_dir: &Path, cfg: &OdstagConfig, registry: Arc<ModelRegistry>) -> Self {
        RetrainCoordinator {
            registry,
            store: CorpusStore::new(data_dir),
            normalizer_config: config::resolve_normalizer_config(cfg),
            params: config::resolve_train_params(cfg),
            data_dir: data_dir.to_path_buf(),
            retrain_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Merge a raw JSON batch of labeled examples into the corpus and refit
    /// from scratch on the union. At most one retrain runs at a time;
    /// concurrent callers queue. Predictions keep using the active snapshot
    /// until the publish at the very end.
    pub fn retrain(&self, raw_batch: &str) -> Result<RetrainOutcome, OdsError> {
        let _guard = self
            .retrain_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let batch = corpus::examples_from_json(raw_batch)?;
        self.check_label_policy(&batch)?;

        let mut merged = self.store.load()?;

        // strict append, duplicates and all — resubmission is the caller's
        // prerogative, dedup would silently change label weighting
        merged.extend(batch);

        // persist before fitting: the union must survive a failed training
        self.store.save(&merged)?;

        let snapshot = self.fit_snapshot(&merged, self.next_version())?;
        let outcome = RetrainOutcome {
            version: snapshot.version,
            corpus_size: merged.len(),
            metrics: snapshot.metrics,
        };
        snapshot.save(&self.data_dir)?;
        self.registry.publish(snapshot);
        log::info!(
            "retrain complete: v{} over {} example(s), f1 {:.4}",
            outcome.version,
            outcome.corpus_size,
            outcome.metrics.f1
        );
        Ok(outcome)
    }

    /// `train`: fit the already-persisted corpus as the next version without
    /// touching the corpus. Refuses to run over an existing chain unless
    /// forced.
    pub fn bootstrap(&self, force: bool) -> Result<RetrainOutcome, OdsError> {
        let _guard = self
            .retrain_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(v) = self.registry.active_version()
            && !force
        {
            return Err(OdsError::Validation(format!(
                "model already trained (v{v}); pass --force to fit a new version"
            )));
        }

        let corpus = self.store.load()?;
        let snapshot = self.fit_snapshot(&corpus, self.next_version())?;
        let outcome = RetrainOutcome {
            version: snapshot.version,
            corpus_size: corpus.len(),
            metrics: snapshot.metrics,
        };
        snapshot.save(&self.data_dir)?;
        self.registry.publish(snapshot);
        log::info!(
            "trained v{} on {} example(s), f1 {:.4}",
            outcome.version,
            outcome.corpus_size,
            outcome.metrics.f1
        );
        Ok(outcome)
    }

    /// Unseen labels are either an explicitly accepted domain growth or a
    /// validation failure — never a silent coercion.
    fn check_label_policy(&self, batch: &[LabeledExample]) -> Result<(), OdsError> {
        let Some(active) = self.registry.get_active() else {
            return Ok(());
        };
        let known = active.label_domain();
        let mut unseen: Vec<u32> = batch
            .iter()
            .map(|e| e.label)
            .filter(|l| !known.contains(l))
            .collect();
        unseen.sort_unstable();
        unseen.dedup();
        if unseen.is_empty() {
            return Ok(());
        }
        if self.params.accept_new_labels {
            log::info!("label domain grows: accepting new label(s) {unseen:?}");
            Ok(())
        } else {
            Err(OdsError::Validation(format!(
                "batch introduces unknown label(s) {unseen:?} and accept_new_labels is off"
            )))
        }
    }

    /// Normalize, stem, fit from scratch, and evaluate on the training set.
    fn fit_snapshot(
        &self,
        corpus: &[LabeledExample],
        version: u32,
    ) -> Result<ModelSnapshot, OdsError> {
        let normalizer = TextNormalizer::new(self.normalizer_config.clone());
        let stemmer = self.normalizer_config.language.stemmer();
        let docs: Vec<Vec<String>> = corpus
            .iter()
            .map(|ex| normalize::stem_with(&stemmer, &normalizer.normalize(&ex.text)))
            .collect();
        let labels: Vec<u32> = corpus.iter().map(|ex| ex.label).collect();

        let classifier = MultinomialNb::fit(&docs, &labels, self.params.alpha)?;

        let predicted = docs
            .iter()
            .map(|doc| classifier.predict(doc).map(|(label, _)| label))
            .collect::<Result<Vec<u32>, _>>()?;
        let metrics = metrics::evaluate(&labels, &predicted);

        Ok(ModelSnapshot {
            version,
            trained_at: model::now_epoch(),
            normalizer: self.normalizer_config.clone(),
            classifier,
            metrics,
        })
    }

    fn next_version(&self) -> u32 {
        self.registry.active_version().unwrap_or(0) + 1
    }
}

/// `retrain` subcommand.
pub fn handle_retrain(
    data_dir: &Path,
    cfg: &OdstagConfig,
    file: Option<&Path>,
) -> Result<(), OdsError> {
    let raw = corpus::read_batch_source(file)?;
    let registry = Arc::new(ModelRegistry::open(data_dir)?);
    let coordinator = RetrainCoordinator::new(data_dir, cfg, registry);
    let outcome = coordinator.retrain(&raw)?;

    let json = serde_json::to_string(&outcome.metrics)?;
    println!("{json}");
    eprintln!(
        "odstag: model v{} active, corpus at {} example(s)",
        outcome.version, outcome.corpus_size
    );
    Ok(())
}

/// `train` subcommand.
pub fn handle_train(data_dir: &Path, cfg: &OdstagConfig, force: bool) -> Result<(), OdsError> {
    let registry = Arc::new(ModelRegistry::open(data_dir)?);
    let coordinator = RetrainCoordinator::new(data_dir, cfg, registry);
    let outcome = coordinator.bootstrap(force)?;

    let json = serde_json::to_string(&serde_json::json!({
        "version": outcome.version,
        "precision": outcome.metrics.precision,
        "recall": outcome.metrics.recall,
        "f1": outcome.metrics.f1,
    }))?;
    println!("{json}");
    eprintln!(
        "odstag: trained v{} on {} example(s)",
        outcome.version, outcome.corpus_size
    );
    Ok(())
}
