//! Batch prediction over the active snapshot.

use crate::OdsError;
use crate::corpus;
use crate::registry::ModelRegistry;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub text: String,
    pub label: u32,
    pub confidence: f64,
}

pub struct PredictionService {
    registry: Arc<ModelRegistry>,
}

impl PredictionService {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        PredictionService { registry }
    }

    /// Classify a batch against one snapshot. The snapshot is pinned up
    /// front, so a publish landing mid-batch never splits the batch across
    /// versions, and a missing model fails the whole batch before any text
    /// is looked at.
    pub fn predict_batch(&self, texts: &[String]) -> Result<Vec<Prediction>, OdsError> {
        let Some(snapshot) = self.registry.get_active() else {
            return Err(OdsError::Unavailable(
                "no trained model; run `odstag train` or `odstag retrain` first".into(),
            ));
        };
        let pipeline = snapshot.pipeline();
        texts
            .iter()
            .map(|text| {
                let (label, confidence) = pipeline.classify(text)?;
                Ok(Prediction {
                    text: text.clone(),
                    label,
                    confidence,
                })
            })
            .collect()
    }
}

/// `predict` subcommand.
pub fn handle_predict(data_dir: &Path, file: Option<&Path>) -> Result<(), OdsError> {
    let raw = corpus::read_batch_source(file)?;
    let texts = corpus::texts_from_json(&raw)?;

    let registry = Arc::new(ModelRegistry::open(data_dir)?);
    let service = PredictionService::new(Arc::clone(&registry));
    let predictions = service.predict_batch(&texts)?;

    let json = serde_json::to_string(&predictions)?;
    println!("{json}");
    if let Some(v) = registry.active_version() {
        eprintln!(
            "odstag: {} prediction(s) from model v{v}",
            predictions.len()
        );
    }
    Ok(())
}
