//! Line-delimited JSON request loop over stdio.
//!
//! One request per line, one response line per request. Each request runs on
//! its own thread: predictions proceed concurrently against the pinned
//! snapshot while retrains queue on the coordinator. Responses may therefore
//! arrive out of submission order; callers correlate by the echoed `id`.

use crate::OdsError;
use crate::config::OdstagConfig;
use crate::coordinator::RetrainCoordinator;
use crate::corpus;
use crate::predict::PredictionService;
use crate::registry::ModelRegistry;
use crate::status;
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

pub struct OdstagServer {
    predictions: PredictionService,
    coordinator: RetrainCoordinator,
    registry: Arc<ModelRegistry>,
    data_dir: PathBuf,
}

// --- Core request logic (pub for testing) ---

impl OdstagServer {
    pub fn new(data_dir: &Path, cfg: &OdstagConfig, registry: Arc<ModelRegistry>) -> Self {
        OdstagServer {
            predictions: PredictionService::new(Arc::clone(&registry)),
            coordinator: RetrainCoordinator::new(data_dir, cfg, Arc::clone(&registry)),
            registry,
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// One request line in, one response line out. Never panics on caller
    /// input; every failure becomes an error envelope with the echoed id.
    pub fn handle_line(&self, line: &str) -> String {
        let (id, outcome) = match serde_json::from_str::<Value>(line) {
            Ok(request) => {
                let id = request.get("id").cloned().unwrap_or(Value::Null);
                (id, self.dispatch(&request))
            }
            Err(e) => (
                Value::Null,
                Err(OdsError::Validation(format!(
                    "request is not valid JSON: {e}"
                ))),
            ),
        };
        let response = match outcome {
            Ok(result) => serde_json::json!({"id": id, "ok": true, "result": result}),
            Err(e) => serde_json::json!({
                "id": id,
                "ok": false,
                "error": {"kind": e.kind(), "message": e.message()},
            }),
        };
        response.to_string()
    }

    fn dispatch(&self, request: &Value) -> Result<Value, OdsError> {
        let op = request
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| OdsError::Validation("missing \"op\" string field".into()))?;
        match op {
            "predict" => self.do_predict(request.get("texts")),
            "retrain" => self.do_retrain(request.get("examples")),
            "status" => self.do_status(),
            other => Err(OdsError::Validation(format!("unknown op {other:?}"))),
        }
    }

    pub fn do_predict(&self, texts: Option<&Value>) -> Result<Value, OdsError> {
        let texts =
            texts.ok_or_else(|| OdsError::Validation("missing \"texts\" field".into()))?;
        let raw = serde_json::to_string(texts)?;
        let texts = corpus::texts_from_json(&raw)?;
        let predictions = self.predictions.predict_batch(&texts)?;
        Ok(serde_json::to_value(predictions)?)
    }

    pub fn do_retrain(&self, examples: Option<&Value>) -> Result<Value, OdsError> {
        let examples =
            examples.ok_or_else(|| OdsError::Validation("missing \"examples\" field".into()))?;
        let raw = serde_json::to_string(examples)?;
        let outcome = self.coordinator.retrain(&raw)?;
        Ok(serde_json::to_value(outcome.metrics)?)
    }

    pub fn do_status(&self) -> Result<Value, OdsError> {
        Ok(serde_json::to_value(status::report(
            &self.data_dir,
            &self.registry,
        ))?)
    }
}

// --- Transport ---

/// `serve` subcommand. Reads requests until EOF, then drains in-flight work
/// before exiting.
pub fn handle_serve(data_dir: &Path, cfg: &OdstagConfig) -> Result<(), OdsError> {
    let registry = Arc::new(ModelRegistry::open(data_dir)?);
    if registry.get_active().is_none() {
        log::warn!("no model on disk; predict requests fail until a retrain lands");
    }
    let server = Arc::new(OdstagServer::new(data_dir, cfg, registry));
    let stdout = Arc::new(Mutex::new(io::stdout()));

    eprintln!("odstag: serve starting");
    let mut workers: Vec<JoinHandle<()>> = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        workers.retain(|w| !w.is_finished());
        let server = Arc::clone(&server);
        let stdout = Arc::clone(&stdout);
        workers.push(thread::spawn(move || {
            let response = server.handle_line(&line);
            let mut out = stdout.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = writeln!(out, "{response}");
            let _ = out.flush();
        }));
    }
    for w in workers {
        let _ = w.join();
    }
    eprintln!("odstag: serve stopped");
    Ok(())
}
