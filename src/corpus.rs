//! Labeled-example storage and batch validation.
//!
//! The corpus is one JSON array in corpus order. Updates rewrite the whole
//! file; merge is strict append with no deduplication — resubmitting a batch
//! produces duplicates, by contract.

use crate::OdsError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub text: String,
    pub label: u32,
}

/// Read a JSON batch from FILE, or stdin when no file is given.
pub fn read_batch_source(file: Option<&Path>) -> Result<String, OdsError> {
    match file {
        Some(p) => Ok(std::fs::read_to_string(p)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn batch_array(raw: &str) -> Result<Vec<Value>, OdsError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| OdsError::Validation(format!("batch is not valid JSON: {e}")))?;
    let Value::Array(items) = value else {
        return Err(OdsError::Validation("batch must be a JSON array".into()));
    };
    if items.is_empty() {
        return Err(OdsError::Validation("batch must not be empty".into()));
    }
    Ok(items)
}

/// Parse a prediction batch: a non-empty array of strings or of objects
/// carrying a `"text"` string field.
pub fn texts_from_json(raw: &str) -> Result<Vec<String>, OdsError> {
    let items = batch_array(raw)?;
    let mut texts = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let text = match item {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => obj.get("text").and_then(Value::as_str).ok_or_else(|| {
                OdsError::Validation(format!("element {i}: missing \"text\" string field"))
            })?,
            _ => {
                return Err(OdsError::Validation(format!(
                    "element {i}: expected a string or an object with a \"text\" field"
                )));
            }
        };
        texts.push(text.to_string());
    }
    Ok(texts)
}

/// Parse and validate a retrain batch. Every element must carry a `"text"`
/// string and an integer `"label"`; one bad element rejects the whole batch.
pub fn examples_from_json(raw: &str) -> Result<Vec<LabeledExample>, OdsError> {
    let items = batch_array(raw)?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| validate_example(i, item).map_err(OdsError::Validation))
        .collect()
}

/// Schema check for one element. Labels must be JSON integers — strings and
/// floats are rejected, never coerced.
fn validate_example(i: usize, item: &Value) -> Result<LabeledExample, String> {
    let obj = item
        .as_object()
        .ok_or_else(|| format!("element {i}: expected an object"))?;
    let text = obj
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("element {i}: missing \"text\" string field"))?;
    let label = obj
        .get("label")
        .ok_or_else(|| format!("element {i}: missing \"label\" field"))?;
    let label = label
        .as_u64()
        .ok_or_else(|| format!("element {i}: \"label\" must be a non-negative integer, got {label}"))?;
    let label = u32::try_from(label)
        .map_err(|_| format!("element {i}: \"label\" {label} out of range"))?;
    Ok(LabeledExample {
        text: text.to_string(),
        label,
    })
}

pub struct CorpusStore {
    path: PathBuf,
}

impl CorpusStore {
    pub fn new(data_dir: &Path) -> Self {
        CorpusStore {
            path: data_dir.join("corpus.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full corpus, re-validating element-wise so a hand-edited
    /// file reports the offending index. Any problem here is a dependency
    /// failure, not the caller's fault.
    pub fn load(&self) -> Result<Vec<LabeledExample>, OdsError> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| self.unavailable(format!("{e}")))?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| self.unavailable(format!("{e}")))?;
        let Value::Array(items) = value else {
            return Err(self.unavailable("not a JSON array".into()));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| validate_example(i, item).map_err(|msg| self.unavailable(msg)))
            .collect()
    }

    /// Serialize the whole collection and replace the file. No transactional
    /// append; crash-safety layering is the caller's concern.
    pub fn save(&self, examples: &[LabeledExample]) -> Result<(), OdsError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| self.unavailable(format!("{e}")))?;
        }
        let json = serde_json::to_string_pretty(examples)?;
        std::fs::write(&self.path, json).map_err(|e| self.unavailable(format!("{e}")))?;
        log::info!("corpus persisted: {} example(s)", examples.len());
        Ok(())
    }

    fn unavailable(&self, msg: String) -> OdsError {
        OdsError::Unavailable(format!("corpus {}: {msg}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ex(text: &str, label: u32) -> LabeledExample {
        LabeledExample {
            text: text.into(),
            label,
        }
    }

    // --- batch parsing ---

    #[test]
    fn texts_accept_strings_and_objects() {
        let texts = texts_from_json(r#"["agua limpia", {"text": "energía solar"}]"#).unwrap();
        assert_eq!(texts, vec!["agua limpia", "energía solar"]);
    }

    #[test]
    fn texts_reject_empty_and_non_array() {
        assert!(matches!(
            texts_from_json("[]"),
            Err(OdsError::Validation(_))
        ));
        assert!(matches!(
            texts_from_json(r#"{"text": "x"}"#),
            Err(OdsError::Validation(_))
        ));
        assert!(matches!(
            texts_from_json("not json"),
            Err(OdsError::Validation(_))
        ));
    }

    #[test]
    fn texts_reject_element_without_text() {
        let err = texts_from_json(r#"[{"text": "ok"}, {"texto": "mal"}]"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("element 1"), "{msg}");
    }

    #[test]
    fn examples_parse_valid_batch() {
        let batch = examples_from_json(r#"[{"text": "agua", "label": 6}]"#).unwrap();
        assert_eq!(batch, vec![ex("agua", 6)]);
    }

    #[test]
    fn examples_reject_missing_label_by_index() {
        let err =
            examples_from_json(r#"[{"text": "a", "label": 1}, {"text": "b"}]"#).unwrap_err();
        assert!(err.to_string().contains("element 1"), "{err}");
    }

    #[test]
    fn examples_never_coerce_labels() {
        for bad in [
            r#"[{"text": "a", "label": "4"}]"#,
            r#"[{"text": "a", "label": 4.5}]"#,
            r#"[{"text": "a", "label": -1}]"#,
            r#"[{"text": "a", "label": null}]"#,
        ] {
            let err = examples_from_json(bad).unwrap_err();
            assert!(matches!(err, OdsError::Validation(_)), "{bad}");
        }
    }

    // --- store ---

    #[test]
    fn save_then_load_preserves_order_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = CorpusStore::new(dir.path());

        store.save(&[ex("primero", 1), ex("segundo", 2)]).unwrap();
        let mut corpus = store.load().unwrap();

        // append merge: duplicates stay, order stays
        corpus.extend([ex("primero", 1)]);
        store.save(&corpus).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![ex("primero", 1), ex("segundo", 2), ex("primero", 1)]);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = CorpusStore::new(dir.path());
        assert!(matches!(store.load(), Err(OdsError::Unavailable(_))));
    }

    #[test]
    fn broken_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = CorpusStore::new(dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(OdsError::Unavailable(_))));
    }

    #[test]
    fn corpus_with_bad_element_reports_index() {
        let dir = TempDir::new().unwrap();
        let store = CorpusStore::new(dir.path());
        std::fs::write(store.path(), r#"[{"text": "a", "label": 1}, {"text": "b"}]"#).unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(&err, OdsError::Unavailable(msg) if msg.contains("element 1")));
    }
}
