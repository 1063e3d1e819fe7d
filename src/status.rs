use crate::OdsError;
use crate::corpus::CorpusStore;
use crate::metrics::Metrics;
use crate::model::{self, ModelSnapshot};
use crate::registry::ModelRegistry;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub data_dir: String,
    pub model: Option<ModelStatus>,
    pub corpus_examples: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub version: u32,
    pub trained_at: u64,
    pub labels: Vec<u32>,
    pub vocabulary: usize,
    pub metrics: Metrics,
}

/// What is active and what is on disk, shared by the CLI report and the
/// serve `status` op.
pub fn report(data_dir: &Path, registry: &ModelRegistry) -> StatusReport {
    let model = registry.get_active().map(|s| ModelStatus {
        version: s.version,
        trained_at: s.trained_at,
        labels: s.label_domain().to_vec(),
        vocabulary: s.classifier.vocabulary_size(),
        metrics: s.metrics,
    });
    let corpus_examples = CorpusStore::new(data_dir).load().ok().map(|c| c.len());
    StatusReport {
        data_dir: data_dir.display().to_string(),
        model,
        corpus_examples,
    }
}

pub fn handle_status(data_dir: &Path) -> Result<(), OdsError> {
    if !data_dir.exists() {
        eprintln!("odstag: no data at {}", data_dir.display());
        return Ok(());
    }

    let registry = ModelRegistry::open(data_dir)?;
    let r = report(data_dir, &registry);

    eprintln!("odstag: data dir — {}", r.data_dir);

    match &r.model {
        Some(m) => {
            let file = model::model_dir(data_dir).join(ModelSnapshot::file_name(m.version));
            let size = std::fs::metadata(&file).map(|md| md.len()).ok();
            match size {
                Some(s) => eprintln!("odstag: model — v{} ({})", m.version, fmt_size(s)),
                None => eprintln!("odstag: model — v{}", m.version),
            }
            eprintln!("odstag: trained — {}", format_epoch_date(m.trained_at));
            let labels: Vec<String> = m.labels.iter().map(|l| l.to_string()).collect();
            eprintln!(
                "odstag: labels — {} ({})",
                m.labels.len(),
                labels.join(", ")
            );
            eprintln!("odstag: vocabulary — {} stem(s)", m.vocabulary);
            eprintln!(
                "odstag: training fit — precision {:.3}, recall {:.3}, f1 {:.3}",
                m.metrics.precision, m.metrics.recall, m.metrics.f1
            );
        }
        None => eprintln!("odstag: model — none (seed corpus.json, then run `odstag train`)"),
    }

    match r.corpus_examples {
        Some(n) => eprintln!("odstag: corpus — {n} example(s)"),
        None => eprintln!("odstag: corpus — none"),
    }

    Ok(())
}

fn format_epoch_date(epoch_secs: u64) -> String {
    // Convert epoch seconds to YYYY-MM-DD
    // Days from unix epoch, then civil date
    let days = (epoch_secs / 86400) as i64;
    let (y, m, d) = civil_from_days(days);
    format!("{y:04}-{m:02}-{d:02}")
}

/// Convert days since 1970-01-01 to (year, month, day).
/// Algorithm from Howard Hinnant's chrono-compatible date library.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

fn fmt_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OdstagConfig;
    use crate::coordinator::RetrainCoordinator;
    use crate::corpus::LabeledExample;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn report_on_empty_dir() {
        let dir = TempDir::new().unwrap();
        let registry = ModelRegistry::open(dir.path()).unwrap();
        let r = report(dir.path(), &registry);
        assert!(r.model.is_none());
        assert!(r.corpus_examples.is_none());
    }

    #[test]
    fn report_after_training() {
        let dir = TempDir::new().unwrap();
        CorpusStore::new(dir.path())
            .save(&[
                LabeledExample {
                    text: "el agua del río está limpia".into(),
                    label: 6,
                },
                LabeledExample {
                    text: "paneles de energía solar".into(),
                    label: 7,
                },
            ])
            .unwrap();
        let registry = Arc::new(ModelRegistry::open(dir.path()).unwrap());
        let coordinator =
            RetrainCoordinator::new(dir.path(), &OdstagConfig::default(), Arc::clone(&registry));
        coordinator.bootstrap(false).unwrap();

        let r = report(dir.path(), &registry);
        let m = r.model.unwrap();
        assert_eq!(m.version, 1);
        assert_eq!(m.labels, vec![6, 7]);
        assert!(m.vocabulary > 0);
        assert_eq!(r.corpus_examples, Some(2));
    }

    #[test]
    fn epoch_dates_render_as_civil_dates() {
        assert_eq!(format_epoch_date(0), "1970-01-01");
        assert_eq!(format_epoch_date(1_700_000_000), "2023-11-14");
    }
}
