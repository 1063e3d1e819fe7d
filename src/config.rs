use crate::OdsError;
use crate::coordinator::TrainParams;
use crate::normalize::{Language, NormalizerConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct OdstagConfig {
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub normalizer: NormalizerSection,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ModelSection {
    pub alpha: Option<f64>,
    pub accept_new_labels: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct NormalizerSection {
    pub language: Option<Language>,
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

/// Load config from ODSTAG_CONFIG env var, <data-dir>/config.toml, or defaults.
pub fn load_config(data_dir: &Path) -> Result<OdstagConfig, OdsError> {
    let path = config_path(data_dir);
    match path {
        Some(p) if p.exists() => {
            let content = std::fs::read_to_string(&p)?;
            let config: OdstagConfig = toml::from_str(&content)
                .map_err(|e| OdsError::Config(format!("{}: {e}", p.display())))?;
            validate_config(&config)?;
            log::debug!("config loaded from {}", p.display());
            Ok(config)
        }
        _ => Ok(OdstagConfig::default()),
    }
}

fn config_path(data_dir: &Path) -> Option<PathBuf> {
    if let Ok(p) = std::env::var("ODSTAG_CONFIG") {
        return Some(PathBuf::from(p));
    }
    Some(data_dir.join("config.toml"))
}

fn validate_config(config: &OdstagConfig) -> Result<(), OdsError> {
    if let Some(alpha) = config.model.alpha
        && !(alpha > 0.0 && alpha.is_finite())
    {
        return Err(OdsError::Config(format!(
            "model.alpha must be a positive finite number, got {alpha}"
        )));
    }
    Ok(())
}

/// Merge the [model] section with built-in defaults.
pub fn resolve_train_params(config: &OdstagConfig) -> TrainParams {
    TrainParams {
        alpha: config.model.alpha.unwrap_or(1.0),
        accept_new_labels: config.model.accept_new_labels.unwrap_or(true),
    }
}

/// Merge the [normalizer] section with built-in defaults.
pub fn resolve_normalizer_config(config: &OdstagConfig) -> NormalizerConfig {
    NormalizerConfig {
        language: config.normalizer.language.unwrap_or(Language::Spanish),
        extra_stopwords: config.normalizer.extra_stopwords.clone(),
    }
}
