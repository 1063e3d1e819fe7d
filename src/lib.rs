pub mod bayes;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod corpus;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod numword;
pub mod predict;
pub mod registry;
pub mod serve;
pub mod status;
pub mod stopwords;

#[derive(Debug)]
pub enum OdsError {
    /// Malformed caller input: bad schema, non-integer labels, empty batches.
    Validation(String),
    /// A required dependency is missing: no model published, corpus unreadable.
    Unavailable(String),
    /// The classifier could not be fitted on an otherwise valid corpus.
    Training(String),
    /// Classification failed even though a model is active.
    Prediction(String),
    Config(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl OdsError {
    /// Stable machine-readable kind, used in serve-mode error objects and
    /// for exit-code mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            OdsError::Validation(_) => "validation",
            OdsError::Unavailable(_) => "unavailable",
            OdsError::Training(_) => "training",
            OdsError::Prediction(_) => "prediction",
            OdsError::Config(_) => "config",
            OdsError::Io(_) => "io",
            OdsError::Json(_) => "json",
        }
    }

    /// The message alone, without the kind prefix `Display` adds.
    pub fn message(&self) -> String {
        match self {
            OdsError::Validation(msg)
            | OdsError::Unavailable(msg)
            | OdsError::Training(msg)
            | OdsError::Prediction(msg)
            | OdsError::Config(msg) => msg.clone(),
            OdsError::Io(e) => e.to_string(),
            OdsError::Json(e) => e.to_string(),
        }
    }
}

impl std::fmt::Display for OdsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OdsError::Validation(msg) => write!(f, "validation: {msg}"),
            OdsError::Unavailable(msg) => write!(f, "unavailable: {msg}"),
            OdsError::Training(msg) => write!(f, "training: {msg}"),
            OdsError::Prediction(msg) => write!(f, "prediction: {msg}"),
            OdsError::Config(msg) => write!(f, "config: {msg}"),
            OdsError::Io(e) => write!(f, "io: {e}"),
            OdsError::Json(e) => write!(f, "json: {e}"),
        }
    }
}

impl From<std::io::Error> for OdsError {
    fn from(e: std::io::Error) -> Self {
        OdsError::Io(e)
    }
}

impl From<serde_json::Error> for OdsError {
    fn from(e: serde_json::Error) -> Self {
        OdsError::Json(e)
    }
}
