use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "odstag",
    version,
    about = "Spanish-language SDG text classifier with incremental retraining"
)]
pub struct Cli {
    /// Data directory (corpus, models, config)
    #[arg(long, env = "ODSTAG_DATA", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Train the first model version from the stored corpus
    Train(TrainArgs),
    /// Classify a JSON batch of texts against the active model
    Predict(PredictArgs),
    /// Merge labeled examples into the corpus and retrain
    Retrain(RetrainArgs),
    /// Show the normalized token sequence for each input text
    Normalize(NormalizeArgs),
    /// Show model and corpus health: version, labels, metrics
    Status,
    /// Start a newline-delimited JSON request loop on stdio
    Serve,
}

#[derive(Parser)]
pub struct TrainArgs {
    /// Retrain version 1 even if a model chain already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser)]
pub struct PredictArgs {
    /// JSON batch file (reads stdin when omitted)
    pub file: Option<PathBuf>,
}

#[derive(Parser)]
pub struct RetrainArgs {
    /// JSON batch file (reads stdin when omitted)
    pub file: Option<PathBuf>,
}

#[derive(Parser)]
pub struct NormalizeArgs {
    /// JSON batch file (reads stdin when omitted)
    pub file: Option<PathBuf>,
}
