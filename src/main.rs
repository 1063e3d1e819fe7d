use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use odstag::OdsError;
use odstag::cli::{Cli, Command};
use odstag::{config, coordinator, normalize, predict, serve, status};

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".odstag")
}

fn run() -> Result<(), OdsError> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let cfg = config::load_config(&data_dir)?;

    match cli.command {
        Command::Train(args) => coordinator::handle_train(&data_dir, &cfg, args.force),
        Command::Predict(args) => predict::handle_predict(&data_dir, args.file.as_deref()),
        Command::Retrain(args) => coordinator::handle_retrain(&data_dir, &cfg, args.file.as_deref()),
        Command::Normalize(args) => normalize::handle_normalize(&cfg, args.file.as_deref()),
        Command::Status => status::handle_status(&data_dir),
        Command::Serve => serve::handle_serve(&data_dir, &cfg),
    }
}

/// Exit codes mirror the error taxonomy: callers can tell bad input (2)
/// from a missing model (3) and from pipeline failures (4, 5).
fn exit_code(e: &OdsError) -> u8 {
    match e {
        OdsError::Validation(_) => 2,
        OdsError::Unavailable(_) => 3,
        OdsError::Training(_) => 4,
        OdsError::Prediction(_) => 5,
        _ => 1,
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("odstag: {e}");
            ExitCode::from(exit_code(&e))
        }
    }
}
