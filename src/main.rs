// Student performance predictor - main.rs
// Loads layered configuration, installs logging, then hands off to the CLI.

use clap::Parser;
use std::process::exit;
use student_perf::cli::{dispatch, Cli};
use student_perf::config::load_config;
use student_perf::telemetry::init_tracing;
use tracing::error;

fn main() {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            exit(1);
        }
    };

    init_tracing(&config.log_level);

    if let Err(e) = dispatch(cli, config) {
        error!("{e:#}");
        exit(1);
    }
}
