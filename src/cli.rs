use crate::artifacts::ModelArtifacts;
use crate::config::AppConfig;
use crate::gateway::InferenceGateway;
use crate::history::{HistoryEntry, PredictionHistory};
use crate::input_validator::InputValidator;
use crate::report::PredictionReport;
use crate::web::{build_router, AppState};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

/// Top-level CLI interface
#[derive(Parser)]
#[command(
    name = "student_perf",
    version = "0.1.0",
    about = "Predict a student's performance category from three exam scores"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the performance category for one student
    Predict {
        #[arg(long, default_value_t = 70)]
        math: i32,
        #[arg(long, default_value_t = 90)]
        reading: i32,
        #[arg(long, default_value_t = 67)]
        writing: i32,
        /// "female" or "male", case-insensitive
        #[arg(long, default_value = "female")]
        gender: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Append the prediction to the history store
        #[arg(long)]
        record: bool,
    },

    /// Serve the HTTP API (predict, history, health)
    Serve {
        /// Host/IP to bind, defaults to the configured host
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, defaults to the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show the most recent recorded predictions
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the loaded feature schema
    Schema,

    /// Print the effective configuration as TOML
    Config,
}

fn load_gateway(cfg: &AppConfig) -> anyhow::Result<InferenceGateway> {
    let artifacts = ModelArtifacts::load(&cfg.artifacts)
        .context("model artifacts are required; check the artifacts section of the config")?;
    let gateway = InferenceGateway::new(artifacts);
    gateway
        .check_compatibility()
        .context("model artifacts do not agree with each other")?;
    Ok(gateway)
}

fn open_history(cfg: &AppConfig) -> anyhow::Result<PredictionHistory> {
    PredictionHistory::open(&cfg.history.path)
        .with_context(|| format!("failed to open history store at {}", cfg.history.path))
}

pub fn dispatch(cli: Cli, cfg: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Predict {
            math,
            reading,
            writing,
            gender,
            json,
            record,
        } => {
            let input = InputValidator::new().raw_input(math, reading, writing, &gender)?;
            let gateway = load_gateway(&cfg)?;

            let features = input.derive();
            let prediction = gateway.predict(&features)?;
            let report = PredictionReport::new(&features, &prediction, cfg.report.gauge_reference);

            if record {
                let history = open_history(&cfg)?;
                history.append(&HistoryEntry::new(&input, features.average_score, &prediction))?;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| cfg.server.host.clone());
            let port = port.unwrap_or(cfg.server.port);
            anyhow::ensure!(port != 0, "port cannot be 0");
            let addr = format!("{host}:{port}");

            let gateway = load_gateway(&cfg)?;
            let history = if cfg.history.enabled {
                Some(open_history(&cfg)?)
            } else {
                None
            };
            let app = build_router(AppState::new(gateway, history, cfg.report.gauge_reference));

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to build Tokio runtime")?;

            rt.block_on(async move {
                let listener = tokio::net::TcpListener::bind(&addr)
                    .await
                    .with_context(|| format!("failed to bind {addr}"))?;
                info!("HTTP server listening on http://{addr}");
                axum::serve(listener, app).await.context("server error")
            })?;
        }
        Commands::History { limit } => {
            let history = open_history(&cfg)?;
            let entries = history.recent(limit)?;
            if entries.is_empty() {
                println!("No predictions recorded yet.");
            }
            for entry in entries {
                println!(
                    "{}  {:>3} {:>3} {:>3}  {:<6}  avg {:>6.2}  {}",
                    entry.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.math_score,
                    entry.reading_score,
                    entry.writing_score,
                    entry.gender,
                    entry.average_score,
                    entry.label
                );
            }
        }
        Commands::Schema => {
            let schema = crate::schema::FeatureSchema::from_file(
                std::path::Path::new(&cfg.artifacts.dir).join(&cfg.artifacts.features_file),
            )?;
            for (i, column) in schema.columns().iter().enumerate() {
                println!("{i:>2}  {column}");
            }
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
    }
    Ok(())
}
