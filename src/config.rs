// Layered runtime configuration: built-in defaults, then a TOML file, then
// STUDENT_PERF_* environment variables.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::errors::{PredictError, PredictResult};

/// Default config file, overridden by `STUDENT_PERF_CONFIG`.
pub const DEFAULT_CONFIG_FILE: &str = "student_perf.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub dir: String,
    pub model_file: String,
    pub scaler_file: String,
    pub features_file: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            model_file: "student_model.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            features_file: "model_features.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "data/prediction_history".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Average score the gauge delta is measured against.
    pub gauge_reference: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            gauge_reference: 75.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn defaults() -> Self {
        Self {
            log_level: default_log_level(),
            ..Default::default()
        }
    }

    /// Check the values the serving path cannot recover from later.
    pub fn validate(&self) -> PredictResult<()> {
        if self.artifacts.dir.trim().is_empty() {
            return Err(PredictError::config("artifacts.dir must be set"));
        }
        for (key, value) in [
            ("artifacts.model_file", &self.artifacts.model_file),
            ("artifacts.scaler_file", &self.artifacts.scaler_file),
            ("artifacts.features_file", &self.artifacts.features_file),
        ] {
            if value.trim().is_empty() {
                return Err(PredictError::config(format!("{key} cannot be empty")));
            }
        }
        if self.history.enabled && self.history.path.trim().is_empty() {
            return Err(PredictError::config(
                "history.path must be set when history is enabled",
            ));
        }
        if self.server.port == 0 {
            return Err(PredictError::config("server.port cannot be 0"));
        }
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(PredictError::config(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }
}

/// Build the figment for a given TOML path without extracting it.
pub fn figment_for(path: &str) -> Figment {
    Figment::from(Serialized::defaults(AppConfig::defaults()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("STUDENT_PERF_").split("__"))
}

pub fn load_config() -> PredictResult<AppConfig> {
    let path = std::env::var("STUDENT_PERF_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
    load_config_from(&path)
}

pub fn load_config_from(path: &str) -> PredictResult<AppConfig> {
    let config: AppConfig = figment_for(path).extract()?;
    config.validate()?;
    Ok(config)
}
