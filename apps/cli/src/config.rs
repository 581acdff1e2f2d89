//! CLI configuration
//!
//! Sources, later ones winning:
//! - built-in defaults
//! - `quarry.toml` in the working directory (or the file given with `--config`)
//! - `QUARRY__*` environment variables, `__` separating nested keys
//!   (e.g. `QUARRY__BACKEND__URL`), after loading `.env` if present

use config::{builder::DefaultState, ConfigBuilder, ConfigError, Environment, File};
use quarry_search::IndexConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub index: String,
    #[serde(default)]
    pub doc_type: String,
    /// Per-operation deadline
    pub timeout_seconds: u64,
}

impl BackendConfig {
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::new(&self.url, &self.index, &self.doc_type)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// daily, hourly, minutely or never
    pub file_rotation: String,
}

impl Config {
    /// Load configuration from defaults, file and environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        // A missing .env is the normal case
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("quarry").required(false),
        };

        let config = with_defaults()?
            .add_source(file)
            .add_source(
                Environment::with_prefix("QUARRY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("backend.url", "http://localhost:9200")?
        .set_default("backend.index", "applicants")?
        .set_default("backend.doc_type", "")?
        .set_default("backend.timeout_seconds", 30)?
        .set_default("logging.level", "info")?
        .set_default("logging.json", false)?
        .set_default("logging.file_enabled", false)?
        .set_default("logging.file_directory", "logs")?
        .set_default("logging.file_prefix", "quarry")?
        .set_default("logging.file_rotation", "daily")
}
