//! Type-safe configuration loader using the `config` crate,
//! with manual environment-variable overrides for core settings.

use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::{env, path::PathBuf, time::Duration};

/// Top-level application settings loaded from `Config.toml`
/// and then overridden (where applicable) by environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Postgres connection URL
    pub database_url: String,

    /// Directory all export artifacts are written beneath.
    /// Relative paths resolve against the working directory.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Upper bound on pooled Postgres connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Optional per-query timeout (e.g. "30s"); unset means wait indefinitely
    #[serde(default, with = "humantime_serde")]
    pub query_timeout: Option<Duration>,

    /// When set, the run's Prometheus metrics are written here on exit
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_max_connections() -> u32 {
    5
}

impl Settings {
    /// The Postgres URL, or an error if none was configured.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        match self.database_url.trim() {
            "" => Err(ConfigError::NotFound("database_url".into())),
            url => Ok(url),
        }
    }

    /// Load settings from `Config.toml` (if present) and the environment.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load("Config")
    }

    /// Load settings from the config file `name` (extension optional, file
    /// optional), then apply any overrides from these environment variables:
    ///
    /// - `APP__DATABASE_URL`
    /// - `APP__EXPORT_DIR`
    /// - `APP__MAX_CONNECTIONS`
    /// - `APP__QUERY_TIMEOUT`
    /// - `APP__METRICS_FILE`
    pub fn load(name: &str) -> Result<Self, ConfigError> {
        // `database_url` may come only from the environment (or not at all,
        // when reading a snapshot), so seed an empty value.
        let cfg = Config::builder()
            .set_default("database_url", "")?
            .add_source(File::with_name(name).required(false))
            .build()?;

        let mut settings: Settings = cfg.try_deserialize()?;
        settings.apply_env_overrides(|key| env::var(key).ok())?;
        Ok(settings)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("APP__DATABASE_URL") {
            self.database_url = val;
        }
        if let Some(val) = lookup("APP__EXPORT_DIR") {
            self.export_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("APP__MAX_CONNECTIONS") {
            self.max_connections = val
                .parse()
                .map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        }
        if let Some(val) = lookup("APP__QUERY_TIMEOUT") {
            self.query_timeout = Some(
                humantime::parse_duration(&val).map_err(|e| ConfigError::Foreign(Box::new(e)))?,
            );
        }
        if let Some(val) = lookup("APP__METRICS_FILE") {
            self.metrics_file = Some(PathBuf::from(val));
        }
        Ok(())
    }
}
