//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SCRAPEGATE_*)
//! 2. TOML config file (if SCRAPEGATE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SCRAPEGATE_*)
/// 2. TOML config file (if SCRAPEGATE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port the HTTP server listens on.
    ///
    /// Set via SCRAPEGATE_PORT environment variable.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the SQLite database holding rules, cache entries, and
    /// API keys.
    ///
    /// Set via SCRAPEGATE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for outbound robots.txt requests.
    ///
    /// Set via SCRAPEGATE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Time-to-live for cached live robots.txt files, in seconds.
    ///
    /// Set via SCRAPEGATE_ROBOTS_TTL_SECS environment variable.
    #[serde(default = "default_robots_ttl_secs")]
    pub robots_ttl_secs: u64,

    /// Outbound HTTP request timeout in milliseconds.
    ///
    /// Set via SCRAPEGATE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum request body size for rule uploads, in megabytes.
    ///
    /// Set via SCRAPEGATE_MAX_BODY_MB environment variable.
    #[serde(default = "default_max_body_mb")]
    pub max_body_mb: usize,

    /// Emit logs as JSON instead of human-readable lines.
    ///
    /// Set via SCRAPEGATE_LOG_JSON environment variable.
    #[serde(default)]
    pub log_json: bool,
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./scrapegate.sqlite")
}

fn default_user_agent() -> String {
    "scrapegate/0.1".into()
}

fn default_robots_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_body_mb() -> usize {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            robots_ttl_secs: default_robots_ttl_secs(),
            timeout_ms: default_timeout_ms(),
            max_body_mb: default_max_body_mb(),
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Outbound timeout as a Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache TTL as a Duration.
    pub fn robots_ttl(&self) -> Duration {
        Duration::from_secs(self.robots_ttl_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SCRAPEGATE_`
    /// 2. TOML file from `SCRAPEGATE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SCRAPEGATE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SCRAPEGATE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
