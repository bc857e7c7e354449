//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PORCHLIGHT_*)
//! 2. TOML config file (if PORCHLIGHT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;
mod worker;

pub use validation::ConfigError;
pub use worker::WorkerConfig;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PORCHLIGHT_*)
/// 2. TOML config file (if PORCHLIGHT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via PORCHLIGHT_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Worker scope URL. Its origin is the cached origin and its path the base path.
    ///
    /// Set via PORCHLIGHT_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Prefix of every bucket name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version tag baked into bucket names. Bumping it invalidates every bucket on activation.
    ///
    /// Set via PORCHLIGHT_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    #[serde(default = "default_static_budget")]
    pub static_budget_bytes: u64,

    #[serde(default = "default_html_budget")]
    pub html_budget_bytes: u64,

    #[serde(default = "default_data_budget")]
    pub data_budget_bytes: u64,

    /// Age in seconds after which a Data entry is refetched.
    #[serde(default = "default_data_max_age_secs")]
    pub data_max_age_secs: u64,

    /// Pages precached on install, relative to the base path.
    #[serde(default = "worker::default_critical_pages")]
    pub critical_pages: Vec<String>,

    /// Assets precached on install, relative to the base path.
    #[serde(default = "worker::default_critical_assets")]
    pub critical_assets: Vec<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via PORCHLIGHT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./porchlight-cache.sqlite")
}

fn default_scope() -> String {
    "http://localhost:4321/".into()
}

fn default_cache_prefix() -> String {
    worker::DEFAULT_CACHE_PREFIX.into()
}

fn default_cache_version() -> String {
    worker::DEFAULT_CACHE_VERSION.into()
}

fn default_static_budget() -> u64 {
    worker::DEFAULT_STATIC_BUDGET
}

fn default_html_budget() -> u64 {
    worker::DEFAULT_HTML_BUDGET
}

fn default_data_budget() -> u64 {
    worker::DEFAULT_DATA_BUDGET
}

fn default_data_max_age_secs() -> u64 {
    worker::DEFAULT_DATA_MAX_AGE.as_secs()
}

fn default_user_agent() -> String {
    "porchlight/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            scope: default_scope(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            static_budget_bytes: default_static_budget(),
            html_budget_bytes: default_html_budget(),
            data_budget_bytes: default_data_budget(),
            data_max_age_secs: default_data_max_age_secs(),
            critical_pages: worker::default_critical_pages(),
            critical_assets: worker::default_critical_assets(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be read,
    /// or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PORCHLIGHT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PORCHLIGHT_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed worker scope.
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope).map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })
    }

    /// Build the explicit worker configuration.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        Ok(WorkerConfig {
            scope: self.scope_url()?,
            cache_prefix: self.cache_prefix.clone(),
            cache_version: self.cache_version.clone(),
            static_budget: self.static_budget_bytes,
            html_budget: self.html_budget_bytes,
            data_budget: self.data_budget_bytes,
            data_max_age: Duration::from_secs(self.data_max_age_secs),
            critical_pages: self.critical_pages.clone(),
            critical_assets: self.critical_assets.clone(),
        })
    }
}
