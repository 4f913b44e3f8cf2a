//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CUPPY_*)
//! 2. TOML config file (if CUPPY_CONFIG_FILE set)
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

/// Verdict to apply when a policy document cannot be fetched for reasons
/// other than a definitive 4xx answer (network failure, 5xx, timeout).
///
/// 401/403 always resolve to "disallow all" regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyFailureMode {
    /// Treat an indeterminate policy as "disallow all" (conservative).
    Deny,
    /// Treat an indeterminate policy as "allow all".
    Allow,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CUPPY_*)
/// 2. TOML config file (if CUPPY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding the policy cache and fetch records.
    ///
    /// Set via CUPPY_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests and policy evaluation.
    ///
    /// Set via CUPPY_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via CUPPY_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via CUPPY_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Whether to check robots.txt before fetching a page.
    ///
    /// Off by default; the CLI enables it with `--robotstxt`.
    /// Set via CUPPY_RESPECT_ROBOTS environment variable.
    #[serde(default)]
    pub respect_robots: bool,

    /// Verdict when the policy document cannot be determined.
    ///
    /// Set via CUPPY_POLICY_FAILURE_MODE environment variable
    /// ("deny" or "allow").
    #[serde(default = "default_policy_failure_mode")]
    pub policy_failure_mode: PolicyFailureMode,

    /// How long a cached policy document stays authoritative, in seconds.
    /// 0 means a cached document never expires.
    ///
    /// Set via CUPPY_POLICY_TTL_SECS environment variable.
    #[serde(default = "default_policy_ttl_secs")]
    pub policy_ttl_secs: u64,

    /// Maximum number of URLs processed concurrently by the pipeline.
    ///
    /// Set via CUPPY_MAX_CONCURRENCY environment variable.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./cuppy.sqlite")
}

fn default_user_agent() -> String {
    "cuppy/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_policy_failure_mode() -> PolicyFailureMode {
    PolicyFailureMode::Deny
}

fn default_policy_ttl_secs() -> u64 {
    86_400
}

fn default_max_concurrency() -> usize {
    4
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            respect_robots: false,
            policy_failure_mode: default_policy_failure_mode(),
            policy_ttl_secs: default_policy_ttl_secs(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Policy cache TTL; `None` means cached documents never expire.
    pub fn policy_ttl(&self) -> Option<Duration> {
        (self.policy_ttl_secs > 0).then(|| Duration::from_secs(self.policy_ttl_secs))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CUPPY_`
    /// 2. TOML file from `CUPPY_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("CUPPY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CUPPY_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
