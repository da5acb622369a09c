//! Runtime configuration.
//!
//! Everything comes from the environment with sensible defaults, so a batch
//! job can be pointed at a different store or tuned without flags.

use std::env;

use thiserror::Error;

// =============================================================================
// Constants - Default Values
// =============================================================================

const DEFAULT_API_URL: &str = "http://127.0.0.1:5009";
const DEFAULT_WORKER_LIMIT: usize = 8;
const DEFAULT_ERROR_LOG: &str = "dagweld_errors.log";

const ENV_API_URL: &str = "DAGWELD_API";
const ENV_WORKER_LIMIT: &str = "DAGWELD_WORKERS";
const ENV_ERROR_LOG: &str = "DAGWELD_ERROR_LOG";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {source}")]
    InvalidInteger {
        key: String,
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("{key} must be greater than zero")]
    ZeroWorkers { key: String },
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// Config
// =============================================================================

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the store's HTTP API.
    pub api_url: String,
    /// Upper bound on concurrent store lookups.
    pub worker_limit: usize,
    /// Path of the append-only failure log.
    pub error_log: String,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through a lookup function. Unset keys fall back to
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let error_log = lookup(ENV_ERROR_LOG).unwrap_or_else(|| DEFAULT_ERROR_LOG.to_string());

        let worker_limit = match lookup(ENV_WORKER_LIMIT) {
            None => DEFAULT_WORKER_LIMIT,
            Some(value) => {
                let parsed: usize =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::InvalidInteger {
                            key: ENV_WORKER_LIMIT.to_string(),
                            value: value.clone(),
                            source: e,
                        })?;
                if parsed == 0 {
                    return Err(ConfigError::ZeroWorkers {
                        key: ENV_WORKER_LIMIT.to_string(),
                    });
                }
                parsed
            }
        };

        Ok(Config {
            api_url,
            worker_limit,
            error_log,
        })
    }
}
