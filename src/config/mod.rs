//! Application configuration.
//!
//! Values come from three places, later ones winning: built-in defaults, an optional
//! `config.toml`, and environment variables (a `.env` file is loaded by `main` first).

/// `config.toml` parsing
pub mod file;

use crate::errors::{Error, Result};
use std::{path::PathBuf, time::Duration};
use tracing::{info, warn};

/// Environment variable holding the API base URL.
pub const API_BASE_URL_VAR: &str = "API_BASE_URL";
/// Environment variable overriding the request timeout in seconds.
pub const API_TIMEOUT_VAR: &str = "API_TIMEOUT_SECS";
/// Environment variable overriding the session file location.
pub const SESSION_FILE_VAR: &str = "SESSION_FILE";
/// Environment variable overriding the config file location.
pub const CONFIG_PATH_VAR: &str = "EXPENSE_BUDDY_CONFIG";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_FILE: &str = "data/session.toml";

/// Resolved configuration used to build the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the expense service, without a trailing slash
    pub api_base_url: String,
    /// Fixed timeout applied to every request
    pub request_timeout: Duration,
    /// Where the session token pair is persisted
    pub session_file: PathBuf,
}

/// Loads the configuration file named by `EXPENSE_BUDDY_CONFIG` (or `config.toml`) and applies
/// environment overrides.
///
/// # Errors
/// Returns [`Error::Config`] when no base URL is configured anywhere or a value is malformed.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| file::DEFAULT_CONFIG_PATH.into());
    let file_config = file::load_optional_config(&path)?;
    resolve(file_config, |key| std::env::var(key).ok())
}

/// Merges file values with overrides looked up through `env`.
pub fn resolve<F>(file_config: file::FileConfig, env: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let api_base_url = env(API_BASE_URL_VAR)
        .or(file_config.api.base_url)
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| Error::Config {
            message: format!("{API_BASE_URL_VAR} is not set and config.toml has no api.base_url"),
        })?;

    let timeout_secs = match env(API_TIMEOUT_VAR) {
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
            warn!("Invalid {API_TIMEOUT_VAR} value {raw:?}: {e}");
            Error::Config {
                message: format!("Invalid {API_TIMEOUT_VAR}: {e}"),
            }
        })?,
        None => file_config.api.timeout_secs.unwrap_or_else(|| {
            info!("{API_TIMEOUT_VAR} not set, using default: {DEFAULT_TIMEOUT_SECS}");
            DEFAULT_TIMEOUT_SECS
        }),
    };

    let session_file = env(SESSION_FILE_VAR)
        .or(file_config.session.file)
        .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string());

    Ok(AppConfig {
        api_base_url,
        request_timeout: Duration::from_secs(timeout_secs),
        session_file: PathBuf::from(session_file),
    })
}
