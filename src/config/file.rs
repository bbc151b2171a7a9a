//! Optional `config.toml` loading.
//!
//! Every field is optional so a file can set only what it needs; environment variables
//! override whatever the file provides.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Structure of `config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// API connection settings
    #[serde(default)]
    pub api: ApiSection,
    /// Local session storage settings
    #[serde(default)]
    pub session: SessionSection,
}

/// `[api]` table
#[derive(Debug, Default, Deserialize)]
pub struct ApiSection {
    /// Base URL of the expense service, e.g. `http://localhost:8080`
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// `[session]` table
#[derive(Debug, Default, Deserialize)]
pub struct SessionSection {
    /// Path of the TOML file that stores the token pair
    pub file: Option<String>,
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads the file when it exists, falling back to an empty configuration.
pub fn load_optional_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        tracing::debug!(
            "No configuration file at {:?}, using defaults",
            path.as_ref()
        );
        Ok(FileConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [api]
            base_url = "http://localhost:8080"
            timeout_secs = 5

            [session]
            file = "/tmp/session.toml"
        "#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.api.timeout_secs, Some(5));
        assert_eq!(config.session.file.as_deref(), Some("/tmp/session.toml"));
    }

    #[test]
    fn test_parse_partial_config() {
        let config: FileConfig = toml::from_str("[api]\ntimeout_secs = 3\n").unwrap();
        assert!(config.api.base_url.is_none());
        assert!(config.session.file.is_none());
    }

    #[test]
    fn test_missing_file_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_optional_config(dir.path().join("absent.toml")).unwrap();
        assert!(config.api.base_url.is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();
        assert!(matches!(load_config(&path), Err(Error::Config { .. })));
    }
}
