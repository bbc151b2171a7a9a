//! Unified error type for the client.
//!
//! Every failure in the session, HTTP, and view layers funnels into [`Error`]. Views never let
//! an error escape; they turn it into a notice through [`Error::user_message`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session storage error: {message}")]
    Storage { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// No token in the store.
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Malformed session token: {message}")]
    TokenDecode { message: String },

    #[error("Session token expired")]
    TokenExpired,

    /// 401 where the refresh could not be performed; the session was torn down.
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// 401 on a request that was already retried after a refresh.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Access forbidden{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Forbidden { message: Option<String> },

    #[error("API error ({status}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Api { status: u16, message: Option<String> },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The resolved role does not allow the action.
    #[error("Permission denied: {action}")]
    PermissionDenied { action: String },
}

impl Error {
    /// Text shown to the user for this failure.
    ///
    /// Server-supplied messages win, then the permission wording for 403 and role gates,
    /// then the caller's per-operation `default`.
    #[must_use]
    pub fn user_message(&self, default: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Forbidden { message } => message
                .clone()
                .unwrap_or_else(|| "Permission denied".to_string()),
            Self::PermissionDenied { .. } => "Permission denied".to_string(),
            Self::Validation { message } => message.clone(),
            Self::SessionExpired | Self::TokenExpired | Self::NotAuthenticated => {
                "Session expired, please log in again".to_string()
            }
            _ => default.to_string(),
        }
    }

    /// Whether the caller should send the user back to the login screen.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired
                | Self::NotAuthenticated
                | Self::TokenExpired
                | Self::TokenDecode { .. }
        )
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
