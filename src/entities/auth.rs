//! Authentication payloads exchanged with `/auth/*`.

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/login`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Successful login answer
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginResponse {
    /// Session token, absent when the server refused the login
    pub token: Option<String>,
    /// Long-lived refresh credential
    pub refresh_token: Option<String>,
    /// Account email as stored by the server
    pub email: Option<String>,
    /// Account display name
    pub name: Option<String>,
    /// Role claim echoed by the server, e.g. `"ROLE_ADMIN"`
    pub role: Option<String>,
}

/// Body of `POST /auth/register`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Chosen password
    pub password: String,
}

/// Body of `POST /auth/forgot-password`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForgotPasswordRequest {
    /// Account email the OTP is sent to
    pub email: String,
}

/// Body of `POST /auth/reset-password`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Account email
    pub email: String,
    /// One-time password received by email
    pub otp: String,
    /// Replacement password
    pub new_password: String,
}

/// `{ status, message }` answer used by register and the password flows
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusMessage {
    /// `"success"` when the operation went through
    pub status: Option<String>,
    /// Human-readable outcome
    pub message: Option<String>,
}

impl StatusMessage {
    /// Whether the server reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Body of `POST /auth/refresh`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Stored refresh credential
    pub refresh_token: String,
}

/// Answer of `POST /auth/refresh`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// New session token
    pub token: String,
    /// Rotated refresh token, when the server rotates
    #[serde(default)]
    pub refresh_token: Option<String>,
}
