//! Account operations - login, logout, registration, and the OTP password reset.
//!
//! These talk to the public `/auth/*` endpoints, so no bearer token is attached and a 401 is a
//! plain failure rather than a refresh trigger.

use crate::{
    entities::auth::{
        ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
        ResetPasswordRequest, StatusMessage,
    },
    errors::{Error, Result},
    http::{ApiClient, Transport},
    session::{Role, StoredSession},
};
use tracing::{info, instrument};

/// Default notice for a failed login.
pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

/// What the front-end needs after a successful login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Resolved role
    pub role: Role,
    /// Account email
    pub email: Option<String>,
    /// Account display name
    pub name: Option<String>,
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation {
            message: message.to_string(),
        });
    }
    Ok(())
}

/// Exchanges credentials for a token and starts the session.
///
/// Stores `token`, `refreshToken`, `email`, `name`, and `userRole`. The role comes from the
/// token's claim when it has one, otherwise from the `role` field of the answer.
#[instrument(skip(api, password))]
pub async fn login<T: Transport>(api: &ApiClient<T>, email: &str, password: &str) -> Result<LoginOutcome> {
    require(email, "Please enter your email")?;
    require(password, "Please enter your password")?;

    let response: LoginResponse = api
        .post_public(
            "/auth/login",
            &LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            },
        )
        .await?;

    let Some(token) = response.token.filter(|t| !t.is_empty()) else {
        return Err(Error::Api {
            status: 200,
            message: Some(LOGIN_FAILED.to_string()),
        });
    };

    api.session().init(&StoredSession {
        token: Some(token),
        refresh_token: response.refresh_token,
        email: response.email.clone(),
        name: response.name.clone(),
        user_role: response.role,
    })?;

    let role = api.session().role()?;
    info!("Logged in as {role}");
    Ok(LoginOutcome {
        role,
        email: response.email,
        name: response.name,
    })
}

/// Ends the session locally.
pub fn logout<T: Transport>(api: &ApiClient<T>) -> Result<()> {
    api.session().clear()
}

fn into_success(answer: StatusMessage, default: &str) -> Result<String> {
    if answer.is_success() {
        Ok(answer.message.unwrap_or_else(|| default.to_string()))
    } else {
        Err(Error::Api {
            status: 200,
            message: answer.message,
        })
    }
}

/// Creates an account. Returns the server's confirmation text.
#[instrument(skip(api, password))]
pub async fn register<T: Transport>(
    api: &ApiClient<T>,
    name: &str,
    email: &str,
    password: &str,
) -> Result<String> {
    require(name, "Please enter your name")?;
    require(email, "Please enter your email")?;
    require(password, "Please enter a password")?;

    let answer: StatusMessage = api
        .post_public(
            "/auth/register",
            &RegisterRequest {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                password: password.to_string(),
            },
        )
        .await?;
    into_success(answer, "Registration successful!")
}

/// Asks the server to email a one-time password.
#[instrument(skip(api))]
pub async fn forgot_password<T: Transport>(api: &ApiClient<T>, email: &str) -> Result<String> {
    require(email, "Please enter your email address")?;

    let answer: StatusMessage = api
        .post_public(
            "/auth/forgot-password",
            &ForgotPasswordRequest {
                email: email.trim().to_string(),
            },
        )
        .await?;
    into_success(answer, "OTP sent to your email")
}

/// Sets a new password using the emailed OTP.
#[instrument(skip(api, otp, new_password, confirm_password))]
pub async fn reset_password<T: Transport>(
    api: &ApiClient<T>,
    email: &str,
    otp: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<String> {
    require(email, "Please enter your email address")?;
    require(otp, "Please enter the OTP")?;
    require(new_password, "Please enter a new password")?;
    if new_password != confirm_password {
        return Err(Error::Validation {
            message: "Passwords do not match!".to_string(),
        });
    }

    let answer: StatusMessage = api
        .post_public(
            "/auth/reset-password",
            &ResetPasswordRequest {
                email: email.trim().to_string(),
                otp: otp.trim().to_string(),
                new_password: new_password.to_string(),
            },
        )
        .await?;
    into_success(answer, "Password reset successfully")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::http::Method;
    use crate::session::{MemoryTokenStore, SessionContext};
    use crate::test_utils::{MockTransport, make_token};
    use serde_json::json;

    fn anonymous() -> ApiClient<MockTransport> {
        ApiClient::new(
            MockTransport::new(),
            SessionContext::new(MemoryTokenStore::default()),
        )
    }

    #[tokio::test]
    async fn test_login_with_opaque_token_uses_answer_role() -> Result<()> {
        let api = anonymous();
        api.transport().respond(
            Method::Post,
            "/auth/login",
            200,
            json!({"token": "t1", "role": "ROLE_ADMIN", "email": "sam@example.com", "name": "Sam"}),
        );

        let outcome = login(&api, "sam@example.com", "secret").await?;
        assert_eq!(outcome.role, Role::Admin);
        assert_eq!(outcome.name.as_deref(), Some("Sam"));

        let stored = api.session().snapshot()?;
        assert_eq!(stored.token.as_deref(), Some("t1"));
        assert_eq!(stored.user_role.as_deref(), Some("ROLE_ADMIN"));
        assert_eq!(stored.email.as_deref(), Some("sam@example.com"));

        let sent = api.transport().requests();
        assert_eq!(
            sent[0].body,
            Some(json!({"email": "sam@example.com", "password": "secret"}))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_login_prefers_token_claim() -> Result<()> {
        let api = anonymous();
        let token = make_token(&json!({"roles": ["ROLE_USER"]}));
        api.transport().respond(
            Method::Post,
            "/auth/login",
            200,
            json!({"token": token, "refreshToken": "r1", "role": "ROLE_ADMIN"}),
        );

        let outcome = login(&api, "a@b.c", "pw").await?;
        assert_eq!(outcome.role, Role::User);
        assert_eq!(api.session().refresh_token()?.as_deref(), Some("r1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_login_failure_keeps_no_session() {
        let api = anonymous();
        api.transport().respond(
            Method::Post,
            "/auth/login",
            401,
            json!({"message": "Invalid email or password"}),
        );
        let err = login(&api, "a@b.c", "bad").await.unwrap_err();
        assert_eq!(err.user_message(LOGIN_FAILED), "Invalid email or password");
        assert!(api.session().snapshot().unwrap().is_empty());

        api.transport()
            .respond(Method::Post, "/auth/login", 200, json!({"message": "no token"}));
        let err = login(&api, "a@b.c", "bad").await.unwrap_err();
        assert_eq!(err.user_message("x"), LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let api = anonymous();
        let err = login(&api, "  ", "pw").await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(api.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_register_and_password_flow() -> Result<()> {
        let api = anonymous();
        let transport = api.transport();
        transport.respond(Method::Post, "/auth/register", 200, json!({"status": "success"}));
        transport.respond(
            Method::Post,
            "/auth/forgot-password",
            200,
            json!({"status": "success", "message": "OTP sent"}),
        );
        transport.respond(
            Method::Post,
            "/auth/reset-password",
            200,
            json!({"status": "success", "message": "Password updated"}),
        );

        assert_eq!(
            register(&api, "Sam", "sam@example.com", "pw").await?,
            "Registration successful!"
        );
        assert_eq!(forgot_password(&api, "sam@example.com").await?, "OTP sent");
        assert_eq!(
            reset_password(&api, "sam@example.com", "123456", "new", "new").await?,
            "Password updated"
        );

        let reset = transport.requests_to(Method::Post, "/auth/reset-password");
        assert_eq!(
            reset[0].body,
            Some(json!({"email": "sam@example.com", "otp": "123456", "newPassword": "new"}))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_rejects_mismatched_passwords() {
        let api = anonymous();
        let err = reset_password(&api, "a@b.c", "1", "one", "two")
            .await
            .unwrap_err();
        assert_eq!(err.user_message("x"), "Passwords do not match!");
        assert!(api.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_unsuccessful_status_is_error() {
        let api = anonymous();
        api.transport().respond(
            Method::Post,
            "/auth/register",
            200,
            json!({"status": "error", "message": "Email already registered"}),
        );
        let err = register(&api, "Sam", "a@b.c", "pw").await.unwrap_err();
        assert_eq!(err.user_message("Registration failed"), "Email already registered");
    }

    #[tokio::test]
    async fn test_logout_clears_session() -> Result<()> {
        let api = ApiClient::new(MockTransport::new(), crate::test_utils::memory_session("t1", Some("r1")));
        logout(&api)?;
        assert!(api.session().snapshot()?.is_empty());
        Ok(())
    }
}
