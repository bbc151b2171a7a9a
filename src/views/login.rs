//! Login flow - sign in, sign up, and the two-step OTP password reset.

use super::Notifications;
use crate::{
    core::auth::{self, LOGIN_FAILED, LoginOutcome},
    http::{ApiClient, Transport},
};
use tracing::debug;

/// Which form the flow is showing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    /// Email and password
    #[default]
    Login,
    /// Email for the OTP request
    ForgotPassword,
    /// OTP and new password for `email`
    ResetPassword {
        /// Address the OTP was sent to
        email: String,
    },
}

/// State of the login screen.
#[derive(Debug)]
pub struct LoginFlow<'a, T> {
    api: &'a ApiClient<T>,
    /// Form currently shown
    pub stage: Stage,
    /// Set after a successful login
    pub signed_in: Option<LoginOutcome>,
    /// Notices produced so far
    pub notices: Notifications,
}

impl<'a, T: Transport> LoginFlow<'a, T> {
    /// Starts at the login form.
    pub fn new(api: &'a ApiClient<T>) -> Self {
        Self {
            api,
            stage: Stage::Login,
            signed_in: None,
            notices: Notifications::default(),
        }
    }

    /// Signs in; on success the session is stored and [`Self::signed_in`] is set.
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        match auth::login(self.api, email, password).await {
            Ok(outcome) => {
                self.notices.success(format!("Welcome, signed in as {}", outcome.role));
                self.signed_in = Some(outcome);
                true
            }
            Err(e) => {
                self.notices.error(e.user_message(LOGIN_FAILED));
                false
            }
        }
    }

    /// Creates an account; the user signs in afterwards.
    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> bool {
        match auth::register(self.api, name, email, password).await {
            Ok(message) => {
                self.notices.success(message);
                self.stage = Stage::Login;
                true
            }
            Err(e) => {
                self.notices.error(e.user_message("Registration failed"));
                false
            }
        }
    }

    /// Switches to the OTP request form.
    pub fn forgot_password(&mut self) {
        self.stage = Stage::ForgotPassword;
    }

    /// Requests an OTP; on success moves to the reset form for `email`.
    pub async fn request_otp(&mut self, email: &str) -> bool {
        match auth::forgot_password(self.api, email).await {
            Ok(message) => {
                self.notices.success(message);
                self.stage = Stage::ResetPassword {
                    email: email.trim().to_string(),
                };
                true
            }
            Err(e) => {
                self.notices.error(e.user_message("Failed to send OTP"));
                false
            }
        }
    }

    /// Sets the new password; on success returns to the login form.
    pub async fn reset_password(&mut self, otp: &str, new_password: &str, confirm: &str) -> bool {
        let Stage::ResetPassword { email } = &self.stage else {
            debug!("Reset submitted outside the reset form");
            self.notices.error("Please request an OTP first");
            return false;
        };
        let email = email.clone();

        match auth::reset_password(self.api, &email, otp, new_password, confirm).await {
            Ok(message) => {
                self.notices.success(message);
                self.stage = Stage::Login;
                true
            }
            Err(e) => {
                self.notices.error(e.user_message("Failed to reset password"));
                false
            }
        }
    }
}
