//! Session context - the single owner of token state.
//!
//! The HTTP layer and every view receive a [`SessionContext`] instead of reading storage on
//! their own. Writes happen on login, on refresh, and on teardown.

use super::{
    claims::{Claims, Role, decode_claims},
    store::{StoredSession, TokenStore},
};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Decoded view of a usable session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveSession {
    /// Bearer token
    pub token: String,
    /// Resolved role
    pub role: Role,
    /// Token expiry, when the token carries one
    pub expires_at: Option<DateTime<Utc>>,
    /// Account email, from the token subject or the login answer
    pub email: Option<String>,
    /// Account display name
    pub name: Option<String>,
}

/// Outcome of entering a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bootstrap {
    /// The session is usable.
    Ready(ActiveSession),
    /// The session was destroyed (or never existed); the user must log in.
    RedirectToLogin(LoginReason),
}

/// Why a view sent the user to the login screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginReason {
    /// No token stored
    NoToken,
    /// Token expiry lies in the past
    Expired,
    /// Token payload could not be decoded
    Malformed(String),
}

/// Shared handle over the token store.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Wraps a store.
    pub fn new<S: TokenStore + 'static>(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Wraps an already shared store.
    #[must_use]
    pub fn from_shared(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Everything currently stored.
    pub fn snapshot(&self) -> Result<StoredSession> {
        self.store.load()
    }

    /// Current bearer token, if any.
    pub fn token(&self) -> Result<Option<String>> {
        Ok(self.store.load()?.token.filter(|t| !t.is_empty()))
    }

    /// Current refresh token, if any.
    pub fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.store.load()?.refresh_token.filter(|t| !t.is_empty()))
    }

    /// Starts a session after a successful login.
    pub fn init(&self, session: &StoredSession) -> Result<()> {
        self.store.save(session)?;
        info!(
            "Session started for {}",
            session.email.as_deref().unwrap_or("<unknown>")
        );
        Ok(())
    }

    /// Stores a refreshed token pair. A missing refresh token keeps the old one.
    pub fn replace_tokens(&self, token: String, refresh_token: Option<String>) -> Result<()> {
        let mut session = self.store.load()?;
        session.token = Some(token);
        if let Some(refresh) = refresh_token {
            session.refresh_token = Some(refresh);
        }
        self.store.save(&session)?;
        info!("Session token refreshed");
        Ok(())
    }

    /// Destroys the session.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        info!("Session cleared");
        Ok(())
    }

    /// Role for gating, without judging validity.
    ///
    /// Uses the token's role claim when the token decodes and carries one, then the role
    /// string saved at login, then [`Role::User`].
    pub fn role(&self) -> Result<Role> {
        let stored = self.store.load()?;
        Ok(resolve_role(&stored, stored.token.as_deref().map(decode_claims)))
    }

    /// Validates the stored session on view entry.
    ///
    /// A missing token, a token whose payload cannot be decoded, and a token whose expiry is
    /// before `now` all destroy the session and yield [`Bootstrap::RedirectToLogin`]. A token
    /// without a role claim is still valid and resolves to [`Role::User`] unless a role was
    /// saved at login.
    pub fn bootstrap(&self, now: DateTime<Utc>) -> Result<Bootstrap> {
        let stored = self.store.load()?;
        let Some(token) = stored.token.clone().filter(|t| !t.is_empty()) else {
            return Ok(Bootstrap::RedirectToLogin(LoginReason::NoToken));
        };

        let claims = match decode_claims(&token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Stored token could not be decoded: {e}");
                self.clear()?;
                return Ok(Bootstrap::RedirectToLogin(LoginReason::Malformed(
                    e.to_string(),
                )));
            }
        };

        if claims.is_expired_at(now) {
            warn!("Stored token expired at {:?}", claims.expires_at());
            self.clear()?;
            return Ok(Bootstrap::RedirectToLogin(LoginReason::Expired));
        }

        let role = resolve_role(&stored, Some(Ok(claims.clone())));
        Ok(Bootstrap::Ready(ActiveSession {
            token,
            role,
            expires_at: claims.expires_at(),
            email: claims.sub.or(stored.email),
            name: stored.name,
        }))
    }

    /// Like [`Self::bootstrap`] but turns a redirect into an error.
    ///
    /// # Errors
    /// [`Error::NotAuthenticated`], [`Error::TokenExpired`], or [`Error::TokenDecode`].
    pub fn require(&self, now: DateTime<Utc>) -> Result<ActiveSession> {
        match self.bootstrap(now)? {
            Bootstrap::Ready(session) => Ok(session),
            Bootstrap::RedirectToLogin(LoginReason::NoToken) => Err(Error::NotAuthenticated),
            Bootstrap::RedirectToLogin(LoginReason::Expired) => Err(Error::TokenExpired),
            Bootstrap::RedirectToLogin(LoginReason::Malformed(message)) => {
                Err(Error::TokenDecode { message })
            }
        }
    }
}

fn resolve_role(stored: &StoredSession, claims: Option<Result<Claims>>) -> Role {
    let from_token = claims
        .and_then(std::result::Result::ok)
        .and_then(|c| c.role_claim().map(Role::from_claim));
    from_token
        .or_else(|| stored.user_role.as_deref().map(Role::from_claim))
        .unwrap_or_default()
}
