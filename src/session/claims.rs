//! Token claim decoding and role resolution.
//!
//! The payload segment of the session token is decoded without checking the signature. The
//! server verifies the token on every call; the decoded claims only drive what the client
//! offers to the user.

use crate::errors::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

const ROLE_PREFIX: &str = "ROLE_";

/// Closed set of roles the client distinguishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    /// May create, edit, and delete expenses and members
    Admin,
    /// Any other authenticated account
    #[default]
    User,
}

impl Role {
    /// Normalizes a raw role spelling: strips a leading `ROLE_` (any case) and uppercases.
    /// Only `ADMIN` maps to [`Role::Admin`].
    #[must_use]
    pub fn from_claim(raw: &str) -> Self {
        let trimmed = raw.trim();
        let bare = match trimmed.get(..ROLE_PREFIX.len()) {
            Some(head) if head.eq_ignore_ascii_case(ROLE_PREFIX) => &trimmed[ROLE_PREFIX.len()..],
            _ => trimmed,
        };
        if bare.to_uppercase() == "ADMIN" {
            Self::Admin
        } else {
            Self::User
        }
    }

    /// Whether this role may perform `action`.
    #[must_use]
    pub const fn permits(self, action: Action) -> bool {
        match self {
            Self::Admin => true,
            Self::User => !action.is_admin_only(),
        }
    }

    /// Uppercase name, as shown to the user.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-triggered actions that the front-end gates by role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create an expense
    AddExpense,
    /// Edit an expense
    EditExpense,
    /// Delete an expense
    DeleteExpense,
    /// Create a member
    AddMember,
    /// Record a payment against an expense
    RecordPayment,
    /// Read the payment history of an expense
    ViewPayments,
    /// Change a member's monthly budget
    EditBudget,
    /// Start a new budget month
    InitializeBudget,
    /// Recompute budget utilization
    RecalculateBudget,
}

impl Action {
    /// Actions only offered to admins.
    #[must_use]
    pub const fn is_admin_only(self) -> bool {
        matches!(
            self,
            Self::AddExpense | Self::EditExpense | Self::DeleteExpense | Self::AddMember
        )
    }

    /// Lowercase label used in messages and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AddExpense => "add expense",
            Self::EditExpense => "edit expense",
            Self::DeleteExpense => "delete expense",
            Self::AddMember => "add member",
            Self::RecordPayment => "record payment",
            Self::ViewPayments => "view payments",
            Self::EditBudget => "edit budget",
            Self::InitializeBudget => "initialize budget",
            Self::RecalculateBudget => "recalculate budget",
        }
    }
}

/// One entry of a role list: either a bare string or a `{ "authority": ... }` object.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RoleEntry {
    /// `"ROLE_ADMIN"`
    Name(String),
    /// `{ "authority": "ROLE_ADMIN" }`
    Authority {
        /// Role spelling inside the object
        authority: String,
    },
}

impl RoleEntry {
    fn as_str(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Authority { authority } => authority,
        }
    }
}

/// Role claim as it may appear in a token.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    /// A single entry
    Single(RoleEntry),
    /// A list of entries, first non-empty one wins
    Many(Vec<RoleEntry>),
}

impl RoleClaim {
    /// First non-empty spelling carried by the claim.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(entry) => Some(entry.as_str()).filter(|s| !s.trim().is_empty()),
            Self::Many(entries) => entries
                .iter()
                .map(RoleEntry::as_str)
                .find(|s| !s.trim().is_empty()),
        }
    }
}

/// A role claim of any other shape reads as absent.
fn lenient_role<'de, D>(deserializer: D) -> std::result::Result<Option<RoleClaim>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// NumericDate: any JSON number, fractional seconds allowed. Non-numbers read as absent.
fn numeric_date<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}

/// Claims the client reads from the token payload. Unknown claims are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Claims {
    /// Subject, usually the account email
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub: Option<String>,
    /// Expiry in seconds since the epoch
    #[serde(default, deserialize_with = "numeric_date")]
    pub exp: Option<f64>,
    /// Plural role claim
    #[serde(default, deserialize_with = "lenient_role")]
    pub roles: Option<RoleClaim>,
    /// Singular role claim
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<RoleClaim>,
    /// Spring-style authorities claim
    #[serde(default, deserialize_with = "lenient_role")]
    pub authorities: Option<RoleClaim>,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        _ => None,
    }))
}

impl Claims {
    /// First usable role spelling, checking `roles`, `role`, then `authorities`.
    #[must_use]
    pub fn role_claim(&self) -> Option<&str> {
        [&self.roles, &self.role, &self.authorities]
            .into_iter()
            .flatten()
            .find_map(RoleClaim::first)
    }

    /// Resolved role; a missing claim means [`Role::User`].
    #[must_use]
    pub fn role(&self) -> Role {
        self.role_claim().map_or(Role::User, Role::from_claim)
    }

    /// Expiry as a timestamp, when the token carries one.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp_millis().and_then(DateTime::from_timestamp_millis)
    }

    /// True when the expiry lies strictly before `now`, compared in milliseconds.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp_millis()
            .is_some_and(|millis| millis < now.timestamp_millis())
    }

    #[allow(clippy::cast_possible_truncation)] // finite values saturate, NaN maps to 0
    fn exp_millis(&self) -> Option<i64> {
        self.exp
            .filter(|secs| secs.is_finite())
            .map(|secs| (secs * 1000.0).floor() as i64)
    }
}

/// Decodes the payload segment of a `header.payload.signature` token.
///
/// # Errors
/// Returns [`Error::TokenDecode`] when the token has no payload segment, the segment is not
/// base64url, or it is not a JSON object.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| Error::TokenDecode {
            message: "token has no payload segment".to_string(),
        })?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::TokenDecode {
            message: format!("payload is not base64url: {e}"),
        })?;

    serde_json::from_slice(&bytes).map_err(|e| Error::TokenDecode {
        message: format!("payload is not a claims object: {e}"),
    })
}

/// Role for display and gating. A token that cannot be decoded counts as [`Role::User`].
#[must_use]
pub fn role_from_token(token: &str) -> Role {
    decode_claims(token).map_or(Role::User, |claims| claims.role())
}
