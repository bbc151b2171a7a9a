//! Member entity - A household member expenses are assigned to.

use serde::{Deserialize, Serialize};

/// Member as returned by `GET /api/members`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier for the member
    pub id: i64,
    /// Display name of the member
    pub name: String,
}

/// Body of `POST /api/members`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    /// Display name of the new member
    pub name: String,
}
