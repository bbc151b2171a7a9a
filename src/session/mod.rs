//! Session layer - token storage, claim decoding, and the shared session context.

/// Token claim decoding and role resolution
pub mod claims;
/// Session context handed to the HTTP layer and views
pub mod context;
/// Persistent token storage
pub mod store;

pub use claims::{Action, Role, decode_claims, role_from_token};
pub use context::{ActiveSession, Bootstrap, LoginReason, SessionContext};
pub use store::{FileTokenStore, MemoryTokenStore, StoredSession, TokenStore};
