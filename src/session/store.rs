//! Token storage.
//!
//! [`TokenStore`] is the client's equivalent of browser-local storage: a small set of string
//! keys that survive restarts. [`FileTokenStore`] keeps them in a TOML file,
//! [`MemoryTokenStore`] keeps them in process for tests and embedding.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{debug, warn};

/// Everything persisted about the current session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSession {
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// Credential used to obtain a new token after a 401
    pub refresh_token: Option<String>,
    /// Email of the logged-in account
    pub email: Option<String>,
    /// Display name of the logged-in account
    pub name: Option<String>,
    /// Role string returned at login, kept verbatim
    pub user_role: Option<String>,
}

impl StoredSession {
    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Persistent key store for the session.
///
/// Implementations must not hold locks across awaits; every method is synchronous.
pub trait TokenStore: Send + Sync {
    /// Reads the stored session, empty when nothing was saved.
    fn load(&self) -> Result<StoredSession>;
    /// Replaces the stored session.
    fn save(&self, session: &StoredSession) -> Result<()>;
    /// Removes every stored key.
    fn clear(&self) -> Result<()>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<StoredSession>,
}

impl MemoryTokenStore {
    /// Creates a store pre-filled with `session`.
    #[must_use]
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoredSession>> {
        self.inner.lock().map_err(|e| Error::Storage {
            message: format!("session lock poisoned: {e}"),
        })
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<StoredSession> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        *self.lock()? = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = StoredSession::default();
        Ok(())
    }
}

/// TOML file store.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store backed by `path`. The file and its parent directory are created on first save.
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<StoredSession> {
        if !self.path.exists() {
            return Ok(StoredSession::default());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| Error::Storage {
            message: format!("Failed to read {}: {e}", self.path.display()),
        })?;
        match toml::from_str(&contents) {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!(
                    "Ignoring unreadable session file {}: {e}",
                    self.path.display()
                );
                Ok(StoredSession::default())
            }
        }
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string(session)?;
        std::fs::write(&self.path, contents)?;
        debug!("Session written to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Session file {} removed", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
