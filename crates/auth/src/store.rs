//! Session persistence.
//!
//! The session is the only process-wide mutable state of the client. Every
//! read and write goes through a [`TokenStore`], which is injected wherever
//! tokens are needed instead of being looked up ad hoc.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::AuthError;

/// Role string that unlocks the back office.
pub const ADMIN_ROLE: &str = "DEVELOPER";

/// Credentials held between login and logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl Session {
    pub fn new(access_token: &str, refresh_token: &str, role: Option<&str>) -> Self {
        Self {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            role: role.map(str::to_string),
        }
    }

    /// Whether the stored role grants the admin console.
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

/// Storage for the current session.
///
/// Implementations must be cheap to read: the request client calls
/// [`TokenStore::get`] on every outbound call.
pub trait TokenStore: Send + Sync {
    /// Current session, if any.
    fn get(&self) -> Option<Session>;

    /// Replace the stored session.
    fn set(&self, session: Session) -> Result<(), AuthError>;

    /// Forget everything. Called on logout and on irrecoverable auth failure.
    fn clear(&self);

    /// Swap in a fresh access token, keeping the refresh token and role.
    fn set_access_token(&self, access_token: &str) -> Result<(), AuthError> {
        let mut session = self.get().ok_or(AuthError::MissingSession)?;
        session.access_token = access_token.to_string();
        self.set(session)
    }

    fn access_token(&self) -> Option<String> {
        self.get().map(|s| s.access_token)
    }

    fn role(&self) -> Option<String> {
        self.get().and_then(|s| s.role)
    }
}

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: RwLock<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<Session> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, session: Session) -> Result<(), AuthError> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| AuthError::Storage("session lock poisoned".to_string()))?;
        *guard = Some(session);
        Ok(())
    }

    fn clear(&self) {
        match self.session.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

/// JSON file on disk, the desktop counterpart of browser local storage.
///
/// A missing or unreadable file reads as "no session".
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    // serialises writers within this process
    lock: RwLock<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<Session> {
        let _guard = self.lock.read().ok()?;
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, session: Session) -> Result<(), AuthError> {
        let _guard = self
            .lock
            .write()
            .map_err(|_| AuthError::Storage("session lock poisoned".to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| AuthError::Storage(e.to_string()))?;
            }
        }
        let raw = serde_json::to_vec_pretty(&session)?;
        fs::write(&self.path, raw).map_err(|e| AuthError::Storage(e.to_string()))?;
        debug!("Session written to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) {
        let Ok(_guard) = self.lock.write() else {
            return;
        };
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Session file {} removed", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove session file {}: {}", self.path.display(), e),
        }
    }
}
