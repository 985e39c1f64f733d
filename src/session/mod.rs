//! Local session storage.
//!
//! The session is the identity and authorization state of the logged-in
//! user. One [`SessionStore`] is created at startup and shared by handle
//! (`Arc<SessionStore>`) with the API client and the front end. Every
//! mutation is written through to an encrypted file.

mod cipher;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use cipher::SessionCipher;

/// Errors raised by the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the session file failed.
    #[error("Session file error: {0}")]
    Io(#[from] io::Error),

    /// The session record could not be encoded.
    #[error("Session encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Encryption or decryption failed.
    #[error("Session encryption error: {0}")]
    Crypto(String),

    /// The OS keyring could not provide the encryption key.
    #[error("Keyring error: {0}")]
    Keyring(String),

    /// No platform data directory to store the session in.
    #[error("Could not determine local data directory")]
    NoDataDir,
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// The locally persisted identity of the logged-in user.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session token (a JWT). Empty means logged out.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    /// Kept so the client can log in again when the token expires.
    #[serde(default)]
    pub password: String,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Session {
    /// A session counts as logged in only when it carries a token.
    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("logged_in", &self.is_logged_in())
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("avatar", &self.avatar)
            .finish()
    }
}

struct Backing {
    path: PathBuf,
    cipher: SessionCipher,
}

/// Shared, write-through holder of the [`Session`].
///
/// Writes are last-writer-wins; each one atomically replaces the file.
pub struct SessionStore {
    state: RwLock<Session>,
    backing: Option<Backing>,
}

impl SessionStore {
    /// A store that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(Session::default()),
            backing: None,
        }
    }

    /// A memory-only store seeded with `session`.
    pub fn with_session(session: Session) -> Self {
        Self {
            state: RwLock::new(session),
            backing: None,
        }
    }

    /// Open the store backed by `path`.
    ///
    /// A missing file yields an empty session. A file that cannot be
    /// decrypted or parsed is ignored with a warning (the user logs in again)
    /// and is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>, cipher: SessionCipher) -> Result<Self> {
        let path = path.into();
        let session = match fs::read_to_string(&path) {
            Ok(content) => match Self::decode(&cipher, &content) {
                Ok(session) => session,
                Err(e) => {
                    warn!("Ignoring unreadable session file {:?}: {}", path, e);
                    Session::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No session file at {:?}", path);
                Session::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            state: RwLock::new(session),
            backing: Some(Backing { path, cipher }),
        })
    }

    /// The default session file location.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::data_local_dir().ok_or(SessionError::NoDataDir)?;
        Ok(base.join("digiworkhub").join("session.enc"))
    }

    /// A copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().is_logged_in()
    }

    /// The current token, if logged in.
    pub fn token(&self) -> Option<String> {
        let state = self.state.read();
        state.is_logged_in().then(|| state.token.clone())
    }

    /// Replace the whole session.
    pub fn replace(&self, session: Session) -> Result<()> {
        let mut state = self.state.write();
        *state = session;
        self.persist(&state)
    }

    /// Mutate the session in place.
    pub fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Session),
    {
        let mut state = self.state.write();
        mutate(&mut state);
        self.persist(&state)
    }

    /// Store a refreshed token for the account `email`.
    ///
    /// The write only happens while that account is still logged in. A
    /// logout or a login as someone else since the refresh started wins, and
    /// `Ok(false)` is returned with the session left as it is.
    pub fn set_token_for(&self, email: &str, token: &str) -> Result<bool> {
        let mut state = self.state.write();
        if !state.is_logged_in() || state.email != email {
            debug!("Session changed during refresh; dropping refreshed token");
            return Ok(false);
        }
        state.token = token.to_string();
        self.persist(&state)?;
        Ok(true)
    }

    /// Forget the session (logout).
    pub fn clear(&self) -> Result<()> {
        self.replace(Session::default())
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.backing.as_ref().map(|b| b.path.as_path())
    }

    fn decode(cipher: &SessionCipher, content: &str) -> Result<Session> {
        let plaintext = cipher.decrypt(content)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn persist(&self, session: &Session) -> Result<()> {
        let Some(backing) = &self.backing else {
            return Ok(());
        };

        if let Some(parent) = backing.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(session)?;
        let sealed = backing.cipher.encrypt(&json)?;

        let tmp = backing.path.with_extension("tmp");
        fs::write(&tmp, sealed)?;
        fs::rename(&tmp, &backing.path)?;
        debug!("Persisted session to {:?}", backing.path);
        Ok(())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.state.read())
            .field("path", &self.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Session {
        Session {
            token: "a.b.c".to_string(),
            user_id: "u-42".to_string(),
            display_name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            password: "s3cret".to_string(),
            avatar: Some("https://cdn.example.com/g.png".to_string()),
        }
    }

    #[test]
    fn test_empty_token_is_logged_out() {
        let mut session = sample();
        session.token.clear();
        assert!(!session.is_logged_in());
        assert!(!SessionStore::with_session(session).is_logged_in());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let output = format!("{:?}", sample());
        assert!(!output.contains("s3cret"));
        assert!(!output.contains("a.b.c"));
    }

    #[test]
    fn test_missing_file_opens_empty() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path().join("session.enc"), SessionCipher::generate())
            .unwrap();
        assert_eq!(store.snapshot(), Session::default());
        assert!(store.token().is_none());
    }

    #[test]
    fn test_persisted_session_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("session.enc");
        let key = [3u8; 32];

        let store = SessionStore::open(&path, SessionCipher::from_key(key)).unwrap();
        store.replace(sample()).unwrap();
        assert!(store.set_token_for("grace@example.com", "new.token.value").unwrap());

        let reopened = SessionStore::open(&path, SessionCipher::from_key(key)).unwrap();
        let session = reopened.snapshot();
        assert_eq!(session.token, "new.token.value");
        assert_eq!(session.user_id, "u-42");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_file_is_not_plaintext() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.enc");
        let store = SessionStore::open(&path, SessionCipher::generate()).unwrap();
        store.replace(sample()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("grace@example.com"));
        assert!(!raw.contains("s3cret"));
    }

    #[test]
    fn test_unreadable_file_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.enc");
        let store = SessionStore::open(&path, SessionCipher::from_key([1u8; 32])).unwrap();
        store.replace(sample()).unwrap();

        let other_key = SessionStore::open(&path, SessionCipher::from_key([2u8; 32])).unwrap();
        assert!(!other_key.is_logged_in());
    }

    #[test]
    fn test_clear_logs_out_and_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.enc");
        let key = [5u8; 32];
        let store = SessionStore::open(&path, SessionCipher::from_key(key)).unwrap();
        store.replace(sample()).unwrap();
        store.clear().unwrap();

        let reopened = SessionStore::open(&path, SessionCipher::from_key(key)).unwrap();
        assert!(!reopened.is_logged_in());
        assert!(reopened.snapshot().email.is_empty());
    }

    #[test]
    fn test_update_mutates_in_place() {
        let store = SessionStore::with_session(sample());
        store
            .update(|s| s.display_name = "Grace H.".to_string())
            .unwrap();
        assert_eq!(store.snapshot().display_name, "Grace H.");
        assert_eq!(store.token().as_deref(), Some("a.b.c"));
    }

    #[test]
    fn test_refreshed_token_dropped_after_logout() {
        let store = SessionStore::with_session(sample());
        store.clear().unwrap();

        assert!(!store.set_token_for("grace@example.com", "late.token.value").unwrap());
        assert!(!store.is_logged_in());
        assert_eq!(store.snapshot(), Session::default());
    }

    #[test]
    fn test_refreshed_token_dropped_for_other_account() {
        let store = SessionStore::with_session(sample());
        let mut other = sample();
        other.email = "linus@example.com".to_string();
        other.token = "linus.token.value".to_string();
        store.replace(other.clone()).unwrap();

        assert!(!store.set_token_for("grace@example.com", "late.token.value").unwrap());
        assert_eq!(store.snapshot(), other);
    }
}
