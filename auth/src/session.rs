//! Session persistence.
//!
//! A [`Session`] is the unit the backend issues at login: bearer token and
//! user profile together. [`FileSessionStore`] keeps it in a JSON document
//! under the user's config directory so the client stays signed in across
//! restarts; reads are tolerant (anything unreadable loads as no session)
//! while the write path is atomic so a crash never leaves half a session
//! on disk.

use chrono::{DateTime, Utc};
use ghumly_api::UserProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the session file location
pub const SESSION_PATH_ENV: &str = "GHUMLY_SESSION_PATH";

/// Opaque bearer token issued by the backend.
///
/// `Debug` redacts the value so sessions can appear in logs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// An authenticated session: token and profile issued as one unit.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Bearer token for authenticated requests
    pub token: SessionToken,
    /// The signed-in user
    pub user: UserProfile,
    /// When the session was established on this client
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Assemble a session from a login response.
    #[must_use]
    pub const fn new(token: SessionToken, user: UserProfile, created_at: DateTime<Utc>) -> Self {
        Self {
            token,
            user,
            created_at,
        }
    }
}

/// Errors from writing or clearing a stored session.
#[derive(Error, Debug)]
pub enum SessionStoreError {
    /// Filesystem operation failed
    #[error("Session file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Session could not be encoded
    #[error("Session serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// No config directory could be resolved for the default path
    #[error("No configuration directory available for the session file")]
    NoConfigDir,
}

/// Where sessions live between runs.
///
/// `load` never fails: a missing, unreadable or corrupt session file is
/// treated as "not signed in" rather than an error the caller must handle
/// at startup.
pub trait SessionStore: Send + Sync {
    /// Persist the session, replacing any stored one.
    fn save(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<(), SessionStoreError>> + Send;

    /// The stored session, if one exists and decodes.
    fn load(&self) -> impl Future<Output = Option<Session>> + Send;

    /// Remove the stored session. Removing an absent session is fine.
    fn clear(&self) -> impl Future<Output = Result<(), SessionStoreError>> + Send;
}

/// JSON-file-backed session store.
///
/// The default location is `<config dir>/ghumly/session.json`, where the
/// config dir honors `XDG_CONFIG_HOME` and falls back to `~/.config` on
/// Linux. `GHUMLY_SESSION_PATH` overrides the full path.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store backed by an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `GHUMLY_SESSION_PATH`, or the default location.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::NoConfigDir`] when no override is set
    /// and the platform reports no config directory.
    pub fn from_env() -> Result<Self, SessionStoreError> {
        if let Ok(path) = std::env::var(SESSION_PATH_ENV) {
            return Ok(Self::new(path));
        }
        let base = dirs::config_dir().ok_or(SessionStoreError::NoConfigDir)?;
        Ok(Self::new(base.join("ghumly").join("session.json")))
    }

    /// The file this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl SessionStore for FileSessionStore {
    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let encoded = serde_json::to_vec_pretty(session)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write the whole document to a sibling temp file, then rename it
        // into place. Token and profile land as one unit or not at all.
        let temp = self.temp_path();
        tokio::fs::write(&temp, &encoded).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    async fn load(&self) -> Option<Session> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Session file unreadable");
                return None;
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Session file corrupt, ignoring");
                None
            }
        }
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("ghumly-session-{}-{name}", uuid::Uuid::new_v4()))
            .join("session.json")
    }

    fn sample_session() -> Session {
        Session::new(
            SessionToken::new("jwt-123"),
            UserProfile {
                id: "u1".to_string(),
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                phone: Some("9876543210".to_string()),
            },
            DateTime::parse_from_rfc3339("2025-06-01T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = FileSessionStore::new(scratch_file("roundtrip"));
        let session = sample_session();

        store.save(&session).await.unwrap();
        assert_eq!(store.load().await, Some(session));
    }

    #[tokio::test]
    async fn load_without_a_file_is_none() {
        let store = FileSessionStore::new(scratch_file("absent"));
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_none() {
        let path = scratch_file("corrupt");
        let store = FileSessionStore::new(&path);

        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, b"{not json at all")
            .await
            .unwrap();

        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn clear_removes_the_session() {
        let store = FileSessionStore::new(scratch_file("clear"));
        store.save(&sample_session()).await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn clear_of_nothing_is_ok() {
        let store = FileSessionStore::new(scratch_file("clear-nothing"));
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn save_replaces_the_previous_session() {
        let store = FileSessionStore::new(scratch_file("replace"));
        let first = sample_session();
        let mut second = sample_session();
        second.token = SessionToken::new("jwt-456");

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await.unwrap().token.as_str(), "jwt-456");
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = SessionToken::new("very-secret");
        assert_eq!(format!("{token:?}"), "SessionToken(<redacted>)");
    }
}
