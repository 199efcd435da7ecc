//! Persistent MCP sessions
//!
//! A [`SessionStore`] is a single JSON file mapping server URL to
//! [`Session`], so that consecutive CLI invocations can skip the
//! `initialize` handshake. The file is rewritten whole on every change
//! (temp file then rename) with owner-only permissions.
//!
//! Several processes may share one file. Each read-modify-write replaces
//! the whole map and the last writer wins; no locking is attempted.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default inactivity window after which a session is discarded.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(1800);

/// Current time as fractional Unix epoch seconds.
pub fn now_epoch() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// A negotiated MCP session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Value of the `mcp-session-id` header returned by `initialize`.
    pub session_id: String,
    /// Endpoint the session belongs to.
    pub server_url: String,
    /// Creation time, epoch seconds.
    pub created_at: f64,
    /// Last successful use, epoch seconds.
    pub last_used: f64,
}

impl Session {
    /// A fresh session created and last used now.
    pub fn new(session_id: impl Into<String>, server_url: impl Into<String>) -> Self {
        let now = now_epoch();
        Self {
            session_id: session_id.into(),
            server_url: server_url.into(),
            created_at: now,
            last_used: now,
        }
    }

    /// Whether more than `ttl` has passed between `last_used` and `now`.
    pub fn is_expired_at(&self, now: f64, ttl: Duration) -> bool {
        now - self.last_used > ttl.as_secs_f64()
    }

    /// [`Session::is_expired_at`] against the wall clock.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.is_expired_at(now_epoch(), ttl)
    }

    /// Mark the session as used now.
    pub fn touch(&mut self) {
        self.last_used = now_epoch();
    }
}

/// File-backed `server_url -> Session` map with expiry.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use serena_client::mcp::session::{Session, SessionStore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = SessionStore::new(dir.path().join("s.json"), Duration::from_secs(1800));
/// let mut session = Session::new("abc123", "http://localhost:9121/mcp");
/// store.save(&mut session).unwrap();
/// assert_eq!(store.get("http://localhost:9121/mcp").unwrap().session_id, "abc123");
/// ```
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    ttl: Duration,
}

impl SessionStore {
    /// Store backed by `path`, discarding sessions idle longer than `ttl`.
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    /// Per-user default location: `<temp dir>/serena-session-<uid>.json`.
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(format!("serena-session-{}.json", current_uid()))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored, non-expired session for `server_url`.
    ///
    /// An expired entry is removed from the file as a side effect.
    pub fn get(&self, server_url: &str) -> Option<Session> {
        let session = self.load().remove(server_url)?;
        if session.is_expired(self.ttl) {
            tracing::debug!(server_url, "discarding expired session");
            if let Err(e) = self.clear(server_url) {
                tracing::warn!("failed to remove expired session: {}", e);
            }
            return None;
        }
        Some(session)
    }

    /// Touch `session` and persist it, replacing any entry for its URL.
    pub fn save(&self, session: &mut Session) -> Result<()> {
        let mut sessions = self.load();
        session.touch();
        sessions.insert(session.server_url.clone(), session.clone());
        self.write(&sessions)
    }

    /// Remove the entry for `server_url`, if any.
    pub fn clear(&self, server_url: &str) -> Result<()> {
        let mut sessions = self.load();
        if sessions.remove(server_url).is_some() {
            self.write(&sessions)?;
        }
        Ok(())
    }

    /// Remove every stored session by deleting the file.
    pub fn clear_all(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Every stored entry, expired or not.
    pub fn list(&self) -> BTreeMap<String, Session> {
        self.load()
    }

    /// Missing, unreadable or corrupt storage reads as empty.
    fn load(&self) -> BTreeMap<String, Session> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return BTreeMap::new(),
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), "ignoring corrupt session file: {}", e);
            BTreeMap::new()
        })
    }

    fn write(&self, sessions: &BTreeMap<String, Session>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(sessions)?;
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "serena-session.json".to_string());
        let tmp = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

        let mut file = owner_only_options().open(&tmp)?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn owner_only_options() -> fs::OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true).mode(0o600);
    options
}

#[cfg(not(unix))]
fn owner_only_options() -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    options
}

#[cfg(unix)]
fn current_uid() -> String {
    // SAFETY: getuid has no preconditions and cannot fail.
    let uid = unsafe { libc::getuid() };
    uid.to_string()
}

#[cfg(not(unix))]
fn current_uid() -> String {
    std::env::var("USERNAME").unwrap_or_else(|_| "user".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const URL: &str = "http://localhost:9121/mcp";

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("sessions.json"), DEFAULT_SESSION_TTL)
    }

    #[test]
    fn test_save_then_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let before = now_epoch();

        let mut session = Session::new("abc123", URL);
        store.save(&mut session).unwrap();

        let loaded = store.get(URL).unwrap();
        assert_eq!(loaded.session_id, "abc123");
        assert!(loaded.last_used >= before);
    }

    #[test]
    fn test_missing_entry_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).get(URL).is_none());
    }

    #[test]
    fn test_expired_session_is_removed_on_get() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut stale = Session::new("old", URL);
        stale.last_used = now_epoch() - 3600.0;
        let mut sessions = BTreeMap::new();
        sessions.insert(URL.to_string(), stale);
        store.write(&sessions).unwrap();

        assert!(store.get(URL).is_none());
        assert!(store.list().is_empty());
        assert!(store.get(URL).is_none());
    }

    #[test]
    fn test_expiry_boundary() {
        let session = Session {
            session_id: "s".to_string(),
            server_url: URL.to_string(),
            created_at: 0.0,
            last_used: 1000.0,
        };
        let ttl = Duration::from_secs(1800);
        assert!(!session.is_expired_at(2800.0, ttl));
        assert!(session.is_expired_at(2800.5, ttl));
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").unwrap();

        assert!(store.get(URL).is_none());

        let mut session = Session::new("fresh", URL);
        store.save(&mut session).unwrap();
        assert_eq!(store.get(URL).unwrap().session_id, "fresh");
    }

    #[test]
    fn test_sessions_keyed_by_url() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&mut Session::new("a", "http://a/mcp")).unwrap();
        store.save(&mut Session::new("b", "http://b/mcp")).unwrap();

        assert_eq!(store.list().len(), 2);
        store.clear("http://a/mcp").unwrap();
        assert!(store.get("http://a/mcp").is_none());
        assert_eq!(store.get("http://b/mcp").unwrap().session_id, "b");
    }

    #[test]
    fn test_clear_all_removes_file_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&mut Session::new("a", URL)).unwrap();
        assert!(store.path().exists());

        store.clear_all().unwrap();
        assert!(!store.path().exists());
        store.clear_all().unwrap();
    }

    #[test]
    fn test_file_uses_server_url_keys() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&mut Session::new("abc123", URL)).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw[URL]["session_id"], "abc123");
        assert_eq!(raw[URL]["server_url"], URL);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&mut Session::new("a", URL)).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_default_path_is_in_temp_dir() {
        let path = SessionStore::default_path();
        assert!(path.starts_with(std::env::temp_dir()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("serena-session-"));
        assert!(name.ends_with(".json"));
    }
}
