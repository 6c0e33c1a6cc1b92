use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Credential, UserProfile};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Durable slot holding the credential and the user profile.
///
/// The three mutating actors (login, logout, invalidation) all go through
/// this trait. Implementations write and clear both entries together, and a
/// reader never sees a credential whose profile is missing.
pub trait SessionStore: Send + Sync {
    /// Stored credential, `None` when absent or empty.
    fn credential(&self) -> Result<Option<Credential>>;

    fn profile(&self) -> Result<Option<UserProfile>>;

    /// Write both entries.
    fn set(&self, credential: &Credential, profile: &UserProfile) -> Result<()>;

    /// Remove both entries. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<()>;

    fn has_credential(&self) -> bool {
        matches!(self.credential(), Ok(Some(_)))
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store. Used by tests and by callers embedding the client
/// without persistence.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<(Credential, UserProfile)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a session.
    pub fn with_session(credential: Credential, profile: UserProfile) -> Self {
        Self {
            slot: RwLock::new(Some((credential, profile))),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn credential(&self) -> Result<Option<Credential>> {
        let slot = self.slot.read().map_err(|_| anyhow!("session lock poisoned"))?;
        Ok(slot.as_ref().map(|(credential, _)| credential.clone()))
    }

    fn profile(&self) -> Result<Option<UserProfile>> {
        let slot = self.slot.read().map_err(|_| anyhow!("session lock poisoned"))?;
        Ok(slot.as_ref().map(|(_, profile)| profile.clone()))
    }

    fn set(&self, credential: &Credential, profile: &UserProfile) -> Result<()> {
        let mut slot = self.slot.write().map_err(|_| anyhow!("session lock poisoned"))?;
        *slot = Some((credential.clone(), profile.clone()));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self.slot.write().map_err(|_| anyhow!("session lock poisoned"))?;
        *slot = None;
        Ok(())
    }
}

// ============================================================================
// File store
// ============================================================================

/// On-disk layout: both entries in one document, so a single rename
/// publishes or a single unlink removes them together.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
    user: UserProfile,
}

/// Session persisted as `session.json` in the cache directory.
pub struct FileSessionStore {
    cache_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn read(&self) -> Result<Option<SessionFile>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let file: SessionFile =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(file))
    }

    fn write_atomic(path: &Path, contents: &str) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).context("Failed to write session file")?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            if let Err(cleanup) = std::fs::remove_file(&tmp) {
                warn!(error = %cleanup, path = %tmp.display(), "Failed to remove temporary session file");
            }
            return Err(e).context("Failed to replace session file");
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn credential(&self) -> Result<Option<Credential>> {
        Ok(self.read()?.and_then(|file| Credential::new(file.token)))
    }

    fn profile(&self) -> Result<Option<UserProfile>> {
        Ok(self.read()?.map(|file| file.user))
    }

    fn set(&self, credential: &Credential, profile: &UserProfile) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = SessionFile {
            token: credential.as_str().to_string(),
            user: profile.clone(),
        };
        let contents = serde_json::to_string_pretty(&file)?;
        Self::write_atomic(&path, &contents)?;
        debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Session file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove session file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(token: &str) -> Credential {
        Credential::new(token).expect("non-empty token")
    }

    fn assert_set_and_clear(store: &dyn SessionStore) {
        assert!(store.credential().expect("read").is_none());
        assert!(!store.has_credential());

        store
            .set(&credential("tok123"), &UserProfile::new("alice"))
            .expect("set session");
        assert_eq!(store.credential().expect("read").map(|c| c.as_str().to_string()), Some("tok123".to_string()));
        assert_eq!(store.profile().expect("read").map(|p| p.username), Some("alice".to_string()));

        store.clear().expect("clear session");
        assert!(store.credential().expect("read").is_none());
        assert!(store.profile().expect("read").is_none());

        // Clearing again is a no-op
        store.clear().expect("clear empty session");
        assert!(store.credential().expect("read").is_none());
    }

    #[test]
    fn test_memory_store_set_and_clear() {
        assert_set_and_clear(&MemorySessionStore::new());
    }

    #[test]
    fn test_file_store_set_and_clear() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileSessionStore::new(dir.path().join("nested"));
        assert_set_and_clear(&store);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_overwrites_previous_session() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileSessionStore::new(dir.path().to_path_buf());
        store.set(&credential("first"), &UserProfile::new("alice")).expect("set");
        store.set(&credential("second"), &UserProfile::new("bob")).expect("set");

        assert_eq!(store.credential().expect("read").map(|c| c.as_str().to_string()), Some("second".to_string()));
        assert_eq!(store.profile().expect("read").map(|p| p.username), Some("bob".to_string()));
    }

    #[test]
    fn test_file_store_failed_replace_removes_temp_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileSessionStore::new(dir.path().to_path_buf());
        // A non-empty directory in place of the session file makes the rename fail
        std::fs::create_dir(store.path()).expect("create dir");
        std::fs::write(store.path().join("keep"), "x").expect("write");

        assert!(store.set(&credential("tok123"), &UserProfile::new("alice")).is_err());
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_empty_token_is_unauthenticated() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileSessionStore::new(dir.path().to_path_buf());
        std::fs::write(store.path(), r#"{"token": "", "user": {"username": "alice"}}"#).expect("write");

        assert!(store.credential().expect("read").is_none());
        assert!(!store.has_credential());
    }

    #[test]
    fn test_file_store_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileSessionStore::new(dir.path().to_path_buf());
        std::fs::write(store.path(), "not json").expect("write");

        assert!(store.credential().is_err());
        assert!(!store.has_credential());
    }
}
