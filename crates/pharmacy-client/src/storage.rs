//! # Session Persistence
//!
//! Durable storage for the session identity so it survives restarts.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Persisted Session                                  │
//! │                                                                         │
//! │  SessionPersistence                                                    │
//! │  ├── load()  ─── read once at startup                                  │
//! │  ├── save()  ─── write-through on every session mutation               │
//! │  └── clear() ─── logout / forced logout                                │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  dyn KeyValueStorage                                                   │
//! │  ├── MemoryStorage  (tests, ephemeral sessions)                        │
//! │  └── FileStorage    (session.json in the platform data dir)            │
//! │                                                                         │
//! │  Keys:  "token" → raw bearer string                                    │
//! │         "user"  → JSON text of the user record                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the auth module writes here, so there is no read-modify-write
//! coordination beyond the per-call file rewrite.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use pharmacy_core::{Session, UserRecord, TOKEN_KEY, USER_KEY};
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

// =============================================================================
// Key/Value Storage
// =============================================================================

/// String key/value persistence.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// In-process storage. Contents die with the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// A JSON object file on disk.
///
/// Every write rewrites the whole file through a sibling temp file and a
/// rename, so a crash never leaves a half-written document behind.
/// Reads of a corrupt file fail, but the next `set` or `remove` replaces it.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // serializes read-modify-write of the file within this process
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Platform data location (`.../pharmacy-client/session.json`).
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pharmacy", "client")
            .map(|dirs| dirs.data_dir().join("session.json"))
    }

    fn read_all(&self) -> StorageResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Entries to start a rewrite from. A file that is not a JSON object
    /// is discarded so the next write replaces it.
    fn read_for_write(&self) -> StorageResult<(BTreeMap<String, String>, bool)> {
        match self.read_all() {
            Ok(entries) => Ok((entries, false)),
            Err(StorageError::Serialization(reason)) => {
                warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "Session file is corrupt, rewriting it"
                );
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let (mut entries, _) = self.read_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let (mut entries, corrupt) = self.read_for_write()?;
        if entries.remove(key).is_some() || corrupt {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

// =============================================================================
// Session Persistence
// =============================================================================

/// Reads and writes the session pair under the `token` / `user` keys.
#[derive(Clone)]
pub struct SessionPersistence {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionPersistence {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        SessionPersistence { storage }
    }

    /// Persistence that forgets everything at process exit.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Loads the persisted session.
    ///
    /// ## Tolerated Edge Cases
    /// - Either key absent → anonymous
    /// - Empty token → anonymous
    /// - User not valid JSON, or `null` → treated as absent → anonymous
    ///
    /// Storage failures themselves are returned to the caller.
    pub fn load(&self) -> StorageResult<Session> {
        let token = self.storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let user = self.storage.get(USER_KEY)?;

        let user = user.and_then(|raw| match serde_json::from_str::<UserRecord>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Persisted user record is unreadable, ignoring it");
                None
            }
        });

        match (token, user) {
            (Some(token), Some(user)) => {
                debug!("Restored persisted session");
                Ok(Session::authenticated(token, user))
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("Persisted session is incomplete, starting anonymous");
                Ok(Session::anonymous())
            }
            (None, None) => Ok(Session::anonymous()),
        }
    }

    /// Writes the session. An anonymous session clears storage.
    pub fn save(&self, session: &Session) -> StorageResult<()> {
        match (session.token(), session.user()) {
            (Some(token), Some(user)) => {
                let user_json = serde_json::to_string(user)?;
                self.storage.set(TOKEN_KEY, token)?;
                self.storage.set(USER_KEY, &user_json)
            }
            _ => self.clear(),
        }
    }

    /// Removes both keys.
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)
    }
}

impl std::fmt::Debug for SessionPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPersistence").finish_non_exhaustive()
    }
}
