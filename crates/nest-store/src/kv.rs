//! Local, single-client key-value snapshot storage.
//!
//! The auth emulator keeps its session snapshot under one fixed key. In a
//! browser that key would live in local storage; here the seam is the
//! [`KeyValueStore`] trait, with an in-memory backend for tests and a
//! directory-of-files backend for the CLI.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// String-keyed, string-valued snapshot storage.
///
/// Implementations are single-client: there is no compare-and-swap and the
/// last writer wins.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is not set.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Returns `true` if it was set.
    fn remove(&self, key: &str) -> StoreResult<bool>;
}

/// `HashMap`-backed [`KeyValueStore`]. Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(entries.remove(key).is_some())
    }
}

/// [`KeyValueStore`] that keeps one `<key>.json` file per key in a directory.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a crash never leaves a half-written snapshot behind.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Use `dir` as the backing directory. It is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Persist {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        debug!(key, path = %path.display(), "snapshot written");
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keys become file names, so they are restricted to a portable alphabet.
fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty".into(),
        });
    }
    if key.starts_with('.') {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key may not start with '.'".into(),
        });
    }
    if let Some(c) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: format!("unsupported character {c:?}"),
        });
    }
    Ok(())
}
