use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BmsError;
use crate::BmsResult;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Key holding the JSON identity snapshot.
pub const IDENTITY_KEY: &str = "user";

/// Durable client-side key/value storage for the session credential.
///
/// The session manager keeps [`TOKEN_KEY`] and [`IDENTITY_KEY`] both present
/// or both absent.
pub trait CredentialStore {
    fn get(&self, key: &str) -> BmsResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> BmsResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn clear(&mut self, key: &str) -> BmsResult<()>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for &mut S {
    fn get(&self, key: &str) -> BmsResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> BmsResult<()> {
        (**self).set(key, value)
    }

    fn clear(&mut self, key: &str) -> BmsResult<()> {
        (**self).clear(key)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store, for tests and embedders that persist elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> BmsResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> BmsResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self, key: &str) -> BmsResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Keys stored as one flat JSON object in a file. The file is removed once
/// the last key is cleared.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BmsResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| BmsError::Storage(format!("Failed to read '{}': {}", self.path.display(), e)))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // A corrupt file holds nothing usable; the next write replaces it.
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> BmsResult<()> {
        if entries.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)
            .map_err(|e| BmsError::Storage(format!("Failed to write '{}': {}", self.path.display(), e)))
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> BmsResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> BmsResult<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn clear(&mut self, key: &str) -> BmsResult<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}
