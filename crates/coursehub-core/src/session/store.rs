//! Durable token storage.
//!
//! Tokens live in `<COURSEHUB_HOME>/session.json` under the fixed keys
//! `token` and `refreshToken`, written with restricted permissions (0600).
//! Tokens are never logged or displayed in full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Session;
use crate::config::paths;

/// Persistence contract for the token pair.
pub trait TokenStore: Send + Sync {
    /// Persists both tokens, replacing any previous pair.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, access_token: &str, refresh_token: &str) -> Result<()>;

    /// Reads the stored pair. `None` when no complete pair is stored.
    ///
    /// # Errors
    /// Returns an error if the backing storage exists but cannot be read.
    fn load(&self) -> Result<Option<Session>>;

    /// Removes both tokens.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<()>;
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn save(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        (**self).save(access_token, refresh_token)
    }

    fn load(&self) -> Result<Option<Session>> {
        (**self).load()
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// On-disk layout. Key names are fixed so other tools can read the file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    refresh_token: Option<String>,
}

/// Token store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under `COURSEHUB_HOME`.
    pub fn default_location() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoredTokens> {
        if !self.path.exists() {
            return Ok(StoredTokens::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))
    }

    fn write(&self, tokens: &StoredTokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(tokens).context("Failed to serialize session")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.write(&StoredTokens {
            token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
        })
    }

    fn load(&self) -> Result<Option<Session>> {
        let stored = self.read()?;
        Ok(match (stored.token, stored.refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() => {
                Some(Session::new(access, refresh))
            }
            _ => None,
        })
    }

    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.write(&StoredTokens::default())
    }
}

/// In-process token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a session.
    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Session::new(access_token, refresh_token));
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn clear(&self) -> Result<()> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_uses_fixed_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = FileTokenStore::new(&path);

        store.save("A1", "R1").unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["token"], "A1");
        assert_eq!(json["refreshToken"], "R1");
        assert_eq!(store.load().unwrap(), Some(Session::new("A1", "R1")));
    }

    #[test]
    fn test_file_store_clear_removes_both_tokens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileTokenStore::new(&path);
        store.save("A1", "R1").unwrap();

        store.clear().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("A1"));
        assert!(!contents.contains("R1"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let err = FileTokenStore::new(&path).load().unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse session"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileTokenStore::new(&path).save("A1", "R1").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        store.save("A1", "R1").unwrap();
        assert_eq!(store.load().unwrap(), Some(Session::new("A1", "R1")));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
