use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use keyring::Entry;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::config_directory;

const SERVICE_NAME: &str = "com.docente-portal.app";
const SESSION_FILE: &str = "session.json";

/// Errors raised by the local key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no value stored under '{key}'")]
    Missing { key: String },
    #[error("value stored under '{key}' is unusable: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("keyring operation failed: {0}")]
    Keyring(String),
}

impl StoreError {
    pub fn is_missing(&self) -> bool {
        matches!(self, StoreError::Missing { .. })
    }
}

/// Device-local persistence for the session blob and the docente id.
pub trait KeyValueStore: Send + Sync {
    /// Returns [`StoreError::Missing`] when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<String, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read the stored docente id.
pub fn read_docente_id(store: &dyn KeyValueStore, key: &str) -> Result<i64, StoreError> {
    let raw = store.get(key)?;
    raw.trim().parse::<i64>().map_err(|err| StoreError::Corrupt {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

/// JSON object on disk mapping keys to string values.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store living next to `config.toml`.
    pub fn default_location() -> Self {
        Self::new(config_directory().join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(StoreError::Io(err)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("{} is not a valid session file: {err}", self.path.display()),
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_string_pretty(entries).map_err(|err| StoreError::Corrupt {
            key: String::new(),
            reason: err.to_string(),
        })?;
        fs::write(&self.path, encoded)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600));
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<String, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.read_all(key)?
            .remove(key)
            .ok_or_else(|| StoreError::Missing {
                key: key.to_string(),
            })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.read_all(key).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "Replacing unreadable session file");
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)?;
        debug!(key, path = %self.path.display(), "Stored session value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = match self.read_all(key) {
            Ok(entries) => entries,
            Err(StoreError::Corrupt { .. }) => BTreeMap::new(),
            Err(err) => return Err(err),
        };
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Values kept in the host operating system's keyring, one entry per key.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Entry::new(&self.service, key).map_err(|err| StoreError::Keyring(err.to_string()))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<String, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            Ok(_) | Err(keyring::Error::NoEntry) => Err(StoreError::Missing {
                key: key.to_string(),
            }),
            Err(keyring::Error::BadEncoding(_)) => Err(StoreError::Corrupt {
                key: key.to_string(),
                reason: "keyring entry is not valid UTF-8".to_string(),
            }),
            Err(err) => Err(StoreError::Keyring(err.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|err| StoreError::Keyring(err.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(StoreError::Keyring(err.to_string())),
        }
    }
}

/// In-process store, handy for demos and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<String, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(key).cloned().ok_or_else(|| StoreError::Missing {
            key: key.to_string(),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.remove(key);
        Ok(())
    }
}
