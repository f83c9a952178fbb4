//! Key-value persistence for collections and mock server settings.
//!
//! The desktop application keeps one JSON document with top-level keys;
//! `JsonFileStore` reads and rewrites that document, `InMemoryStore` backs
//! tests and embedded use.

use super::settings::MockServerSettings;
use crate::collection::Collection;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const SETTINGS_KEY: &str = "mockServerSettings";
pub const COLLECTIONS_KEY: &str = "collections";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read store {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write store {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Store {path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid value for key '{key}': {source}")]
    InvalidValue {
        key: String,
        source: serde_json::Error,
    },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Storage backend for top-level JSON values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<Map<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.data.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON file holding an object of keys.
///
/// The file is read once at open and rewritten in full on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store; a missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Map::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Store {} does not exist yet, starting empty", path.display());
                Map::new()
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, data: &Map<String, Value>) -> Result<(), StoreError> {
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = serde_json::to_string_pretty(data).map_err(|e| write_err(e.into()))?;
        // Write-then-rename so a crash never leaves a truncated store behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut data = self.data.lock();
        let previous = data.insert(key.to_string(), value);
        if let Err(e) = self.flush(&data) {
            match previous {
                Some(old) => data.insert(key.to_string(), old),
                None => data.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

/// Load settings; an absent key yields defaults.
pub fn load_settings(store: &dyn KeyValueStore) -> Result<MockServerSettings, StoreError> {
    match store.get(SETTINGS_KEY)? {
        None | Some(Value::Null) => Ok(MockServerSettings::default()),
        Some(value) => serde_json::from_value::<MockServerSettings>(value)
            .map(MockServerSettings::sanitized)
            .map_err(|source| StoreError::InvalidValue {
                key: SETTINGS_KEY.to_string(),
                source,
            }),
    }
}

pub fn save_settings(
    store: &dyn KeyValueStore,
    settings: &MockServerSettings,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(settings).map_err(|source| StoreError::InvalidValue {
        key: SETTINGS_KEY.to_string(),
        source,
    })?;
    store.set(SETTINGS_KEY, value)
}

pub fn load_collections(store: &dyn KeyValueStore) -> Result<Vec<Collection>, StoreError> {
    match store.get(COLLECTIONS_KEY)? {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value).map_err(|source| StoreError::InvalidValue {
                key: COLLECTIONS_KEY.to_string(),
                source,
            })
        }
    }
}

pub fn save_collections(
    store: &dyn KeyValueStore,
    collections: &[Collection],
) -> Result<(), StoreError> {
    let value = serde_json::to_value(collections).map_err(|source| StoreError::InvalidValue {
        key: COLLECTIONS_KEY.to_string(),
        source,
    })?;
    store.set(COLLECTIONS_KEY, value)
}
