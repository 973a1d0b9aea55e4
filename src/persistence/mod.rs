//! Save data persistence
//!
//! Progress is stored as JSON under a single key in a [`KeyValueStore`]:
//! browser LocalStorage on wasm32, an in-memory map everywhere else.
//! Failures never reach the simulation; callers log them and fall back.

use std::collections::HashMap;
use std::fmt;

pub mod progress;

pub use progress::{LevelBest, ProgressData};

/// Why a save or load did not go through
#[derive(Debug, Clone, PartialEq)]
pub enum PersistError {
    /// No storage backend (private browsing, storage disabled)
    Unavailable,
    /// The backend refused the operation
    Storage(String),
    /// Stored data could not be parsed
    Corrupt(String),
    /// Data could not be encoded
    Encode(String),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Unavailable => write!(f, "storage unavailable"),
            PersistError::Storage(msg) => write!(f, "storage error: {}", msg),
            PersistError::Corrupt(msg) => write!(f, "corrupt save data: {}", msg),
            PersistError::Encode(msg) => write!(f, "failed to encode save data: {}", msg),
        }
    }
}

impl std::error::Error for PersistError {}

/// String key/value storage
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistError>;
}

/// Volatile store used natively and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// Open the window's LocalStorage
    pub fn open() -> Result<Self, PersistError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(PersistError::Unavailable)?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error(err: wasm_bindgen::JsValue) -> PersistError {
    PersistError::Storage(format!("{:?}", err))
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        self.storage.get_item(key).map_err(js_error)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.storage.set_item(key, value).map_err(js_error)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.storage.remove_item(key).map_err(js_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.read("k").unwrap(), None);
        store.write("k", "v").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.read("k").unwrap(), None);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(PersistError::Unavailable.to_string(), "storage unavailable");
        assert!(PersistError::Corrupt("eof".into()).to_string().contains("eof"));
    }
}
