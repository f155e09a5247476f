//! KeyValueStore trait: pluggable settings backend
//!
//! The only durable state is a handful of user settings (assistant API key,
//! location preference), so the abstraction is a flat string key-value map:
//! - `MemoryStore`: in-memory store for tests and throwaway runs
//! - `SledStore`: on-disk store (see `sled_store.rs`)

use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for pluggable settings backends
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across request handlers.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Make previous writes durable
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("stored value for '{0}' is not valid UTF-8")]
    Encoding(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// In-memory store for testing. Not durable: data lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_trait_object() {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        assert_eq!(store.backend_name(), "InMemory");
        store.set("a", "1").unwrap();
        store.flush().unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }
}
