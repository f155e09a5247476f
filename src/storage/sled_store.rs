//! Sled-backed settings store

use std::path::Path;

use tracing::info;

use super::persistence::{KeyValueStore, StoreError};

/// Settings persisted in a sled tree.
///
/// Values are UTF-8 strings. Every write is flushed, since settings change
/// rarely and a lost credential is more annoying than a slow write.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        info!(path = %path_ref.display(), "Settings store opened");
        Ok(Self { db })
    }

    /// Temporary database removed on drop (tests and `--ephemeral` runs).
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.db
            .get(key)?
            .map(|bytes| {
                String::from_utf8(bytes.to_vec()).map_err(|_| StoreError::Encoding(key.to_string()))
            })
            .transpose()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.db.insert(key, value.as_bytes())?;
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.db.remove(key)?;
        self.flush()
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.db");

        {
            let store = SledStore::open(&path).unwrap();
            store.set("gemini_api_key", "AIzaTest").unwrap();
        }

        let store = SledStore::open(&path).unwrap();
        assert_eq!(store.get("gemini_api_key").unwrap().as_deref(), Some("AIzaTest"));
        store.remove("gemini_api_key").unwrap();
        assert_eq!(store.get("gemini_api_key").unwrap(), None);
    }

    #[test]
    fn test_temporary_store() {
        let store = SledStore::temporary().unwrap();
        assert_eq!(store.backend_name(), "sled");
        store.set("use_location", "true").unwrap();
        assert_eq!(store.get("use_location").unwrap().as_deref(), Some("true"));
    }
}
