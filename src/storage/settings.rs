//! User settings: assistant credential and location preference
//!
//! Built once from the store at startup with [`UserSettings::load`] and
//! passed explicitly to whatever needs it. Every mutation writes through to
//! the store before the in-memory copy changes, so a failed write leaves the
//! previous value in effect.

use serde::Serialize;
use tracing::info;

use super::persistence::{KeyValueStore, StoreError};
use crate::config::defaults;

/// Store key holding the user-supplied assistant key.
pub const API_KEY_SLOT: &str = "gemini_api_key";

/// Store key holding the location preference ("true"/"false").
pub const USE_LOCATION_SLOT: &str = "use_location";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Invalid API key format: {0}")]
    InvalidFormat(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where the active assistant key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    Environment,
    Stored,
    Missing,
}

/// Superficial format check applied before a key is persisted.
///
/// Returns the trimmed key. Does not contact the provider.
pub fn validate_api_key(key: &str, prefix: &str) -> Result<String, CredentialError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CredentialError::InvalidFormat("key is empty".to_string()));
    }
    if !key.starts_with(prefix) {
        return Err(CredentialError::InvalidFormat(format!(
            "key must start with '{prefix}'"
        )));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(CredentialError::InvalidFormat(
            "key must not contain whitespace".to_string(),
        ));
    }
    Ok(key.to_string())
}

/// Explicitly initialised user settings.
#[derive(Debug, Clone, Default)]
pub struct UserSettings {
    env_key: Option<String>,
    stored_key: Option<String>,
    use_location: bool,
}

impl UserSettings {
    /// Load from the store, with `GEMINI_API_KEY` taking precedence over
    /// any stored key.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, StoreError> {
        let env_key = std::env::var(defaults::API_KEY_ENV).ok();
        Self::load_with_env(store, env_key)
    }

    /// Same as [`load`](Self::load) with the environment key supplied by
    /// the caller.
    pub fn load_with_env(
        store: &dyn KeyValueStore,
        env_key: Option<String>,
    ) -> Result<Self, StoreError> {
        let settings = Self {
            env_key: env_key.filter(|k| !k.trim().is_empty()),
            stored_key: store.get(API_KEY_SLOT)?.filter(|k| !k.is_empty()),
            use_location: store.get(USE_LOCATION_SLOT)?.as_deref() == Some("true"),
        };
        info!(
            backend = store.backend_name(),
            key_source = ?settings.key_source(),
            use_location = settings.use_location,
            "User settings loaded"
        );
        Ok(settings)
    }

    /// The key the assistant should use, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.env_key.as_deref().or(self.stored_key.as_deref())
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    pub const fn key_source(&self) -> KeySource {
        match (&self.env_key, &self.stored_key) {
            (Some(_), _) => KeySource::Environment,
            (None, Some(_)) => KeySource::Stored,
            (None, None) => KeySource::Missing,
        }
    }

    /// Active key with everything but the first and last four characters
    /// hidden.
    pub fn masked_key(&self) -> Option<String> {
        self.api_key().map(|key| {
            let chars: Vec<char> = key.chars().collect();
            if chars.len() <= 8 {
                "*".repeat(chars.len())
            } else {
                let head: String = chars[..4].iter().collect();
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{head}…{tail}")
            }
        })
    }

    pub const fn use_location(&self) -> bool {
        self.use_location
    }

    /// Validate and persist a user-supplied key. The environment key, when
    /// present, stays active.
    pub fn set_api_key(
        &mut self,
        store: &dyn KeyValueStore,
        key: &str,
        prefix: &str,
    ) -> Result<(), CredentialError> {
        let key = validate_api_key(key, prefix)?;
        store.set(API_KEY_SLOT, &key)?;
        self.stored_key = Some(key);
        info!(key_source = ?self.key_source(), "Assistant API key stored");
        Ok(())
    }

    pub fn clear_api_key(&mut self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store.remove(API_KEY_SLOT)?;
        self.stored_key = None;
        info!("Stored assistant API key removed");
        Ok(())
    }

    pub fn set_use_location(
        &mut self,
        store: &dyn KeyValueStore,
        enabled: bool,
    ) -> Result<(), StoreError> {
        store.set(USE_LOCATION_SLOT, if enabled { "true" } else { "false" })?;
        self.use_location = enabled;
        Ok(())
    }

    /// Tear down: remove every persisted setting and reset to defaults.
    /// The environment key is not persisted and survives.
    pub fn clear(&mut self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store.remove(API_KEY_SLOT)?;
        store.remove(USE_LOCATION_SLOT)?;
        store.flush()?;
        self.stored_key = None;
        self.use_location = false;
        info!("User settings cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const KEY: &str = "AIzaSyExampleExampleExample1234";

    #[test]
    fn test_validate_api_key() {
        assert_eq!(validate_api_key(&format!("  {KEY}\n"), "AIza").unwrap(), KEY);
        assert!(matches!(
            validate_api_key("", "AIza"),
            Err(CredentialError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_api_key("sk-not-a-gemini-key", "AIza"),
            Err(CredentialError::InvalidFormat(_))
        ));
        assert!(validate_api_key("AIza with space", "AIza").is_err());
    }

    #[test]
    fn test_stored_key_round_trip() {
        let store = MemoryStore::new();
        let mut settings = UserSettings::load_with_env(&store, None).unwrap();
        assert!(!settings.is_configured());
        assert_eq!(settings.key_source(), KeySource::Missing);

        settings.set_api_key(&store, KEY, "AIza").unwrap();
        let reloaded = UserSettings::load_with_env(&store, None).unwrap();
        assert_eq!(reloaded.api_key(), Some(KEY));
        assert_eq!(reloaded.key_source(), KeySource::Stored);
    }

    #[test]
    fn test_invalid_key_is_not_persisted() {
        let store = MemoryStore::new();
        let mut settings = UserSettings::default();
        assert!(settings.set_api_key(&store, "bogus", "AIza").is_err());
        assert_eq!(store.get(API_KEY_SLOT).unwrap(), None);
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_env_key_takes_precedence() {
        let store = MemoryStore::new();
        store.set(API_KEY_SLOT, KEY).unwrap();
        let settings =
            UserSettings::load_with_env(&store, Some("AIzaFromEnvironment0000".to_string())).unwrap();
        assert_eq!(settings.api_key(), Some("AIzaFromEnvironment0000"));
        assert_eq!(settings.key_source(), KeySource::Environment);
    }

    #[test]
    fn test_clear_removes_everything() {
        let store = MemoryStore::new();
        let mut settings = UserSettings::default();
        settings.set_api_key(&store, KEY, "AIza").unwrap();
        settings.set_use_location(&store, true).unwrap();

        settings.clear(&store).unwrap();
        assert!(!settings.is_configured());
        assert!(!settings.use_location());
        assert_eq!(store.get(USE_LOCATION_SLOT).unwrap(), None);
    }

    #[test]
    fn test_masked_key() {
        let store = MemoryStore::new();
        let mut settings = UserSettings::default();
        assert_eq!(settings.masked_key(), None);
        settings.set_api_key(&store, KEY, "AIza").unwrap();
        assert_eq!(settings.masked_key().as_deref(), Some("AIza…1234"));
    }
}
