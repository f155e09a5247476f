//! Settings Storage
//!
//! Persists the few user settings the dashboard keeps between runs: the
//! assistant API key and the location preference. Backends implement
//! [`KeyValueStore`]; sled on disk, a `HashMap` in tests.

pub mod persistence;
pub mod settings;
mod sled_store;

pub use persistence::{KeyValueStore, MemoryStore, StoreError};
pub use settings::{validate_api_key, CredentialError, KeySource, UserSettings};
pub use sled_store::SledStore;
