//! Persistent key-value storage for session data.
//!
//! The session keeps exactly two entries, `auth_token` and `auth_user`,
//! and only needs get/set/remove by key. Backends:
//! - `FileStore`: a JSON file in the cache directory
//! - `KeyringStore`: the OS keychain
//! - `MemoryStore`: process-local, used by tests and throwaway sessions

pub mod file;
pub mod keychain;
pub mod memory;

pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Store key for the raw bearer token
pub const TOKEN_KEY: &str = "auth_token";

/// Store key for the JSON-serialized user profile
pub const USER_KEY: &str = "auth_user";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] ::keyring::Error),
}

/// Durable string storage that survives process restarts.
///
/// Removing a key that is not present is not an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
