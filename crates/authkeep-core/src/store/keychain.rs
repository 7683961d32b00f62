use keyring::Entry;

use super::{KeyValueStore, StoreError};

/// Default keychain service name
pub const DEFAULT_SERVICE: &str = "authkeep";

/// Key-value store backed by the OS keychain, one entry per key.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SERVICE: &str = "authkeep-test";

    #[test]
    fn test_set_get_remove_roundtrip() {
        let store = KeyringStore::new(TEST_SERVICE);
        if let Err(e) = store.set("auth_token", "T1") {
            eprintln!("Skipping test: no OS keychain available ({})", e);
            return;
        }

        // A fresh store instance must see the value written by the first one
        let reopened = KeyringStore::new(TEST_SERVICE);
        let got = reopened.get("auth_token");
        let _ = store.remove("auth_token");
        assert_eq!(got.unwrap().as_deref(), Some("T1"));

        assert_eq!(reopened.get("auth_token").unwrap(), None);
        assert!(reopened.remove("auth_token").is_ok());
    }
}
