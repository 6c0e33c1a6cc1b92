use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

use super::{Credential, SessionStore, UserProfile};

const SERVICE_NAME: &str = "textdash";

/// Keychain entry holding the bearer token
const TOKEN_KEY: &str = "token";

/// Keychain entry holding the serialized user profile
const USER_KEY: &str = "user";

/// Named secret slots, one value per key.
pub trait SecretSlots: Send + Sync {
    /// `None` when the slot holds nothing.
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    /// Removing an empty slot is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Slots backed by the OS keychain under one service name.
pub struct KeyringSlots {
    service: String,
}

impl KeyringSlots {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }
}

impl SecretSlots for KeyringSlots {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read from keychain"),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to write to keychain")
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete keychain entry"),
        }
    }
}

/// Session kept as two secret slots.
///
/// The token slot is emptied before anything else is written or removed and
/// filled last, so a token is never visible without its profile.
pub struct KeyringSessionStore<S = KeyringSlots> {
    slots: S,
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

impl KeyringSessionStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self::with_slots(KeyringSlots::new(service))
    }
}

impl<S: SecretSlots> KeyringSessionStore<S> {
    pub fn with_slots(slots: S) -> Self {
        Self { slots }
    }

    fn write_session(&self, credential: &Credential, profile: &UserProfile) -> Result<()> {
        let json = serde_json::to_string(profile)?;
        self.slots
            .write(USER_KEY, &json)
            .context("Failed to store user profile")?;
        self.slots
            .write(TOKEN_KEY, credential.as_str())
            .context("Failed to store token")
    }
}

impl<S: SecretSlots> SessionStore for KeyringSessionStore<S> {
    fn credential(&self) -> Result<Option<Credential>> {
        Ok(self.slots.read(TOKEN_KEY)?.and_then(Credential::new))
    }

    fn profile(&self) -> Result<Option<UserProfile>> {
        match self.slots.read(USER_KEY)? {
            Some(json) => {
                let profile = serde_json::from_str(&json).context("Failed to parse stored user profile")?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    fn set(&self, credential: &Credential, profile: &UserProfile) -> Result<()> {
        // Drop the old token first so it can never pair with the new profile
        self.slots.remove(TOKEN_KEY).context("Failed to remove old token")?;

        if let Err(e) = self.write_session(credential, profile) {
            if let Err(rollback) = self.clear() {
                warn!(error = %rollback, "Failed to roll back partial session");
            }
            return Err(e);
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.slots.remove(TOKEN_KEY)?;
        self.slots.remove(USER_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory slots that can refuse writes to one key and record every
    /// operation in order.
    #[derive(Default)]
    struct MemorySlots {
        values: Mutex<HashMap<String, String>>,
        log: Mutex<Vec<String>>,
        fail_writes_to: Option<&'static str>,
    }

    impl MemorySlots {
        fn failing(key: &'static str) -> Self {
            Self {
                fail_writes_to: Some(key),
                ..Self::default()
            }
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().expect("log lock").clone()
        }
    }

    impl SecretSlots for MemorySlots {
        fn read(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().expect("values lock").get(key).cloned())
        }

        fn write(&self, key: &str, value: &str) -> Result<()> {
            self.log.lock().expect("log lock").push(format!("write {}", key));
            if self.fail_writes_to == Some(key) {
                bail!("keychain locked");
            }
            self.values
                .lock()
                .expect("values lock")
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.log.lock().expect("log lock").push(format!("remove {}", key));
            self.values.lock().expect("values lock").remove(key);
            Ok(())
        }
    }

    fn credential(token: &str) -> Credential {
        Credential::new(token).expect("non-empty token")
    }

    /// Seeds an existing session directly, bypassing `set`.
    fn seed(slots: &MemorySlots, token: &str, username: &str) {
        let json = serde_json::to_string(&UserProfile::new(username)).expect("serialize profile");
        let mut values = slots.values.lock().expect("values lock");
        values.insert(TOKEN_KEY.to_string(), token.to_string());
        values.insert(USER_KEY.to_string(), json);
    }

    #[test]
    fn test_set_and_clear() {
        let store = KeyringSessionStore::with_slots(MemorySlots::default());
        store.set(&credential("tok123"), &UserProfile::new("alice")).expect("set");

        assert_eq!(store.credential().expect("read"), Some(credential("tok123")));
        assert_eq!(store.profile().expect("read").map(|p| p.username), Some("alice".to_string()));

        store.clear().expect("clear");
        store.clear().expect("clear twice");
        assert!(store.credential().expect("read").is_none());
        assert!(store.profile().expect("read").is_none());
    }

    #[test]
    fn test_set_removes_token_first_and_writes_it_last() {
        let store = KeyringSessionStore::with_slots(MemorySlots::default());
        store.set(&credential("tok123"), &UserProfile::new("alice")).expect("set");

        assert_eq!(store.slots.log(), ["remove token", "write user", "write token"]);
    }

    #[test]
    fn test_failed_token_write_leaves_no_session() {
        let slots = MemorySlots::failing(TOKEN_KEY);
        seed(&slots, "tokA", "old");
        let store = KeyringSessionStore::with_slots(slots);

        assert!(store.set(&credential("tokB"), &UserProfile::new("new")).is_err());

        assert!(store.credential().expect("read").is_none());
        assert!(store.profile().expect("read").is_none());
    }

    #[test]
    fn test_failed_profile_write_drops_old_token() {
        let slots = MemorySlots::failing(USER_KEY);
        seed(&slots, "tokA", "old");
        let store = KeyringSessionStore::with_slots(slots);

        assert!(store.set(&credential("tokB"), &UserProfile::new("new")).is_err());

        assert!(store.credential().expect("read").is_none());
        assert!(store.profile().expect("read").is_none());
    }
}
