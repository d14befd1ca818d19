//! Session unlock cache.
//!
//! Holds at most one derived vault key in a session-scoped store so reloads
//! inside the TTL window skip the password prompt and the slow KDF. The entry
//! is `{ "until": <ms>, "keyB64": "..." }`. Anything unreadable, expired or of
//! the wrong length reads as absent.

use modulr_crypto::SymmetricKey;
use modulr_store::SessionStore;
use modulr_types::{Clock, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;

#[derive(Serialize, Deserialize)]
struct SessionEntry {
    until: Timestamp,
    #[serde(rename = "keyB64")]
    key_b64: String,
}

pub struct SessionKeyCache {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    storage_key: String,
}

impl SessionKeyCache {
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            storage_key: storage_key.into(),
        }
    }

    /// Replace any cached key with `key`, valid until `now + ttl`.
    pub fn set(&self, key: &SymmetricKey, ttl: Duration) -> Result<(), WalletError> {
        let until = self.clock.now().saturating_add(ttl);
        let mut entry = SessionEntry {
            until,
            key_b64: key.to_base64(),
        };
        let bytes = Zeroizing::new(
            serde_json::to_vec(&entry).map_err(|e| WalletError::Serialization(e.to_string()))?,
        );
        entry.key_b64.zeroize();
        self.store.set(&self.storage_key, &bytes)?;
        tracing::debug!(%until, "unlock key cached");
        Ok(())
    }

    /// The cached key while `now < until`.
    pub fn get(&self) -> Result<Option<SymmetricKey>, WalletError> {
        let Some(bytes) = self.store.get(&self.storage_key)? else {
            return Ok(None);
        };
        let bytes = Zeroizing::new(bytes);
        let mut entry: SessionEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session entry");
                return Ok(None);
            }
        };
        if !self.clock.now().is_before(entry.until) {
            tracing::debug!(until = %entry.until, "cached unlock key expired");
            return Ok(None);
        }
        let key = SymmetricKey::from_base64(&entry.key_b64);
        entry.key_b64.zeroize();
        match key {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed cached key");
                Ok(None)
            }
        }
    }

    pub fn clear(&self) -> Result<(), WalletError> {
        self.store.remove(&self.storage_key)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulr_nullables::{NullClock, NullStore};
    use modulr_store::KeyValueStore;

    const KEY: &str = "modulr.session.unlock.v1";

    fn cache() -> (SessionKeyCache, Arc<NullStore>, Arc<NullClock>) {
        let store = Arc::new(NullStore::new());
        let clock = Arc::new(NullClock::new(1_000_000));
        let cache = SessionKeyCache::new(store.clone(), clock.clone(), KEY);
        (cache, store, clock)
    }

    #[test]
    fn returns_key_until_expiry() {
        let (cache, _, clock) = cache();
        let key = SymmetricKey::new([3u8; 32]);
        cache.set(&key, Duration::from_secs(900)).unwrap();
        assert_eq!(cache.get().unwrap(), Some(key.clone()));

        clock.advance(Duration::from_secs(899));
        assert_eq!(cache.get().unwrap(), Some(key));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get().unwrap(), None);
    }

    #[test]
    fn set_overwrites_previous_entry() {
        let (cache, _, _) = cache();
        cache.set(&SymmetricKey::new([1u8; 32]), Duration::from_secs(60)).unwrap();
        cache.set(&SymmetricKey::new([2u8; 32]), Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get().unwrap(), Some(SymmetricKey::new([2u8; 32])));
    }

    #[test]
    fn clear_is_immediate() {
        let (cache, store, _) = cache();
        cache.set(&SymmetricKey::new([1u8; 32]), Duration::from_secs(900)).unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.get().unwrap(), None);
        assert!(!store.contains(KEY));
        // Clearing an empty cache is fine.
        cache.clear().unwrap();
    }

    #[test]
    fn entry_shape() {
        let (cache, store, _) = cache();
        let key = SymmetricKey::new([5u8; 32]);
        cache.set(&key, Duration::from_secs(10)).unwrap();
        let raw = store.get(KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["until"], 1_010_000);
        assert_eq!(json["keyB64"], key.to_base64());
    }

    #[test]
    fn garbage_reads_as_absent() {
        let (cache, store, _) = cache();
        store.set(KEY, b"{not json").unwrap();
        assert_eq!(cache.get().unwrap(), None);
        store
            .set(KEY, br#"{"until":99999999999,"keyB64":"AAAA"}"#)
            .unwrap();
        assert_eq!(cache.get().unwrap(), None);
    }
}
