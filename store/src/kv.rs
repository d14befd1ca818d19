//! Key-value storage traits.

use crate::StoreError;

/// A flat byte store addressed by string keys.
///
/// Implementations use interior mutability so a store can be shared behind an
/// `Arc` by several owners.
pub trait KeyValueStore: Send + Sync {
    /// Retrieve the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// A store whose contents end with the current session (process or tab).
///
/// Marker only: it lets signatures say a value must never outlive the session,
/// as with cached unlock keys.
pub trait SessionStore: KeyValueStore {}
