//! Durable key-value storage for serialized collections.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;

/// Storage key for the serialized item collection.
pub const ITEMS_KEY: &str = "shopping-items";
/// Storage key for the serialized category sequence.
pub const CATEGORIES_KEY: &str = "shopping-categories";

/// String-keyed durable storage.
///
/// [`crate::ListStore`] writes the full serialized collection under a
/// fixed key after every mutation, so implementations only need atomic
/// whole-value get and set.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile cache for tests and setups that rely on the remote store for
/// durability.
#[derive(Default)]
pub struct MemoryCache {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_of_missing_key_is_none() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nope").unwrap(), None);
    }

    #[test]
    fn set_overwrites() {
        let cache = MemoryCache::new();
        cache.set(ITEMS_KEY, "[]").unwrap();
        cache.set(ITEMS_KEY, "[1]").unwrap();
        assert_eq!(cache.get(ITEMS_KEY).unwrap().as_deref(), Some("[1]"));
    }
}
