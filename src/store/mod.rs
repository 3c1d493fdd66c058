//! Durable client state.
//!
//! The client keeps a small string key/value map that outlives the process:
//! the auth token under [`TOKEN_KEY`] and recent searches under
//! [`SEARCH_HISTORY_KEY`]. [`FileStore`] persists it as a JSON object on
//! disk; [`MemoryStore`] keeps it in memory for tests and embedded use.

mod file;
mod history;

use std::collections::BTreeMap;
use std::sync::Mutex;

pub use file::FileStore;
pub use history::{SEARCH_HISTORY_LIMIT, SearchHistory};

use crate::Result;

/// Key holding the auth token.
pub const TOKEN_KEY: &str = "token";

/// Key holding recent search queries (JSON array, newest first).
pub const SEARCH_HISTORY_KEY: &str = "searchHistory";

/// String key/value storage shared by the gateway and the HTTP client.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory [`StateStore`]; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(TOKEN_KEY), None);
        store.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("abc"));
        store.remove(TOKEN_KEY).unwrap();
        store.remove(TOKEN_KEY).unwrap();
        assert_eq!(store.get(TOKEN_KEY), None);
    }
}
