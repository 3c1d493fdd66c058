use std::sync::{Arc, Mutex};

use tracing::warn;

use super::{SEARCH_HISTORY_KEY, StateStore};

/// Number of queries kept.
pub const SEARCH_HISTORY_LIMIT: usize = 5;

/// Recent search queries, newest first, without duplicates.
pub struct SearchHistory {
    store: Arc<dyn StateStore>,
    entries: Mutex<Vec<String>>,
}

impl SearchHistory {
    /// Load history from `store`. Unparseable history starts empty.
    pub fn load(store: Arc<dyn StateStore>) -> Self {
        let mut entries: Vec<String> = store
            .get(SEARCH_HISTORY_KEY)
            .and_then(|raw| match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!(error = %e, "ignoring corrupt search history");
                    None
                }
            })
            .unwrap_or_default();
        entries.truncate(SEARCH_HISTORY_LIMIT);
        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Move `query` to the front, dropping the oldest entry past the limit.
    ///
    /// A failure to persist is logged; the in-memory history is still updated.
    pub fn record(&self, query: &str) {
        let mut entries = self.lock();
        entries.retain(|q| q != query);
        entries.insert(0, query.to_string());
        entries.truncate(SEARCH_HISTORY_LIMIT);
        self.persist(&entries);
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.clear();
        if let Err(e) = self.store.remove(SEARCH_HISTORY_KEY) {
            warn!(error = %e, "failed to clear search history");
        }
    }

    fn persist(&self, entries: &[String]) {
        let result = serde_json::to_string(entries)
            .map_err(Into::into)
            .and_then(|json| self.store.set(SEARCH_HISTORY_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist search history");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn newest_first_deduplicated_and_capped() {
        let store = Arc::new(MemoryStore::new());
        let history = SearchHistory::load(store.clone());
        for q in ["a", "b", "c", "d", "e", "f", "c"] {
            history.record(q);
        }
        assert_eq!(history.entries(), vec!["c", "f", "e", "d", "b"]);

        let reloaded = SearchHistory::load(store);
        assert_eq!(reloaded.entries(), vec!["c", "f", "e", "d", "b"]);
    }

    #[test]
    fn corrupt_history_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(SEARCH_HISTORY_KEY, "not-json").unwrap();
        let history = SearchHistory::load(store);
        assert!(history.entries().is_empty());
    }

    #[test]
    fn clear_removes_persisted_entries() {
        let store = Arc::new(MemoryStore::new());
        let history = SearchHistory::load(store.clone());
        history.record("biology");
        history.clear();
        assert!(history.entries().is_empty());
        assert_eq!(store.get(SEARCH_HISTORY_KEY), None);
    }
}
