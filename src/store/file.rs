use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use super::StateStore;
use crate::{MimirError, Result};

/// [`StateStore`] backed by a JSON object on disk.
///
/// The whole map is loaded on open and rewritten atomically (tmp file +
/// rename) on every change. A missing file starts empty; an unreadable or
/// corrupt one is logged and also starts empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = load(&path).unwrap_or_default();
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// `<data_dir>/mimir/state.json`
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join("mimir")
            .join("state.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        change(&mut values);
        save(&self.path, &values)
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

fn load(path: &Path) -> Option<BTreeMap<String, String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read state file");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(values) => Some(values),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt state file");
            None
        }
    }
}

fn save(path: &Path, values: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            MimirError::Storage(format!(
                "failed to create state dir {}: {e}",
                parent.display()
            ))
        })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(values)?;
    std::fs::write(&tmp_path, json).map_err(|e| {
        MimirError::Storage(format!(
            "failed to write state file {}: {e}",
            tmp_path.display()
        ))
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        MimirError::Storage(format!(
            "failed to rename state file {} → {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TOKEN_KEY;

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStore::open(&path);
        store.set(TOKEN_KEY, "secret").unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("secret"));
        reopened.remove(TOKEN_KEY).unwrap();
        assert_eq!(FileStore::open(&path).get(TOKEN_KEY), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get(TOKEN_KEY), None);
        store.set(TOKEN_KEY, "fresh").unwrap();
        assert_eq!(FileStore::open(&path).get(TOKEN_KEY).as_deref(), Some("fresh"));
    }

    #[test]
    fn default_path_is_under_mimir() {
        let path = FileStore::default_path();
        assert!(path.ends_with("mimir/state.json"));
    }
}
