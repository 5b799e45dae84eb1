//! Durable key-value storage for client state.
//!
//! `LocalStore` persists a flat string map (`token`, `refreshToken`, `user`,
//! `theme`) to a JSON file. Storage is an injected capability: a store opened
//! without a backing directory keeps everything in memory and every operation
//! still succeeds, so code running in a context without persistence degrades
//! instead of erroring.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

/// Store file name inside the data directory.
const STORE_FILE: &str = "store.json";

/// Shared key-value store. Clone is cheap - handles share one map and one
/// backing file, so the session store and theme preference see each other's
/// writes.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    path: Option<PathBuf>,
    values: HashMap<String, String>,
}

impl LocalStore {
    /// Open a store backed by `dir`, loading any values persisted there.
    /// Passing `None` yields an in-memory-only store.
    pub fn open(dir: Option<PathBuf>) -> Self {
        let path = dir.map(|d| d.join(STORE_FILE));
        let values = match &path {
            Some(p) if p.exists() => match std::fs::read_to_string(p) {
                Ok(contents) => match serde_json::from_str(&contents) {
                    Ok(values) => values,
                    Err(e) => {
                        warn!(error = %e, "Persisted store is malformed, starting empty");
                        HashMap::new()
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Failed to read persisted store, starting empty");
                    HashMap::new()
                }
            },
            _ => HashMap::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(Inner { path, values })),
        }
    }

    /// An in-memory-only store for contexts without persistence.
    pub fn in_memory() -> Self {
        Self::open(None)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.values.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.values.insert(key.to_string(), value.to_string());
        inner.flush();
    }

    pub fn remove(&self, key: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if inner.values.remove(key).is_some() {
            inner.flush();
        }
    }
}

impl Inner {
    /// Write the map back to disk. Persistence failures are logged, never
    /// surfaced: the in-memory state stays authoritative for this process.
    fn flush(&self) {
        let Some(ref path) = self.path else {
            debug!("No storage backing, keeping state in memory");
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(error = %e, "Failed to create storage directory");
                return;
            }
        }

        match serde_json::to_string_pretty(&self.values) {
            Ok(contents) => {
                if let Err(e) = std::fs::write(path, contents) {
                    warn!(error = %e, "Failed to persist store");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize store"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let store = LocalStore::in_memory();
        store.set("token", "abc");
        assert_eq!(store.get("token").as_deref(), Some("abc"));
        store.remove("token");
        assert_eq!(store.get("token"), None);
    }

    #[test]
    fn persisted_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(Some(dir.path().to_path_buf()));
        store.set("theme", "dark");
        drop(store);

        let reopened = LocalStore::open(Some(dir.path().to_path_buf()));
        assert_eq!(reopened.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn in_memory_store_never_errors() {
        let store = LocalStore::in_memory();
        store.set("token", "abc");
        store.remove("token");
        store.remove("token");
        assert_eq!(store.get("token"), None);
    }

    #[test]
    fn malformed_store_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), "not json").unwrap();

        let store = LocalStore::open(Some(dir.path().to_path_buf()));
        assert_eq!(store.get("token"), None);
    }

    #[test]
    fn clones_share_state() {
        let store = LocalStore::in_memory();
        let other = store.clone();
        store.set("theme", "dark");
        assert_eq!(other.get("theme").as_deref(), Some("dark"));
    }
}
