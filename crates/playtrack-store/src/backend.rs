//! Key/value storage backends.
//!
//! `StorageBackend` mirrors the flat key → JSON-document model of the
//! host's storage area: values are opaque JSON, one document per key.
//! The trait is synchronous; async code drives it via `spawn_blocking`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store holds malformed JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Flat key/value storage with JSON values.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;
    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
}

// ─── JSON file backend ────────────────────────────────────────────

/// All keys live in one JSON object document on disk, read-modify-written
/// whole. Writes go through a temp file + rename so a crash mid-write
/// cannot leave a truncated document.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<BTreeMap<String, serde_json::Value>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, doc: &BTreeMap<String, serde_json::Value>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(doc)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageBackend for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.read_document()?.remove(key))
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut doc = self.read_document()?;
        doc.insert(key.to_string(), value);
        self.write_document(&doc)
    }
}

// ─── In-memory backend ────────────────────────────────────────────

/// Process-local backend for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("absent").expect("get").is_none());
    }

    #[test]
    fn memory_store_set_then_get() {
        let store = MemoryStore::new();
        store
            .set("k", serde_json::json!({"a": 1}))
            .expect("set");
        assert_eq!(
            store.get("k").expect("get"),
            Some(serde_json::json!({"a": 1}))
        );
    }

    #[test]
    fn file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("store.json"));
        assert!(store.get("anything").expect("get").is_none());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("store.json"));

        store
            .set("settings", serde_json::json!({"userId": 2}))
            .expect("set");
        store
            .set("mappings", serde_json::json!([{"gameSlug": "abc"}]))
            .expect("set");

        assert_eq!(
            store.get("settings").expect("get"),
            Some(serde_json::json!({"userId": 2}))
        );
        assert_eq!(
            store.get("mappings").expect("get"),
            Some(serde_json::json!([{"gameSlug": "abc"}]))
        );
    }

    #[test]
    fn file_store_overwrites_key_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("store.json"));

        store.set("k", serde_json::json!(1)).expect("set");
        store.set("k", serde_json::json!(2)).expect("set");
        assert_eq!(store.get("k").expect("get"), Some(serde_json::json!(2)));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");

        JsonFileStore::new(&path)
            .set("k", serde_json::json!("v"))
            .expect("set");
        assert_eq!(
            JsonFileStore::new(&path).get("k").expect("get"),
            Some(serde_json::json!("v"))
        );
    }

    #[test]
    fn file_store_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/deeper/store.json");
        let store = JsonFileStore::new(&path);
        store.set("k", serde_json::json!(true)).expect("set");
        assert!(path.exists());
    }

    #[test]
    fn file_store_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").expect("write");

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get("k"), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn file_store_empty_file_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        std::fs::write(&path, "").expect("write");

        let store = JsonFileStore::new(&path);
        assert!(store.get("k").expect("get").is_none());
    }
}
