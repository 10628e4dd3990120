#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use ytlearn_contracts::Identifiable;

const DOCUMENT_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("unsupported storage document schema version {0}")]
    SchemaVersion(u8),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw string storage addressed by fully namespaced keys.
pub trait KvBackend {
    fn read(&self, key: &str) -> Result<Option<String>, KvError>;
    fn write(&self, key: &str, value: &str) -> Result<(), KvError>;
    fn delete(&self, key: &str) -> Result<(), KvError>;
}

impl<B: KvBackend + ?Sized> KvBackend for &B {
    fn read(&self, key: &str) -> Result<Option<String>, KvError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), KvError> {
        (**self).write(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        (**self).delete(key)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, KvError> {
    mutex
        .lock()
        .map_err(|_| KvError::Unavailable("storage lock poisoned".to_string()))
}

#[derive(Debug, Default)]
pub struct MemoryKvBackend {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryKvBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes of keys plus values may not exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.entries)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl KvBackend for MemoryKvBackend {
    fn read(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut entries = lock(&self.entries)?;
        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(KvError::QuotaExceeded { needed, quota });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: u8,
    entries: BTreeMap<String, String>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            schema_version: DOCUMENT_SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// All entries live in one JSON document that is replaced atomically on every write.
#[derive(Debug)]
pub struct FileKvBackend {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileKvBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<StoreDocument, KvError> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(StoreDocument::default());
        }
        let doc = serde_json::from_str::<StoreDocument>(&raw)?;
        if doc.schema_version != DOCUMENT_SCHEMA_VERSION {
            return Err(KvError::SchemaVersion(doc.schema_version));
        }
        Ok(doc)
    }

    fn write_document(&self, doc: &StoreDocument) -> Result<(), KvError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_vec_pretty(doc)?;
        atomic_write(&self.path, &serialized)
    }
}

impl KvBackend for FileKvBackend {
    fn read(&self, key: &str) -> Result<Option<String>, KvError> {
        let _guard = lock(&self.guard)?;
        Ok(self.read_document()?.entries.remove(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), KvError> {
        let _guard = lock(&self.guard)?;
        let mut doc = self.read_document()?;
        doc.entries.insert(key.to_string(), value.to_string());
        self.write_document(&doc)
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        let _guard = lock(&self.guard)?;
        let mut doc = self.read_document()?;
        if doc.entries.remove(key).is_some() {
            self.write_document(&doc)?;
        }
        Ok(())
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), KvError> {
    let mut tmp = path.to_path_buf();
    tmp.set_extension("tmp");
    fs::write(&tmp, data)?;
    fs::rename(tmp, path)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageChangeKind {
    Set,
    Removed,
}

/// Emitted after a successful write; `key` is the namespaced key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub kind: StorageChangeKind,
}

/// Namespaced JSON view over a [`KvBackend`]. Never returns an error: failures
/// are logged and reported as `false` or the caller's default.
#[derive(Debug)]
pub struct KvStore<B: KvBackend> {
    backend: B,
    namespace: String,
    listeners: Mutex<Vec<Sender<StorageChange>>>,
}

impl<B: KvBackend> KvStore<B> {
    pub fn new(backend: B, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn key_for(&self, logical_key: &str) -> String {
        format!("{}{}", self.namespace, logical_key)
    }

    pub fn subscribe(&self) -> Receiver<StorageChange> {
        let (tx, rx) = mpsc::channel();
        match self.listeners.lock() {
            Ok(mut listeners) => listeners.push(tx),
            Err(_) => warn!("storage listener registry poisoned; subscription inert"),
        }
        rx
    }

    pub fn get<T: DeserializeOwned>(&self, logical_key: &str, default: T) -> T {
        let key = self.key_for(logical_key);
        let raw = match self.backend.read(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(err) => {
                warn!(key = %key, error = %err, "storage read failed");
                return default;
            }
        };
        let mut value = match serde_json::from_str::<Value>(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, error = %err, "stored value is not valid json");
                return default;
            }
        };
        if value.has_reserved_id() {
            warn!(key = %key, "stored record carries a reserved id; ignored");
            return default;
        }
        let stripped = strip_reserved_records(&mut value);
        if stripped > 0 {
            debug!(key = %key, stripped, "reserved records filtered on read");
        }
        match serde_json::from_value::<T>(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(key = %key, error = %err, "stored value has unexpected shape");
                default
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, logical_key: &str, value: &T) -> bool {
        let key = self.key_for(logical_key);
        let mut doc = match serde_json::to_value(value) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(key = %key, error = %err, "value could not be serialized");
                return false;
            }
        };
        if doc.has_reserved_id() {
            warn!(key = %key, "write refused: record carries a reserved id");
            return false;
        }
        let stripped = strip_reserved_records(&mut doc);
        if stripped > 0 {
            warn!(key = %key, stripped, "reserved records stripped before write");
        }
        let serialized = doc.to_string();
        if let Err(err) = self.backend.write(&key, &serialized) {
            warn!(key = %key, error = %err, "storage write failed");
            return false;
        }
        self.notify(key, StorageChangeKind::Set);
        true
    }

    pub fn remove(&self, logical_key: &str) -> bool {
        let key = self.key_for(logical_key);
        if let Err(err) = self.backend.delete(&key) {
            warn!(key = %key, error = %err, "storage remove failed");
            return false;
        }
        self.notify(key, StorageChangeKind::Removed);
        true
    }

    fn notify(&self, key: String, kind: StorageChangeKind) {
        let Ok(mut listeners) = self.listeners.lock() else {
            return;
        };
        let change = StorageChange { key, kind };
        listeners.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

/// Removes every nested record whose id is reserved and returns how many were
/// dropped. The root itself is left to the caller.
pub fn strip_reserved_records(value: &mut Value) -> usize {
    match value {
        Value::Array(items) => {
            let before = items.len();
            items.retain(|item| !item.has_reserved_id());
            let mut removed = before - items.len();
            for item in items.iter_mut() {
                removed += strip_reserved_records(item);
            }
            removed
        }
        Value::Object(fields) => {
            let before = fields.len();
            fields.retain(|_, field| !field.has_reserved_id());
            let mut removed = before - fields.len();
            for (_, field) in fields.iter_mut() {
                removed += strip_reserved_records(field);
            }
            removed
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn at_kv_01_strip_walks_arrays_and_objects() {
        let mut value = json!({
            "keep": {"id": "a", "children": [{"id": "FOX-1"}, {"id": "b"}]},
            "drop": {"id": "fox-2"},
            "list": [{"id": "fox3"}, 4, "fox"]
        });
        assert_eq!(strip_reserved_records(&mut value), 3);
        assert_eq!(
            value,
            json!({
                "keep": {"id": "a", "children": [{"id": "b"}]},
                "list": [4, "fox"]
            })
        );
    }

    #[test]
    fn at_kv_02_memory_quota_counts_replacement_not_sum() {
        let backend = MemoryKvBackend::with_quota(10);
        backend.write("k", "12345").unwrap();
        backend.write("k", "123456789").unwrap();
        assert!(matches!(
            backend.write("k2", "123"),
            Err(KvError::QuotaExceeded { .. })
        ));
    }
}
