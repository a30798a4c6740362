//! Key-value blob tiers
//!
//! A tier maps logical keys (`records.<listId>`, `lists.info`, ...) to JSON
//! documents. The local tier and the remote replica share this interface;
//! `FileBlobStore` keeps one file per key and `MemoryBlobStore` backs tests
//! and ephemeral sessions.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::{CouponError, CouponResult};

pub trait BlobStore: Send + Sync {
    /// Read a document; `Ok(None)` if the key has never been written
    fn get(&self, key: &str) -> CouponResult<Option<Value>>;

    fn put(&self, key: &str, value: &Value) -> CouponResult<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> CouponResult<()>;

    fn keys(&self) -> CouponResult<Vec<String>>;
}

impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    fn get(&self, key: &str) -> CouponResult<Option<Value>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &Value) -> CouponResult<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> CouponResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> CouponResult<Vec<String>> {
        (**self).keys()
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> CouponResult<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path).map_err(|e| {
            CouponError::Storage(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map(Some)
            .map_err(|e| CouponError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Write atomically: temp file in the same directory, fsync, rename
    fn put(&self, key: &str, value: &Value) -> CouponResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            CouponError::Storage(format!(
                "Failed to create directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");

        let file = File::create(&temp_path)
            .map_err(|e| CouponError::Storage(format!("Failed to create temp file: {}", e)))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| CouponError::Storage(format!("Failed to serialize data: {}", e)))?;

        writer
            .flush()
            .map_err(|e| CouponError::Storage(format!("Failed to flush data: {}", e)))?;

        writer
            .get_ref()
            .sync_all()
            .map_err(|e| CouponError::Storage(format!("Failed to sync data: {}", e)))?;

        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            CouponError::Storage(format!("Failed to rename temp file: {}", e))
        })?;

        Ok(())
    }

    fn remove(&self, key: &str) -> CouponResult<()> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path).map_err(|e| {
            CouponError::Storage(format!("Failed to remove {}: {}", path.display(), e))
        })
    }

    fn keys(&self) -> CouponResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| {
            CouponError::Storage(format!("Failed to read {}: {}", self.dir.display(), e))
        })? {
            let entry = entry
                .map_err(|e| CouponError::Storage(format!("Failed to read entry: {}", e)))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(key) = name.strip_suffix(".json") {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-process tier; wrap in `Arc` to share one replica between sessions
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    data: RwLock<BTreeMap<String, Value>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> CouponResult<Option<Value>> {
        let data = self
            .data
            .read()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(data.get(key).cloned())
    }

    fn put(&self, key: &str, value: &Value) -> CouponResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        data.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> CouponResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        data.remove(key);
        Ok(())
    }

    fn keys(&self) -> CouponResult<Vec<String>> {
        let data = self
            .data
            .read()
            .map_err(|e| CouponError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(data.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path().to_path_buf());
        assert!(store.get("lists.info").unwrap().is_none());
        assert!(store.remove("lists.info").is_ok());
    }

    #[test]
    fn test_file_store_put_get_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path().join("nested"));

        store.put("types", &json!(["Gift Cards"])).unwrap();
        store.put("lists.selected", &json!("abc")).unwrap();

        assert_eq!(store.get("types").unwrap(), Some(json!(["Gift Cards"])));
        assert_eq!(store.keys().unwrap(), vec!["lists.selected", "types"]);
        assert!(!temp_dir.path().join("nested").join("types.json.tmp").exists());

        store.remove("types").unwrap();
        assert!(store.get("types").unwrap().is_none());
    }

    #[test]
    fn test_file_store_corrupt_document_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path().to_path_buf());
        fs::write(temp_dir.path().join("types.json"), "not json").unwrap();
        assert!(store.get("types").is_err());
    }

    #[test]
    fn test_memory_store_shared_through_arc() {
        let store = Arc::new(MemoryBlobStore::new());
        let other = Arc::clone(&store);
        store.put("deletedRecords", &json!([])).unwrap();
        assert_eq!(other.keys().unwrap(), vec!["deletedRecords"]);
    }
}
