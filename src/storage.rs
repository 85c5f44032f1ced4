use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crate::error::{BazaarError, Result};

#[derive(Debug, Clone, Copy)]
pub enum StoreMode {
    HighThroughput,
    LowSpace,
}

/// Configuration for a Bazaar store.
#[derive(Debug, Clone)]
pub struct BazaarConfig {
    pub db_path: PathBuf,
    /// Create parent directories if they don't exist.
    pub create_dirs: bool,

    pub disk_cache_capacity_mb: usize,
    pub flush_interval_ms: Option<u64>,
    pub mode: StoreMode,
}

impl Default for BazaarConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("bazaar.db"),
            create_dirs: true,
            disk_cache_capacity_mb: 64,
            flush_interval_ms: Some(100),
            mode: StoreMode::HighThroughput,
        }
    }
}

impl BazaarConfig {
    /// Create a new configuration with a specific database path.
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        let mut config = Self::default();
        config.db_path = path.as_ref().to_path_buf();
        config
    }
}

/// Two-tier document store: a write-through hot cache over a sled tree.
/// Documents are opaque byte payloads keyed `"{collection}:{id}"`; the
/// disk tree is the source of truth and the cache holds whatever was
/// recently read or written.
pub struct DocumentStore {
    cache: DashMap<String, Vec<u8>>,
    disk: sled::Db,
}

impl DocumentStore {
    pub fn open(config: &BazaarConfig) -> Result<Self> {
        if config.create_dirs {
            if let Some(parent) = config.db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let mode = match config.mode {
            StoreMode::HighThroughput => sled::Mode::HighThroughput,
            StoreMode::LowSpace => sled::Mode::LowSpace,
        };
        let disk = sled::Config::new()
            .path(&config.db_path)
            .cache_capacity((config.disk_cache_capacity_mb * 1024 * 1024) as u64)
            .flush_every_ms(config.flush_interval_ms)
            .mode(mode)
            .open()?;

        Ok(Self {
            cache: DashMap::new(),
            disk,
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value.clone()));
        }

        if let Some(value) = self.disk.get(key.as_bytes())? {
            let value = value.to_vec();
            // Promote to the hot cache for subsequent reads.
            self.cache.insert(key.to_string(), value.clone());
            return Ok(Some(value));
        }

        Ok(None)
    }

    pub fn put(&self, key: String, value: Vec<u8>) -> Result<()> {
        self.disk.insert(key.as_bytes(), value.clone())?;
        self.cache.insert(key, value);
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.disk.remove(key.as_bytes())?;
        self.cache.remove(key);
        Ok(())
    }

    /// Iterate every document whose key starts with `prefix`, straight
    /// from the disk tree.
    pub fn scan_prefix<'a>(
        &'a self,
        prefix: &str,
    ) -> impl Iterator<Item = Result<(String, Vec<u8>)>> + 'a {
        self.disk.scan_prefix(prefix.as_bytes()).map(|entry| {
            let (key, value) = entry.map_err(BazaarError::Storage)?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|_| BazaarError::InvalidKey("non-UTF-8 key in store".to_string()))?;
            Ok((key, value.to_vec()))
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.disk.flush()?;
        Ok(())
    }
}

impl Drop for DocumentStore {
    fn drop(&mut self) {
        if let Err(e) = self.disk.flush() {
            eprintln!("Error flushing store: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = BazaarConfig::with_path(dir.path().join("store.db"));
        let store = DocumentStore::open(&config).unwrap();
        (dir, store)
    }

    #[test]
    fn test_put_get_delete() {
        let (_dir, store) = open_temp();
        store.put("users:1".to_string(), b"ana".to_vec()).unwrap();
        assert_eq!(store.get("users:1").unwrap().unwrap(), b"ana");

        store.delete("users:1").unwrap();
        assert!(store.get("users:1").unwrap().is_none());
    }

    #[test]
    fn test_scan_prefix_is_isolated_per_collection() {
        let (_dir, store) = open_temp();
        store.put("users:1".to_string(), b"a".to_vec()).unwrap();
        store.put("users:2".to_string(), b"b".to_vec()).unwrap();
        store
            .put("transactions:1".to_string(), b"t".to_vec())
            .unwrap();

        let users: Vec<_> = store
            .scan_prefix("users:")
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.iter().all(|(k, _)| k.starts_with("users:")));
    }

    #[test]
    fn test_reopen_reads_back_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = BazaarConfig::with_path(dir.path().join("store.db"));
        {
            let store = DocumentStore::open(&config).unwrap();
            store.put("users:9".to_string(), b"kept".to_vec()).unwrap();
            store.flush().unwrap();
        }
        let store = DocumentStore::open(&config).unwrap();
        assert_eq!(store.get("users:9").unwrap().unwrap(), b"kept");
    }
}
