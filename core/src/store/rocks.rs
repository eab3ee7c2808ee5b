//! RocksDB-backed key-value store.

use super::KeyValueStore;
use crate::{Result, SettingsError};
use async_trait::async_trait;
use rocksdb::{Options, DB};
use std::path::Path;
use tracing::info;

/// Persistent storage using RocksDB
pub struct RocksDbStore {
    db: DB,
}

impl RocksDbStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path).map_err(|e| SettingsError::PersistenceError(e.to_string()))?;

        info!("RocksDB settings store initialized");
        Ok(Self { db })
    }
}

#[async_trait]
impl KeyValueStore for RocksDbStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.db.get(key) {
            Ok(Some(data)) => String::from_utf8(data)
                .map(Some)
                .map_err(|e| SettingsError::PersistenceError(e.to_string())),
            Ok(None) => Ok(None),
            Err(e) => Err(SettingsError::PersistenceError(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .put(key, value)
            .map_err(|e| SettingsError::PersistenceError(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.db
            .delete(key)
            .map_err(|e| SettingsError::PersistenceError(e.to_string()))
    }
}
