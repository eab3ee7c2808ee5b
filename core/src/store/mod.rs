//! Key-value storage for persisted settings.
//!
//! - `KeyValueStore` - string key/value collaborator trait
//! - `InMemoryKvStore` - development/testing
//! - `JsonFileStore` - single JSON file on disk
//! - `RocksDbStore` - RocksDB backend (`rocksdb` feature)
//! - `SettingsStore` - property-entry array kept under one namespaced key

pub mod file;
pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocks;
pub mod settings_store;

pub use file::JsonFileStore;
pub use memory::InMemoryKvStore;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksDbStore;
pub use settings_store::{SettingsStore, StoredProperty};

use crate::Result;
use async_trait::async_trait;

/// String key-value store backing the settings.
///
/// Operations are idempotent: setting the same value twice or removing a
/// missing key succeeds.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`
    async fn remove(&self, key: &str) -> Result<()>;
}
