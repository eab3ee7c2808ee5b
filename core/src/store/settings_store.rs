//! Property entries persisted as one JSON array under a namespaced key.

use super::KeyValueStore;
use crate::refs::{SettingRef, TTS_SETTINGS_KEY};
use crate::registry::PropertyEntry;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Persisted element of the settings array.
///
/// Only `name` and `value` are interpreted; kind-specific metadata is kept
/// as-is so entries written by other versions survive a rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProperty {
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredProperty {
    pub fn from_entry(entry: &PropertyEntry) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::to_value(entry)?)?)
    }
}

/// Adapter persisting property entries through a `KeyValueStore`
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
    // Guards the read-modify-write of the shared array
    write_lock: Mutex<()>,
}

impl SettingsStore {
    /// Adapter using the default `ttsSetting` key
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_namespace(store, TTS_SETTINGS_KEY)
    }

    pub fn with_namespace(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Every persisted element; empty when nothing was saved yet.
    pub async fn load_all(&self) -> Result<Vec<StoredProperty>> {
        match self.store.get(&self.namespace).await? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Replace the element with the entry's name, or append it.
    ///
    /// Elements still named by the entry's persistence key (older layout)
    /// are dropped at the same time.
    pub async fn save_property(&self, entry: &PropertyEntry) -> Result<StoredProperty> {
        let stored = StoredProperty::from_entry(entry)?;

        let _guard = self.write_lock.lock().await;
        let mut properties = self.load_all().await?;
        properties.retain(|p| p.name != entry.name && p.name != entry.persistence_key);
        properties.push(stored.clone());

        let raw = serde_json::to_string(&properties)?;
        self.store.set(&self.namespace, &raw).await?;

        debug!(
            namespace = %self.namespace,
            property = %entry.name,
            count = properties.len(),
            "Saved property"
        );
        Ok(stored)
    }

    /// First persisted element named `name`
    pub async fn get_property(&self, name: &str) -> Result<Option<StoredProperty>> {
        let properties = self.load_all().await?;
        trace!(name, candidates = properties.len(), "Looking up property");
        Ok(properties.into_iter().find(|p| p.name == name))
    }

    /// Persisted element for `setting`, by reference name or, failing that,
    /// by persistence key.
    pub async fn get_setting(&self, setting: SettingRef) -> Result<Option<StoredProperty>> {
        let properties = self.load_all().await?;
        let by_name = properties.iter().position(|p| p.name == setting.name());
        let index = by_name.or_else(|| {
            properties
                .iter()
                .position(|p| p.name == setting.persistence_key())
        });
        Ok(index.map(|i| properties[i].clone()))
    }

    /// Remove the whole array
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(&self.namespace).await?;
        debug!(namespace = %self.namespace, "Cleared persisted settings");
        Ok(())
    }
}
