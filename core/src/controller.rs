//! Read-aloud settings controller.
//!
//! Owns the current preference values, seeds them from the persisted array
//! on creation and exposes the mutating operations used by the controls and
//! by the host API. Every successful mutation:
//! 1. updates the snapshot and the matching registry entry
//! 2. persists that single entry
//! 3. notifies the change callback and broadcast subscribers
//! 4. pushes the full snapshot to the host sink, if one is attached
//!
//! A failed persist is returned to the caller. The in-memory value is not
//! rolled back and no notification fires.

use crate::config::TtsSettingsConfig;
use crate::host::{HostSettingsSink, SettingsChange, SettingsNotifier};
use crate::refs::SettingRef;
use crate::registry::{PropertyEntry, UserProperties};
use crate::settings::{SettingValue, TtsSettingsPatch, TtsSpeechConfig};
use crate::store::{KeyValueStore, SettingsStore, StoredProperty};
use crate::{Result, SettingsError};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, trace, warn};

/// Snapshot plus the registry built from it; always kept in sync
struct SettingsState {
    current: TtsSpeechConfig,
    properties: UserProperties,
}

impl SettingsState {
    fn new(current: TtsSpeechConfig) -> Self {
        let properties = UserProperties::from_snapshot(&current);
        Self {
            current,
            properties,
        }
    }

    fn assign(&mut self, setting: SettingRef, value: SettingValue) -> Result<()> {
        self.current.set(setting, value)?;
        let normalized = self.current.get(setting);
        self.properties.get_mut(setting)?.set_value(&normalized)
    }

    fn step(&mut self, setting: SettingRef, up: bool) -> Result<f64> {
        let numeric = self
            .properties
            .get_mut(setting)?
            .as_numeric_mut()
            .ok_or(SettingsError::NotIncremental(setting))?;
        if up {
            numeric.increment();
        } else {
            numeric.decrement();
        }
        let value = numeric.value;
        self.current.set(setting, SettingValue::Number(value))?;
        Ok(value)
    }
}

pub struct TtsSettings {
    store: SettingsStore,
    state: RwLock<SettingsState>,
    notifier: SettingsNotifier,
    host: Option<Arc<dyn HostSettingsSink>>,
}

impl TtsSettings {
    /// Build a ready controller.
    ///
    /// Values are layered: compiled-in defaults, then `config.initial`, then
    /// whatever the store holds. Persisted values that cannot be decoded
    /// are logged and skipped.
    pub async fn create(
        store: Arc<dyn KeyValueStore>,
        config: TtsSettingsConfig,
        host: Option<Arc<dyn HostSettingsSink>>,
    ) -> Result<Self> {
        let store = SettingsStore::with_namespace(store, config.namespace.clone());

        let mut current = TtsSpeechConfig::default();
        config.initial.overlay(&mut current)?;

        for setting in SettingRef::ALL {
            let stored = match store.get_setting(setting).await? {
                Some(p) if !p.value.is_null() => p,
                _ => {
                    trace!(setting = %setting, "No persisted value");
                    continue;
                }
            };
            match SettingValue::from_json(setting, stored.value) {
                Ok(value) => {
                    current.set(setting, value)?;
                    debug!(setting = %setting, "Adopted persisted value");
                }
                Err(e) => {
                    warn!(setting = %setting, error = %e, "Ignoring undecodable persisted value")
                }
            }
        }

        info!(
            namespace = %store.namespace(),
            rate = current.rate,
            pitch = current.pitch,
            volume = current.volume,
            "TTS settings initialized"
        );

        Ok(Self {
            store,
            state: RwLock::new(SettingsState::new(current)),
            notifier: SettingsNotifier::new(config.notify_capacity),
            host,
        })
    }

    /// Controller over `store` with default configuration and no host
    pub async fn with_store(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        Self::create(store, TtsSettingsConfig::default(), None).await
    }

    pub async fn stop(&self) {
        debug!("TTS settings stop");
    }

    // =========================
    // Readers
    // =========================

    pub async fn snapshot(&self) -> TtsSpeechConfig {
        self.state.read().await.current.clone()
    }

    pub async fn property(&self, setting: SettingRef) -> Result<PropertyEntry> {
        Ok(self.state.read().await.properties.get(setting)?.clone())
    }

    pub async fn properties(&self) -> UserProperties {
        self.state.read().await.properties.clone()
    }

    /// Persisted element named `name`, straight from the store
    pub async fn persisted_property(&self, name: &str) -> Result<Option<StoredProperty>> {
        self.store.get_property(name).await
    }

    // =========================
    // Notification
    // =========================

    /// Register the change callback, replacing any earlier one
    pub fn on_settings_change<F>(&self, callback: F)
    where
        F: Fn(SettingsChange) + Send + Sync + 'static,
    {
        self.notifier.set_callback(callback);
    }

    /// Receiver for every change, independent of the callback
    pub fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.notifier.subscribe()
    }

    // =========================
    // Mutations
    // =========================

    /// Apply every field present in `patch`, in order rate, pitch, volume,
    /// color, autoScroll, voice, highlight. Each field is persisted and
    /// notified on its own; the host receives one snapshot at the end.
    ///
    /// Presence is decided by `Option`: `Some(false)` and `Some(0.0)` are
    /// applied (numbers clamped into bounds).
    pub async fn apply_settings(&self, patch: TtsSettingsPatch) -> Result<()> {
        let mut applied = 0usize;
        let mut outcome = Ok(());
        for (setting, value) in patch.changes() {
            debug!(setting = %setting, value = ?value, "Applying setting");
            if let Err(e) = self
                .commit(setting, move |state| state.assign(setting, value))
                .await
            {
                outcome = Err(e);
                break;
            }
            applied += 1;
        }
        if applied > 0 {
            self.push_to_host().await;
        }
        outcome
    }

    /// Set color, auto-scroll, voice or highlight.
    ///
    /// Rate, pitch and volume only move through increment/decrement or
    /// `apply_settings`.
    pub async fn set_by_key(
        &self,
        setting: SettingRef,
        value: impl Into<SettingValue> + Send,
    ) -> Result<()> {
        if !setting.is_settable_by_key() {
            return Err(SettingsError::NotSettable(setting));
        }
        let value = value.into();
        self.commit(setting, move |state| state.assign(setting, value))
            .await?;
        self.push_to_host().await;
        Ok(())
    }

    /// `set_by_key` addressed by name with a loosely-typed value
    pub async fn set_by_name(&self, name: &str, value: Value) -> Result<()> {
        let setting: SettingRef = name.parse()?;
        if !setting.is_settable_by_key() {
            return Err(SettingsError::NotSettable(setting));
        }
        let value = SettingValue::from_json(setting, value)?;
        self.set_by_key(setting, value).await
    }

    /// Step rate, pitch or volume up; returns the new value
    pub async fn increment(&self, setting: SettingRef) -> Result<f64> {
        self.step(setting, true).await
    }

    /// Step rate, pitch or volume down; returns the new value
    pub async fn decrement(&self, setting: SettingRef) -> Result<f64> {
        self.step(setting, false).await
    }

    pub async fn increment_by_name(&self, name: &str) -> Result<f64> {
        self.increment(name.parse()?).await
    }

    pub async fn decrement_by_name(&self, name: &str) -> Result<f64> {
        self.decrement(name.parse()?).await
    }

    /// Drop everything persisted and return to the compiled-in defaults.
    pub async fn reset(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            self.store.clear().await?;
            *state = SettingsState::new(TtsSpeechConfig::default());
        }
        info!("TTS settings reset to defaults");
        self.notifier.notify(SettingsChange::Reset);
        self.push_to_host().await;
        Ok(())
    }

    async fn step(&self, setting: SettingRef, up: bool) -> Result<f64> {
        if !setting.is_incremental() {
            return Err(SettingsError::NotIncremental(setting));
        }
        let value = self
            .commit(setting, move |state| state.step(setting, up))
            .await?;
        self.push_to_host().await;
        Ok(value)
    }

    /// Mutate under the state lock, persist the touched entry, then notify.
    ///
    /// The lock is held across the persist so concurrent mutations cannot
    /// interleave; notification happens after it is released.
    async fn commit<T, F>(&self, setting: SettingRef, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut SettingsState) -> Result<T> + Send,
        T: Send,
    {
        let out = {
            let mut state = self.state.write().await;
            let out = mutate(&mut *state)?;
            let entry = state.properties.get(setting)?.clone();
            self.store.save_property(&entry).await?;
            out
        };
        debug!(setting = %setting, "Setting committed");
        self.notifier.notify(SettingsChange::Updated(setting));
        Ok(out)
    }

    async fn push_to_host(&self) {
        if let Some(host) = &self.host {
            let snapshot = self.snapshot().await;
            match host.update_settings(snapshot).await {
                Ok(()) => debug!("Host updated with TTS settings"),
                Err(e) => warn!(error = %e, "Host failed to apply TTS settings"),
            }
        }
    }
}
