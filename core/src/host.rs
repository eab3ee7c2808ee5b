//! Change notification and the host playback sink.

use crate::refs::SettingRef;
use crate::settings::TtsSpeechConfig;
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::trace;

/// What changed in a successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsChange {
    Updated(SettingRef),
    Reset,
}

/// Host application receiving the full snapshot after every change so it
/// can reconfigure playback.
#[async_trait]
pub trait HostSettingsSink: Send + Sync {
    async fn update_settings(&self, settings: TtsSpeechConfig) -> Result<()>;
}

pub type ChangeCallback = Arc<dyn Fn(SettingsChange) + Send + Sync>;

/// Fan-out for change notifications.
///
/// Holds a single callback (the last registration wins) plus a broadcast
/// channel for any number of subscribers.
pub struct SettingsNotifier {
    callback: Mutex<Option<ChangeCallback>>,
    tx: broadcast::Sender<SettingsChange>,
}

impl SettingsNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            callback: Mutex::new(None),
            tx,
        }
    }

    /// Replace the registered callback
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(SettingsChange) + Send + Sync + 'static,
    {
        let mut slot = self.callback.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(callback));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.tx.subscribe()
    }

    pub fn notify(&self, change: SettingsChange) {
        // Clone out so the callback may re-register itself
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(cb) = callback {
            cb(change);
        }
        // No receivers is not an error
        let receivers = self.tx.send(change).unwrap_or(0);
        trace!(?change, receivers, "Settings change dispatched");
    }
}

impl Default for SettingsNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}
