// Read-aloud Core Library
// TTS playback preferences: registry, persistence, controller

pub mod config;
pub mod controller;
pub mod controls;
pub mod host;
pub mod refs;
pub mod registry;
pub mod settings;
pub mod store;

// Export core types
pub use config::TtsSettingsConfig;
pub use controller::TtsSettings;
pub use controls::{ControlId, ControlPanel, ControlsView};
pub use host::{HostSettingsSink, SettingsChange, SettingsNotifier};
pub use refs::{SettingRef, TTS_SETTINGS_KEY};
pub use registry::{BoundedNumeric, PropertyEntry, PropertyValue, Toggle, UserProperties};
pub use settings::{
    HighlightStyle, NumericBounds, SettingValue, TtsSettingsPatch, TtsSpeechConfig, TtsVoice,
};
pub use store::{InMemoryKvStore, JsonFileStore, KeyValueStore, SettingsStore, StoredProperty};

#[cfg(feature = "rocksdb")]
pub use store::RocksDbStore;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Property not found: {0}")]
    NotFound(String),

    #[error("Setting '{0}' cannot be set by key")]
    NotSettable(SettingRef),

    #[error("Setting '{0}' is not incremental")]
    NotIncremental(SettingRef),

    #[error("Type mismatch for '{name}': expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SettingsError {
    /// True when the error came from the underlying key-value store.
    pub fn is_persistence(&self) -> bool {
        matches!(self, SettingsError::PersistenceError(_))
    }
}

pub type Result<T> = std::result::Result<T, SettingsError>;
