use std::fs;
use std::path::{Path, PathBuf};

use crate::refs::TTS_SETTINGS_KEY;
use crate::settings::{HighlightStyle, TtsSettingsPatch, TtsVoice};
use crate::{Result, SettingsError};

/// Configuration of the settings controller
#[derive(Clone, Debug, PartialEq)]
pub struct TtsSettingsConfig {
    /// Store key holding the persisted property array
    pub namespace: String,
    /// Host-provided overrides of the compiled-in defaults; persisted values
    /// still take precedence over these
    pub initial: TtsSettingsPatch,
    /// Buffer of the change broadcast channel
    pub notify_capacity: usize,
    /// Settings file for file-backed stores
    pub store_path: Option<PathBuf>,
}

impl Default for TtsSettingsConfig {
    fn default() -> Self {
        Self {
            namespace: std::env::var("TTS_SETTINGS_NAMESPACE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| TTS_SETTINGS_KEY.to_string()),
            initial: TtsSettingsPatch::default(),
            notify_capacity: 64,
            store_path: std::env::var("TTS_SETTINGS_STORE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }
}

impl TtsSettingsConfig {
    /// Load configuration from a TOML file (path via TTS_SETTINGS_CONFIG or
    /// ./tts_settings.toml), overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let path =
            std::env::var("TTS_SETTINGS_CONFIG").unwrap_or_else(|_| "tts_settings.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target = "readaloud", path = %path, "No TOML config found; using defaults/env");
            return Self::default();
        }
        match Self::from_file(p) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(target = "readaloud", error = %e, "Failed to load TOML; using defaults");
                Self::default()
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Parse a TOML document and overlay it onto the defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let t: TtsSettingsToml =
            toml::from_str(s).map_err(|e| SettingsError::ConfigError(e.to_string()))?;
        Ok(t.overlay(Self::default()))
    }

    pub fn with_initial(mut self, initial: TtsSettingsPatch) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct TtsSettingsToml {
    pub namespace: Option<String>,
    pub notify_capacity: Option<usize>,
    pub store_path: Option<PathBuf>,
    pub initial: Option<InitialToml>,
}

impl TtsSettingsToml {
    fn overlay(self, mut base: TtsSettingsConfig) -> TtsSettingsConfig {
        if let Some(x) = self.namespace.filter(|s| !s.is_empty()) {
            base.namespace = x;
        }
        if let Some(x) = self.notify_capacity {
            base.notify_capacity = x.max(1);
        }
        if let Some(x) = self.store_path {
            base.store_path = Some(x);
        }
        if let Some(i) = self.initial {
            i.apply(&mut base.initial);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct InitialToml {
    pub rate: Option<f64>,
    pub pitch: Option<f64>,
    pub volume: Option<f64>,
    pub color: Option<String>,
    pub auto_scroll: Option<bool>,
    pub highlight: Option<HighlightStyle>,
    pub voice: Option<VoiceToml>,
}

impl InitialToml {
    fn apply(self, p: &mut TtsSettingsPatch) {
        if let Some(x) = self.rate {
            p.rate = Some(x);
        }
        if let Some(x) = self.pitch {
            p.pitch = Some(x);
        }
        if let Some(x) = self.volume {
            p.volume = Some(x);
        }
        if let Some(x) = self.color {
            p.color = Some(x);
        }
        if let Some(x) = self.auto_scroll {
            p.auto_scroll = Some(x);
        }
        if let Some(x) = self.highlight {
            p.highlight = Some(x);
        }
        if let Some(v) = self.voice {
            p.voice = Some(v.into_voice());
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct VoiceToml {
    pub use_publication: Option<bool>,
    pub name: Option<String>,
    pub lang: Option<String>,
}

impl VoiceToml {
    fn into_voice(self) -> TtsVoice {
        TtsVoice {
            // A named voice without an explicit flag means "use this voice"
            use_publication: self.use_publication.unwrap_or(self.name.is_none()),
            name: self.name,
            lang: self.lang,
        }
    }
}
