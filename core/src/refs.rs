//! Identifiers for the read-aloud preferences.
//!
//! Every preference has two names:
//! - a reference name (`rate`) used by the registry and the host API
//! - a persistence key (`tts-rate`), the reference name under the `tts-` namespace

use crate::{Result, SettingsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store key holding the JSON array of persisted property entries.
pub const TTS_SETTINGS_KEY: &str = "ttsSetting";

/// Prefix shared by all per-preference persistence keys.
pub const KEY_PREFIX: &str = "tts-";

/// Closed set of read-aloud preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingRef {
    Color,
    #[serde(rename = "autoscroll", alias = "autoScroll")]
    AutoScroll,
    Rate,
    Pitch,
    Volume,
    Voice,
    Highlight,
}

impl SettingRef {
    /// All preferences, in the order the registry lists them.
    pub const ALL: [SettingRef; 7] = [
        SettingRef::AutoScroll,
        SettingRef::Rate,
        SettingRef::Pitch,
        SettingRef::Volume,
        SettingRef::Color,
        SettingRef::Highlight,
        SettingRef::Voice,
    ];

    /// Reference name used by the registry.
    pub fn name(&self) -> &'static str {
        match self {
            SettingRef::Color => "color",
            SettingRef::AutoScroll => "autoscroll",
            SettingRef::Rate => "rate",
            SettingRef::Pitch => "pitch",
            SettingRef::Volume => "volume",
            SettingRef::Voice => "voice",
            SettingRef::Highlight => "highlight",
        }
    }

    /// Namespaced storage key (`tts-<name>`).
    pub fn persistence_key(&self) -> &'static str {
        match self {
            SettingRef::Color => "tts-color",
            SettingRef::AutoScroll => "tts-autoscroll",
            SettingRef::Rate => "tts-rate",
            SettingRef::Pitch => "tts-pitch",
            SettingRef::Volume => "tts-volume",
            SettingRef::Voice => "tts-voice",
            SettingRef::Highlight => "tts-highlight",
        }
    }

    /// Rate, pitch and volume are bounded numbers that step up and down.
    pub fn is_incremental(&self) -> bool {
        matches!(
            self,
            SettingRef::Rate | SettingRef::Pitch | SettingRef::Volume
        )
    }

    /// Preferences reachable through `TtsSettings::set_by_key`.
    pub fn is_settable_by_key(&self) -> bool {
        !self.is_incremental()
    }
}

impl fmt::Display for SettingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingRef {
    type Err = SettingsError;

    /// Accepts the reference name, the snapshot field spelling (`autoScroll`)
    /// or the persistence key.
    fn from_str(s: &str) -> Result<Self> {
        let bare = s.strip_prefix(KEY_PREFIX).unwrap_or(s);
        match bare {
            "color" => Ok(SettingRef::Color),
            "autoscroll" | "autoScroll" | "auto-scroll" => Ok(SettingRef::AutoScroll),
            "rate" => Ok(SettingRef::Rate),
            "pitch" => Ok(SettingRef::Pitch),
            "volume" => Ok(SettingRef::Volume),
            "voice" => Ok(SettingRef::Voice),
            "highlight" => Ok(SettingRef::Highlight),
            _ => Err(SettingsError::NotFound(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_keys_are_prefixed_names() {
        for r in SettingRef::ALL {
            assert_eq!(r.persistence_key(), format!("{}{}", KEY_PREFIX, r.name()));
        }
    }

    #[test]
    fn test_parse_accepts_all_spellings() {
        assert_eq!("rate".parse::<SettingRef>().unwrap(), SettingRef::Rate);
        assert_eq!(
            "autoScroll".parse::<SettingRef>().unwrap(),
            SettingRef::AutoScroll
        );
        assert_eq!(
            "tts-highlight".parse::<SettingRef>().unwrap(),
            SettingRef::Highlight
        );
    }

    #[test]
    fn test_parse_unknown_is_not_found() {
        let err = "speed".parse::<SettingRef>().unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(name) if name == "speed"));
    }

    #[test]
    fn test_incremental_and_settable_partition() {
        let incremental: Vec<_> = SettingRef::ALL
            .iter()
            .filter(|r| r.is_incremental())
            .collect();
        assert_eq!(incremental.len(), 3);
        assert!(SettingRef::ALL
            .iter()
            .all(|r| r.is_incremental() != r.is_settable_by_key()));
    }
}
