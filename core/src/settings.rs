//! Settings model: the snapshot of current read-aloud preferences and the
//! partial updates applied to it.

use crate::refs::SettingRef;
use crate::{Result, SettingsError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Inclusive range and step of a bounded numeric preference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl NumericBounds {
    pub const RATE: NumericBounds = NumericBounds {
        min: 0.1,
        max: 10.0,
        step: 0.1,
    };
    pub const PITCH: NumericBounds = NumericBounds {
        min: 0.1,
        max: 2.0,
        step: 0.1,
    };
    pub const VOLUME: NumericBounds = NumericBounds {
        min: 0.1,
        max: 1.0,
        step: 0.1,
    };

    /// Bounds for rate, pitch and volume; `None` for the other preferences.
    pub fn for_ref(setting: SettingRef) -> Option<NumericBounds> {
        match setting {
            SettingRef::Rate => Some(Self::RATE),
            SettingRef::Pitch => Some(Self::PITCH),
            SettingRef::Volume => Some(Self::VOLUME),
            _ => None,
        }
    }

    /// Clamp into `[min, max]`. NaN collapses to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        clamp_to(value, self.min, self.max)
    }
}

pub(crate) fn clamp_to(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Word/line highlighting used while reading aloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HighlightStyle {
    /// Highlight the whole line being read (default)
    #[default]
    #[serde(rename = "lines", alias = "line")]
    Lines,
    /// Highlight the word being read
    #[serde(rename = "word", alias = "words")]
    Word,
}

impl HighlightStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightStyle::Lines => "lines",
            HighlightStyle::Word => "word",
        }
    }
}

impl fmt::Display for HighlightStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HighlightStyle {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lines" | "line" => Ok(HighlightStyle::Lines),
            "word" | "words" => Ok(HighlightStyle::Word),
            _ => Err(SettingsError::TypeMismatch {
                name: SettingRef::Highlight.name().to_string(),
                expected: "\"lines\" or \"word\"",
            }),
        }
    }
}

/// Voice selection.
///
/// With `use_publication` set the publication's own voice is used and
/// `name`/`lang` are only hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsVoice {
    pub use_publication: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Default for TtsVoice {
    fn default() -> Self {
        Self::publication()
    }
}

impl TtsVoice {
    /// Follow the voice declared by the publication
    pub fn publication() -> Self {
        Self {
            use_publication: true,
            name: None,
            lang: None,
        }
    }

    /// Pin a specific system voice
    pub fn named(name: impl Into<String>, lang: Option<String>) -> Self {
        Self {
            use_publication: false,
            name: Some(name.into()),
            lang,
        }
    }

    /// Voice name the synthesizer should honour, if any.
    pub fn effective_name(&self) -> Option<&str> {
        if self.use_publication {
            None
        } else {
            self.name.as_deref()
        }
    }
}

/// Snapshot of every read-aloud preference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsSpeechConfig {
    pub rate: f64,
    pub pitch: f64,
    pub volume: f64,
    pub color: String,
    pub auto_scroll: bool,
    pub voice: TtsVoice,
    pub highlight: HighlightStyle,
}

impl Default for TtsSpeechConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            color: "orange".to_string(),
            auto_scroll: true,
            voice: TtsVoice::publication(),
            highlight: HighlightStyle::Lines,
        }
    }
}

impl TtsSpeechConfig {
    /// Current value of one preference
    pub fn get(&self, setting: SettingRef) -> SettingValue {
        match setting {
            SettingRef::Rate => SettingValue::Number(self.rate),
            SettingRef::Pitch => SettingValue::Number(self.pitch),
            SettingRef::Volume => SettingValue::Number(self.volume),
            SettingRef::Color => SettingValue::Text(self.color.clone()),
            SettingRef::AutoScroll => SettingValue::Flag(self.auto_scroll),
            SettingRef::Voice => SettingValue::Voice(self.voice.clone()),
            SettingRef::Highlight => SettingValue::Highlight(self.highlight),
        }
    }

    /// Overwrite one preference. Numbers are clamped into their bounds;
    /// a value of the wrong kind is rejected.
    pub fn set(&mut self, setting: SettingRef, value: SettingValue) -> Result<()> {
        match (setting, value) {
            (SettingRef::Rate, SettingValue::Number(v)) => self.rate = NumericBounds::RATE.clamp(v),
            (SettingRef::Pitch, SettingValue::Number(v)) => {
                self.pitch = NumericBounds::PITCH.clamp(v)
            }
            (SettingRef::Volume, SettingValue::Number(v)) => {
                self.volume = NumericBounds::VOLUME.clamp(v)
            }
            (SettingRef::Color, SettingValue::Text(v)) => self.color = v,
            (SettingRef::AutoScroll, SettingValue::Flag(v)) => self.auto_scroll = v,
            (SettingRef::Voice, SettingValue::Voice(v)) => self.voice = v,
            (SettingRef::Highlight, SettingValue::Highlight(v)) => self.highlight = v,
            // Highlight also accepts its string spelling
            (SettingRef::Highlight, SettingValue::Text(v)) => self.highlight = v.parse()?,
            (setting, _) => {
                return Err(SettingsError::TypeMismatch {
                    name: setting.name().to_string(),
                    expected: SettingValue::expected_kind(setting),
                })
            }
        }
        Ok(())
    }
}

/// Typed value of a single preference
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Voice(TtsVoice),
    Highlight(HighlightStyle),
}

impl SettingValue {
    pub(crate) fn expected_kind(setting: SettingRef) -> &'static str {
        match setting {
            SettingRef::Rate | SettingRef::Pitch | SettingRef::Volume => "number",
            SettingRef::AutoScroll => "boolean",
            SettingRef::Color => "string",
            SettingRef::Voice => "voice object",
            SettingRef::Highlight => "\"lines\" or \"word\"",
        }
    }

    /// Decode a loosely-typed JSON value for `setting`.
    ///
    /// The voice may arrive either as an object or as a string holding
    /// serialized JSON, the form older stores wrote.
    pub fn from_json(setting: SettingRef, value: Value) -> Result<Self> {
        let mismatch = || SettingsError::TypeMismatch {
            name: setting.name().to_string(),
            expected: Self::expected_kind(setting),
        };
        match setting {
            SettingRef::Rate | SettingRef::Pitch | SettingRef::Volume => value
                .as_f64()
                .map(SettingValue::Number)
                .ok_or_else(mismatch),
            SettingRef::AutoScroll => value
                .as_bool()
                .map(SettingValue::Flag)
                .ok_or_else(mismatch),
            SettingRef::Color => match value {
                Value::String(s) => Ok(SettingValue::Text(s)),
                _ => Err(mismatch()),
            },
            SettingRef::Highlight => match value {
                Value::String(s) => Ok(SettingValue::Highlight(s.parse()?)),
                _ => Err(mismatch()),
            },
            SettingRef::Voice => {
                let value = match value {
                    Value::String(s) => serde_json::from_str(&s).map_err(|_| mismatch())?,
                    other => other,
                };
                serde_json::from_value(value)
                    .map(SettingValue::Voice)
                    .map_err(|_| mismatch())
            }
        }
    }

    /// JSON form written into a property entry
    pub fn to_json(&self) -> Value {
        match self {
            SettingValue::Number(v) => Value::from(*v),
            SettingValue::Flag(v) => Value::Bool(*v),
            SettingValue::Text(v) => Value::String(v.clone()),
            SettingValue::Voice(v) => serde_json::to_value(v).unwrap_or(Value::Null),
            SettingValue::Highlight(v) => Value::String(v.as_str().to_string()),
        }
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Number(v)
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Flag(v)
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Text(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

impl From<TtsVoice> for SettingValue {
    fn from(v: TtsVoice) -> Self {
        SettingValue::Voice(v)
    }
}

impl From<HighlightStyle> for SettingValue {
    fn from(v: HighlightStyle) -> Self {
        SettingValue::Highlight(v)
    }
}

/// Partial update of the snapshot. `None` leaves a preference untouched;
/// `Some(false)` and `Some(0.0)` are real values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TtsSettingsPatch {
    pub rate: Option<f64>,
    pub pitch: Option<f64>,
    pub volume: Option<f64>,
    pub color: Option<String>,
    pub auto_scroll: Option<bool>,
    pub voice: Option<TtsVoice>,
    pub highlight: Option<HighlightStyle>,
}

impl TtsSettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.changes().is_empty()
    }

    /// Present fields in application order: rate, pitch, volume, color,
    /// autoScroll, voice, highlight.
    pub fn changes(&self) -> Vec<(SettingRef, SettingValue)> {
        let mut out = Vec::new();
        if let Some(v) = self.rate {
            out.push((SettingRef::Rate, SettingValue::Number(v)));
        }
        if let Some(v) = self.pitch {
            out.push((SettingRef::Pitch, SettingValue::Number(v)));
        }
        if let Some(v) = self.volume {
            out.push((SettingRef::Volume, SettingValue::Number(v)));
        }
        if let Some(v) = &self.color {
            out.push((SettingRef::Color, SettingValue::Text(v.clone())));
        }
        if let Some(v) = self.auto_scroll {
            out.push((SettingRef::AutoScroll, SettingValue::Flag(v)));
        }
        if let Some(v) = &self.voice {
            out.push((SettingRef::Voice, SettingValue::Voice(v.clone())));
        }
        if let Some(v) = self.highlight {
            out.push((SettingRef::Highlight, SettingValue::Highlight(v)));
        }
        out
    }

    /// Apply every present field onto `base`.
    pub fn overlay(&self, base: &mut TtsSpeechConfig) -> Result<()> {
        for (setting, value) in self.changes() {
            base.set(setting, value)?;
        }
        Ok(())
    }
}
