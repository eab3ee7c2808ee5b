//! Property registry.
//!
//! Declarative, typed entries for every preference. The same entries back
//! the on-screen controls and the programmatic API, so bounds and step
//! logic live here only.

use crate::refs::SettingRef;
use crate::settings::{clamp_to, NumericBounds, SettingValue, TtsSpeechConfig};
use crate::{Result, SettingsError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Stepped values are rounded to this grid so that `1.0 + 3 * 0.1 == 1.3`
const STEP_PRECISION: f64 = 1e9;

/// Number constrained to an inclusive range, moved by a fixed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedNumeric {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    #[serde(default)]
    pub suffix: String,
}

impl BoundedNumeric {
    /// Out-of-range values are clamped, never rejected.
    pub fn new(value: f64, min: f64, max: f64, step: f64, suffix: impl Into<String>) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let clamped = clamp_to(value, min, max);
        if clamped != value {
            debug!(value, min, max, "Clamped out-of-range numeric property");
        }
        Self {
            value: clamped,
            min,
            max,
            step: step.abs(),
            suffix: suffix.into(),
        }
    }

    pub fn from_bounds(value: f64, bounds: NumericBounds) -> Self {
        Self::new(value, bounds.min, bounds.max, bounds.step, "")
    }

    pub fn increment(&mut self) {
        self.value = self.stepped(self.step);
    }

    pub fn decrement(&mut self) {
        self.value = self.stepped(-self.step);
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = clamp_to(value, self.min, self.max);
    }

    pub fn at_max(&self) -> bool {
        self.value >= self.max
    }

    pub fn at_min(&self) -> bool {
        self.value <= self.min
    }

    fn stepped(&self, delta: f64) -> f64 {
        let raw = ((self.value + delta) * STEP_PRECISION).round() / STEP_PRECISION;
        clamp_to(raw, self.min, self.max)
    }
}

/// Boolean with a display label for each state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toggle {
    pub value: bool,
    pub on_label: String,
    pub off_label: String,
}

impl Toggle {
    pub fn set_value(&mut self, value: bool) {
        self.value = value;
    }

    pub fn label(&self) -> &str {
        if self.value {
            &self.on_label
        } else {
            &self.off_label
        }
    }
}

/// Kind-specific payload of a property entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PropertyValue {
    Toggle(Toggle),
    BoundedNumeric(BoundedNumeric),
    Text { value: String },
    Opaque { value: Value },
}

impl PropertyValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Toggle(_) => "toggle",
            PropertyValue::BoundedNumeric(_) => "boundedNumeric",
            PropertyValue::Text { .. } => "text",
            PropertyValue::Opaque { .. } => "opaque",
        }
    }
}

/// One registered preference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyEntry {
    /// Reference name, unique within a registry
    pub name: String,
    pub persistence_key: String,
    #[serde(flatten)]
    pub property: PropertyValue,
}

impl PropertyEntry {
    /// The entry's value as JSON
    pub fn value(&self) -> Value {
        match &self.property {
            PropertyValue::Toggle(t) => Value::Bool(t.value),
            PropertyValue::BoundedNumeric(n) => Value::from(n.value),
            PropertyValue::Text { value } => Value::String(value.clone()),
            PropertyValue::Opaque { value } => value.clone(),
        }
    }

    pub fn as_numeric(&self) -> Option<&BoundedNumeric> {
        match &self.property {
            PropertyValue::BoundedNumeric(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_numeric_mut(&mut self) -> Option<&mut BoundedNumeric> {
        match &mut self.property {
            PropertyValue::BoundedNumeric(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_toggle(&self) -> Option<&Toggle> {
        match &self.property {
            PropertyValue::Toggle(t) => Some(t),
            _ => None,
        }
    }

    /// Replace the value, keeping the entry's kind and metadata.
    pub fn set_value(&mut self, value: &SettingValue) -> Result<()> {
        match (&mut self.property, value) {
            (PropertyValue::BoundedNumeric(n), SettingValue::Number(v)) => n.set_value(*v),
            (PropertyValue::Toggle(t), SettingValue::Flag(v)) => t.set_value(*v),
            (PropertyValue::Text { value: slot }, SettingValue::Text(v)) => *slot = v.clone(),
            (PropertyValue::Text { value: slot }, SettingValue::Highlight(h)) => {
                *slot = h.as_str().to_string()
            }
            (PropertyValue::Opaque { value: slot }, v) => *slot = v.to_json(),
            (property, _) => {
                return Err(SettingsError::TypeMismatch {
                    name: self.name.clone(),
                    expected: property.kind(),
                })
            }
        }
        Ok(())
    }
}

/// Registry of property entries, addressed by reference name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProperties {
    entries: Vec<PropertyEntry>,
}

impl UserProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated from a snapshot, one entry per preference.
    pub fn from_snapshot(settings: &TtsSpeechConfig) -> Self {
        let mut props = Self::new();
        props.add_toggle(
            "tts-auto-scroll-off",
            "tts-auto-scroll-on",
            settings.auto_scroll,
            SettingRef::AutoScroll.name(),
            SettingRef::AutoScroll.persistence_key(),
        );
        for (setting, value) in [
            (SettingRef::Rate, settings.rate),
            (SettingRef::Pitch, settings.pitch),
            (SettingRef::Volume, settings.volume),
        ] {
            if let Some(b) = NumericBounds::for_ref(setting) {
                props.add_bounded_numeric(
                    value,
                    b.min,
                    b.max,
                    b.step,
                    "",
                    setting.name(),
                    setting.persistence_key(),
                );
            }
        }
        props.add_string(
            settings.color.clone(),
            SettingRef::Color.name(),
            SettingRef::Color.persistence_key(),
        );
        props.add_string(
            settings.highlight.as_str(),
            SettingRef::Highlight.name(),
            SettingRef::Highlight.persistence_key(),
        );
        props.add_opaque(
            SettingValue::Voice(settings.voice.clone()).to_json(),
            SettingRef::Voice.name(),
            SettingRef::Voice.persistence_key(),
        );
        props
    }

    pub fn add_toggle(
        &mut self,
        off_label: impl Into<String>,
        on_label: impl Into<String>,
        value: bool,
        name: &str,
        persistence_key: &str,
    ) {
        self.insert(
            name,
            persistence_key,
            PropertyValue::Toggle(Toggle {
                value,
                on_label: on_label.into(),
                off_label: off_label.into(),
            }),
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_bounded_numeric(
        &mut self,
        value: f64,
        min: f64,
        max: f64,
        step: f64,
        suffix: &str,
        name: &str,
        persistence_key: &str,
    ) {
        self.insert(
            name,
            persistence_key,
            PropertyValue::BoundedNumeric(BoundedNumeric::new(value, min, max, step, suffix)),
        );
    }

    pub fn add_string(&mut self, value: impl Into<String>, name: &str, persistence_key: &str) {
        self.insert(
            name,
            persistence_key,
            PropertyValue::Text {
                value: value.into(),
            },
        );
    }

    pub fn add_opaque(&mut self, value: Value, name: &str, persistence_key: &str) {
        self.insert(name, persistence_key, PropertyValue::Opaque { value });
    }

    pub fn get_by_ref(&self, name: &str) -> Result<&PropertyEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| SettingsError::NotFound(name.to_string()))
    }

    pub fn get_by_ref_mut(&mut self, name: &str) -> Result<&mut PropertyEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| SettingsError::NotFound(name.to_string()))
    }

    pub fn get(&self, setting: SettingRef) -> Result<&PropertyEntry> {
        self.get_by_ref(setting.name())
    }

    pub fn get_mut(&mut self, setting: SettingRef) -> Result<&mut PropertyEntry> {
        self.get_by_ref_mut(setting.name())
    }

    pub fn entries(&self) -> &[PropertyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Re-registering a name replaces the earlier entry in place
    fn insert(&mut self, name: &str, persistence_key: &str, property: PropertyValue) {
        let entry = PropertyEntry {
            name: name.to_string(),
            persistence_key: persistence_key.to_string(),
            property,
        };
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::HighlightStyle;
    use serde_json::json;

    #[test]
    fn test_increment_never_exceeds_max() {
        let mut rate = BoundedNumeric::from_bounds(9.7, NumericBounds::RATE);
        for _ in 0..10 {
            rate.increment();
            assert!(rate.value <= 10.0);
        }
        assert_eq!(rate.value, 10.0);
        assert!(rate.at_max());
    }

    #[test]
    fn test_decrement_never_below_min() {
        let mut volume = BoundedNumeric::from_bounds(0.3, NumericBounds::VOLUME);
        for _ in 0..10 {
            volume.decrement();
            assert!(volume.value >= 0.1);
        }
        assert_eq!(volume.value, 0.1);
        assert!(volume.at_min());
    }

    #[test]
    fn test_step_is_exact() {
        let mut rate = BoundedNumeric::from_bounds(1.0, NumericBounds::RATE);
        rate.increment();
        rate.increment();
        rate.increment();
        assert_eq!(rate.value, 1.3);
        rate.decrement();
        assert_eq!(rate.value, 1.2);
    }

    #[test]
    fn test_construction_clamps() {
        let n = BoundedNumeric::new(25.0, 0.1, 2.0, 0.1, "");
        assert_eq!(n.value, 2.0);
        let swapped = BoundedNumeric::new(0.5, 2.0, 0.1, 0.1, "x");
        assert_eq!((swapped.min, swapped.max), (0.1, 2.0));
        assert_eq!(swapped.value, 0.5);
    }

    #[test]
    fn test_get_by_ref_not_found() {
        let props = UserProperties::new();
        let err = props.get_by_ref("rate").unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(_)));
    }

    #[test]
    fn test_from_snapshot_registers_all() {
        let props = UserProperties::from_snapshot(&TtsSpeechConfig::default());
        assert_eq!(props.len(), SettingRef::ALL.len());
        for r in SettingRef::ALL {
            let entry = props.get(r).unwrap();
            assert_eq!(entry.persistence_key, r.persistence_key());
        }
        let scroll = props.get(SettingRef::AutoScroll).unwrap().as_toggle().unwrap();
        assert_eq!(scroll.label(), "tts-auto-scroll-on");
        assert_eq!(
            props.get(SettingRef::Voice).unwrap().value(),
            json!({"usePublication": true})
        );
    }

    #[test]
    fn test_re_adding_replaces() {
        let mut props = UserProperties::new();
        props.add_string("orange", "color", "tts-color");
        props.add_string("blue", "color", "tts-color");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get_by_ref("color").unwrap().value(), json!("blue"));
    }

    #[test]
    fn test_set_value_type_mismatch() {
        let mut props = UserProperties::from_snapshot(&TtsSpeechConfig::default());
        let entry = props.get_mut(SettingRef::AutoScroll).unwrap();
        let err = entry.set_value(&SettingValue::Number(1.0)).unwrap_err();
        assert!(matches!(err, SettingsError::TypeMismatch { expected: "toggle", .. }));

        let highlight = props.get_mut(SettingRef::Highlight).unwrap();
        highlight
            .set_value(&SettingValue::Highlight(HighlightStyle::Word))
            .unwrap();
        assert_eq!(highlight.value(), json!("word"));
    }

    #[test]
    fn test_entry_serialized_shape() {
        let props = UserProperties::from_snapshot(&TtsSpeechConfig::default());
        let value = serde_json::to_value(props.get(SettingRef::Rate).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "rate",
                "persistenceKey": "tts-rate",
                "kind": "boundedNumeric",
                "value": 1.0,
                "min": 0.1,
                "max": 10.0,
                "step": 0.1,
                "suffix": ""
            })
        );
    }
}
