//! On-screen controls for the read-aloud settings panel.
//!
//! The host view reports which element ids it actually renders; controls
//! whose element is missing stay unbound and activating them does nothing.

use crate::controller::TtsSettings;
use crate::refs::SettingRef;
use crate::settings::HighlightStyle;
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    DecreaseRate,
    IncreaseRate,
    DecreasePitch,
    IncreasePitch,
    DecreaseVolume,
    IncreaseVolume,
    AutoScroll,
    Highlight,
}

impl ControlId {
    pub const ALL: [ControlId; 8] = [
        ControlId::DecreaseRate,
        ControlId::IncreaseRate,
        ControlId::DecreasePitch,
        ControlId::IncreasePitch,
        ControlId::DecreaseVolume,
        ControlId::IncreaseVolume,
        ControlId::AutoScroll,
        ControlId::Highlight,
    ];

    pub fn element_id(&self) -> &'static str {
        match self {
            ControlId::DecreaseRate => "decrease-rate",
            ControlId::IncreaseRate => "increase-rate",
            ControlId::DecreasePitch => "decrease-pitch",
            ControlId::IncreasePitch => "increase-pitch",
            ControlId::DecreaseVolume => "decrease-volume",
            ControlId::IncreaseVolume => "increase-volume",
            ControlId::AutoScroll => "autoScroll",
            ControlId::Highlight => "highlight",
        }
    }

    /// Accepts the element id with or without a leading `#`.
    pub fn from_element_id(id: &str) -> Option<Self> {
        let id = id.strip_prefix('#').unwrap_or(id);
        Self::ALL.into_iter().find(|c| c.element_id() == id)
    }

    /// Preference the control acts on
    pub fn target(&self) -> SettingRef {
        match self {
            ControlId::DecreaseRate | ControlId::IncreaseRate => SettingRef::Rate,
            ControlId::DecreasePitch | ControlId::IncreasePitch => SettingRef::Pitch,
            ControlId::DecreaseVolume | ControlId::IncreaseVolume => SettingRef::Volume,
            ControlId::AutoScroll => SettingRef::AutoScroll,
            ControlId::Highlight => SettingRef::Highlight,
        }
    }

    pub fn is_checkbox(&self) -> bool {
        matches!(self, ControlId::AutoScroll | ControlId::Highlight)
    }
}

/// Values the panel displays
#[derive(Debug, Clone, PartialEq)]
pub struct ControlsView {
    /// `#speechRate` readout
    pub rate: String,
    /// `#speechPitch` readout
    pub pitch: String,
    /// `#speechVolume` readout
    pub volume: String,
    pub auto_scroll_checked: bool,
    pub auto_scroll_label: String,
    /// Checked while whole lines are highlighted
    pub highlight_checked: bool,
}

pub struct ControlPanel {
    settings: Arc<TtsSettings>,
    bound: HashSet<ControlId>,
}

impl ControlPanel {
    /// Bind the controls whose element ids are present in the view.
    pub fn bind<'a, I>(settings: Arc<TtsSettings>, element_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut bound = HashSet::new();
        for id in element_ids {
            match ControlId::from_element_id(id) {
                Some(control) => {
                    bound.insert(control);
                }
                None => debug!(element = id, "Ignoring unknown control element"),
            }
        }
        debug!(bound = bound.len(), "Settings controls bound");
        Self { settings, bound }
    }

    pub fn bind_all(settings: Arc<TtsSettings>) -> Self {
        Self::bind(settings, ControlId::ALL.iter().map(|c| c.element_id()))
    }

    pub fn is_bound(&self, control: ControlId) -> bool {
        self.bound.contains(&control)
    }

    /// Click a control. Buttons step their preference; checkboxes flip.
    /// Returns `false` when the control is not bound.
    pub async fn activate(&self, control: ControlId) -> Result<bool> {
        if !self.is_bound(control) {
            return Ok(false);
        }
        match control {
            ControlId::IncreaseRate | ControlId::IncreasePitch | ControlId::IncreaseVolume => {
                self.settings.increment(control.target()).await?;
            }
            ControlId::DecreaseRate | ControlId::DecreasePitch | ControlId::DecreaseVolume => {
                self.settings.decrement(control.target()).await?;
            }
            ControlId::AutoScroll => {
                let checked = self.settings.snapshot().await.auto_scroll;
                self.apply_checked(control, !checked).await?;
            }
            ControlId::Highlight => {
                let checked = self.settings.snapshot().await.highlight == HighlightStyle::Lines;
                self.apply_checked(control, !checked).await?;
            }
        }
        Ok(true)
    }

    /// Set a checkbox to `checked`. Buttons and unbound controls are ignored.
    pub async fn set_checked(&self, control: ControlId, checked: bool) -> Result<bool> {
        if !control.is_checkbox() || !self.is_bound(control) {
            return Ok(false);
        }
        self.apply_checked(control, checked).await?;
        Ok(true)
    }

    pub async fn render(&self) -> ControlsView {
        let s = self.settings.snapshot().await;
        let auto_scroll_label = self
            .settings
            .property(SettingRef::AutoScroll)
            .await
            .ok()
            .and_then(|p| p.as_toggle().map(|t| t.label().to_string()))
            .unwrap_or_default();
        ControlsView {
            rate: s.rate.to_string(),
            pitch: s.pitch.to_string(),
            volume: s.volume.to_string(),
            auto_scroll_checked: s.auto_scroll,
            auto_scroll_label,
            highlight_checked: s.highlight == HighlightStyle::Lines,
        }
    }

    async fn apply_checked(&self, control: ControlId, checked: bool) -> Result<()> {
        match control {
            ControlId::AutoScroll => {
                self.settings
                    .set_by_key(SettingRef::AutoScroll, checked)
                    .await
            }
            ControlId::Highlight => {
                let style = if checked {
                    HighlightStyle::Lines
                } else {
                    HighlightStyle::Word
                };
                self.settings.set_by_key(SettingRef::Highlight, style).await
            }
            _ => Ok(()),
        }
    }
}
