//! Notification content description

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TemplateError;

/// Fixed notification layouts
///
/// Each layout declares how many text lines it renders and whether it carries
/// an image slot. The discriminants follow the platform's template numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    ImageAndText01 = 0,
    ImageAndText02 = 1,
    ImageAndText03 = 2,
    ImageAndText04 = 3,
    Text01 = 4,
    Text02 = 5,
    Text03 = 6,
    Text04 = 7,
}

impl Layout {
    pub const ALL: [Layout; 8] = [
        Layout::ImageAndText01,
        Layout::ImageAndText02,
        Layout::ImageAndText03,
        Layout::ImageAndText04,
        Layout::Text01,
        Layout::Text02,
        Layout::Text03,
        Layout::Text04,
    ];

    /// Number of text fields the layout renders
    pub fn text_field_count(&self) -> usize {
        match self {
            Layout::ImageAndText01 | Layout::Text01 => 1,
            Layout::ImageAndText02
            | Layout::ImageAndText03
            | Layout::Text02
            | Layout::Text03 => 2,
            Layout::ImageAndText04 | Layout::Text04 => 3,
        }
    }

    pub fn has_image_slot(&self) -> bool {
        matches!(
            self,
            Layout::ImageAndText01
                | Layout::ImageAndText02
                | Layout::ImageAndText03
                | Layout::ImageAndText04
        )
    }

    /// Template name written into the binding element
    pub fn name(&self) -> &'static str {
        match self {
            Layout::ImageAndText01 => "ToastImageAndText01",
            Layout::ImageAndText02 => "ToastImageAndText02",
            Layout::ImageAndText03 => "ToastImageAndText03",
            Layout::ImageAndText04 => "ToastImageAndText04",
            Layout::Text01 => "ToastText01",
            Layout::Text02 => "ToastText02",
            Layout::Text03 => "ToastText03",
            Layout::Text04 => "ToastText04",
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Positional text line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextField {
    FirstLine = 0,
    SecondLine = 1,
    ThirdLine = 2,
}

impl TextField {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Audio behaviour. `Silent` and `Loop` are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioOption {
    #[default]
    Default,
    Silent,
    Loop,
}

impl AudioOption {
    /// Parse the numeric audio state (0 = default, 1 = silent, 2 = loop)
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AudioOption::Default),
            1 => Some(AudioOption::Silent),
            2 => Some(AudioOption::Loop),
            _ => None,
        }
    }
}

/// Content of one notification
///
/// Built by the caller and handed to the compiler read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateModel {
    layout: Layout,
    text_fields: Vec<String>,
    image_path: Option<PathBuf>,
    audio_path: Option<PathBuf>,
    audio_option: AudioOption,
    attribution_text: Option<String>,
    actions: Vec<String>,
    expiration: Duration,
}

impl TemplateModel {
    /// Create a model whose text fields are pre-sized to the layout's count
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            text_fields: vec![String::new(); layout.text_field_count()],
            image_path: None,
            audio_path: None,
            audio_option: AudioOption::Default,
            attribution_text: None,
            actions: Vec::new(),
            expiration: Duration::ZERO,
        }
    }

    pub fn set_text_field(
        &mut self,
        text: impl Into<String>,
        field: TextField,
    ) -> Result<(), TemplateError> {
        let count = self.text_fields.len();
        let slot = self
            .text_fields
            .get_mut(field.index())
            .ok_or(TemplateError::FieldOutOfRange {
                layout: self.layout,
                field,
                count,
            })?;
        *slot = text.into();
        Ok(())
    }

    pub fn set_image_path(&mut self, path: impl Into<PathBuf>) -> Result<(), TemplateError> {
        if !self.layout.has_image_slot() {
            return Err(TemplateError::NoImageSlot(self.layout));
        }
        self.image_path = Some(path.into());
        Ok(())
    }

    pub fn set_audio_path(&mut self, path: impl Into<PathBuf>) {
        self.audio_path = Some(path.into());
    }

    pub fn set_audio_option(&mut self, option: AudioOption) {
        self.audio_option = option;
    }

    /// Empty text clears the attribution
    pub fn set_attribution_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.attribution_text = (!text.is_empty()).then_some(text);
    }

    pub fn add_action(&mut self, label: impl Into<String>) {
        self.actions.push(label.into());
    }

    /// Relative expiration; zero disables it
    pub fn set_expiration(&mut self, expiration: Duration) {
        self.expiration = expiration;
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn text_fields(&self) -> &[String] {
        &self.text_fields
    }

    pub fn text_field(&self, field: TextField) -> Option<&str> {
        self.text_fields.get(field.index()).map(String::as_str)
    }

    pub fn text_fields_count(&self) -> usize {
        self.text_fields.len()
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image_path.as_deref()
    }

    pub fn has_image(&self) -> bool {
        self.layout.has_image_slot() && self.image_path.is_some()
    }

    pub fn audio_path(&self) -> Option<&Path> {
        self.audio_path.as_deref()
    }

    pub fn audio_option(&self) -> AudioOption {
        self.audio_option
    }

    pub fn attribution_text(&self) -> Option<&str> {
        self.attribution_text.as_deref()
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn actions_count(&self) -> usize {
        self.actions.len()
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }
}
