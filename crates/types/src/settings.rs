use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_FONT_SIZE: u32 = 16;
pub const DEFAULT_FONT_WEIGHT: u32 = 400;
pub const DEFAULT_LETTER_SPACING: i32 = 0;
pub const DEFAULT_LINE_HEIGHT: f64 = 1.6;
pub const DEFAULT_PARAGRAPH_SPACING: f64 = 1.0;

/// Global typography settings.
///
/// Missing fields fall back to their defaults when deserializing, so partial
/// records from older backups still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Pixels.
    pub font_size: u32,
    pub font_weight: u32,
    /// Pixels.
    pub letter_spacing: i32,
    /// Multiple of the font size.
    pub line_height: f64,
    /// In `em`.
    pub paragraph_spacing: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_weight: DEFAULT_FONT_WEIGHT,
            letter_spacing: DEFAULT_LETTER_SPACING,
            line_height: DEFAULT_LINE_HEIGHT,
            paragraph_spacing: DEFAULT_PARAGRAPH_SPACING,
        }
    }
}

impl Settings {
    /// Restore size, weight and letter spacing.
    pub fn reset_text_style(&mut self) {
        self.font_size = DEFAULT_FONT_SIZE;
        self.font_weight = DEFAULT_FONT_WEIGHT;
        self.letter_spacing = DEFAULT_LETTER_SPACING;
    }

    /// Restore line height and paragraph spacing.
    pub fn reset_paragraph_style(&mut self) {
        self.line_height = DEFAULT_LINE_HEIGHT;
        self.paragraph_spacing = DEFAULT_PARAGRAPH_SPACING;
    }

    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::FontSize => self.font_size.to_string(),
            SettingKey::FontWeight => self.font_weight.to_string(),
            SettingKey::LetterSpacing => self.letter_spacing.to_string(),
            SettingKey::LineHeight => format!("{:.1}", self.line_height),
            SettingKey::ParagraphSpacing => format!("{:.1}", self.paragraph_spacing),
        }
    }

    /// Parse `value` and assign it to the field named by `key`.
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<(), UnknownSetting> {
        let invalid = || UnknownSetting::InvalidValue {
            key: key.as_str(),
            value: value.to_string(),
        };

        match key {
            SettingKey::FontSize => self.font_size = value.parse().map_err(|_| invalid())?,
            SettingKey::FontWeight => self.font_weight = value.parse().map_err(|_| invalid())?,
            SettingKey::LetterSpacing => {
                self.letter_spacing = value.parse().map_err(|_| invalid())?
            }
            SettingKey::LineHeight => {
                self.line_height = parse_finite(value).ok_or_else(invalid)?
            }
            SettingKey::ParagraphSpacing => {
                self.paragraph_spacing = parse_finite(value).ok_or_else(invalid)?
            }
        }
        Ok(())
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Names of the individual typography parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    FontSize,
    FontWeight,
    LetterSpacing,
    LineHeight,
    ParagraphSpacing,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::FontSize,
        SettingKey::FontWeight,
        SettingKey::LetterSpacing,
        SettingKey::LineHeight,
        SettingKey::ParagraphSpacing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::FontSize => "font-size",
            SettingKey::FontWeight => "font-weight",
            SettingKey::LetterSpacing => "letter-spacing",
            SettingKey::LineHeight => "line-height",
            SettingKey::ParagraphSpacing => "paragraph-spacing",
        }
    }
}

impl FromStr for SettingKey {
    type Err = UnknownSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| UnknownSetting::UnknownKey(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum UnknownSetting {
    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
