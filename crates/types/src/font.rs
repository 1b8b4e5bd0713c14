use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the single stored custom font.
pub const FONT_ID: &str = "userFont";

/// Logical font format, as named in a CSS `format()` hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFormat {
    Truetype,
    Opentype,
    Woff,
    Woff2,
}

impl FontFormat {
    /// Map a file extension (with or without the dot, any case) to a format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "ttf" => Some(Self::Truetype),
            "otf" => Some(Self::Opentype),
            "woff" => Some(Self::Woff),
            "woff2" => Some(Self::Woff2),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Truetype => "truetype",
            Self::Opentype => "opentype",
            Self::Woff => "woff",
            Self::Woff2 => "woff2",
        }
    }
}

/// A user-uploaded font. At most one is stored, under [`FONT_ID`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFont {
    pub id: String,
    pub name: String,
    /// Base64 encoding of the font file.
    pub data: String,
    pub format: FontFormat,
    /// Upper-case extension of the uploaded file, e.g. `TTF`.
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub size: u64,
}

impl CustomFont {
    /// Self-contained `@font-face` rule embedding the font as a data URL.
    pub fn font_face_rule(&self, family: &str) -> String {
        format!(
            "@font-face {{\n    font-family: '{family}';\n    src: url('data:font/{mime};charset=utf-8;base64,{data}') format('{format}');\n    font-weight: normal;\n    font-style: normal;\n    font-display: swap;\n}}",
            mime = self.file_type.to_ascii_lowercase(),
            data = self.data,
            format = self.format.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions() {
        assert_eq!(FontFormat::from_extension(".TTF"), Some(FontFormat::Truetype));
        assert_eq!(FontFormat::from_extension("woff2"), Some(FontFormat::Woff2));
        assert_eq!(FontFormat::from_extension(".eot"), None);
    }

    #[test]
    fn font_face_rule_embeds_data() {
        let font = CustomFont {
            id: FONT_ID.to_string(),
            name: "Serif".to_string(),
            data: "AAEC".to_string(),
            format: FontFormat::Opentype,
            file_type: "OTF".to_string(),
            uploaded_at: Utc::now(),
            size: 3,
        };

        let rule = font.font_face_rule("Custom_1");
        assert!(rule.contains("font-family: 'Custom_1'"));
        assert!(rule.contains("data:font/otf;charset=utf-8;base64,AAEC"));
        assert!(rule.contains("format('opentype')"));
    }
}
