//! User-facing reading preferences.
//!
//! Persisted locally under its own key and mirrored from the remote user
//! document after a remote load.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    #[default]
    Sans,
    Mono,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Warm,
}

/// Reading preferences. Missing fields fall back to defaults when parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub font_family: FontFamily,
    pub font_size: FontSize,
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::{FontFamily, FontSize, Settings, Theme};

    #[test]
    fn partial_document_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"theme":"warm"}"#).expect("partial settings should parse");
        assert_eq!(settings.theme, Theme::Warm);
        assert_eq!(settings.font_family, FontFamily::Sans);
        assert_eq!(settings.font_size, FontSize::Medium);
    }
}
