//! Theme store.
//!
//! Hosts push one theme per colour scheme. Nothing is applied until both a dark and a light
//! theme are known; after that the active scheme picks which one is published.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Host colour scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Dark appearance.
    #[default]
    Dark,
    /// Light appearance.
    Light,
}

impl ColorScheme {
    /// Parse `dark` / `light`.
    pub fn parse(input: &str) -> Result<Self, BridgeError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(BridgeError::UnknownColorScheme(other.to_string())),
        }
    }

    /// Base theme name.
    pub fn base_theme(self) -> &'static str {
        match self {
            Self::Dark => "vs-dark",
            Self::Light => "vs",
        }
    }
}

/// A theme as hosts send it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    /// Which scheme this theme is for.
    #[serde(rename = "type")]
    pub kind: ColorScheme,
    /// Workbench colour overrides.
    #[serde(default)]
    pub colors: Value,
    /// TextMate token rules.
    #[serde(default)]
    pub token_colors: Value,
}

impl Theme {
    /// Parse a theme document.
    pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The resolved theme to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTheme {
    /// Base theme name.
    pub base: String,
    /// User configuration carrying the customizations.
    pub configuration: Value,
}

/// Dark/light theme slots plus the active scheme.
#[derive(Debug, Default)]
pub struct ThemeStore {
    dark: Option<Theme>,
    light: Option<Theme>,
    scheme: ColorScheme,
}

impl ThemeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `theme` in its slot.
    pub fn store(&mut self, theme: Theme) {
        match theme.kind {
            ColorScheme::Dark => self.dark = Some(theme),
            ColorScheme::Light => self.light = Some(theme),
        }
    }

    /// Change the active scheme. Returns whether it changed.
    pub fn set_scheme(&mut self, scheme: ColorScheme) -> bool {
        std::mem::replace(&mut self.scheme, scheme) != scheme
    }

    /// Active scheme.
    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    /// Resolve the theme to apply. `None` until both slots are filled.
    pub fn resolve(&self) -> Option<AppliedTheme> {
        let (dark, light) = (self.dark.as_ref()?, self.light.as_ref()?);
        let theme = match self.scheme {
            ColorScheme::Dark => dark,
            ColorScheme::Light => light,
        };
        Some(AppliedTheme {
            base: self.scheme.base_theme().to_string(),
            configuration: json!({
                "workbench.colorCustomizations": theme.colors,
                "editor.tokenColorCustomizations": {
                    "textMateRules": theme.token_colors,
                },
            }),
        })
    }
}
