//! Built-in color themes for generated decks.

use crate::style::{ColorPalette, StyleProfile};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parse a color, falling back to `default` when malformed.
    pub fn from_hex_or(hex: &str, default: Rgb) -> Self {
        Self::from_hex(hex).unwrap_or_else(|| {
            log::warn!("Invalid color '{}', using {}", hex, default);
            default
        })
    }

    /// Uppercase `RRGGBB` without the leading `#`, as used in OOXML.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

/// Names of the built-in themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    ModernBlue,
    Corporate,
    Dark,
    Minimal,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::ModernBlue, Theme::Corporate, Theme::Dark, Theme::Minimal];

    pub fn name(self) -> &'static str {
        match self {
            Theme::ModernBlue => "modern_blue",
            Theme::Corporate => "corporate",
            Theme::Dark => "dark",
            Theme::Minimal => "minimal",
        }
    }

    /// Look up a theme by name; unknown names give the default theme.
    pub fn from_name(name: &str) -> Self {
        let wanted = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .unwrap_or_else(|| {
                log::warn!("Unknown theme '{}', using {}", name, Theme::default().name());
                Theme::default()
            })
    }

    pub fn colors(self) -> ColorTheme {
        match self {
            Theme::ModernBlue => ColorTheme {
                primary: Rgb(0, 112, 192),
                secondary: Rgb(68, 84, 106),
                accent: Rgb(0, 176, 240),
                background: Rgb::WHITE,
                text_dark: Rgb(51, 51, 51),
                text_light: Rgb::WHITE,
            },
            Theme::Corporate => ColorTheme {
                primary: Rgb(0, 51, 102),
                secondary: Rgb(128, 128, 128),
                accent: Rgb(255, 153, 0),
                background: Rgb::WHITE,
                text_dark: Rgb(51, 51, 51),
                text_light: Rgb::WHITE,
            },
            Theme::Dark => ColorTheme {
                primary: Rgb(0, 188, 212),
                secondary: Rgb(66, 66, 66),
                accent: Rgb(255, 64, 129),
                background: Rgb(33, 33, 33),
                text_dark: Rgb::WHITE,
                text_light: Rgb::WHITE,
            },
            Theme::Minimal => ColorTheme {
                primary: Rgb(51, 51, 51),
                secondary: Rgb(128, 128, 128),
                accent: Rgb(0, 150, 136),
                background: Rgb(250, 250, 250),
                text_dark: Rgb(51, 51, 51),
                text_light: Rgb::WHITE,
            },
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// Resolved colors used while drawing slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTheme {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub background: Rgb,
    pub text_dark: Rgb,
    pub text_light: Rgb,
}

impl ColorTheme {
    /// Colors taken from a learned palette.
    pub fn from_palette(palette: &ColorPalette) -> Self {
        Self {
            primary: Rgb::from_hex_or(&palette.primary, Rgb(0, 112, 192)),
            secondary: Rgb::from_hex_or(&palette.secondary, Rgb(68, 84, 106)),
            accent: Rgb::from_hex_or(&palette.accent, Rgb(0, 176, 240)),
            background: Rgb::from_hex_or(&palette.background, Rgb::WHITE),
            text_dark: Rgb::from_hex_or(&palette.text_dark, Rgb(51, 51, 51)),
            text_light: Rgb::from_hex_or(&palette.text_light, Rgb::WHITE),
        }
    }
}

/// Where a renderer takes its look from.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderStyle {
    Theme(Theme),
    Profile(StyleProfile),
}

impl RenderStyle {
    pub fn colors(&self) -> ColorTheme {
        match self {
            RenderStyle::Theme(theme) => theme.colors(),
            RenderStyle::Profile(profile) => ColorTheme::from_palette(&profile.colors),
        }
    }

    pub fn profile(&self) -> Option<&StyleProfile> {
        match self {
            RenderStyle::Profile(profile) => Some(profile),
            RenderStyle::Theme(_) => None,
        }
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        RenderStyle::Theme(Theme::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::from_hex("#1E3A8A"), Some(Rgb(0x1E, 0x3A, 0x8A)));
        assert_eq!(Rgb::from_hex("ffffff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#GGGGGG"), None);
        assert_eq!(Rgb(0, 112, 192).to_hex(), "0070C0");
        assert_eq!(Rgb(0, 112, 192).to_string(), "#0070C0");
    }

    #[test]
    fn test_theme_lookup() {
        assert_eq!(Theme::from_name("corporate"), Theme::Corporate);
        assert_eq!(Theme::from_name("Modern-Blue"), Theme::ModernBlue);
        assert_eq!(Theme::from_name("no_such_theme"), Theme::ModernBlue);
    }

    #[test]
    fn test_theme_colors() {
        let dark = Theme::Dark.colors();
        assert_eq!(dark.background, Rgb(33, 33, 33));
        assert_eq!(dark.text_dark, Rgb::WHITE);
        assert_eq!(Theme::Corporate.colors().accent, Rgb(255, 153, 0));
    }

    #[test]
    fn test_profile_colors() {
        let mut profile = StyleProfile::default();
        profile.colors.primary = "#101010".to_string();
        profile.colors.accent = "bogus".to_string();
        let colors = RenderStyle::Profile(profile).colors();
        assert_eq!(colors.primary, Rgb(16, 16, 16));
        assert_eq!(colors.accent, Rgb(0, 176, 240));
    }
}
