//! Style profiles learned from template decks.
//!
//! A [`StyleProfile`] captures the palette, fonts, layouts, slide size, and
//! margins of a template so that generated decks can imitate it. The
//! classification rules here are pure; reading the template package lives
//! in the PPTX backend.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Luminance below this is "dark".
const DARK_LUMINANCE: f64 = 85.0;

/// Luminance above this is "light".
const LIGHT_LUMINANCE: f64 = 200.0;

/// Luminance assumed for unparseable colors.
const FALLBACK_LUMINANCE: f64 = 128.0;

/// Most colors kept in [`ColorPalette::additional_colors`].
const MAX_ADDITIONAL_COLORS: usize = 10;

/// Smallest margin reported, in inches.
const MIN_MARGIN: f64 = 0.25;

/// Shapes thinner than this near the top edge are treated as a header bar.
const HEADER_BAR_LIMIT: f64 = 0.3;

/// Substrings that identify Korean font families.
const KOREAN_FONT_INDICATORS: &[&str] = &[
    "맑은", "고딕", "굴림", "돋움", "바탕", "나눔", "Malgun", "Gulim", "Dotum", "Batang", "Nanum",
];

/// Named colors as `#RRGGBB` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text_dark: String,
    pub text_light: String,
    /// Up to ten colors in the order they were first seen.
    pub additional_colors: Vec<String>,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            primary: "#1E3A8A".to_string(),
            secondary: "#64748B".to_string(),
            accent: "#3B82F6".to_string(),
            background: "#FFFFFF".to_string(),
            text_dark: "#1E293B".to_string(),
            text_light: "#FFFFFF".to_string(),
            additional_colors: Vec::new(),
        }
    }
}

impl ColorPalette {
    /// Build a palette from colors in first-seen order.
    ///
    /// The first dark color becomes primary and dark text, the second dark
    /// color secondary, the first mid-tone color accent, and the first light
    /// color background unless it is pure white.
    pub fn from_colors(colors: &[String]) -> Self {
        let mut palette = Self::default();
        if colors.is_empty() {
            return palette;
        }

        let mut dark = Vec::new();
        let mut light = Vec::new();
        let mut mid = Vec::new();
        for color in colors {
            let l = luminance(color);
            if l < DARK_LUMINANCE {
                dark.push(color);
            } else if l > LIGHT_LUMINANCE {
                light.push(color);
            } else {
                mid.push(color);
            }
        }

        if let Some(first) = dark.first() {
            palette.primary = (*first).clone();
            palette.text_dark = (*first).clone();
        }
        if let Some(second) = dark.get(1) {
            palette.secondary = (*second).clone();
        }
        if let Some(first) = mid.first() {
            palette.accent = (*first).clone();
        }
        if let Some(first) = light.first() {
            if !first.eq_ignore_ascii_case("#FFFFFF") {
                palette.background = (*first).clone();
            }
        }
        palette.additional_colors = colors.iter().take(MAX_ADDITIONAL_COLORS).cloned().collect();
        palette
    }
}

/// Perceived brightness of a `#RRGGBB` color on a 0-255 scale.
///
/// Unparseable input yields a mid-tone value.
pub fn luminance(hex: &str) -> f64 {
    let hex = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(f64::from)
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => (r * 299.0 + g * 587.0 + b * 114.0) / 1000.0,
        _ => FALLBACK_LUMINANCE,
    }
}

/// Font families and sizes (in points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    pub title_font: String,
    pub body_font: String,
    pub english_font: String,
    pub title_size: u32,
    pub subtitle_size: u32,
    pub body_size: u32,
    pub small_size: u32,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            title_font: "맑은 고딕".to_string(),
            body_font: "맑은 고딕".to_string(),
            english_font: "Arial".to_string(),
            title_size: 44,
            subtitle_size: 28,
            body_size: 18,
            small_size: 14,
        }
    }
}

impl FontSettings {
    /// Pick title/body and Latin fonts from font names in first-seen order.
    pub fn from_fonts(fonts: &[String]) -> Self {
        let mut settings = Self::default();
        if let Some(korean) = fonts.iter().find(|f| is_korean_font(f)) {
            settings.title_font = korean.clone();
            settings.body_font = korean.clone();
        }
        if let Some(latin) = fonts.iter().find(|f| !is_korean_font(f)) {
            settings.english_font = latin.clone();
        }
        settings
    }
}

/// Whether a font name belongs to a Korean family.
pub fn is_korean_font(name: &str) -> bool {
    KOREAN_FONT_INDICATORS.iter().any(|i| name.contains(i))
}

/// Geometry of a layout placeholder, in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderInfo {
    pub idx: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A slide layout offered by a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub name: String,
    pub index: usize,
    #[serde(default)]
    pub has_title: bool,
    #[serde(default)]
    pub has_content: bool,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub placeholders: Vec<PlaceholderInfo>,
}

impl LayoutInfo {
    /// Classify a layout from its placeholders.
    pub fn new(name: impl Into<String>, index: usize, placeholders: Vec<PlaceholderInfo>) -> Self {
        let mut info = Self {
            name: name.into(),
            index,
            has_title: false,
            has_content: false,
            has_image: false,
            placeholders: Vec::new(),
        };
        for ph in &placeholders {
            let kind = ph.kind.as_str();
            if kind.contains("TITLE") {
                info.has_title = true;
            } else if kind.contains("BODY") || kind.contains("OBJECT") {
                info.has_content = true;
            } else if kind.contains("PICTURE") {
                info.has_image = true;
            }
        }
        info.placeholders = placeholders;
        info
    }
}

/// A shape's bounding box in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Margins and header-bar settings estimated from shape extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginEstimate {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header_height: f64,
    pub use_header_bar: bool,
}

impl Default for MarginEstimate {
    fn default() -> Self {
        Self {
            left: 0.5,
            right: 0.5,
            top: 0.5,
            bottom: 0.5,
            header_height: 0.15,
            use_header_bar: false,
        }
    }
}

impl MarginEstimate {
    /// Estimate margins from the shapes of one slide.
    ///
    /// Each margin is the gap between the slide edge and the outermost
    /// shape, floored at a quarter inch.
    pub fn from_shapes(shapes: &[ShapeBox], slide_width: f64, slide_height: f64) -> Self {
        let mut estimate = Self::default();
        if shapes.is_empty() {
            return estimate;
        }

        let mut min_left = slide_width;
        let mut max_right: f64 = 0.0;
        let mut min_top = slide_height;
        let mut max_bottom: f64 = 0.0;

        for shape in shapes {
            min_left = min_left.min(shape.left);
            max_right = max_right.max(shape.left + shape.width);
            min_top = min_top.min(shape.top);
            max_bottom = max_bottom.max(shape.top + shape.height);

            if shape.top < HEADER_BAR_LIMIT && shape.height < HEADER_BAR_LIMIT {
                estimate.use_header_bar = true;
                estimate.header_height = shape.height;
            }
        }

        if min_left < slide_width {
            estimate.left = min_left.max(MIN_MARGIN);
        }
        if max_right > 0.0 {
            estimate.right = (slide_width - max_right).max(MIN_MARGIN);
        }
        if min_top < slide_height {
            estimate.top = min_top.max(MIN_MARGIN);
        }
        if max_bottom > 0.0 {
            estimate.bottom = (slide_height - max_bottom).max(MIN_MARGIN);
        }
        estimate
    }
}

/// Everything learned from a template deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleProfile {
    pub name: String,
    pub colors: ColorPalette,
    pub fonts: FontSettings,
    pub layouts: Vec<LayoutInfo>,
    /// Inches.
    pub slide_width: f64,
    /// Inches.
    pub slide_height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub header_height: f64,
    pub use_header_bar: bool,
    pub use_footer: bool,
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            colors: ColorPalette::default(),
            fonts: FontSettings::default(),
            layouts: Vec::new(),
            slide_width: 13.333,
            slide_height: 7.5,
            margin_left: 0.5,
            margin_right: 0.5,
            margin_top: 0.5,
            margin_bottom: 0.5,
            header_height: 0.15,
            use_header_bar: true,
            use_footer: false,
        }
    }
}

impl StyleProfile {
    /// Apply estimated margins and header settings.
    pub fn with_margins(mut self, margins: MarginEstimate) -> Self {
        self.margin_left = margins.left;
        self.margin_right = margins.right;
        self.margin_top = margins.top;
        self.margin_bottom = margins.bottom;
        self.header_height = margins.header_height;
        self.use_header_bar = margins.use_header_bar;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sidecar location for a template: `deck.pptx` -> `deck_style.json`.
    pub fn sidecar_path(template: &Path) -> PathBuf {
        let stem = template
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("template");
        template.with_file_name(format!("{}_style.json", stem))
    }

    /// Load a profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load the sidecar profile stored next to a template, if any.
    pub fn load_sidecar(template: &Path) -> Result<Option<Self>> {
        let path = Self::sidecar_path(template);
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    /// Store the profile next to its template and return the sidecar path.
    pub fn save_sidecar(&self, template: &Path) -> Result<PathBuf> {
        let path = Self::sidecar_path(template);
        std::fs::write(&path, self.to_json()?)?;
        Ok(path)
    }
}
