//! Domain types shared by the parser, summarizer, and renderers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Front-matter metadata, kept in key order so output is deterministic.
pub type Metadata = BTreeMap<String, String>;

/// A Markdown document broken into slide-sized sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Text of the first level-1 heading, if any.
    pub title: Option<String>,

    /// One entry per `##` section, in source order.
    pub slides: Vec<ParsedSlide>,

    /// Key/value pairs from the front-matter block.
    pub metadata: Metadata,
}

/// Structural kind of a line of slide content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Bullet,
    Numbered,
    Subheading,
    Quote,
}

/// A single classified line of slide content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub kind: ContentKind,
    pub text: String,
}

impl ContentItem {
    pub fn new(kind: ContentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// An image reference (`![alt](src)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub alt: String,
    pub src: String,
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Info-string language, `"text"` when absent.
    pub language: String,
    pub code: String,
}

/// A table with a header row and same-width data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Build a table, dropping any row whose width differs from the header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows.into_iter().filter(|r| r.len() == width).collect();
        Self { headers, rows }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

/// Layout of a parsed slide, derived from what the section contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideLayout {
    TitleContent,
    ImageOnly,
    ImageContent,
    Code,
    Table,
}

/// One `##` section of the source document.
///
/// Text before the first `##` heading becomes a section without a title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedSlide {
    pub title: Option<String>,
    pub content: Vec<ContentItem>,
    pub images: Vec<ImageRef>,
    pub code_blocks: Vec<CodeBlock>,
    pub tables: Vec<TableData>,
}

impl ParsedSlide {
    /// Create an empty slide with the given title; `""` means untitled.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            title: (!title.is_empty()).then_some(title),
            ..Default::default()
        }
    }

    /// Layout derived from the slide's contents.
    ///
    /// Images win over everything else, then code, then tables.
    pub fn layout(&self) -> SlideLayout {
        if !self.images.is_empty() {
            if self.content.is_empty() {
                SlideLayout::ImageOnly
            } else {
                SlideLayout::ImageContent
            }
        } else if !self.code_blocks.is_empty() {
            SlideLayout::Code
        } else if !self.tables.is_empty() {
            SlideLayout::Table
        } else {
            SlideLayout::TitleContent
        }
    }

    /// True when the section carries nothing worth a slide.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_empty() && self.tables.is_empty()
    }
}

/// Summarized, presentation-ready content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresentationContent {
    pub title: String,
    pub subtitle: Option<String>,
    pub slides: Vec<SlideContent>,
    pub metadata: Metadata,
}

/// A labelled numeric fact pulled out of body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

impl Metric {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Rendering hint for a summarized slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutHint {
    #[default]
    Bullet,
    Metrics,
    Table,
    TitleOnly,
    TwoColumn,
}

/// A single summarized slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    pub title: String,
    pub subtitle: Option<String>,
    pub bullets: Vec<String>,
    pub key_metrics: Vec<Metric>,
    pub table_data: Option<TableData>,
    pub layout_hint: LayoutHint,
    /// 1 (low) to 3 (high); used to pick slides when the deck is too long.
    pub importance: u8,
}

impl SlideContent {
    /// Create a slide with no body and the lowest importance.
    pub fn new(title: impl Into<String>, layout_hint: LayoutHint) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            bullets: Vec::new(),
            key_metrics: Vec::new(),
            table_data: None,
            layout_hint,
            importance: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide_with(content: bool, images: bool, code: bool, table: bool) -> ParsedSlide {
        let mut slide = ParsedSlide::new("S");
        if content {
            slide.content.push(ContentItem::new(ContentKind::Text, "x"));
        }
        if images {
            slide.images.push(ImageRef {
                alt: String::new(),
                src: "a.png".into(),
            });
        }
        if code {
            slide.code_blocks.push(CodeBlock {
                language: "text".into(),
                code: "x".into(),
            });
        }
        if table {
            slide.tables.push(TableData::new(vec!["a".into()], vec![]));
        }
        slide
    }

    #[test]
    fn test_layout_priority() {
        assert_eq!(slide_with(false, true, true, true).layout(), SlideLayout::ImageOnly);
        assert_eq!(slide_with(true, true, true, true).layout(), SlideLayout::ImageContent);
        assert_eq!(slide_with(true, false, true, true).layout(), SlideLayout::Code);
        assert_eq!(slide_with(true, false, false, true).layout(), SlideLayout::Table);
        assert_eq!(slide_with(true, false, false, false).layout(), SlideLayout::TitleContent);
    }

    #[test]
    fn test_untitled_section() {
        let slide = ParsedSlide::new("");
        assert_eq!(slide.title, None);
        assert!(slide.is_empty());
        assert_eq!(ParsedSlide::new("Intro").title.as_deref(), Some("Intro"));
        assert!(!ParsedSlide::new("Intro").is_empty());
    }

    #[test]
    fn test_table_drops_mismatched_rows() {
        let table = TableData::new(
            vec!["a".into(), "b".into()],
            vec![
                vec!["1".into(), "2".into()],
                vec!["3".into()],
                vec!["4".into(), "5".into(), "6".into()],
            ],
        );
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn test_layout_hint_serializes_snake_case() {
        let json = serde_json::to_string(&LayoutHint::TitleOnly).unwrap();
        assert_eq!(json, "\"title_only\"");
    }
}
