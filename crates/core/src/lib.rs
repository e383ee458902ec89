//! Core domain types, Markdown parsing, summarization, and style profiles
//! for Markdown-to-deck conversion.

pub mod error;
pub mod layout;
pub mod markdown;
pub mod normalize;
pub mod style;
pub mod summarize;
pub mod theme;
pub mod types;

pub use error::{Error, Result};
pub use layout::{LayoutMapping, LayoutResolver, LayoutRole};
pub use markdown::{AstStrategy, MarkdownParser, MarkdownStrategy, ParserKind, RegexStrategy};
pub use style::{ColorPalette, FontSettings, LayoutInfo, PlaceholderInfo, StyleProfile};
pub use summarize::{ContentSummarizer, SummarizerConfig};
pub use theme::{ColorTheme, RenderStyle, Rgb, Theme};
pub use types::{
    CodeBlock, ContentItem, ContentKind, ImageRef, LayoutHint, Metadata, Metric, ParsedDocument,
    ParsedSlide, PresentationContent, SlideContent, SlideLayout, TableData,
};
