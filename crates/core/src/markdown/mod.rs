//! Markdown structure parsing.
//!
//! Turns a Markdown document into a [`ParsedDocument`]: the first `#`
//! heading becomes the title, every `##` heading starts a slide, and the
//! lines beneath are classified into content items, images, code blocks,
//! and tables.
//!
//! Two interchangeable strategies are provided. [`RegexStrategy`] scans
//! lines with regular expressions; [`AstStrategy`] folds a pulldown-cmark
//! event stream. Both share front-matter handling and table building.

mod ast;
mod line;

pub use ast::AstStrategy;
pub use line::RegexStrategy;

use crate::error::{Error, Result};
use crate::normalize::{normalize_nfc, strip_inline_markup};
use crate::types::{Metadata, ParsedDocument, TableData};
use serde::{Deserialize, Serialize};

/// Marker that opens and closes a front-matter block.
const FRONT_MATTER_MARKER: &str = "---";

/// A way of turning Markdown text into a [`ParsedDocument`].
///
/// Implementations keep no state between calls.
pub trait MarkdownStrategy: Send + Sync {
    /// Parse a whole document.
    fn parse(&self, text: &str) -> ParsedDocument;

    /// Read only the front-matter key/value pairs.
    fn extract_metadata(&self, text: &str) -> Metadata {
        split_front_matter(text).0
    }
}

/// Which parsing strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    #[default]
    Regex,
    Ast,
}

impl std::str::FromStr for ParserKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "regex" | "line" => Ok(Self::Regex),
            "ast" | "cmark" => Ok(Self::Ast),
            other => Err(format!("unknown parser '{}' (expected regex or ast)", other)),
        }
    }
}

/// Markdown parser that dispatches to the selected strategy.
pub struct MarkdownParser {
    strategy: Box<dyn MarkdownStrategy>,
}

impl MarkdownParser {
    /// Create a parser using the given strategy.
    pub fn new(kind: ParserKind) -> Self {
        let strategy: Box<dyn MarkdownStrategy> = match kind {
            ParserKind::Regex => Box::new(RegexStrategy::new()),
            ParserKind::Ast => Box::new(AstStrategy::new()),
        };
        Self { strategy }
    }

    /// Parse Markdown text.
    pub fn parse(&self, text: &str) -> ParsedDocument {
        let text = prepare(text);
        let doc = self.strategy.parse(&text);
        log::debug!(
            "Parsed document {:?}: {} slides, {} metadata keys",
            doc.title,
            doc.slides.len(),
            doc.metadata.len()
        );
        doc
    }

    /// Decode UTF-8 bytes and parse them.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedDocument> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::Decode(e.to_string()))?;
        Ok(self.parse(text))
    }

    /// Read only the front-matter key/value pairs.
    pub fn extract_metadata(&self, text: &str) -> Metadata {
        self.strategy.extract_metadata(&prepare(text))
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new(ParserKind::default())
    }
}

/// NFC-normalize and unify line endings.
fn prepare(text: &str) -> String {
    normalize_nfc(text).replace("\r\n", "\n")
}

/// Split a leading `---` block off the document.
///
/// Returns the metadata and the remaining body. Without a closing marker
/// the text is returned unchanged and the metadata is empty.
pub(crate) fn split_front_matter(text: &str) -> (Metadata, &str) {
    let mut metadata = Metadata::new();
    if !text.starts_with(FRONT_MATTER_MARKER) {
        return (metadata, text);
    }

    let start = FRONT_MATTER_MARKER.len();
    let Some(end) = text[start..].find(FRONT_MATTER_MARKER).map(|pos| start + pos) else {
        return (metadata, text);
    };

    for line in text[start..end].lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                metadata.insert(key.to_string(), value.trim().to_string());
            }
        }
    }

    let body = text[end + FRONT_MATTER_MARKER.len()..].trim();
    (metadata, body)
}

/// Whether a trimmed line looks like a pipe-table row.
pub(crate) fn is_table_row(line: &str) -> bool {
    line.len() >= 2 && line.starts_with('|') && line.ends_with('|')
}

/// Whether a table row is the `|---|:--:|` alignment row.
pub(crate) fn is_separator_row(line: &str) -> bool {
    line.contains('-') && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

/// Split a pipe-table row into cleaned cells.
pub(crate) fn split_cells(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(clean_cell).collect()
}

/// Trim a table cell and strip inline emphasis markers.
pub(crate) fn clean_cell(cell: &str) -> String {
    strip_inline_markup(cell.trim()).trim().to_string()
}

/// Build a table from buffered pipe rows.
///
/// The first non-separator row is the header; rows of a different width
/// are dropped.
pub(crate) fn table_from_rows<S: AsRef<str>>(rows: &[S]) -> Option<TableData> {
    let mut parsed = rows
        .iter()
        .map(|r| r.as_ref().trim())
        .filter(|r| !is_separator_row(r))
        .map(split_cells);

    let headers = parsed.next()?;
    if headers.iter().all(|h| h.is_empty()) {
        return None;
    }
    let body: Vec<Vec<String>> = parsed.collect();
    let dropped = body.iter().filter(|r| r.len() != headers.len()).count();
    if dropped > 0 {
        log::debug!("Dropped {} table rows with mismatched cell counts", dropped);
    }
    Some(TableData::new(headers, body))
}
