//! Markdown strategy that folds a pulldown-cmark event stream.

use super::{clean_cell, split_cells, split_front_matter, MarkdownStrategy};
use crate::types::{
    CodeBlock, ContentItem, ContentKind, ImageRef, ParsedDocument, ParsedSlide, TableData,
};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// CommonMark parser with GFM tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct AstStrategy;

impl AstStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownStrategy for AstStrategy {
    fn parse(&self, text: &str) -> ParsedDocument {
        let (metadata, body) = split_front_matter(text);

        let mut fold = Fold::default();
        for (event, range) in Parser::new_ext(body, Options::ENABLE_TABLES).into_offset_iter() {
            fold.event(event, &body[range]);
        }

        let (title, slides) = fold.finish();
        ParsedDocument {
            title,
            slides,
            metadata,
        }
    }
}

/// Table under construction.
#[derive(Default)]
struct TableBuild {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Option<String>,
    /// Cells written in the source line of the open body row.
    source_width: usize,
    dropped: usize,
}

/// Per-call accumulator for the event fold.
#[derive(Default)]
struct Fold {
    title: Option<String>,
    slides: Vec<ParsedSlide>,
    current: ParsedSlide,
    text: String,
    /// One entry per open list: `true` when ordered.
    lists: Vec<bool>,
    quote_depth: usize,
    code: Option<(String, String)>,
    image: Option<(String, String)>,
    /// An image just closed; the next text joins with a single space.
    image_gap: bool,
    table: Option<TableBuild>,
}

impl Fold {
    /// `source` is the input slice the event was parsed from.
    fn event(&mut self, event: Event<'_>, source: &str) {
        match event {
            Event::Start(tag) => self.start(tag, source),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push_text(&format!("`{}`", code)),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_text("\n"),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>, source: &str) {
        match tag {
            Tag::Heading { .. } | Tag::Paragraph => {
                if self.lists.is_empty() && self.quote_depth == 0 {
                    self.text.clear();
                    self.image_gap = false;
                }
            }
            Tag::List(start) => {
                // text of a parent item comes before its nested list
                self.flush_item();
                self.lists.push(start.is_some());
            }
            Tag::BlockQuote => {
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                let language = if language.is_empty() { "text".to_string() } else { language };
                self.code = Some((language, String::new()));
            }
            Tag::Image { dest_url, .. } => {
                self.image = Some((dest_url.to_string(), String::new()));
            }
            Tag::Table(_) => {
                self.table = Some(TableBuild::default());
            }
            Tag::TableRow => {
                // the event stream pads or cuts rows to the header width
                if let Some(table) = self.table.as_mut() {
                    table.source_width = split_cells(source).len();
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(String::new());
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(level) => {
                let text = std::mem::take(&mut self.text).trim().to_string();
                self.heading(level, text);
            }
            TagEnd::Paragraph => {
                if self.lists.is_empty() && self.quote_depth == 0 {
                    let text = std::mem::take(&mut self.text);
                    self.push_item(ContentKind::Text, &text);
                } else if !self.text.is_empty() && !self.text.ends_with(' ') {
                    self.text.push(' ');
                }
            }
            TagEnd::Item => self.flush_item(),
            TagEnd::List(_) => {
                self.lists.pop();
            }
            TagEnd::BlockQuote => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 && self.lists.is_empty() {
                    let text = std::mem::take(&mut self.text);
                    self.push_item(ContentKind::Quote, &text);
                }
            }
            TagEnd::CodeBlock => {
                if let Some((language, code)) = self.code.take() {
                    self.current.code_blocks.push(CodeBlock {
                        language,
                        code: code.trim_matches('\n').to_string(),
                    });
                }
            }
            TagEnd::Image => {
                if let Some((src, alt)) = self.image.take() {
                    self.current.images.push(ImageRef {
                        alt: alt.trim().to_string(),
                        src,
                    });
                }
                if self.table.is_none() {
                    self.text.truncate(self.text.trim_end().len());
                    self.image_gap = true;
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    if let Some(cell) = table.cell.take() {
                        table.row.push(clean_cell(&cell));
                    }
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.headers = std::mem::take(&mut table.row);
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    if table.source_width == table.headers.len() {
                        table.rows.push(row);
                    } else {
                        table.dropped += 1;
                    }
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    if table.dropped > 0 {
                        log::debug!("Dropped {} table rows with mismatched cell counts", table.dropped);
                    }
                    if !table.headers.iter().all(|h| h.is_empty()) {
                        self.current.tables.push(TableData::new(table.headers, table.rows));
                    }
                }
            }
            _ => {}
        }
    }

    /// Route inline text to whatever is currently collecting it.
    fn push_text(&mut self, text: &str) {
        if let Some((_, code)) = self.code.as_mut() {
            code.push_str(text);
        } else if let Some((_, alt)) = self.image.as_mut() {
            alt.push_str(text);
        } else if let Some(cell) = self.table.as_mut().and_then(|t| t.cell.as_mut()) {
            cell.push_str(text);
        } else if self.image_gap {
            let text = text.trim_start();
            if text.is_empty() {
                return;
            }
            self.image_gap = false;
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(text);
        } else {
            self.text.push_str(text);
        }
    }

    fn heading(&mut self, level: HeadingLevel, text: String) {
        match level {
            HeadingLevel::H1 => {
                if self.title.is_none() && !text.is_empty() {
                    self.title = Some(text);
                }
            }
            HeadingLevel::H2 => {
                let next = ParsedSlide::new(text);
                let done = std::mem::replace(&mut self.current, next);
                self.slides.push(done);
            }
            _ => self.push_item(ContentKind::Subheading, &text),
        }
    }

    /// Emit the buffered text as an item of the innermost list.
    fn flush_item(&mut self) {
        let Some(&ordered) = self.lists.last() else {
            return;
        };
        let kind = if ordered { ContentKind::Numbered } else { ContentKind::Bullet };
        let text = std::mem::take(&mut self.text);
        self.push_item(kind, &text);
    }

    fn push_item(&mut self, kind: ContentKind, text: &str) {
        self.image_gap = false;
        let text = text.trim();
        if !text.is_empty() {
            self.current.content.push(ContentItem::new(kind, text));
        }
    }

    fn finish(mut self) -> (Option<String>, Vec<ParsedSlide>) {
        self.slides.push(self.current);
        let slides = self.slides.into_iter().filter(|s| !s.is_empty()).collect();
        (self.title, slides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlideLayout;

    fn parse(text: &str) -> ParsedDocument {
        AstStrategy::new().parse(text)
    }

    #[test]
    fn test_headings() {
        let doc = parse("# Report\n\n## A\n\n### Sub\n\ntext\n\n## B\n\n- x\n");
        assert_eq!(doc.title.as_deref(), Some("Report"));
        assert_eq!(doc.slides.len(), 2);
        assert_eq!(doc.slides[0].content[0], ContentItem::new(ContentKind::Subheading, "Sub"));
        assert_eq!(doc.slides[0].content[1], ContentItem::new(ContentKind::Text, "text"));
        assert_eq!(doc.slides[1].content[0], ContentItem::new(ContentKind::Bullet, "x"));
    }

    #[test]
    fn test_first_h1_wins() {
        let doc = parse("## A\n\nbody\n\n# Late\n\n# Later\n");
        assert_eq!(doc.title.as_deref(), Some("Late"));
    }

    #[test]
    fn test_ordered_and_nested_lists() {
        let doc = parse("## L\n\n1. one\n2. two\n\n- outer\n  - inner\n");
        let items: Vec<_> = doc.slides[0].content.iter().map(|c| (c.kind, c.text.as_str())).collect();
        assert_eq!(
            items,
            vec![
                (ContentKind::Numbered, "one"),
                (ContentKind::Numbered, "two"),
                (ContentKind::Bullet, "outer"),
                (ContentKind::Bullet, "inner"),
            ]
        );
    }

    #[test]
    fn test_quote_and_inline_code() {
        let doc = parse("## Q\n\n> wise words\n\nuse `cargo`\n");
        assert_eq!(doc.slides[0].content[0], ContentItem::new(ContentKind::Quote, "wise words"));
        assert_eq!(doc.slides[0].content[1], ContentItem::new(ContentKind::Text, "use `cargo`"));
    }

    #[test]
    fn test_code_block_language() {
        let doc = parse("## C\n\n```python\nprint(1)\n```\n\n    indented\n");
        let blocks = &doc.slides[0].code_blocks;
        assert_eq!(blocks[0].language, "python");
        assert_eq!(blocks[0].code, "print(1)");
        assert_eq!(blocks[1].language, "text");
        assert_eq!(doc.slides[0].layout(), SlideLayout::Code);
    }

    #[test]
    fn test_image_alt_not_in_text() {
        let doc = parse("## I\n\n![Diagram](img/d.png)\n");
        let slide = &doc.slides[0];
        assert!(slide.content.is_empty());
        assert_eq!(slide.images[0].alt, "Diagram");
        assert_eq!(slide.images[0].src, "img/d.png");
    }

    #[test]
    fn test_table_cells_strip_markup() {
        let doc = parse("## T\n\n| **Name** | `Cost` |\n|---|---|\n| *A* | 10 |\n");
        let table = &doc.slides[0].tables[0];
        assert_eq!(table.headers, vec!["Name", "Cost"]);
        assert_eq!(table.rows, vec![vec!["A".to_string(), "10".to_string()]]);
        for row in &table.rows {
            assert_eq!(row.len(), table.headers.len());
        }
    }

    #[test]
    fn test_rows_of_other_width_dropped() {
        let doc = parse("## T\n\n| a | b |\n|---|---|\n| 1 |\n| 1 | 2 | 3 |\n| x | y |\n");
        let table = &doc.slides[0].tables[0];
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["x".to_string(), "y".to_string()]]);
    }

    #[test]
    fn test_text_around_image_kept() {
        let doc = parse("## I\n\nSee ![chart](c.png) here\n");
        let slide = &doc.slides[0];
        assert_eq!(slide.images, vec![ImageRef { alt: "chart".into(), src: "c.png".into() }]);
        assert_eq!(slide.content, vec![ContentItem::new(ContentKind::Text, "See here")]);
    }

    #[test]
    fn test_accumulator_is_fresh_per_call() {
        let strategy = AstStrategy::new();
        let first = strategy.parse("# One\n\n## A\n\n- x\n");
        let second = strategy.parse("# One\n\n## A\n\n- x\n");
        assert_eq!(first, second);
        assert_eq!(second.slides.len(), 1);
    }
}
