//! Line-oriented Markdown strategy built on regular expressions.

use super::{is_table_row, split_front_matter, table_from_rows, MarkdownStrategy};
use crate::normalize::strip_emphasis;
use crate::types::{CodeBlock, ContentItem, ContentKind, ImageRef, ParsedDocument, ParsedSlide};
use regex::Regex;
use std::sync::LazyLock;

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").unwrap());

static SECTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##[ \t]+(.+)$").unwrap());

static CODE_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(\w*)\n(.*?)```").unwrap());

static IMAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());

static BULLET_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*][ \t]+(.+)$").unwrap());

static NUMBERED_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.[ \t]+(.+)$").unwrap());

/// `###` through `######`.
static SUBHEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{3,6}[ \t]+(.+)$").unwrap());

static QUOTE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>[ \t]?(.*)$").unwrap());

/// A list, quote, or heading marker with nothing after it.
static BARE_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+]|\d+\.|>+|#{1,6})$").unwrap());

static THEMATIC_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap());

/// Regex-driven line classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexStrategy;

impl RegexStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Split the body into `(title, section text)` pairs.
    ///
    /// Text before the first `##` heading becomes an untitled section.
    fn split_sections(body: &str) -> Vec<(String, &str)> {
        let headings: Vec<_> = SECTION_REGEX.captures_iter(body).collect();
        if headings.is_empty() {
            return vec![(String::new(), body)];
        }

        let mut sections = Vec::with_capacity(headings.len() + 1);
        if let Some(first) = headings[0].get(0) {
            sections.push((String::new(), &body[..first.start()]));
        }

        for (i, caps) in headings.iter().enumerate() {
            let (Some(whole), Some(title)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let end = headings
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(body.len());
            sections.push((strip_emphasis(title.as_str().trim()), &body[whole.end()..end]));
        }
        sections
    }

    fn parse_section(title: String, text: &str) -> ParsedSlide {
        let mut slide = ParsedSlide::new(title);

        for caps in CODE_BLOCK_REGEX.captures_iter(text) {
            let language = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let code = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            slide.code_blocks.push(CodeBlock {
                language: if language.is_empty() { "text".to_string() } else { language.to_string() },
                code: code.trim_matches('\n').to_string(),
            });
        }

        let mut table_rows: Vec<&str> = Vec::new();
        let mut in_fence = false;

        for raw in text.lines() {
            let line = raw.trim();

            if line.starts_with("```") {
                flush_table(&mut table_rows, &mut slide);
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }

            if is_table_row(line) {
                table_rows.push(line);
                continue;
            }
            flush_table(&mut table_rows, &mut slide);

            if line.is_empty() || TITLE_REGEX.is_match(line) {
                continue;
            }

            if IMAGE_REGEX.is_match(line) {
                for caps in IMAGE_REGEX.captures_iter(line) {
                    slide.images.push(ImageRef {
                        alt: caps[1].trim().to_string(),
                        src: caps[2].trim().to_string(),
                    });
                }
                // text around the images stays content
                let rest = IMAGE_REGEX.replace_all(line, " ");
                let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");
                if !rest.is_empty() && !BARE_MARKER_REGEX.is_match(&rest) {
                    if let Some(item) = classify_line(&rest) {
                        slide.content.push(item);
                    }
                }
                continue;
            }

            if THEMATIC_BREAK_REGEX.is_match(line) {
                continue;
            }

            if let Some(item) = classify_line(line) {
                slide.content.push(item);
            }
        }
        flush_table(&mut table_rows, &mut slide);

        slide
    }
}

impl MarkdownStrategy for RegexStrategy {
    fn parse(&self, text: &str) -> ParsedDocument {
        let (metadata, body) = split_front_matter(text);

        let title = TITLE_REGEX
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| strip_emphasis(m.as_str().trim()));

        let slides = Self::split_sections(body)
            .into_iter()
            .map(|(title, text)| Self::parse_section(title, text))
            .filter(|slide| !slide.is_empty())
            .collect();

        ParsedDocument {
            title,
            slides,
            metadata,
        }
    }
}

/// Classify a non-empty, non-table, non-image line.
fn classify_line(line: &str) -> Option<ContentItem> {
    let capture = |re: &Regex| {
        re.captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| strip_emphasis(m.as_str().trim()))
    };

    if let Some(text) = capture(&BULLET_REGEX) {
        return Some(ContentItem::new(ContentKind::Bullet, text));
    }
    if let Some(text) = capture(&NUMBERED_REGEX) {
        return Some(ContentItem::new(ContentKind::Numbered, text));
    }
    if let Some(text) = capture(&SUBHEADING_REGEX) {
        return Some(ContentItem::new(ContentKind::Subheading, text));
    }
    if let Some(text) = capture(&QUOTE_REGEX) {
        return (!text.is_empty()).then(|| ContentItem::new(ContentKind::Quote, text));
    }
    Some(ContentItem::new(ContentKind::Text, strip_emphasis(line)))
}

fn flush_table(rows: &mut Vec<&str>, slide: &mut ParsedSlide) {
    if rows.is_empty() {
        return;
    }
    if let Some(table) = table_from_rows(rows) {
        slide.tables.push(table);
    }
    rows.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlideLayout;

    fn parse(text: &str) -> ParsedDocument {
        RegexStrategy::new().parse(text)
    }

    #[test]
    fn test_title_and_sections() {
        let doc = parse("# Report\n\n## Budget\n\n- a\n- b\n\n## Plan\n\n1. first\n2. second\n");
        assert_eq!(doc.title.as_deref(), Some("Report"));
        assert_eq!(doc.slides.len(), 2);
        assert_eq!(doc.slides[0].title.as_deref(), Some("Budget"));
        assert_eq!(
            doc.slides[0].content,
            vec![
                ContentItem::new(ContentKind::Bullet, "a"),
                ContentItem::new(ContentKind::Bullet, "b"),
            ]
        );
        assert_eq!(doc.slides[1].content[1], ContentItem::new(ContentKind::Numbered, "second"));
    }

    #[test]
    fn test_title_found_anywhere() {
        let doc = parse("intro text\n\n## First\n\nbody\n\n# Late Title\n");
        assert_eq!(doc.title.as_deref(), Some("Late Title"));
        // the H1 line itself is not a content item
        let last = doc.slides.last().unwrap();
        assert!(last.content.iter().all(|c| c.text != "Late Title"));
    }

    #[test]
    fn test_no_sections_gives_single_slide() {
        let doc = parse("# Only\n\nsome text\n- bullet\n");
        assert_eq!(doc.slides.len(), 1);
        assert_eq!(doc.slides[0].title, None);
        assert_eq!(doc.slides[0].content.len(), 2);
    }

    #[test]
    fn test_preamble_kept_as_untitled_section() {
        let doc = parse("# T\n\nintro\n\n## A\n\nbody\n");
        assert_eq!(doc.slides.len(), 2);
        assert_eq!(doc.slides[0].title, None);
        assert_eq!(doc.slides[0].content[0].text, "intro");
    }

    #[test]
    fn test_empty_preamble_dropped() {
        let doc = parse("# T\n\n## A\n\nbody\n");
        assert_eq!(doc.slides.len(), 1);
        assert_eq!(doc.slides[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn test_budget_table() {
        let doc = parse("# Report\n## Budget\n| Item | Cost |\n|---|---|\n| A | 10 |\n| B | 20 |\n");
        let slide = &doc.slides[0];
        assert_eq!(slide.tables.len(), 1);
        assert_eq!(slide.tables[0].headers, vec!["Item", "Cost"]);
        assert_eq!(slide.tables[0].rows.len(), 2);
        assert!(slide.content.is_empty());
        assert_eq!(slide.layout(), SlideLayout::Table);
    }

    #[test]
    fn test_table_rows_match_header_width() {
        let doc = parse("## T\n| a | b | c |\n|---|---|---|\n| 1 | 2 |\n| 1 | 2 | 3 |\n| 1 | 2 | 3 | 4 |\n");
        for table in &doc.slides[0].tables {
            for row in &table.rows {
                assert_eq!(row.len(), table.headers.len());
            }
        }
        assert_eq!(doc.slides[0].tables[0].rows.len(), 1);
    }

    #[test]
    fn test_blank_line_splits_tables() {
        let doc = parse("## T\n| a |\n|---|\n| 1 |\n\n| b |\n|---|\n| 2 |\n");
        assert_eq!(doc.slides[0].tables.len(), 2);
    }

    #[test]
    fn test_code_blocks() {
        let doc = parse("## Code\n\n```rust\nfn main() {}\n```\n\n```\n- not a bullet\n```\n");
        let slide = &doc.slides[0];
        assert_eq!(slide.code_blocks.len(), 2);
        assert_eq!(slide.code_blocks[0].language, "rust");
        assert_eq!(slide.code_blocks[0].code, "fn main() {}");
        assert_eq!(slide.code_blocks[1].language, "text");
        assert!(slide.content.is_empty());
        assert_eq!(slide.layout(), SlideLayout::Code);
    }

    #[test]
    fn test_images() {
        let doc = parse("## Pics\n\n![Chart](chart.png)\n");
        let slide = &doc.slides[0];
        assert_eq!(slide.images, vec![ImageRef { alt: "Chart".into(), src: "chart.png".into() }]);
        assert_eq!(slide.layout(), SlideLayout::ImageOnly);
    }

    #[test]
    fn test_subheading_quote_and_rule() {
        let doc = parse("## S\n\n### Detail\n\n> quoted\n\n---\n\ntext\n");
        let kinds: Vec<_> = doc.slides[0].content.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ContentKind::Subheading, ContentKind::Quote, ContentKind::Text]);
    }

    #[test]
    fn test_emphasis_stripped_code_spans_kept() {
        let doc = parse("## S\n- **bold** item with `code`\n*lean* text\n");
        assert_eq!(doc.slides[0].content[0].text, "bold item with `code`");
        assert_eq!(doc.slides[0].content[1], ContentItem::new(ContentKind::Text, "lean text"));
    }

    #[test]
    fn test_image_inside_text_line() {
        let doc = parse("## Pics\n\nSee ![chart](c.png) here\n- ![a](a.png) and ![b](b.png)\n- ![solo](s.png)\n");
        let slide = &doc.slides[0];
        let srcs: Vec<_> = slide.images.iter().map(|i| i.src.as_str()).collect();
        assert_eq!(srcs, vec!["c.png", "a.png", "b.png", "s.png"]);
        assert_eq!(slide.images[0].alt, "chart");
        assert_eq!(
            slide.content,
            vec![
                ContentItem::new(ContentKind::Text, "See here"),
                ContentItem::new(ContentKind::Bullet, "and"),
            ]
        );
    }

    #[test]
    fn test_empty_document() {
        let doc = parse("");
        assert!(doc.title.is_none());
        assert!(doc.slides.is_empty());
    }
}
