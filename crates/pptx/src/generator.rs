//! Direct renderer for parsed documents.
//!
//! Unlike [`crate::designer`], this path keeps the slide layouts' own
//! placeholders and only fills in text, so a template's look carries over.

use crate::deck::{
    inches, Align, Deck, Frame, ImageFormat, Paragraph, Picture, RunFormat, Shape, Slide, Table,
    TableCell, TextBody, TextBox,
};
use crate::reader::PptxReader;
use chrono::{Local, NaiveDate};
use mdeck_core::{
    CodeBlock, ContentItem, ContentKind, Error, ImageRef, LayoutMapping, LayoutResolver, LayoutRole,
    ParsedDocument, ParsedSlide, Result, Rgb, SlideLayout, TableData,
};
use std::path::{Path, PathBuf};

const DEFAULT_FONT: &str = "맑은 고딕";
const CODE_FONT: &str = "Consolas";
const TITLE_SIZE: f64 = 44.0;
const CONTENT_SIZE: f64 = 24.0;
const BULLET_SIZE: f64 = 20.0;
const SUBHEADING_SIZE: f64 = 28.0;
const CODE_SIZE: f64 = 14.0;
const TABLE_SIZE: f64 = 14.0;
const CODE_FILL: Rgb = Rgb(240, 240, 240);
const IMAGE_WIDTH_IN: f64 = 4.0;

/// Renders a [`ParsedDocument`] slide for slide onto standard or template
/// layouts.
#[derive(Debug, Clone, Default)]
pub struct DeckGenerator {
    mapping: LayoutMapping,
    generated_on: Option<NaiveDate>,
    base_dir: Option<PathBuf>,
}

impl DeckGenerator {
    pub fn new(mapping: LayoutMapping) -> Self {
        Self {
            mapping,
            generated_on: None,
            base_dir: None,
        }
    }

    /// Date shown on the title slide. Today when unset.
    pub fn with_generated_on(mut self, date: NaiveDate) -> Self {
        self.generated_on = Some(date);
        self
    }

    /// Directory that relative image paths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Build the deck, reusing the layouts and slide size of `template` when
    /// given.
    pub fn generate(&self, document: &ParsedDocument, template: Option<&Path>) -> Result<Deck> {
        let mut deck = match template {
            Some(path) => load_template(path)?,
            None => Deck::new(),
        };
        let date = self.generated_on.unwrap_or_else(|| Local::now().date_naive());
        deck.properties.title = document.title.clone().unwrap_or_default();
        deck.properties.created = Some(format!("{}T00:00:00Z", date.format("%Y-%m-%d")));

        let resolver = LayoutResolver::new(&self.mapping, deck.layout_names());
        let layouts = ResolvedLayouts {
            title: resolver.resolve(LayoutRole::Title)?,
            title_content: resolver.resolve(LayoutRole::TitleContent)?,
            two_content: resolver.resolve(LayoutRole::TwoContent)?,
            title_only: resolver.resolve(LayoutRole::TitleOnly)?,
            blank: resolver.resolve(LayoutRole::Blank)?,
        };

        if let Some(title) = document.title.as_deref().filter(|t| !t.is_empty()) {
            let slide = deck.add_slide(layouts.title);
            set_title(slide, title);
            if let Some(subtitle) = slide.placeholder_mut(1) {
                subtitle.body = Some(TextBody::single(Paragraph::new(
                    date.format("%Y년 %m월 %d일").to_string(),
                    RunFormat::new(),
                )));
            }
        }

        for parsed in &document.slides {
            let layout = layouts.for_slide(parsed.layout());
            let slide = deck.add_slide(layout);
            if let Some(title) = parsed.title.as_deref() {
                set_title(slide, title);
            }
            self.fill_slide(slide, parsed);
        }

        log::debug!(
            "Generated {} slides from {} sections",
            deck.slides.len(),
            document.slides.len()
        );
        Ok(deck)
    }

    fn fill_slide(&self, slide: &mut Slide, parsed: &ParsedSlide) {
        if !parsed.content.is_empty() {
            add_content(slide, &parsed.content);
        }
        for image in &parsed.images {
            if let Some(picture) = self.load_image(image) {
                slide.add(Shape::Picture(picture));
            }
        }
        for block in &parsed.code_blocks {
            add_code_block(slide, block);
        }
        if parsed.layout() == SlideLayout::Table {
            for table in &parsed.tables {
                add_table(slide, table);
            }
        }
    }

    /// Read a local PNG, JPEG, or GIF. Anything else is skipped with a warning.
    fn load_image(&self, image: &ImageRef) -> Option<Picture> {
        let path = Path::new(&image.src);
        let path = match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        };
        if !path.is_file() {
            log::debug!("Skipping image '{}': not a local file", image.src);
            return None;
        }

        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Failed to read image {}: {}", path.display(), e);
                return None;
            }
        };
        let Some(format) = ImageFormat::detect(&data) else {
            log::warn!("Skipping image {}: unsupported format", path.display());
            return None;
        };

        let height = match format.dimensions(&data) {
            Some((w, h)) if w > 0 => IMAGE_WIDTH_IN * h as f64 / w as f64,
            _ => IMAGE_WIDTH_IN * 0.75,
        };
        Some(Picture {
            frame: Frame::inches(5.0, 2.0, IMAGE_WIDTH_IN, height),
            description: image.alt.clone(),
            data,
            format,
        })
    }
}

/// Layout indices for each role the generator uses.
struct ResolvedLayouts {
    title: usize,
    title_content: usize,
    two_content: usize,
    title_only: usize,
    blank: usize,
}

impl ResolvedLayouts {
    fn for_slide(&self, layout: SlideLayout) -> usize {
        match layout {
            SlideLayout::ImageOnly => self.blank,
            SlideLayout::ImageContent => self.two_content,
            SlideLayout::Code | SlideLayout::TitleContent => self.title_content,
            SlideLayout::Table => self.title_only,
        }
    }
}

fn load_template(path: &Path) -> Result<Deck> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let package = PptxReader::new()
        .open(path)
        .map_err(|e| Error::analysis(path, e))?;
    let layouts = package.layout_defs();
    log::info!("Using {} layouts from template {}", layouts.len(), path.display());
    Ok(Deck::with_layouts(package.width, package.height, layouts))
}

fn set_title(slide: &mut Slide, title: &str) {
    if let Some(placeholder) = slide.title_placeholder_mut() {
        let format = RunFormat::new().font(DEFAULT_FONT).size(TITLE_SIZE).bold();
        placeholder.body = Some(TextBody::single(Paragraph::new(title, format)));
    }
}

fn item_paragraph(item: &ContentItem) -> Paragraph {
    let format = RunFormat::new().font(DEFAULT_FONT);
    let format = match item.kind {
        ContentKind::Bullet | ContentKind::Numbered => format.size(BULLET_SIZE),
        ContentKind::Subheading => format.size(SUBHEADING_SIZE).bold(),
        ContentKind::Quote => format.size(CONTENT_SIZE).italic(),
        ContentKind::Text => format.size(CONTENT_SIZE),
    };
    Paragraph::new(item.text.as_str(), format)
}

/// Put the items in the body placeholder, or a text box when there is none.
fn add_content(slide: &mut Slide, content: &[ContentItem]) {
    let body = TextBody::new(content.iter().map(item_paragraph).collect());
    match slide.placeholder_mut(1) {
        Some(placeholder) => placeholder.body = Some(body),
        None => {
            slide.add_text_box(Frame::inches(0.5, 1.5, 9.0, 5.0), body);
        }
    }
}

fn add_code_block(slide: &mut Slide, block: &CodeBlock) {
    let format = RunFormat::new().font(CODE_FONT).size(CODE_SIZE);
    slide.add(Shape::TextBox(TextBox {
        frame: Frame::inches(0.5, 2.0, 9.0, 4.0),
        fill: Some(CODE_FILL),
        body: TextBody::single(Paragraph::new(block.code.as_str(), format)),
    }));
}

fn add_table(slide: &mut Slide, table: &TableData) {
    let columns = table.width();
    if columns == 0 {
        return;
    }
    let (width, row_height) = (9.0, 0.4);
    let cell = |text: &str, bold: bool| {
        let format = RunFormat::new().font(DEFAULT_FONT).size(TABLE_SIZE);
        TableCell {
            text: text.to_string(),
            format: if bold { format.bold() } else { format },
            align: Some(Align::Left),
            fill: None,
        }
    };

    let mut rows = vec![table.headers.iter().map(|h| cell(h, true)).collect::<Vec<_>>()];
    rows.extend(table.rows.iter().map(|row| row.iter().map(|t| cell(t, false)).collect()));
    let height = row_height * rows.len() as f64;

    slide.add(Shape::Table(Table {
        frame: Frame::inches(0.5, 1.5, width, height),
        column_widths: vec![inches(width / columns as f64); columns],
        row_height: inches(row_height),
        rows,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{LayoutDef, PlaceholderDef, PlaceholderKind};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn generator() -> DeckGenerator {
        DeckGenerator::new(LayoutMapping::default()).with_generated_on(date())
    }

    fn document() -> ParsedDocument {
        let mut intro = ParsedSlide::new("소개");
        intro.content = vec![
            ContentItem::new(ContentKind::Subheading, "배경"),
            ContentItem::new(ContentKind::Bullet, "첫째"),
            ContentItem::new(ContentKind::Quote, "인용"),
        ];
        let mut code = ParsedSlide::new("코드");
        code.code_blocks = vec![CodeBlock {
            language: "rust".to_string(),
            code: "fn main() {}".to_string(),
        }];
        let mut table = ParsedSlide::new("표");
        table.tables = vec![TableData::new(
            vec!["A".to_string(), "B".to_string()],
            vec![vec!["1".to_string(), "2".to_string()]],
        )];

        ParsedDocument {
            title: Some("보고서".to_string()),
            slides: vec![intro, code, table],
            metadata: Default::default(),
        }
    }

    fn body_of(slide: &Slide, idx: u32) -> Option<&TextBody> {
        slide.shapes.iter().find_map(|s| match s {
            Shape::Placeholder(ph) if ph.idx == idx => ph.body.as_ref(),
            _ => None,
        })
    }

    #[test]
    fn test_title_slide() {
        let deck = generator().generate(&document(), None).unwrap();
        assert_eq!(deck.slides.len(), 4);
        let title = &deck.slides[0];
        assert_eq!(title.layout, 0);
        assert_eq!(title.texts(), vec!["보고서", "2024년 03월 05일"]);

        let format = &body_of(title, 0).unwrap().paragraphs[0].format;
        assert_eq!(format.size, Some(44.0));
        assert!(format.bold);
        assert_eq!(format.font.as_deref(), Some("맑은 고딕"));
    }

    #[test]
    fn test_no_title_slide_without_title() {
        let mut doc = document();
        doc.title = None;
        let deck = generator().generate(&doc, None).unwrap();
        assert_eq!(deck.slides.len(), 3);
        assert_eq!(deck.slides[0].layout, 1);
    }

    #[test]
    fn test_content_formatting() {
        let deck = generator().generate(&document(), None).unwrap();
        let body = body_of(&deck.slides[1], 1).unwrap();
        let sizes: Vec<_> = body.paragraphs.iter().map(|p| p.format.size).collect();
        assert_eq!(sizes, vec![Some(28.0), Some(20.0), Some(24.0)]);
        assert!(body.paragraphs[0].format.bold);
        assert!(body.paragraphs[2].format.italic);
    }

    #[test]
    fn test_code_and_table_slides() {
        let deck = generator().generate(&document(), None).unwrap();

        let code = &deck.slides[2];
        assert_eq!(code.layout, 1);
        let code_box = code.shapes.iter().find_map(|s| match s {
            Shape::TextBox(t) => Some(t),
            _ => None,
        });
        let code_box = code_box.unwrap();
        assert_eq!(code_box.fill, Some(CODE_FILL));
        assert_eq!(code_box.body.paragraphs[0].format.font.as_deref(), Some("Consolas"));

        let table = &deck.slides[3];
        assert_eq!(table.layout, 5);
        assert_eq!(table.texts(), vec!["표", "A", "B", "1", "2"]);
    }

    #[test]
    fn test_fallback_text_box_without_body_placeholder() {
        let mut slide = ParsedSlide::new("");
        slide.content = vec![ContentItem::new(ContentKind::Text, "본문")];
        slide.images = vec![ImageRef {
            alt: "missing".to_string(),
            src: "no/such/image.png".to_string(),
        }];
        let doc = ParsedDocument {
            title: None,
            slides: vec![slide],
            metadata: Default::default(),
        };
        // image with content maps to Two Content, which has a body placeholder
        let deck = generator().generate(&doc, None).unwrap();
        assert_eq!(deck.slides[0].layout, 3);
        assert_eq!(deck.slides[0].texts(), vec!["본문"]);

        let blank_only = Deck::with_layouts(
            inches(10.0),
            inches(7.5),
            vec![LayoutDef::new("Only", "", vec![PlaceholderDef {
                kind: PlaceholderKind::Title,
                idx: 0,
                frame: Frame::inches(0.5, 0.5, 9.0, 1.0),
            }])],
        );
        let mut deck = blank_only;
        let slide = deck.add_slide(0);
        add_content(slide, &doc.slides[0].content);
        assert!(matches!(slide.shapes.last(), Some(Shape::TextBox(_))));
    }

    #[test]
    fn test_local_image_embedded() {
        let dir = tempfile::tempdir().unwrap();
        // PNG header of a 2x1 image
        let png: &[u8] = &[
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
            0x52, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
            0x15, 0xC4, 0x89,
        ];
        std::fs::write(dir.path().join("chart.png"), png).unwrap();

        let mut slide = ParsedSlide::new("차트");
        slide.images = vec![ImageRef {
            alt: "chart".to_string(),
            src: "chart.png".to_string(),
        }];
        let doc = ParsedDocument {
            title: None,
            slides: vec![slide],
            metadata: Default::default(),
        };

        let deck = generator()
            .with_base_dir(dir.path())
            .generate(&doc, None)
            .unwrap();
        assert_eq!(deck.slides[0].layout, 6);
        let picture = deck.slides[0].shapes.iter().find_map(|s| match s {
            Shape::Picture(p) => Some(p),
            _ => None,
        });
        let picture = picture.unwrap();
        assert_eq!(picture.format, ImageFormat::Png);
        assert_eq!(picture.frame.cx, inches(4.0));
        assert_eq!(picture.frame.cy, inches(2.0));
    }

    #[test]
    fn test_template_layouts_reused() {
        let dir = tempfile::tempdir().unwrap();
        let mut template = Deck::with_layouts(
            inches(10.0),
            inches(5.625),
            vec![
                LayoutDef::new("표지", "title", vec![
                    PlaceholderDef {
                        kind: PlaceholderKind::CenterTitle,
                        idx: 0,
                        frame: Frame::inches(1.0, 1.0, 8.0, 1.5),
                    },
                    PlaceholderDef {
                        kind: PlaceholderKind::Subtitle,
                        idx: 1,
                        frame: Frame::inches(1.0, 3.0, 8.0, 1.0),
                    },
                ]),
                LayoutDef::new("제목 및 내용", "obj", vec![
                    PlaceholderDef {
                        kind: PlaceholderKind::Title,
                        idx: 0,
                        frame: Frame::inches(0.5, 0.3, 9.0, 1.0),
                    },
                    PlaceholderDef {
                        kind: PlaceholderKind::Object,
                        idx: 1,
                        frame: Frame::inches(0.5, 1.5, 9.0, 3.5),
                    },
                ]),
            ],
        );
        template.add_slide(0);
        let path = dir.path().join("template.pptx");
        template.save(&path).unwrap();

        let mut doc = document();
        doc.slides.truncate(1);
        let deck = generator().generate(&doc, Some(&path)).unwrap();
        assert_eq!(deck.width, inches(10.0));
        assert_eq!(deck.layout_names(), vec!["표지", "제목 및 내용"]);
        assert_eq!(deck.slides[0].layout, 0);
        assert_eq!(deck.slides[1].layout, 1);
        assert_eq!(deck.slides[1].texts()[0], "소개");
    }

    #[test]
    fn test_missing_template() {
        let err = generator()
            .generate(&document(), Some(Path::new("/nonexistent/template.pptx")))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
