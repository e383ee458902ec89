//! In-memory slide deck model.
//!
//! Renderers build a [`Deck`] of slides and shapes; the writer turns it into
//! an OOXML package. Positions and sizes are stored in EMUs
//! (914400 per inch).

use mdeck_core::Rgb;

/// English Metric Units per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Convert inches to EMUs.
pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH).round() as i64
}

/// Convert EMUs to inches.
pub fn emu_to_inches(emu: i64) -> f64 {
    emu as f64 / EMU_PER_INCH
}

/// Position and size of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }

    /// Build a frame from inch values.
    pub fn inches(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(inches(x), inches(y), inches(width), inches(height))
    }

    fn scaled(self, sx: f64, sy: f64) -> Self {
        let scale = |v: i64, s: f64| (v as f64 * s).round() as i64;
        Self::new(scale(self.x, sx), scale(self.y, sy), scale(self.cx, sx), scale(self.cy, sy))
    }
}

/// Preset outline of an auto shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Rect,
    RoundRect,
    Ellipse,
}

impl Geometry {
    pub fn preset(self) -> &'static str {
        match self {
            Geometry::Rect => "rect",
            Geometry::RoundRect => "roundRect",
            Geometry::Ellipse => "ellipse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical placement of text inside its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Outline of an auto shape.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Line {
    #[default]
    None,
    Solid { color: Rgb, width_pt: f64 },
}

/// Character formatting for a paragraph's text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunFormat {
    pub font: Option<String>,
    /// Points.
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Rgb>,
}

impl RunFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn size(mut self, points: f64) -> Self {
        self.size = Some(points);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }
}

/// A paragraph with a single run of text. `\n` inside the text becomes a
/// line break within the paragraph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub text: String,
    pub format: RunFormat,
    pub align: Option<Align>,
    /// Multiple of single spacing, e.g. `1.2`.
    pub line_spacing: Option<f64>,
    pub level: u32,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, format: RunFormat) -> Self {
        Self {
            text: text.into(),
            format,
            ..Default::default()
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn line_spacing(mut self, spacing: f64) -> Self {
        self.line_spacing = Some(spacing);
        self
    }
}

/// Text content of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBody {
    pub paragraphs: Vec<Paragraph>,
    pub word_wrap: bool,
    pub anchor: Anchor,
}

impl TextBody {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            word_wrap: true,
            anchor: Anchor::Top,
        }
    }

    /// A body holding one paragraph.
    pub fn single(paragraph: Paragraph) -> Self {
        Self::new(vec![paragraph])
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn no_wrap(mut self) -> Self {
        self.word_wrap = false;
        self
    }

    /// All paragraph text joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A preset shape with optional fill, outline, and text.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoShape {
    pub geometry: Geometry,
    pub frame: Frame,
    pub fill: Option<Rgb>,
    pub line: Line,
    pub text: Option<TextBody>,
}

/// A text box, optionally filled.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub frame: Frame,
    pub fill: Option<Rgb>,
    pub body: TextBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub text: String,
    pub format: RunFormat,
    pub align: Option<Align>,
    pub fill: Option<Rgb>,
}

/// A grid of cells. Every row has one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub frame: Frame,
    pub column_widths: Vec<i64>,
    pub row_height: i64,
    pub rows: Vec<Vec<TableCell>>,
}

/// Supported embedded image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif];

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Detect the format from magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"GIF8") {
            Some(ImageFormat::Gif)
        } else {
            None
        }
    }

    /// Pixel size from the image header, when it can be read cheaply.
    pub fn dimensions(self, bytes: &[u8]) -> Option<(u32, u32)> {
        match self {
            ImageFormat::Png => {
                let w = bytes.get(16..20)?;
                let h = bytes.get(20..24)?;
                Some((
                    u32::from_be_bytes([w[0], w[1], w[2], w[3]]),
                    u32::from_be_bytes([h[0], h[1], h[2], h[3]]),
                ))
            }
            ImageFormat::Gif => {
                let d = bytes.get(6..10)?;
                Some((u16::from_le_bytes([d[0], d[1]]) as u32, u16::from_le_bytes([d[2], d[3]]) as u32))
            }
            ImageFormat::Jpeg => jpeg_dimensions(bytes),
        }
    }
}

/// Walk JPEG segments up to the first start-of-frame marker.
fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    while pos + 9 < bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            let h = u16::from_be_bytes([bytes[pos + 5], bytes[pos + 6]]) as u32;
            let w = u16::from_be_bytes([bytes[pos + 7], bytes[pos + 8]]) as u32;
            return Some((w, h));
        }
        pos += 2 + len;
    }
    None
}

/// An embedded image.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub frame: Frame,
    pub description: String,
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

/// Role of a layout or slide placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    Title,
    CenterTitle,
    Subtitle,
    Body,
    Object,
    Picture,
    Date,
    Footer,
    SlideNumber,
}

impl PlaceholderKind {
    /// Value of `p:ph/@type`; `None` for the implicit object type.
    pub fn xml_type(self) -> Option<&'static str> {
        match self {
            PlaceholderKind::Title => Some("title"),
            PlaceholderKind::CenterTitle => Some("ctrTitle"),
            PlaceholderKind::Subtitle => Some("subTitle"),
            PlaceholderKind::Body => Some("body"),
            PlaceholderKind::Object => None,
            PlaceholderKind::Picture => Some("pic"),
            PlaceholderKind::Date => Some("dt"),
            PlaceholderKind::Footer => Some("ftr"),
            PlaceholderKind::SlideNumber => Some("sldNum"),
        }
    }

    /// Parse `p:ph/@type`. Unknown types are treated as body text.
    pub fn from_xml_type(value: Option<&str>) -> Self {
        match value {
            None | Some("obj") => PlaceholderKind::Object,
            Some("title") => PlaceholderKind::Title,
            Some("ctrTitle") => PlaceholderKind::CenterTitle,
            Some("subTitle") => PlaceholderKind::Subtitle,
            Some("pic") => PlaceholderKind::Picture,
            Some("dt") => PlaceholderKind::Date,
            Some("ftr") => PlaceholderKind::Footer,
            Some("sldNum") => PlaceholderKind::SlideNumber,
            Some(_) => PlaceholderKind::Body,
        }
    }

    /// Upper-case label used in style profiles.
    pub fn label(self) -> &'static str {
        match self {
            PlaceholderKind::Title => "TITLE",
            PlaceholderKind::CenterTitle => "CENTER_TITLE",
            PlaceholderKind::Subtitle => "SUBTITLE",
            PlaceholderKind::Body => "BODY",
            PlaceholderKind::Object => "OBJECT",
            PlaceholderKind::Picture => "PICTURE",
            PlaceholderKind::Date => "DATE",
            PlaceholderKind::Footer => "FOOTER",
            PlaceholderKind::SlideNumber => "SLIDE_NUMBER",
        }
    }

    pub fn is_title(self) -> bool {
        matches!(self, PlaceholderKind::Title | PlaceholderKind::CenterTitle)
    }

    /// Placeholders copied onto new slides; footers stay on the layout.
    fn is_inherited(self) -> bool {
        !matches!(
            self,
            PlaceholderKind::Date | PlaceholderKind::Footer | PlaceholderKind::SlideNumber
        )
    }
}

/// A placeholder on a slide, filled with text or left empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub idx: u32,
    pub body: Option<TextBody>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Auto(AutoShape),
    TextBox(TextBox),
    Table(Table),
    Picture(Picture),
    Placeholder(Placeholder),
}

/// Placeholder declared by a layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderDef {
    pub kind: PlaceholderKind,
    pub idx: u32,
    pub frame: Frame,
}

/// A slide layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDef {
    pub name: String,
    /// Value of `p:sldLayout/@type`, e.g. `title` or `blank`.
    pub layout_type: String,
    pub placeholders: Vec<PlaceholderDef>,
}

impl LayoutDef {
    pub fn new(name: impl Into<String>, layout_type: impl Into<String>, placeholders: Vec<PlaceholderDef>) -> Self {
        Self {
            name: name.into(),
            layout_type: layout_type.into(),
            placeholders,
        }
    }
}

/// One slide: a layout reference plus shapes in z-order.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub layout: usize,
    pub background: Option<Rgb>,
    pub shapes: Vec<Shape>,
}

impl Slide {
    pub fn add(&mut self, shape: Shape) -> &mut Self {
        self.shapes.push(shape);
        self
    }

    /// Add a filled rectangle-like shape with no outline.
    pub fn add_block(&mut self, geometry: Geometry, frame: Frame, fill: Rgb) -> &mut Self {
        self.add(Shape::Auto(AutoShape {
            geometry,
            frame,
            fill: Some(fill),
            line: Line::None,
            text: None,
        }))
    }

    /// Add an unfilled text box.
    pub fn add_text_box(&mut self, frame: Frame, body: TextBody) -> &mut Self {
        self.add(Shape::TextBox(TextBox {
            frame,
            fill: None,
            body,
        }))
    }

    /// The placeholder with the given index, if the slide has one.
    pub fn placeholder_mut(&mut self, idx: u32) -> Option<&mut Placeholder> {
        self.shapes.iter_mut().find_map(|shape| match shape {
            Shape::Placeholder(ph) if ph.idx == idx => Some(ph),
            _ => None,
        })
    }

    /// The title or centered-title placeholder.
    pub fn title_placeholder_mut(&mut self) -> Option<&mut Placeholder> {
        self.shapes.iter_mut().find_map(|shape| match shape {
            Shape::Placeholder(ph) if ph.kind.is_title() => Some(ph),
            _ => None,
        })
    }

    /// All text on the slide, in shape order.
    pub fn texts(&self) -> Vec<String> {
        let mut out = Vec::new();
        for shape in &self.shapes {
            match shape {
                Shape::Auto(AutoShape { text: Some(body), .. })
                | Shape::TextBox(TextBox { body, .. })
                | Shape::Placeholder(Placeholder { body: Some(body), .. }) => out.push(body.text()),
                Shape::Table(table) => {
                    out.extend(table.rows.iter().flatten().map(|cell| cell.text.clone()))
                }
                _ => {}
            }
        }
        out
    }
}

/// Document properties written to `docProps/core.xml`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocProperties {
    pub title: String,
    pub creator: String,
    /// W3C date-time; omitted from the package when unset.
    pub created: Option<String>,
}

/// Fonts and accent colors written into the package theme.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckTheme {
    pub name: String,
    pub dark: Rgb,
    pub light: Rgb,
    pub dark2: Rgb,
    pub light2: Rgb,
    pub accents: [Rgb; 6],
    pub major_font: String,
    pub minor_font: String,
    pub east_asian_font: String,
}

impl Default for DeckTheme {
    fn default() -> Self {
        Self {
            name: "Office Theme".to_string(),
            dark: Rgb(0, 0, 0),
            light: Rgb::WHITE,
            dark2: Rgb(0x44, 0x54, 0x6A),
            light2: Rgb(0xE7, 0xE6, 0xE6),
            accents: [
                Rgb(0x44, 0x72, 0xC4),
                Rgb(0xED, 0x7D, 0x31),
                Rgb(0xA5, 0xA5, 0xA5),
                Rgb(0xFF, 0xC0, 0x00),
                Rgb(0x5B, 0x9B, 0xD5),
                Rgb(0x70, 0xAD, 0x47),
            ],
            major_font: "Calibri Light".to_string(),
            minor_font: "Calibri".to_string(),
            east_asian_font: String::new(),
        }
    }
}

/// Standard 16:9 slide width in inches.
pub const DEFAULT_WIDTH_IN: f64 = 13.333;

/// Standard 16:9 slide height in inches.
pub const DEFAULT_HEIGHT_IN: f64 = 7.5;

/// A complete deck ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    /// EMUs.
    pub width: i64,
    /// EMUs.
    pub height: i64,
    pub layouts: Vec<LayoutDef>,
    pub slides: Vec<Slide>,
    pub properties: DocProperties,
    pub theme: DeckTheme,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    /// A 16:9 deck with the standard Office layouts.
    pub fn new() -> Self {
        Self::with_size(DEFAULT_WIDTH_IN, DEFAULT_HEIGHT_IN)
    }

    /// A deck of the given size (inches) with standard layouts scaled to fit.
    pub fn with_size(width_in: f64, height_in: f64) -> Self {
        let (width, height) = (inches(width_in), inches(height_in));
        Self {
            width,
            height,
            layouts: standard_layouts(width, height),
            slides: Vec::new(),
            properties: DocProperties::default(),
            theme: DeckTheme::default(),
        }
    }

    /// A deck with explicit layouts, e.g. taken from a template.
    pub fn with_layouts(width: i64, height: i64, layouts: Vec<LayoutDef>) -> Self {
        Self {
            width,
            height,
            layouts,
            slides: Vec::new(),
            properties: DocProperties::default(),
            theme: DeckTheme::default(),
        }
    }

    pub fn width_inches(&self) -> f64 {
        emu_to_inches(self.width)
    }

    pub fn height_inches(&self) -> f64 {
        emu_to_inches(self.height)
    }

    pub fn layout_names(&self) -> Vec<&str> {
        self.layouts.iter().map(|l| l.name.as_str()).collect()
    }

    /// Append a slide using layout `layout`, copying its content placeholders.
    ///
    /// An out-of-range index falls back to the first layout.
    pub fn add_slide(&mut self, layout: usize) -> &mut Slide {
        let layout = if layout < self.layouts.len() { layout } else { 0 };
        let shapes = self
            .layouts
            .get(layout)
            .map(|def| {
                def.placeholders
                    .iter()
                    .filter(|ph| ph.kind.is_inherited())
                    .map(|ph| {
                        Shape::Placeholder(Placeholder {
                            kind: ph.kind,
                            idx: ph.idx,
                            body: None,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        self.slides.push(Slide {
            layout,
            background: None,
            shapes,
        });
        let last = self.slides.len() - 1;
        &mut self.slides[last]
    }
}

/// The eleven layouts of the default Office template, scaled to the deck.
pub fn standard_layouts(width: i64, height: i64) -> Vec<LayoutDef> {
    use PlaceholderKind::*;

    let sx = width as f64 / inches(DEFAULT_WIDTH_IN) as f64;
    let sy = height as f64 / inches(DEFAULT_HEIGHT_IN) as f64;
    let ph = |kind, idx, x, y, cx, cy| PlaceholderDef {
        kind,
        idx,
        frame: Frame::new(x, y, cx, cy).scaled(sx, sy),
    };
    let title = || ph(Title, 0, 838200, 365125, 10515600, 1325563);
    let body = || ph(Object, 1, 838200, 1825625, 10515600, 4351338);

    vec![
        LayoutDef::new(
            "Title Slide",
            "title",
            vec![
                ph(CenterTitle, 0, 1524000, 1122363, 9144000, 2387600),
                ph(Subtitle, 1, 1524000, 3602038, 9144000, 1655762),
            ],
        ),
        LayoutDef::new("Title and Content", "obj", vec![title(), body()]),
        LayoutDef::new(
            "Section Header",
            "secHead",
            vec![
                ph(Title, 0, 831850, 1709738, 10515600, 2852737),
                ph(Body, 1, 831850, 4589463, 10515600, 1500187),
            ],
        ),
        LayoutDef::new(
            "Two Content",
            "twoObj",
            vec![
                title(),
                ph(Object, 1, 838200, 1825625, 5181600, 4351338),
                ph(Object, 2, 6172200, 1825625, 5181600, 4351338),
            ],
        ),
        LayoutDef::new(
            "Comparison",
            "twoTxTwoObj",
            vec![
                ph(Title, 0, 839788, 365125, 10515600, 1325563),
                ph(Body, 1, 839788, 1681163, 5157787, 823912),
                ph(Object, 2, 839788, 2505075, 5157787, 3684588),
                ph(Body, 3, 6172200, 1681163, 5183188, 823912),
                ph(Object, 4, 6172200, 2505075, 5183188, 3684588),
            ],
        ),
        LayoutDef::new("Title Only", "titleOnly", vec![title()]),
        LayoutDef::new("Blank", "blank", Vec::new()),
        LayoutDef::new(
            "Content with Caption",
            "objTx",
            vec![
                ph(Title, 0, 839788, 457200, 3932237, 1600200),
                ph(Object, 1, 5183188, 987425, 6172200, 4873625),
                ph(Body, 2, 839788, 2057400, 3932237, 3811588),
            ],
        ),
        LayoutDef::new(
            "Picture with Caption",
            "picTx",
            vec![
                ph(Title, 0, 839788, 457200, 3932237, 1600200),
                ph(Picture, 1, 5183188, 987425, 6172200, 4873625),
                ph(Body, 2, 839788, 2057400, 3932237, 3811588),
            ],
        ),
        LayoutDef::new("Title and Vertical Text", "vertTx", vec![title(), ph(Body, 1, 838200, 1825625, 10515600, 4351338)]),
        LayoutDef::new(
            "Vertical Title and Text",
            "vertTitleAndTx",
            vec![
                ph(Title, 0, 8724900, 365125, 2628900, 5811838),
                ph(Body, 1, 838200, 365125, 7734300, 5811838),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inches() {
        assert_eq!(inches(1.0), 914_400);
        assert_eq!(inches(0.5), 457_200);
        assert!((emu_to_inches(inches(13.333)) - 13.333).abs() < 1e-6);
    }

    #[test]
    fn test_standard_layouts() {
        let deck = Deck::new();
        assert_eq!(deck.layouts.len(), 11);
        assert_eq!(deck.layouts[6].name, "Blank");
        assert!(deck.layouts[6].placeholders.is_empty());
        assert_eq!(deck.layouts[0].placeholders[0].kind, PlaceholderKind::CenterTitle);
    }

    #[test]
    fn test_layouts_scale_with_deck() {
        let deck = Deck::with_size(DEFAULT_WIDTH_IN * 2.0, DEFAULT_HEIGHT_IN);
        let frame = deck.layouts[1].placeholders[0].frame;
        assert_eq!(frame.x, 838200 * 2);
        assert_eq!(frame.y, 365125);
    }

    #[test]
    fn test_add_slide_copies_placeholders() {
        let mut deck = Deck::new();
        let slide = deck.add_slide(1);
        assert_eq!(slide.shapes.len(), 2);
        assert!(slide.title_placeholder_mut().is_some());
        assert!(slide.placeholder_mut(1).is_some());
        assert!(slide.placeholder_mut(7).is_none());
    }

    #[test]
    fn test_add_slide_out_of_range_uses_first_layout() {
        let mut deck = Deck::new();
        assert_eq!(deck.add_slide(99).layout, 0);
    }

    #[test]
    fn test_placeholder_kind_xml() {
        assert_eq!(PlaceholderKind::from_xml_type(None), PlaceholderKind::Object);
        assert_eq!(PlaceholderKind::from_xml_type(Some("ctrTitle")), PlaceholderKind::CenterTitle);
        assert_eq!(PlaceholderKind::from_xml_type(Some("chart")), PlaceholderKind::Body);
        assert_eq!(PlaceholderKind::Object.xml_type(), None);
        assert_eq!(PlaceholderKind::Subtitle.label(), "SUBTITLE");
    }

    #[test]
    fn test_image_detection() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, b'I', b'H', b'D', b'R', 0, 0, 0, 40, 0, 0, 0, 20];
        assert_eq!(ImageFormat::detect(&png), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::Png.dimensions(&png), Some((40, 20)));
        assert_eq!(ImageFormat::detect(b"GIF89a\x10\x00\x08\x00"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::Gif.dimensions(b"GIF89a\x10\x00\x08\x00"), Some((16, 8)));
        assert_eq!(ImageFormat::detect(b"plain text"), None);
    }
}
