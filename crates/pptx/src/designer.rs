//! Themed renderer for summarized presentation content.
//!
//! Every slide is drawn on the blank layout with explicit shapes: a colored
//! title page, an optional table of contents, one slide per
//! [`SlideContent`], and a closing page.

use crate::deck::{
    inches, Align, Anchor, AutoShape, Deck, DeckTheme, Frame, Geometry, Line, Paragraph, RunFormat,
    Shape, Slide, Table, TableCell, TextBody,
};
use chrono::{Local, NaiveDate};
use mdeck_core::normalize::{base_title, limit_text_lines, truncate_text};
use mdeck_core::{
    ColorTheme, LayoutHint, LayoutMapping, LayoutResolver, LayoutRole, PresentationContent,
    RenderStyle, Result, Rgb, SlideContent, StyleProfile,
};

const DEFAULT_MARGIN_LEFT: f64 = 0.7;
const DEFAULT_MARGIN_TOP: f64 = 0.5;
const DEFAULT_CONTENT_WIDTH: f64 = 12.0;
const CONTENT_TOP: f64 = 1.8;
const HEADER_BAR_HEIGHT: f64 = 0.08;

const MAX_CHARS_PER_LINE: usize = 35;
const MAX_LINES_PER_BULLET: usize = 2;
const MAX_BULLETS: usize = MAX_LINES_PER_BULLET * 3;
const BULLET_STEP: f64 = 0.8;
const BULLET_AREA_BOTTOM: f64 = 6.5;

const MAX_TOC_ITEMS: usize = 8;
const MAX_METRIC_CARDS: usize = 4;
const MAX_COMPANION_BULLETS: usize = 3;
const MAX_TABLE_ROWS: usize = 7;
const HEADER_CELL_CHARS: usize = 20;
const DATA_CELL_CHARS: usize = 25;

const CARD_FILL: Rgb = Rgb(245, 245, 245);
const CARD_LINE: Rgb = Rgb(230, 230, 230);
const STRIPE_FILL: Rgb = Rgb(245, 245, 245);

const DEFAULT_TITLE: &str = "프레젠테이션";
const DEFAULT_SLIDE_TITLE: &str = "슬라이드";
const DEFAULT_SECTION_TITLE: &str = "섹션";
const TOC_TITLE: &str = "목차";
const TOC_SUBTITLE: &str = "CONTENTS";
const CLOSING_TITLE: &str = "감사합니다";
const CLOSING_SUBTITLE: &str = "Q & A";

/// Per-run settings that do not come from the style.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignOptions {
    /// Date printed on the title slide and stored in the document
    /// properties. Today when unset.
    pub generated_on: Option<NaiveDate>,
    pub creator: String,
}

impl Default for DesignOptions {
    fn default() -> Self {
        Self {
            generated_on: None,
            creator: "mdeck".to_string(),
        }
    }
}

impl DesignOptions {
    pub fn with_generated_on(mut self, date: NaiveDate) -> Self {
        self.generated_on = Some(date);
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }
}

/// Placement constants, in inches.
#[derive(Debug, Clone, Copy)]
struct Canvas {
    width: f64,
    height: f64,
    margin_left: f64,
    margin_top: f64,
    content_width: f64,
    header_bar: Option<f64>,
}

impl Canvas {
    fn new(profile: Option<&StyleProfile>) -> Self {
        let Some(profile) = profile else {
            return Self {
                width: crate::deck::DEFAULT_WIDTH_IN,
                height: crate::deck::DEFAULT_HEIGHT_IN,
                margin_left: DEFAULT_MARGIN_LEFT,
                margin_top: DEFAULT_MARGIN_TOP,
                content_width: DEFAULT_CONTENT_WIDTH,
                header_bar: Some(HEADER_BAR_HEIGHT),
            };
        };

        let positive = |v: f64, default: f64| if v > 0.0 { v } else { default };
        let width = positive(profile.slide_width, crate::deck::DEFAULT_WIDTH_IN);
        let height = positive(profile.slide_height, crate::deck::DEFAULT_HEIGHT_IN);
        let margin_left = positive(profile.margin_left, DEFAULT_MARGIN_LEFT);
        let margin_right = positive(profile.margin_right, DEFAULT_MARGIN_LEFT);
        Self {
            width,
            height,
            margin_left,
            margin_top: positive(profile.margin_top, DEFAULT_MARGIN_TOP),
            content_width: (width - margin_left - margin_right).max(1.0),
            header_bar: profile
                .use_header_bar
                .then(|| positive(profile.header_height, HEADER_BAR_HEIGHT)),
        }
    }
}

/// Font faces and sizes (points).
#[derive(Debug, Clone)]
struct Typography {
    title_font: String,
    body_font: String,
    english_font: String,
    main_title: f64,
    slide_title: f64,
    subtitle: f64,
    body: f64,
    bullet: f64,
    small: f64,
    metric_value: f64,
    metric_label: f64,
}

impl Typography {
    fn new(profile: Option<&StyleProfile>) -> Self {
        let mut typography = Self {
            title_font: "맑은 고딕".to_string(),
            body_font: "맑은 고딕".to_string(),
            english_font: "Segoe UI".to_string(),
            main_title: 44.0,
            slide_title: 32.0,
            subtitle: 20.0,
            body: 18.0,
            bullet: 16.0,
            small: 14.0,
            metric_value: 36.0,
            metric_label: 14.0,
        };

        if let Some(fonts) = profile.map(|p| &p.fonts) {
            if !fonts.title_font.is_empty() {
                typography.title_font = fonts.title_font.clone();
            }
            if !fonts.body_font.is_empty() {
                typography.body_font = fonts.body_font.clone();
            }
            if !fonts.english_font.is_empty() {
                typography.english_font = fonts.english_font.clone();
            }
            if fonts.title_size > 0 {
                typography.main_title = fonts.title_size as f64;
            }
            if fonts.body_size > 0 {
                typography.body = fonts.body_size as f64;
                typography.bullet = fonts.body_size.saturating_sub(2).max(1) as f64;
            }
        }
        typography
    }
}

/// Renders [`PresentationContent`] with a theme or a learned style.
#[derive(Debug, Clone, Default)]
pub struct DeckDesigner {
    style: RenderStyle,
    options: DesignOptions,
}

impl DeckDesigner {
    pub fn new(style: RenderStyle) -> Self {
        Self {
            style,
            options: DesignOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DesignOptions) -> Self {
        self.options = options;
        self
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// Build the deck. Nothing is written to disk.
    pub fn design(&self, content: &PresentationContent) -> Result<Deck> {
        let profile = self.style.profile();
        let canvas = Canvas::new(profile);
        let colors = self.style.colors();
        let typography = Typography::new(profile);
        let date = self
            .options
            .generated_on
            .unwrap_or_else(|| Local::now().date_naive());

        let mut deck = Deck::with_size(canvas.width, canvas.height);
        let mapping = LayoutMapping::default();
        let blank = LayoutResolver::new(&mapping, deck.layout_names()).resolve(LayoutRole::Blank)?;

        deck.theme = deck_theme(&self.style, &colors, &typography);
        deck.properties.title = content.title.clone();
        deck.properties.creator = self.options.creator.clone();
        deck.properties.created = Some(format!("{}T00:00:00Z", date.format("%Y-%m-%d")));

        let mut painter = Painter {
            deck,
            blank,
            canvas,
            colors,
            typography,
        };

        painter.title_slide(&content.title, content.subtitle.as_deref(), date);
        if content.slides.len() > 3 {
            painter.toc_slide(&content.slides);
        }
        for slide in &content.slides {
            match slide.layout_hint {
                LayoutHint::TitleOnly => painter.section_slide(slide),
                LayoutHint::Metrics => painter.metrics_slide(slide),
                LayoutHint::Table => painter.table_slide(slide),
                LayoutHint::Bullet | LayoutHint::TwoColumn => painter.bullet_slide(slide),
            }
        }
        painter.closing_slide();

        log::debug!(
            "Designed {} slides from {} content slides",
            painter.deck.slides.len(),
            content.slides.len()
        );
        Ok(painter.deck)
    }
}

fn deck_theme(style: &RenderStyle, colors: &ColorTheme, typography: &Typography) -> DeckTheme {
    let name = match style {
        RenderStyle::Theme(theme) => theme.name().to_string(),
        RenderStyle::Profile(profile) if !profile.name.is_empty() => profile.name.clone(),
        RenderStyle::Profile(_) => "profile".to_string(),
    };
    let defaults = DeckTheme::default();
    DeckTheme {
        name,
        dark: colors.text_dark,
        light: colors.background,
        dark2: colors.secondary,
        accents: [
            colors.primary,
            colors.accent,
            colors.secondary,
            defaults.accents[3],
            defaults.accents[4],
            defaults.accents[5],
        ],
        major_font: typography.english_font.clone(),
        minor_font: typography.english_font.clone(),
        east_asian_font: typography.title_font.clone(),
        ..defaults
    }
}

/// Drawing state for one `design` call.
struct Painter {
    deck: Deck,
    blank: usize,
    canvas: Canvas,
    colors: ColorTheme,
    typography: Typography,
}

impl Painter {
    fn new_slide(&mut self) -> &mut Slide {
        let background = (self.colors.background != Rgb::WHITE).then_some(self.colors.background);
        let slide = self.deck.add_slide(self.blank);
        slide.background = background;
        slide
    }

    fn run(&self, font: &str, size: f64, color: Rgb) -> RunFormat {
        RunFormat::new().font(font).size(size).color(color)
    }

    fn title_slide(&mut self, title: &str, subtitle: Option<&str>, date: NaiveDate) {
        let c = self.canvas;
        let title_text = if title.is_empty() { DEFAULT_TITLE } else { title };
        let title_para = Paragraph::new(
            title_text,
            self.run(&self.typography.title_font, self.typography.main_title, self.colors.text_dark)
                .bold(),
        )
        .align(Align::Left);
        let subtitle_para = subtitle.filter(|s| !s.is_empty()).map(|s| {
            Paragraph::new(
                s,
                self.run(&self.typography.body_font, self.typography.subtitle, self.colors.secondary),
            )
            .align(Align::Left)
        });
        let date_para = Paragraph::new(
            date.format("%Y년 %m월").to_string(),
            self.run(&self.typography.body_font, self.typography.small, self.colors.secondary),
        );
        let (primary, accent) = (self.colors.primary, self.colors.accent);

        let slide = self.new_slide();
        slide.add_block(Geometry::Rect, Frame::inches(0.0, 0.0, c.width, 3.0), primary);
        slide.add_block(Geometry::Rect, Frame::inches(0.0, 3.0, c.width, 0.05), accent);
        slide.add_text_box(
            Frame::inches(c.margin_left, 3.5, c.content_width, 1.5),
            TextBody::single(title_para),
        );
        if let Some(para) = subtitle_para {
            slide.add_text_box(
                Frame::inches(c.margin_left, 5.2, c.content_width, 0.5),
                TextBody::single(para).no_wrap(),
            );
        }
        slide.add_text_box(
            Frame::inches(c.margin_left, 6.5, 3.0, 0.4),
            TextBody::single(date_para).no_wrap(),
        );
    }

    fn toc_slide(&mut self, slides: &[SlideContent]) {
        let mut titles: Vec<&str> = Vec::new();
        for slide in slides {
            let title = if slide.title.is_empty() { DEFAULT_SLIDE_TITLE } else { slide.title.as_str() };
            let base = base_title(title);
            if !titles.contains(&base) {
                titles.push(base);
            }
        }
        titles.truncate(MAX_TOC_ITEMS);
        let per_column = ((titles.len() + 1) / 2).max(1);

        let c = self.canvas;
        let (primary, text_light) = (self.colors.primary, self.colors.text_light);
        let number_format = RunFormat::new().size(12.0).bold().color(text_light);
        let title_format = self.run(&self.typography.body_font, self.typography.body, self.colors.text_dark);

        self.new_slide();
        self.header_bar();
        self.slide_title(TOC_TITLE, Some(TOC_SUBTITLE));

        let Some(slide) = self.deck.slides.last_mut() else {
            return;
        };
        for (i, title) in titles.iter().enumerate() {
            let column = (i / per_column) as f64;
            let row = (i % per_column) as f64;
            let x = c.margin_left + column * 6.0;
            let y = CONTENT_TOP + 0.3 + row * 0.7;

            slide.add(Shape::Auto(AutoShape {
                geometry: Geometry::Ellipse,
                frame: Frame::inches(x, y, 0.35, 0.35),
                fill: Some(primary),
                line: Line::None,
                text: Some(
                    TextBody::single(
                        Paragraph::new((i + 1).to_string(), number_format.clone()).align(Align::Center),
                    )
                    .anchor(Anchor::Middle),
                ),
            }));
            slide.add_text_box(
                Frame::inches(x + 0.5, y, 5.5, 0.4),
                TextBody::single(Paragraph::new(*title, title_format.clone())),
            );
        }
    }

    fn section_slide(&mut self, content: &SlideContent) {
        let c = self.canvas;
        let title = if content.title.is_empty() { DEFAULT_SECTION_TITLE } else { content.title.as_str() };
        let para = Paragraph::new(
            title,
            self.run(&self.typography.title_font, self.typography.main_title, self.colors.text_light)
                .bold(),
        )
        .align(Align::Center);
        let primary = self.colors.primary;

        let slide = self.new_slide();
        slide.add_block(Geometry::Rect, Frame::inches(0.0, 0.0, c.width, c.height), primary);
        slide.add_text_box(
            Frame::inches(c.margin_left, 3.0, c.content_width, 1.5),
            TextBody::single(para).no_wrap(),
        );
    }

    fn bullet_slide(&mut self, content: &SlideContent) {
        let c = self.canvas;
        self.new_slide();
        self.header_bar();
        self.slide_title(&content.title, None);

        let accent = self.colors.accent;
        let format = self.run(&self.typography.body_font, self.typography.bullet, self.colors.text_dark);
        let Some(slide) = self.deck.slides.last_mut() else {
            return;
        };

        let mut y = CONTENT_TOP + 0.2;
        for bullet in content.bullets.iter().take(MAX_BULLETS) {
            slide.add_block(
                Geometry::RoundRect,
                Frame::inches(c.margin_left, y + 0.08, 0.15, 0.15),
                accent,
            );
            let text = limit_text_lines(bullet, MAX_CHARS_PER_LINE, MAX_LINES_PER_BULLET);
            slide.add_text_box(
                Frame::inches(c.margin_left + 0.35, y, c.content_width - 0.5, BULLET_STEP),
                TextBody::single(Paragraph::new(text, format.clone()).line_spacing(1.2)),
            );

            y += BULLET_STEP;
            if y > BULLET_AREA_BOTTOM {
                break;
            }
        }
    }

    fn metrics_slide(&mut self, content: &SlideContent) {
        let c = self.canvas;
        self.new_slide();
        self.header_bar();
        self.slide_title(&content.title, None);

        let metrics: Vec<_> = content.key_metrics.iter().take(MAX_METRIC_CARDS).collect();
        if metrics.is_empty() {
            return;
        }

        let colors = self.colors;
        let value_format = self
            .run(&self.typography.english_font, self.typography.metric_value, colors.primary)
            .bold();
        let label_format = self.run(&self.typography.body_font, self.typography.metric_label, colors.secondary);
        let bullet_format = self.run(&self.typography.body_font, self.typography.small, colors.text_dark);
        let Some(slide) = self.deck.slides.last_mut() else {
            return;
        };

        let (card_width, card_height, gap) = (2.8, 2.0, 0.3);
        let count = metrics.len() as f64;
        let total_width = card_width * count + gap * (count - 1.0);
        let start_x = (c.width - total_width) / 2.0;
        let y = CONTENT_TOP + 0.5;

        for (i, metric) in metrics.iter().enumerate() {
            let x = start_x + i as f64 * (card_width + gap);
            slide.add(Shape::Auto(AutoShape {
                geometry: Geometry::RoundRect,
                frame: Frame::inches(x, y, card_width, card_height),
                fill: Some(CARD_FILL),
                line: Line::Solid {
                    color: CARD_LINE,
                    width_pt: 0.75,
                },
                text: None,
            }));
            slide.add_block(Geometry::Rect, Frame::inches(x, y, card_width, 0.08), colors.primary);
            slide.add_text_box(
                Frame::inches(x + 0.2, y + 0.4, card_width - 0.4, 0.8),
                TextBody::single(Paragraph::new(metric.value.as_str(), value_format.clone()).align(Align::Center))
                    .no_wrap(),
            );
            slide.add_text_box(
                Frame::inches(x + 0.2, y + 1.3, card_width - 0.4, 0.5),
                TextBody::single(Paragraph::new(metric.label.as_str(), label_format.clone()).align(Align::Center))
                    .no_wrap(),
            );
        }

        let mut y = CONTENT_TOP + 3.0;
        for bullet in content.bullets.iter().take(MAX_COMPANION_BULLETS) {
            slide.add_text_box(
                Frame::inches(c.margin_left, y, c.content_width, 0.5),
                TextBody::single(Paragraph::new(format!("• {}", bullet), bullet_format.clone())).no_wrap(),
            );
            y += 0.5;
        }
    }

    fn table_slide(&mut self, content: &SlideContent) {
        let c = self.canvas;
        self.new_slide();
        self.header_bar();
        self.slide_title(&content.title, None);

        let Some(table) = content.table_data.as_ref().filter(|t| !t.headers.is_empty()) else {
            return;
        };

        let colors = self.colors;
        let header_format = self
            .run(&self.typography.body_font, self.typography.small, colors.text_light)
            .bold();
        let data_format = self.run(&self.typography.body_font, self.typography.small, colors.text_dark);
        let Some(slide) = self.deck.slides.last_mut() else {
            return;
        };

        let columns = table.headers.len();
        let row_count = (table.rows.len() + 1).min(MAX_TABLE_ROWS);
        let row_height = 0.5;

        let mut rows: Vec<Vec<TableCell>> = Vec::with_capacity(row_count);
        rows.push(
            table
                .headers
                .iter()
                .map(|h| TableCell {
                    text: truncate_text(h, HEADER_CELL_CHARS),
                    format: header_format.clone(),
                    align: Some(Align::Center),
                    fill: Some(colors.primary),
                })
                .collect(),
        );
        for (row_idx, row) in table.rows.iter().take(row_count - 1).enumerate() {
            let fill = (row_idx % 2 == 1).then_some(STRIPE_FILL);
            rows.push(
                (0..columns)
                    .map(|col| TableCell {
                        text: row.get(col).map(|t| truncate_text(t, DATA_CELL_CHARS)).unwrap_or_default(),
                        format: data_format.clone(),
                        align: Some(Align::Center),
                        fill,
                    })
                    .collect(),
            );
        }

        slide.add(Shape::Table(Table {
            frame: Frame::inches(c.margin_left, CONTENT_TOP + 0.2, c.content_width, row_height * row_count as f64),
            column_widths: vec![inches(c.content_width / columns as f64); columns],
            row_height: inches(row_height),
            rows,
        }));
    }

    fn closing_slide(&mut self) {
        let c = self.canvas;
        let title = Paragraph::new(
            CLOSING_TITLE,
            self.run(&self.typography.title_font, self.typography.main_title, self.colors.text_light)
                .bold(),
        )
        .align(Align::Center);
        let subtitle = Paragraph::new(
            CLOSING_SUBTITLE,
            self.run(&self.typography.english_font, self.typography.subtitle, self.colors.text_light),
        )
        .align(Align::Center);
        let primary = self.colors.primary;

        let slide = self.new_slide();
        slide.add_block(Geometry::Rect, Frame::inches(0.0, 0.0, c.width, c.height), primary);
        slide.add_text_box(
            Frame::inches(c.margin_left, 3.0, c.content_width, 1.5),
            TextBody::single(title).no_wrap(),
        );
        slide.add_text_box(
            Frame::inches(c.margin_left, 4.5, c.content_width, 0.5),
            TextBody::single(subtitle).no_wrap(),
        );
    }

    /// Thin primary-colored bar along the top edge of the last slide.
    fn header_bar(&mut self) {
        let (width, primary) = (self.canvas.width, self.colors.primary);
        let Some(height) = self.canvas.header_bar else {
            return;
        };
        if let Some(slide) = self.deck.slides.last_mut() {
            slide.add_block(Geometry::Rect, Frame::inches(0.0, 0.0, width, height), primary);
        }
    }

    /// Accent marker, title, and optional subtitle on the last slide.
    fn slide_title(&mut self, title: &str, subtitle: Option<&str>) {
        let c = self.canvas;
        let title = if title.is_empty() { DEFAULT_SLIDE_TITLE } else { title };
        let title_para = Paragraph::new(
            title,
            self.run(&self.typography.title_font, self.typography.slide_title, self.colors.text_dark)
                .bold(),
        );
        let subtitle_para = subtitle.map(|s| {
            Paragraph::new(
                s,
                self.run(&self.typography.english_font, self.typography.small, self.colors.secondary),
            )
        });
        let primary = self.colors.primary;

        let Some(slide) = self.deck.slides.last_mut() else {
            return;
        };
        slide.add_block(Geometry::Rect, Frame::inches(c.margin_left, c.margin_top, 0.08, 0.8), primary);
        slide.add_text_box(
            Frame::inches(c.margin_left + 0.25, c.margin_top, c.content_width, 0.6),
            TextBody::single(title_para).no_wrap(),
        );
        if let Some(para) = subtitle_para {
            slide.add_text_box(
                Frame::inches(c.margin_left + 0.25, c.margin_top + 0.6, c.content_width, 0.4),
                TextBody::single(para).no_wrap(),
            );
        }
    }
}
