//! Summarization of parsed documents into presentation-sized slides.
//!
//! Each parsed section becomes zero or more [`SlideContent`]s: appendix-like
//! sections are skipped, bullets are shortened, numeric facts in body text
//! become metrics, long bullet lists are split, and the deck is capped to
//! the most important slides.

use crate::error::Result;
use crate::normalize::{char_len, strip_inline_markup, take_chars, ELLIPSIS};
use crate::types::{
    ContentItem, ContentKind, LayoutHint, Metric, ParsedDocument, ParsedSlide,
    PresentationContent, SlideContent, TableData,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Currency amount such as `1,200만원` or `3.5억`.
static MONEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:,\d{3})*(?:\.\d+)?)\s*(?:억|만|원|백만)").unwrap());

/// Hangul word ending in an amount noun, used as the money label.
static MONEY_LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([가-힣]+(?:금액|비용|예산|계약))").unwrap());

static PERIOD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*(?:개월|주|일)").unwrap());

static PEOPLE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*(?:명|인)").unwrap());

/// Tunable limits and keyword lists for [`ContentSummarizer`].
///
/// Defaults target Korean business documents. Every field can be
/// overridden from JSON; missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub max_bullets_per_slide: usize,
    /// In characters.
    pub max_bullet_length: usize,
    pub max_table_rows: usize,
    pub max_slides: usize,
    pub max_metrics_per_slide: usize,
    /// Bullets shown next to metric cards.
    pub max_companion_bullets: usize,
    /// Sections whose title contains one of these are dropped.
    pub skip_keywords: Vec<String>,
    /// Title keywords that raise importance to 2.
    pub important_keywords: Vec<String>,
    /// Title keywords that raise importance to 3.
    pub critical_keywords: Vec<String>,
    /// Words that mark a number of days/weeks/months as a schedule.
    pub period_keywords: Vec<String>,
    /// Words that mark a count of people as staffing.
    pub people_keywords: Vec<String>,
    pub period_label: String,
    pub people_label: String,
    /// Appended to the title of the bullet slide that follows a table.
    pub highlights_suffix: String,
    pub author_prefix: String,
    pub default_title: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_bullets_per_slide: 5,
            max_bullet_length: 60,
            max_table_rows: 6,
            max_slides: 15,
            max_metrics_per_slide: 4,
            max_companion_bullets: 3,
            skip_keywords: strings(&[
                "부록",
                "문서 개정 이력",
                "참고",
                "별첨",
                "Appendix",
                "Revision History",
            ]),
            important_keywords: strings(&[
                "목표", "목적", "전략", "핵심", "주요", "중요", "필수", "일정", "마일스톤", "예산",
                "비용", "금액", "위험", "리스크", "이슈", "문제", "성과", "효과", "기대", "KPI",
                "조직", "인력", "담당", "PM", "PL",
            ]),
            critical_keywords: strings(&["개요", "목표", "전략", "일정", "조직", "위험"]),
            period_keywords: strings(&["기간", "일정", "계약"]),
            people_keywords: strings(&["인력", "인원", "팀"]),
            period_label: "프로젝트 기간".to_string(),
            people_label: "투입 인력".to_string(),
            highlights_suffix: " - 주요 내용".to_string(),
            author_prefix: "작성자: ".to_string(),
            default_title: "프레젠테이션".to_string(),
        }
    }
}

impl SummarizerConfig {
    /// Load a config from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the maximum number of slides in the summarized deck.
    pub fn with_max_slides(mut self, max_slides: usize) -> Self {
        self.max_slides = max_slides;
        self
    }

    /// Set the maximum number of bullets per slide.
    pub fn with_max_bullets_per_slide(mut self, max: usize) -> Self {
        self.max_bullets_per_slide = max.max(1);
        self
    }

    /// Replace the list of section keywords to skip.
    pub fn with_skip_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

/// One fact pulled out of a line of body text.
enum KeyInfo {
    Metric(Metric),
    Bullet(String),
}

/// Turns a [`ParsedDocument`] into [`PresentationContent`].
#[derive(Debug, Clone, Default)]
pub struct ContentSummarizer {
    config: SummarizerConfig,
}

impl ContentSummarizer {
    /// Create a summarizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given configuration.
    pub fn with_config(mut self, config: SummarizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Summarize a whole document.
    pub fn summarize(&self, doc: &ParsedDocument) -> PresentationContent {
        let title = doc
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.config.default_title.clone());

        let mut subtitle = doc
            .metadata
            .get("author")
            .map(|author| format!("{}{}", self.config.author_prefix, author));
        if let Some(date) = doc.metadata.get("date") {
            subtitle = Some(date.clone());
        }

        let mut slides: Vec<SlideContent> = doc
            .slides
            .iter()
            .flat_map(|slide| self.summarize_slide(slide))
            .collect();

        if slides.len() > self.config.max_slides {
            log::debug!(
                "Keeping {} of {} slides by importance",
                self.config.max_slides,
                slides.len()
            );
            // stable: equal importance keeps source order
            slides.sort_by(|a, b| b.importance.cmp(&a.importance));
            slides.truncate(self.config.max_slides);
        }

        PresentationContent {
            title,
            subtitle,
            slides,
            metadata: doc.metadata.clone(),
        }
    }

    /// Summarize one section into zero or more slides.
    pub fn summarize_slide(&self, slide: &ParsedSlide) -> Vec<SlideContent> {
        let cfg = &self.config;
        let title = slide.title.as_deref().unwrap_or_default();

        if self.should_skip(title) {
            log::debug!("Skipping section '{}'", title);
            return Vec::new();
        }

        let mut bullets = Vec::new();
        let mut metrics = Vec::new();
        for item in &slide.content {
            match item.kind {
                ContentKind::Bullet | ContentKind::Numbered => {
                    if let Some(bullet) = self.summarize_bullet(&item.text) {
                        bullets.push(bullet);
                    }
                }
                ContentKind::Text => match self.extract_key_info(&item.text) {
                    Some(KeyInfo::Metric(metric)) => metrics.push(metric),
                    Some(KeyInfo::Bullet(text)) => bullets.push(text),
                    None => {}
                },
                ContentKind::Subheading | ContentKind::Quote => {}
            }
        }

        let table = match slide.tables.first() {
            Some(table) => Some(TableData {
                headers: table.headers.clone(),
                rows: table.rows.iter().take(cfg.max_table_rows).cloned().collect(),
            }),
            None => self.table_from_content(&slide.content),
        };

        let importance = self.importance(title);
        let make = |title: String, hint: LayoutHint| SlideContent {
            importance,
            ..SlideContent::new(title, hint)
        };

        let mut out = Vec::new();
        if let Some(table) = table {
            let mut table_slide = make(title.to_string(), LayoutHint::Table);
            table_slide.table_data = Some(table);
            out.push(table_slide);

            if !bullets.is_empty() {
                let mut highlights =
                    make(format!("{}{}", title, cfg.highlights_suffix), LayoutHint::Bullet);
                bullets.truncate(cfg.max_bullets_per_slide);
                highlights.bullets = bullets;
                out.push(highlights);
            }
        } else if !metrics.is_empty() {
            let mut metrics_slide = make(title.to_string(), LayoutHint::Metrics);
            metrics.truncate(cfg.max_metrics_per_slide);
            bullets.truncate(cfg.max_companion_bullets);
            metrics_slide.key_metrics = metrics;
            metrics_slide.bullets = bullets;
            out.push(metrics_slide);
        } else if !bullets.is_empty() {
            let per_slide = cfg.max_bullets_per_slide.max(1);
            let split = bullets.len() > per_slide;
            for (i, chunk) in bullets.chunks(per_slide).enumerate() {
                let chunk_title = if split {
                    format!("{} ({})", title, i + 1)
                } else {
                    title.to_string()
                };
                let mut bullet_slide = make(chunk_title, LayoutHint::Bullet);
                bullet_slide.bullets = chunk.to_vec();
                out.push(bullet_slide);
            }
        } else {
            // untitled too; the renderer supplies a placeholder heading
            out.push(make(title.to_string(), LayoutHint::TitleOnly));
        }
        out
    }

    fn should_skip(&self, title: &str) -> bool {
        let lower = title.to_lowercase();
        self.config
            .skip_keywords
            .iter()
            .any(|k| lower.contains(&k.to_lowercase()))
    }

    /// Importance of a section from its title: 3 critical, 2 notable, 1 other.
    pub fn importance(&self, title: &str) -> u8 {
        let has = |keywords: &[String]| keywords.iter().any(|k| title.contains(k.as_str()));
        if has(&self.config.critical_keywords) {
            3
        } else if has(&self.config.important_keywords) {
            2
        } else {
            1
        }
    }

    /// Strip inline markup and shorten a bullet.
    ///
    /// Long bullets keep the part before the first `:` when that part is
    /// short enough, otherwise they are cut with an ellipsis.
    pub fn summarize_bullet(&self, text: &str) -> Option<String> {
        let max = self.config.max_bullet_length;
        let text = strip_inline_markup(text);
        let text = text.trim();

        let summarized = if char_len(text) <= max {
            text.to_string()
        } else {
            match text.split_once(':') {
                Some((head, _)) if char_len(head) <= max => head.trim().to_string(),
                _ => format!("{}{}", take_chars(text, max.saturating_sub(ELLIPSIS.len())), ELLIPSIS),
            }
        };

        (!summarized.is_empty()).then_some(summarized)
    }

    /// Look for one metric in body text, falling back to a short bullet.
    fn extract_key_info(&self, text: &str) -> Option<KeyInfo> {
        let cfg = &self.config;
        if text.trim().is_empty() {
            return None;
        }

        if let Some(money) = MONEY_REGEX.find(text) {
            if let Some(label) = MONEY_LABEL_REGEX.captures(text).and_then(|c| c.get(1)) {
                return Some(KeyInfo::Metric(Metric::new(label.as_str(), money.as_str())));
            }
        }

        let mentions = |keywords: &[String]| keywords.iter().any(|k| text.contains(k.as_str()));

        if let Some(period) = PERIOD_REGEX.find(text) {
            if mentions(&cfg.period_keywords) {
                return Some(KeyInfo::Metric(Metric::new(&cfg.period_label, period.as_str())));
            }
        }

        if let Some(people) = PEOPLE_REGEX.find(text) {
            if mentions(&cfg.people_keywords) {
                return Some(KeyInfo::Metric(Metric::new(&cfg.people_label, people.as_str())));
            }
        }

        (char_len(text) <= cfg.max_bullet_length).then(|| KeyInfo::Bullet(text.trim().to_string()))
    }

    /// Recover a table from pipe-delimited text lines.
    fn table_from_content(&self, items: &[ContentItem]) -> Option<TableData> {
        let mut lines = items
            .iter()
            .map(|item| item.text.as_str())
            .filter(|text| text.contains('|') && !text.contains("---"));

        let cells = |line: &str| -> Vec<String> {
            line.split('|')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        };

        let headers = cells(lines.next()?);
        if headers.is_empty() {
            return None;
        }
        let rows: Vec<Vec<String>> = lines
            .map(cells)
            .filter(|row| row.len() == headers.len())
            .take(self.config.max_table_rows)
            .collect();
        if rows.is_empty() {
            return None;
        }
        Some(TableData { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownParser;

    fn summarize(markdown: &str) -> PresentationContent {
        let doc = MarkdownParser::default().parse(markdown);
        ContentSummarizer::new().summarize(&doc)
    }

    fn section(title: &str, items: Vec<ContentItem>) -> ParsedSlide {
        ParsedSlide {
            content: items,
            ..ParsedSlide::new(title)
        }
    }

    #[test]
    fn test_budget_table_scenario() {
        let content =
            summarize("# Report\n## Budget\n| Item | Cost |\n|---|---|\n| A | 10 |\n| B | 20 |\n");
        assert_eq!(content.title, "Report");
        assert_eq!(content.slides.len(), 1);
        let slide = &content.slides[0];
        assert_eq!(slide.layout_hint, LayoutHint::Table);
        assert_eq!(slide.title, "Budget");
        let table = slide.table_data.as_ref().unwrap();
        assert_eq!(table.headers, vec!["Item", "Cost"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_table_with_bullets_adds_highlights_slide() {
        let content = summarize("## 예산\n- 항목 정리\n\n| A | B |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(content.slides.len(), 2);
        assert_eq!(content.slides[0].layout_hint, LayoutHint::Table);
        assert_eq!(content.slides[1].title, "예산 - 주요 내용");
        assert_eq!(content.slides[1].bullets, vec!["항목 정리"]);
    }

    #[test]
    fn test_skip_sections() {
        let content = summarize("# T\n## 부록 A\n- x\n## Appendix B\n- y\n## Body\n- z\n");
        assert_eq!(content.slides.len(), 1);
        assert_eq!(content.slides[0].title, "Body");
    }

    #[test]
    fn test_bullet_chunking() {
        let items = (1..=12)
            .map(|i| ContentItem::new(ContentKind::Bullet, format!("point {}", i)))
            .collect();
        let slides = ContentSummarizer::new().summarize_slide(&section("Plan", items));
        let titles: Vec<_> = slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Plan (1)", "Plan (2)", "Plan (3)"]);
        assert_eq!(slides[2].bullets.len(), 2);
    }

    #[test]
    fn test_no_suffix_for_single_chunk() {
        let items = vec![ContentItem::new(ContentKind::Bullet, "only")];
        let slides = ContentSummarizer::new().summarize_slide(&section("Plan", items));
        assert_eq!(slides[0].title, "Plan");
    }

    #[test]
    fn test_metrics_extraction() {
        let items = vec![
            ContentItem::new(ContentKind::Text, "총 사업예산 1,200만원 규모"),
            ContentItem::new(ContentKind::Text, "계약 기간은 6개월"),
            ContentItem::new(ContentKind::Text, "투입 인력 5명"),
            ContentItem::new(ContentKind::Bullet, "**핵심** 사항"),
        ];
        let slides = ContentSummarizer::new().summarize_slide(&section("사업 개요", items));
        assert_eq!(slides.len(), 1);
        let slide = &slides[0];
        assert_eq!(slide.layout_hint, LayoutHint::Metrics);
        assert_eq!(slide.importance, 3);
        assert_eq!(
            slide.key_metrics,
            vec![
                Metric::new("사업예산", "1,200만"),
                Metric::new("프로젝트 기간", "6개월"),
                Metric::new("투입 인력", "5명"),
            ]
        );
        assert_eq!(slide.bullets, vec!["핵심 사항"]);
    }

    #[test]
    fn test_money_without_label_falls_through() {
        let items = vec![ContentItem::new(ContentKind::Text, "약 300만 정도")];
        let slides = ContentSummarizer::new().summarize_slide(&section("S", items));
        assert_eq!(slides[0].layout_hint, LayoutHint::Bullet);
        assert_eq!(slides[0].bullets, vec!["약 300만 정도"]);
    }

    #[test]
    fn test_long_text_dropped() {
        let items = vec![ContentItem::new(ContentKind::Text, "x".repeat(80))];
        let slides = ContentSummarizer::new().summarize_slide(&section("S", items));
        assert_eq!(slides[0].layout_hint, LayoutHint::TitleOnly);
    }

    #[test]
    fn test_untitled_section_without_bullets_is_title_only() {
        let items = vec![ContentItem::new(ContentKind::Text, "x".repeat(80))];
        let slides = ContentSummarizer::new().summarize_slide(&section("", items));
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].layout_hint, LayoutHint::TitleOnly);
        assert_eq!(slides[0].title, "");

        let content = summarize(&format!("# Deck\n\n{}\n\n## A\n- x\n", "y".repeat(90)));
        assert_eq!(content.slides.len(), 2);
        assert_eq!(content.slides[0].layout_hint, LayoutHint::TitleOnly);
    }

    #[test]
    fn test_summarize_bullet() {
        let s = ContentSummarizer::new();
        assert_eq!(s.summarize_bullet("**bold** `code`").as_deref(), Some("bold code"));
        let with_colon = format!("Key point: {}", "detail ".repeat(20));
        assert_eq!(s.summarize_bullet(&with_colon).as_deref(), Some("Key point"));
        let long = "word ".repeat(30);
        let cut = s.summarize_bullet(&long).unwrap();
        assert_eq!(char_len(&cut), 60);
        assert!(cut.ends_with("..."));
        assert_eq!(s.summarize_bullet("  "), None);
    }

    #[test]
    fn test_importance() {
        let s = ContentSummarizer::new();
        assert_eq!(s.importance("프로젝트 개요"), 3);
        assert_eq!(s.importance("예산 계획"), 2);
        assert_eq!(s.importance("기타"), 1);
    }

    #[test]
    fn test_subtitle_from_metadata() {
        let content = summarize("---\nauthor: Kim\n---\n# T\n## A\n- x\n");
        assert_eq!(content.subtitle.as_deref(), Some("작성자: Kim"));
        let content = summarize("---\nauthor: Kim\ndate: 2024-05-01\n---\n# T\n## A\n- x\n");
        assert_eq!(content.subtitle.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn test_default_title() {
        let content = summarize("## A\n- x\n");
        assert_eq!(content.title, "프레젠테이션");
    }

    #[test]
    fn test_slide_cap_prefers_important() {
        let mut markdown = String::from("# Deck\n");
        for i in 0..20 {
            markdown.push_str(&format!("## 기타 {}\n- x\n", i));
        }
        markdown.push_str("## 일정\n- y\n");
        let content = summarize(&markdown);
        assert_eq!(content.slides.len(), 15);
        assert_eq!(content.slides[0].title, "일정");
        // remaining slides keep source order
        assert_eq!(content.slides[1].title, "기타 0");
    }

    #[test]
    fn test_bounds_hold() {
        let mut markdown = String::from("# Big\n");
        for i in 0..10 {
            markdown.push_str(&format!("## Section {}\n", i));
            for j in 0..13 {
                markdown.push_str(&format!("- item {} {}\n", j, "long words ".repeat(j)));
            }
            markdown.push_str("| a | b |\n|---|---|\n");
            for _ in 0..10 {
                markdown.push_str("| 1 | 2 |\n");
            }
        }
        let content = summarize(&markdown);
        assert!(content.slides.len() <= 15);
        for slide in &content.slides {
            assert!(slide.bullets.len() <= 5);
            assert!(slide.key_metrics.len() <= 4);
            assert!((1..=3).contains(&slide.importance));
            for bullet in &slide.bullets {
                assert!(char_len(bullet) <= 60);
            }
            if let Some(table) = &slide.table_data {
                assert!(table.rows.len() <= 6);
            }
        }
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let doc = MarkdownParser::default()
            .parse("---\ndate: 2024\n---\n# T\n## 목표\n- a\n- b\n계약 기간 3개월\n## B\n| x |\n|---|\n| 1 |\n");
        let summarizer = ContentSummarizer::new();
        assert_eq!(summarizer.summarize(&doc), summarizer.summarize(&doc));
    }

    #[test]
    fn test_fallback_table_from_text() {
        let items = vec![
            ContentItem::new(ContentKind::Text, "Name | Cost"),
            ContentItem::new(ContentKind::Text, "A | 10"),
            ContentItem::new(ContentKind::Text, "B | 20 | extra"),
        ];
        let slides = ContentSummarizer::new().summarize_slide(&section("T", items));
        let table = slides[0].table_data.as_ref().unwrap();
        assert_eq!(table.headers, vec!["Name", "Cost"]);
        assert_eq!(table.rows, vec![vec!["A".to_string(), "10".to_string()]]);
    }

    #[test]
    fn test_config_from_json() {
        let config = SummarizerConfig::from_json(r#"{"max_slides": 3, "skip_keywords": ["Draft"]}"#).unwrap();
        assert_eq!(config.max_slides, 3);
        assert_eq!(config.skip_keywords, vec!["Draft"]);
        assert_eq!(config.max_bullets_per_slide, 5);
    }
}
