//! Mapping of slide roles to template layouts.
//!
//! Templates name their layouts in whatever language they were authored
//! in, so each role carries several candidate names plus a fallback index
//! into the standard Office layout order.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Purpose a slide layout is needed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutRole {
    Title,
    TitleContent,
    SectionHeader,
    TwoContent,
    Comparison,
    TitleOnly,
    Blank,
    ContentCaption,
}

impl LayoutRole {
    pub const ALL: [LayoutRole; 8] = [
        LayoutRole::Title,
        LayoutRole::TitleContent,
        LayoutRole::SectionHeader,
        LayoutRole::TwoContent,
        LayoutRole::Comparison,
        LayoutRole::TitleOnly,
        LayoutRole::Blank,
        LayoutRole::ContentCaption,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayoutRole::Title => "title",
            LayoutRole::TitleContent => "title_content",
            LayoutRole::SectionHeader => "section_header",
            LayoutRole::TwoContent => "two_content",
            LayoutRole::Comparison => "comparison",
            LayoutRole::TitleOnly => "title_only",
            LayoutRole::Blank => "blank",
            LayoutRole::ContentCaption => "content_caption",
        }
    }
}

impl fmt::Display for LayoutRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Candidate layout names and fallback indices per role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutMapping {
    pub names: BTreeMap<LayoutRole, Vec<String>>,
    pub fallback_indices: BTreeMap<LayoutRole, usize>,
}

impl Default for LayoutMapping {
    fn default() -> Self {
        let table: [(LayoutRole, &[&str]); 8] = [
            (LayoutRole::Title, &["Title Slide", "제목 슬라이드", "표지"]),
            (LayoutRole::TitleContent, &["Title and Content", "제목 및 내용", "제목과 내용"]),
            (LayoutRole::SectionHeader, &["Section Header", "구역 머리글", "섹션 머리글"]),
            (LayoutRole::TwoContent, &["Two Content", "두 개의 콘텐츠", "2단 콘텐츠"]),
            (LayoutRole::Comparison, &["Comparison", "비교", "비교형"]),
            (LayoutRole::TitleOnly, &["Title Only", "제목만", "제목 전용"]),
            (LayoutRole::Blank, &["Blank", "빈 화면", "빈 슬라이드"]),
            (LayoutRole::ContentCaption, &["Content with Caption", "캡션 있는 콘텐츠"]),
        ];

        let names = table
            .iter()
            .map(|(role, names)| (*role, names.iter().map(|n| n.to_string()).collect()))
            .collect();
        let fallback_indices = LayoutRole::ALL.iter().enumerate().map(|(i, role)| (*role, i)).collect();

        Self {
            names,
            fallback_indices,
        }
    }
}

impl LayoutMapping {
    /// Add a candidate name for a role, tried after the existing ones.
    pub fn with_name(mut self, role: LayoutRole, name: impl Into<String>) -> Self {
        self.names.entry(role).or_default().push(name.into());
        self
    }

    /// Set the fallback index for a role.
    pub fn with_fallback(mut self, role: LayoutRole, index: usize) -> Self {
        self.fallback_indices.insert(role, index);
        self
    }

    /// Remove the fallback index for a role.
    pub fn without_fallback(mut self, role: LayoutRole) -> Self {
        self.fallback_indices.remove(&role);
        self
    }
}

/// Chooses a layout index from the layouts a deck actually has.
#[derive(Debug, Clone)]
pub struct LayoutResolver<'a> {
    mapping: &'a LayoutMapping,
    layout_names: Vec<String>,
}

impl<'a> LayoutResolver<'a> {
    pub fn new<I, S>(mapping: &'a LayoutMapping, layout_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mapping,
            layout_names: layout_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Layout names in deck order.
    pub fn list_available_layouts(&self) -> &[String] {
        &self.layout_names
    }

    /// Resolve a role to a layout index.
    ///
    /// Candidate names are compared trimmed and case-insensitively. When
    /// none match, the role's fallback index is used, clamped to the first
    /// layout if the deck is shorter.
    pub fn resolve(&self, role: LayoutRole) -> Result<usize> {
        let unresolved = || Error::LayoutUnresolved {
            role: role.name().to_string(),
            available: self.layout_names.len(),
        };

        if self.layout_names.is_empty() {
            return Err(unresolved());
        }

        if let Some(candidates) = self.mapping.names.get(&role) {
            for candidate in candidates {
                let wanted = candidate.trim().to_lowercase();
                if let Some(index) = self
                    .layout_names
                    .iter()
                    .position(|name| name.trim().to_lowercase() == wanted)
                {
                    return Ok(index);
                }
            }
        }

        let fallback = *self.mapping.fallback_indices.get(&role).ok_or_else(unresolved)?;
        if fallback < self.layout_names.len() {
            log::debug!("No layout named for '{}', using index {}", role, fallback);
            Ok(fallback)
        } else {
            log::warn!(
                "Fallback index {} for '{}' out of range ({} layouts), using first layout",
                fallback,
                role,
                self.layout_names.len()
            );
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_english_name() {
        let mapping = LayoutMapping::default();
        let resolver = LayoutResolver::new(&mapping, ["Blank", "  title and content ", "Title Slide"]);
        assert_eq!(resolver.resolve(LayoutRole::Title).unwrap(), 2);
        assert_eq!(resolver.resolve(LayoutRole::TitleContent).unwrap(), 1);
        assert_eq!(resolver.resolve(LayoutRole::Blank).unwrap(), 0);
    }

    #[test]
    fn test_resolve_by_korean_name() {
        let mapping = LayoutMapping::default();
        let resolver = LayoutResolver::new(&mapping, ["표지", "제목 및 내용", "빈 화면"]);
        assert_eq!(resolver.resolve(LayoutRole::Title).unwrap(), 0);
        assert_eq!(resolver.resolve(LayoutRole::Blank).unwrap(), 2);
    }

    #[test]
    fn test_unknown_names_use_fallback_index() {
        let mapping = LayoutMapping::default();
        let names: Vec<String> = (0..11).map(|i| format!("Layout {}", i)).collect();
        let resolver = LayoutResolver::new(&mapping, names);
        assert_eq!(resolver.resolve(LayoutRole::Blank).unwrap(), 6);
        assert_eq!(resolver.resolve(LayoutRole::TitleOnly).unwrap(), 5);
    }

    #[test]
    fn test_fallback_out_of_range_uses_first() {
        let mapping = LayoutMapping::default();
        let resolver = LayoutResolver::new(&mapping, ["Custom A", "Custom B"]);
        assert_eq!(resolver.resolve(LayoutRole::Blank).unwrap(), 0);
    }

    #[test]
    fn test_no_layouts_is_error() {
        let mapping = LayoutMapping::default();
        let resolver = LayoutResolver::new(&mapping, Vec::<String>::new());
        assert!(matches!(
            resolver.resolve(LayoutRole::Title),
            Err(Error::LayoutUnresolved { available: 0, .. })
        ));
    }

    #[test]
    fn test_missing_fallback_is_error() {
        let mapping = LayoutMapping::default().without_fallback(LayoutRole::Comparison);
        let resolver = LayoutResolver::new(&mapping, ["Custom"]);
        assert!(resolver.resolve(LayoutRole::Comparison).is_err());
    }

    #[test]
    fn test_custom_name() {
        let mapping = LayoutMapping::default().with_name(LayoutRole::Blank, "Empty");
        let resolver = LayoutResolver::new(&mapping, ["Cover", "Empty"]);
        assert_eq!(resolver.resolve(LayoutRole::Blank).unwrap(), 1);
        assert_eq!(resolver.list_available_layouts().len(), 2);
    }
}
