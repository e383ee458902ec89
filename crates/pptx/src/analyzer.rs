//! Learns a [`StyleProfile`] from an existing deck.

use crate::deck::emu_to_inches;
use crate::reader::{PptxPackage, PptxReader, ShapeKind, ShapeRecord};
use mdeck_core::style::{MarginEstimate, ShapeBox};
use mdeck_core::{ColorPalette, Error, FontSettings, LayoutInfo, PlaceholderInfo, Result, StyleProfile};
use std::path::Path;

/// Extracts colors, fonts, layouts, and margins from a `.pptx` file.
#[derive(Debug, Clone, Default)]
pub struct StyleAnalyzer;

impl StyleAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze the deck at `path`.
    pub fn analyze(&self, path: &Path) -> Result<StyleProfile> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let package = PptxReader::new()
            .open(path)
            .map_err(|e| Error::analysis(path, e))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let profile = self.analyze_package(name, &package);

        log::info!(
            "Analyzed {}: {} layouts, {} colors, primary {}",
            path.display(),
            profile.layouts.len(),
            profile.colors.additional_colors.len(),
            profile.colors.primary
        );
        Ok(profile)
    }

    /// Build a profile from an already-read package.
    pub fn analyze_package(&self, name: impl Into<String>, package: &PptxPackage) -> StyleProfile {
        let width = emu_to_inches(package.width);
        let height = emu_to_inches(package.height);

        let (colors, fonts) = collect_styles(package);
        log::debug!("Collected colors {:?} and fonts {:?}", colors, fonts);

        let margins = package
            .slides
            .first()
            .map(|slide| {
                let boxes: Vec<ShapeBox> = top_level(&slide.shapes).filter_map(shape_box).collect();
                MarginEstimate::from_shapes(&boxes, width, height)
            })
            .unwrap_or_default();

        StyleProfile {
            name: name.into(),
            colors: ColorPalette::from_colors(&colors),
            fonts: FontSettings::from_fonts(&fonts),
            layouts: layout_infos(package),
            slide_width: width,
            slide_height: height,
            ..StyleProfile::default()
        }
        .with_margins(margins)
    }
}

fn top_level(shapes: &[ShapeRecord]) -> impl Iterator<Item = &ShapeRecord> {
    shapes.iter().filter(|s| !s.nested)
}

/// Colors (`#RRGGBB`) and font names in first-seen order, without repeats.
fn collect_styles(package: &PptxPackage) -> (Vec<String>, Vec<String>) {
    let mut colors: Vec<String> = Vec::new();
    let mut fonts: Vec<String> = Vec::new();
    for shape in package.slides.iter().flat_map(|s| top_level(&s.shapes)) {
        let has_text = shape.kind == ShapeKind::Shape;
        if has_text {
            if let Some(fill) = shape.fill {
                push_unique(&mut colors, fill.to_string());
            }
        }
        if matches!(shape.kind, ShapeKind::Shape | ShapeKind::Picture | ShapeKind::Connector) {
            if let Some(line) = shape.line {
                push_unique(&mut colors, line.to_string());
            }
        }
        if has_text {
            for font in &shape.fonts {
                push_unique(&mut fonts, font.clone());
            }
            for color in &shape.run_colors {
                push_unique(&mut colors, color.to_string());
            }
        }
    }
    (colors, fonts)
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn layout_infos(package: &PptxPackage) -> Vec<LayoutInfo> {
    package
        .layouts
        .iter()
        .enumerate()
        .map(|(index, layout)| {
            let placeholders = layout
                .placeholders(&package.master_shapes)
                .into_iter()
                .map(|ph| PlaceholderInfo {
                    idx: ph.idx,
                    kind: ph.kind.label().to_string(),
                    left: emu_to_inches(ph.frame.x),
                    top: emu_to_inches(ph.frame.y),
                    width: emu_to_inches(ph.frame.cx),
                    height: emu_to_inches(ph.frame.cy),
                })
                .collect();
            LayoutInfo::new(layout.name.clone(), index, placeholders)
        })
        .collect()
}

fn shape_box(shape: &ShapeRecord) -> Option<ShapeBox> {
    let frame = shape.frame?;
    Some(ShapeBox {
        left: emu_to_inches(frame.x),
        top: emu_to_inches(frame.y),
        width: emu_to_inches(frame.cx),
        height: emu_to_inches(frame.cy),
    })
}
