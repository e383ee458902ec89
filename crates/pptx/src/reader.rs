//! PPTX package reader.
//!
//! Reads the parts needed for style analysis and template reuse: slide size,
//! layouts with their placeholders, and per-slide shape geometry and colors.

use crate::deck::{Frame, LayoutDef, PlaceholderDef, PlaceholderKind};
use mdeck_core::{Error, Result, Rgb};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// What kind of element a shape record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Shape,
    Picture,
    Connector,
    GraphicFrame,
    Group,
}

impl ShapeKind {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(ShapeKind::Shape),
            b"pic" => Some(ShapeKind::Picture),
            b"cxnSp" => Some(ShapeKind::Connector),
            b"graphicFrame" => Some(ShapeKind::GraphicFrame),
            b"grpSp" => Some(ShapeKind::Group),
            _ => None,
        }
    }
}

/// Style facts about one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    pub kind: ShapeKind,
    /// Inside a group shape.
    pub nested: bool,
    pub frame: Option<Frame>,
    /// Solid fill of the shape body.
    pub fill: Option<Rgb>,
    /// Solid outline color.
    pub line: Option<Rgb>,
    /// Explicit RGB colors of text runs.
    pub run_colors: Vec<Rgb>,
    /// Latin typefaces of text runs.
    pub fonts: Vec<String>,
    pub placeholder: Option<(PlaceholderKind, u32)>,
}

impl ShapeRecord {
    fn new(kind: ShapeKind, nested: bool) -> Self {
        Self {
            kind,
            nested,
            frame: None,
            fill: None,
            line: None,
            run_colors: Vec::new(),
            fonts: Vec::new(),
            placeholder: None,
        }
    }
}

/// A layout as found in the package.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRecord {
    pub name: String,
    pub layout_type: String,
    pub shapes: Vec<ShapeRecord>,
}

impl LayoutRecord {
    /// Placeholders with their geometry, falling back to `inherited` frames
    /// (from the master) for placeholders that do not set their own.
    pub fn placeholders(&self, inherited: &[ShapeRecord]) -> Vec<PlaceholderDef> {
        self.shapes
            .iter()
            .filter_map(|shape| {
                let (kind, idx) = shape.placeholder?;
                let frame = shape.frame.or_else(|| master_frame(inherited, kind))?;
                Some(PlaceholderDef { kind, idx, frame })
            })
            .collect()
    }
}

/// The master placeholder a layout placeholder of `kind` inherits from.
fn master_frame(master: &[ShapeRecord], kind: PlaceholderKind) -> Option<Frame> {
    master
        .iter()
        .filter_map(|s| s.placeholder.map(|(k, _)| (k, s.frame)))
        .find(|(k, _)| k.is_title() == kind.is_title())
        .and_then(|(_, frame)| frame)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlideRecord {
    pub part: String,
    pub shapes: Vec<ShapeRecord>,
}

/// The parts of a package relevant to styling.
#[derive(Debug, Clone, PartialEq)]
pub struct PptxPackage {
    /// EMUs.
    pub width: i64,
    /// EMUs.
    pub height: i64,
    pub master_shapes: Vec<ShapeRecord>,
    pub layouts: Vec<LayoutRecord>,
    pub slides: Vec<SlideRecord>,
}

impl PptxPackage {
    /// Layout definitions usable to build a new deck.
    pub fn layout_defs(&self) -> Vec<LayoutDef> {
        self.layouts
            .iter()
            .map(|layout| {
                LayoutDef::new(
                    layout.name.clone(),
                    layout.layout_type.clone(),
                    layout.placeholders(&self.master_shapes),
                )
            })
            .collect()
    }
}

/// A package relationship.
#[derive(Debug, Clone, PartialEq)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

impl Relationship {
    fn is(&self, kind: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(kind)
    }
}

/// Reader for PPTX (Office Open XML) packages.
pub struct PptxReader;

impl PptxReader {
    pub fn new() -> Self {
        Self
    }

    /// Open and read a package from disk.
    pub fn open(&self, path: &Path) -> Result<PptxPackage> {
        let file = File::open(path)?;
        self.read(BufReader::new(file))
    }

    /// Read a package from any seekable source.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<PptxPackage> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let presentation = self.read_file_from_archive(&mut archive, PRESENTATION_PART)?;
        let pres = parse_presentation(&presentation)?;
        let pres_rels = self.read_relationships(&mut archive, PRESENTATION_PART)?;

        let slide_paths = slide_order(&pres, &pres_rels);

        let mut master_shapes = Vec::new();
        let mut layouts = Vec::new();
        let master = pres
            .master_ids
            .first()
            .and_then(|id| pres_rels.iter().find(|r| &r.id == id))
            .or_else(|| pres_rels.iter().find(|r| r.is("slideMaster")));
        if let Some(master) = master {
            let master_path = resolve_target(PRESENTATION_PART, &master.target);
            let master_xml = self.read_file_from_archive(&mut archive, &master_path)?;
            let master_part = scan_part(&master_xml);
            master_shapes = master_part.shapes;

            let master_rels = self.read_relationships(&mut archive, &master_path)?;
            for layout_path in layout_order(&master_part.layout_ids, &master_rels, &master_path) {
                let xml = self.read_file_from_archive(&mut archive, &layout_path)?;
                let part = scan_part(&xml);
                layouts.push(LayoutRecord {
                    name: part.name,
                    layout_type: part.layout_type,
                    shapes: part.shapes,
                });
            }
        }

        let mut slides = Vec::with_capacity(slide_paths.len());
        for path in slide_paths {
            let xml = self.read_file_from_archive(&mut archive, &path)?;
            let part = scan_part(&xml);
            slides.push(SlideRecord {
                part: path,
                shapes: part.shapes,
            });
        }

        log::debug!(
            "Read package: {} layouts, {} slides, size {}x{} EMU",
            layouts.len(),
            slides.len(),
            pres.width,
            pres.height
        );

        Ok(PptxPackage {
            width: pres.width,
            height: pres.height,
            master_shapes,
            layouts,
            slides,
        })
    }

    /// Read the relationships of `part`, or none if it has no rels part.
    fn read_relationships<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        part: &str,
    ) -> Result<Vec<Relationship>> {
        let rels_path = rels_path_for(part);
        if archive.by_name(&rels_path).is_err() {
            return Ok(Vec::new());
        }
        let content = self.read_file_from_archive(archive, &rels_path)?;
        parse_relationships(&content)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::Zip(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::Zip(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Facts from `presentation.xml`.
#[derive(Debug, Default)]
struct PresentationPart {
    width: i64,
    height: i64,
    master_ids: Vec<String>,
    slide_ids: Vec<String>,
}

fn parse_presentation(xml: &str) -> Result<PresentationPart> {
    let mut part = PresentationPart {
        width: crate::deck::inches(crate::deck::DEFAULT_WIDTH_IN),
        height: crate::deck::inches(crate::deck::DEFAULT_HEIGHT_IN),
        ..Default::default()
    };
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sldSz" => {
                        if let Some(cx) = attr_i64(e, b"cx") {
                            part.width = cx;
                        }
                        if let Some(cy) = attr_i64(e, b"cy") {
                            part.height = cy;
                        }
                    }
                    b"sldMasterId" => part.master_ids.extend(attr(e, b"r:id")),
                    b"sldId" => part.slide_ids.extend(attr(e, b"r:id")),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing presentation: {}", e)));
            }
            _ => {}
        }
    }
    Ok(part)
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                };
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"Id" => rel.id = value,
                        _ => {}
                    }
                }
                rels.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }
    Ok(rels)
}

/// Slide part paths in presentation order.
///
/// Uses `p:sldIdLst` when present, otherwise orders slide relationships by
/// the number in their id or target.
fn slide_order(pres: &PresentationPart, rels: &[Relationship]) -> Vec<String> {
    let listed: Vec<String> = pres
        .slide_ids
        .iter()
        .filter_map(|id| rels.iter().find(|r| &r.id == id && r.is("slide")))
        .map(|r| resolve_target(PRESENTATION_PART, &r.target))
        .collect();
    if !listed.is_empty() {
        return listed;
    }

    let mut slides: Vec<(String, Option<usize>)> = rels
        .iter()
        .filter(|r| r.is("slide"))
        .map(|r| {
            let order = extract_slide_number(&r.target).or_else(|| extract_slide_number(&r.id));
            (resolve_target(PRESENTATION_PART, &r.target), order)
        })
        .collect();
    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });
    slides.into_iter().map(|(path, _)| path).collect()
}

/// Layout part paths in master order.
fn layout_order(layout_ids: &[String], rels: &[Relationship], master_path: &str) -> Vec<String> {
    let listed: Vec<String> = layout_ids
        .iter()
        .filter_map(|id| rels.iter().find(|r| &r.id == id && r.is("slideLayout")))
        .map(|r| resolve_target(master_path, &r.target))
        .collect();
    if !listed.is_empty() {
        return listed;
    }

    let mut layouts: Vec<&Relationship> = rels.iter().filter(|r| r.is("slideLayout")).collect();
    layouts.sort_by_key(|r| extract_slide_number(&r.target).unwrap_or(usize::MAX));
    layouts
        .into_iter()
        .map(|r| resolve_target(master_path, &r.target))
        .collect()
}

/// Result of scanning a master, layout, or slide part.
#[derive(Debug, Default)]
struct ScannedPart {
    name: String,
    layout_type: String,
    layout_ids: Vec<String>,
    shapes: Vec<ShapeRecord>,
}

/// Walk a slide-like part and collect its shapes.
///
/// Malformed XML stops the scan; whatever was collected so far is kept.
fn scan_part(xml: &str) -> ScannedPart {
    let mut part = ScannedPart::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    // Open shapes with the stack depth at which they started.
    let mut open: Vec<(usize, ShapeRecord)> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref()).to_vec();
                handle_element(e, &local, &stack, &mut open, &mut part);
                if let Some(kind) = ShapeKind::from_local_name(&local) {
                    if stack.iter().any(|n| n.as_slice() == b"spTree".as_slice()) {
                        let nested = open.iter().any(|(_, s)| s.kind == ShapeKind::Group);
                        open.push((stack.len(), ShapeRecord::new(kind, nested)));
                    }
                }
                stack.push(local);
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref()).to_vec();
                handle_element(e, &local, &stack, &mut open, &mut part);
            }
            Ok(Event::End(_)) => {
                stack.pop();
                if open.last().map(|(depth, _)| *depth) == Some(stack.len()) {
                    if let Some((_, shape)) = open.pop() {
                        part.shapes.push(shape);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error, keeping partial results: {}", e);
                break;
            }
            _ => {}
        }
    }

    part
}

fn handle_element(
    e: &BytesStart<'_>,
    local: &[u8],
    stack: &[Vec<u8>],
    open: &mut [(usize, ShapeRecord)],
    part: &mut ScannedPart,
) {
    let parent = |n: usize| stack.len().checked_sub(n).and_then(|i| stack.get(i)).map(|v| v.as_slice());

    match local {
        b"sldLayout" => {
            if let Some(t) = attr(e, b"type") {
                part.layout_type = t;
            }
        }
        b"cSld" => {
            if let Some(name) = attr(e, b"name") {
                part.name = name;
            }
        }
        b"sldLayoutId" => part.layout_ids.extend(attr(e, b"r:id")),
        _ => {}
    }

    let Some((_, shape)) = open.last_mut() else {
        return;
    };

    match local {
        // Only the first transform of a shape counts.
        b"off" if matches!(parent(1), Some(b"xfrm")) && shape.frame.is_none() => {
            shape.frame = Some(Frame::new(
                attr_i64(e, b"x").unwrap_or(0),
                attr_i64(e, b"y").unwrap_or(0),
                0,
                0,
            ));
        }
        b"ext" if matches!(parent(1), Some(b"xfrm")) => {
            if let Some(frame) = shape.frame.as_mut().filter(|f| f.cx == 0 && f.cy == 0) {
                frame.cx = attr_i64(e, b"cx").unwrap_or(0);
                frame.cy = attr_i64(e, b"cy").unwrap_or(0);
            }
        }
        b"ph" => {
            let kind = PlaceholderKind::from_xml_type(attr(e, b"type").as_deref());
            let idx = attr(e, b"idx").and_then(|v| v.parse().ok()).unwrap_or(0);
            shape.placeholder = Some((kind, idx));
        }
        b"srgbClr" if matches!(parent(1), Some(b"solidFill")) => {
            let Some(color) = attr(e, b"val").and_then(|v| Rgb::from_hex(&v)) else {
                return;
            };
            match (parent(2), parent(3)) {
                (Some(b"spPr"), _) if shape.fill.is_none() => shape.fill = Some(color),
                (Some(b"ln"), Some(b"spPr")) if shape.line.is_none() => shape.line = Some(color),
                (Some(b"rPr"), _) => shape.run_colors.push(color),
                _ => {}
            }
        }
        b"latin" if matches!(parent(1), Some(b"rPr")) => {
            if let Some(face) = attr(e, b"typeface") {
                // Theme font references such as "+mn-lt" are not names.
                if !face.is_empty() && !face.starts_with('+') {
                    shape.fonts.push(face);
                }
            }
        }
        _ => {}
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

fn attr_i64(e: &BytesStart<'_>, key: &[u8]) -> Option<i64> {
    attr(e, key).and_then(|v| v.trim().parse().ok())
}

/// Path of the relationships part for `part`: `a/b.xml` -> `a/_rels/b.xml.rels`.
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns it.
fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part
        .rsplit_once('/')
        .map(|(dir, _)| dir.split('/').collect())
        .unwrap_or_default();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    // Remove common extensions first
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{Deck, Frame, Geometry, Line, Paragraph, RunFormat, Shape, TextBody};
    use std::io::Cursor;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt/presentation.xml", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(
            resolve_target("ppt/slideMasters/slideMaster1.xml", "../slideLayouts/slideLayout2.xml"),
            "ppt/slideLayouts/slideLayout2.xml"
        );
        assert_eq!(resolve_target("ppt/presentation.xml", "/ppt/slides/slide9.xml"), "ppt/slides/slide9.xml");
        assert_eq!(rels_path_for("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
    }

    #[test]
    fn test_scan_shapes() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
            <p:sp><p:nvSpPr><p:cNvPr id="2" name="t"/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>
              <p:spPr><a:xfrm><a:off x="457200" y="914400"/><a:ext cx="1828800" cy="457200"/></a:xfrm>
                <a:solidFill><a:srgbClr val="1E3A8A"/></a:solidFill>
                <a:ln><a:solidFill><a:srgbClr val="E6E6E6"/></a:solidFill></a:ln></p:spPr>
              <p:txBody><a:p><a:r><a:rPr><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill>
                <a:latin typeface="Pretendard"/></a:rPr><a:t>Hi</a:t></a:r></a:p></p:txBody></p:sp>
            <p:grpSp><p:grpSpPr/><p:sp><p:spPr><a:solidFill><a:srgbClr val="00FF00"/></a:solidFill></p:spPr></p:sp></p:grpSp>
        </p:spTree></p:cSld></p:sld>"#;

        let part = scan_part(xml);
        assert_eq!(part.shapes.len(), 3);
        let title = &part.shapes[0];
        assert_eq!(title.kind, ShapeKind::Shape);
        assert_eq!(title.frame, Some(Frame::new(457200, 914400, 1828800, 457200)));
        assert_eq!(title.fill, Some(Rgb(0x1E, 0x3A, 0x8A)));
        assert_eq!(title.line, Some(Rgb(0xE6, 0xE6, 0xE6)));
        assert_eq!(title.run_colors, vec![Rgb::WHITE]);
        assert_eq!(title.fonts, vec!["Pretendard".to_string()]);
        assert_eq!(title.placeholder, Some((PlaceholderKind::Title, 0)));

        let inner = &part.shapes[1];
        assert!(inner.nested);
        assert_eq!(inner.fill, Some(Rgb(0, 255, 0)));
        assert_eq!(part.shapes[2].kind, ShapeKind::Group);
    }

    #[test]
    fn test_scan_keeps_partial_results() {
        let xml = r#"<p:sld><p:cSld><p:spTree><p:sp><p:spPr><a:solidFill><a:srgbClr val="101010"/></a:solidFill></p:spPr></p:sp><p:sp></p:pic>"#;
        let part = scan_part(xml);
        assert_eq!(part.shapes.len(), 1);
        assert_eq!(part.shapes[0].fill, Some(Rgb(16, 16, 16)));
    }

    #[test]
    fn test_read_written_deck() {
        let mut deck = Deck::new();
        deck.add_slide(0);
        let slide = deck.add_slide(6);
        slide.add(Shape::Auto(crate::deck::AutoShape {
            geometry: Geometry::Rect,
            frame: Frame::inches(1.0, 1.0, 2.0, 1.0),
            fill: Some(Rgb(0x3B, 0x82, 0xF6)),
            line: Line::None,
            text: Some(TextBody::single(Paragraph::new("x", RunFormat::new().font("Arial")))),
        }));
        let bytes = deck.to_bytes().unwrap();

        let package = PptxReader::new().read(Cursor::new(bytes)).unwrap();
        assert_eq!(package.width, deck.width);
        assert_eq!(package.layouts.len(), 11);
        assert_eq!(package.layouts[0].name, "Title Slide");
        assert_eq!(package.layouts[6].layout_type, "blank");
        assert_eq!(package.slides.len(), 2);
        assert_eq!(package.slides[1].part, "ppt/slides/slide2.xml");
        assert_eq!(package.slides[1].shapes[0].fill, Some(Rgb(0x3B, 0x82, 0xF6)));

        let defs = package.layout_defs();
        assert_eq!(defs, deck.layouts);
    }
}
