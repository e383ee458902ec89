//! Serializes a [`Deck`] into a PresentationML package.
//!
//! Parts are built as strings with `write!` and stored in a ZIP archive.
//! The package contains one slide master, one theme, the deck's layouts,
//! its slides, and any embedded media.

use crate::deck::{
    Align, Anchor, AutoShape, Deck, DeckTheme, Frame, LayoutDef, Line, Paragraph, Picture,
    Placeholder, PlaceholderKind, RunFormat, Shape, Slide, Table, TextBody, TextBox,
};
use mdeck_core::{Error, Result, Rgb};
use std::fmt::{self, Write as FmtWrite};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_PML: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CT_MAIN: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_PRES_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
const CT_VIEW_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
const CT_TABLE_STYLES: &str = "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_APP: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// Id of the first slide layout under the master; masters start at 2147483648.
const FIRST_LAYOUT_ID: u64 = 2_147_483_649;

/// Escape XML special characters and drop characters XML 1.0 forbids.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

fn xml_err(e: fmt::Error) -> Error {
    Error::Xml(e.to_string())
}

/// An image part collected while writing slides.
struct MediaPart<'a> {
    name: String,
    data: &'a [u8],
}

/// Writes decks as `.pptx` archives.
#[derive(Debug, Clone)]
pub struct PptxWriter {
    application: String,
}

impl Default for PptxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PptxWriter {
    pub fn new() -> Self {
        Self {
            application: "mdeck".to_string(),
        }
    }

    /// Write the package for `deck` to `out`.
    pub fn write<W: Write + Seek>(&self, deck: &Deck, out: W) -> Result<()> {
        let mut zip = ZipWriter::new(out);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut put = |name: &str, content: &[u8]| -> Result<()> {
            zip.start_file(name, options)
                .map_err(|e| Error::Zip(format!("Failed to start '{}': {}", name, e)))?;
            zip.write_all(content)?;
            Ok(())
        };

        put("[Content_Types].xml", content_types(deck).map_err(xml_err)?.as_bytes())?;
        put("_rels/.rels", root_rels().as_bytes())?;
        put("docProps/app.xml", app_props(&self.application, deck).map_err(xml_err)?.as_bytes())?;
        put("docProps/core.xml", core_props(deck).map_err(xml_err)?.as_bytes())?;
        put("ppt/presentation.xml", presentation(deck).map_err(xml_err)?.as_bytes())?;
        put("ppt/_rels/presentation.xml.rels", presentation_rels(deck).map_err(xml_err)?.as_bytes())?;
        put("ppt/presProps.xml", pres_props().as_bytes())?;
        put("ppt/viewProps.xml", view_props().as_bytes())?;
        put("ppt/tableStyles.xml", table_styles().as_bytes())?;
        put("ppt/theme/theme1.xml", theme(&deck.theme).map_err(xml_err)?.as_bytes())?;
        put("ppt/slideMasters/slideMaster1.xml", slide_master(deck).map_err(xml_err)?.as_bytes())?;
        put(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            master_rels(deck.layouts.len()).map_err(xml_err)?.as_bytes(),
        )?;

        for (i, layout) in deck.layouts.iter().enumerate() {
            let n = i + 1;
            put(
                &format!("ppt/slideLayouts/slideLayout{}.xml", n),
                slide_layout(layout).map_err(xml_err)?.as_bytes(),
            )?;
            put(&format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", n), layout_rels().as_bytes())?;
        }

        let mut media_count = 0;
        for (i, slide) in deck.slides.iter().enumerate() {
            let n = i + 1;
            let mut media = Vec::new();
            let xml = slide_xml(deck, slide, &mut media_count, &mut media).map_err(xml_err)?;
            put(&format!("ppt/slides/slide{}.xml", n), xml.as_bytes())?;
            put(
                &format!("ppt/slides/_rels/slide{}.xml.rels", n),
                slide_rels(slide, &media).map_err(xml_err)?.as_bytes(),
            )?;
            for part in &media {
                put(&format!("ppt/media/{}", part.name), part.data)?;
            }
        }

        zip.finish()
            .map_err(|e| Error::Zip(format!("Failed to finish archive: {}", e)))?;
        log::debug!(
            "Wrote package with {} layouts, {} slides, {} images",
            deck.layouts.len(),
            deck.slides.len(),
            media_count
        );
        Ok(())
    }
}

impl Deck {
    /// Serialize the deck to `.pptx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        PptxWriter::new().write(self, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write the deck to `path`, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        log::info!("Saved {} slides to {}", self.slides.len(), path.display());
        Ok(())
    }
}

fn content_types(deck: &Deck) -> std::result::Result<String, fmt::Error> {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for format in crate::deck::ImageFormat::ALL {
        write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.content_type()
        )?;
    }

    let mut over = |part: String, ct: &str| write!(xml, r#"<Override PartName="{}" ContentType="{}"/>"#, part, ct);
    over("/ppt/presentation.xml".into(), CT_MAIN)?;
    over("/ppt/slideMasters/slideMaster1.xml".into(), CT_MASTER)?;
    for n in 1..=deck.layouts.len() {
        over(format!("/ppt/slideLayouts/slideLayout{}.xml", n), CT_LAYOUT)?;
    }
    for n in 1..=deck.slides.len() {
        over(format!("/ppt/slides/slide{}.xml", n), CT_SLIDE)?;
    }
    over("/ppt/theme/theme1.xml".into(), CT_THEME)?;
    over("/ppt/presProps.xml".into(), CT_PRES_PROPS)?;
    over("/ppt/viewProps.xml".into(), CT_VIEW_PROPS)?;
    over("/ppt/tableStyles.xml".into(), CT_TABLE_STYLES)?;
    over("/docProps/core.xml".into(), CT_CORE)?;
    over("/docProps/app.xml".into(), CT_APP)?;
    xml.push_str("</Types>");
    Ok(xml)
}

fn root_rels() -> String {
    format!(
        concat!(
            "{decl}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
            "<Relationship Id=\"rId1\" Type=\"{base}/officeDocument\" Target=\"ppt/presentation.xml\"/>",
            "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>",
            "<Relationship Id=\"rId3\" Type=\"{base}/extended-properties\" Target=\"docProps/app.xml\"/>",
            "</Relationships>"
        ),
        decl = XML_DECL,
        base = REL_BASE
    )
}

fn app_props(application: &str, deck: &Deck) -> std::result::Result<String, fmt::Error> {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#);
    write!(xml, "<Application>{}</Application>", escape_xml(application))?;
    write!(xml, "<Slides>{}</Slides>", deck.slides.len())?;
    xml.push_str("</Properties>");
    Ok(xml)
}

fn core_props(deck: &Deck) -> std::result::Result<String, fmt::Error> {
    let props = &deck.properties;
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    write!(xml, "<dc:title>{}</dc:title>", escape_xml(&props.title))?;
    if !props.creator.is_empty() {
        write!(xml, "<dc:creator>{}</dc:creator>", escape_xml(&props.creator))?;
    }
    if let Some(created) = &props.created {
        let created = escape_xml(created);
        write!(xml, r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#, created)?;
        write!(xml, r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>"#, created)?;
    }
    xml.push_str("</cp:coreProperties>");
    Ok(xml)
}

fn presentation(deck: &Deck) -> std::result::Result<String, fmt::Error> {
    let mut xml = String::from(XML_DECL);
    write!(xml, r#"<p:presentation {} saveSubsetFonts="1">"#, NS_PML)?;
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    if !deck.slides.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for i in 0..deck.slides.len() {
            write!(xml, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2)?;
        }
        xml.push_str("</p:sldIdLst>");
    }
    write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, deck.width, deck.height)?;
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    Ok(xml)
}

fn presentation_rels(deck: &Deck) -> std::result::Result<String, fmt::Error> {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    write!(
        xml,
        r#"<Relationship Id="rId1" Type="{}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
        REL_BASE
    )?;
    for i in 0..deck.slides.len() {
        write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}/slide" Target="slides/slide{}.xml"/>"#,
            i + 2,
            REL_BASE,
            i + 1
        )?;
    }
    let next = deck.slides.len() + 2;
    for (offset, (kind, target)) in [
        ("presProps", "presProps.xml"),
        ("viewProps", "viewProps.xml"),
        ("theme", "theme/theme1.xml"),
        ("tableStyles", "tableStyles.xml"),
    ]
    .iter()
    .enumerate()
    {
        write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}/{}" Target="{}"/>"#,
            next + offset,
            REL_BASE,
            kind,
            target
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn pres_props() -> String {
    format!("{}<p:presentationPr {}/>", XML_DECL, NS_PML)
}

fn view_props() -> String {
    format!(
        r#"{}<p:viewPr {}><p:normalViewPr><p:restoredLeft sz="15620"/><p:restoredTop sz="94660"/></p:normalViewPr><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#,
        XML_DECL, NS_PML
    )
}

fn table_styles() -> String {
    format!(
        r#"{}<a:tblStyleLst xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
        XML_DECL
    )
}

fn theme(theme: &DeckTheme) -> std::result::Result<String, fmt::Error> {
    let mut xml = String::from(XML_DECL);
    write!(
        xml,
        r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="{}"><a:themeElements>"#,
        escape_xml(&theme.name)
    )?;

    write!(xml, r#"<a:clrScheme name="{}">"#, escape_xml(&theme.name))?;
    write!(xml, r#"<a:dk1><a:srgbClr val="{}"/></a:dk1>"#, theme.dark.to_hex())?;
    write!(xml, r#"<a:lt1><a:srgbClr val="{}"/></a:lt1>"#, theme.light.to_hex())?;
    write!(xml, r#"<a:dk2><a:srgbClr val="{}"/></a:dk2>"#, theme.dark2.to_hex())?;
    write!(xml, r#"<a:lt2><a:srgbClr val="{}"/></a:lt2>"#, theme.light2.to_hex())?;
    for (i, accent) in theme.accents.iter().enumerate() {
        write!(xml, r#"<a:accent{n}><a:srgbClr val="{}"/></a:accent{n}>"#, accent.to_hex(), n = i + 1)?;
    }
    xml.push_str(r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#);
    xml.push_str("</a:clrScheme>");

    write!(xml, r#"<a:fontScheme name="{}">"#, escape_xml(&theme.name))?;
    for (tag, latin) in [("majorFont", &theme.major_font), ("minorFont", &theme.minor_font)] {
        write!(
            xml,
            r#"<a:{tag}><a:latin typeface="{}"/><a:ea typeface="{}"/><a:cs typeface=""/></a:{tag}>"#,
            escape_xml(latin),
            escape_xml(&theme.east_asian_font),
            tag = tag
        )?;
    }
    xml.push_str("</a:fontScheme>");

    xml.push_str(concat!(
        r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"><a:tint val="50000"/></a:schemeClr></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"><a:shade val="80000"/></a:schemeClr></a:solidFill>"#,
        r#"</a:fillStyleLst><a:lnStyleLst>"#,
        r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
        r#"<a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
        r#"<a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
        r#"</a:lnStyleLst><a:effectStyleLst>"#,
        r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
        r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
        r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
        r#"</a:effectStyleLst><a:bgFillStyleLst>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"><a:tint val="95000"/></a:schemeClr></a:solidFill>"#,
        r#"<a:solidFill><a:schemeClr val="phClr"><a:shade val="90000"/></a:schemeClr></a:solidFill>"#,
        r#"</a:bgFillStyleLst></a:fmtScheme>"#,
    ));
    xml.push_str("</a:themeElements></a:theme>");
    Ok(xml)
}

fn write_group_header(xml: &mut String) {
    xml.push_str(concat!(
        r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
        r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
        r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
    ));
}

fn write_xfrm(xml: &mut String, tag: &str, frame: Frame) -> fmt::Result {
    write!(
        xml,
        r#"<{tag}><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></{tag}>"#,
        frame.x,
        frame.y,
        frame.cx.max(0),
        frame.cy.max(0),
        tag = tag
    )
}

fn write_solid_fill(xml: &mut String, color: Rgb) -> fmt::Result {
    write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color.to_hex())
}

fn write_ph(xml: &mut String, kind: PlaceholderKind, idx: u32) -> fmt::Result {
    xml.push_str("<p:ph");
    if let Some(t) = kind.xml_type() {
        write!(xml, r#" type="{}""#, t)?;
    }
    if idx != 0 {
        write!(xml, r#" idx="{}""#, idx)?;
    }
    xml.push_str("/>");
    Ok(())
}

fn placeholder_name(kind: PlaceholderKind) -> &'static str {
    match kind {
        PlaceholderKind::Title | PlaceholderKind::CenterTitle => "Title",
        PlaceholderKind::Subtitle => "Subtitle",
        PlaceholderKind::Body => "Text Placeholder",
        PlaceholderKind::Object => "Content Placeholder",
        PlaceholderKind::Picture => "Picture Placeholder",
        PlaceholderKind::Date => "Date Placeholder",
        PlaceholderKind::Footer => "Footer Placeholder",
        PlaceholderKind::SlideNumber => "Slide Number Placeholder",
    }
}

fn write_run_props(xml: &mut String, tag: &str, format: &RunFormat) -> fmt::Result {
    write!(xml, r#"<a:{} lang="ko-KR" altLang="en-US""#, tag)?;
    if let Some(size) = format.size {
        write!(xml, r#" sz="{}""#, (size * 100.0).round() as u32)?;
    }
    if format.bold {
        xml.push_str(r#" b="1""#);
    }
    if format.italic {
        xml.push_str(r#" i="1""#);
    }
    xml.push_str(r#" dirty="0""#);

    if format.color.is_none() && format.font.is_none() {
        xml.push_str("/>");
        return Ok(());
    }
    xml.push('>');
    if let Some(color) = format.color {
        write_solid_fill(xml, color)?;
    }
    if let Some(font) = &format.font {
        let font = escape_xml(font);
        write!(xml, r#"<a:latin typeface="{0}"/><a:ea typeface="{0}"/>"#, font)?;
    }
    write!(xml, "</a:{}>", tag)
}

fn write_paragraph(xml: &mut String, paragraph: &Paragraph) -> fmt::Result {
    xml.push_str("<a:p>");

    let has_attrs = paragraph.align.is_some() || paragraph.level > 0;
    if has_attrs || paragraph.line_spacing.is_some() {
        xml.push_str("<a:pPr");
        if paragraph.level > 0 {
            write!(xml, r#" lvl="{}""#, paragraph.level.min(8))?;
        }
        if let Some(align) = paragraph.align {
            let algn = match align {
                Align::Left => "l",
                Align::Center => "ctr",
                Align::Right => "r",
            };
            write!(xml, r#" algn="{}""#, algn)?;
        }
        match paragraph.line_spacing {
            Some(spacing) => write!(
                xml,
                r#"><a:lnSpc><a:spcPct val="{}"/></a:lnSpc></a:pPr>"#,
                (spacing * 100_000.0).round() as u32
            )?,
            None => xml.push_str("/>"),
        }
    }

    if paragraph.text.is_empty() {
        write_run_props(xml, "endParaRPr", &paragraph.format)?;
    } else {
        for (i, line) in paragraph.text.split('\n').enumerate() {
            if i > 0 {
                xml.push_str("<a:br>");
                write_run_props(xml, "rPr", &paragraph.format)?;
                xml.push_str("</a:br>");
            }
            if line.is_empty() {
                continue;
            }
            xml.push_str("<a:r>");
            write_run_props(xml, "rPr", &paragraph.format)?;
            write!(xml, "<a:t>{}</a:t></a:r>", escape_xml(line))?;
        }
    }
    xml.push_str("</a:p>");
    Ok(())
}

fn write_text_body(xml: &mut String, tag: &str, body: &TextBody) -> fmt::Result {
    let anchor = match body.anchor {
        Anchor::Top => "t",
        Anchor::Middle => "ctr",
        Anchor::Bottom => "b",
    };
    let wrap = if body.word_wrap { "square" } else { "none" };
    write!(
        xml,
        r#"<{tag}><a:bodyPr wrap="{}" rtlCol="0" anchor="{}"/><a:lstStyle/>"#,
        wrap,
        anchor,
        tag = tag
    )?;
    if body.paragraphs.is_empty() {
        xml.push_str("<a:p/>");
    }
    for paragraph in &body.paragraphs {
        write_paragraph(xml, paragraph)?;
    }
    write!(xml, "</{}>", tag)
}

fn write_empty_text_body(xml: &mut String) {
    xml.push_str(r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody>"#);
}

fn slide_master(deck: &Deck) -> std::result::Result<String, fmt::Error> {
    let margin = deck.width / 16;
    let content_width = deck.width - 2 * margin;

    let mut xml = String::from(XML_DECL);
    write!(xml, "<p:sldMaster {}>", NS_PML)?;
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>"#);
    write_group_header(&mut xml);

    let regions = [
        (PlaceholderKind::Title, 0, Frame::new(margin, deck.height / 20, content_width, deck.height * 18 / 100)),
        (PlaceholderKind::Body, 1, Frame::new(margin, deck.height / 4, content_width, deck.height * 58 / 100)),
    ];
    for (i, (kind, idx, frame)) in regions.into_iter().enumerate() {
        write!(
            xml,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{} {}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>"#,
            i + 2,
            placeholder_name(kind),
            i + 1
        )?;
        write_ph(&mut xml, kind, idx)?;
        xml.push_str("</p:nvPr></p:nvSpPr><p:spPr>");
        write_xfrm(&mut xml, "a:xfrm", frame)?;
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#);
        write_empty_text_body(&mut xml);
        xml.push_str("</p:sp>");
    }
    xml.push_str("</p:spTree></p:cSld>");

    xml.push_str(concat!(
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
        r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
    ));
    xml.push_str("<p:sldLayoutIdLst>");
    for i in 0..deck.layouts.len() {
        write!(xml, r#"<p:sldLayoutId id="{}" r:id="rId{}"/>"#, FIRST_LAYOUT_ID + i as u64, i + 1)?;
    }
    xml.push_str("</p:sldLayoutIdLst>");

    xml.push_str(concat!(
        "<p:txStyles>",
        r#"<p:titleStyle><a:lvl1pPr algn="l"><a:defRPr sz="4400" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill>"#,
        r#"<a:latin typeface="+mj-lt"/><a:ea typeface="+mj-ea"/><a:cs typeface="+mj-cs"/></a:defRPr></a:lvl1pPr></p:titleStyle>"#,
        r#"<p:bodyStyle><a:lvl1pPr marL="228600" indent="-228600"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/>"#,
        r#"<a:defRPr sz="2800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill>"#,
        r#"<a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl1pPr></p:bodyStyle>"#,
        r#"<p:otherStyle><a:lvl1pPr><a:defRPr sz="1800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill>"#,
        r#"<a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl1pPr></p:otherStyle>"#,
        "</p:txStyles>",
    ));
    xml.push_str("</p:sldMaster>");
    Ok(xml)
}

fn master_rels(layout_count: usize) -> std::result::Result<String, fmt::Error> {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    for i in 0..layout_count {
        write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}/slideLayout" Target="../slideLayouts/slideLayout{}.xml"/>"#,
            i + 1,
            REL_BASE,
            i + 1
        )?;
    }
    write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{}/theme" Target="../theme/theme1.xml"/>"#,
        layout_count + 1,
        REL_BASE
    )?;
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn slide_layout(layout: &LayoutDef) -> std::result::Result<String, fmt::Error> {
    let mut xml = String::from(XML_DECL);
    write!(xml, "<p:sldLayout {}", NS_PML)?;
    if !layout.layout_type.is_empty() {
        write!(xml, r#" type="{}""#, escape_xml(&layout.layout_type))?;
    }
    write!(xml, r#" preserve="1"><p:cSld name="{}"><p:spTree>"#, escape_xml(&layout.name))?;
    write_group_header(&mut xml);

    for (i, ph) in layout.placeholders.iter().enumerate() {
        write!(
            xml,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{} {}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>"#,
            i + 2,
            placeholder_name(ph.kind),
            i + 1
        )?;
        write_ph(&mut xml, ph.kind, ph.idx)?;
        xml.push_str("</p:nvPr></p:nvSpPr><p:spPr>");
        write_xfrm(&mut xml, "a:xfrm", ph.frame)?;
        xml.push_str("</p:spPr>");
        write_empty_text_body(&mut xml);
        xml.push_str("</p:sp>");
    }

    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    Ok(xml)
}

fn layout_rels() -> String {
    format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#,
        XML_DECL, REL_BASE
    )
}

fn slide_xml<'a>(
    deck: &Deck,
    slide: &'a Slide,
    media_count: &mut usize,
    media: &mut Vec<MediaPart<'a>>,
) -> std::result::Result<String, fmt::Error> {
    let mut xml = String::from(XML_DECL);
    write!(xml, "<p:sld {}><p:cSld>", NS_PML)?;
    if let Some(color) = slide.background {
        xml.push_str("<p:bg><p:bgPr>");
        write_solid_fill(&mut xml, color)?;
        xml.push_str("<a:effectLst/></p:bgPr></p:bg>");
    }
    xml.push_str("<p:spTree>");
    write_group_header(&mut xml);

    for (i, shape) in slide.shapes.iter().enumerate() {
        let id = i + 2;
        match shape {
            Shape::Auto(auto) => write_auto_shape(&mut xml, id, auto)?,
            Shape::TextBox(text_box) => write_text_box(&mut xml, id, text_box)?,
            Shape::Table(table) => write_table(&mut xml, id, table)?,
            Shape::Placeholder(ph) => write_placeholder(&mut xml, id, ph, deck, slide.layout)?,
            Shape::Picture(picture) => {
                *media_count += 1;
                media.push(MediaPart {
                    name: format!("image{}.{}", media_count, picture.format.extension()),
                    data: &picture.data,
                });
                // rId1 is the layout, images follow in order.
                write_picture(&mut xml, id, picture, media.len() + 1)?;
            }
        }
    }

    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    Ok(xml)
}

fn slide_rels(slide: &Slide, media: &[MediaPart<'_>]) -> std::result::Result<String, fmt::Error> {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    write!(
        xml,
        r#"<Relationship Id="rId1" Type="{}/slideLayout" Target="../slideLayouts/slideLayout{}.xml"/>"#,
        REL_BASE,
        slide.layout + 1
    )?;
    for (i, part) in media.iter().enumerate() {
        write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}/image" Target="../media/{}"/>"#,
            i + 2,
            REL_BASE,
            part.name
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn write_auto_shape(xml: &mut String, id: usize, shape: &AutoShape) -> fmt::Result {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="Shape {}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>"#,
        id,
        id - 1
    )?;
    write_xfrm(xml, "a:xfrm", shape.frame)?;
    write!(xml, r#"<a:prstGeom prst="{}"><a:avLst/></a:prstGeom>"#, shape.geometry.preset())?;
    match shape.fill {
        Some(color) => write_solid_fill(xml, color)?,
        None => xml.push_str("<a:noFill/>"),
    }
    match shape.line {
        Line::None => xml.push_str("<a:ln><a:noFill/></a:ln>"),
        Line::Solid { color, width_pt } => {
            write!(xml, r#"<a:ln w="{}">"#, (width_pt * 12_700.0).round() as i64)?;
            write_solid_fill(xml, color)?;
            xml.push_str("</a:ln>");
        }
    }
    xml.push_str("</p:spPr>");
    if let Some(body) = &shape.text {
        write_text_body(xml, "p:txBody", body)?;
    }
    xml.push_str("</p:sp>");
    Ok(())
}

fn write_text_box(xml: &mut String, id: usize, text_box: &TextBox) -> fmt::Result {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="TextBox {}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#,
        id,
        id - 1
    )?;
    write_xfrm(xml, "a:xfrm", text_box.frame)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    match text_box.fill {
        Some(color) => write_solid_fill(xml, color)?,
        None => xml.push_str("<a:noFill/>"),
    }
    xml.push_str("</p:spPr>");
    write_text_body(xml, "p:txBody", &text_box.body)?;
    xml.push_str("</p:sp>");
    Ok(())
}

fn write_placeholder(
    xml: &mut String,
    id: usize,
    ph: &Placeholder,
    deck: &Deck,
    layout: usize,
) -> fmt::Result {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{} {}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>"#,
        id,
        placeholder_name(ph.kind),
        id - 1
    )?;
    write_ph(xml, ph.kind, ph.idx)?;
    xml.push_str("</p:nvPr></p:nvSpPr>");

    // Geometry is inherited from the layout; spell it out for readers that
    // do not follow inheritance.
    let frame = deck
        .layouts
        .get(layout)
        .and_then(|def| def.placeholders.iter().find(|p| p.idx == ph.idx && p.kind == ph.kind))
        .map(|def| def.frame);
    match frame {
        Some(frame) => {
            xml.push_str("<p:spPr>");
            write_xfrm(xml, "a:xfrm", frame)?;
            xml.push_str("</p:spPr>");
        }
        None => xml.push_str("<p:spPr/>"),
    }

    match &ph.body {
        Some(body) => write_text_body(xml, "p:txBody", body)?,
        None => write_empty_text_body(xml),
    }
    xml.push_str("</p:sp>");
    Ok(())
}

fn write_picture(xml: &mut String, id: usize, picture: &Picture, rel_id: usize) -> fmt::Result {
    write!(
        xml,
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="Picture {}" descr="{}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
        id,
        id - 1,
        escape_xml(&picture.description)
    )?;
    write!(
        xml,
        r#"<p:blipFill><a:blip r:embed="rId{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>"#,
        rel_id
    )?;
    write_xfrm(xml, "a:xfrm", picture.frame)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
    Ok(())
}

fn write_table(xml: &mut String, id: usize, table: &Table) -> fmt::Result {
    write!(
        xml,
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{}" name="Table {}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr>"#,
        id,
        id - 1
    )?;
    write_xfrm(xml, "p:xfrm", table.frame)?;
    xml.push_str(r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr firstRow="1" bandRow="1"/><a:tblGrid>"#);
    for width in &table.column_widths {
        write!(xml, r#"<a:gridCol w="{}"/>"#, width)?;
    }
    xml.push_str("</a:tblGrid>");

    for row in &table.rows {
        write!(xml, r#"<a:tr h="{}">"#, table.row_height)?;
        for cell in row {
            xml.push_str("<a:tc>");
            let mut paragraph = Paragraph::new(cell.text.clone(), cell.format.clone());
            paragraph.align = cell.align;
            write_text_body(xml, "a:txBody", &TextBody::single(paragraph))?;
            xml.push_str(r#"<a:tcPr anchor="ctr">"#);
            if let Some(fill) = cell.fill {
                write_solid_fill(xml, fill)?;
            }
            xml.push_str("</a:tcPr></a:tc>");
        }
        xml.push_str("</a:tr>");
    }
    xml.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{Geometry, TableCell};
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn sample_deck() -> Deck {
        let mut deck = Deck::new();
        deck.properties.title = "Q3 <Review>".to_string();
        let slide = deck.add_slide(6);
        slide.background = Some(Rgb(33, 33, 33));
        slide.add_block(Geometry::Rect, Frame::inches(0.0, 0.0, 13.333, 0.08), Rgb(0, 112, 192));
        slide.add_text_box(
            Frame::inches(0.5, 0.5, 12.0, 0.6),
            TextBody::single(Paragraph::new(
                "Line one\nLine & two",
                RunFormat::new().font("맑은 고딕").size(32.0).bold().color(Rgb::WHITE),
            )),
        );
        deck
    }

    #[test]
    fn test_package_parts() {
        let bytes = sample_deck().to_bytes().unwrap();
        let archive = ZipArchive::new(Cursor::new(&bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout11.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/_rels/slide1.xml.rels",
            "ppt/theme/theme1.xml",
            "docProps/core.xml",
        ] {
            assert!(names.contains(&part), "missing {}", part);
        }
    }

    #[test]
    fn test_slide_content() {
        let bytes = sample_deck().to_bytes().unwrap();
        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        assert!(slide.contains(r#"<a:srgbClr val="212121"/>"#));
        assert!(slide.contains(r#"prst="rect""#));
        assert!(slide.contains("<a:t>Line &amp; two</a:t>"));
        assert!(slide.contains("<a:br>"));
        assert!(slide.contains(r#"sz="3200" b="1""#));
        assert!(slide.contains(r#"<a:latin typeface="맑은 고딕"/>"#));

        let rels = read_part(&bytes, "ppt/slides/_rels/slide1.xml.rels");
        assert!(rels.contains("slideLayout7.xml"));

        let core = read_part(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>Q3 &lt;Review&gt;</dc:title>"));
    }

    #[test]
    fn test_presentation_lists_slides() {
        let mut deck = sample_deck();
        deck.add_slide(1);
        let bytes = deck.to_bytes().unwrap();
        let pres = read_part(&bytes, "ppt/presentation.xml");
        assert!(pres.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
        assert!(pres.contains(r#"<p:sldId id="257" r:id="rId3"/>"#));
        assert!(pres.contains(r#"<p:sldSz cx="12191695" cy="6858000"/>"#));
    }

    #[test]
    fn test_table_and_picture() {
        let mut deck = Deck::new();
        let cell = |text: &str| TableCell {
            text: text.to_string(),
            format: RunFormat::new().size(14.0),
            align: Some(Align::Center),
            fill: Some(Rgb(245, 245, 245)),
        };
        let png = vec![0x89, b'P', b'N', b'G', 0, 0, 0, 0];
        let slide = deck.add_slide(6);
        slide.add(Shape::Table(Table {
            frame: Frame::inches(0.5, 1.5, 12.0, 1.0),
            column_widths: vec![crate::deck::inches(6.0); 2],
            row_height: crate::deck::inches(0.5),
            rows: vec![vec![cell("A"), cell("B")], vec![cell("1"), cell("2")]],
        }));
        slide.add(Shape::Picture(Picture {
            frame: Frame::inches(5.0, 2.0, 4.0, 3.0),
            description: "chart".to_string(),
            data: png,
            format: crate::deck::ImageFormat::Png,
        }));

        let bytes = deck.to_bytes().unwrap();
        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        assert_eq!(slide.matches("<a:tc>").count(), 4);
        assert!(slide.contains(r#"<a:blip r:embed="rId2"/>"#));
        let rels = read_part(&bytes, "ppt/slides/_rels/slide1.xml.rels");
        assert!(rels.contains("../media/image1.png"));
        let mut archive = ZipArchive::new(Cursor::new(&bytes)).unwrap();
        let mut media = Vec::new();
        archive.by_name("ppt/media/image1.png").unwrap().read_to_end(&mut media).unwrap();
        assert_eq!(media, vec![0x89, b'P', b'N', b'G', 0, 0, 0, 0]);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&\"'"), "a&lt;b&gt;&amp;&quot;&apos;");
    }

    #[test]
    fn test_escape_xml_drops_control_chars() {
        assert_eq!(escape_xml("a\u{0B}b\u{01}c\u{FFFF}"), "abc");
        assert_eq!(escape_xml("tab\there\nline\r"), "tab\there\nline\r");
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deck.pptx");
        sample_deck().save(&path).unwrap();
        assert!(path.exists());
    }
}
