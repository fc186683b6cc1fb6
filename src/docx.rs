//! WordprocessingML (DOCX) renderer.
//!
//! Rendering happens in two stages: [`build_document`] maps a transcript to
//! a small paragraph/run model, and [`Document::to_bytes`] serializes that
//! model into the XML parts of a DOCX package. Pagination, the running
//! header and the page-numbered footer are left to the word processor.

use std::io::{Cursor, Write};

use chrono::{DateTime, Local, Utc};
use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::block::{Block, Run, RunStyle};
use crate::config::{Color, Config};
use crate::error::ExportError;
use crate::inline::format_inline;
use crate::transcript::{ExportOptions, Section, Transcript};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// Left indent for quotes and lists, in twentieths of a point.
const INDENT_TWIPS: u32 = 720;

/// Numbering instance shared by every bulleted list.
const BULLET_NUM_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Title,
    Subtitle,
    Heading(u8),
    Normal,
    Code,
    Quote,
    ListParagraph,
}

impl ParagraphStyle {
    fn style_id(self) -> Option<String> {
        match self {
            ParagraphStyle::Title => Some("Title".to_string()),
            ParagraphStyle::Subtitle => Some("Subtitle".to_string()),
            ParagraphStyle::Heading(level) => Some(format!("Heading{level}")),
            ParagraphStyle::Normal => None,
            ParagraphStyle::Code => Some("Code".to_string()),
            ParagraphStyle::Quote => Some("Quote".to_string()),
            ParagraphStyle::ListParagraph => Some("ListParagraph".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    Bullet,
    /// Decimal numbering; each list has its own instance so it restarts at 1.
    Ordered { num_id: u32 },
}

impl Numbering {
    fn num_id(self) -> u32 {
        match self {
            Numbering::Bullet => BULLET_NUM_ID,
            Numbering::Ordered { num_id } => num_id,
        }
    }
}

/// A run of text with direct formatting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub monospace: bool,
    pub color: Option<Color>,
    /// Size in half-points.
    pub size: Option<u32>,
    pub shading: Option<Color>,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    fn size_pt(mut self, points: f64) -> Self {
        self.size = Some(half_points(points));
        self
    }

    /// Map an inline run onto direct formatting.
    fn from_run(run: &Run, config: &Config) -> Self {
        let mut text_run = TextRun::new(run.text.clone());
        text_run.bold = run.style.is_bold();
        text_run.italic = run.style.is_italic();
        if run.style == RunStyle::Code {
            text_run.monospace = true;
            text_run.shading = Some(config.palette.code_background);
        }
        text_run
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub centered: bool,
    pub numbering: Option<Numbering>,
    pub shading: Option<Color>,
    pub left_border: Option<Color>,
    pub bottom_border: Option<Color>,
    pub indent: Option<u32>,
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    pub fn new(style: ParagraphStyle) -> Self {
        Self {
            style,
            centered: false,
            numbering: None,
            shading: None,
            left_border: None,
            bottom_border: None,
            indent: None,
            runs: Vec::new(),
        }
    }

    fn centered(mut self) -> Self {
        self.centered = true;
        self
    }

    fn run(mut self, run: TextRun) -> Self {
        self.runs.push(run);
        self
    }

    fn inline(mut self, text: &str, config: &Config) -> Self {
        self.runs.extend(
            format_inline(text)
                .iter()
                .map(|run| TextRun::from_run(run, config)),
        );
        self
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Fonts and colors referenced by the style sheet, header and footer.
#[derive(Debug, Clone, PartialEq)]
struct Theme {
    organization: String,
    body_font: String,
    mono_font: String,
    body_size: f64,
    code_size: f64,
    small_size: f64,
    heading_sizes: [f64; 6],
    text: Color,
    muted: Color,
    primary: Color,
    secondary: Color,
    code_background: Color,
    page_width: f64,
    page_height: f64,
    margin: f64,
    header_height: f64,
    footer_height: f64,
}

impl Theme {
    fn from_config(config: &Config) -> Self {
        Self {
            organization: config.brand.organization.clone(),
            body_font: config.font.docx_body.clone(),
            mono_font: config.font.docx_mono.clone(),
            body_size: config.font.body_size,
            code_size: config.font.code_size,
            small_size: config.font.small_size,
            heading_sizes: config.font.heading_sizes,
            text: config.palette.text,
            muted: config.palette.muted,
            primary: config.palette.primary,
            secondary: config.palette.secondary,
            code_background: config.palette.code_background,
            page_width: config.page.width,
            page_height: config.page.height,
            margin: config.page.margin,
            header_height: config.page.header_height,
            footer_height: config.page.footer_height,
        }
    }
}

/// An in-memory DOCX document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub author: String,
    pub created: DateTime<Local>,
    pub paragraphs: Vec<Paragraph>,
    ordered_lists: u32,
    theme: Theme,
}

impl Document {
    fn new(options: &ExportOptions, config: &Config) -> Self {
        Self {
            title: options.title.clone(),
            author: options.author(config).to_string(),
            created: options.exported_at,
            paragraphs: Vec::new(),
            ordered_lists: 0,
            theme: Theme::from_config(config),
        }
    }

    fn push(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    fn next_ordered_list(&mut self) -> Numbering {
        self.ordered_lists += 1;
        Numbering::Ordered {
            num_id: BULLET_NUM_ID + self.ordered_lists,
        }
    }

    /// Assemble the DOCX package.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in self.parts() {
            zip.start_file(name, options)?;
            zip.write_all(content.as_bytes())?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Every part of the package, by archive path.
    fn parts(&self) -> Vec<(&'static str, String)> {
        vec![
            ("[Content_Types].xml", content_types_xml()),
            ("_rels/.rels", package_rels_xml()),
            ("docProps/core.xml", self.core_xml()),
            ("docProps/app.xml", app_xml()),
            ("word/_rels/document.xml.rels", document_rels_xml()),
            ("word/document.xml", self.document_xml()),
            ("word/styles.xml", styles_xml(&self.theme)),
            ("word/numbering.xml", numbering_xml(self.ordered_lists)),
            ("word/header1.xml", header_xml(&self.theme)),
            ("word/footer1.xml", footer_xml(&self.theme)),
        ]
    }

    fn document_xml(&self) -> String {
        let mut out = String::from(XML_DECL);
        out.push_str(&format!(
            "<w:document xmlns:w=\"{W_NS}\" xmlns:r=\"{R_NS}\"><w:body>"
        ));
        for paragraph in &self.paragraphs {
            paragraph_to_xml(paragraph, &mut out);
        }
        section_properties(&self.theme, &mut out);
        out.push_str("</w:body></w:document>");
        out
    }

    fn core_xml(&self) -> String {
        let created = self
            .created
            .with_timezone(&Utc)
            .format("%Y-%m-%dT%H:%M:%SZ");
        format!(
            "{XML_DECL}<cp:coreProperties \
             xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
             xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
             xmlns:dcterms=\"http://purl.org/dc/terms/\" \
             xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
             <dc:title>{}</dc:title><dc:creator>{}</dc:creator>\
             <dcterms:created xsi:type=\"dcterms:W3CDTF\">{created}</dcterms:created>\
             </cp:coreProperties>",
            escape(&self.title),
            escape(&self.author),
        )
    }
}

/// Map a transcript onto the DOCX paragraph model.
pub fn build_document(
    transcript: &Transcript,
    options: &ExportOptions,
    config: &Config,
) -> Result<Document, ExportError> {
    let palette = &config.palette;
    let mut doc = Document::new(options, config);

    doc.push(
        Paragraph::new(ParagraphStyle::Title).centered().run(
            TextRun::new(options.title.clone())
                .bold()
                .color(palette.primary)
                .size_pt(config.font.title_size),
        ),
    );
    if let Some(subtitle) = options.subtitle() {
        doc.push(
            Paragraph::new(ParagraphStyle::Subtitle)
                .centered()
                .run(TextRun::new(subtitle).italic().color(palette.muted)),
        );
    }
    let mut separator = Paragraph::new(ParagraphStyle::Normal);
    separator.bottom_border = Some(palette.secondary);
    doc.push(separator);

    for section in &transcript.sections {
        render_section(section, options, config, &mut doc)?;
    }

    debug!(
        paragraphs = doc.paragraphs.len(),
        ordered_lists = doc.ordered_lists,
        "built DOCX document"
    );
    Ok(doc)
}

fn render_section(
    section: &Section,
    options: &ExportOptions,
    config: &Config,
    doc: &mut Document,
) -> Result<(), ExportError> {
    let mut label = Paragraph::new(ParagraphStyle::Normal).run(
        TextRun::new(config.role_label(section.role))
            .bold()
            .color(config.role_color(section.role)),
    );
    if let Some(time) = options.message_time(section.timestamp) {
        label = label.run(
            TextRun::new(format!("  {time}"))
                .color(config.palette.muted)
                .size_pt(config.font.small_size),
        );
    }
    doc.push(label);

    for block in &section.blocks {
        render_block(block, config, doc)?;
    }

    doc.push(Paragraph::new(ParagraphStyle::Normal));
    Ok(())
}

fn render_block(block: &Block, config: &Config, doc: &mut Document) -> Result<(), ExportError> {
    match block {
        Block::Heading { level, text } => {
            if !(1..=6).contains(level) {
                return Err(ExportError::InvalidHeadingLevel(*level));
            }
            doc.push(Paragraph::new(ParagraphStyle::Heading(*level)).run(TextRun::new(text.clone())));
        }
        Block::Code { text, .. } => {
            let mut paragraph = Paragraph::new(ParagraphStyle::Code);
            paragraph.shading = Some(config.palette.code_background);
            let mut run = TextRun::new(text.clone());
            run.monospace = true;
            doc.push(paragraph.run(run));
        }
        Block::List(list) => {
            let numbering = if list.ordered {
                doc.next_ordered_list()
            } else {
                Numbering::Bullet
            };
            for item in &list.items {
                let mut paragraph = Paragraph::new(ParagraphStyle::ListParagraph);
                paragraph.numbering = Some(numbering);
                doc.push(paragraph.inline(item, config));
            }
        }
        Block::Blockquote { text } => {
            let mut paragraph = Paragraph::new(ParagraphStyle::Quote);
            paragraph.left_border = Some(config.palette.secondary);
            paragraph.indent = Some(INDENT_TWIPS);
            doc.push(paragraph.inline(text, config));
        }
        Block::Paragraph { text } => {
            doc.push(Paragraph::new(ParagraphStyle::Normal).inline(text, config));
        }
    }
    Ok(())
}

fn paragraph_to_xml(paragraph: &Paragraph, out: &mut String) {
    out.push_str("<w:p><w:pPr>");
    if let Some(style_id) = paragraph.style.style_id() {
        out.push_str(&format!("<w:pStyle w:val=\"{style_id}\"/>"));
    }
    if let Some(numbering) = paragraph.numbering {
        out.push_str(&format!(
            "<w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"{}\"/></w:numPr>",
            numbering.num_id()
        ));
    }
    if paragraph.left_border.is_some() || paragraph.bottom_border.is_some() {
        out.push_str("<w:pBdr>");
        if let Some(color) = paragraph.left_border {
            out.push_str(&format!(
                "<w:left w:val=\"single\" w:sz=\"24\" w:space=\"8\" w:color=\"{}\"/>",
                color.hex()
            ));
        }
        if let Some(color) = paragraph.bottom_border {
            out.push_str(&format!(
                "<w:bottom w:val=\"single\" w:sz=\"8\" w:space=\"1\" w:color=\"{}\"/>",
                color.hex()
            ));
        }
        out.push_str("</w:pBdr>");
    }
    if let Some(color) = paragraph.shading {
        out.push_str(&shading(color));
    }
    if let Some(indent) = paragraph.indent {
        out.push_str(&format!("<w:ind w:left=\"{indent}\"/>"));
    }
    if paragraph.centered {
        out.push_str("<w:jc w:val=\"center\"/>");
    }
    out.push_str("</w:pPr>");

    for run in &paragraph.runs {
        run_to_xml(run, out);
    }
    out.push_str("</w:p>");
}

fn run_to_xml(run: &TextRun, out: &mut String) {
    out.push_str("<w:r><w:rPr>");
    if run.monospace {
        out.push_str("<w:rStyle w:val=\"CodeChar\"/>");
    }
    if run.bold {
        out.push_str("<w:b/>");
    }
    if run.italic {
        out.push_str("<w:i/>");
    }
    if let Some(color) = run.color {
        out.push_str(&format!("<w:color w:val=\"{}\"/>", color.hex()));
    }
    if let Some(size) = run.size {
        out.push_str(&format!("<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/>"));
    }
    if let Some(color) = run.shading {
        out.push_str(&shading(color));
    }
    out.push_str("</w:rPr>");

    // Embedded newlines become line breaks within the run
    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        if !line.is_empty() {
            out.push_str(&format!(
                "<w:t xml:space=\"preserve\">{}</w:t>",
                escape(line)
            ));
        }
    }
    out.push_str("</w:r>");
}

fn section_properties(theme: &Theme, out: &mut String) {
    let twips = |points: f64| (points * 20.0).round() as i64;
    out.push_str(&format!(
        "<w:sectPr>\
         <w:headerReference w:type=\"default\" r:id=\"rId3\"/>\
         <w:footerReference w:type=\"default\" r:id=\"rId4\"/>\
         <w:pgSz w:w=\"{}\" w:h=\"{}\"/>\
         <w:pgMar w:top=\"{}\" w:right=\"{}\" w:bottom=\"{}\" w:left=\"{}\" \
         w:header=\"{}\" w:footer=\"{}\" w:gutter=\"0\"/>\
         </w:sectPr>",
        twips(theme.page_width),
        twips(theme.page_height),
        twips(theme.margin + theme.header_height),
        twips(theme.margin),
        twips(theme.margin + theme.footer_height),
        twips(theme.margin),
        twips(theme.margin / 2.0),
        twips(theme.margin / 2.0),
    ));
}

fn shading(fill: Color) -> String {
    format!(
        "<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{}\"/>",
        fill.hex()
    )
}

fn half_points(points: f64) -> u32 {
    (points * 2.0).round() as u32
}

fn styles_xml(theme: &Theme) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str(&format!("<w:styles xmlns:w=\"{W_NS}\">"));

    out.push_str(&format!(
        "<w:docDefaults><w:rPrDefault><w:rPr>\
         <w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/>\
         <w:color w:val=\"{color}\"/><w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/>\
         </w:rPr></w:rPrDefault>\
         <w:pPrDefault><w:pPr><w:spacing w:after=\"120\" w:line=\"276\" w:lineRule=\"auto\"/></w:pPr></w:pPrDefault>\
         </w:docDefaults>",
        font = escape(&theme.body_font),
        color = theme.text.hex(),
        size = half_points(theme.body_size),
    ));

    out.push_str(
        "<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\">\
         <w:name w:val=\"Normal\"/><w:qFormat/></w:style>",
    );

    out.push_str(&format!(
        "<w:style w:type=\"paragraph\" w:styleId=\"Title\"><w:name w:val=\"Title\"/>\
         <w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/><w:qFormat/>\
         <w:pPr><w:spacing w:after=\"60\"/><w:jc w:val=\"center\"/></w:pPr>\
         <w:rPr><w:b/><w:color w:val=\"{}\"/><w:sz w:val=\"48\"/><w:szCs w:val=\"48\"/></w:rPr>\
         </w:style>",
        theme.primary.hex()
    ));

    out.push_str(&format!(
        "<w:style w:type=\"paragraph\" w:styleId=\"Subtitle\"><w:name w:val=\"Subtitle\"/>\
         <w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/><w:qFormat/>\
         <w:pPr><w:jc w:val=\"center\"/></w:pPr>\
         <w:rPr><w:i/><w:color w:val=\"{}\"/></w:rPr></w:style>",
        theme.muted.hex()
    ));

    for (index, size) in theme.heading_sizes.iter().enumerate() {
        let level = index + 1;
        out.push_str(&format!(
            "<w:style w:type=\"paragraph\" w:styleId=\"Heading{level}\">\
             <w:name w:val=\"heading {level}\"/><w:basedOn w:val=\"Normal\"/>\
             <w:next w:val=\"Normal\"/><w:qFormat/>\
             <w:pPr><w:keepNext/><w:spacing w:before=\"240\" w:after=\"80\"/>\
             <w:outlineLvl w:val=\"{index}\"/></w:pPr>\
             <w:rPr><w:b/><w:color w:val=\"{color}\"/>\
             <w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/></w:rPr></w:style>",
            color = theme.primary.hex(),
            size = half_points(*size),
        ));
    }

    out.push_str(&format!(
        "<w:style w:type=\"paragraph\" w:styleId=\"Code\"><w:name w:val=\"Code\"/>\
         <w:basedOn w:val=\"Normal\"/><w:qFormat/>\
         <w:pPr><w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{fill}\"/>\
         <w:spacing w:after=\"120\" w:line=\"240\" w:lineRule=\"auto\"/></w:pPr>\
         <w:rPr><w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/>\
         <w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/></w:rPr></w:style>",
        fill = theme.code_background.hex(),
        font = escape(&theme.mono_font),
        size = half_points(theme.code_size),
    ));

    out.push_str(&format!(
        "<w:style w:type=\"character\" w:styleId=\"CodeChar\"><w:name w:val=\"Code Char\"/>\
         <w:rPr><w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/></w:rPr></w:style>",
        font = escape(&theme.mono_font),
    ));

    out.push_str(&format!(
        "<w:style w:type=\"paragraph\" w:styleId=\"Quote\"><w:name w:val=\"Quote\"/>\
         <w:basedOn w:val=\"Normal\"/><w:qFormat/>\
         <w:pPr><w:ind w:left=\"{INDENT_TWIPS}\"/></w:pPr>\
         <w:rPr><w:i/><w:color w:val=\"{}\"/></w:rPr></w:style>",
        theme.muted.hex()
    ));

    out.push_str(&format!(
        "<w:style w:type=\"paragraph\" w:styleId=\"ListParagraph\">\
         <w:name w:val=\"List Paragraph\"/><w:basedOn w:val=\"Normal\"/><w:qFormat/>\
         <w:pPr><w:spacing w:after=\"40\"/><w:ind w:left=\"{INDENT_TWIPS}\"/></w:pPr></w:style>"
    ));

    out.push_str("</w:styles>");
    out
}

fn numbering_xml(ordered_lists: u32) -> String {
    let level = |format: &str, text: &str| {
        format!(
            "<w:lvl w:ilvl=\"0\"><w:start w:val=\"1\"/><w:numFmt w:val=\"{format}\"/>\
             <w:lvlText w:val=\"{text}\"/><w:lvlJc w:val=\"left\"/>\
             <w:pPr><w:ind w:left=\"{INDENT_TWIPS}\" w:hanging=\"360\"/></w:pPr></w:lvl>"
        )
    };

    let mut out = String::from(XML_DECL);
    out.push_str(&format!("<w:numbering xmlns:w=\"{W_NS}\">"));
    out.push_str(&format!(
        "<w:abstractNum w:abstractNumId=\"0\"><w:multiLevelType w:val=\"singleLevel\"/>{}</w:abstractNum>",
        level("bullet", "\u{2022}")
    ));
    out.push_str(&format!(
        "<w:abstractNum w:abstractNumId=\"1\"><w:multiLevelType w:val=\"singleLevel\"/>{}</w:abstractNum>",
        level("decimal", "%1.")
    ));
    out.push_str(&format!(
        "<w:num w:numId=\"{BULLET_NUM_ID}\"><w:abstractNumId w:val=\"0\"/></w:num>"
    ));
    for list in 1..=ordered_lists {
        out.push_str(&format!(
            "<w:num w:numId=\"{}\"><w:abstractNumId w:val=\"1\"/>\
             <w:lvlOverride w:ilvl=\"0\"><w:startOverride w:val=\"1\"/></w:lvlOverride></w:num>",
            BULLET_NUM_ID + list
        ));
    }
    out.push_str("</w:numbering>");
    out
}

fn header_xml(theme: &Theme) -> String {
    format!(
        "{XML_DECL}<w:hdr xmlns:w=\"{W_NS}\"><w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr>\
         <w:r><w:rPr><w:b/><w:color w:val=\"{}\"/><w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/></w:rPr>\
         <w:t xml:space=\"preserve\">{}</w:t></w:r></w:p></w:hdr>",
        theme.primary.hex(),
        escape(&theme.organization),
        size = half_points(theme.small_size),
    )
}

fn footer_xml(theme: &Theme) -> String {
    let rpr = format!(
        "<w:rPr><w:color w:val=\"{}\"/><w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/></w:rPr>",
        theme.muted.hex(),
        size = half_points(theme.small_size),
    );
    let text = |t: &str| format!("<w:r>{rpr}<w:t xml:space=\"preserve\">{t}</w:t></w:r>");
    let field = |instr: &str| format!("<w:fldSimple w:instr=\" {instr} \">{}</w:fldSimple>", text("1"));

    format!(
        "{XML_DECL}<w:ftr xmlns:w=\"{W_NS}\"><w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr>\
         {}{}{}{}</w:p></w:ftr>",
        text("Page "),
        field("PAGE"),
        text(" of "),
        field("NUMPAGES"),
    )
}

fn content_types_xml() -> String {
    let wml = "application/vnd.openxmlformats-officedocument.wordprocessingml";
    format!(
        "{XML_DECL}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/word/document.xml\" ContentType=\"{wml}.document.main+xml\"/>\
         <Override PartName=\"/word/styles.xml\" ContentType=\"{wml}.styles+xml\"/>\
         <Override PartName=\"/word/numbering.xml\" ContentType=\"{wml}.numbering+xml\"/>\
         <Override PartName=\"/word/header1.xml\" ContentType=\"{wml}.header+xml\"/>\
         <Override PartName=\"/word/footer1.xml\" ContentType=\"{wml}.footer+xml\"/>\
         <Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
         <Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>\
         </Types>"
    )
}

fn package_rels_xml() -> String {
    format!(
        "{XML_DECL}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" Type=\"{R_NS}/officeDocument\" Target=\"word/document.xml\"/>\
         <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
         <Relationship Id=\"rId3\" Type=\"{R_NS}/extended-properties\" Target=\"docProps/app.xml\"/>\
         </Relationships>"
    )
}

fn document_rels_xml() -> String {
    format!(
        "{XML_DECL}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" Type=\"{R_NS}/styles\" Target=\"styles.xml\"/>\
         <Relationship Id=\"rId2\" Type=\"{R_NS}/numbering\" Target=\"numbering.xml\"/>\
         <Relationship Id=\"rId3\" Type=\"{R_NS}/header\" Target=\"header1.xml\"/>\
         <Relationship Id=\"rId4\" Type=\"{R_NS}/footer\" Target=\"footer1.xml\"/>\
         </Relationships>"
    )
}

fn app_xml() -> String {
    format!(
        "{XML_DECL}<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">\
         <Application>{}</Application></Properties>",
        env!("CARGO_PKG_NAME")
    )
}

/// Escape text for XML content and attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab are not allowed in XML 1.0
            c if c.is_control() && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::List;
    use crate::message::{Message, Role};
    use pretty_assertions::assert_eq;

    fn build(messages: &[Message]) -> Document {
        let transcript = Transcript::from_messages(messages);
        build_document(&transcript, &ExportOptions::default(), &Config::default()).unwrap()
    }

    /// Paragraphs after the title block.
    fn body(doc: &Document) -> &[Paragraph] {
        let start = doc
            .paragraphs
            .iter()
            .position(|p| p.bottom_border.is_some())
            .unwrap();
        &doc.paragraphs[start + 1..]
    }

    #[test]
    fn title_subtitle_and_separator() {
        let doc = build(&[]);
        assert_eq!(doc.paragraphs.len(), 3);
        assert_eq!(doc.paragraphs[0].style, ParagraphStyle::Title);
        assert!(doc.paragraphs[0].centered);
        assert_eq!(doc.paragraphs[0].text(), "Chat Transcript");
        assert_eq!(doc.paragraphs[1].style, ParagraphStyle::Subtitle);
        assert!(doc.paragraphs[1].runs[0].italic);
        assert!(doc.paragraphs[1].text().starts_with("Exported on"));
        assert!(doc.paragraphs[2].bottom_border.is_some());
    }

    #[test]
    fn subtitle_omitted_without_timestamps() {
        let options = ExportOptions {
            include_timestamps: false,
            ..Default::default()
        };
        let doc = build_document(&Transcript::default(), &options, &Config::default()).unwrap();
        assert!(
            doc.paragraphs
                .iter()
                .all(|p| p.style != ParagraphStyle::Subtitle)
        );
    }

    #[test]
    fn role_labels_have_distinct_colors() {
        let doc = build(&[Message::user("Hello"), Message::assistant("**Hi** there")]);
        let body = body(&doc);

        // label, paragraph, spacer per message
        assert_eq!(body.len(), 6);
        let user_label = &body[0].runs[0];
        let assistant_label = &body[3].runs[0];
        assert_eq!(user_label.text, "User");
        assert_eq!(assistant_label.text, "Assistant");
        assert!(user_label.bold && assistant_label.bold);
        assert_ne!(user_label.color, assistant_label.color);

        let reply = &body[4];
        assert_eq!(reply.runs[0].text, "Hi");
        assert!(reply.runs[0].bold);
        assert_eq!(reply.runs[1].text, " there");
        assert!(!reply.runs[1].bold);

        assert!(body[5].runs.is_empty());
    }

    #[test]
    fn headings_map_to_native_styles() {
        let doc = build(&[Message::assistant("# One\n### Three")]);
        let styles: Vec<ParagraphStyle> = body(&doc)[1..3].iter().map(|p| p.style).collect();
        assert_eq!(
            styles,
            vec![ParagraphStyle::Heading(1), ParagraphStyle::Heading(3)]
        );
    }

    #[test]
    fn invalid_heading_level_fails() {
        let transcript = Transcript {
            sections: vec![Section {
                role: Role::Assistant,
                timestamp: None,
                blocks: vec![Block::Heading {
                    level: 7,
                    text: "too deep".into(),
                }],
            }],
        };
        let err = build_document(&transcript, &ExportOptions::default(), &Config::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidHeadingLevel(7)));
    }

    #[test]
    fn code_block_is_shaded_monospace_and_unformatted() {
        let doc = build(&[Message::assistant("```\nlet **x** = 1;\n```")]);
        let code = &body(&doc)[1];
        assert_eq!(code.style, ParagraphStyle::Code);
        assert_eq!(code.shading, Some(Config::default().palette.code_background));
        assert_eq!(code.runs.len(), 1);
        assert!(code.runs[0].monospace);
        assert_eq!(code.runs[0].text, "let **x** = 1;");
    }

    #[test]
    fn ordered_lists_get_their_own_numbering() {
        let doc = build(&[Message::assistant("1. a\n2. b\n\n- x\n\n1. c")]);
        let numbering: Vec<Option<Numbering>> =
            body(&doc).iter().map(|p| p.numbering).collect();
        assert_eq!(
            numbering,
            vec![
                None,
                Some(Numbering::Ordered { num_id: 2 }),
                Some(Numbering::Ordered { num_id: 2 }),
                Some(Numbering::Bullet),
                Some(Numbering::Ordered { num_id: 3 }),
                None,
            ]
        );
        assert!(numbering_xml(doc.ordered_lists).contains("w:numId=\"3\""));
    }

    #[test]
    fn list_items_are_inline_formatted() {
        let mut doc = Document::new(&ExportOptions::default(), &Config::default());
        render_block(
            &Block::List(List {
                ordered: false,
                items: vec!["use `cargo`".into()],
            }),
            &Config::default(),
            &mut doc,
        )
        .unwrap();
        let runs = &doc.paragraphs[0].runs;
        assert_eq!(runs[1].text, "cargo");
        assert!(runs[1].monospace);
        assert!(runs[1].shading.is_some());
    }

    #[test]
    fn blockquote_has_left_border_and_indent() {
        let doc = build(&[Message::user("> *quoted*")]);
        let quote = &body(&doc)[1];
        assert_eq!(quote.style, ParagraphStyle::Quote);
        assert!(quote.left_border.is_some());
        assert_eq!(quote.indent, Some(INDENT_TWIPS));
        assert!(quote.runs[0].italic);
    }

    #[test]
    fn message_timestamps_follow_role_label() {
        use chrono::TimeZone;
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let doc = build(&[Message::user("Hello").with_timestamp(ts)]);
        assert_eq!(body(&doc)[0].runs.len(), 2);
    }

    #[test]
    fn run_xml_escapes_and_breaks_lines() {
        let mut out = String::new();
        run_to_xml(&TextRun::new("a < b & c\n\"d\""), &mut out);
        assert_eq!(
            out,
            "<w:r><w:rPr></w:rPr><w:t xml:space=\"preserve\">a &lt; b &amp; c</w:t>\
             <w:br/><w:t xml:space=\"preserve\">&quot;d&quot;</w:t></w:r>"
        );
    }

    #[test]
    fn footer_uses_page_fields() {
        let footer = footer_xml(&Theme::from_config(&Config::default()));
        assert!(footer.contains("w:instr=\" PAGE \""));
        assert!(footer.contains("w:instr=\" NUMPAGES \""));
    }

    #[test]
    fn header_shows_organization() {
        let mut config = Config::default();
        config.brand.organization = "R&D Team".into();
        let header = header_xml(&Theme::from_config(&config));
        assert!(header.contains("R&amp;D Team"));
    }

    /// Paragraph property children in the order WordprocessingML requires.
    const PPR_ORDER: [&str; 9] = [
        "pStyle", "keepNext", "numPr", "pBdr", "shd", "spacing", "ind", "jc", "outlineLvl",
    ];

    /// Assert every `<w:pPr>` in `xml` lists its known children in order.
    fn assert_ppr_order(xml: &str) {
        for (start, open) in xml.match_indices("<w:pPr>") {
            let rest = &xml[start + open.len()..];
            let body = &rest[..rest.find("</w:pPr>").unwrap()];
            let ranks: Vec<usize> = body
                .split("<w:")
                .skip(1)
                .filter_map(|tag| {
                    let name = tag.split(|c: char| !c.is_ascii_alphanumeric()).next()?;
                    PPR_ORDER.iter().position(|known| *known == name)
                })
                .collect();
            assert!(
                ranks.windows(2).all(|w| w[0] < w[1]),
                "out of order paragraph properties: {body}"
            );
        }
    }

    #[test]
    fn style_paragraph_properties_follow_schema_order() {
        let styles = styles_xml(&Theme::from_config(&Config::default()));
        let code = &styles[styles.find("w:styleId=\"Code\"").unwrap()..];
        let shd = code.find("<w:shd").unwrap();
        let spacing = code.find("<w:spacing").unwrap();
        assert!(shd < spacing);
        assert_ppr_order(&styles);
    }

    #[test]
    fn body_paragraph_properties_follow_schema_order() {
        let doc = build(&[Message::assistant(
            "# Head\n\n1. one\n\n> quoted\n\n```\ncode\n```",
        )]);
        assert_ppr_order(&doc.document_xml());
    }
}
