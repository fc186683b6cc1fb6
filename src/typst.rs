use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_library::layout::PagedDocument;
use typst_pdf::PdfOptions;

use crate::block::RunStyle;
use crate::config::{Color, Config};
use crate::error::ExportError;
use crate::layout::{Align, Element, LaidOutDocument, Page, TextLine};
use crate::metrics::{Segment, inline_code_size};
use crate::transcript::ExportOptions;

/// Convert laid-out pages to Typst markup.
///
/// Pages have zero margins and every element is placed absolutely, so Typst
/// only draws; it never re-flows or re-paginates.
pub fn to_markup(document: &LaidOutDocument, options: &ExportOptions, config: &Config) -> String {
    let mut out = String::new();
    let g = &document.geometry;

    out.push_str(&format!(
        "#set document(title: {}, author: {})\n",
        string(&options.title),
        string(options.author(config))
    ));
    out.push_str(&format!(
        "#set page(width: {}, height: {}, margin: 0pt)\n",
        pt(g.width),
        pt(g.height)
    ));
    out.push_str(&format!(
        "#set text(font: {}, size: {}, fill: {}, hyphenate: false)\n\n",
        string(&config.font.body),
        pt(config.font.body_size),
        rgb(config.palette.text)
    ));

    let total = document.page_count();
    for (index, page) in document.pages.iter().enumerate() {
        if index > 0 {
            out.push_str("#pagebreak()\n");
        }
        page_to_typst(page, total, config, &mut out);
    }

    out
}

fn page_to_typst(page: &Page, total: usize, config: &Config, out: &mut String) {
    for element in &page.elements {
        match element {
            Element::Text(line) => text_line(line, config, out),
            Element::PageLabel { y, size, color } => {
                let label = TextLine {
                    x: 0.0,
                    y: *y,
                    align: Align::Center,
                    size: *size,
                    color: *color,
                    segments: vec![Segment {
                        text: format!("Page {} of {}", page.number, total),
                        style: RunStyle::Plain,
                    }],
                };
                text_line(&label, config, out);
            }
            Element::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => {
                out.push_str(&format!(
                    "#place(dx: {}, dy: {}, rect(width: {}, height: {}, fill: {}, stroke: none))\n",
                    pt(*x),
                    pt(*y),
                    pt(*width),
                    pt(*height),
                    rgb(*fill)
                ));
            }
            Element::Line {
                x1,
                y1,
                x2,
                y2,
                stroke,
                color,
            } => {
                out.push_str(&format!(
                    "#place(dx: {}, dy: {}, line(start: (0pt, 0pt), end: ({}, {}), stroke: {} + {}))\n",
                    pt(*x1),
                    pt(*y1),
                    pt(x2 - x1),
                    pt(y2 - y1),
                    pt(*stroke),
                    rgb(*color)
                ));
            }
        }
    }
}

fn text_line(line: &TextLine, config: &Config, out: &mut String) {
    if line.segments.is_empty() {
        return;
    }
    match line.align {
        Align::Left => out.push_str(&format!(
            "#place(dx: {}, dy: {})[",
            pt(line.x),
            pt(line.y)
        )),
        Align::Center => out.push_str(&format!("#place(top + center, dy: {})[", pt(line.y))),
    }
    for segment in &line.segments {
        segment_to_typst(segment, line, config, out);
    }
    out.push_str("]\n");
}

fn segment_to_typst(segment: &Segment, line: &TextLine, config: &Config, out: &mut String) {
    let mut args = vec![format!("fill: {}", rgb(line.color))];
    match segment.style {
        RunStyle::Plain => {}
        RunStyle::Bold => args.push("weight: \"bold\"".to_string()),
        RunStyle::Italic => args.push("style: \"italic\"".to_string()),
        RunStyle::BoldItalic => {
            args.push("weight: \"bold\"".to_string());
            args.push("style: \"italic\"".to_string());
        }
        RunStyle::Code => args.push(format!("font: {}", string(&config.font.mono))),
    }

    let size = if segment.style == RunStyle::Code {
        inline_code_size(line.size, config.font.code_size)
    } else {
        line.size
    };
    args.push(format!("size: {}", pt(size)));

    // Monospace whitespace must keep its width at line start
    let text = if segment.style == RunStyle::Code {
        segment.text.replace(' ', "\u{a0}")
    } else {
        segment.text.clone()
    };

    out.push_str(&format!("#text({}, {})", args.join(", "), string(&text)));
}

/// A Typst string literal.
fn string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("    "),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn pt(value: f64) -> String {
    format!("{:.2}pt", value)
}

fn rgb(color: Color) -> String {
    format!("rgb(\"{}\")", color)
}

/// Compile Typst markup to PDF bytes.
pub fn compile_pdf(markup: String) -> Result<Vec<u8>, ExportError> {
    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(false);

    let engine = TypstEngine::builder()
        .main_file(markup)
        .search_fonts_with(font_options)
        .build();

    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| ExportError::Compile(format!("{:?}", e)))?;

    typst_pdf::pdf(&doc, &PdfOptions::default()).map_err(|e| ExportError::Pdf(format!("{:?}", e)))
}
