//! Manual page layout for the PDF renderer.
//!
//! The layout walks the transcript once with a vertical cursor and emits a
//! display list of absolutely positioned elements per page. Every page,
//! including the first, gets a freshly drawn header and footer. The cursor
//! lives in a per-call [`Layout`] value.

use tracing::debug;

use crate::block::{Block, RunStyle};
use crate::config::{Color, Config, PageConfig};
use crate::error::ExportError;
use crate::inline::format_inline;
use crate::metrics::{Face, Segment, text_width, wrap, wrap_code, wrap_runs};
use crate::transcript::{ExportOptions, Section, Transcript};

const LIST_INDENT: f64 = 18.0;
const QUOTE_INDENT: f64 = 14.0;
const QUOTE_BORDER_WIDTH: f64 = 3.0;
const CODE_PADDING: f64 = 6.0;

/// Page geometry, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub header_height: f64,
    pub footer_height: f64,
    pub break_threshold: f64,
}

impl PageGeometry {
    pub fn from_config(page: &PageConfig) -> Self {
        Self {
            width: page.width,
            height: page.height,
            margin: page.margin,
            header_height: page.header_height,
            footer_height: page.footer_height,
            break_threshold: page.break_threshold,
        }
    }

    pub fn content_top(&self) -> f64 {
        self.margin + self.header_height
    }

    pub fn content_bottom(&self) -> f64 {
        self.height - self.margin - self.footer_height
    }

    pub fn content_left(&self) -> f64 {
        self.margin
    }

    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f64 {
        self.content_bottom() - self.content_top()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One line of text; `y` is the top of the line box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f64,
    pub y: f64,
    pub align: Align,
    pub size: f64,
    pub color: Color,
    pub segments: Vec<Segment>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextLine),
    /// Centered "Page N of M"; the total is filled in at output time.
    PageLabel {
        y: f64,
        size: f64,
        color: Color,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Color,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: f64,
        color: Color,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub elements: Vec<Element>,
}

impl Page {
    fn new(number: usize) -> Self {
        Self {
            number,
            elements: Vec::new(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextLine> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text(line) => Some(line),
            _ => None,
        })
    }
}

/// A fully paginated document.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Vertical position and page count for one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub y: f64,
    pub page_number: usize,
}

/// Paginate a transcript.
pub fn layout(
    transcript: &Transcript,
    options: &ExportOptions,
    config: &Config,
) -> Result<LaidOutDocument, ExportError> {
    let mut layout = Layout::new(config);

    layout.title_block(options);
    for section in &transcript.sections {
        layout.section(section, options)?;
    }

    let document = layout.finish();
    debug!(pages = document.page_count(), "laid out PDF pages");
    Ok(document)
}

struct Layout<'a> {
    config: &'a Config,
    geometry: PageGeometry,
    cursor: Cursor,
    current: Page,
    finished: Vec<Page>,
}

impl<'a> Layout<'a> {
    fn new(config: &'a Config) -> Self {
        let geometry = PageGeometry::from_config(&config.page);
        let mut layout = Self {
            config,
            geometry,
            cursor: Cursor {
                y: geometry.content_top(),
                page_number: 1,
            },
            current: Page::new(1),
            finished: Vec::new(),
        };
        layout.draw_header_footer();
        layout
    }

    fn finish(mut self) -> LaidOutDocument {
        self.finished.push(self.current);
        LaidOutDocument {
            geometry: self.geometry,
            pages: self.finished,
        }
    }

    fn new_page(&mut self) {
        self.cursor.page_number += 1;
        let done = std::mem::replace(&mut self.current, Page::new(self.cursor.page_number));
        self.finished.push(done);
        self.cursor.y = self.geometry.content_top();
        self.draw_header_footer();
    }

    fn draw_header_footer(&mut self) {
        let g = self.geometry;
        let palette = &self.config.palette;
        let small = self.config.font.small_size;

        let header_y = g.margin + (g.header_height - small) / 2.0 - 4.0;
        let header = TextLine {
            x: 0.0,
            y: header_y.max(g.margin / 2.0),
            align: Align::Center,
            size: small,
            color: palette.primary,
            segments: vec![Segment {
                text: self.config.brand.organization.clone(),
                style: RunStyle::Bold,
            }],
        };
        let header_rule_y = g.content_top() - 6.0;
        let footer_rule_y = g.content_bottom() + 6.0;

        let elements = [
            Element::Text(header),
            Element::Line {
                x1: g.content_left(),
                y1: header_rule_y,
                x2: g.content_left() + g.content_width(),
                y2: header_rule_y,
                stroke: 0.5,
                color: palette.secondary,
            },
            Element::Line {
                x1: g.content_left(),
                y1: footer_rule_y,
                x2: g.content_left() + g.content_width(),
                y2: footer_rule_y,
                stroke: 0.5,
                color: palette.muted,
            },
            Element::PageLabel {
                y: g.height - g.margin - small,
                size: small,
                color: palette.muted,
            },
        ];
        self.current.elements.extend(elements);
    }

    fn push(&mut self, element: Element) {
        self.current.elements.push(element);
    }

    fn remaining(&self) -> f64 {
        self.geometry.content_bottom() - self.cursor.y
    }

    fn fits(&self, height: f64) -> bool {
        self.cursor.y + height <= self.geometry.content_bottom()
    }

    fn at_page_top(&self) -> bool {
        self.cursor.y <= self.geometry.content_top()
    }

    /// Break to a new page unless `height` fits. Never breaks an empty page.
    fn ensure(&mut self, height: f64) {
        if !self.fits(height) && !self.at_page_top() {
            self.new_page();
        }
    }

    /// Break before a block when little space is left.
    fn check_threshold(&mut self) {
        if self.remaining() < self.geometry.break_threshold && !self.at_page_top() {
            self.new_page();
        }
    }

    fn line_height(&self, size: f64) -> f64 {
        size * self.config.font.line_height
    }

    fn text(&mut self, x: f64, size: f64, color: Color, segments: Vec<Segment>) {
        let y = self.cursor.y;
        self.push(Element::Text(TextLine {
            x,
            y,
            align: Align::Left,
            size,
            color,
            segments,
        }));
    }

    fn title_block(&mut self, options: &ExportOptions) {
        let g = self.geometry;
        let font = &self.config.font;
        let palette = self.config.palette.clone();
        let title_size = font.title_size;
        let body_size = font.body_size;

        for range in wrap(&options.title, g.content_width(), title_size, Face::Proportional) {
            let lh = self.line_height(title_size);
            self.ensure(lh);
            let y = self.cursor.y;
            self.push(Element::Text(TextLine {
                x: 0.0,
                y,
                align: Align::Center,
                size: title_size,
                color: palette.primary,
                segments: vec![Segment {
                    text: options.title[range].to_string(),
                    style: RunStyle::Bold,
                }],
            }));
            self.cursor.y += lh;
        }

        if let Some(subtitle) = options.subtitle() {
            let y = self.cursor.y;
            self.push(Element::Text(TextLine {
                x: 0.0,
                y,
                align: Align::Center,
                size: body_size,
                color: palette.muted,
                segments: vec![Segment {
                    text: subtitle,
                    style: RunStyle::Italic,
                }],
            }));
            self.cursor.y += self.line_height(body_size);
        }

        self.cursor.y += 6.0;
        let y = self.cursor.y;
        self.push(Element::Line {
            x1: g.content_left(),
            y1: y,
            x2: g.content_left() + g.content_width(),
            y2: y,
            stroke: 1.0,
            color: palette.secondary,
        });
        self.cursor.y += 14.0;
    }

    fn section(&mut self, section: &Section, options: &ExportOptions) -> Result<(), ExportError> {
        let size = self.config.font.body_size + 1.0;
        let lh = self.line_height(size);

        self.check_threshold();
        self.ensure(lh);

        let label = self.config.role_label(section.role).to_string();
        let x = self.geometry.content_left();
        let label_width = text_width(&label, size, Face::Proportional);
        self.text(
            x,
            size,
            self.config.role_color(section.role),
            vec![Segment {
                text: label,
                style: RunStyle::Bold,
            }],
        );
        if let Some(time) = options.message_time(section.timestamp) {
            let small = self.config.font.small_size;
            self.text(
                x + label_width + 8.0,
                small,
                self.config.palette.muted,
                vec![Segment {
                    text: time,
                    style: RunStyle::Plain,
                }],
            );
        }
        self.cursor.y += lh + 2.0;

        for block in &section.blocks {
            self.check_threshold();
            self.block(block)?;
            self.cursor.y += self.config.font.body_size * 0.5;
        }

        // Spacer between messages
        self.cursor.y += self.config.font.body_size;
        Ok(())
    }

    fn block(&mut self, block: &Block) -> Result<(), ExportError> {
        match block {
            Block::Heading { level, text } => self.heading(*level, text)?,
            Block::Code { text, .. } => self.code(text),
            Block::List(list) => self.list(list.ordered, &list.items),
            Block::Blockquote { text } => self.blockquote(text),
            Block::Paragraph { text } => self.paragraph(text),
        }
        Ok(())
    }

    fn heading(&mut self, level: u8, text: &str) -> Result<(), ExportError> {
        if !(1..=6).contains(&level) {
            return Err(ExportError::InvalidHeadingLevel(level));
        }
        let size = self.config.font.heading_size(level);
        let lh = self.line_height(size);
        let color = self.config.palette.primary;
        let lines = wrap(text, self.geometry.content_width(), size, Face::Proportional);

        if !self.at_page_top() {
            self.cursor.y += size * 0.3;
        }
        self.ensure(lh * lines.len() as f64);
        let x = self.geometry.content_left();
        for range in lines {
            self.ensure(lh);
            self.text(
                x,
                size,
                color,
                vec![Segment {
                    text: text[range].to_string(),
                    style: RunStyle::Bold,
                }],
            );
            self.cursor.y += lh;
        }
        self.cursor.y += size * 0.2;
        Ok(())
    }

    fn paragraph(&mut self, text: &str) {
        let size = self.config.font.body_size;
        let lh = self.line_height(size);
        let color = self.config.palette.text;
        let x = self.geometry.content_left();

        for segments in wrap_runs(
            &format_inline(text),
            self.geometry.content_width(),
            size,
            self.config.font.code_size,
        ) {
            self.ensure(lh);
            self.text(x, size, color, segments);
            self.cursor.y += lh;
        }
    }

    fn list(&mut self, ordered: bool, items: &[String]) {
        let size = self.config.font.body_size;
        let lh = self.line_height(size);
        let color = self.config.palette.text;
        let left = self.geometry.content_left();
        let width = self.geometry.content_width() - LIST_INDENT;

        for (index, item) in items.iter().enumerate() {
            // Source numbering is discarded; items are renumbered from 1
            let marker = if ordered {
                format!("{}.", index + 1)
            } else {
                "\u{2022}".to_string()
            };
            let lines = wrap_runs(&format_inline(item), width, size, self.config.font.code_size);
            for (line_index, segments) in lines.into_iter().enumerate() {
                self.ensure(lh);
                if line_index == 0 {
                    self.text(
                        left + 4.0,
                        size,
                        color,
                        vec![Segment {
                            text: marker.clone(),
                            style: RunStyle::Plain,
                        }],
                    );
                }
                self.text(left + LIST_INDENT, size, color, segments);
                self.cursor.y += lh;
            }
            self.cursor.y += 2.0;
        }
    }

    fn blockquote(&mut self, text: &str) {
        let size = self.config.font.body_size;
        let lh = self.line_height(size);
        let color = self.config.palette.muted;
        let left = self.geometry.content_left();
        let width = self.geometry.content_width() - QUOTE_INDENT;

        let mut border_top = self.cursor.y;
        for segments in wrap_runs(&format_inline(text), width, size, self.config.font.code_size) {
            if !self.fits(lh) && !self.at_page_top() {
                // Close this page's stretch of border before breaking
                self.quote_border(border_top);
                self.new_page();
                border_top = self.cursor.y;
            }
            self.text(left + QUOTE_INDENT, size, color, segments);
            self.cursor.y += lh;
        }
        self.quote_border(border_top);
    }

    fn quote_border(&mut self, top: f64) {
        if self.cursor.y <= top {
            return;
        }
        let x = self.geometry.content_left() + QUOTE_BORDER_WIDTH / 2.0;
        let y2 = self.cursor.y;
        let color = self.config.palette.secondary;
        self.push(Element::Line {
            x1: x,
            y1: top,
            x2: x,
            y2,
            stroke: QUOTE_BORDER_WIDTH,
            color,
        });
    }

    fn code(&mut self, text: &str) {
        let size = self.config.font.code_size;
        let lh = self.line_height(size);
        let g = self.geometry;
        let fill = self.config.palette.code_background;
        let color = self.config.palette.text;
        let lines = wrap_code(text, g.content_width() - 2.0 * CODE_PADDING, size);

        let total = lines.len() as f64 * lh + 2.0 * CODE_PADDING;
        if !self.fits(total) && total <= g.content_height() {
            self.ensure(total);
        }

        let mut rest = lines.as_slice();
        while !rest.is_empty() {
            if self.remaining() < 2.0 * CODE_PADDING + lh {
                self.new_page();
            }
            let capacity = ((self.remaining() - 2.0 * CODE_PADDING) / lh).floor().max(1.0) as usize;
            let (chunk, tail) = rest.split_at(capacity.min(rest.len()));
            let height = chunk.len() as f64 * lh + 2.0 * CODE_PADDING;

            let top = self.cursor.y;
            self.push(Element::Rect {
                x: g.content_left(),
                y: top,
                width: g.content_width(),
                height,
                fill,
            });
            self.cursor.y += CODE_PADDING;
            for line in chunk {
                if !line.is_empty() {
                    self.text(
                        g.content_left() + CODE_PADDING,
                        size,
                        color,
                        vec![Segment {
                            text: line.clone(),
                            style: RunStyle::Code,
                        }],
                    );
                }
                self.cursor.y += lh;
            }
            self.cursor.y = top + height;

            rest = tail;
            if !rest.is_empty() {
                self.new_page();
            }
        }
    }
}
