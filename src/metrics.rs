//! Approximate text measurement and line wrapping for the PDF layout.
//!
//! Widths are estimated from a fixed advance table rather than real font
//! metrics. The table errs wide for the bundled serif face, so wrapped lines
//! stay inside the content box.

use std::ops::Range;

use unicode_width::UnicodeWidthChar;

use crate::block::{Run, RunStyle};

/// Typeface class used for measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Proportional,
    Monospace,
}

/// Monospace advance, in em.
pub const MONO_ADVANCE: f64 = 0.6;

// Advance widths for ASCII 0x20..=0x7e, in 1/1000 em.
const ASCII_ADVANCE: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Advance width of one character, in em.
pub fn char_advance(ch: char, face: Face) -> f64 {
    let columns = ch.width().unwrap_or(0) as f64;
    match face {
        Face::Monospace => MONO_ADVANCE * columns,
        Face::Proportional => match ch {
            ' '..='~' => f64::from(ASCII_ADVANCE[ch as usize - 0x20]) / 1000.0,
            _ if columns >= 2.0 => 1.0,
            _ if columns == 0.0 => 0.0,
            _ => 0.556,
        },
    }
}

/// Width of `text` at `size` points.
pub fn text_width(text: &str, size: f64, face: Face) -> f64 {
    text.chars().map(|c| char_advance(c, face)).sum::<f64>() * size
}

/// Greedy word wrap. Returns byte ranges into `text`, one per visual line.
///
/// Embedded newlines force a break. Spaces at a wrap point are dropped;
/// words wider than `max_width` are split between characters.
pub fn wrap(text: &str, max_width: f64, size: f64, face: Face) -> Vec<Range<usize>> {
    wrap_with(text, max_width, |_, ch| char_advance(ch, face) * size)
}

/// Word wrap with a caller-supplied advance, in points, for the character
/// at a byte offset of `text`.
fn wrap_with(
    text: &str,
    max_width: f64,
    advance: impl Fn(usize, char) -> f64,
) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for hard_line in text.split('\n') {
        wrap_line(hard_line, offset, max_width, &advance, &mut lines);
        offset += hard_line.len() + 1;
    }
    lines
}

fn wrap_line(
    line: &str,
    base: usize,
    max_width: f64,
    advance: &impl Fn(usize, char) -> f64,
    lines: &mut Vec<Range<usize>>,
) {
    let width_of = |range: Range<usize>| -> f64 {
        line[range.clone()]
            .char_indices()
            .map(|(i, ch)| advance(base + range.start + i, ch))
            .sum()
    };

    let mut current: Option<Range<usize>> = None;
    let mut current_width = 0.0;

    for word in words(line) {
        let word_width = width_of(word.clone());

        if let Some(open) = current.as_mut() {
            let gap = width_of(open.end..word.start);
            if current_width + gap + word_width <= max_width {
                open.end = word.end;
                current_width += gap + word_width;
                continue;
            }
            lines.push(base + open.start..base + open.end);
            current = None;
        }

        if word_width <= max_width {
            current_width = word_width;
            current = Some(word);
            continue;
        }

        // Split an over-long word; its tail stays open for the next word
        let mut start = word.start;
        let mut width = 0.0;
        for (i, ch) in line[word.clone()].char_indices() {
            let at = word.start + i;
            let ch_width = advance(base + at, ch);
            if width + ch_width > max_width && at > start {
                lines.push(base + start..base + at);
                start = at;
                width = 0.0;
            }
            width += ch_width;
        }
        current_width = width;
        current = Some(start..word.end);
    }

    match current {
        Some(open) => lines.push(base + open.start..base + open.end),
        // A blank hard line still occupies a line
        None => lines.push(base..base),
    }
}

/// Byte ranges of space-separated words.
fn words(line: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut start = None;
    line.char_indices()
        .chain(std::iter::once((line.len(), ' ')))
        .filter_map(move |(i, ch)| {
            if ch.is_whitespace() {
                start.take().map(|s| s..i)
            } else {
                if start.is_none() {
                    start = Some(i);
                }
                None
            }
        })
}

/// Fixed-width wrap for code: splits by column count, keeping whitespace.
pub fn wrap_code(text: &str, max_width: f64, size: f64) -> Vec<String> {
    let columns = ((max_width / (MONO_ADVANCE * size)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for line in text.split('\n') {
        let line = line.replace('\t', "    ");
        let mut current = String::new();
        let mut used = 0;
        for ch in line.chars() {
            let width = ch.width().unwrap_or(0);
            if used + width > columns && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                used = 0;
            }
            current.push(ch);
            used += width;
        }
        lines.push(current);
    }

    lines
}

/// A styled fragment of a wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub style: RunStyle,
}

/// Scale applied to inline code set in body-sized lines.
pub const INLINE_CODE_SCALE: f64 = 0.85;

/// Point size inline code is drawn at within a line of `size` points.
///
/// Monospace glyphs are wider than the body face, so inline code is scaled
/// down unless the line is already at or below the code size.
pub fn inline_code_size(size: f64, code_size: f64) -> f64 {
    if size > code_size {
        size * INLINE_CODE_SCALE
    } else {
        size
    }
}

/// Width of one styled segment as drawn.
pub fn segment_width(segment: &Segment, size: f64, code_size: f64) -> f64 {
    match segment.style {
        RunStyle::Code => text_width(
            &segment.text,
            inline_code_size(size, code_size),
            Face::Monospace,
        ),
        _ => text_width(&segment.text, size, Face::Proportional),
    }
}

/// Wrap styled runs. Breaks are computed on the plain concatenation of the
/// runs, each character measured in its own run's face; styles are then
/// reapplied to each line run by run.
pub fn wrap_runs(runs: &[Run], max_width: f64, size: f64, code_size: f64) -> Vec<Vec<Segment>> {
    let plain: String = runs.iter().map(|r| r.text.as_str()).collect();

    let mut spans = Vec::with_capacity(runs.len());
    let mut offset = 0;
    for run in runs {
        spans.push((offset..offset + run.text.len(), run.style));
        offset += run.text.len();
    }

    let code_size = inline_code_size(size, code_size);
    let style_at = |at: usize| {
        spans
            .iter()
            .find(|(span, _)| span.contains(&at))
            .map_or(RunStyle::Plain, |(_, style)| *style)
    };
    let advance = |at: usize, ch: char| match style_at(at) {
        RunStyle::Code => char_advance(ch, Face::Monospace) * code_size,
        _ => char_advance(ch, Face::Proportional) * size,
    };

    wrap_with(&plain, max_width, advance)
        .into_iter()
        .map(|line| {
            spans
                .iter()
                .filter_map(|(span, style)| {
                    let start = span.start.max(line.start);
                    let end = span.end.min(line.end);
                    (start < end).then(|| Segment {
                        text: plain[start..end].to_string(),
                        style: *style,
                    })
                })
                .collect()
        })
        .collect()
}
