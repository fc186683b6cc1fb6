use crate::block::{Block, List};

/// Split message text into an ordered sequence of blocks.
///
/// Single forward pass over lines. Fenced code takes priority over every
/// other classifier; outside a fence each line is classified by its leading
/// marker and consecutive lines of the same class are merged.
pub fn segment(text: &str) -> Vec<Block> {
    let mut state = ParseState::default();
    let mut blocks = Vec::new();

    for line in text.lines() {
        process_line(line, &mut state, &mut blocks);
    }

    // An unclosed fence is closed by end of input
    if let Some(fence) = state.fence.take() {
        blocks.push(fence.finish());
    }
    flush(&mut state, &mut blocks);

    blocks
}

#[derive(Default)]
struct ParseState {
    // Open fenced code block, if any
    fence: Option<FenceBuilder>,
    // Open non-code block being accumulated
    open: Option<OpenBlock>,
}

struct FenceBuilder {
    ticks: usize,
    language: Option<String>,
    lines: Vec<String>,
}

impl FenceBuilder {
    fn finish(self) -> Block {
        Block::Code {
            language: self.language,
            text: self.lines.join("\n"),
        }
    }
}

enum OpenBlock {
    List { ordered: bool, items: Vec<String> },
    Blockquote(Vec<String>),
    Paragraph(Vec<String>),
}

impl OpenBlock {
    fn into_block(self) -> Block {
        match self {
            OpenBlock::List { ordered, items } => Block::List(List { ordered, items }),
            OpenBlock::Blockquote(lines) => Block::Blockquote {
                text: lines.join("\n"),
            },
            OpenBlock::Paragraph(lines) => Block::Paragraph {
                text: lines.join("\n"),
            },
        }
    }
}

/// Classification of a line outside a code fence
#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    Fence { ticks: usize, info: &'a str },
    Heading { level: u8, text: &'a str },
    Bullet(&'a str),
    Numbered(&'a str),
    Quote(&'a str),
    Blank,
    Text(&'a str),
}

fn process_line(line: &str, state: &mut ParseState, blocks: &mut Vec<Block>) {
    if let Some(fence) = state.fence.as_mut() {
        if is_closing_fence(line, fence.ticks) {
            if let Some(fence) = state.fence.take() {
                blocks.push(fence.finish());
            }
        } else {
            fence.lines.push(line.to_string());
        }
        return;
    }

    match classify(line) {
        LineKind::Fence { ticks, info } => {
            flush(state, blocks);
            let info = info.trim();
            state.fence = Some(FenceBuilder {
                ticks,
                language: (!info.is_empty()).then(|| info.to_string()),
                lines: Vec::new(),
            });
        }
        LineKind::Heading { level, text } => {
            flush(state, blocks);
            blocks.push(Block::Heading {
                level,
                text: text.to_string(),
            });
        }
        LineKind::Bullet(item) => push_list_item(false, item, state, blocks),
        LineKind::Numbered(item) => push_list_item(true, item, state, blocks),
        LineKind::Quote(text) => match state.open.as_mut() {
            Some(OpenBlock::Blockquote(lines)) => lines.push(text.to_string()),
            _ => {
                flush(state, blocks);
                state.open = Some(OpenBlock::Blockquote(vec![text.to_string()]));
            }
        },
        LineKind::Blank => flush(state, blocks),
        LineKind::Text(text) => match state.open.as_mut() {
            Some(OpenBlock::Paragraph(lines)) => lines.push(text.to_string()),
            _ => {
                flush(state, blocks);
                state.open = Some(OpenBlock::Paragraph(vec![text.to_string()]));
            }
        },
    }
}

fn push_list_item(ordered: bool, item: &str, state: &mut ParseState, blocks: &mut Vec<Block>) {
    if let Some(OpenBlock::List {
        ordered: open_ordered,
        items,
    }) = state.open.as_mut()
        && *open_ordered == ordered
    {
        items.push(item.to_string());
        return;
    }
    flush(state, blocks);
    state.open = Some(OpenBlock::List {
        ordered,
        items: vec![item.to_string()],
    });
}

fn flush(state: &mut ParseState, blocks: &mut Vec<Block>) {
    if let Some(open) = state.open.take() {
        blocks.push(open.into_block());
    }
}

/// Classify a line outside a fence, in priority order.
fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim_start();

    let ticks = leading_count(trimmed, '`');
    if ticks >= 3 {
        return LineKind::Fence {
            ticks,
            info: &trimmed[ticks..],
        };
    }

    let hashes = leading_count(line, '#');
    if (1..=6).contains(&hashes)
        && let Some(text) = strip_space(&line[hashes..])
    {
        return LineKind::Heading {
            level: hashes as u8,
            text: text.trim_end(),
        };
    }

    if let Some(rest) = line.strip_prefix(['-', '*', '+'])
        && let Some(item) = strip_space(rest)
    {
        return LineKind::Bullet(item);
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0
        && let Some(rest) = line[digits..].strip_prefix('.')
        && let Some(item) = strip_space(rest)
    {
        return LineKind::Numbered(item);
    }

    if let Some(rest) = line.strip_prefix('>') {
        return LineKind::Quote(rest.strip_prefix(' ').unwrap_or(rest));
    }

    if line.trim().is_empty() {
        return LineKind::Blank;
    }

    LineKind::Text(line)
}

/// A closer is a line of backticks only, at least as long as the opener.
fn is_closing_fence(line: &str, ticks: usize) -> bool {
    let trimmed = line.trim();
    let count = leading_count(trimmed, '`');
    count >= ticks && count == trimmed.len()
}

fn leading_count(s: &str, ch: char) -> usize {
    s.chars().take_while(|&c| c == ch).count()
}

/// Strip the space that must follow a marker, returning the rest.
fn strip_space(s: &str) -> Option<&str> {
    s.strip_prefix(' ').map(|rest| rest.trim_start_matches(' '))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph(text: &str) -> Block {
        Block::Paragraph {
            text: text.to_string(),
        }
    }

    #[test]
    fn heading_levels() {
        assert_eq!(
            segment("# One\n###### Six"),
            vec![
                Block::Heading {
                    level: 1,
                    text: "One".into()
                },
                Block::Heading {
                    level: 6,
                    text: "Six".into()
                },
            ]
        );
    }

    #[test]
    fn seven_hashes_is_paragraph() {
        assert_eq!(segment("####### nope"), vec![paragraph("####### nope")]);
    }

    #[test]
    fn hash_without_space_is_paragraph() {
        assert_eq!(segment("#hashtag"), vec![paragraph("#hashtag")]);
    }

    #[test]
    fn consecutive_paragraph_lines_merge() {
        assert_eq!(
            segment("first line\nsecond line\n\nnext"),
            vec![paragraph("first line\nsecond line"), paragraph("next")]
        );
    }

    #[test]
    fn unordered_list_markers() {
        assert_eq!(
            segment("- one\n* two\n+ three"),
            vec![Block::List(List {
                ordered: false,
                items: vec!["one".into(), "two".into(), "three".into()],
            })]
        );
    }

    #[test]
    fn ordered_list_ignores_source_numbering() {
        assert_eq!(
            segment("3. c\n1. a\n10. j"),
            vec![Block::List(List {
                ordered: true,
                items: vec!["c".into(), "a".into(), "j".into()],
            })]
        );
    }

    #[test]
    fn list_kind_change_starts_new_list() {
        let blocks = segment("- a\n1. b");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], Block::List(l) if !l.ordered));
        assert!(matches!(&blocks[1], Block::List(l) if l.ordered));
    }

    #[test]
    fn list_then_text_flushes() {
        assert_eq!(
            segment("- a\ntext"),
            vec![
                Block::List(List {
                    ordered: false,
                    items: vec!["a".into()],
                }),
                paragraph("text"),
            ]
        );
    }

    #[test]
    fn text_then_list_flushes() {
        assert_eq!(
            segment("intro\n1. first"),
            vec![
                paragraph("intro"),
                Block::List(List {
                    ordered: true,
                    items: vec!["first".into()],
                }),
            ]
        );
    }

    #[test]
    fn tab_after_marker_is_text() {
        assert_eq!(
            segment("#\tTitle\n-\titem"),
            vec![paragraph("#\tTitle\n-\titem")]
        );
    }

    #[test]
    fn blank_line_splits_lists() {
        assert_eq!(segment("- a\n\n- b").len(), 2);
    }

    #[test]
    fn bold_line_is_not_a_bullet() {
        assert_eq!(segment("**bold** start"), vec![paragraph("**bold** start")]);
    }

    #[test]
    fn blockquote_strips_one_marker() {
        assert_eq!(
            segment("> quoted\n>tight\n> > nested"),
            vec![Block::Blockquote {
                text: "quoted\ntight\n> nested".into()
            }]
        );
    }

    #[test]
    fn paragraph_then_quote_flushes() {
        assert_eq!(
            segment("text\n> quote"),
            vec![
                paragraph("text"),
                Block::Blockquote {
                    text: "quote".into()
                }
            ]
        );
    }

    #[test]
    fn code_fence_keeps_markdown_literal() {
        let blocks = segment("```\n# not a heading\n- not a list\n> not a quote\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: None,
                text: "# not a heading\n- not a list\n> not a quote".into()
            }]
        );
    }

    #[test]
    fn code_fence_then_heading_without_blank_line() {
        let blocks = segment("```\nline1\nline2\n```\n# Title");
        assert_eq!(
            blocks,
            vec![
                Block::Code {
                    language: None,
                    text: "line1\nline2".into()
                },
                Block::Heading {
                    level: 1,
                    text: "Title".into()
                },
            ]
        );
    }

    #[test]
    fn fence_language_is_recorded() {
        let blocks = segment("```rust\nfn main() {}\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: Some("rust".into()),
                text: "fn main() {}".into()
            }]
        );
    }

    #[test]
    fn fence_with_info_does_not_close() {
        let blocks = segment("````\n```python\nprint()\n```\n````");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: None,
                text: "```python\nprint()\n```".into()
            }]
        );
    }

    #[test]
    fn unclosed_fence_closes_at_end() {
        assert_eq!(
            segment("intro\n```\nlet x = 1;\n\nlet y = 2;"),
            vec![
                paragraph("intro"),
                Block::Code {
                    language: None,
                    text: "let x = 1;\n\nlet y = 2;".into()
                },
            ]
        );
    }

    #[test]
    fn empty_input_has_no_blocks() {
        assert!(segment("").is_empty());
        assert!(segment("\n  \n\n").is_empty());
    }

    #[test]
    fn heading_interrupts_paragraph() {
        assert_eq!(
            segment("para\n## Sub\nmore"),
            vec![
                paragraph("para"),
                Block::Heading {
                    level: 2,
                    text: "Sub".into()
                },
                paragraph("more"),
            ]
        );
    }

    #[test]
    fn content_survives_segmentation_in_order() {
        let source = "# Title\nIntro text\n\n- a\n- b\n1. one\n> quote\n```\ncode # here\n```\nclosing";
        let blocks = segment(source);
        let reconstructed: Vec<&str> = blocks
            .iter()
            .flat_map(Block::content_lines)
            .filter(|l| !l.trim().is_empty())
            .collect();
        assert_eq!(
            reconstructed,
            vec![
                "Title",
                "Intro text",
                "a",
                "b",
                "one",
                "quote",
                "code # here",
                "closing"
            ]
        );
    }
}
