use crate::block::{Run, RunStyle};

/// An inline span delimiter and the style it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matcher {
    pub delimiter: &'static str,
    pub style: RunStyle,
}

/// Inline matchers in precedence order. At each position the first matcher
/// that yields a complete span wins.
pub const MATCHERS: [Matcher; 4] = [
    Matcher {
        delimiter: "***",
        style: RunStyle::BoldItalic,
    },
    Matcher {
        delimiter: "**",
        style: RunStyle::Bold,
    },
    Matcher {
        delimiter: "*",
        style: RunStyle::Italic,
    },
    Matcher {
        delimiter: "`",
        style: RunStyle::Code,
    },
];

/// Tokenize a block's raw text into styled runs.
///
/// Spans do not nest: once a span opens, everything up to its closer is
/// opaque text of that span. Text between spans becomes `Plain` runs with
/// whitespace preserved. Empty input yields no runs.
pub fn format_inline(text: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while pos < text.len() {
        if let Some((style, inner, end)) = match_at(text, pos) {
            if plain_start < pos {
                runs.push(Run::plain(&text[plain_start..pos]));
            }
            runs.push(Run::new(inner, style));
            pos = end;
            plain_start = end;
        } else {
            pos += text[pos..].chars().next().map_or(1, char::len_utf8);
        }
    }

    if plain_start < text.len() {
        runs.push(Run::plain(&text[plain_start..]));
    }

    runs
}

/// Try every matcher at `pos`, returning the style, inner text and the byte
/// offset just past the closing delimiter.
fn match_at(text: &str, pos: usize) -> Option<(RunStyle, &str, usize)> {
    let rest = &text[pos..];
    MATCHERS.iter().find_map(|matcher| {
        let delim = matcher.delimiter;
        let after_open = rest.strip_prefix(delim)?;
        // Inner text needs at least one character before the closer is searched
        let first = after_open.chars().next()?;
        if first == '\n' {
            return None;
        }
        let search_from = first.len_utf8();
        let close = after_open[search_from..].find(delim)? + search_from;
        let inner = &after_open[..close];
        if inner.contains('\n') {
            return None;
        }
        Some((matcher.style, inner, pos + delim.len() * 2 + close))
    })
}

/// Concatenated text of the runs, markers stripped.
pub fn plain_text(runs: &[Run]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_markers_is_one_plain_run() {
        assert_eq!(
            format_inline("just some text, nothing else"),
            vec![Run::plain("just some text, nothing else")]
        );
    }

    #[test]
    fn empty_input_has_no_runs() {
        assert!(format_inline("").is_empty());
    }

    #[test]
    fn bold_between_plain() {
        assert_eq!(
            format_inline("say **bold** now"),
            vec![
                Run::plain("say "),
                Run::new("bold", RunStyle::Bold),
                Run::plain(" now"),
            ]
        );
    }

    #[test]
    fn boundary_runs_are_omitted() {
        assert_eq!(
            format_inline("**Hi** there"),
            vec![Run::new("Hi", RunStyle::Bold), Run::plain(" there")]
        );
        assert_eq!(
            format_inline("**bold**"),
            vec![Run::new("bold", RunStyle::Bold)]
        );
    }

    #[test]
    fn each_style() {
        assert_eq!(
            format_inline("***a*** **b** *c* `d`"),
            vec![
                Run::new("a", RunStyle::BoldItalic),
                Run::plain(" "),
                Run::new("b", RunStyle::Bold),
                Run::plain(" "),
                Run::new("c", RunStyle::Italic),
                Run::plain(" "),
                Run::new("d", RunStyle::Code),
            ]
        );
    }

    #[test]
    fn bold_is_opaque_to_italic_markers() {
        assert_eq!(
            format_inline("**a*b**"),
            vec![Run::new("a*b", RunStyle::Bold)]
        );
    }

    #[test]
    fn code_span_keeps_asterisks() {
        assert_eq!(
            format_inline("run `a * b` now"),
            vec![
                Run::plain("run "),
                Run::new("a * b", RunStyle::Code),
                Run::plain(" now"),
            ]
        );
    }

    #[test]
    fn unclosed_marker_stays_plain() {
        assert_eq!(
            format_inline("2 * 3 = 6"),
            vec![Run::plain("2 * 3 = 6")]
        );
        assert_eq!(format_inline("`open"), vec![Run::plain("`open")]);
    }

    #[test]
    fn spans_do_not_cross_lines() {
        assert_eq!(
            format_inline("*a\nb*"),
            vec![Run::plain("*a\nb*")]
        );
    }

    #[test]
    fn lone_triple_star_reads_as_italic_star() {
        assert_eq!(format_inline("***"), vec![Run::new("*", RunStyle::Italic)]);
    }

    #[test]
    fn multibyte_text_survives() {
        assert_eq!(
            format_inline("héllo *wörld* ✓"),
            vec![
                Run::plain("héllo "),
                Run::new("wörld", RunStyle::Italic),
                Run::plain(" ✓"),
            ]
        );
    }

    #[test]
    fn stripping_markers_preserves_text() {
        let source = "a **b** c *d* e `f` g ***h***";
        assert_eq!(plain_text(&format_inline(source)), "a b c d e f g h");
    }

    #[test]
    fn precedence_is_longest_first() {
        let delimiters: Vec<&str> = MATCHERS.iter().map(|m| m.delimiter).collect();
        assert_eq!(delimiters, vec!["***", "**", "*", "`"]);
    }
}
