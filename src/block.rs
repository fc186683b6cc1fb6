/// Inline style of a [`Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStyle {
    Plain,
    Bold,
    Italic,
    BoldItalic,
    Code,
}

impl RunStyle {
    pub fn is_bold(self) -> bool {
        matches!(self, RunStyle::Bold | RunStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, RunStyle::Italic | RunStyle::BoldItalic)
    }
}

/// A contiguous span of text sharing one inline style, delimiters stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, RunStyle::Plain)
    }
}

/// A list (ordered or unordered). Items hold raw text; numbering is
/// assigned by the renderer starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<String>,
}

/// Block-level elements segmented from a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
    },
    /// Literal text between fences; never inline-formatted.
    Code {
        language: Option<String>,
        text: String,
    },
    List(List),
    Blockquote {
        text: String,
    },
    Paragraph {
        text: String,
    },
}

impl Block {
    /// Short name of the block kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "heading",
            Block::Code { .. } => "code",
            Block::List(_) => "list",
            Block::Blockquote { .. } => "blockquote",
            Block::Paragraph { .. } => "paragraph",
        }
    }

    /// Raw content with all structural markers stripped, one entry per
    /// source line.
    pub fn content_lines(&self) -> Vec<&str> {
        match self {
            Block::Heading { text, .. } => vec![text.as_str()],
            Block::Code { text, .. } => text.split('\n').collect(),
            Block::List(list) => list.items.iter().map(String::as_str).collect(),
            Block::Blockquote { text } | Block::Paragraph { text } => text.split('\n').collect(),
        }
    }
}
