//! Transcript input model.
//!
//! Messages arrive as JSON from the chat layer. `content` is either a plain
//! string or an array of content blocks; anything else degrades to empty
//! text instead of failing.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::TranscriptError;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Message content as supplied by the chat layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
    /// Any other shape (null, numbers, bare objects).
    Other(serde_json::Value),
}

impl Default for Content {
    fn default() -> Self {
        Content::Other(serde_json::Value::Null)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

/// One entry of an array-shaped `content`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    Text(String),
    Object {
        #[serde(default)]
        text: Option<String>,
    },
    Other(serde_json::Value),
}

impl ContentBlock {
    fn text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(text) => Some(text),
            ContentBlock::Object { text } => text.as_deref(),
            ContentBlock::Other(_) => None,
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Content,
    /// When the message was sent, if the chat layer recorded it.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn user(content: impl Into<Content>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Flatten message content into one plain-text string.
///
/// Array entries without non-empty text are dropped and the rest joined
/// with a blank line. Unrecognized shapes produce an empty string.
pub fn extract(content: &Content) -> String {
    match content {
        Content::Text(text) => text.clone(),
        Content::Blocks(blocks) => blocks
            .iter()
            .filter_map(ContentBlock::text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
        Content::Other(_) => String::new(),
    }
}

/// A transcript file: either a bare array of messages or an object with an
/// optional title.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TranscriptFile {
    Messages(Vec<Message>),
    Titled {
        #[serde(default)]
        title: Option<String>,
        messages: Vec<Message>,
    },
}

impl TranscriptFile {
    pub fn title(&self) -> Option<&str> {
        match self {
            TranscriptFile::Messages(_) => None,
            TranscriptFile::Titled { title, .. } => title.as_deref(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        match self {
            TranscriptFile::Messages(messages) | TranscriptFile::Titled { messages, .. } => {
                messages
            }
        }
    }
}

/// Parse transcript JSON.
pub fn parse_transcript(json: &str) -> Result<TranscriptFile, TranscriptError> {
    Ok(serde_json::from_str(json)?)
}
