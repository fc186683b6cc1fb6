use chrono::{DateTime, Local, Utc};
use tracing::{debug, warn};

use crate::block::Block;
use crate::config::Config;
use crate::message::{Message, Role, extract};
use crate::parser::segment;

/// One message, segmented and ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub role: Role,
    pub timestamp: Option<DateTime<Utc>>,
    pub blocks: Vec<Block>,
}

/// A whole conversation in block form. Built fresh for every export call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub sections: Vec<Section>,
}

impl Transcript {
    /// Extract and segment every message, skipping those with no text.
    pub fn from_messages(messages: &[Message]) -> Self {
        let mut sections = Vec::with_capacity(messages.len());

        for (index, message) in messages.iter().enumerate() {
            let text = extract(&message.content);
            if text.trim().is_empty() {
                warn!(index, role = ?message.role, "skipping message with no text content");
                continue;
            }
            let blocks = segment(&text);
            debug!(
                index,
                role = ?message.role,
                blocks = ?blocks.iter().map(Block::kind).collect::<Vec<_>>(),
                "segmented message"
            );
            sections.push(Section {
                role: message.role,
                timestamp: message.timestamp,
                blocks,
            });
        }

        Self { sections }
    }

    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }
}

/// Per-call export options.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub title: String,
    /// Print the export time under the title and message times next to
    /// role labels.
    pub include_timestamps: bool,
    /// Document author; the organization name when unset.
    pub author: Option<String>,
    pub exported_at: DateTime<Local>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: "Chat Transcript".to_string(),
            include_timestamps: true,
            author: None,
            exported_at: Local::now(),
        }
    }
}

impl ExportOptions {
    pub fn author<'a>(&'a self, config: &'a Config) -> &'a str {
        self.author.as_deref().unwrap_or(&config.brand.organization)
    }

    /// Subtitle line under the title, if timestamps are enabled.
    pub fn subtitle(&self) -> Option<String> {
        self.include_timestamps.then(|| {
            format!(
                "Exported on {}",
                self.exported_at.format("%B %-d, %Y at %H:%M")
            )
        })
    }

    /// Timestamp suffix for a role label.
    pub fn message_time(&self, timestamp: Option<DateTime<Utc>>) -> Option<String> {
        if !self.include_timestamps {
            return None;
        }
        timestamp.map(|ts| {
            ts.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
    }
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

/// A finished export: the document bytes and their format.
#[derive(Debug, Clone)]
pub struct Export {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Export {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Content;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_messages_are_skipped() {
        let messages = vec![
            Message::user("Hello"),
            Message::assistant("   \n"),
            Message::new(Role::Assistant, Content::default()),
            Message::assistant("Hi"),
        ];
        let transcript = Transcript::from_messages(&messages);
        let roles: Vec<Role> = transcript.sections.iter().map(|s| s.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn sections_keep_timestamps_and_blocks() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let messages = vec![Message::user("# Title\n\nbody").with_timestamp(ts)];
        let transcript = Transcript::from_messages(&messages);
        assert_eq!(transcript.sections[0].timestamp, Some(ts));
        assert_eq!(transcript.block_count(), 2);
    }

    #[test]
    fn author_defaults_to_organization() {
        let config = Config::default();
        let mut options = ExportOptions::default();
        assert_eq!(options.author(&config), config.brand.organization);
        options.author = Some("Dana".into());
        assert_eq!(options.author(&config), "Dana");
    }

    #[test]
    fn timestamps_can_be_disabled() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let mut options = ExportOptions::default();
        assert!(options.subtitle().unwrap().starts_with("Exported on "));
        assert!(options.message_time(Some(ts)).is_some());

        options.include_timestamps = false;
        assert_eq!(options.subtitle(), None);
        assert_eq!(options.message_time(Some(ts)), None);
    }

    #[test]
    fn format_metadata() {
        assert_eq!(ExportFormat::Pdf.extension(), "pdf");
        assert_eq!(ExportFormat::Pdf.mime_type(), "application/pdf");
        assert!(ExportFormat::Docx.mime_type().ends_with("wordprocessingml.document"));
    }
}
