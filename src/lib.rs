//! Render chat transcripts to branded DOCX and PDF documents.
//!
//! The pipeline is the same for both formats: message content is flattened
//! to text ([`extract`]), split into blocks ([`segment`]), and block text is
//! tokenized into styled runs ([`format_inline`]). The DOCX renderer leaves
//! pagination to the word processor; the PDF renderer paginates itself
//! ([`layout`]) and hands absolutely positioned pages to Typst.
//!
//! ```no_run
//! use chatdoc::{Config, ExportFormat, ExportOptions, Message, export};
//!
//! let messages = vec![
//!     Message::user("Hello"),
//!     Message::assistant("**Hi** there"),
//! ];
//! let pdf = export(&messages, ExportFormat::Pdf, &ExportOptions::default(), &Config::compiled_default())?;
//! std::fs::write("chat.pdf", &pdf.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod block;
mod config;
pub mod docx;
mod error;
mod inline;
pub mod layout;
mod message;
pub mod metrics;
mod parser;
mod transcript;
mod typst;

pub use block::{Block, List, Run, RunStyle};
pub use config::{BrandConfig, Color, Config, FontConfig, PageConfig, Palette};
pub use error::{ConfigError, ExportError, TranscriptError};
pub use inline::{MATCHERS, Matcher, format_inline, plain_text};
pub use message::{Content, ContentBlock, Message, Role, TranscriptFile, extract, parse_transcript};
pub use parser::segment;
pub use transcript::{Export, ExportFormat, ExportOptions, Section, Transcript};

use tracing::debug;

/// Render messages to a DOCX package.
pub fn render_docx(
    messages: &[Message],
    options: &ExportOptions,
    config: &Config,
) -> Result<Vec<u8>, ExportError> {
    let transcript = Transcript::from_messages(messages);
    docx::build_document(&transcript, options, config)?.to_bytes()
}

/// Convert messages to the Typst markup the PDF renderer compiles.
pub fn transcript_to_typst(
    messages: &[Message],
    options: &ExportOptions,
    config: &Config,
) -> Result<String, ExportError> {
    let transcript = Transcript::from_messages(messages);
    let pages = layout::layout(&transcript, options, config)?;
    Ok(typst::to_markup(&pages, options, config))
}

/// Render messages to PDF bytes.
pub fn render_pdf(
    messages: &[Message],
    options: &ExportOptions,
    config: &Config,
) -> Result<Vec<u8>, ExportError> {
    typst::compile_pdf(transcript_to_typst(messages, options, config)?)
}

/// Render messages in the requested format.
pub fn export(
    messages: &[Message],
    format: ExportFormat,
    options: &ExportOptions,
    config: &Config,
) -> Result<Export, ExportError> {
    debug!(messages = messages.len(), ?format, "exporting transcript");
    let bytes = match format {
        ExportFormat::Docx => render_docx(messages, options, config)?,
        ExportFormat::Pdf => render_pdf(messages, options, config)?,
    };
    debug!(bytes = bytes.len(), ?format, "export finished");
    Ok(Export { format, bytes })
}
