use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures while assembling an output document.
///
/// Parsing never fails; only the final binary-assembly step does, and the
/// caller gets no partial output when it does.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported heading level {0} (expected 1-6)")]
    InvalidHeadingLevel(u8),

    #[error("failed to assemble DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to write document part: {0}")]
    Io(#[from] std::io::Error),

    #[error("Typst compilation failed: {0}")]
    Compile(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Failures while reading a transcript file.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("failed to parse transcript JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while loading a branding/layout config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid color {0:?} (expected #rrggbb)")]
    InvalidColor(String),
}
