use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::message::Role;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Branding and page-layout constants shared by both renderers.
///
/// Read-only for the duration of an export; never mutated by a renderer.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub brand: BrandConfig,
    pub palette: Palette,
    pub page: PageConfig,
    pub font: FontConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    pub organization: String,
    pub user_label: String,
    pub assistant_label: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            organization: "Meridian Labs".to_string(),
            user_label: "User".to_string(),
            assistant_label: "Assistant".to_string(),
        }
    }
}

/// An sRGB color parsed from `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse(hex: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Uppercase hex without `#`, as WordprocessingML expects.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub user: Color,
    pub assistant: Color,
    pub text: Color,
    pub muted: Color,
    pub code_background: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: Color::rgb(0x1f, 0x3a, 0x5f),
            secondary: Color::rgb(0x3b, 0x82, 0xf6),
            user: Color::rgb(0x25, 0x63, 0xeb),
            assistant: Color::rgb(0x7c, 0x3a, 0xed),
            text: Color::rgb(0x1f, 0x29, 0x37),
            muted: Color::rgb(0x6b, 0x72, 0x80),
            code_background: Color::rgb(0xf3, 0xf4, 0xf6),
        }
    }
}

/// PDF page geometry, in points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub header_height: f64,
    pub footer_height: f64,
    /// Remaining space below which a new page is started before a block.
    pub break_threshold: f64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            margin: 50.0,
            header_height: 30.0,
            footer_height: 30.0,
            break_threshold: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// PDF body family (must be available to Typst).
    pub body: String,
    /// PDF monospace family.
    pub mono: String,
    /// DOCX body family.
    pub docx_body: String,
    /// DOCX monospace family.
    pub docx_mono: String,
    pub title_size: f64,
    pub body_size: f64,
    pub code_size: f64,
    pub small_size: f64,
    /// Heading sizes for levels 1 through 6.
    pub heading_sizes: [f64; 6],
    /// Line height as a multiple of font size.
    pub line_height: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            body: "Libertinus Serif".to_string(),
            mono: "DejaVu Sans Mono".to_string(),
            docx_body: "Calibri".to_string(),
            docx_mono: "Consolas".to_string(),
            title_size: 22.0,
            body_size: 11.0,
            code_size: 9.0,
            small_size: 9.0,
            heading_sizes: [20.0, 17.0, 15.0, 13.0, 12.0, 11.0],
            line_height: 1.4,
        }
    }
}

impl FontConfig {
    /// Font size for a heading level; out-of-range levels clamp to 1..=6.
    pub fn heading_size(&self, level: u8) -> f64 {
        let index = usize::from(level.clamp(1, 6)) - 1;
        self.heading_sizes[index]
    }
}

impl Config {
    /// The defaults shipped in `default_config.toml`.
    pub fn compiled_default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            warn!("shipped default_config.toml does not match Config, using built-in defaults: {e}");
            Self::default()
        })
    }

    /// Load config from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            config_path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            config_path: path.to_path_buf(),
            source,
        })
    }

    /// Label color for a role.
    pub fn role_color(&self, role: Role) -> Color {
        match role {
            Role::User => self.palette.user,
            Role::Assistant => self.palette.assistant,
        }
    }

    /// Display label for a role.
    pub fn role_label(&self, role: Role) -> &str {
        match role {
            Role::User => &self.brand.user_label,
            Role::Assistant => &self.brand.assistant_label,
        }
    }
}
