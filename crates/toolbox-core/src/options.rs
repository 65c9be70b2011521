//! Tool options collected before processing.
//!
//! A single flat record covers every tool; each tool declares which keys it
//! reads through [`crate::tool::Tool::option_keys`]. Values set through
//! [`ToolOptions::set`] are clamped to the same ranges a slider would allow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolError};

/// All user-adjustable parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolOptions {
    // -- General --
    /// Overrides the suggested output file name.
    pub output_name: Option<String>,

    // -- Compression --
    pub compression_level: CompressionLevel,

    // -- Text layout --
    pub font_size: f32,
    pub page_size: PageSize,
    pub margin_mm: f32,
    pub line_height: f32,

    // -- Images --
    pub jpeg_quality: u8,
    pub image_format: ImageFormat,
    pub dpi: u16,

    // -- Text extraction --
    pub page_markers: bool,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            output_name: None,
            compression_level: CompressionLevel::Medium,
            font_size: 12.0,
            page_size: PageSize::A4,
            margin_mm: 20.0,
            line_height: 1.4,
            jpeg_quality: 75,
            image_format: ImageFormat::Jpeg,
            dpi: 150,
            page_markers: true,
        }
    }
}

pub const FONT_SIZE_RANGE: (f32, f32) = (6.0, 72.0);
pub const MARGIN_RANGE: (f32, f32) = (0.0, 50.0);
pub const LINE_HEIGHT_RANGE: (f32, f32) = (1.0, 3.0);
pub const JPEG_QUALITY_RANGE: (u8, u8) = (1, 100);
pub const DPI_RANGE: (u16, u16) = (36, 600);

impl ToolOptions {
    /// Set an option from its textual form.
    ///
    /// Numeric values are clamped to the option's range; unknown keys and
    /// unparsable values are errors.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = OptionKey::from_name(key)
            .ok_or_else(|| ToolError::InvalidOption(format!("unknown option '{}'", key)))?;
        let value = value.trim();
        match key {
            OptionKey::OutputName => {
                self.output_name = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            OptionKey::CompressionLevel => self.compression_level = parse(key, value)?,
            OptionKey::FontSize => {
                self.font_size = parse_finite(key, value)?.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1)
            }
            OptionKey::PageSize => self.page_size = parse(key, value)?,
            OptionKey::Margin => {
                self.margin_mm = parse_finite(key, value)?.clamp(MARGIN_RANGE.0, MARGIN_RANGE.1)
            }
            OptionKey::LineHeight => {
                self.line_height =
                    parse_finite(key, value)?.clamp(LINE_HEIGHT_RANGE.0, LINE_HEIGHT_RANGE.1)
            }
            OptionKey::JpegQuality => {
                let q: i64 = parse(key, value)?;
                self.jpeg_quality =
                    q.clamp(JPEG_QUALITY_RANGE.0 as i64, JPEG_QUALITY_RANGE.1 as i64) as u8;
            }
            OptionKey::ImageFormat => self.image_format = parse(key, value)?,
            OptionKey::Dpi => {
                let dpi: i64 = parse(key, value)?;
                self.dpi = dpi.clamp(DPI_RANGE.0 as i64, DPI_RANGE.1 as i64) as u16;
            }
            OptionKey::PageMarkers => self.page_markers = parse_bool(key, value)?,
        }
        Ok(())
    }

    /// Current value of an option in the same textual form `set` accepts.
    pub fn get(&self, key: OptionKey) -> String {
        match key {
            OptionKey::OutputName => self.output_name.clone().unwrap_or_default(),
            OptionKey::CompressionLevel => self.compression_level.to_string(),
            OptionKey::FontSize => format!("{}", self.font_size),
            OptionKey::PageSize => self.page_size.to_string(),
            OptionKey::Margin => format!("{}", self.margin_mm),
            OptionKey::LineHeight => format!("{}", self.line_height),
            OptionKey::JpegQuality => self.jpeg_quality.to_string(),
            OptionKey::ImageFormat => self.image_format.to_string(),
            OptionKey::Dpi => self.dpi.to_string(),
            OptionKey::PageMarkers => self.page_markers.to_string(),
        }
    }

    /// The output file name: the user's override if set, otherwise `suggested`.
    /// The extension of `suggested` is appended to an override that lacks one.
    /// Directory components of the override are dropped.
    pub fn file_name_or(&self, suggested: &str) -> String {
        let name = self
            .output_name
            .as_deref()
            .map(str::trim)
            .and_then(|name| std::path::Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .map(str::trim);
        match name {
            Some(name) if !name.is_empty() => {
                let ext = std::path::Path::new(suggested)
                    .extension()
                    .and_then(|e| e.to_str());
                match ext {
                    Some(ext) if !name.to_lowercase().ends_with(&format!(".{}", ext)) => {
                        format!("{}.{}", name, ext)
                    }
                    _ => name.to_string(),
                }
            }
            _ => suggested.to_string(),
        }
    }
}

fn parse<T: FromStr>(key: OptionKey, value: &str) -> Result<T> {
    value.parse::<T>().map_err(|_| {
        ToolError::InvalidOption(format!("'{}' is not a valid value for {}", value, key.name()))
    })
}

fn parse_finite(key: OptionKey, value: &str) -> Result<f32> {
    let parsed: f32 = parse(key, value)?;
    if !parsed.is_finite() {
        return Err(ToolError::InvalidOption(format!(
            "'{}' is not a valid value for {}",
            value,
            key.name()
        )));
    }
    Ok(parsed)
}

fn parse_bool(key: OptionKey, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ToolError::InvalidOption(format!(
            "'{}' is not a valid value for {}",
            value,
            key.name()
        ))),
    }
}

/// Keys of the options collector, used by tools to describe their form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    OutputName,
    CompressionLevel,
    FontSize,
    PageSize,
    Margin,
    LineHeight,
    JpegQuality,
    ImageFormat,
    Dpi,
    PageMarkers,
}

impl OptionKey {
    pub const ALL: [OptionKey; 10] = [
        OptionKey::OutputName,
        OptionKey::CompressionLevel,
        OptionKey::FontSize,
        OptionKey::PageSize,
        OptionKey::Margin,
        OptionKey::LineHeight,
        OptionKey::JpegQuality,
        OptionKey::ImageFormat,
        OptionKey::Dpi,
        OptionKey::PageMarkers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OptionKey::OutputName => "output_name",
            OptionKey::CompressionLevel => "compression_level",
            OptionKey::FontSize => "font_size",
            OptionKey::PageSize => "page_size",
            OptionKey::Margin => "margin_mm",
            OptionKey::LineHeight => "line_height",
            OptionKey::JpegQuality => "jpeg_quality",
            OptionKey::ImageFormat => "image_format",
            OptionKey::Dpi => "dpi",
            OptionKey::PageMarkers => "page_markers",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "margin" => Some(OptionKey::Margin),
            "level" => Some(OptionKey::CompressionLevel),
            "quality" => Some(OptionKey::JpegQuality),
            "name" | "filename" => Some(OptionKey::OutputName),
            other => Self::ALL.iter().copied().find(|k| k.name() == other),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OptionKey::OutputName => "Output file name (extension added when missing)",
            OptionKey::CompressionLevel => "Compression level: low, medium, high",
            OptionKey::FontSize => "Font size in points (6-72)",
            OptionKey::PageSize => "Page size: a4, letter, legal",
            OptionKey::Margin => "Page margin in millimetres (0-50)",
            OptionKey::LineHeight => "Line height multiplier (1.0-3.0)",
            OptionKey::JpegQuality => "JPEG quality (1-100)",
            OptionKey::ImageFormat => "Image format: jpeg, png",
            OptionKey::Dpi => "Rendering resolution in DPI (36-600)",
            OptionKey::PageMarkers => "Insert page markers between pages (true/false)",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for CompressionLevel {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "recommended" => Ok(Self::Medium),
            "high" | "extreme" => Ok(Self::High),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageSize {
    /// Width and height in millimetres (portrait).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (215.9, 279.4),
            Self::Legal => (215.9, 355.6),
        }
    }
}

impl FromStr for PageSize {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.to_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A4 => "a4",
            Self::Letter => "letter",
            Self::Legal => "legal",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ToolOptions::default();
        assert_eq!(opts.compression_level, CompressionLevel::Medium);
        assert_eq!(opts.font_size, 12.0);
        assert_eq!(opts.page_size, PageSize::A4);
        assert!(opts.output_name.is_none());
    }

    #[test]
    fn test_set_clamps_numeric_values() {
        let mut opts = ToolOptions::default();
        opts.set("font_size", "200").unwrap();
        assert_eq!(opts.font_size, 72.0);
        opts.set("quality", "0").unwrap();
        assert_eq!(opts.jpeg_quality, 1);
        opts.set("dpi", "10000").unwrap();
        assert_eq!(opts.dpi, 600);
        opts.set("margin", "-4").unwrap();
        assert_eq!(opts.margin_mm, 0.0);
    }

    #[test]
    fn test_set_enums_and_flags() {
        let mut opts = ToolOptions::default();
        opts.set("level", "HIGH").unwrap();
        opts.set("page-size", "letter").unwrap();
        opts.set("image_format", "png").unwrap();
        opts.set("page_markers", "off").unwrap();
        assert_eq!(opts.compression_level, CompressionLevel::High);
        assert_eq!(opts.page_size, PageSize::Letter);
        assert_eq!(opts.image_format, ImageFormat::Png);
        assert!(!opts.page_markers);
    }

    #[test]
    fn test_set_rejects_unknown_or_unparsable() {
        let mut opts = ToolOptions::default();
        assert!(matches!(
            opts.set("colour", "red"),
            Err(ToolError::InvalidOption(_))
        ));
        assert!(matches!(
            opts.set("font_size", "big"),
            Err(ToolError::InvalidOption(_))
        ));
        assert_eq!(opts, ToolOptions::default());
    }

    #[test]
    fn test_set_rejects_non_finite_numbers() {
        let mut opts = ToolOptions::default();
        for key in ["font_size", "margin_mm", "line_height"] {
            for value in ["nan", "NaN", "inf", "-inf", "infinity"] {
                assert!(
                    matches!(opts.set(key, value), Err(ToolError::InvalidOption(_))),
                    "{} = {}",
                    key,
                    value
                );
            }
        }
        assert_eq!(opts, ToolOptions::default());
    }

    #[test]
    fn test_get_matches_set() {
        let mut opts = ToolOptions::default();
        for key in OptionKey::ALL {
            let value = opts.get(key);
            if key == OptionKey::OutputName {
                continue;
            }
            opts.set(key.name(), &value).unwrap();
        }
        assert_eq!(opts, ToolOptions::default());
    }

    #[test]
    fn test_file_name_or() {
        let mut opts = ToolOptions::default();
        assert_eq!(opts.file_name_or("merged.pdf"), "merged.pdf");
        opts.output_name = Some("final".to_string());
        assert_eq!(opts.file_name_or("merged.pdf"), "final.pdf");
        opts.output_name = Some("final.PDF".to_string());
        assert_eq!(opts.file_name_or("merged.pdf"), "final.PDF");
        opts.output_name = Some("  ".to_string());
        assert_eq!(opts.file_name_or("merged.pdf"), "merged.pdf");
    }

    #[test]
    fn test_file_name_or_drops_directories() {
        let mut opts = ToolOptions::default();
        opts.output_name = Some("../x".to_string());
        assert_eq!(opts.file_name_or("merged.pdf"), "x.pdf");
        opts.output_name = Some("a/b".to_string());
        assert_eq!(opts.file_name_or("merged.pdf"), "b.pdf");
        opts.output_name = Some("/etc/passwd".to_string());
        assert_eq!(opts.file_name_or("merged.pdf"), "passwd.pdf");
        opts.output_name = Some("..".to_string());
        assert_eq!(opts.file_name_or("merged.pdf"), "merged.pdf");
    }

    #[test]
    fn test_toml_partial_config() {
        let toml_str = r#"
compression_level = "high"
font_size = 10.5
page_size = "legal"
"#;
        let opts: ToolOptions = toml::from_str(toml_str).unwrap();
        assert_eq!(opts.compression_level, CompressionLevel::High);
        assert_eq!(opts.font_size, 10.5);
        assert_eq!(opts.page_size, PageSize::Legal);
        // Defaults filled in
        assert_eq!(opts.jpeg_quality, 75);
        assert!(opts.page_markers);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut opts = ToolOptions::default();
        opts.output_name = Some("out".to_string());
        opts.image_format = ImageFormat::Png;
        opts.dpi = 300;
        let serialized = toml::to_string_pretty(&opts).unwrap();
        let parsed: ToolOptions = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, opts);
    }
}
