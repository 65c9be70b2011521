//! User-selected input files and the formats tools accept.

use std::fmt;
use std::path::Path;

use crate::error::{Result, ToolError};

/// File formats the toolbox consumes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Pdf,
    Docx,
    Pptx,
    Png,
    Jpeg,
    Txt,
    Zip,
}

impl Format {
    /// Parse from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" | "jpe" => Some(Self::Jpeg),
            "txt" | "text" => Some(Self::Txt),
            "zip" => Some(Self::Zip),
            _ => None,
        }
    }

    /// Parse from a MIME type essence (parameters such as `; charset=` are ignored).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "application/pdf" | "application/x-pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Some(Self::Pptx)
            }
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "text/plain" => Some(Self::Txt),
            "application/zip" | "application/x-zip-compressed" => Some(Self::Zip),
            _ => None,
        }
    }

    /// Get the canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Txt => "txt",
            Self::Zip => "zip",
        }
    }

    /// Get MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Txt => "text/plain",
            Self::Zip => "application/zip",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}

/// A file selected by the user, held in memory for one wizard pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Create a source file with an explicitly declared MIME type.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Create a source file whose MIME type is guessed from the name's extension,
    /// the way a file picker declares it.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self { name, mime, bytes }
    }

    /// Read a file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ToolError::Io(std::io::Error::new(
                e.kind(),
                format!("Cannot read {}: {}", path.display(), e),
            ))
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("input")
            .to_string();
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("document")
    }

    /// Format derived from the declared MIME type, then from the extension.
    pub fn declared_format(&self) -> Option<Format> {
        Format::from_mime(&self.mime).or_else(|| {
            Path::new(&self.name)
                .extension()
                .and_then(|e| e.to_str())
                .and_then(Format::from_extension)
        })
    }

    /// Whether the declared MIME type or the extension is in `allowed`.
    pub fn matches_any(&self, allowed: &[Format]) -> bool {
        let by_mime = Format::from_mime(&self.mime);
        let by_ext = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Format::from_extension);
        allowed
            .iter()
            .any(|f| Some(*f) == by_mime || Some(*f) == by_ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_guesses_mime() {
        let file = SourceFile::from_bytes("report.pdf", b"%PDF-1.4".to_vec());
        assert_eq!(file.mime, "application/pdf");
        assert_eq!(file.size(), 8);
        assert_eq!(file.stem(), "report");
        assert_eq!(file.declared_format(), Some(Format::Pdf));
    }

    #[test]
    fn test_matches_by_mime_or_extension() {
        let by_mime = SourceFile::new("notes", "text/plain; charset=utf-8", b"hi".to_vec());
        assert!(by_mime.matches_any(&[Format::Txt]));

        let by_ext = SourceFile::new("notes.TXT", "application/octet-stream", b"hi".to_vec());
        assert!(by_ext.matches_any(&[Format::Txt]));

        let neither = SourceFile::new("photo.png", "image/png", vec![1, 2, 3]);
        assert!(!neither.matches_any(&[Format::Pdf, Format::Txt]));
    }

    #[test]
    fn test_format_round_trip_names() {
        for format in [
            Format::Pdf,
            Format::Docx,
            Format::Pptx,
            Format::Png,
            Format::Jpeg,
            Format::Txt,
            Format::Zip,
        ] {
            assert_eq!(Format::from_extension(format.extension()), Some(format));
            assert_eq!(Format::from_mime(format.mime_type()), Some(format));
        }
    }

    #[test]
    fn test_stem_fallback() {
        let file = SourceFile::new("", "application/pdf", vec![]);
        assert_eq!(file.stem(), "document");
    }
}
