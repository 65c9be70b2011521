//! The capability set every tool provides to the wizard.

use std::fmt;

use crate::artifact::ResultArtifact;
use crate::error::{Result, ToolError};
use crate::options::{OptionKey, ToolOptions};
use crate::progress::ProgressSink;
use crate::source::{Format, SourceFile};

/// Identifies each tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Compress,
    Merge,
    Grayscale,
    Repair,
    PdfToZip,
    TxtToPdf,
    PdfToTxt,
    PdfToDocx,
    DocxToPdf,
    PdfToPptx,
    PptxToPdf,
    ImageToPdf,
    PdfToImage,
}

impl ToolKind {
    pub const ALL: [ToolKind; 13] = [
        ToolKind::Compress,
        ToolKind::Merge,
        ToolKind::Grayscale,
        ToolKind::Repair,
        ToolKind::PdfToZip,
        ToolKind::TxtToPdf,
        ToolKind::PdfToTxt,
        ToolKind::PdfToDocx,
        ToolKind::DocxToPdf,
        ToolKind::PdfToPptx,
        ToolKind::PptxToPdf,
        ToolKind::ImageToPdf,
        ToolKind::PdfToImage,
    ];

    /// Canonical command-line name.
    pub fn slug(&self) -> &'static str {
        match self {
            ToolKind::Compress => "compress",
            ToolKind::Merge => "merge",
            ToolKind::Grayscale => "grayscale",
            ToolKind::Repair => "repair",
            ToolKind::PdfToZip => "pdf-to-zip",
            ToolKind::TxtToPdf => "txt-to-pdf",
            ToolKind::PdfToTxt => "pdf-to-txt",
            ToolKind::PdfToDocx => "pdf-to-word",
            ToolKind::DocxToPdf => "word-to-pdf",
            ToolKind::PdfToPptx => "pdf-to-ppt",
            ToolKind::PptxToPdf => "ppt-to-pdf",
            ToolKind::ImageToPdf => "jpg-to-pdf",
            ToolKind::PdfToImage => "pdf-to-jpg",
        }
    }

    /// Parse a tool name, accepting common aliases.
    pub fn from_slug(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "compress" | "compress-pdf" => Some(ToolKind::Compress),
            "merge" | "merge-pdf" => Some(ToolKind::Merge),
            "grayscale" | "greyscale" | "grayscale-pdf" => Some(ToolKind::Grayscale),
            "repair" | "repair-pdf" => Some(ToolKind::Repair),
            "pdf-to-zip" | "zip" => Some(ToolKind::PdfToZip),
            "txt-to-pdf" | "text-to-pdf" => Some(ToolKind::TxtToPdf),
            "pdf-to-txt" | "pdf-to-text" => Some(ToolKind::PdfToTxt),
            "pdf-to-word" | "pdf-to-docx" => Some(ToolKind::PdfToDocx),
            "word-to-pdf" | "docx-to-pdf" => Some(ToolKind::DocxToPdf),
            "pdf-to-ppt" | "pdf-to-pptx" | "pdf-to-powerpoint" => Some(ToolKind::PdfToPptx),
            "ppt-to-pdf" | "pptx-to-pdf" | "powerpoint-to-pdf" => Some(ToolKind::PptxToPdf),
            "jpg-to-pdf" | "image-to-pdf" | "png-to-pdf" => Some(ToolKind::ImageToPdf),
            "pdf-to-jpg" | "pdf-to-image" | "pdf-to-png" => Some(ToolKind::PdfToImage),
            _ => None,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Information computed when files are accepted, before processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub file_count: usize,
    /// Total page count across all files, when the tool computes one.
    pub page_count: Option<usize>,
}

/// A tool: validates input, describes its options, and processes files into
/// a single result artifact.
pub trait Tool: Send + Sync {
    /// Human-readable name of this tool.
    fn name(&self) -> &str;

    fn kind(&self) -> ToolKind;

    /// Formats accepted by this tool.
    fn accepts(&self) -> &[Format];

    /// Minimum and maximum number of files one run takes.
    fn file_count(&self) -> (usize, Option<usize>) {
        (1, Some(1))
    }

    /// Option keys this tool reads.
    fn option_keys(&self) -> &[OptionKey];

    /// Check one candidate file against the allow-list.
    fn validate(&self, file: &SourceFile) -> Result<()> {
        if file.matches_any(self.accepts()) {
            Ok(())
        } else {
            let allowed: Vec<String> = self.accepts().iter().map(|f| f.to_string()).collect();
            Err(ToolError::Rejected(format!(
                "{} ({}) is not supported by {}; expected {}",
                file.name,
                file.mime,
                self.name(),
                allowed.join(" or ")
            )))
        }
    }

    /// Inspect accepted files before processing. Failures here reject the upload.
    fn preview(&self, files: &[SourceFile]) -> Result<Preview> {
        Ok(Preview {
            file_count: files.len(),
            page_count: None,
        })
    }

    /// Run the transformation.
    fn process(
        &self,
        files: &[SourceFile],
        options: &ToolOptions,
        progress: &ProgressSink<'_>,
    ) -> Result<ResultArtifact>;
}
