//! PDF to Word: re-flows extracted page text into a DOCX document.
//!
//! Each text line becomes a paragraph and every PDF page after the first
//! starts with a page break. Layout, fonts and images are not carried over.

pub mod package;

use toolbox_core::artifact::ResultArtifact;
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Preview, Tool, ToolKind};
use toolbox_utils::pdf;

pub use package::{Block, DocxDocument};

pub struct PdfToDocxTool;

impl Tool for PdfToDocxTool {
    fn name(&self) -> &str {
        "PDF to Word"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::PdfToDocx
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Pdf]
    }

    fn option_keys(&self) -> &[OptionKey] {
        &[OptionKey::OutputName]
    }

    fn preview(&self, files: &[SourceFile]) -> Result<Preview> {
        Ok(Preview {
            file_count: files.len(),
            page_count: Some(pdf::page_count(&files[0].bytes)?),
        })
    }

    fn process(
        &self,
        files: &[SourceFile],
        options: &ToolOptions,
        progress: &ProgressSink<'_>,
    ) -> Result<ResultArtifact> {
        let source = &files[0];
        let doc = pdf::load(&source.bytes)?;
        let title = pdf::info_string(&doc, "Title").unwrap_or_else(|| source.stem().to_string());

        let pages = pdf::page_texts(&doc, progress);
        if pages.iter().all(|(_, text)| text.trim().is_empty()) {
            return Err(ToolError::NoText(source.name.clone()));
        }

        let docx = build_document(&title, &pages);
        log::info!(
            "Built DOCX \"{}\": {} paragraph(s) from {} page(s)",
            title,
            docx.paragraph_count(),
            pages.len()
        );
        let bytes = docx
            .to_bytes()
            .map_err(|e| ToolError::Docx(format!("Failed to package DOCX: {}", e)))?;

        let name = options.file_name_or(&format!("{}.docx", source.stem()));
        Ok(ResultArtifact::new(name, Format::Docx, bytes))
    }
}

/// One paragraph per text line, a page break between pages.
pub fn build_document(title: &str, pages: &[(u32, String)]) -> DocxDocument {
    let mut docx = DocxDocument::new(title);
    for (i, (_, text)) in pages.iter().enumerate() {
        if i > 0 {
            docx.page_break();
        }
        for line in text.lines() {
            docx.paragraph(line.trim_end());
        }
    }
    docx
}
