//! PDF to PowerPoint: one slide per PDF page.
//!
//! The first non-empty line of a page becomes the slide title and the
//! remaining lines its body text.

pub mod package;

use toolbox_core::artifact::ResultArtifact;
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Preview, Tool, ToolKind};
use toolbox_utils::pdf;

pub use package::{Presentation, Slide};

pub struct PdfToPptxTool;

impl Tool for PdfToPptxTool {
    fn name(&self) -> &str {
        "PDF to PowerPoint"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::PdfToPptx
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

        let mut deck = Presentation::new(&title);
        deck.slides = pdf::page_texts(&doc, progress)
            .iter()
            .map(|(number, text)| page_slide(*number, text))
            .collect();
        log::info!("Built PPTX \"{}\" with {} slide(s)", title, deck.slides.len());

        let bytes = deck
            .to_bytes()
            .map_err(|e| ToolError::Pptx(format!("Failed to package PPTX: {}", e)))?;
        let name = options.file_name_or(&format!("{}.pptx", source.stem()));
        Ok(ResultArtifact::new(name, Format::Pptx, bytes))
    }
}

/// Slide for one page. Pages without text get a "Page N" title.
pub fn page_slide(number: u32, text: &str) -> Slide {
    let mut lines = text.lines().map(str::trim_end).skip_while(|l| l.trim().is_empty());
    let title = match lines.next() {
        Some(first) => first.trim().to_string(),
        None => format!("Page {}", number),
    };
    let mut body: Vec<String> = lines.map(str::to_string).collect();
    while body.last().is_some_and(|l| l.trim().is_empty()) {
        body.pop();
    }
    Slide { title, body }
}
