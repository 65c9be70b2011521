//! PDF to TXT: extracts the text of every page.
//!
//! Text comes from lopdf's content-stream parser. Pages whose text cannot be
//! decoded contribute nothing; a document with no text at all is an error
//! rather than an empty file.

use toolbox_core::artifact::ResultArtifact;
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Preview, Tool, ToolKind};
use toolbox_utils::pdf;

pub struct PdfToTxtTool;

impl Tool for PdfToTxtTool {
    fn name(&self) -> &str {
        "PDF to TXT"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::PdfToTxt
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Pdf]
    }

    fn option_keys(&self) -> &[OptionKey] {
        &[OptionKey::PageMarkers, OptionKey::OutputName]
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
        let pages = pdf::page_texts(&doc, progress);
        if pages.iter().all(|(_, text)| text.trim().is_empty()) {
            return Err(ToolError::NoText(source.name.clone()));
        }

        let text = join_pages(&pages, options.page_markers);
        log::info!(
            "Extracted {} character(s) from {} page(s)",
            text.chars().count(),
            pages.len()
        );
        let name = options.file_name_or(&format!("{}.txt", source.stem()));
        Ok(ResultArtifact::new(name, Format::Txt, text.into_bytes()))
    }
}

/// Join page texts, optionally preceded by `--- Page N ---` markers.
pub fn join_pages(pages: &[(u32, String)], markers: bool) -> String {
    let mut out = String::new();
    for (i, (number, text)) in pages.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        if markers {
            out.push_str(&format!("--- Page {} ---\n", number));
        }
        out.push_str(text);
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbox_utils::fixtures::PdfFixture;

    fn run(bytes: Vec<u8>, markers: bool) -> Result<ResultArtifact> {
        let mut options = ToolOptions::default();
        options.page_markers = markers;
        PdfToTxtTool.process(
            &[SourceFile::from_bytes("doc.pdf", bytes)],
            &options,
            &ProgressSink::silent(),
        )
    }

    #[test]
    fn test_text_with_markers() {
        let bytes = PdfFixture::new()
            .page(&["First page text"])
            .page(&["Second page text"])
            .build();
        let artifact = run(bytes, true).unwrap();
        assert_eq!(artifact.file_name, "doc.txt");
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.contains("--- Page 1 ---"));
        assert!(text.contains("--- Page 2 ---"));
        assert!(text.find("First").unwrap() < text.find("Second").unwrap());
    }

    #[test]
    fn test_without_markers() {
        let bytes = PdfFixture::new().page(&["Only text"]).build();
        let text = String::from_utf8(run(bytes, false).unwrap().bytes).unwrap();
        assert!(!text.contains("--- Page"));
        assert!(text.contains("Only text"));
    }

    #[test]
    fn test_no_text_is_error() {
        let bytes = PdfFixture::new().image_page(8, 8).build();
        assert!(matches!(run(bytes, true), Err(ToolError::NoText(_))));
    }

    #[test]
    fn test_join_pages() {
        let pages = vec![(1, "a".to_string()), (2, "b".to_string())];
        assert_eq!(join_pages(&pages, false), "a\n\nb\n");
        assert_eq!(
            join_pages(&pages, true),
            "--- Page 1 ---\na\n\n--- Page 2 ---\nb\n"
        );
    }
}
