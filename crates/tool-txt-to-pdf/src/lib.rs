//! TXT to PDF: lays plain text out on pages with word wrapping.

use printpdf::BuiltinFont;

use toolbox_core::artifact::ResultArtifact;
use toolbox_core::error::Result;
use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Tool, ToolKind};
use toolbox_render::{PageSetup, PdfWriter, RenderedPdf};
use toolbox_utils::encoding::{decode_to_utf8, normalize_text};

pub struct TxtToPdfTool;

impl Tool for TxtToPdfTool {
    fn name(&self) -> &str {
        "TXT to PDF"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::TxtToPdf
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Txt]
    }

    fn option_keys(&self) -> &[OptionKey] {
        &[
            OptionKey::FontSize,
            OptionKey::PageSize,
            OptionKey::Margin,
            OptionKey::LineHeight,
            OptionKey::OutputName,
        ]
    }

    fn process(
        &self,
        files: &[SourceFile],
        options: &ToolOptions,
        progress: &ProgressSink<'_>,
    ) -> Result<ResultArtifact> {
        let source = &files[0];
        let (text, encoding) = decode_to_utf8(&source.bytes);
        log::debug!("Decoded {} as {}", source.name, encoding);

        let rendered = render_text(
            source.stem(),
            &normalize_text(&text),
            PageSetup::from_options(options),
            progress,
        );
        log::info!(
            "Laid out {} line(s) on {} page(s)",
            rendered.lines,
            rendered.pages
        );

        let name = options.file_name_or(&format!("{}.pdf", source.stem()));
        Ok(ResultArtifact::new(name, Format::Pdf, rendered.bytes))
    }
}

/// Lay out `text` line by line; blank input lines stay blank.
pub fn render_text(
    title: &str,
    text: &str,
    setup: PageSetup,
    progress: &ProgressSink<'_>,
) -> RenderedPdf {
    let lines: Vec<&str> = text.lines().collect();
    progress.begin(lines.len(), "Laying out text");

    let mut writer = PdfWriter::new(title, setup);
    for line in lines {
        if line.trim().is_empty() {
            writer.blank_line();
        } else {
            writer.write_wrapped(line, setup.font_size, BuiltinFont::Helvetica);
        }
        progress.advance("line");
    }
    writer.finish()
}
