//! Word to PDF: renders the text structure of a DOCX document.
//!
//! Headings, paragraphs, list items, table rows and embedded raster images
//! are laid out with the shared PDF writer. Fonts, colours and exact
//! positioning are not reproduced.

pub mod document;
pub mod metadata;
pub mod styles;

use std::collections::HashMap;

use toolbox_core::artifact::ResultArtifact;
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Tool, ToolKind};
use toolbox_render::{PageSetup, PdfWriter, RenderedPdf};
use toolbox_utils::archive;

pub use document::Block;

pub struct DocxToPdfTool;

impl Tool for DocxToPdfTool {
    fn name(&self) -> &str {
        "Word to PDF"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::DocxToPdf
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Docx]
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
        progress.indeterminate("Reading document");
        let parsed = DocxContent::parse(&source.bytes)?;
        let title = parsed
            .properties
            .title
            .clone()
            .unwrap_or_else(|| source.stem().to_string());
        log::info!("Parsed DOCX \"{}\": {} block(s)", title, parsed.blocks.len());

        let rendered = render_blocks(&title, &parsed, PageSetup::from_options(options), progress);
        let name = options.file_name_or(&format!("{}.pdf", source.stem()));
        Ok(ResultArtifact::new(name, Format::Pdf, rendered.bytes))
    }
}

/// Everything read out of a DOCX package.
pub struct DocxContent {
    pub blocks: Vec<Block>,
    pub properties: metadata::CoreProperties,
    /// Image bytes keyed by their target path relative to `word/`.
    pub media: HashMap<String, Vec<u8>>,
}

impl DocxContent {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let entries = archive::list_entries(bytes)
            .map_err(|e| ToolError::Docx(format!("Not a DOCX package: {}", e)))?;
        let doc_xml = archive::read_entry_string(bytes, "word/document.xml")
            .map_err(|e| ToolError::Docx(format!("Missing word/document.xml: {}", e)))?;

        let part = |name: &str| archive::read_entry_string(bytes, name).ok();
        let rels = part("word/_rels/document.xml.rels")
            .map(|xml| document::parse_relationships(&xml))
            .unwrap_or_default();
        let style_map = part("word/styles.xml")
            .map(|xml| styles::parse_styles(&xml))
            .unwrap_or_default();
        let numbering = part("word/numbering.xml")
            .map(|xml| styles::parse_numbering(&xml))
            .unwrap_or_default();
        let properties = part("docProps/core.xml")
            .map(|xml| metadata::parse_core_properties(&xml))
            .unwrap_or_default();

        let blocks = document::parse_document(&doc_xml, &rels, &style_map, &numbering);

        let mut media = HashMap::new();
        for block in &blocks {
            if let Block::Image(target) = block {
                let path = archive::resolve_target("word", target);
                if !entries.contains(&path) {
                    log::warn!("Image {} is not in the package", path);
                    continue;
                }
                match archive::read_entry(bytes, &path) {
                    Ok(data) => {
                        media.insert(target.clone(), data);
                    }
                    Err(e) => log::warn!("Could not read {}: {}", path, e),
                }
            }
        }

        Ok(Self {
            blocks,
            properties,
            media,
        })
    }
}

/// Lay the blocks out on pages, reporting one unit per block.
pub fn render_blocks(
    title: &str,
    content: &DocxContent,
    setup: PageSetup,
    progress: &ProgressSink<'_>,
) -> RenderedPdf {
    let mut writer = PdfWriter::new(title, setup);
    progress.begin(content.blocks.len(), "Rendering");

    for block in &content.blocks {
        match block {
            Block::Heading { level, text } => writer.heading(text, *level),
            Block::Paragraph(text) => writer.paragraph(text),
            Block::ListItem {
                marker,
                text,
                depth,
            } => writer.list_item(marker, text, *depth),
            Block::TableRow(cells) => writer.paragraph(&cells.join(" | ")),
            Block::Image(target) => match content.media.get(target) {
                Some(data) => {
                    if let Err(e) = writer.add_image(data) {
                        log::warn!("Skipping image {}: {}", target, e);
                    }
                }
                None => log::debug!("No data for image {}", target),
            },
            Block::PageBreak => writer.page_break(),
        }
        progress.advance("Block");
    }

    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use toolbox_utils::archive::ZipBuilder;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<w:body>
  <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Annual Report</w:t></w:r></w:p>
  <w:p><w:r><w:t>Revenue grew across every region.</w:t></w:r></w:p>
  <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>North</w:t></w:r></w:p>
  <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Q1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>10</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
  <w:p><w:r><w:drawing><a:blip r:embed="rId5"/></w:drawing></w:r></w:p>
</w:body>
</w:document>"#;

    const STYLES: &str = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
</w:styles>"#;

    const RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/chart.png"/>
</Relationships>"#;

    fn png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(20, 10, image::Rgb([200, 30, 30]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn sample_docx() -> Vec<u8> {
        let mut zip = ZipBuilder::new();
        zip.add_file("word/document.xml", DOCUMENT.as_bytes()).unwrap();
        zip.add_file("word/styles.xml", STYLES.as_bytes()).unwrap();
        zip.add_file("word/_rels/document.xml.rels", RELS.as_bytes()).unwrap();
        zip.add_file("word/media/chart.png", &png()).unwrap();
        zip.finish().unwrap()
    }

    #[test]
    fn test_parse_package() {
        let content = DocxContent::parse(&sample_docx()).unwrap();
        assert_eq!(
            content.blocks[0],
            Block::Heading {
                level: 1,
                text: "Annual Report".to_string()
            }
        );
        assert!(content
            .blocks
            .contains(&Block::TableRow(vec!["Q1".to_string(), "10".to_string()])));
        assert!(content.media.contains_key("media/chart.png"));
    }

    #[test]
    fn test_renders_pdf() {
        let file = SourceFile::from_bytes("report.docx", sample_docx());
        let artifact = DocxToPdfTool
            .process(&[file], &ToolOptions::default(), &ProgressSink::silent())
            .unwrap();
        assert_eq!(artifact.file_name, "report.pdf");
        let doc = lopdf::Document::load_mem(&artifact.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_not_a_zip() {
        let file = SourceFile::from_bytes("fake.docx", b"plain text pretending".to_vec());
        let result = DocxToPdfTool.process(&[file], &ToolOptions::default(), &ProgressSink::silent());
        assert!(matches!(result, Err(ToolError::Docx(_))));
    }

    #[test]
    fn test_zip_without_document_part() {
        let mut zip = ZipBuilder::new();
        zip.add_file("hello.txt", b"hi").unwrap();
        let bytes = zip.finish().unwrap();
        assert!(matches!(DocxContent::parse(&bytes), Err(ToolError::Docx(_))));
    }
}
