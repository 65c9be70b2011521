//! PDF to JPG: rasterizes every page with `pdftoppm`.
//!
//! A single-page document yields one image. Longer documents yield a ZIP
//! archive with one image per page, named `{stem}-page-{n}.{ext}`.

pub mod render;

use toolbox_core::artifact::ResultArtifact;
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{ImageFormat, OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Preview, Tool, ToolKind};
use toolbox_utils::archive::ZipBuilder;
use toolbox_utils::pdf;

pub use render::{check_pdftoppm, RenderSettings};

pub struct PdfToImageTool;

impl Tool for PdfToImageTool {
    fn name(&self) -> &str {
        "PDF to JPG"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::PdfToImage
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Pdf]
    }

    fn option_keys(&self) -> &[OptionKey] {
        &[
            OptionKey::ImageFormat,
            OptionKey::Dpi,
            OptionKey::JpegQuality,
            OptionKey::OutputName,
        ]
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
        let page_count = pdf::page_count(&source.bytes)? as u32;
        if page_count == 0 {
            return Err(ToolError::Pdf(format!("{} has no pages", source.name)));
        }

        let settings = RenderSettings {
            format: options.image_format,
            dpi: options.dpi,
            jpeg_quality: options.jpeg_quality,
        };
        let pages = render::render_pages(&source.bytes, page_count, &settings, progress)?;
        package_pages(source.stem(), pages, settings.format, options)
    }
}

/// Name of the image for one page inside the archive.
pub fn page_file_name(stem: &str, page: u32, format: ImageFormat) -> String {
    format!("{}-page-{}.{}", stem, page, format.extension())
}

/// One page becomes the artifact itself; several are stored in a ZIP.
pub fn package_pages(
    stem: &str,
    pages: Vec<(u32, Vec<u8>)>,
    format: ImageFormat,
    options: &ToolOptions,
) -> Result<ResultArtifact> {
    let mut pages = pages;
    if pages.len() == 1 {
        let (_, bytes) = pages.remove(0);
        let name = options.file_name_or(&format!("{}.{}", stem, format.extension()));
        return Ok(ResultArtifact::with_mime(name, format.mime_type(), bytes));
    }

    let mut zip = ZipBuilder::new();
    for (page, bytes) in &pages {
        zip.add_stored(&page_file_name(stem, *page, format), bytes)
            .map_err(|e| ToolError::Zip(e.to_string()))?;
    }
    let bytes = zip.finish().map_err(|e| ToolError::Zip(e.to_string()))?;
    log::info!("Packed {} page image(s) into a ZIP", pages.len());

    let name = options.file_name_or(&format!("{}-images.zip", stem));
    Ok(ResultArtifact::new(name, Format::Zip, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbox_utils::archive;
    use toolbox_utils::fixtures::PdfFixture;

    #[test]
    fn test_single_page_is_plain_image() {
        let artifact = package_pages(
            "scan",
            vec![(1, vec![1, 2, 3])],
            ImageFormat::Png,
            &ToolOptions::default(),
        )
        .unwrap();
        assert_eq!(artifact.file_name, "scan.png");
        assert_eq!(artifact.mime, "image/png");
        assert_eq!(artifact.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_several_pages_are_zipped() {
        let pages = vec![(1, vec![0xFF; 4]), (2, vec![0xEE; 4]), (3, vec![0xDD; 4])];
        let artifact =
            package_pages("report", pages, ImageFormat::Jpeg, &ToolOptions::default()).unwrap();
        assert_eq!(artifact.file_name, "report-images.zip");
        let entries = archive::list_entries(&artifact.bytes).unwrap();
        assert_eq!(
            entries,
            vec!["report-page-1.jpg", "report-page-2.jpg", "report-page-3.jpg"]
        );
        assert_eq!(
            archive::read_entry(&artifact.bytes, "report-page-2.jpg").unwrap(),
            vec![0xEE; 4]
        );
    }

    #[test]
    fn test_preview_counts_pages() {
        let pdf = PdfFixture::new().page(&["a"]).page(&["b"]).build();
        let preview = PdfToImageTool
            .preview(&[SourceFile::from_bytes("two.pdf", pdf)])
            .unwrap();
        assert_eq!(preview.page_count, Some(2));
    }

    #[test]
    fn test_renders_with_pdftoppm() {
        if check_pdftoppm().is_err() {
            eprintln!("pdftoppm not installed, skipping");
            return;
        }
        let pdf = PdfFixture::new().page(&["one"]).page(&["two"]).build();
        let artifact = PdfToImageTool
            .process(
                &[SourceFile::from_bytes("two.pdf", pdf)],
                &ToolOptions::default(),
                &ProgressSink::silent(),
            )
            .unwrap();
        assert_eq!(artifact.mime, Format::Zip.mime_type());
        assert_eq!(archive::list_entries(&artifact.bytes).unwrap().len(), 2);
    }
}
