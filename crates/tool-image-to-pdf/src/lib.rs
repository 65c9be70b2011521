//! JPG to PDF: places each image on its own page, scaled to fit.
//!
//! Images that the PDF writer cannot embed directly (CMYK JPEGs, unusual
//! PNG layouts) are decoded with the `image` crate and re-encoded as RGB
//! PNG first.

use std::io::Cursor;

use toolbox_core::artifact::ResultArtifact;
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Preview, Tool, ToolKind};
use toolbox_render::{PageSetup, PdfWriter};

pub struct ImageToPdfTool;

impl Tool for ImageToPdfTool {
    fn name(&self) -> &str {
        "JPG to PDF"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::ImageToPdf
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Jpeg, Format::Png]
    }

    fn file_count(&self) -> (usize, Option<usize>) {
        (1, None)
    }

    fn option_keys(&self) -> &[OptionKey] {
        &[OptionKey::PageSize, OptionKey::Margin, OptionKey::OutputName]
    }

    /// Every image must at least have readable dimensions.
    fn preview(&self, files: &[SourceFile]) -> Result<Preview> {
        for file in files {
            dimensions(file)?;
        }
        Ok(Preview {
            file_count: files.len(),
            page_count: Some(files.len()),
        })
    }

    fn process(
        &self,
        files: &[SourceFile],
        options: &ToolOptions,
        progress: &ProgressSink<'_>,
    ) -> Result<ResultArtifact> {
        let title = files[0].stem();
        let mut writer = PdfWriter::new(title, PageSetup::from_options(options));
        progress.begin(files.len(), "Placing images");

        for file in files {
            place_image(&mut writer, file)?;
            progress.advance(&file.name);
        }

        let rendered = writer.finish();
        log::info!("Placed {} image(s) on {} page(s)", files.len(), rendered.pages);
        let suggested = if files.len() == 1 {
            format!("{}.pdf", title)
        } else {
            "images.pdf".to_string()
        };
        let name = options.file_name_or(&suggested);
        Ok(ResultArtifact::new(name, Format::Pdf, rendered.bytes))
    }
}

fn dimensions(file: &SourceFile) -> Result<(u32, u32)> {
    image::ImageReader::new(Cursor::new(&file.bytes))
        .with_guessed_format()
        .map_err(|e| ToolError::Image(format!("{}: {}", file.name, e)))?
        .into_dimensions()
        .map_err(|e| ToolError::Image(format!("{}: {}", file.name, e)))
}

fn place_image(writer: &mut PdfWriter, file: &SourceFile) -> Result<()> {
    match writer.image_page(&file.bytes) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::debug!("{} needs re-encoding: {}", file.name, e);
            let png = reencode_png(file)?;
            writer.image_page(&png)
        }
    }
}

/// Decode any supported image and write it back as 8-bit RGB PNG.
pub fn reencode_png(file: &SourceFile) -> Result<Vec<u8>> {
    let img = image::load_from_memory(&file.bytes)
        .map_err(|e| ToolError::Image(format!("{}: {}", file.name, e)))?;
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img.to_rgb8())
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| ToolError::Image(format!("{}: {}", file.name, e)))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(format: image::ImageFormat, w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(w, h, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_one_page_per_image() {
        let files = vec![
            SourceFile::from_bytes("a.jpg", encoded(image::ImageFormat::Jpeg, 64, 48)),
            SourceFile::from_bytes("b.png", encoded(image::ImageFormat::Png, 30, 90)),
            SourceFile::from_bytes("c.jpeg", encoded(image::ImageFormat::Jpeg, 800, 600)),
        ];
        let artifact = ImageToPdfTool
            .process(&files, &ToolOptions::default(), &ProgressSink::silent())
            .unwrap();
        assert_eq!(artifact.file_name, "images.pdf");
        let doc = lopdf::Document::load_mem(&artifact.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_single_image_named_after_it() {
        let files = vec![SourceFile::from_bytes("scan.png", encoded(image::ImageFormat::Png, 10, 10))];
        let artifact = ImageToPdfTool
            .process(&files, &ToolOptions::default(), &ProgressSink::silent())
            .unwrap();
        assert_eq!(artifact.file_name, "scan.pdf");
    }

    #[test]
    fn test_preview_rejects_corrupt_image() {
        let files = vec![SourceFile::from_bytes("broken.jpg", vec![0xFF, 0xD8, 0x00, 0x01])];
        assert!(matches!(ImageToPdfTool.preview(&files), Err(ToolError::Image(_))));
    }

    #[test]
    fn test_reencode_png() {
        let file = SourceFile::from_bytes("x.jpg", encoded(image::ImageFormat::Jpeg, 8, 8));
        let png = reencode_png(&file).unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), image::ImageFormat::Png);
    }
}
