//! Grayscale PDF: converts page colours and images to shades of gray.
//!
//! Device RGB/CMYK colour operators in page and form content streams are
//! replaced by their gray equivalents; 8-bit DeviceRGB images (raw or JPEG)
//! are converted to DeviceGray. Patterns, shadings and ICC-based colour
//! spaces are left untouched.

mod operators;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use rayon::prelude::*;

use toolbox_core::artifact::{derived_name, ResultArtifact};
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Preview, Tool, ToolKind};
use toolbox_utils::images::{self, PdfImage, StoredAs};
use toolbox_utils::pdf;

pub use operators::{luma, rewrite_content};

/// JPEG quality used when a colour JPEG is re-encoded as gray.
const GRAY_JPEG_QUALITY: u8 = 90;

pub struct GrayscaleTool;

impl Tool for GrayscaleTool {
    fn name(&self) -> &str {
        "Grayscale PDF"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Grayscale
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
        let bytes = grayscale_pdf(&source.bytes, progress)?;
        let name = options.file_name_or(&derived_name(source.stem(), "grayscale", "pdf"));
        Ok(ResultArtifact::new(name, Format::Pdf, bytes))
    }
}

/// Convert a PDF to grayscale.
pub fn grayscale_pdf(bytes: &[u8], progress: &ProgressSink<'_>) -> Result<Vec<u8>> {
    let mut doc = pdf::load(bytes)?;
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    progress.begin(pages.len() + 1, "Converting pages");

    let contents: Vec<(ObjectId, Vec<u8>)> = pages
        .iter()
        .filter_map(|&id| match doc.get_page_content(id) {
            Ok(raw) => Some((id, raw)),
            Err(e) => {
                log::warn!("Skipping page {:?}: {}", id, e);
                progress.advance("Skipped page");
                None
            }
        })
        .collect();

    // Rewrite in parallel, apply sequentially
    let rewritten: Vec<(ObjectId, Option<Vec<u8>>)> = contents
        .into_par_iter()
        .map(|(id, raw)| {
            let out = rewrite_stream(&raw);
            progress.advance(&format!("Page {:?}", id));
            (id, out)
        })
        .collect();

    let mut changed_pages = 0;
    for (id, content) in rewritten {
        if let Some(content) = content {
            doc.change_page_content(id, content)
                .map_err(|e| ToolError::Pdf(format!("page {:?}: {}", id, e)))?;
            changed_pages += 1;
        }
    }

    let forms = rewrite_forms(&mut doc);
    let converted = convert_images(&mut doc)?;
    progress.advance("Converted images");
    log::info!(
        "Grayscale: {} page(s), {} form(s), {} image(s) converted",
        changed_pages,
        forms,
        converted
    );

    doc.compress();
    pdf::save(&mut doc)
}

/// Decode, rewrite and re-encode one content stream; `None` if nothing changed.
fn rewrite_stream(raw: &[u8]) -> Option<Vec<u8>> {
    let mut content = match Content::decode(raw) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Could not parse content stream: {}", e);
            return None;
        }
    };
    if rewrite_content(&mut content) == 0 {
        return None;
    }
    content.encode().ok()
}

/// Form XObjects carry their own content streams.
fn rewrite_forms(doc: &mut Document) -> usize {
    let form_ids: Vec<ObjectId> = doc
        .objects
        .iter()
        .filter_map(|(&id, obj)| match obj {
            Object::Stream(s)
                if s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Form".as_slice()) =>
            {
                Some(id)
            }
            _ => None,
        })
        .collect();

    let mut changed = 0;
    for id in form_ids {
        if let Ok(Object::Stream(stream)) = doc.get_object_mut(id) {
            let raw = if stream.dict.has(b"Filter") {
                match stream.decompressed_content() {
                    Ok(raw) => raw,
                    Err(e) => {
                        log::debug!("Skipping form {:?}: {}", id, e);
                        continue;
                    }
                }
            } else {
                stream.content.clone()
            };
            if let Some(content) = rewrite_stream(&raw) {
                stream.set_plain_content(content);
                changed += 1;
            }
        }
    }
    changed
}

struct GrayReplacement {
    id: ObjectId,
    width: u32,
    height: u32,
    stored_as: StoredAs,
    data: Vec<u8>,
}

fn to_gray(img: &PdfImage) -> Result<GrayReplacement> {
    let luma = image::DynamicImage::ImageLuma8(img.decode()?.to_luma8());
    let data = match img.stored_as {
        StoredAs::Samples => luma.as_bytes().to_vec(),
        StoredAs::Jpeg => images::encode_jpeg(&luma, GRAY_JPEG_QUALITY)?,
    };
    Ok(GrayReplacement {
        id: img.id,
        width: img.width,
        height: img.height,
        stored_as: img.stored_as,
        data,
    })
}

fn convert_images(doc: &mut Document) -> Result<usize> {
    let colour: Vec<PdfImage> = images::collect_images(doc)
        .into_iter()
        .filter(|img| !img.gray)
        .collect();

    let converted: Vec<GrayReplacement> = colour
        .par_iter()
        .filter_map(|img| match to_gray(img) {
            Ok(g) => Some(g),
            Err(e) => {
                log::warn!("Leaving image {:?} in colour: {}", img.id, e);
                None
            }
        })
        .collect();

    let count = converted.len();
    for img in converted {
        match img.stored_as {
            StoredAs::Samples => {
                images::replace_with_samples(doc, img.id, img.data, img.width, img.height, true)?
            }
            StoredAs::Jpeg => {
                images::replace_with_jpeg(doc, img.id, img.data, img.width, img.height, true)?
            }
        }
    }
    Ok(count)
}
