//! Compress PDF: shrinks a PDF by recompressing streams and images.
//!
//! Every level Flate-compresses uncompressed streams, drops unreferenced and
//! empty objects. `medium` and `high` additionally re-encode eligible images
//! as JPEG; `high` also downsamples them. The result never exceeds the input:
//! if recompression does not help, the original bytes are returned.

mod recode;

use lopdf::Document;
use rayon::prelude::*;

use toolbox_core::artifact::{derived_name, ResultArtifact};
use toolbox_core::error::Result;
use toolbox_core::options::{CompressionLevel, OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Preview, Tool, ToolKind};
use toolbox_utils::{images, pdf};

pub use recode::{fit_dimensions, LevelProfile};

pub struct CompressTool;

impl Tool for CompressTool {
    fn name(&self) -> &str {
        "Compress PDF"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Compress
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Pdf]
    }

    fn option_keys(&self) -> &[OptionKey] {
        &[OptionKey::CompressionLevel, OptionKey::OutputName]
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
        let bytes = compress_pdf(&source.bytes, options.compression_level, progress)?;
        let name = options.file_name_or(&derived_name(source.stem(), "compressed", "pdf"));
        Ok(ResultArtifact::new(name, Format::Pdf, bytes))
    }
}

/// Compress PDF bytes at the given level.
pub fn compress_pdf(
    original: &[u8],
    level: CompressionLevel,
    progress: &ProgressSink<'_>,
) -> Result<Vec<u8>> {
    let mut doc = pdf::load(original)?;
    let profile = LevelProfile::for_level(level);

    let candidates = if profile.jpeg_quality.is_some() {
        images::collect_images(&doc)
    } else {
        Vec::new()
    };
    // One unit per image plus the final rewrite
    progress.begin(candidates.len() + 1, "Recompressing images");
    log::info!(
        "Compressing ({}): {} candidate image(s)",
        level,
        candidates.len()
    );

    // Re-encode in parallel, apply sequentially
    let recoded: Vec<_> = candidates
        .par_iter()
        .map(|img| {
            let result = recode::recode_image(img, &profile);
            progress.advance(&format!("Image {:?}", img.id));
            result
        })
        .collect();

    let mut replaced = 0;
    for outcome in recoded.into_iter().flatten() {
        images::replace_with_jpeg(
            &mut doc,
            outcome.id,
            outcome.jpeg,
            outcome.width,
            outcome.height,
            outcome.gray,
        )?;
        replaced += 1;
    }
    log::debug!("Replaced {} image stream(s)", replaced);

    rewrite_structure(&mut doc, &profile);
    let compressed = pdf::save(&mut doc)?;
    progress.advance("Saved");

    if compressed.len() >= original.len() {
        log::info!(
            "Recompression did not help ({} -> {} bytes); keeping original",
            original.len(),
            compressed.len()
        );
        return Ok(original.to_vec());
    }

    log::info!(
        "Compressed {} -> {} bytes ({:.1}% smaller)",
        original.len(),
        compressed.len(),
        100.0 * (1.0 - compressed.len() as f64 / original.len() as f64)
    );
    Ok(compressed)
}

fn rewrite_structure(doc: &mut Document, profile: &LevelProfile) {
    doc.delete_zero_length_streams();
    let pruned = doc.prune_objects();
    if !pruned.is_empty() {
        log::debug!("Pruned {} unreferenced object(s)", pruned.len());
    }
    if profile.renumber {
        doc.renumber_objects();
    }
    doc.compress();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use toolbox_core::progress::{Progress, ProgressReporter};
    use toolbox_utils::fixtures::PdfFixture;

    fn large_pdf() -> Vec<u8> {
        PdfFixture::new()
            .page(&["Annual report"])
            .image_page(300, 300)
            .image_page(200, 400)
            .build()
    }

    #[test]
    fn test_high_is_strictly_smaller() {
        let original = large_pdf();
        let out = compress_pdf(&original, CompressionLevel::High, &ProgressSink::silent()).unwrap();
        assert!(out.len() < original.len());
        assert_eq!(pdf::page_count(&out).unwrap(), 3);
    }

    #[test]
    fn test_low_only_restructures() {
        let original = large_pdf();
        let out = compress_pdf(&original, CompressionLevel::Low, &ProgressSink::silent()).unwrap();
        assert!(out.len() <= original.len());
        let doc = pdf::load(&out).unwrap();
        // No image was turned into a JPEG
        assert!(images::collect_images(&doc)
            .iter()
            .all(|img| img.stored_as == images::StoredAs::Samples));
    }

    #[test]
    fn test_never_grows() {
        let original = PdfFixture::new().page(&["tiny"]).build();
        let mut doc = pdf::load(&original).unwrap();
        doc.compress();
        let already = pdf::save(&mut doc).unwrap();

        let out = compress_pdf(&already, CompressionLevel::Medium, &ProgressSink::silent()).unwrap();
        assert!(out.len() <= already.len());
    }

    #[test]
    fn test_progress_ends_complete() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let reporter: ProgressReporter = Box::new(move |p, _| seen_clone.lock().unwrap().push(p));
        let sink = ProgressSink::new(Some(reporter.as_ref()));

        compress_pdf(&large_pdf(), CompressionLevel::High, &sink).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.last().copied(),
            Some(Progress::Determinate { done: 3, total: 3 })
        );
    }

    #[test]
    fn test_tool_output_name() {
        let file = SourceFile::from_bytes("report.pdf", large_pdf());
        let artifact = CompressTool
            .process(&[file], &ToolOptions::default(), &ProgressSink::silent())
            .unwrap();
        assert_eq!(artifact.file_name, "report-compressed.pdf");
        assert_eq!(artifact.mime, "application/pdf");
    }

    #[test]
    fn test_invalid_pdf_fails() {
        let err = compress_pdf(b"not a pdf", CompressionLevel::Medium, &ProgressSink::silent());
        assert!(err.is_err());
    }
}
