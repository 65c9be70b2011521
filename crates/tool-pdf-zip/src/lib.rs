//! PDF to ZIP: bundles one or more PDFs into a single archive.

use std::collections::HashSet;
use std::path::Path;

use zip::CompressionMethod;

use toolbox_core::artifact::ResultArtifact;
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{CompressionLevel, OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Tool, ToolKind};
use toolbox_utils::archive::ZipBuilder;

pub struct PdfZipTool;

impl Tool for PdfZipTool {
    fn name(&self) -> &str {
        "PDF to ZIP"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::PdfToZip
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Pdf]
    }

    fn file_count(&self) -> (usize, Option<usize>) {
        (1, None)
    }

    fn option_keys(&self) -> &[OptionKey] {
        &[OptionKey::CompressionLevel, OptionKey::OutputName]
    }

    fn process(
        &self,
        files: &[SourceFile],
        options: &ToolOptions,
        progress: &ProgressSink<'_>,
    ) -> Result<ResultArtifact> {
        let (method, level) = zip_settings(options.compression_level);
        let mut builder = ZipBuilder::with_compression(method, level);
        let mut used = HashSet::new();

        progress.begin(files.len(), "Adding files");
        for file in files {
            let entry = unique_entry_name(&file.name, &mut used);
            builder
                .add_file(&entry, &file.bytes)
                .map_err(|e| ToolError::Zip(format!("{}: {}", entry, e)))?;
            log::debug!("Added {} ({} bytes)", entry, file.size());
            progress.advance(&entry);
        }

        let bytes = builder
            .finish()
            .map_err(|e| ToolError::Zip(format!("Failed to finish archive: {}", e)))?;
        log::info!("Archived {} file(s) into {} bytes", files.len(), bytes.len());
        Ok(ResultArtifact::new(
            options.file_name_or("documents.zip"),
            Format::Zip,
            bytes,
        ))
    }
}

/// Compression method and level for each compression setting.
pub fn zip_settings(level: CompressionLevel) -> (CompressionMethod, Option<i64>) {
    match level {
        CompressionLevel::Low => (CompressionMethod::Stored, None),
        CompressionLevel::Medium => (CompressionMethod::Deflated, None),
        CompressionLevel::High => (CompressionMethod::Deflated, Some(9)),
    }
}

/// The file's base name, with ` (n)` before the extension when already taken.
pub fn unique_entry_name(original: &str, used: &mut HashSet<String>) -> String {
    // Entry names never carry directories from the uploader
    let base = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("document.pdf")
        .to_string();

    if used.insert(base.to_lowercase()) {
        return base;
    }

    let path = Path::new(&base);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
    let ext = path.extension().and_then(|e| e.to_str());
    let mut n = 1;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        if used.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}
