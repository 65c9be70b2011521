//! PDF page rendering via `pdftoppm` (poppler-utils).

use std::path::{Path, PathBuf};
use std::process::Command;

use rayon::prelude::*;

use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::ImageFormat;
use toolbox_core::progress::ProgressSink;

/// Rendering parameters passed to pdftoppm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub format: ImageFormat,
    pub dpi: u16,
    pub jpeg_quality: u8,
}

/// Check that pdftoppm is available on the system.
pub fn check_pdftoppm() -> Result<()> {
    let found = Command::new("which")
        .arg("pdftoppm")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);

    if !found {
        return Err(ToolError::MissingTool(
            "pdftoppm (poppler-utils) is required to render pages. \
             Install with: brew install poppler (macOS) or apt install poppler-utils (Linux)"
                .to_string(),
        ));
    }
    Ok(())
}

/// Arguments for one pdftoppm run.
pub fn pdftoppm_args(settings: &RenderSettings, input: &Path, prefix: &Path) -> Vec<String> {
    let mut args = Vec::new();
    match settings.format {
        ImageFormat::Jpeg => {
            args.push("-jpeg".to_string());
            args.push("-jpegopt".to_string());
            args.push(format!("quality={}", settings.jpeg_quality));
        }
        ImageFormat::Png => args.push("-png".to_string()),
    }
    args.push("-r".to_string());
    args.push(settings.dpi.to_string());
    args.push(input.to_string_lossy().to_string());
    args.push(prefix.to_string_lossy().to_string());
    args
}

/// Render every page of `pdf` and return `(page_number, image_bytes)` in order.
///
/// Rendering itself is one opaque pdftoppm run; reading the rendered files
/// back reports one unit per page.
pub fn render_pages(
    pdf: &[u8],
    page_count: u32,
    settings: &RenderSettings,
    progress: &ProgressSink<'_>,
) -> Result<Vec<(u32, Vec<u8>)>> {
    check_pdftoppm()?;

    let tmp_dir = tempfile::TempDir::new()?;
    let input = tmp_dir.path().join("input.pdf");
    std::fs::write(&input, pdf)?;
    let prefix = tmp_dir.path().join("page");

    log::info!(
        "Rendering {} page(s) with pdftoppm at {} DPI",
        page_count,
        settings.dpi
    );
    progress.indeterminate("Rendering pages");

    let output = Command::new("pdftoppm")
        .args(pdftoppm_args(settings, &input, &prefix))
        .output()
        .map_err(|e| ToolError::Pdf(format!("Failed to run pdftoppm: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ToolError::Pdf(format!("pdftoppm failed: {}", stderr.trim())));
    }

    collect_rendered_pages(tmp_dir.path(), page_count, settings.format, progress)
}

/// Read the rendered files back (parallel file reads).
fn collect_rendered_pages(
    dir: &Path,
    page_count: u32,
    format: ImageFormat,
    progress: &ProgressSink<'_>,
) -> Result<Vec<(u32, Vec<u8>)>> {
    progress.begin(page_count as usize, "Collecting pages");
    let results: Vec<Result<(u32, Vec<u8>)>> = (1..=page_count)
        .into_par_iter()
        .map(|page_num| {
            let path = find_rendered_page(dir, page_num, format).ok_or_else(|| {
                ToolError::Pdf(format!("No rendered image found for page {}", page_num))
            })?;
            let data = std::fs::read(&path).map_err(|e| {
                ToolError::Pdf(format!("Failed to read rendered page {}: {}", page_num, e))
            })?;
            progress.advance(&format!("Page {}", page_num));
            Ok((page_num, data))
        })
        .collect();

    results.into_iter().collect()
}

/// Find the rendered file for a given page number.
/// pdftoppm zero-pads to the width of the page count, so try each width.
pub fn find_rendered_page(dir: &Path, page_num: u32, format: ImageFormat) -> Option<PathBuf> {
    (1..=6)
        .map(|width| {
            dir.join(format!(
                "page-{:0>width$}.{}",
                page_num,
                format.extension(),
                width = width
            ))
        })
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_args_carry_quality() {
        let settings = RenderSettings {
            format: ImageFormat::Jpeg,
            dpi: 200,
            jpeg_quality: 60,
        };
        let args = pdftoppm_args(&settings, Path::new("/tmp/in.pdf"), Path::new("/tmp/page"));
        assert_eq!(
            args,
            vec!["-jpeg", "-jpegopt", "quality=60", "-r", "200", "/tmp/in.pdf", "/tmp/page"]
        );
    }

    #[test]
    fn test_png_args() {
        let settings = RenderSettings {
            format: ImageFormat::Png,
            dpi: 72,
            jpeg_quality: 60,
        };
        let args = pdftoppm_args(&settings, Path::new("in.pdf"), Path::new("p"));
        assert_eq!(args[0], "-png");
        assert!(!args.iter().any(|a| a.starts_with("quality=")));
    }

    #[test]
    fn test_find_rendered_page_any_padding() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-007.png"), b"x").unwrap();
        std::fs::write(dir.path().join("page-1.jpg"), b"x").unwrap();

        assert!(find_rendered_page(dir.path(), 7, ImageFormat::Png).is_some());
        assert!(find_rendered_page(dir.path(), 1, ImageFormat::Jpeg).is_some());
        assert!(find_rendered_page(dir.path(), 1, ImageFormat::Png).is_none());
    }
}
