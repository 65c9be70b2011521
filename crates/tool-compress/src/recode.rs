//! Per-image recompression: optional downsampling, then JPEG re-encode.

use fast_image_resize::images::Image;
use fast_image_resize::{IntoImageView, Resizer};
use image::DynamicImage;
use lopdf::ObjectId;

use toolbox_core::options::CompressionLevel;
use toolbox_utils::images::{self, PdfImage};

/// What each compression level does to images and structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProfile {
    pub jpeg_quality: Option<u8>,
    pub max_dimension: Option<u32>,
    pub renumber: bool,
}

impl LevelProfile {
    pub fn for_level(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Low => LevelProfile {
                jpeg_quality: None,
                max_dimension: None,
                renumber: false,
            },
            CompressionLevel::Medium => LevelProfile {
                jpeg_quality: Some(70),
                max_dimension: None,
                renumber: true,
            },
            CompressionLevel::High => LevelProfile {
                jpeg_quality: Some(50),
                max_dimension: Some(1200),
                renumber: true,
            },
        }
    }
}

/// A replacement image stream.
pub(crate) struct Recoded {
    pub id: ObjectId,
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub gray: bool,
}

/// Re-encode one image; `None` when it cannot be decoded or would not shrink.
pub(crate) fn recode_image(img: &PdfImage, profile: &LevelProfile) -> Option<Recoded> {
    let quality = profile.jpeg_quality?;
    let decoded = match img.decode() {
        Ok(d) => d,
        Err(e) => {
            log::warn!("Leaving image as is: {}", e);
            return None;
        }
    };

    let decoded = match profile.max_dimension {
        Some(max) if decoded.width() > max || decoded.height() > max => {
            let (w, h) = fit_dimensions(decoded.width(), decoded.height(), max, max);
            downsample(&decoded, w, h)
        }
        _ => decoded,
    };

    let jpeg = match images::encode_jpeg(&decoded, quality) {
        Ok(j) => j,
        Err(e) => {
            log::warn!("Leaving image {:?} as is: {}", img.id, e);
            return None;
        }
    };
    if jpeg.len() >= img.stored_len {
        log::debug!(
            "Image {:?}: JPEG q{} is not smaller ({} >= {})",
            img.id,
            quality,
            jpeg.len(),
            img.stored_len
        );
        return None;
    }

    log::debug!(
        "Image {:?}: {}x{} -> {}x{}, {} -> {} bytes",
        img.id,
        img.width,
        img.height,
        decoded.width(),
        decoded.height(),
        img.stored_len,
        jpeg.len()
    );
    Some(Recoded {
        id: img.id,
        jpeg,
        width: decoded.width(),
        height: decoded.height(),
        gray: img.gray,
    })
}

/// Resize with fast_image_resize, falling back to the image crate.
fn downsample(src: &DynamicImage, new_w: u32, new_h: u32) -> DynamicImage {
    let pixel_type = match src.pixel_type() {
        Some(pt) => pt,
        None => return src.resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3),
    };

    let mut dst = Image::new(new_w, new_h, pixel_type);
    let mut resizer = Resizer::new();
    if let Err(e) = resizer.resize(src, &mut dst, None) {
        log::warn!("fast_image_resize failed ({}), falling back", e);
        return src.resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3);
    }

    let raw = dst.into_vec();
    let rebuilt = match src {
        DynamicImage::ImageLuma8(_) => {
            image::GrayImage::from_raw(new_w, new_h, raw).map(DynamicImage::ImageLuma8)
        }
        DynamicImage::ImageRgb8(_) => {
            image::RgbImage::from_raw(new_w, new_h, raw).map(DynamicImage::ImageRgb8)
        }
        DynamicImage::ImageRgba8(_) => {
            image::RgbaImage::from_raw(new_w, new_h, raw).map(DynamicImage::ImageRgba8)
        }
        _ => None,
    };
    rebuilt.unwrap_or_else(|| src.resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3))
}

/// New dimensions that fit within max_w x max_h preserving aspect ratio.
pub fn fit_dimensions(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let ratio_w = max_w as f64 / w as f64;
    let ratio_h = max_h as f64 / h as f64;
    let ratio = ratio_w.min(ratio_h);
    let new_w = (w as f64 * ratio).round() as u32;
    let new_h = (h as f64 * ratio).round() as u32;
    (new_w.max(1), new_h.max(1))
}
