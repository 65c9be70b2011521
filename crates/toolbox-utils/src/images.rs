//! Image XObjects inside a PDF: discovery, decoding and replacement.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use toolbox_core::error::{Result, ToolError};

/// How the pixel data of an image stream is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredAs {
    /// Unfiltered or Flate-compressed 8-bit samples.
    Samples,
    /// A baseline JPEG (`DCTDecode`).
    Jpeg,
}

/// An image XObject this crate knows how to rewrite.
#[derive(Debug, Clone)]
pub struct PdfImage {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
    pub gray: bool,
    pub stored_as: StoredAs,
    /// Decoded samples for [`StoredAs::Samples`], the JPEG file for [`StoredAs::Jpeg`].
    pub data: Vec<u8>,
    /// Size of the stream as currently stored.
    pub stored_len: usize,
}

impl PdfImage {
    pub fn decode(&self) -> Result<DynamicImage> {
        match self.stored_as {
            StoredAs::Jpeg => image::load_from_memory_with_format(&self.data, ImageFormat::Jpeg)
                .map_err(|e| ToolError::Image(format!("object {:?}: {}", self.id, e))),
            StoredAs::Samples => {
                let channels: usize = if self.gray { 1 } else { 3 };
                let needed = (self.width as usize)
                    .checked_mul(self.height as usize)
                    .and_then(|n| n.checked_mul(channels))
                    .ok_or_else(|| {
                        ToolError::Image(format!(
                            "object {:?}: image dimensions {}x{} too large",
                            self.id, self.width, self.height
                        ))
                    })?;
                if self.data.len() < needed {
                    return Err(ToolError::Image(format!(
                        "object {:?}: {} bytes of samples, expected {}",
                        self.id,
                        self.data.len(),
                        needed
                    )));
                }
                let samples = self.data[..needed].to_vec();
                let img = if self.gray {
                    GrayImage::from_raw(self.width, self.height, samples).map(DynamicImage::ImageLuma8)
                } else {
                    RgbImage::from_raw(self.width, self.height, samples).map(DynamicImage::ImageRgb8)
                };
                img.ok_or_else(|| ToolError::Image(format!("object {:?}: bad dimensions", self.id)))
            }
        }
    }
}

/// Every 8-bit DeviceRGB / DeviceGray image stored as samples or JPEG.
///
/// Masks, indexed or ICC colour spaces and exotic filters are left alone.
pub fn collect_images(doc: &Document) -> Vec<PdfImage> {
    let mut images = Vec::new();
    for (&id, object) in &doc.objects {
        let stream = match object {
            Object::Stream(s) => s,
            _ => continue,
        };
        match inspect(id, stream) {
            Ok(Some(img)) => images.push(img),
            Ok(None) => {}
            Err(e) => log::debug!("Skipping image {:?}: {}", id, e),
        }
    }
    images
}

fn inspect(id: ObjectId, stream: &Stream) -> std::result::Result<Option<PdfImage>, String> {
    let dict = &stream.dict;
    if name_of(dict, b"Subtype").as_deref() != Some(b"Image".as_slice()) {
        return Ok(None);
    }
    if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) || dict.has(b"Decode") {
        return Ok(None);
    }
    if int_of(dict, b"BitsPerComponent") != Some(8) {
        return Ok(None);
    }
    let gray = match name_of(dict, b"ColorSpace").as_deref() {
        Some(b"DeviceRGB") => false,
        Some(b"DeviceGray") => true,
        _ => return Ok(None),
    };
    let (width, height) = match (int_of(dict, b"Width"), int_of(dict, b"Height")) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w as u32, h as u32),
        _ => return Err("missing dimensions".to_string()),
    };

    let filters = filters_of(dict);
    let (stored_as, data) = match filters.as_slice() {
        [] => (StoredAs::Samples, stream.content.clone()),
        [f] if f.as_slice() == b"FlateDecode" => (
            StoredAs::Samples,
            stream.decompressed_content().map_err(|e| e.to_string())?,
        ),
        [f] if f.as_slice() == b"DCTDecode" => (StoredAs::Jpeg, stream.content.clone()),
        _ => return Ok(None),
    };

    Ok(Some(PdfImage {
        id,
        width,
        height,
        gray,
        stored_as,
        data,
        stored_len: stream.content.len(),
    }))
}

fn name_of(dict: &Dictionary, key: &[u8]) -> Option<Vec<u8>> {
    dict.get(key).and_then(Object::as_name).ok().map(|n| n.to_vec())
}

fn int_of(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).and_then(Object::as_i64).ok()
}

/// Filter names of a stream dictionary, whether given as a name or an array.
pub fn filters_of(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![n.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok().map(|n| n.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Encode an image as a baseline JPEG (RGB or grayscale, no alpha).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let img = match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img.clone(),
        other if other.color().has_color() => DynamicImage::ImageRgb8(other.to_rgb8()),
        other => DynamicImage::ImageLuma8(other.to_luma8()),
    };
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality);
    img.write_with_encoder(encoder)
        .map_err(|e| ToolError::Image(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

/// Replace the pixel data of an image XObject with a JPEG.
pub fn replace_with_jpeg(
    doc: &mut Document,
    id: ObjectId,
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
    gray: bool,
) -> Result<()> {
    let stream = doc
        .get_object_mut(id)
        .and_then(Object::as_stream_mut)
        .map_err(|e| ToolError::Pdf(format!("image object {:?}: {}", id, e)))?;
    stream.dict.set("Filter", "DCTDecode");
    stream.dict.remove(b"DecodeParms");
    stream.dict.set("Width", width as i64);
    stream.dict.set("Height", height as i64);
    stream.dict.set("BitsPerComponent", 8i64);
    stream
        .dict
        .set("ColorSpace", if gray { "DeviceGray" } else { "DeviceRGB" });
    stream.set_content(jpeg);
    // Already compressed; Flate on top only costs time
    stream.allows_compression = false;
    Ok(())
}

/// Replace the pixel data of an image XObject with unfiltered 8-bit samples.
pub fn replace_with_samples(
    doc: &mut Document,
    id: ObjectId,
    samples: Vec<u8>,
    width: u32,
    height: u32,
    gray: bool,
) -> Result<()> {
    let stream = doc
        .get_object_mut(id)
        .and_then(Object::as_stream_mut)
        .map_err(|e| ToolError::Pdf(format!("image object {:?}: {}", id, e)))?;
    stream.dict.set("Width", width as i64);
    stream.dict.set("Height", height as i64);
    stream.dict.set("BitsPerComponent", 8i64);
    stream
        .dict
        .set("ColorSpace", if gray { "DeviceGray" } else { "DeviceRGB" });
    stream.set_plain_content(samples);
    stream.allows_compression = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::PdfFixture;

    #[test]
    fn test_collect_raw_image() {
        let doc = PdfFixture::new().image_page(20, 10).document();
        let images = collect_images(&doc);
        assert_eq!(images.len(), 1);
        let img = &images[0];
        assert_eq!((img.width, img.height, img.gray), (20, 10, false));
        assert_eq!(img.stored_as, StoredAs::Samples);
        assert_eq!(img.decode().unwrap().width(), 20);
    }

    #[test]
    fn test_replace_with_jpeg() {
        let mut doc = PdfFixture::new().image_page(32, 32).document();
        let img = collect_images(&doc).remove(0);
        let jpeg = encode_jpeg(&img.decode().unwrap(), 60).unwrap();
        replace_with_jpeg(&mut doc, img.id, jpeg, 32, 32, false).unwrap();

        let again = collect_images(&doc).remove(0);
        assert_eq!(again.stored_as, StoredAs::Jpeg);
        assert_eq!(again.decode().unwrap().height(), 32);
    }

    #[test]
    fn test_decode_oversized_dimensions() {
        let img = PdfImage {
            id: (9, 0),
            width: u32::MAX,
            height: u32::MAX,
            gray: false,
            stored_as: StoredAs::Samples,
            data: vec![0; 12],
            stored_len: 12,
        };
        assert!(matches!(img.decode(), Err(ToolError::Image(_))));

        let img = PdfImage {
            width: 70_000,
            height: 70_000,
            ..img
        };
        assert!(matches!(img.decode(), Err(ToolError::Image(_))));
    }

    #[test]
    fn test_text_pages_have_no_images() {
        let doc = PdfFixture::new().page(&["just text"]).document();
        assert!(collect_images(&doc).is_empty());
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4));
        let jpeg = encode_jpeg(&rgba, 80).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
    }
}
