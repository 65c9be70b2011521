//! PDF access shared by the tools, on top of lopdf.

use lopdf::{Document, Object};

use toolbox_core::error::{Result, ToolError};
use toolbox_core::progress::ProgressSink;

use crate::encoding::decode_pdf_string;

/// Parse a PDF held in memory.
pub fn load(bytes: &[u8]) -> Result<Document> {
    if !bytes.starts_with(b"%PDF") && !bytes.windows(5).take(1024).any(|w| w == b"%PDF-") {
        return Err(ToolError::Pdf("file does not look like a PDF".to_string()));
    }
    Document::load_mem(bytes).map_err(|e| ToolError::Pdf(format!("Failed to load PDF: {}", e)))
}

/// Serialize a document to bytes.
pub fn save(doc: &mut Document) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| ToolError::Pdf(format!("Failed to write PDF: {}", e)))?;
    Ok(buf)
}

/// Page numbers in document order.
pub fn page_numbers(doc: &Document) -> Vec<u32> {
    // BTreeMap keys are already sorted
    doc.get_pages().keys().copied().collect()
}

/// Number of pages in a PDF held in memory.
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    Ok(load(bytes)?.get_pages().len())
}

/// Extracted text of every page, in order, reporting one unit per page.
///
/// A page whose text cannot be decoded yields an empty string rather than
/// failing the whole document. Trailing whitespace is trimmed.
pub fn page_texts(doc: &Document, progress: &ProgressSink<'_>) -> Vec<(u32, String)> {
    let numbers = page_numbers(doc);
    progress.begin(numbers.len(), "Extracting text");
    numbers
        .into_iter()
        .map(|n| {
            let text = doc.extract_text(&[n]).unwrap_or_else(|e| {
                log::warn!("Could not extract text from page {}: {}", n, e);
                String::new()
            });
            progress.advance(&format!("Page {}", n));
            (n, text.trim_end().to_string())
        })
        .collect()
}

/// A string entry of the document information dictionary (`Title`, `Author`, ...).
pub fn info_string(doc: &Document, key: &str) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    let raw = info.get(key.as_bytes()).ok()?.as_str().ok()?;
    let value = decode_pdf_string(raw).trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
