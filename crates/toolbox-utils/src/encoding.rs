//! Character encoding detection for plain-text input.

/// Decode text bytes to UTF-8.
/// BOMs are honoured first; invalid UTF-8 falls back to Windows-1252.
pub fn decode_to_utf8(bytes: &[u8]) -> (String, &'static str) {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return (String::from_utf8_lossy(&bytes[3..]).to_string(), "UTF-8");
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        let (result, _, _) = encoding_rs::UTF_16LE.decode(bytes);
        return (result.to_string(), "UTF-16LE");
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (result, _, _) = encoding_rs::UTF_16BE.decode(bytes);
        return (result.to_string(), "UTF-16BE");
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), "UTF-8"),
        Err(_) => {
            let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            (result.to_string(), "Windows-1252")
        }
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or PDFDocEncoding).
pub fn decode_pdf_string(raw: &[u8]) -> String {
    if raw.len() >= 2 && raw[0] == 0xFE && raw[1] == 0xFF {
        let chars: Vec<u16> = raw[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&chars);
    }
    if raw.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(&raw[3..]).to_string();
    }
    match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        // Latin-1 is close enough to PDFDocEncoding for metadata
        Err(_) => raw.iter().map(|&b| b as char).collect(),
    }
}

/// Normalise line endings to `\n` and expand tabs to four spaces.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").replace('\t', "    ")
}
