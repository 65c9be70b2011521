//! In-memory ZIP containers (DOCX, PPTX and plain archives).

use std::io::{self, Cursor, Read, Write};

use zip::read::ZipArchive;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Read a single entry from ZIP bytes.
pub fn read_entry(zip_bytes: &[u8], entry_name: &str) -> io::Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))?;
    let mut entry = archive.by_name(entry_name)?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read a single entry as UTF-8 text.
pub fn read_entry_string(zip_bytes: &[u8], entry_name: &str) -> io::Result<String> {
    let bytes = read_entry(zip_bytes, entry_name)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// List all entry names.
pub fn list_entries(zip_bytes: &[u8]) -> io::Result<Vec<String>> {
    let archive = ZipArchive::new(Cursor::new(zip_bytes))?;
    let entries = (0..archive.len())
        .filter_map(|i| archive.name_for_index(i).map(|s| s.to_string()))
        .collect();
    Ok(entries)
}

/// Resolve a package relationship target against the directory of the part
/// that references it (`word`, `ppt/slides`, ...).
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Builder for ZIP archives held in memory.
pub struct ZipBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    method: CompressionMethod,
    level: Option<i64>,
}

impl ZipBuilder {
    /// Deflate entries at the default level.
    pub fn new() -> Self {
        Self::with_compression(CompressionMethod::Deflated, None)
    }

    pub fn with_compression(method: CompressionMethod, level: Option<i64>) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            method,
            level,
        }
    }

    /// Add a file entry using the builder's compression settings.
    pub fn add_file(&mut self, name: &str, content: &[u8]) -> io::Result<()> {
        let options = SimpleFileOptions::default()
            .compression_method(self.method)
            .compression_level(self.level);
        self.writer.start_file(name, options)?;
        self.writer.write_all(content)?;
        Ok(())
    }

    /// Add a file entry stored without compression.
    pub fn add_stored(&mut self, name: &str, content: &[u8]) -> io::Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.writer.start_file(name, options)?;
        self.writer.write_all(content)?;
        Ok(())
    }

    /// Finish the archive and return its bytes.
    pub fn finish(self) -> io::Result<Vec<u8>> {
        let cursor = self.writer.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for ZipBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_in_memory() {
        let mut builder = ZipBuilder::new();
        builder.add_stored("mimetype", b"text/plain").unwrap();
        builder.add_file("word/document.xml", b"<root/>").unwrap();
        let bytes = builder.finish().unwrap();

        let entries = list_entries(&bytes).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.contains(&"mimetype".to_string()));
        assert_eq!(read_entry_string(&bytes, "word/document.xml").unwrap(), "<root/>");
    }

    #[test]
    fn test_missing_entry_is_error() {
        let bytes = ZipBuilder::new().finish().unwrap();
        assert!(read_entry(&bytes, "nope.xml").is_err());
    }

    #[test]
    fn test_stored_level_keeps_size() {
        let payload = vec![b'a'; 4096];
        let mut stored = ZipBuilder::with_compression(CompressionMethod::Stored, None);
        stored.add_file("a.txt", &payload).unwrap();
        let stored = stored.finish().unwrap();

        let mut deflated = ZipBuilder::with_compression(CompressionMethod::Deflated, Some(9));
        deflated.add_file("a.txt", &payload).unwrap();
        let deflated = deflated.finish().unwrap();

        assert!(stored.len() > payload.len());
        assert!(deflated.len() < stored.len());
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word", "media/a.png"), "word/media/a.png");
        assert_eq!(resolve_target("ppt/slides", "../media/a.png"), "ppt/media/a.png");
        assert_eq!(resolve_target("word", "/word/media/a.png"), "word/media/a.png");
    }

    #[test]
    fn test_not_a_zip() {
        assert!(list_entries(b"plain text").is_err());
    }
}
