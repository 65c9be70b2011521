//! Processing results and their delivery to the filesystem.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, ToolError};
use crate::source::Format;

/// Output of a successful tool run, offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultArtifact {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ResultArtifact {
    pub fn new(file_name: impl Into<String>, format: Format, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: format.mime_type().to_string(),
            bytes,
        }
    }

    pub fn with_mime(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Write the artifact to `target`.
    ///
    /// When `target` is an existing directory the suggested file name is used.
    /// The bytes go to a temporary file in the destination directory first and
    /// are persisted under the final name only once fully written; the
    /// temporary file is removed if anything fails.
    pub fn save_to(&self, target: &Path) -> Result<PathBuf> {
        let path = if target.is_dir() {
            target.join(&self.file_name)
        } else {
            target.to_path_buf()
        };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&self.bytes)?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| {
            ToolError::Io(std::io::Error::new(
                e.error.kind(),
                format!("Failed to write {}: {}", path.display(), e.error),
            ))
        })?;

        log::info!(
            "Saved {} ({} bytes) to {}",
            self.file_name,
            self.size(),
            path.display()
        );
        Ok(path)
    }
}

/// Build an output file name from a stem, an optional suffix and an extension.
pub fn derived_name(stem: &str, suffix: &str, ext: &str) -> String {
    if suffix.is_empty() {
        format!("{}.{}", stem, ext)
    } else {
        format!("{}-{}.{}", stem, suffix, ext)
    }
}
