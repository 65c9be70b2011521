//! Repair PDF: recovers documents with damaged framing or cross-reference data.
//!
//! Repairs, in order:
//! 1. leading bytes before the `%PDF-` header are dropped, a missing header is added
//! 2. bytes after the last `%%EOF` are dropped, a missing `%%EOF` is appended
//! 3. if the file still does not parse, the cross-reference table is rebuilt
//!    from the `N G obj` markers found in the file
//! 4. the parsed document is pruned and renumbered before it is written back
//!
//! When the document cannot be recovered the error carries every issue found.

mod xref;

use lopdf::Document;

use toolbox_core::artifact::{derived_name, ResultArtifact};
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Tool, ToolKind};
use toolbox_utils::pdf;

pub struct RepairTool;

impl Tool for RepairTool {
    fn name(&self) -> &str {
        "Repair PDF"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Repair
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Pdf]
    }

    fn option_keys(&self) -> &[OptionKey] {
        &[OptionKey::OutputName]
    }

    fn process(
        &self,
        files: &[SourceFile],
        options: &ToolOptions,
        progress: &ProgressSink<'_>,
    ) -> Result<ResultArtifact> {
        let source = &files[0];
        let repaired = repair_pdf(&source.bytes, progress)?;
        for fix in &repaired.fixes {
            log::info!("{}: {}", source.name, fix);
        }
        let name = options.file_name_or(&derived_name(source.stem(), "repaired", "pdf"));
        Ok(ResultArtifact::new(name, Format::Pdf, repaired.bytes))
    }
}

/// A recovered document and the fixes applied to it.
#[derive(Debug, Clone)]
pub struct Repaired {
    pub bytes: Vec<u8>,
    pub fixes: Vec<String>,
}

/// Repair PDF bytes.
pub fn repair_pdf(bytes: &[u8], progress: &ProgressSink<'_>) -> Result<Repaired> {
    let mut issues: Vec<String> = Vec::new();
    let mut fixes: Vec<String> = Vec::new();

    progress.indeterminate("Checking file structure");
    if bytes.is_empty() {
        return Err(failure(vec!["The file is empty".to_string()]));
    }

    let mut data = bytes.to_vec();
    fix_header(&mut data, &mut issues, &mut fixes);
    fix_trailer(&mut data, &mut issues, &mut fixes);

    let mut doc = match Document::load_mem(&data) {
        Ok(doc) => doc,
        Err(e) => {
            issues.push(format!("Parser error: {}", e));
            progress.indeterminate("Rebuilding cross-reference table");
            match xref::rebuild(&data) {
                Ok(rebuilt) => match Document::load_mem(&rebuilt) {
                    Ok(doc) => {
                        fixes.push("Rebuilt the cross-reference table".to_string());
                        doc
                    }
                    Err(e) => {
                        issues.push(format!("Rebuilt file still unreadable: {}", e));
                        return Err(failure(issues));
                    }
                },
                Err(reasons) => {
                    issues.extend(reasons);
                    return Err(failure(issues));
                }
            }
        }
    };

    progress.indeterminate("Cleaning up objects");
    let page_count = doc.get_pages().len();
    if page_count == 0 {
        issues.push("The page tree contains no readable pages".to_string());
        return Err(failure(issues));
    }

    let empty = doc.delete_zero_length_streams();
    if !empty.is_empty() {
        fixes.push(format!("Removed {} empty stream(s)", empty.len()));
    }
    let pruned = doc.prune_objects();
    if !pruned.is_empty() {
        fixes.push(format!("Removed {} unreferenced object(s)", pruned.len()));
    }
    doc.renumber_objects();

    let out = pdf::save(&mut doc)?;
    // The rewritten file must parse on its own
    if let Err(e) = pdf::load(&out) {
        issues.push(format!("Rewritten file failed verification: {}", e));
        return Err(failure(issues));
    }

    log::info!(
        "Repaired PDF: {} page(s), {} fix(es) applied",
        page_count,
        fixes.len()
    );
    Ok(Repaired { bytes: out, fixes })
}

fn failure(items: Vec<String>) -> ToolError {
    ToolError::Diagnostics {
        message: "The PDF could not be repaired".to_string(),
        items,
    }
}

fn fix_header(data: &mut Vec<u8>, issues: &mut Vec<String>, fixes: &mut Vec<String>) {
    match find(data, b"%PDF-") {
        Some(0) => {}
        Some(offset) => {
            issues.push(format!("{} unexpected byte(s) before the PDF header", offset));
            data.drain(..offset);
            fixes.push(format!("Removed {} byte(s) of leading garbage", offset));
        }
        None => {
            issues.push("No %PDF- header found".to_string());
            if find(data, b" obj").is_some() {
                let mut fixed = b"%PDF-1.4\n".to_vec();
                fixed.append(data);
                *data = fixed;
                fixes.push("Added a missing %PDF-1.4 header".to_string());
            }
        }
    }
}

fn fix_trailer(data: &mut Vec<u8>, issues: &mut Vec<String>, fixes: &mut Vec<String>) {
    match rfind(data, b"%%EOF") {
        Some(pos) => {
            let end = pos + b"%%EOF".len();
            let trailing = &data[end..];
            if trailing.iter().any(|b| !b.is_ascii_whitespace()) {
                let extra = trailing.len();
                issues.push(format!("{} byte(s) after the final %%EOF marker", extra));
                data.truncate(end);
                data.push(b'\n');
                fixes.push(format!("Removed {} byte(s) of trailing garbage", extra));
            }
        }
        None => {
            issues.push("Missing %%EOF marker".to_string());
            if !data.ends_with(b"\n") {
                data.push(b'\n');
            }
            data.extend_from_slice(b"%%EOF\n");
            fixes.push("Appended a missing %%EOF marker".to_string());
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbox_utils::fixtures::numbered_pdf;

    fn repair(bytes: &[u8]) -> Result<Repaired> {
        repair_pdf(bytes, &ProgressSink::silent())
    }

    #[test]
    fn test_intact_file_round_trips() {
        let repaired = repair(&numbered_pdf(2)).unwrap();
        assert_eq!(pdf::page_count(&repaired.bytes).unwrap(), 2);
    }

    #[test]
    fn test_leading_garbage_removed() {
        let mut bytes = b"GARBAGE-BYTES\r\n".to_vec();
        bytes.extend(numbered_pdf(1));
        let repaired = repair(&bytes).unwrap();
        assert!(repaired.fixes.iter().any(|f| f.contains("leading garbage")));
        assert!(repaired.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_missing_eof_appended() {
        let mut bytes = numbered_pdf(1);
        let pos = rfind(&bytes, b"%%EOF").unwrap();
        bytes.truncate(pos);
        let repaired = repair(&bytes).unwrap();
        assert!(repaired.fixes.iter().any(|f| f.contains("%%EOF")));
        assert_eq!(pdf::page_count(&repaired.bytes).unwrap(), 1);
    }

    #[test]
    fn test_broken_xref_rebuilt() {
        let mut bytes = numbered_pdf(3);
        let pos = rfind(&bytes, b"startxref").unwrap();
        bytes.truncate(pos);
        bytes.extend_from_slice(b"startxref\n99999999\n%%EOF\n");

        let repaired = repair(&bytes).unwrap();
        assert_eq!(pdf::page_count(&repaired.bytes).unwrap(), 3);
    }

    #[test]
    fn test_not_a_pdf_has_diagnostics() {
        let err = repair(b"This is a plain text file, not a PDF.").unwrap_err();
        assert!(matches!(err, ToolError::Diagnostics { .. }));
        let items = err.diagnostics();
        assert!(items.iter().any(|i| i.contains("header")));
        assert!(items.len() >= 2);
    }

    #[test]
    fn test_empty_file() {
        let err = repair(b"").unwrap_err();
        assert_eq!(err.diagnostics(), ["The file is empty".to_string()]);
    }
}
