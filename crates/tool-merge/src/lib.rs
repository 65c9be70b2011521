//! Merge PDF: concatenates the pages of several PDFs in selection order.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use rayon::prelude::*;

use toolbox_core::artifact::ResultArtifact;
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Preview, Tool, ToolKind};
use toolbox_utils::pdf;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

pub struct MergeTool;

impl Tool for MergeTool {
    fn name(&self) -> &str {
        "Merge PDF"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Merge
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Pdf]
    }

    fn file_count(&self) -> (usize, Option<usize>) {
        (2, None)
    }

    fn option_keys(&self) -> &[OptionKey] {
        &[OptionKey::OutputName]
    }

    fn preview(&self, files: &[SourceFile]) -> Result<Preview> {
        let counts: Result<Vec<usize>> = files
            .par_iter()
            .map(|f| {
                pdf::page_count(&f.bytes)
                    .map_err(|e| ToolError::Rejected(format!("{}: {}", f.name, e)))
            })
            .collect();
        Ok(Preview {
            file_count: files.len(),
            page_count: Some(counts?.iter().sum()),
        })
    }

    fn process(
        &self,
        files: &[SourceFile],
        options: &ToolOptions,
        progress: &ProgressSink<'_>,
    ) -> Result<ResultArtifact> {
        progress.begin(files.len() + 1, "Loading documents");

        // Parse in parallel, merge sequentially in selection order
        let docs: Result<Vec<Document>> = files
            .par_iter()
            .map(|f| {
                let doc = pdf::load(&f.bytes)
                    .map_err(|e| ToolError::Pdf(format!("{}: {}", f.name, e)));
                progress.advance(&format!("Loaded {}", f.name));
                doc
            })
            .collect();

        let mut merged = merge_documents(docs?)?;
        let bytes = pdf::save(&mut merged)?;
        progress.advance("Merged");
        Ok(ResultArtifact::new(
            options.file_name_or("merged.pdf"),
            Format::Pdf,
            bytes,
        ))
    }
}

/// Concatenate the pages of `docs`, in order, into a new document.
pub fn merge_documents(docs: Vec<Document>) -> Result<Document> {
    let mut merged = Document::with_version("1.5");
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();

    for (index, mut doc) in docs.into_iter().enumerate() {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            log::warn!("Document {} has no pages", index + 1);
        }
        for &page_id in &pages {
            let inherited = inherited_attributes(&doc, page_id);
            if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
                for (key, value) in inherited {
                    page.set(key, value);
                }
            }
        }
        page_ids.extend(pages);

        for (id, object) in doc.objects {
            match dict_type(&object) {
                Some(b"Catalog") | Some(b"Pages") | Some(b"Outlines") => {}
                _ => {
                    merged.objects.insert(id, object);
                }
            }
        }
    }

    if page_ids.is_empty() {
        return Err(ToolError::Pdf("none of the documents has any pages".to_string()));
    }

    let pages_id = (max_id, 0);
    let catalog_id = (max_id + 1, 0);
    for &page_id in &page_ids {
        let page = merged
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| ToolError::Pdf(format!("page {:?}: {}", page_id, e)))?;
        page.set("Parent", pages_id);
    }

    let count = page_ids.len() as i64;
    let kids: Vec<Object> = page_ids.into_iter().map(Object::Reference).collect();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    merged.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }),
    );
    merged.trailer.set("Root", catalog_id);
    merged.max_id = catalog_id.0;

    merged.prune_objects();
    merged.renumber_objects();
    merged.compress();
    log::info!("Merged document has {} page(s)", count);
    Ok(merged)
}

/// Inheritable attributes the page lacks but an ancestor defines.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let page = match doc.get_dictionary(page_id) {
        Ok(p) => p,
        Err(_) => return Vec::new(),
    };
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let mut parent = parent_of(doc, page);
    // Bounded walk; malformed trees can loop
    for _ in 0..64 {
        let node = match parent {
            Some(n) => n,
            None => break,
        };
        for key in INHERITABLE {
            if !page.has(key) && !found.iter().any(|(k, _)| k.as_slice() == key) {
                if let Ok(value) = node.get(key) {
                    found.push((key.to_vec(), value.clone()));
                }
            }
        }
        parent = parent_of(doc, node);
    }
    found
}

fn parent_of<'a>(doc: &'a Document, node: &Dictionary) -> Option<&'a Dictionary> {
    let id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    doc.get_dictionary(id).ok()
}

fn dict_type(object: &Object) -> Option<&[u8]> {
    object.as_dict().ok()?.get(b"Type").ok()?.as_name().ok()
}
