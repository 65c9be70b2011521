//! WordprocessingML package writer.

use std::io;

use toolbox_utils::archive::ZipBuilder;
use toolbox_utils::xml::XmlBuilder;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// A body element of the generated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    PageBreak,
}

/// A minimal Word document: text paragraphs and page breaks.
#[derive(Debug, Clone, Default)]
pub struct DocxDocument {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl DocxDocument {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn paragraph(&mut self, text: &str) {
        self.blocks.push(Block::Paragraph(text.to_string()));
    }

    pub fn page_break(&mut self) {
        self.blocks.push(Block::PageBreak);
    }

    pub fn paragraph_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Paragraph(_)))
            .count()
    }

    /// Package the document as DOCX bytes.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut zip = ZipBuilder::new();
        zip.add_file("[Content_Types].xml", content_types().as_bytes())?;
        zip.add_file("_rels/.rels", package_rels().as_bytes())?;
        zip.add_file("docProps/core.xml", self.core_properties().as_bytes())?;
        zip.add_file("word/_rels/document.xml.rels", document_rels().as_bytes())?;
        zip.add_file("word/styles.xml", styles().as_bytes())?;
        zip.add_file("word/document.xml", self.document_xml().as_bytes())?;
        zip.finish()
    }

    pub fn document_xml(&self) -> String {
        let mut xml = XmlBuilder::new();
        xml.open_tag("w:document", &[("xmlns:w", NS_W)]);
        xml.open_tag("w:body", &[]);
        for block in &self.blocks {
            match block {
                Block::Paragraph(text) if text.is_empty() => {
                    xml.empty_tag("w:p", &[]);
                }
                Block::Paragraph(text) => {
                    xml.open_tag("w:p", &[]);
                    xml.open_tag("w:r", &[]);
                    xml.text_element("w:t", text, &[("xml:space", "preserve")]);
                    xml.close_tag("w:r");
                    xml.close_tag("w:p");
                }
                Block::PageBreak => {
                    xml.open_tag("w:p", &[]);
                    xml.open_tag("w:r", &[]);
                    xml.empty_tag("w:br", &[("w:type", "page")]);
                    xml.close_tag("w:r");
                    xml.close_tag("w:p");
                }
            }
        }
        // A4 portrait, one-inch margins (twentieths of a point)
        xml.open_tag("w:sectPr", &[]);
        xml.empty_tag("w:pgSz", &[("w:w", "11906"), ("w:h", "16838")]);
        xml.empty_tag(
            "w:pgMar",
            &[
                ("w:top", "1440"),
                ("w:right", "1440"),
                ("w:bottom", "1440"),
                ("w:left", "1440"),
            ],
        );
        xml.close_tag("w:sectPr");
        xml.close_tag("w:body");
        xml.close_tag("w:document");
        xml.build()
    }

    fn core_properties(&self) -> String {
        let mut xml = XmlBuilder::new();
        xml.open_tag(
            "cp:coreProperties",
            &[
                (
                    "xmlns:cp",
                    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
                ),
                ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ],
        );
        xml.text_element("dc:title", &self.title, &[]);
        xml.close_tag("cp:coreProperties");
        xml.build()
    }
}

fn content_types() -> String {
    let mut xml = XmlBuilder::new();
    xml.open_tag(
        "Types",
        &[("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")],
    );
    xml.empty_tag(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    );
    xml.empty_tag(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    );
    for (part, content_type) in [
        (
            "/word/document.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        ),
        (
            "/word/styles.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
        ),
        (
            "/docProps/core.xml",
            "application/vnd.openxmlformats-package.core-properties+xml",
        ),
    ] {
        xml.empty_tag("Override", &[("PartName", part), ("ContentType", content_type)]);
    }
    xml.close_tag("Types");
    xml.build()
}

fn package_rels() -> String {
    let mut xml = XmlBuilder::new();
    xml.open_tag("Relationships", &[("xmlns", NS_PKG_RELS)]);
    xml.empty_tag(
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", REL_OFFICE_DOCUMENT),
            ("Target", "word/document.xml"),
        ],
    );
    xml.empty_tag(
        "Relationship",
        &[
            ("Id", "rId2"),
            ("Type", REL_CORE_PROPS),
            ("Target", "docProps/core.xml"),
        ],
    );
    xml.close_tag("Relationships");
    xml.build()
}

fn document_rels() -> String {
    let mut xml = XmlBuilder::new();
    xml.open_tag("Relationships", &[("xmlns", NS_PKG_RELS)]);
    xml.empty_tag(
        "Relationship",
        &[("Id", "rId1"), ("Type", REL_STYLES), ("Target", "styles.xml")],
    );
    xml.close_tag("Relationships");
    xml.build()
}

fn styles() -> String {
    let mut xml = XmlBuilder::new();
    xml.open_tag("w:styles", &[("xmlns:w", NS_W)]);
    xml.open_tag(
        "w:style",
        &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
    );
    xml.empty_tag("w:name", &[("w:val", "Normal")]);
    xml.open_tag("w:rPr", &[]);
    xml.empty_tag("w:sz", &[("w:val", "22")]);
    xml.close_tag("w:rPr");
    xml.close_tag("w:style");
    xml.close_tag("w:styles");
    xml.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbox_utils::{archive, xml};

    #[test]
    fn test_document_xml_structure() {
        let mut doc = DocxDocument::new("Report");
        doc.paragraph("  indented & <odd>");
        doc.paragraph("");
        doc.page_break();
        doc.paragraph("next");

        let body = doc.document_xml();
        assert!(body.contains(r#"<w:t xml:space="preserve">  indented &amp; &lt;odd&gt;</w:t>"#));
        assert!(body.contains("<w:p/>"));
        assert!(body.contains(r#"<w:br w:type="page"/>"#));
        assert_eq!(doc.paragraph_count(), 3);
        assert_eq!(xml::paragraph_texts(&body, "p", "t")[0], "  indented & <odd>");
    }

    #[test]
    fn test_package_parts() {
        let mut doc = DocxDocument::new("Quarterly");
        doc.paragraph("hello");
        let bytes = doc.to_bytes().unwrap();

        let entries = archive::list_entries(&bytes).unwrap();
        assert_eq!(entries[0], "[Content_Types].xml");
        for part in ["_rels/.rels", "word/document.xml", "word/styles.xml", "docProps/core.xml"] {
            assert!(entries.iter().any(|e| e == part), "missing {}", part);
        }
        let core = archive::read_entry_string(&bytes, "docProps/core.xml").unwrap();
        assert_eq!(xml::extract_text(&core, "title"), vec!["Quarterly"]);
    }
}
