//! Word styles and numbering definitions, for heading and list detection.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Style information extracted from word/styles.xml.
#[derive(Debug, Clone)]
pub struct StyleInfo {
    /// The style name (e.g., "heading 1", "Normal", "List Paragraph")
    pub name: String,
    /// The parent style ID, if any
    pub based_on: Option<String>,
    /// Outline level (0 = heading 1, 1 = heading 2, etc.)
    pub outline_level: Option<u8>,
}

/// Local-name value of the `val` attribute.
pub(crate) fn val_attr(e: &BytesStart<'_>) -> Option<String> {
    attr(e, "val")
}

pub(crate) fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Parse `word/styles.xml` into a map of style_id → StyleInfo.
///
/// Headings are recognised by outline level, or failing that by a name of
/// the form "heading N". A style named "Title" counts as a level-1 heading.
pub fn parse_styles(xml: &str) -> HashMap<String, StyleInfo> {
    let mut styles = HashMap::new();
    let mut reader = Reader::from_str(xml);

    let mut current_id = String::new();
    let mut current_name = String::new();
    let mut current_based_on: Option<String> = None;
    let mut current_outline: Option<u8> = None;
    let mut in_style = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match e.local_name().as_ref() {
                    b"style" => {
                        in_style = true;
                        current_id = attr(e, "styleId").unwrap_or_default();
                        current_name.clear();
                        current_based_on = None;
                        current_outline = None;
                    }
                    b"name" if in_style => current_name = val_attr(e).unwrap_or_default(),
                    b"basedOn" if in_style => current_based_on = val_attr(e),
                    b"outlineLvl" if in_style => {
                        current_outline = val_attr(e).and_then(|v| v.parse::<u8>().ok());
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"style" && in_style {
                    if !current_id.is_empty() {
                        if current_outline.is_none() {
                            current_outline = outline_from_name(&current_name);
                        }
                        styles.insert(
                            current_id.clone(),
                            StyleInfo {
                                name: current_name.clone(),
                                based_on: current_based_on.take(),
                                outline_level: current_outline,
                            },
                        );
                    }
                    in_style = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("styles.xml: {}", e);
                break;
            }
            _ => {}
        }
    }

    styles
}

fn outline_from_name(name: &str) -> Option<u8> {
    let lower = name.to_lowercase();
    if lower == "title" {
        return Some(0);
    }
    if lower.starts_with("heading") || lower.starts_with("titre") {
        let n = lower.chars().find(|c| c.is_ascii_digit())?.to_digit(10)?;
        if (1..=9).contains(&n) {
            return Some((n - 1) as u8);
        }
    }
    None
}

/// Determine the heading level (1-6) for a given style ID.
/// Returns None if the style is not a heading.
pub fn heading_level(style_id: &str, styles: &HashMap<String, StyleInfo>) -> Option<u8> {
    heading_level_bounded(style_id, styles, 0)
}

fn heading_level_bounded(
    style_id: &str,
    styles: &HashMap<String, StyleInfo>,
    depth: usize,
) -> Option<u8> {
    // basedOn chains can be cyclic in damaged files
    if depth > 16 {
        return None;
    }
    let info = styles.get(style_id)?;
    if let Some(outline) = info.outline_level {
        return Some((outline + 1).min(6));
    }
    heading_level_bounded(info.based_on.as_deref()?, styles, depth + 1)
}

/// Number formats of one list definition, indexed by indentation level.
#[derive(Debug, Clone, Default)]
pub struct NumberingInfo {
    /// "decimal", "bullet", "lowerLetter", etc.
    pub formats: Vec<String>,
}

impl NumberingInfo {
    pub fn is_bullet(&self, level: usize) -> bool {
        match self.formats.get(level).or_else(|| self.formats.first()) {
            Some(format) => format == "bullet" || format == "none",
            None => true,
        }
    }
}

/// Parse `word/numbering.xml` into a map of numId → NumberingInfo.
///
/// Paragraphs reference a `w:num` instance, which points at a shared
/// `w:abstractNum` holding the per-level formats.
pub fn parse_numbering(xml: &str) -> HashMap<String, NumberingInfo> {
    let mut abstracts: HashMap<String, NumberingInfo> = HashMap::new();
    let mut instances: Vec<(String, String)> = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut current_abstract: Option<String> = None;
    let mut current_level: usize = 0;
    let mut current_num: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"abstractNum" => {
                    let id = attr(e, "abstractNumId").unwrap_or_default();
                    abstracts.entry(id.clone()).or_default();
                    current_abstract = Some(id);
                }
                b"lvl" if current_abstract.is_some() => {
                    current_level = attr(e, "ilvl").and_then(|v| v.parse().ok()).unwrap_or(0);
                }
                b"numFmt" => {
                    if let (Some(id), Some(format)) = (&current_abstract, val_attr(e)) {
                        let info = abstracts.entry(id.clone()).or_default();
                        if info.formats.len() <= current_level {
                            info.formats.resize(current_level + 1, "decimal".to_string());
                        }
                        info.formats[current_level] = format;
                    }
                }
                b"num" => current_num = attr(e, "numId"),
                b"abstractNumId" => {
                    if let (Some(num), Some(abs)) = (&current_num, val_attr(e)) {
                        instances.push((num.clone(), abs));
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"abstractNum" => current_abstract = None,
                b"num" => current_num = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("numbering.xml: {}", e);
                break;
            }
            _ => {}
        }
    }

    instances
        .into_iter()
        .map(|(num, abs)| (num, abstracts.get(&abs).cloned().unwrap_or_default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_styles() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:pPr><w:outlineLvl w:val="0"/></w:pPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:pPr><w:outlineLvl w:val="1"/></w:pPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Normal">
    <w:name w:val="Normal"/>
  </w:style>
</w:styles>"#;

        let styles = parse_styles(xml);
        assert!(styles.contains_key("Heading1"));
        assert_eq!(styles["Heading1"].outline_level, Some(0));
        assert_eq!(heading_level("Heading1", &styles), Some(1));
        assert_eq!(heading_level("Heading2", &styles), Some(2));
        assert_eq!(heading_level("Normal", &styles), None);
    }

    #[test]
    fn test_heading_by_name_and_inheritance() {
        let xml = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/></w:style>
  <w:style w:type="paragraph" w:styleId="Custom"><w:name w:val="Fancy"/><w:basedOn w:val="Heading3"/></w:style>
  <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style>
</w:styles>"#;

        let styles = parse_styles(xml);
        assert_eq!(heading_level("Heading3", &styles), Some(3));
        assert_eq!(heading_level("Custom", &styles), Some(3));
        assert_eq!(heading_level("Title", &styles), Some(1));
    }

    #[test]
    fn test_cyclic_based_on() {
        let xml = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:styleId="A"><w:name w:val="A"/><w:basedOn w:val="B"/></w:style>
  <w:style w:styleId="B"><w:name w:val="B"/><w:basedOn w:val="A"/></w:style>
</w:styles>"#;
        assert_eq!(heading_level("A", &parse_styles(xml)), None);
    }

    #[test]
    fn test_parse_numbering_resolves_instances() {
        let xml = r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="1">
    <w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl>
    <w:lvl w:ilvl="1"><w:numFmt w:val="bullet"/></w:lvl>
  </w:abstractNum>
  <w:num w:numId="5"><w:abstractNumId w:val="1"/></w:num>
  <w:num w:numId="7"><w:abstractNumId w:val="0"/></w:num>
</w:numbering>"#;

        let numbering = parse_numbering(xml);
        assert!(!numbering["5"].is_bullet(0));
        assert!(numbering["5"].is_bullet(1));
        assert!(numbering["7"].is_bullet(0));
        assert!(!numbering.contains_key("0"));
    }
}
