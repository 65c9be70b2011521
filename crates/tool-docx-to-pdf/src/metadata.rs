//! Parse Dublin Core metadata from `docProps/core.xml`.

use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub subject: Option<String>,
    pub language: Option<String>,
}

/// Core properties use the Dublin Core namespace (`dc:title`,
/// `dc:creator`, `dc:subject`, `dc:language`). The first non-empty value
/// of each wins.
pub fn parse_core_properties(xml: &str) -> CoreProperties {
    let mut props = CoreProperties::default();
    let mut reader = Reader::from_str(xml);
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                current_tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
            }
            Ok(Event::Text(ref e)) => {
                let text = match e.unescape() {
                    Ok(text) => text.trim().to_string(),
                    Err(_) => continue,
                };
                if text.is_empty() {
                    continue;
                }
                let slot = match current_tag.as_str() {
                    "title" => &mut props.title,
                    "creator" => &mut props.creator,
                    "subject" => &mut props.subject,
                    "language" => &mut props.language,
                    _ => continue,
                };
                slot.get_or_insert(text);
            }
            Ok(Event::End(_)) => current_tag.clear(),
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    props
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_core_properties() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
                   xmlns:dc="http://purl.org/dc/elements/1.1/"
                   xmlns:dcterms="http://purl.org/dc/terms/">
  <dc:title>My Document</dc:title>
  <dc:creator>J. Doe</dc:creator>
  <dc:language>en-US</dc:language>
  <dcterms:created>2024-01-15T10:30:00Z</dcterms:created>
</cp:coreProperties>"#;

        let props = parse_core_properties(xml);
        assert_eq!(props.title.as_deref(), Some("My Document"));
        assert_eq!(props.creator.as_deref(), Some("J. Doe"));
        assert_eq!(props.language.as_deref(), Some("en-US"));
        assert_eq!(props.subject, None);
    }

    #[test]
    fn test_blank_title_is_none() {
        let xml = r#"<cp:coreProperties xmlns:cp="x" xmlns:dc="y"><dc:title>   </dc:title></cp:coreProperties>"#;
        assert_eq!(parse_core_properties(xml).title, None);
    }
}
