//! XML helpers using quick-xml, plus a small builder for OOXML parts.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// Text content of every `tag_name` element (matched by local name).
pub fn extract_text(xml: &str, tag_name: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut results = Vec::new();
    let mut in_target = false;
    let mut buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == tag_name.as_bytes() {
                    in_target = true;
                    buf.clear();
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_target {
                    if let Ok(text) = e.unescape() {
                        buf.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == tag_name.as_bytes() && in_target {
                    results.push(buf.clone());
                    in_target = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
    results
}

/// Text of each `para_tag` element, joining the `text_tag` runs inside it.
///
/// Used for DrawingML where a paragraph (`a:p`) holds several runs (`a:t`).
pub fn paragraph_texts(xml: &str, para_tag: &str, text_tag: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                if name.as_ref() == para_tag.as_bytes() {
                    current = Some(String::new());
                } else if name.as_ref() == text_tag.as_bytes() {
                    in_text = true;
                }
            }
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == para_tag.as_bytes() {
                    paragraphs.push(String::new());
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_text {
                    if let (Some(para), Ok(text)) = (current.as_mut(), e.unescape()) {
                        para.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.local_name();
                if name.as_ref() == text_tag.as_bytes() {
                    in_text = false;
                } else if name.as_ref() == para_tag.as_bytes() {
                    if let Some(para) = current.take() {
                        paragraphs.push(para);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
    paragraphs
}

/// Attributes of every occurrence of a tag, in document order.
pub fn all_attributes(xml: &str, tag_name: &str) -> Vec<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut found = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == tag_name.as_bytes() {
                    let mut attrs = HashMap::new();
                    for attr in e.attributes().flatten() {
                        let key =
                            String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
                        let value = attr
                            .unescape_value()
                            .map(|v| v.to_string())
                            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
                        attrs.insert(key, value);
                    }
                    found.push(attrs);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
    found
}

/// Simple XML builder for generating package parts.
pub struct XmlBuilder {
    content: String,
    indent_level: usize,
}

impl XmlBuilder {
    /// Start a standalone UTF-8 document, as OOXML parts expect.
    pub fn new() -> Self {
        Self {
            content: String::from(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
            ),
            indent_level: 0,
        }
    }

    pub fn open_tag(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.indent();
        self.start(name, attrs);
        self.content.push_str(">\n");
        self.indent_level += 1;
        self
    }

    pub fn close_tag(&mut self, name: &str) -> &mut Self {
        self.indent_level = self.indent_level.saturating_sub(1);
        self.indent();
        self.content.push_str("</");
        self.content.push_str(name);
        self.content.push_str(">\n");
        self
    }

    pub fn empty_tag(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.indent();
        self.start(name, attrs);
        self.content.push_str("/>\n");
        self
    }

    /// An element with text content. Leading and trailing spaces survive.
    pub fn text_element(&mut self, name: &str, text: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.indent();
        self.start(name, attrs);
        self.content.push('>');
        self.content.push_str(&escape_xml_text(text));
        self.content.push_str("</");
        self.content.push_str(name);
        self.content.push_str(">\n");
        self
    }

    pub fn raw(&mut self, text: &str) -> &mut Self {
        self.content.push_str(text);
        self
    }

    pub fn build(self) -> String {
        self.content
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.content.push('<');
        self.content.push_str(name);
        for (key, value) in attrs {
            self.content.push(' ');
            self.content.push_str(key);
            self.content.push_str("=\"");
            self.content.push_str(&escape_xml_attr(value));
            self.content.push('"');
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.indent_level {
            self.content.push_str("  ");
        }
    }
}

impl Default for XmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape special characters in XML text content.
/// Control characters XML 1.0 forbids are dropped.
pub fn escape_xml_text(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect::<String>()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape special characters in XML attribute values.
pub fn escape_xml_attr(s: &str) -> String {
    escape_xml_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text() {
        let xml = r#"<root><title>Hello World</title><title>Second</title></root>"#;
        let titles = extract_text(xml, "title");
        assert_eq!(titles, vec!["Hello World", "Second"]);
    }

    #[test]
    fn test_paragraph_texts_joins_runs() {
        let xml = r#"<p:txBody xmlns:a="a" xmlns:p="p">
            <a:p><a:r><a:t>Hello </a:t></a:r><a:r><a:t>World</a:t></a:r></a:p>
            <a:p/>
            <a:p><a:r><a:t>Tom &amp; Jerry</a:t></a:r></a:p>
        </p:txBody>"#;
        let paras = paragraph_texts(xml, "p", "t");
        assert_eq!(paras, vec!["Hello World", "", "Tom & Jerry"]);
    }

    #[test]
    fn test_all_attributes() {
        let xml = r#"<Relationships><Relationship Id="rId1" Target="slides/slide1.xml"/><Relationship Id="rId2" Target="slides/slide2.xml"/></Relationships>"#;
        let rels = all_attributes(xml, "Relationship");
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].get("Id").unwrap(), "rId1");
        assert_eq!(rels[1].get("Target").unwrap(), "slides/slide2.xml");
    }

    #[test]
    fn test_xml_builder() {
        let mut builder = XmlBuilder::new();
        builder
            .open_tag("w:document", &[("xmlns:w", "http://example.com")])
            .text_element("w:t", "A & B", &[("xml:space", "preserve")])
            .empty_tag("w:br", &[])
            .close_tag("w:document");

        let xml = builder.build();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<w:t xml:space=\"preserve\">A &amp; B</w:t>"));
        assert!(xml.contains("<w:br/>"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_xml_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_xml_attr("say \"hello\""), "say &quot;hello&quot;");
        assert_eq!(escape_xml_text("bell\u{7}"), "bell");
    }
}
