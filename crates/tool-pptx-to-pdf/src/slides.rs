//! Slide order and slide text from a PresentationML package.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Text and picture references of one slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideContent {
    /// Text of the title placeholder, if the slide has one.
    pub title: Option<String>,
    /// Every other paragraph, in shape order.
    pub paragraphs: Vec<String>,
    /// Relationship ids of embedded pictures.
    pub images: Vec<String>,
}

impl SlideContent {
    /// The heading to show: the title placeholder, else the first non-empty
    /// paragraph, which is then left out of the body.
    pub fn heading_and_body(&self) -> (Option<String>, &[String]) {
        if let Some(title) = &self.title {
            return (Some(title.clone()), &self.paragraphs);
        }
        match self.paragraphs.iter().position(|p| !p.trim().is_empty()) {
            Some(i) => (
                Some(self.paragraphs[i].trim().to_string()),
                &self.paragraphs[i + 1..],
            ),
            None => (None, &[]),
        }
    }
}

fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// The namespaced `r:id` / `r:embed` attribute, whatever its prefix.
fn relationship_attr(e: &BytesStart<'_>, local: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == local.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Parse a relationships part into a map of rId → target.
pub fn parse_relationships(xml: &str) -> HashMap<String, String> {
    let mut rels = HashMap::new();
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    if let (Some(id), Some(target)) = (attr(e, "Id"), attr(e, "Target")) {
                        rels.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    rels
}

/// Relationship ids of the slides listed in `ppt/presentation.xml`, in
/// presentation order.
pub fn slide_ids(presentation_xml: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(presentation_xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"sldId" {
                    if let Some(rid) = relationship_attr(e, "id") {
                        ids.push(rid);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    ids
}

/// Slide part names ordered by the number in `slideN.xml`, for packages
/// whose presentation part is missing or lists nothing.
pub fn slides_by_name(entries: &[String]) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = entries
        .iter()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((number, name.clone()))
        })
        .collect();
    slides.sort();
    slides.into_iter().map(|(_, name)| name).collect()
}

/// Collect the text of a slide, shape by shape.
pub fn parse_slide(xml: &str) -> SlideContent {
    let mut content = SlideContent::default();
    let mut reader = Reader::from_str(xml);

    let mut shape_is_title = false;
    let mut shape_paragraphs: Vec<String> = Vec::new();
    let mut paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"sp" | b"graphicFrame" => {
                    shape_is_title = false;
                    shape_paragraphs.clear();
                }
                b"p" => paragraph = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"ph" => {
                    shape_is_title = matches!(
                        attr(e, "type").as_deref(),
                        Some("title") | Some("ctrTitle")
                    );
                }
                b"p" => shape_paragraphs.push(String::new()),
                b"br" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push(' ');
                    }
                }
                b"blip" => {
                    if let Some(rid) = relationship_attr(e, "embed") {
                        content.images.push(rid);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_text {
                    if let (Some(p), Ok(text)) = (paragraph.as_mut(), e.unescape()) {
                        p.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(p) = paragraph.take() {
                        shape_paragraphs.push(p);
                    }
                }
                b"sp" | b"graphicFrame" => {
                    let paragraphs = std::mem::take(&mut shape_paragraphs);
                    if shape_is_title && content.title.is_none() {
                        let title = paragraphs
                            .iter()
                            .map(|p| p.trim())
                            .filter(|p| !p.is_empty())
                            .collect::<Vec<_>>()
                            .join(" ");
                        if !title.is_empty() {
                            content.title = Some(title);
                        }
                    } else {
                        content.paragraphs.extend(paragraphs);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("Malformed slide XML: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Trailing blank paragraphs of the last shape carry no information
    while content.paragraphs.last().is_some_and(|p| p.trim().is_empty()) {
        content.paragraphs.pop();
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree>
  <p:sp>
    <p:nvSpPr><p:cNvPr id="3" name="Content"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr>
    <p:txBody><a:bodyPr/><a:p><a:r><a:t>First </a:t></a:r><a:r><a:t>point</a:t></a:r></a:p><a:p/><a:p><a:r><a:t>Second</a:t></a:r></a:p></p:txBody>
  </p:sp>
  <p:sp>
    <p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>
    <p:txBody><a:bodyPr/><a:p><a:r><a:t>Roadmap</a:t></a:r></a:p></p:txBody>
  </p:sp>
  <p:pic><p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic>
</p:spTree></p:cSld>
</p:sld>"#;

    #[test]
    fn test_title_placeholder_wins() {
        let slide = parse_slide(SLIDE);
        assert_eq!(slide.title.as_deref(), Some("Roadmap"));
        assert_eq!(slide.paragraphs, vec!["First point", "", "Second"]);
        assert_eq!(slide.images, vec!["rId2"]);
    }

    #[test]
    fn test_heading_falls_back_to_first_text() {
        let slide = SlideContent {
            title: None,
            paragraphs: vec!["".to_string(), "Intro".to_string(), "body".to_string()],
            images: vec![],
        };
        let (heading, body) = slide.heading_and_body();
        assert_eq!(heading.as_deref(), Some("Intro"));
        assert_eq!(body, ["body".to_string()]);
    }

    #[test]
    fn test_slide_ids_use_relationship_attribute() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst>
<p:sldId id="257" r:id="rId9"/><p:sldId id="256" r:id="rId3"/>
</p:sldIdLst></p:presentation>"#;
        assert_eq!(slide_ids(xml), vec!["rId9", "rId3"]);
    }

    #[test]
    fn test_slides_by_name_sorts_numerically() {
        let entries: Vec<String> = ["ppt/slides/slide10.xml", "ppt/slides/slide2.xml", "ppt/slides/_rels/slide2.xml.rels"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            slides_by_name(&entries),
            vec!["ppt/slides/slide2.xml", "ppt/slides/slide10.xml"]
        );
    }
}
