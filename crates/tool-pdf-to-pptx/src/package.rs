//! PresentationML package writer: one master, one blank layout, one theme,
//! and text-only slides.

use std::io;

use toolbox_utils::archive::ZipBuilder;
use toolbox_utils::xml::XmlBuilder;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/";

const CT_MAIN: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";

/// 4:3 slide in EMU.
pub const SLIDE_WIDTH: i64 = 9_144_000;
pub const SLIDE_HEIGHT: i64 = 6_858_000;

const MARGIN_X: i64 = 457_200;
const TITLE_Y: i64 = 274_638;
const TITLE_HEIGHT: i64 = 1_143_000;
const BODY_Y: i64 = 1_600_200;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slide {
    pub title: String,
    pub body: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Presentation {
    pub title: String,
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            slides: Vec::new(),
        }
    }

    /// Package the presentation as PPTX bytes.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut zip = ZipBuilder::new();
        zip.add_file("[Content_Types].xml", self.content_types().as_bytes())?;
        zip.add_file("_rels/.rels", package_rels().as_bytes())?;
        zip.add_file("docProps/core.xml", self.core_properties().as_bytes())?;
        zip.add_file("ppt/presentation.xml", self.presentation_xml().as_bytes())?;
        zip.add_file(
            "ppt/_rels/presentation.xml.rels",
            self.presentation_rels().as_bytes(),
        )?;
        zip.add_file("ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER.as_bytes())?;
        zip.add_file(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            relationships(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                ("rId2", "theme", "../theme/theme1.xml"),
            ])
            .as_bytes(),
        )?;
        zip.add_file("ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT.as_bytes())?;
        zip.add_file(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            relationships(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]).as_bytes(),
        )?;
        zip.add_file("ppt/theme/theme1.xml", THEME.as_bytes())?;

        let slide_rels =
            relationships(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]);
        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            zip.add_file(&format!("ppt/slides/slide{}.xml", n), slide_xml(slide).as_bytes())?;
            zip.add_file(
                &format!("ppt/slides/_rels/slide{}.xml.rels", n),
                slide_rels.as_bytes(),
            )?;
        }
        zip.finish()
    }

    fn content_types(&self) -> String {
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
        let mut overrides = vec![
            ("/ppt/presentation.xml".to_string(), CT_MAIN),
            ("/ppt/slideMasters/slideMaster1.xml".to_string(), CT_MASTER),
            ("/ppt/slideLayouts/slideLayout1.xml".to_string(), CT_LAYOUT),
            ("/ppt/theme/theme1.xml".to_string(), CT_THEME),
            ("/docProps/core.xml".to_string(), CT_CORE),
        ];
        for n in 1..=self.slides.len() {
            overrides.push((format!("/ppt/slides/slide{}.xml", n), CT_SLIDE));
        }
        for (part, content_type) in &overrides {
            xml.empty_tag("Override", &[("PartName", part), ("ContentType", content_type)]);
        }
        xml.close_tag("Types");
        xml.build()
    }

    fn presentation_xml(&self) -> String {
        let mut xml = XmlBuilder::new();
        xml.open_tag(
            "p:presentation",
            &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)],
        );
        xml.open_tag("p:sldMasterIdLst", &[]);
        xml.empty_tag("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")]);
        xml.close_tag("p:sldMasterIdLst");
        if !self.slides.is_empty() {
            xml.open_tag("p:sldIdLst", &[]);
            for i in 0..self.slides.len() {
                let id = (256 + i).to_string();
                let rid = format!("rId{}", i + 2);
                xml.empty_tag("p:sldId", &[("id", &id), ("r:id", &rid)]);
            }
            xml.close_tag("p:sldIdLst");
        }
        xml.empty_tag(
            "p:sldSz",
            &[
                ("cx", &SLIDE_WIDTH.to_string()),
                ("cy", &SLIDE_HEIGHT.to_string()),
                ("type", "screen4x3"),
            ],
        );
        xml.empty_tag("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")]);
        xml.close_tag("p:presentation");
        xml.build()
    }

    fn presentation_rels(&self) -> String {
        let mut rels = vec![(
            "rId1".to_string(),
            "slideMaster",
            "slideMasters/slideMaster1.xml".to_string(),
        )];
        for n in 1..=self.slides.len() {
            rels.push((format!("rId{}", n + 1), "slide", format!("slides/slide{}.xml", n)));
        }
        rels.push((
            format!("rId{}", self.slides.len() + 2),
            "theme",
            "theme/theme1.xml".to_string(),
        ));
        let borrowed: Vec<(&str, &str, &str)> = rels
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
            .collect();
        relationships(&borrowed)
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

fn package_rels() -> String {
    let mut xml = XmlBuilder::new();
    xml.open_tag("Relationships", &[("xmlns", NS_PKG_RELS)]);
    xml.empty_tag(
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", &format!("{}officeDocument", REL_BASE)),
            ("Target", "ppt/presentation.xml"),
        ],
    );
    xml.empty_tag(
        "Relationship",
        &[
            ("Id", "rId2"),
            (
                "Type",
                "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            ),
            ("Target", "docProps/core.xml"),
        ],
    );
    xml.close_tag("Relationships");
    xml.build()
}

/// A relationships part from `(id, relationship kind, target)` triples.
fn relationships(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = XmlBuilder::new();
    xml.open_tag("Relationships", &[("xmlns", NS_PKG_RELS)]);
    for (id, kind, target) in entries {
        let rel_type = format!("{}{}", REL_BASE, kind);
        xml.empty_tag(
            "Relationship",
            &[("Id", id), ("Type", &rel_type), ("Target", target)],
        );
    }
    xml.close_tag("Relationships");
    xml.build()
}

pub fn slide_xml(slide: &Slide) -> String {
    let mut xml = XmlBuilder::new();
    xml.open_tag("p:sld", &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)]);
    xml.open_tag("p:cSld", &[]);
    xml.open_tag("p:spTree", &[]);
    group_properties(&mut xml);

    let width = SLIDE_WIDTH - 2 * MARGIN_X;
    text_shape(
        &mut xml,
        2,
        "Title",
        (MARGIN_X, TITLE_Y, width, TITLE_HEIGHT),
        std::slice::from_ref(&slide.title),
        "3200",
        true,
    );
    text_shape(
        &mut xml,
        3,
        "Body",
        (MARGIN_X, BODY_Y, width, SLIDE_HEIGHT - BODY_Y - TITLE_Y),
        &slide.body,
        "1600",
        false,
    );

    xml.close_tag("p:spTree");
    xml.close_tag("p:cSld");
    xml.open_tag("p:clrMapOvr", &[]);
    xml.empty_tag("a:masterClrMapping", &[]);
    xml.close_tag("p:clrMapOvr");
    xml.close_tag("p:sld");
    xml.build()
}

fn group_properties(xml: &mut XmlBuilder) {
    xml.open_tag("p:nvGrpSpPr", &[]);
    xml.empty_tag("p:cNvPr", &[("id", "1"), ("name", "")]);
    xml.empty_tag("p:cNvGrpSpPr", &[]);
    xml.empty_tag("p:nvPr", &[]);
    xml.close_tag("p:nvGrpSpPr");
    xml.empty_tag("p:grpSpPr", &[]);
}

fn text_shape(
    xml: &mut XmlBuilder,
    id: u32,
    name: &str,
    (x, y, cx, cy): (i64, i64, i64, i64),
    lines: &[String],
    size: &str,
    bold: bool,
) {
    xml.open_tag("p:sp", &[]);
    xml.open_tag("p:nvSpPr", &[]);
    xml.empty_tag("p:cNvPr", &[("id", &id.to_string()), ("name", name)]);
    xml.empty_tag("p:cNvSpPr", &[("txBox", "1")]);
    xml.empty_tag("p:nvPr", &[]);
    xml.close_tag("p:nvSpPr");

    xml.open_tag("p:spPr", &[]);
    xml.open_tag("a:xfrm", &[]);
    xml.empty_tag("a:off", &[("x", &x.to_string()), ("y", &y.to_string())]);
    xml.empty_tag("a:ext", &[("cx", &cx.to_string()), ("cy", &cy.to_string())]);
    xml.close_tag("a:xfrm");
    xml.open_tag("a:prstGeom", &[("prst", "rect")]);
    xml.empty_tag("a:avLst", &[]);
    xml.close_tag("a:prstGeom");
    xml.close_tag("p:spPr");

    xml.open_tag("p:txBody", &[]);
    xml.open_tag("a:bodyPr", &[("wrap", "square")]);
    xml.empty_tag("a:normAutofit", &[]);
    xml.close_tag("a:bodyPr");
    xml.empty_tag("a:lstStyle", &[]);
    let mut run_props = vec![("lang", "en-US"), ("sz", size)];
    if bold {
        run_props.push(("b", "1"));
    }
    if lines.is_empty() {
        xml.empty_tag("a:p", &[]);
    }
    for line in lines {
        if line.is_empty() {
            xml.empty_tag("a:p", &[]);
            continue;
        }
        xml.open_tag("a:p", &[]);
        xml.open_tag("a:r", &[]);
        xml.empty_tag("a:rPr", &run_props);
        xml.text_element("a:t", line, &[]);
        xml.close_tag("a:r");
        xml.close_tag("a:p");
    }
    xml.close_tag("p:txBody");
    xml.close_tag("p:sp");
}

const SLIDE_MASTER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld>
    <p:spTree>
      <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
      <p:grpSpPr/>
    </p:spTree>
  </p:cSld>
  <p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
  <p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>
</p:sldMaster>
"#;

const SLIDE_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1">
  <p:cSld name="Blank">
    <p:spTree>
      <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
      <p:grpSpPr/>
    </p:spTree>
  </p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>
"#;

const THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">
  <a:themeElements>
    <a:clrScheme name="Office">
      <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
      <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
      <a:dk2><a:srgbClr val="1F497D"/></a:dk2>
      <a:lt2><a:srgbClr val="EEECE1"/></a:lt2>
      <a:accent1><a:srgbClr val="4F81BD"/></a:accent1>
      <a:accent2><a:srgbClr val="C0504D"/></a:accent2>
      <a:accent3><a:srgbClr val="9BBB59"/></a:accent3>
      <a:accent4><a:srgbClr val="8064A2"/></a:accent4>
      <a:accent5><a:srgbClr val="4BACC6"/></a:accent5>
      <a:accent6><a:srgbClr val="F79646"/></a:accent6>
      <a:hlink><a:srgbClr val="0000FF"/></a:hlink>
      <a:folHlink><a:srgbClr val="800080"/></a:folHlink>
    </a:clrScheme>
    <a:fontScheme name="Office">
      <a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>
      <a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>
    </a:fontScheme>
    <a:fmtScheme name="Office">
      <a:fillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:fillStyleLst>
      <a:lnStyleLst>
        <a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
      </a:lnStyleLst>
      <a:effectStyleLst>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
      </a:effectStyleLst>
      <a:bgFillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:bgFillStyleLst>
    </a:fmtScheme>
  </a:themeElements>
</a:theme>
"#;
