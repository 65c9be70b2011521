//! Small PDFs built in memory with lopdf, for tests and benches.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Page size used by fixtures (A4 in points).
pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

#[derive(Debug, Clone, Default)]
struct FixturePage {
    lines: Vec<String>,
    fill: Option<(f32, f32, f32)>,
    image: Option<(u32, u32)>,
}

/// Builder for a multi-page PDF.
///
/// Streams are left uncompressed so compression tools have something to do.
#[derive(Debug, Clone, Default)]
pub struct PdfFixture {
    pages: Vec<FixturePage>,
    title: Option<String>,
}

impl PdfFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// A page with one text line per entry.
    pub fn page(mut self, lines: &[&str]) -> Self {
        self.pages.push(FixturePage {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        });
        self
    }

    /// A page with text and a filled rectangle in the given RGB colour.
    pub fn colored_page(mut self, lines: &[&str], rgb: (f32, f32, f32)) -> Self {
        self.pages.push(FixturePage {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            fill: Some(rgb),
            ..Default::default()
        });
        self
    }

    /// A page holding a raw (unfiltered) RGB image of the given size.
    pub fn image_page(mut self, width: u32, height: u32) -> Self {
        self.pages.push(FixturePage {
            image: Some((width, height)),
            ..Default::default()
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = self.document();
        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("fixture PDF serializes");
        buf
    }

    /// The fixture as a lopdf document, before serialization.
    pub fn document(&self) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids = Vec::new();
        for page in &self.pages {
            let mut ops = Vec::new();
            let mut xobjects = lopdf::Dictionary::new();

            if let Some((r, g, b)) = page.fill {
                ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
                ops.push(Operation::new(
                    "re",
                    vec![50.into(), 50.into(), 200.into(), 100.into()],
                ));
                ops.push(Operation::new("f", vec![]));
            }

            if let Some((w, h)) = page.image {
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => w as i64,
                        "Height" => h as i64,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                    },
                    gradient_rgb(w, h),
                ));
                xobjects.set("Im1", image_id);
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        (w as f32).into(),
                        0.into(),
                        0.into(),
                        (h as f32).into(),
                        50.into(),
                        300.into(),
                    ],
                ));
                ops.push(Operation::new("Do", vec!["Im1".into()]));
                ops.push(Operation::new("Q", vec![]));
            }

            if !page.lines.is_empty() {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                ops.push(Operation::new("TL", vec![14.into()]));
                ops.push(Operation::new("Td", vec![72.into(), 770.into()]));
                for line in &page.lines {
                    ops.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
                    ops.push(Operation::new("T*", vec![]));
                }
                ops.push(Operation::new("ET", vec![]));
            }

            let content = Content { operations: ops };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("fixture content encodes"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                    "XObject" => xobjects,
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = &self.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title.as_str()),
            });
            doc.trailer.set("Info", info_id);
        }
        doc
    }
}

/// A PDF with `n` pages reading "Page 1", "Page 2", ...
pub fn numbered_pdf(n: usize) -> Vec<u8> {
    let labels: Vec<String> = (1..=n).map(|i| format!("Page {}", i)).collect();
    labels
        .iter()
        .fold(PdfFixture::new(), |fixture, label| fixture.page(&[label.as_str()]))
        .build()
}

/// Smooth RGB gradient with a little noise, so JPEG has realistic input.
fn gradient_rgb(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let noise = ((x * 7 + y * 13) % 5) as u8;
            data.push(((x * 255) / width.max(1)) as u8 ^ noise);
            data.push(((y * 255) / height.max(1)) as u8);
            data.push(128u8.wrapping_add(noise));
        }
    }
    data
}
