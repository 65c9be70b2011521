//! PowerPoint to PDF: one landscape page per slide.
//!
//! Slides follow the order of `ppt/presentation.xml`. Each page shows the
//! slide's heading, its remaining text and any embedded raster pictures.

pub mod slides;

use toolbox_core::artifact::ResultArtifact;
use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::progress::ProgressSink;
use toolbox_core::source::{Format, SourceFile};
use toolbox_core::tool::{Tool, ToolKind};
use toolbox_render::{PageSetup, PdfWriter, RenderedPdf};
use toolbox_utils::archive;

pub use slides::SlideContent;

pub struct PptxToPdfTool;

impl Tool for PptxToPdfTool {
    fn name(&self) -> &str {
        "PowerPoint to PDF"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::PptxToPdf
    }

    fn accepts(&self) -> &[Format] {
        &[Format::Pptx]
    }

    fn option_keys(&self) -> &[OptionKey] {
        &[
            OptionKey::FontSize,
            OptionKey::PageSize,
            OptionKey::Margin,
            OptionKey::LineHeight,
            OptionKey::OutputName,
        ]
    }

    fn process(
        &self,
        files: &[SourceFile],
        options: &ToolOptions,
        progress: &ProgressSink<'_>,
    ) -> Result<ResultArtifact> {
        let source = &files[0];
        progress.indeterminate("Reading presentation");
        let deck = Deck::parse(&source.bytes)?;
        log::info!("Parsed PPTX {}: {} slide(s)", source.name, deck.slides.len());

        let mut setup = PageSetup::from_options(options);
        if setup.height_mm > setup.width_mm {
            std::mem::swap(&mut setup.width_mm, &mut setup.height_mm);
        }
        let rendered = render_deck(source.stem(), &deck, setup, progress);
        let name = options.file_name_or(&format!("{}.pdf", source.stem()));
        Ok(ResultArtifact::new(name, Format::Pdf, rendered.bytes))
    }
}

/// A parsed slide with its picture bytes.
pub struct DeckSlide {
    pub content: SlideContent,
    pub pictures: Vec<Vec<u8>>,
}

pub struct Deck {
    pub slides: Vec<DeckSlide>,
}

impl Deck {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let entries = archive::list_entries(bytes)
            .map_err(|e| ToolError::Pptx(format!("Not a PPTX package: {}", e)))?;

        let mut slide_parts = Vec::new();
        if let Ok(presentation) = archive::read_entry_string(bytes, "ppt/presentation.xml") {
            let rels = archive::read_entry_string(bytes, "ppt/_rels/presentation.xml.rels")
                .map(|xml| slides::parse_relationships(&xml))
                .unwrap_or_default();
            for rid in slides::slide_ids(&presentation) {
                match rels.get(&rid) {
                    Some(target) => slide_parts.push(archive::resolve_target("ppt", target)),
                    None => log::warn!("Slide relationship {} has no target", rid),
                }
            }
        }
        if slide_parts.is_empty() {
            slide_parts = slides::slides_by_name(&entries);
        }
        if slide_parts.is_empty() {
            return Err(ToolError::Pptx("Presentation contains no slides".to_string()));
        }

        let mut deck = Vec::with_capacity(slide_parts.len());
        for part in &slide_parts {
            let xml = archive::read_entry_string(bytes, part)
                .map_err(|e| ToolError::Pptx(format!("{}: {}", part, e)))?;
            let content = slides::parse_slide(&xml);
            let pictures = slide_pictures(bytes, part, &content.images);
            deck.push(DeckSlide { content, pictures });
        }
        Ok(Self { slides: deck })
    }
}

/// Bytes of the pictures a slide embeds, resolved through its own
/// relationships part. Missing pictures are skipped.
fn slide_pictures(bytes: &[u8], slide_part: &str, rids: &[String]) -> Vec<Vec<u8>> {
    if rids.is_empty() {
        return Vec::new();
    }
    let (dir, file) = slide_part.rsplit_once('/').unwrap_or(("", slide_part));
    let rels = archive::read_entry_string(bytes, &format!("{}/_rels/{}.rels", dir, file))
        .map(|xml| slides::parse_relationships(&xml))
        .unwrap_or_default();

    rids.iter()
        .filter_map(|rid| {
            let path = archive::resolve_target(dir, rels.get(rid)?);
            match archive::read_entry(bytes, &path) {
                Ok(data) => Some(data),
                Err(e) => {
                    log::warn!("Picture {}: {}", path, e);
                    None
                }
            }
        })
        .collect()
}

/// Lay out one page per slide, reporting one unit per slide.
pub fn render_deck(
    title: &str,
    deck: &Deck,
    setup: PageSetup,
    progress: &ProgressSink<'_>,
) -> RenderedPdf {
    let mut writer = PdfWriter::new(title, setup);
    progress.begin(deck.slides.len(), "Rendering slides");

    for (i, slide) in deck.slides.iter().enumerate() {
        if i > 0 {
            writer.page_break();
        }
        let (heading, body) = slide.content.heading_and_body();
        let heading = heading.unwrap_or_else(|| format!("Slide {}", i + 1));
        writer.heading(&heading, 1);
        for paragraph in body {
            writer.paragraph(paragraph);
        }
        for picture in &slide.pictures {
            if let Err(e) = writer.add_image(picture) {
                log::warn!("Slide {}: skipping picture: {}", i + 1, e);
            }
        }
        progress.advance(&format!("Slide {}", i + 1));
    }

    writer.finish()
}
