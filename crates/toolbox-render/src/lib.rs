//! Text and image PDF writer shared by the tools that produce PDFs.
//!
//! Uses printpdf 0.8 with builtin Helvetica fonts and Op-based page
//! construction. Text is word-wrapped to the usable width of the page;
//! images are embedded as XObjects scaled to fit.

use printpdf::*;

use toolbox_core::error::{Result, ToolError};
use toolbox_core::options::ToolOptions;

/// Approximate mm per pt.
pub const MM_PER_PT: f32 = 0.353;

/// Assumed pixel density of embedded images.
const IMAGE_DPI: f32 = 96.0;
const MM_PER_PX: f32 = 25.4 / IMAGE_DPI;

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;

/// Page geometry and base typography.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    pub font_size: f32,
    pub line_height: f32,
}

impl PageSetup {
    pub fn from_options(options: &ToolOptions) -> Self {
        let (width_mm, height_mm) = options.page_size.dimensions_mm();
        // Margins can never consume the whole page
        let margin_mm = options
            .margin_mm
            .min(width_mm.min(height_mm) / 2.0 - 10.0)
            .max(0.0);
        Self {
            width_mm,
            height_mm,
            margin_mm,
            font_size: options.font_size,
            line_height: options.line_height,
        }
    }

    pub fn usable_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn usable_height(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm
    }

    /// How many average glyphs fit on one line at `font_size`.
    pub fn chars_per_line(&self, font_size: f32) -> usize {
        ((self.usable_width() / (font_size * AVG_GLYPH_EM * MM_PER_PT)) as usize).max(1)
    }

    fn line_advance(&self, font_size: f32) -> f32 {
        font_size * self.line_height * MM_PER_PT
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::from_options(&ToolOptions::default())
    }
}

/// A finished PDF plus layout statistics.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub lines: usize,
}

/// Accumulates pages of text and images.
pub struct PdfWriter {
    doc: PdfDocument,
    setup: PageSetup,
    pages: Vec<PdfPage>,
    current_ops: Vec<Op>,
    y_pos: f32, // mm from bottom
    in_text: bool,
    dirty: bool,
    lines: usize,
}

impl PdfWriter {
    pub fn new(title: &str, setup: PageSetup) -> Self {
        let mut writer = PdfWriter {
            doc: PdfDocument::new(title),
            setup,
            pages: Vec::new(),
            current_ops: Vec::new(),
            y_pos: setup.height_mm - setup.margin_mm,
            in_text: false,
            dirty: false,
            lines: 0,
        };
        writer.start_text();
        writer
    }

    pub fn setup(&self) -> &PageSetup {
        &self.setup
    }

    /// Lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    fn start_text(&mut self) {
        if !self.in_text {
            self.current_ops.push(Op::StartTextSection);
            self.in_text = true;
        }
    }

    fn end_text(&mut self) {
        if self.in_text {
            self.current_ops.push(Op::EndTextSection);
            self.in_text = false;
        }
    }

    /// Close the current page and start a new one.
    pub fn page_break(&mut self) {
        self.end_text();
        let ops = std::mem::take(&mut self.current_ops);
        self.pages.push(PdfPage::new(
            Mm(self.setup.width_mm),
            Mm(self.setup.height_mm),
            ops,
        ));
        self.y_pos = self.setup.height_mm - self.setup.margin_mm;
        self.dirty = false;
        self.start_text();
    }

    fn page_is_blank(&self) -> bool {
        self.y_pos >= self.setup.height_mm - self.setup.margin_mm
    }

    fn ensure_space(&mut self, needed_mm: f32) {
        if self.y_pos - needed_mm < self.setup.margin_mm && !self.page_is_blank() {
            self.page_break();
        }
    }

    /// Vertical gap in mm; never carries over to the next page.
    pub fn skip(&mut self, mm: f32) {
        self.y_pos = (self.y_pos - mm).max(self.setup.margin_mm);
    }

    /// An empty line at body size.
    pub fn blank_line(&mut self) {
        let advance = self.setup.line_advance(self.setup.font_size);
        self.ensure_space(advance);
        self.y_pos -= advance;
        self.dirty = true;
    }

    /// Write a single unwrapped line.
    pub fn write_line(&mut self, text: &str, font_size: f32, font: BuiltinFont) {
        let line_h = self.setup.line_advance(font_size);
        self.ensure_space(line_h);
        // Baseline sits one font-size below the line top
        let baseline = self.y_pos - font_size * MM_PER_PT;

        self.current_ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(font_size),
            font,
        });
        self.current_ops.push(Op::SetTextCursor {
            pos: Point {
                x: Mm(self.setup.margin_mm).into(),
                y: Mm(baseline).into(),
            },
        });
        self.current_ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(sanitize_builtin(text))],
            font,
        });

        self.y_pos -= line_h;
        self.dirty = true;
        self.lines += 1;
    }

    /// Word-wrap `text` to the usable width and write it.
    pub fn write_wrapped(&mut self, text: &str, font_size: f32, font: BuiltinFont) {
        for line in wrap(text, self.setup.chars_per_line(font_size)) {
            self.write_line(&line, font_size, font);
        }
    }

    /// A body-text paragraph followed by a small gap.
    pub fn paragraph(&mut self, text: &str) {
        if text.trim().is_empty() {
            self.blank_line();
            return;
        }
        self.write_wrapped(text, self.setup.font_size, BuiltinFont::Helvetica);
        self.skip(self.setup.font_size * MM_PER_PT * 0.5);
    }

    /// A bold heading sized relative to the body font.
    pub fn heading(&mut self, text: &str, level: u8) {
        let factor = match level {
            1 => 1.8,
            2 => 1.5,
            _ => 1.25,
        };
        let size = self.setup.font_size * factor;
        // Keep a heading together with at least one body line
        self.ensure_space(
            self.setup.line_advance(size) + self.setup.line_advance(self.setup.font_size),
        );
        self.skip(size * MM_PER_PT * 0.5);
        self.write_wrapped(text, size, BuiltinFont::HelveticaBold);
        self.skip(2.0);
    }

    /// A list item with a hanging marker such as `-` or `3.`.
    pub fn list_item(&mut self, marker: &str, text: &str, depth: usize) {
        let indent = "    ".repeat(depth);
        let hang = " ".repeat(marker.chars().count() + 1);
        let size = self.setup.font_size;
        let width = self
            .setup
            .chars_per_line(size)
            .saturating_sub(indent.len() + hang.len());
        for (i, line) in wrap(text, width).iter().enumerate() {
            let lead = if i == 0 {
                format!("{} ", marker)
            } else {
                hang.clone()
            };
            self.write_line(&format!("{}{}{}", indent, lead, line), size, BuiltinFont::Helvetica);
        }
    }

    /// Embed an image inline, scaled down to fit the usable area.
    pub fn add_image(&mut self, data: &[u8]) -> Result<()> {
        let (image_id, w, h) = self.decode_image(data)?;

        let img_w_mm = w as f32 * MM_PER_PX;
        let img_h_mm = h as f32 * MM_PER_PX;
        let scale = (self.setup.usable_width() / img_w_mm)
            .min(self.setup.usable_height() / img_h_mm)
            .min(1.0);
        let final_h = img_h_mm * scale;

        self.ensure_space(final_h);
        self.end_text(); // images go outside text sections
        self.current_ops.push(Op::UseXobject {
            id: image_id,
            transform: XObjectTransform {
                translate_x: Some(Mm(self.setup.margin_mm).into()),
                translate_y: Some(Mm(self.y_pos - final_h).into()),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        });
        self.y_pos -= final_h + 5.0;
        self.dirty = true;
        self.start_text();
        Ok(())
    }

    /// Put an image alone on its own page, scaled to fit and centred.
    pub fn image_page(&mut self, data: &[u8]) -> Result<()> {
        let (image_id, w, h) = self.decode_image(data)?;
        if self.dirty {
            self.page_break();
        }

        let img_w_mm = w as f32 * MM_PER_PX;
        let img_h_mm = h as f32 * MM_PER_PX;
        let scale = (self.setup.usable_width() / img_w_mm).min(self.setup.usable_height() / img_h_mm);
        let (final_w, final_h) = (img_w_mm * scale, img_h_mm * scale);
        let x = self.setup.margin_mm + (self.setup.usable_width() - final_w) / 2.0;
        let y = self.setup.margin_mm + (self.setup.usable_height() - final_h) / 2.0;

        self.end_text();
        self.current_ops.push(Op::UseXobject {
            id: image_id,
            transform: XObjectTransform {
                translate_x: Some(Mm(x).into()),
                translate_y: Some(Mm(y).into()),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        });
        self.dirty = true;
        self.page_break();
        Ok(())
    }

    fn decode_image(&mut self, data: &[u8]) -> Result<(XObjectId, usize, usize)> {
        let mut warnings = Vec::new();
        let image = RawImage::decode_from_bytes(data, &mut warnings)
            .map_err(|e| ToolError::Image(format!("Image decode: {}", e)))?;
        if image.width == 0 || image.height == 0 {
            return Err(ToolError::Image("image has no pixels".to_string()));
        }
        let (w, h) = (image.width, image.height);
        Ok((self.doc.add_image(&image), w, h))
    }

    /// Serialize every page.
    pub fn finish(mut self) -> RenderedPdf {
        self.end_text();
        let ops = std::mem::take(&mut self.current_ops);
        if self.dirty || self.pages.is_empty() {
            self.pages.push(PdfPage::new(
                Mm(self.setup.width_mm),
                Mm(self.setup.height_mm),
                ops,
            ));
        }
        let pages = self.pages.len();
        let mut warnings = Vec::new();
        let bytes = self
            .doc
            .with_pages(self.pages)
            .save(&PdfSaveOptions::default(), &mut warnings);
        log::debug!("Rendered {} page(s), {} line(s)", pages, self.lines);
        RenderedPdf {
            bytes,
            pages,
            lines: self.lines,
        }
    }
}

/// Greedy word wrap at `width` characters. Words longer than a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let split = word
                .char_indices()
                .nth(width)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }
        if !line.is_empty() && line.chars().count() + word.chars().count() + 1 > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Map text onto what the builtin (WinAnsi) fonts can show.
pub fn sanitize_builtin(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            '\u{2018}' | '\u{2019}' => Some('\''),
            '\u{201C}' | '\u{201D}' => Some('"'),
            '\u{2013}' | '\u{2014}' => Some('-'),
            '\u{2022}' => Some('*'),
            '\u{00A0}' => Some(' '),
            c if (c as u32) < 0x100 => Some(c),
            _ => Some('?'),
        })
        .collect()
}
