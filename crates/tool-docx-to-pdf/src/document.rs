//! Turn `word/document.xml` into a flat list of renderable blocks.
//!
//! Handles Word Open XML elements:
//! - `w:p` (paragraphs) → headings, list items or body paragraphs
//! - `w:t` (text), `w:tab`, `w:br` (line and page breaks)
//! - `w:tbl` (tables) → one block per row
//! - `a:blip` (images) → image blocks, resolved through the relationships

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::styles::{self, attr, val_attr, NumberingInfo, StyleInfo};

/// A renderable piece of the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem { marker: String, text: String, depth: usize },
    TableRow(Vec<String>),
    /// Image part path relative to `word/`.
    Image(String),
    PageBreak,
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
                        if !id.is_empty() && !target.is_empty() {
                            rels.insert(id, target);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    rels
}

/// Convert the main document XML into blocks, in reading order.
pub fn parse_document(
    xml: &str,
    rels: &HashMap<String, String>,
    styles: &HashMap<String, StyleInfo>,
    numbering: &HashMap<String, NumberingInfo>,
) -> Vec<Block> {
    let mut reader = Reader::from_str(xml);
    let mut state = ParseState::new(rels, styles, numbering);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => state.handle_start(e),
            Ok(Event::Empty(ref e)) => state.handle_empty(e),
            Ok(Event::Text(ref e)) => {
                if state.in_text {
                    if let Ok(text) = e.unescape() {
                        state.para_text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => state.handle_end(e.local_name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("document.xml is malformed after {} block(s): {}", state.blocks.len(), e);
                break;
            }
            _ => {}
        }
    }

    state.blocks
}

struct ParseState<'a> {
    rels: &'a HashMap<String, String>,
    styles: &'a HashMap<String, StyleInfo>,
    numbering: &'a HashMap<String, NumberingInfo>,

    blocks: Vec<Block>,

    // Current paragraph
    in_text: bool,
    para_text: String,
    para_style_id: String,
    para_num_id: String,
    para_level: usize,
    para_images: Vec<String>,

    // Tables; nested tables flow into the enclosing cell
    table_depth: usize,
    row: Vec<String>,
    cell: String,

    // Running counters of ordered lists, per numId and level
    counters: HashMap<String, Vec<usize>>,
}

impl<'a> ParseState<'a> {
    fn new(
        rels: &'a HashMap<String, String>,
        styles: &'a HashMap<String, StyleInfo>,
        numbering: &'a HashMap<String, NumberingInfo>,
    ) -> Self {
        Self {
            rels,
            styles,
            numbering,
            blocks: Vec::new(),
            in_text: false,
            para_text: String::new(),
            para_style_id: String::new(),
            para_num_id: String::new(),
            para_level: 0,
            para_images: Vec::new(),
            table_depth: 0,
            row: Vec::new(),
            cell: String::new(),
            counters: HashMap::new(),
        }
    }

    fn handle_start(&mut self, e: &BytesStart<'_>) {
        match e.local_name().as_ref() {
            b"p" => {
                self.para_text.clear();
                self.para_style_id.clear();
                self.para_num_id.clear();
                self.para_level = 0;
                self.para_images.clear();
            }
            b"t" => self.in_text = true,
            b"tbl" => self.table_depth += 1,
            b"tr" if self.table_depth == 1 => self.row.clear(),
            b"tc" if self.table_depth == 1 => self.cell.clear(),
            _ => self.handle_property(e),
        }
    }

    fn handle_empty(&mut self, e: &BytesStart<'_>) {
        match e.local_name().as_ref() {
            b"tab" => self.para_text.push_str("    "),
            b"br" => {
                if attr(e, "type").as_deref() == Some("page") && self.table_depth == 0 {
                    self.flush_paragraph();
                    self.blocks.push(Block::PageBreak);
                } else {
                    self.para_text.push(' ');
                }
            }
            _ => self.handle_property(e),
        }
    }

    /// Elements that may appear either empty or with children.
    fn handle_property(&mut self, e: &BytesStart<'_>) {
        match e.local_name().as_ref() {
            b"pStyle" => self.para_style_id = val_attr(e).unwrap_or_default(),
            b"numId" => self.para_num_id = val_attr(e).unwrap_or_default(),
            b"ilvl" => self.para_level = val_attr(e).and_then(|v| v.parse().ok()).unwrap_or(0),
            b"blip" => {
                let rels = self.rels;
                if let Some(target) = attr(e, "embed").and_then(|rid| rels.get(&rid)) {
                    self.para_images.push(target.clone());
                }
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, local: &[u8]) {
        match local {
            b"t" => self.in_text = false,
            b"p" => self.flush_paragraph(),
            b"tc" if self.table_depth == 1 => {
                self.row.push(self.cell.trim().to_string());
                self.cell.clear();
            }
            b"tr" if self.table_depth == 1 => {
                let row = std::mem::take(&mut self.row);
                if row.iter().any(|c| !c.is_empty()) {
                    self.blocks.push(Block::TableRow(row));
                }
            }
            b"tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            _ => {}
        }
    }

    fn flush_paragraph(&mut self) {
        let text = std::mem::take(&mut self.para_text).trim().to_string();

        if self.table_depth > 0 {
            if !text.is_empty() {
                if !self.cell.is_empty() {
                    self.cell.push(' ');
                }
                self.cell.push_str(&text);
            }
            self.para_images.clear();
            return;
        }

        let heading = if self.para_style_id.is_empty() {
            None
        } else {
            styles::heading_level(&self.para_style_id, self.styles)
        };
        let is_list = !self.para_num_id.is_empty() && self.para_num_id != "0";

        if let Some(level) = heading {
            if !text.is_empty() {
                self.blocks.push(Block::Heading { level, text });
            }
        } else if is_list && !text.is_empty() {
            let marker = self.list_marker();
            self.blocks.push(Block::ListItem {
                marker,
                text,
                depth: self.para_level,
            });
        } else if !text.is_empty() {
            self.blocks.push(Block::Paragraph(text));
        }

        for image in self.para_images.drain(..) {
            self.blocks.push(Block::Image(image));
        }
    }

    fn list_marker(&mut self) -> String {
        let level = self.para_level;
        let bullet = self
            .numbering
            .get(&self.para_num_id)
            .map_or(true, |info| info.is_bullet(level));

        let counters = self.counters.entry(self.para_num_id.clone()).or_default();
        // A shallower item restarts the numbering of deeper levels
        counters.resize(level + 1, 0);
        counters[level] += 1;

        if bullet {
            "-".to_string()
        } else {
            format!("{}.", counters[level])
        }
    }
}
