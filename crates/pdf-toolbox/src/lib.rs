//! The PDF toolbox: every tool behind one registry, plus configuration
//! loading shared by the command-line front end.

pub mod config;

use serde::Serialize;

use toolbox_core::options::ToolOptions;
use toolbox_core::tool::{Tool, ToolKind};
use toolbox_core::wizard::Wizard;

pub use toolbox_core::*;

/// The tool implementing `kind`.
pub fn tool_for(kind: ToolKind) -> Box<dyn Tool> {
    match kind {
        ToolKind::Compress => Box::new(tool_compress::CompressTool),
        ToolKind::Merge => Box::new(tool_merge::MergeTool),
        ToolKind::Grayscale => Box::new(tool_grayscale::GrayscaleTool),
        ToolKind::Repair => Box::new(tool_repair::RepairTool),
        ToolKind::PdfToZip => Box::new(tool_pdf_zip::PdfZipTool),
        ToolKind::TxtToPdf => Box::new(tool_txt_to_pdf::TxtToPdfTool),
        ToolKind::PdfToTxt => Box::new(tool_pdf_to_txt::PdfToTxtTool),
        ToolKind::PdfToDocx => Box::new(tool_pdf_to_docx::PdfToDocxTool),
        ToolKind::DocxToPdf => Box::new(tool_docx_to_pdf::DocxToPdfTool),
        ToolKind::PdfToPptx => Box::new(tool_pdf_to_pptx::PdfToPptxTool),
        ToolKind::PptxToPdf => Box::new(tool_pptx_to_pdf::PptxToPdfTool),
        ToolKind::ImageToPdf => Box::new(tool_image_to_pdf::ImageToPdfTool),
        ToolKind::PdfToImage => Box::new(tool_pdf_to_image::PdfToImageTool),
    }
}

pub fn all_tools() -> Vec<Box<dyn Tool>> {
    ToolKind::ALL.iter().map(|k| tool_for(*k)).collect()
}

/// A fresh wizard for `kind` whose options start from `defaults`.
pub fn wizard_for(kind: ToolKind, defaults: ToolOptions) -> Wizard {
    Wizard::with_defaults(tool_for(kind), defaults)
}

/// What `list` shows for a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub slug: String,
    pub name: String,
    pub accepts: Vec<String>,
    pub min_files: usize,
    pub max_files: Option<usize>,
    pub options: Vec<String>,
}

impl ToolInfo {
    pub fn of(tool: &dyn Tool) -> Self {
        let (min_files, max_files) = tool.file_count();
        Self {
            slug: tool.kind().slug().to_string(),
            name: tool.name().to_string(),
            accepts: tool
                .accepts()
                .iter()
                .map(|f| f.extension().to_string())
                .collect(),
            min_files,
            max_files,
            options: tool.option_keys().iter().map(|k| k.name().to_string()).collect(),
        }
    }
}
