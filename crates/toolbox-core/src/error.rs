use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("DOCX error: {0}")]
    Docx(String),

    #[error("PPTX error: {0}")]
    Pptx(String),

    #[error("ZIP error: {0}")]
    Zip(String),

    #[error("Image processing error: {0}")]
    Image(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("{message} ({} issue(s) found)", items.len())]
    Diagnostics { message: String, items: Vec<String> },

    #[error("No extractable text found in {0}")]
    NoText(String),

    #[error("Required external program not available: {0}")]
    MissingTool(String),

    #[error("A file is still being processed")]
    Busy,

    #[error("Invalid wizard state: {0}")]
    InvalidState(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("{0}")]
    Other(String),
}

impl ToolError {
    /// Itemized diagnostics attached to this error, if any.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            ToolError::Diagnostics { items, .. } => items,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;
