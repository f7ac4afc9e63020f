use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),

    #[error("Page index {index} out of bounds (document has {page_count} pages)")]
    PageIndexOutOfBounds { index: u32, page_count: usize },

    #[error("Failed to encode stream: {0}")]
    Encode(String),

    #[error("Malformed PDF object: {0}")]
    Malformed(String),

    #[error("Invalid viewport {width}x{height}: dimensions must be positive")]
    InvalidViewport { width: f64, height: f64 },

    #[error("Invalid page size {width}x{height}: dimensions must be positive")]
    InvalidPageSize { width: f64, height: f64 },

    #[error("Invalid field box ({x}, {y}, {width}x{height}): values must be finite and the size positive")]
    InvalidRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    #[error("Character {0:?} cannot be encoded in WinAnsiEncoding")]
    UnencodableCharacter(char),
}
