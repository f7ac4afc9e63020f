use shared_pdf::PdfError;
use shared_types::{FieldKind, Fingerprint, RecordError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InjectionError {
    #[error("Invalid viewport {width}x{height}: dimensions must be positive")]
    InvalidViewport { width: f64, height: f64 },

    #[error("Invalid field box ({x}, {y}, {width}x{height}): values must be finite and the size positive")]
    InvalidRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    #[error("Invalid font size {0}: must be finite and positive")]
    InvalidFontSize(f64),

    #[error("Character {0:?} cannot be drawn with a WinAnsi font")]
    UnsupportedCharacter(char),

    #[error("Original does not match its integrity record (expected {expected}, got {actual})")]
    OriginalMismatch {
        expected: Fingerprint,
        actual: Fingerprint,
    },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Page index {index} out of bounds (document has {page_count} pages)")]
    PageIndexOutOfBounds { index: u32, page_count: usize },

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("{kind} field has no content to draw")]
    IncompleteField { kind: FieldKind },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to update integrity record: {0}")]
    Record(#[from] RecordError),

    #[error(transparent)]
    Pdf(PdfError),
}

impl From<PdfError> for InjectionError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::InvalidViewport { width, height } => {
                InjectionError::InvalidViewport { width, height }
            }
            PdfError::PageIndexOutOfBounds { index, page_count } => {
                InjectionError::PageIndexOutOfBounds { index, page_count }
            }
            PdfError::InvalidRect {
                x,
                y,
                width,
                height,
            } => InjectionError::InvalidRect {
                x,
                y,
                width,
                height,
            },
            PdfError::UnencodableCharacter(c) => InjectionError::UnsupportedCharacter(c),
            other => InjectionError::Pdf(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, InjectionError>;
