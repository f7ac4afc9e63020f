//! Interactive fields placed on a document and the content captured for them

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::CaptureRect;

/// PNG magic bytes: 89 50 4E 47 0D 0A 1A 0A
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
/// JPEG start-of-image marker
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("Data URL is missing the ';base64,' marker")]
    NotBase64,

    #[error("Invalid base64 payload: {0}")]
    Decode(String),
}

/// Raster encoding of a signature or image payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    Png,
    Jpeg,
    /// Any other media type, kept so injection can reject it precisely
    Other(String),
}

impl RasterFormat {
    /// Map a MIME type such as `image/png` to a format
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => RasterFormat::Png,
            "image/jpeg" | "image/jpg" => RasterFormat::Jpeg,
            other => RasterFormat::Other(other.to_string()),
        }
    }

    /// Detect PNG or JPEG from leading magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&PNG_MAGIC) {
            Some(RasterFormat::Png)
        } else if bytes.starts_with(&JPEG_MAGIC) {
            Some(RasterFormat::Jpeg)
        } else {
            None
        }
    }

    pub fn mime(&self) -> &str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Other(mime) => mime,
        }
    }
}

/// Encoded raster bytes plus their declared format.
///
/// Serialized as a `data:<mime>;base64,<payload>` URL, which is how capture
/// surfaces hand drawn signatures and uploaded images over.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RasterPayload {
    pub format: RasterFormat,
    pub bytes: Vec<u8>,
}

impl RasterPayload {
    pub fn new(format: RasterFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    /// Parse a data URL (`data:image/png;base64,...`).
    ///
    /// A bare base64 string without the `data:` prefix is accepted too; its
    /// format is sniffed from the decoded bytes.
    pub fn from_data_url(url: &str) -> Result<Self, PayloadError> {
        let url = url.trim();
        let Some(rest) = url.strip_prefix("data:") else {
            let bytes = B64
                .decode(url.as_bytes())
                .map_err(|e| PayloadError::Decode(e.to_string()))?;
            let format = RasterFormat::sniff(&bytes)
                .unwrap_or_else(|| RasterFormat::Other("application/octet-stream".to_string()));
            return Ok(Self { format, bytes });
        };

        let (mime, data) = rest.split_once(";base64,").ok_or(PayloadError::NotBase64)?;
        let bytes = B64
            .decode(data.as_bytes())
            .map_err(|e| PayloadError::Decode(e.to_string()))?;

        Ok(Self {
            format: RasterFormat::from_mime(mime),
            bytes,
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime(), B64.encode(&self.bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for RasterPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterPayload")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl TryFrom<String> for RasterPayload {
    type Error = PayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_data_url(&value)
    }
}

impl From<RasterPayload> for String {
    fn from(value: RasterPayload) -> Self {
        value.to_data_url()
    }
}

/// Discriminant of [`Field`], kept in integrity records instead of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Signature,
    Text,
    Date,
    Image,
    #[serde(alias = "radio")]
    Choice,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Signature => "signature",
            FieldKind::Text => "text",
            FieldKind::Date => "date",
            FieldKind::Image => "image",
            FieldKind::Choice => "choice",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field placed on the capture surface, with whatever content was captured for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Field {
    Signature {
        #[serde(alias = "coordinates")]
        rect: CaptureRect,
        #[serde(default, alias = "imageBase64")]
        image: Option<RasterPayload>,
    },
    Image {
        #[serde(alias = "coordinates")]
        rect: CaptureRect,
        #[serde(default, alias = "imageBase64")]
        image: Option<RasterPayload>,
    },
    Text {
        #[serde(alias = "coordinates")]
        rect: CaptureRect,
        #[serde(default)]
        text: Option<String>,
        #[serde(default, alias = "fontSize")]
        font_size: Option<f64>,
    },
    /// Date content arrives pre-formatted; it is drawn like text
    Date {
        #[serde(alias = "coordinates")]
        rect: CaptureRect,
        #[serde(default)]
        date: Option<String>,
        #[serde(default, alias = "fontSize")]
        font_size: Option<f64>,
    },
    #[serde(alias = "radio")]
    Choice {
        #[serde(alias = "coordinates")]
        rect: CaptureRect,
        #[serde(default)]
        selected: bool,
    },
}

/// Borrowed view of the content a complete field carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldContent<'a> {
    Raster(&'a RasterPayload),
    Text(&'a str),
    Choice(bool),
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Signature { .. } => FieldKind::Signature,
            Field::Image { .. } => FieldKind::Image,
            Field::Text { .. } => FieldKind::Text,
            Field::Date { .. } => FieldKind::Date,
            Field::Choice { .. } => FieldKind::Choice,
        }
    }

    pub fn rect(&self) -> &CaptureRect {
        match self {
            Field::Signature { rect, .. }
            | Field::Image { rect, .. }
            | Field::Text { rect, .. }
            | Field::Date { rect, .. }
            | Field::Choice { rect, .. } => rect,
        }
    }

    pub fn page_index(&self) -> u32 {
        self.rect().page_index
    }

    /// Per-field font size override for text-like fields
    pub fn font_size(&self) -> Option<f64> {
        match self {
            Field::Text { font_size, .. } | Field::Date { font_size, .. } => *font_size,
            _ => None,
        }
    }

    /// The content required by this field's kind, or `None` when it is incomplete.
    ///
    /// Empty payloads and empty strings count as absent. Choice fields are
    /// always complete: an unselected marker is still drawn.
    pub fn content(&self) -> Option<FieldContent<'_>> {
        match self {
            Field::Signature { image, .. } | Field::Image { image, .. } => image
                .as_ref()
                .filter(|payload| !payload.is_empty())
                .map(FieldContent::Raster),
            Field::Text { text: value, .. } | Field::Date { date: value, .. } => value
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(FieldContent::Text),
            Field::Choice { selected, .. } => Some(FieldContent::Choice(*selected)),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.content().is_some()
    }
}
