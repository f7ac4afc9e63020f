//! Shared types for field injection and integrity records
//!
//! Geometry, field definitions and the integrity record used by
//! `shared-pdf` and `docsign-core`.

pub mod audit;
pub mod field;
pub mod types;

pub use audit::{
    finish_fingerprint, hash_document, DocumentStatus, FieldSummary, Fingerprint,
    IntegrityRecord, RecordError,
};
pub use field::{Field, FieldContent, FieldKind, PayloadError, RasterFormat, RasterPayload};
pub use types::{CaptureRect, NormalizedRect, PageRect, PageSize, ViewportSize};
