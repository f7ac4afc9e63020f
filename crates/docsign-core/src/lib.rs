//! Field injection core
//!
//! Places captured fields (signatures, text, dates, images, choice markers)
//! onto pages of an existing PDF, flattening them into the page content, and
//! keeps a fingerprint-based integrity record of what was signed.
//!
//! ```no_run
//! use docsign_core::{InjectionConfig, Pipeline};
//! use shared_types::{CaptureRect, Field, ViewportSize};
//!
//! # fn run(original: Vec<u8>) -> Result<(), docsign_core::InjectionError> {
//! let pipeline = Pipeline::new(InjectionConfig::default())?;
//! let record = pipeline.register(&original);
//! let fields = vec![Field::Text {
//!     rect: CaptureRect::new(100.0, 900.0, 200.0, 60.0, 0),
//!     text: Some("Jane Doe".into()),
//!     font_size: None,
//! }];
//! let signed = pipeline.sign(record, &original, &fields, ViewportSize::new(800.0, 1100.0))?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod dates;
pub mod error;
pub mod injector;
pub mod ledger;
pub mod pipeline;
pub mod raster;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::InjectionConfig;
pub use error::InjectionError;
pub use injector::{fit_image, ChoiceMarker, FieldInjector};
pub use ledger::{AuditReport, IntegrityLedger, Verification};
pub use pipeline::{InjectionOutcome, Pipeline, SignedDocument, SkipReason, SkippedField};

// Re-export the shared crates' public surface
pub use shared_pdf::{denormalize, normalize, to_capture_space, to_page_space, PdfDocument, PdfError};
pub use shared_types::{
    CaptureRect, DocumentStatus, Field, FieldKind, FieldSummary, Fingerprint, IntegrityRecord,
    NormalizedRect, PageRect, PageSize, RasterFormat, RasterPayload, ViewportSize,
};
