//! Shared PDF handling utilities
//!
//! This crate provides document loading, page geometry, coordinate
//! transformation and the low-level drawing primitives used to flatten
//! fields onto a page.

pub mod content;
pub mod coords;
pub mod error;
pub mod parser;

pub use coords::{denormalize, normalize, to_capture_space, to_page_space};
pub use error::PdfError;
pub use parser::{MediaBox, PdfDocument};
