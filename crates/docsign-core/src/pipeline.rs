//! Injection Pipeline: applies an ordered list of fields to one document
//!
//! Each field turns the current revision into a new one, so later fields
//! are drawn over earlier ones. Any failure aborts the whole run and no
//! partial revision is returned.

use serde::Serialize;
use shared_pdf::PdfDocument;
use shared_types::{Field, FieldKind, FieldSummary, IntegrityRecord, ViewportSize};
use tracing::{info, info_span, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::InjectionConfig;
use crate::error::{InjectionError, Result};
use crate::injector::FieldInjector;
use crate::ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The field lacks the content its kind requires
    IncompleteContent,
}

/// A field that was left out of the output, by its position in the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedField {
    pub position: usize,
    pub kind: FieldKind,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct InjectionOutcome {
    /// Final revision; equal to the original when nothing was applied
    pub bytes: Vec<u8>,
    pub applied: Vec<FieldSummary>,
    pub skipped: Vec<SkippedField>,
}

/// Result of signing: the final revision and its integrity record
#[derive(Debug, Clone)]
pub struct SignedDocument {
    pub bytes: Vec<u8>,
    pub record: IntegrityRecord,
    pub skipped: Vec<SkippedField>,
}

pub struct Pipeline<C: Clock = SystemClock> {
    injector: FieldInjector,
    clock: C,
}

impl Pipeline<SystemClock> {
    pub fn new(config: InjectionConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Pipeline<C> {
    pub fn with_clock(config: InjectionConfig, clock: C) -> Result<Self> {
        Ok(Self {
            injector: FieldInjector::new(config)?,
            clock,
        })
    }

    pub fn injector(&self) -> &FieldInjector {
        &self.injector
    }

    /// Apply every complete field in order, skipping incomplete ones.
    ///
    /// `original` is only read. Fails with `EmptyDocument` before touching any
    /// field when the document has no pages.
    pub fn process_all(
        &self,
        original: &[u8],
        fields: &[Field],
        viewport: ViewportSize,
    ) -> Result<InjectionOutcome> {
        let span = info_span!("inject_fields", fields = fields.len(), bytes = original.len());
        let _enter = span.enter();

        let page_count = PdfDocument::from_bytes(original)?.page_count();
        if page_count == 0 {
            return Err(InjectionError::EmptyDocument);
        }
        if !viewport.is_valid() {
            return Err(InjectionError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let mut revision: Option<Vec<u8>> = None;
        let mut applied = Vec::new();
        let mut skipped = Vec::new();

        for (position, field) in fields.iter().enumerate() {
            let kind = field.kind();
            if !field.is_complete() {
                warn!(position, kind = %kind, "Skipping field without content");
                skipped.push(SkippedField {
                    position,
                    kind,
                    reason: SkipReason::IncompleteContent,
                });
                continue;
            }

            let current = revision.as_deref().unwrap_or(original);
            let next = self.injector.inject(current, field, viewport)?;
            info!(
                position,
                kind = %kind,
                page = field.page_index(),
                "Applied field"
            );
            applied.push(FieldSummary {
                kind,
                applied_at: self.clock.now(),
            });
            revision = Some(next);
        }

        let bytes = revision.unwrap_or_else(|| original.to_vec());
        info!(
            applied = applied.len(),
            skipped = skipped.len(),
            output_bytes = bytes.len(),
            "Field injection complete"
        );

        Ok(InjectionOutcome {
            bytes,
            applied,
            skipped,
        })
    }

    /// Open a pending integrity record for an uploaded original
    pub fn register(&self, original: &[u8]) -> IntegrityRecord {
        IntegrityRecord::new(ledger::fingerprint(original), self.clock.now())
    }

    /// Inject `fields` and move `record` from pending to signed.
    ///
    /// `original` must hash to the record's original fingerprint.
    pub fn sign(
        &self,
        mut record: IntegrityRecord,
        original: &[u8],
        fields: &[Field],
        viewport: ViewportSize,
    ) -> Result<SignedDocument> {
        let actual = ledger::fingerprint(original);
        if actual != record.original_fingerprint {
            warn!(
                expected = %record.original_fingerprint,
                actual = %actual,
                "Original does not match its integrity record"
            );
            return Err(InjectionError::OriginalMismatch {
                expected: record.original_fingerprint,
                actual,
            });
        }

        let outcome = self.process_all(original, fields, viewport)?;
        let signed_fingerprint = ledger::fingerprint(&outcome.bytes);
        record.mark_signed(signed_fingerprint, outcome.applied, self.clock.now())?;

        info!(
            original = %record.original_fingerprint,
            signed = ?record.signed_fingerprint,
            "Document signed"
        );

        Ok(SignedDocument {
            bytes: outcome.bytes,
            record,
            skipped: outcome.skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use shared_types::{CaptureRect, DocumentStatus, PageSize};

    fn pipeline() -> Pipeline<FixedClock> {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        Pipeline::with_clock(InjectionConfig::default(), FixedClock(now)).unwrap()
    }

    fn document() -> Vec<u8> {
        PdfDocument::blank(&[PageSize::A4]).save_to_bytes().unwrap()
    }

    fn viewport() -> ViewportSize {
        ViewportSize::new(800.0, 1100.0)
    }

    fn text(value: Option<&str>) -> Field {
        Field::Text {
            rect: CaptureRect::new(100.0, 100.0, 200.0, 30.0, 0),
            text: value.map(str::to_string),
            font_size: None,
        }
    }

    #[test]
    fn test_skips_are_reported() {
        let original = document();
        let fields = vec![
            text(Some("hello")),
            text(None),
            Field::Date {
                rect: CaptureRect::new(0.0, 0.0, 10.0, 10.0, 0),
                date: Some(String::new()),
                font_size: None,
            },
        ];
        let outcome = pipeline().process_all(&original, &fields, viewport()).unwrap();

        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(
            outcome.skipped,
            vec![
                SkippedField {
                    position: 1,
                    kind: FieldKind::Text,
                    reason: SkipReason::IncompleteContent,
                },
                SkippedField {
                    position: 2,
                    kind: FieldKind::Date,
                    reason: SkipReason::IncompleteContent,
                },
            ]
        );
    }

    #[test]
    fn test_no_fields_returns_original() {
        let original = document();
        let outcome = pipeline().process_all(&original, &[], viewport()).unwrap();
        assert_eq!(outcome.bytes, original);
        assert!(outcome.applied.is_empty());
    }

    #[test]
    fn test_unselected_choice_is_applied() {
        let original = document();
        let fields = vec![Field::Choice {
            rect: CaptureRect::new(10.0, 10.0, 20.0, 20.0, 0),
            selected: false,
        }];
        let outcome = pipeline().process_all(&original, &fields, viewport()).unwrap();
        assert_eq!(outcome.applied.len(), 1);
        assert_ne!(outcome.bytes, original);
    }

    #[test]
    fn test_empty_document() {
        let empty = PdfDocument::blank(&[]).save_to_bytes().unwrap();
        assert!(matches!(
            pipeline().process_all(&empty, &[text(Some("x"))], viewport()),
            Err(InjectionError::EmptyDocument)
        ));
    }

    #[test]
    fn test_invalid_viewport_fails_even_when_all_skipped() {
        let result = pipeline().process_all(&document(), &[text(None)], ViewportSize::new(800.0, 0.0));
        assert!(matches!(result, Err(InjectionError::InvalidViewport { .. })));
    }

    #[test]
    fn test_failure_aborts_run() {
        let fields = vec![
            text(Some("first")),
            Field::Text {
                rect: CaptureRect::new(0.0, 0.0, 10.0, 10.0, 5),
                text: Some("nowhere".into()),
                font_size: None,
            },
        ];
        assert!(matches!(
            pipeline().process_all(&document(), &fields, viewport()),
            Err(InjectionError::PageIndexOutOfBounds { index: 5, .. })
        ));
    }

    #[test]
    fn test_sign_builds_record() {
        let pipeline = pipeline();
        let original = document();
        let record = pipeline.register(&original);
        assert_eq!(record.status, DocumentStatus::Pending);

        let signed = pipeline
            .sign(record, &original, &[text(Some("Jane")), text(None)], viewport())
            .unwrap();

        assert_eq!(signed.record.status, DocumentStatus::Signed);
        assert_eq!(signed.record.original_fingerprint, ledger::fingerprint(&original));
        assert_eq!(
            signed.record.signed_fingerprint,
            Some(ledger::fingerprint(&signed.bytes))
        );
        assert_eq!(signed.record.field_summaries.len(), 1);
        assert_eq!(signed.record.field_summaries[0].kind, FieldKind::Text);
        assert_eq!(signed.skipped.len(), 1);
    }

    #[test]
    fn test_sign_rejects_mismatched_original() {
        let pipeline = pipeline();
        let record = pipeline.register(&document());
        let other = PdfDocument::blank(&[PageSize::LETTER]).save_to_bytes().unwrap();

        let err = pipeline
            .sign(record.clone(), &other, &[text(Some("Jane"))], viewport())
            .unwrap_err();
        assert!(matches!(
            err,
            InjectionError::OriginalMismatch { ref expected, ref actual }
                if *expected == record.original_fingerprint
                    && *actual == ledger::fingerprint(&other)
        ));
    }

    #[test]
    fn test_sign_twice_is_rejected() {
        let pipeline = pipeline();
        let original = document();
        let signed = pipeline
            .sign(pipeline.register(&original), &original, &[], viewport())
            .unwrap();
        assert!(matches!(
            pipeline.sign(signed.record, &original, &[], viewport()),
            Err(InjectionError::Record(_))
        ));
    }
}
