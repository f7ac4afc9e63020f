//! Integrity Ledger: fingerprints and verification of stored artifacts
//!
//! The ledger only reads bytes. A mismatch is reported as a value, never as
//! an error, so hosts can tell "tampered" apart from "could not read".

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared_types::{
    finish_fingerprint, hash_document, DocumentStatus, FieldSummary, Fingerprint, IntegrityRecord,
};
use std::io::{self, Read};
use tracing::warn;

const CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 fingerprint of an in-memory revision
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    hash_document(bytes)
}

/// Fingerprint a readable source without buffering it whole
pub fn fingerprint_reader<R: Read>(mut reader: R) -> io::Result<Fingerprint> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(finish_fingerprint(hasher))
}

/// Outcome of re-checking stored bytes against a recorded fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Verification {
    Verified,
    Tampered {
        expected: Fingerprint,
        actual: Fingerprint,
    },
    Unreadable {
        reason: String,
    },
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified)
    }
}

/// Compare in-memory bytes against the stored digest
pub fn verify(stored: &Fingerprint, bytes: &[u8]) -> Verification {
    compare(stored, fingerprint(bytes))
}

/// Compare a stored artifact against its digest; read failures are `Unreadable`
pub fn verify_source<R: Read>(stored: &Fingerprint, source: io::Result<R>) -> Verification {
    match source.and_then(fingerprint_reader) {
        Ok(actual) => compare(stored, actual),
        Err(e) => {
            warn!(expected = %stored, error = %e, "Stored artifact could not be read");
            Verification::Unreadable {
                reason: e.to_string(),
            }
        }
    }
}

fn compare(stored: &Fingerprint, actual: Fingerprint) -> Verification {
    if *stored == actual {
        Verification::Verified
    } else {
        warn!(expected = %stored, actual = %actual, "Fingerprint mismatch");
        Verification::Tampered {
            expected: stored.clone(),
            actual,
        }
    }
}

/// Audit trail for one document: both artifacts re-verified, content excluded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub signed_at: Option<DateTime<Utc>>,
    pub original: Verification,
    /// `None` until the record has a signed fingerprint
    pub signed: Option<Verification>,
    pub fields: Vec<FieldSummary>,
}

impl AuditReport {
    pub fn is_intact(&self) -> bool {
        self.original.is_verified() && self.signed.as_ref().map_or(true, Verification::is_verified)
    }
}

pub struct IntegrityLedger;

impl IntegrityLedger {
    /// Re-verify the artifacts a record refers to.
    ///
    /// `signed_source` is only read when the record has a signed fingerprint.
    pub fn audit<O, S>(
        record: &IntegrityRecord,
        original_source: io::Result<O>,
        signed_source: impl FnOnce() -> io::Result<S>,
    ) -> AuditReport
    where
        O: Read,
        S: Read,
    {
        let original = verify_source(&record.original_fingerprint, original_source);
        let signed = record
            .signed_fingerprint
            .as_ref()
            .map(|expected| verify_source(expected, signed_source()));

        AuditReport {
            status: record.status,
            created_at: record.created_at,
            signed_at: record.signed_at,
            original,
            signed,
            fields: record.field_summaries.clone(),
        }
    }
}
