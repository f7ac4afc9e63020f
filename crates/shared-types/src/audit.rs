//! Tamper-evident integrity record for a signed document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::field::FieldKind;

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },

    #[error("Failed to serialize integrity record: {0}")]
    Serialize(String),

    #[error("Failed to deserialize integrity record: {0}")]
    Deserialize(String),
}

/// Lowercase hex SHA-256 digest of a byte sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Accept a 64-character hex digest, normalizing to lowercase
    pub fn from_hex(hex_digest: &str) -> Option<Self> {
        let trimmed = hex_digest.trim();
        if trimmed.len() == 64 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(trimmed.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the SHA-256 fingerprint of document bytes
pub fn hash_document(bytes: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Fingerprint::from_digest(&hasher.finalize())
}

/// Finish a running hasher into a fingerprint
pub fn finish_fingerprint(hasher: Sha256) -> Fingerprint {
    Fingerprint::from_digest(&hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Signed,
    Completed,
}

/// That a field of some kind was applied, and when. Content is never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub kind: FieldKind,
    pub applied_at: DateTime<Utc>,
}

/// Durable proof of which bytes were signed and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityRecord {
    pub original_fingerprint: Fingerprint,
    pub signed_fingerprint: Option<Fingerprint>,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub signed_at: Option<DateTime<Utc>>,
    pub field_summaries: Vec<FieldSummary>,
}

impl IntegrityRecord {
    /// Open a pending record for an uploaded original
    pub fn new(original_fingerprint: Fingerprint, created_at: DateTime<Utc>) -> Self {
        Self {
            original_fingerprint,
            signed_fingerprint: None,
            status: DocumentStatus::Pending,
            created_at,
            signed_at: None,
            field_summaries: Vec::new(),
        }
    }

    /// Record the signed revision. Only a pending record can be signed.
    pub fn mark_signed(
        &mut self,
        signed_fingerprint: Fingerprint,
        field_summaries: Vec<FieldSummary>,
        signed_at: DateTime<Utc>,
    ) -> Result<(), RecordError> {
        if self.status != DocumentStatus::Pending {
            return Err(RecordError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Signed,
            });
        }
        self.signed_fingerprint = Some(signed_fingerprint);
        self.field_summaries = field_summaries;
        self.signed_at = Some(signed_at);
        self.status = DocumentStatus::Signed;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), RecordError> {
        if self.status != DocumentStatus::Signed {
            return Err(RecordError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Completed,
            });
        }
        self.status = DocumentStatus::Completed;
        Ok(())
    }

    /// Digest over every recorded value, chaining the signed fingerprint to the original one
    pub fn seal(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.original_fingerprint.as_str().as_bytes());
        if let Some(ref signed) = self.signed_fingerprint {
            hasher.update(signed.as_str().as_bytes());
        }
        hasher.update(format!("{:?}", self.status).as_bytes());
        hasher.update(self.created_at.to_rfc3339().as_bytes());
        if let Some(signed_at) = self.signed_at {
            hasher.update(signed_at.to_rfc3339().as_bytes());
        }
        for summary in &self.field_summaries {
            hasher.update(summary.kind.as_str().as_bytes());
            hasher.update(summary.applied_at.to_rfc3339().as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    pub fn verify_seal(&self, seal: &str) -> bool {
        self.seal().eq_ignore_ascii_case(seal.trim())
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        serde_json::to_string_pretty(self).map_err(|e| RecordError::Serialize(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        serde_json::from_str(json).map_err(|e| RecordError::Deserialize(e.to_string()))
    }

    /// One display line per applied field
    pub fn summary(&self) -> Vec<String> {
        self.field_summaries
            .iter()
            .map(|s| format!("[{}] {}", s.applied_at.to_rfc3339(), s.kind))
            .collect()
    }
}
