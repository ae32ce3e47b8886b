//! Proof verification.

use crate::builder::generate_combined_hash;
use crate::types::{EncodingError, ProofRecord};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during verification.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("proof {id} has no file at index {index} (it has {len})")]
    FileIndexOutOfRange { id: String, index: usize, len: usize },

    #[error("stored content of file {index} cannot be decoded: {source}")]
    ContentDecode {
        index: usize,
        #[source]
        source: EncodingError,
    },
}

/// Result of checking one candidate file against a stored digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub matched: bool,
    /// Digest stored in the proof
    pub expected: String,
    /// Digest of the candidate bytes, reported even on mismatch
    pub computed: String,
}

/// Per-file result of an integrity audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAudit {
    pub index: usize,
    pub name: String,
    pub stored: String,
    pub recomputed: String,
}

impl FileAudit {
    pub fn is_intact(&self) -> bool {
        self.stored == self.recomputed
    }
}

/// Full re-derivation of a stored proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub files: Vec<FileAudit>,
    pub stored_combined: String,
    pub recomputed_combined: String,
}

impl AuditReport {
    pub fn combined_intact(&self) -> bool {
        self.stored_combined == self.recomputed_combined
    }

    /// True if every file digest and the combined hash re-derive exactly.
    pub fn is_intact(&self) -> bool {
        self.combined_intact() && self.files.iter().all(FileAudit::is_intact)
    }
}

/// Check candidate bytes against an expected digest. Exact match only.
pub fn verify(expected_digest: &str, candidate: &[u8]) -> bool {
    ps_digest::digest(candidate) == expected_digest
}

/// Check candidate bytes against file `index` of `record`.
pub fn verify_file(
    record: &ProofRecord,
    index: usize,
    candidate: &[u8],
) -> Result<VerificationOutcome, VerifyError> {
    let file = record
        .file(index)
        .ok_or_else(|| VerifyError::FileIndexOutOfRange {
            id: record.id.clone(),
            index,
            len: record.files.len(),
        })?;

    let computed = ps_digest::digest(candidate);
    let matched = computed == file.digest;
    debug!(id = %record.id, index, matched, "verified candidate file");

    Ok(VerificationOutcome {
        matched,
        expected: file.digest.clone(),
        computed,
    })
}

/// Re-derive every file digest from stored content and the combined hash
/// from the stored fields. Stored values are never modified.
pub fn audit_record(record: &ProofRecord) -> Result<AuditReport, VerifyError> {
    let mut files = Vec::with_capacity(record.files.len());
    for (index, file) in record.files.iter().enumerate() {
        let content = file
            .content()
            .map_err(|source| VerifyError::ContentDecode { index, source })?;
        files.push(FileAudit {
            index,
            name: file.name.clone(),
            stored: file.digest.clone(),
            recomputed: ps_digest::digest(&content),
        });
    }

    let recomputed_combined = generate_combined_hash(
        &record.files,
        &record.timestamp,
        record.location.as_ref(),
        &record.salt,
    );

    Ok(AuditReport {
        files,
        stored_combined: record.combined_hash.clone(),
        recomputed_combined,
    })
}
