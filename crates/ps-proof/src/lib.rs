//! Tamper-evident proof records: construction, verification and local storage.
//!
//! A proof binds an ordered set of evidence files, a capture timestamp, an
//! optional GPS location and a random salt into one SHA-256 commitment. Any
//! later change to a file is detected by re-hashing it against the digest
//! stored at capture time.
//!
//! # Example
//!
//! ```
//! use ps_proof::{create_proof, verify_file, Category, EvidenceFile, Location, ProofDraft};
//!
//! let draft = ProofDraft {
//!     title: "Move-in inspection".to_string(),
//!     description: "Scratch on the front door".to_string(),
//!     category: Category::Apartment,
//!     files: vec![EvidenceFile::capture("door.jpg", "image/jpeg", b"jpeg bytes")],
//!     location: Location::new(52.52, 13.405),
//! };
//!
//! let proof = create_proof(draft).unwrap();
//! assert_eq!(proof.combined_hash.len(), 64);
//!
//! let outcome = verify_file(&proof, 0, b"jpeg bytes").unwrap();
//! assert!(outcome.matched);
//! ```

mod archive;
mod builder;
mod query;
mod store;
mod types;
mod verify;

pub use archive::{
    export_document, export_store, import_into, parse_import, ExportDocument, ImportError,
    EXPORT_VERSION,
};
pub use builder::{
    capture_file, capture_files, commitment_preimage, content_type_for, create_proof,
    create_proof_at, edit_proof, edit_proof_at, format_coordinate, generate_combined_hash,
    generate_id, generate_salt, hash_bytes, hash_file, hash_files, render_location, BuildError,
    LOCATION_NONE, PREIMAGE_SEPARATOR, SALT_LEN,
};
pub use query::{dashboard_stats, filter_proofs, DashboardStats, ProofFilter};
pub use store::{FileStore, MemoryStore, ProofStore, StoreError};
pub use types::{
    decode_data_url, encode_data_url, iso_timestamp, Category, EncodingError, EvidenceFile,
    Location, ProofDraft, ProofRecord,
};
pub use verify::{
    audit_record, verify, verify_file, AuditReport, FileAudit, VerificationOutcome, VerifyError,
};
