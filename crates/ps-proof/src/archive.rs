//! Bulk export and import of proofs as a single JSON document.

use crate::store::{ProofStore, StoreError};
use crate::types::{iso_timestamp, ProofRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

/// Format version written into every export.
pub const EXPORT_VERSION: &str = "1.0.0";

/// Errors that can occur during import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed import: {0}")]
    Malformed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// `{ version, exportDate, proofs }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub export_date: String,
    pub proofs: Vec<ProofRecord>,
}

impl ExportDocument {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Wrap `proofs` in an export document dated `now`.
pub fn export_document(proofs: Vec<ProofRecord>, now: DateTime<Utc>) -> ExportDocument {
    ExportDocument {
        version: EXPORT_VERSION.to_string(),
        export_date: iso_timestamp(now),
        proofs,
    }
}

/// Export everything in `store`.
pub fn export_store<S: ProofStore + ?Sized>(store: &S) -> Result<ExportDocument, StoreError> {
    let proofs = store.get_all()?;
    info!(count = proofs.len(), "exporting proofs");
    Ok(export_document(proofs, Utc::now()))
}

/// Parse and shape-check an import payload.
///
/// Either every record is returned or an error is; there is no partial result.
pub fn parse_import(json: &str) -> Result<Vec<ProofRecord>, ImportError> {
    let document: Value = serde_json::from_str(json)
        .map_err(|e| ImportError::Malformed(format!("invalid JSON: {e}")))?;

    let proofs = match document.get("proofs") {
        None => return Err(ImportError::Malformed("missing 'proofs'".to_string())),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ImportError::Malformed("'proofs' is not an array".to_string())),
    };

    proofs
        .iter()
        .enumerate()
        .map(|(index, item)| {
            ProofRecord::deserialize(item)
                .map_err(|e| ImportError::Malformed(format!("proof {index}: {e}")))
        })
        .collect()
}

/// Parse `json` and write every record into `store`. Returns the count.
pub fn import_into<S: ProofStore + ?Sized>(store: &mut S, json: &str) -> Result<usize, ImportError> {
    let imported = parse_import(json).and_then(|records| {
        let count = records.len();
        store.put_all(records)?;
        Ok(count)
    });
    match imported {
        Ok(count) => {
            info!(count, "imported proofs");
            Ok(count)
        }
        Err(e) => {
            warn!(error = %e, "rejected import");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::create_proof_at;
    use crate::store::MemoryStore;
    use crate::types::{Category, EvidenceFile, Location, ProofDraft};
    use crate::verify::audit_record;
    use chrono::{Duration, TimeZone};

    fn make_record(title: &str, offset: i64) -> ProofRecord {
        let draft = ProofDraft {
            title: title.to_string(),
            description: "imported".to_string(),
            category: Category::Communication,
            files: vec![
                EvidenceFile::capture("chat.png", "image/png", title.as_bytes()),
                EvidenceFile::capture("log.txt", "text/plain", b"log"),
            ],
            location: Location::new(40.41677543712989, 21.877423353265442),
        };
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap() + Duration::hours(offset);
        create_proof_at(draft, now).unwrap()
    }

    #[test]
    fn export_then_import_preserves_commitment_fields() {
        let originals = vec![make_record("first", 0), make_record("second", 1)];
        let document = export_document(originals.clone(), Utc::now());
        let json = document.to_json().unwrap();

        let imported = parse_import(&json).unwrap();
        assert_eq!(imported.len(), originals.len());
        for (a, b) in originals.iter().zip(&imported) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.combined_hash, b.combined_hash);
            assert_eq!(a.salt, b.salt);
            assert_eq!(a.timestamp, b.timestamp);
            let da: Vec<&str> = a.files.iter().map(|f| f.digest.as_str()).collect();
            let db: Vec<&str> = b.files.iter().map(|f| f.digest.as_str()).collect();
            assert_eq!(da, db);
            assert_eq!(a.location, b.location);
            assert!(audit_record(b).unwrap().is_intact());
        }
    }

    #[test]
    fn export_document_shape() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let json = export_document(vec![make_record("a", 0)], now).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], EXPORT_VERSION);
        assert_eq!(value["exportDate"], "2024-06-01T00:00:00.000Z");
        assert!(value["proofs"].is_array());
    }

    #[test]
    fn import_rejects_invalid_json() {
        assert!(matches!(
            parse_import("{ not json"),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn import_rejects_missing_proofs() {
        assert!(matches!(
            parse_import(r#"{"version": "1.0.0"}"#),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn import_rejects_non_array_proofs() {
        assert!(matches!(
            parse_import(r#"{"proofs": {"id": "x"}}"#),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn import_accepts_empty_array() {
        assert!(parse_import(r#"{"proofs": []}"#).unwrap().is_empty());
    }

    #[test]
    fn bad_record_rejects_whole_import_and_writes_nothing() {
        let mut store = MemoryStore::new();
        let existing = make_record("existing", 0);
        store.put(existing.clone()).unwrap();

        let good = serde_json::to_value(make_record("good", 1)).unwrap();
        let payload = serde_json::json!({ "proofs": [good, {"title": "no id"}] }).to_string();

        assert!(matches!(
            import_into(&mut store, &payload),
            Err(ImportError::Malformed(_))
        ));
        assert_eq!(store.get_all().unwrap(), vec![existing]);
    }

    #[test]
    fn record_without_files_rejects_whole_import() {
        let mut store = MemoryStore::new();
        let existing = make_record("existing", 0);
        store.put(existing.clone()).unwrap();

        let mut empty = make_record("empty", 1);
        empty.files.clear();
        let json = export_document(vec![make_record("good", 2), empty], Utc::now())
            .to_json()
            .unwrap();

        assert!(matches!(
            import_into(&mut store, &json),
            Err(ImportError::Store(StoreError::EmptyRecord(_)))
        ));
        assert_eq!(store.get_all().unwrap(), vec![existing]);
    }

    #[test]
    fn import_into_store_upserts_by_id() {
        let mut store = MemoryStore::new();
        let record = make_record("dup", 0);
        store.put(record.clone()).unwrap();

        let json = export_document(vec![record.clone(), make_record("fresh", 2)], Utc::now())
            .to_json()
            .unwrap();
        assert_eq!(import_into(&mut store, &json).unwrap(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn import_reads_backups_from_the_browser_app() {
        let json = r#"{
          "version": "1.0.0",
          "exportDate": "2024-01-02T10:00:00.000Z",
          "proofs": [{
            "id": "lqu5m2o0abc123",
            "title": "Hallway",
            "description": "",
            "category": "apartment",
            "files": [{
              "name": "hello.txt",
              "type": "text/plain",
              "dataUrl": "data:text/plain;base64,aGVsbG8=",
              "hash": "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
            }],
            "timestamp": "2024-01-01T00:00:00.000Z",
            "location": null,
            "combinedHash": "d1721334f2681ac334c6ea1e750f7351d461d2a17182a365576e848ee39cbaf2",
            "salt": "00112233445566778899aabbccddeeff",
            "createdAt": "2024-01-01T00:00:00.000Z"
          }]
        }"#;
        let records = parse_import(json).unwrap();
        assert_eq!(records.len(), 1);
        let report = crate::verify::audit_record(&records[0]).unwrap();
        assert!(report.is_intact());
    }
}
