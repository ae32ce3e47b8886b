//! Local proof storage keyed by record id.

use crate::types::ProofRecord;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no proof with id {0}")]
    RecordNotFound(String),

    #[error("proof {0} has no files")]
    EmptyRecord(String),
}

/// A key-value record store.
pub trait ProofStore {
    /// All records, newest `created_at` first.
    fn get_all(&self) -> Result<Vec<ProofRecord>, StoreError>;

    /// Look up one record.
    fn get(&self, id: &str) -> Result<Option<ProofRecord>, StoreError>;

    /// Insert or replace a record by id.
    fn put(&mut self, record: ProofRecord) -> Result<(), StoreError> {
        self.put_all(vec![record])
    }

    /// Insert or replace several records. Either all are written or none.
    fn put_all(&mut self, records: Vec<ProofRecord>) -> Result<(), StoreError>;

    /// Remove a record.
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;

    /// Remove every record.
    fn clear(&mut self) -> Result<(), StoreError>;

    /// Look up a record that must exist.
    fn require(&self, id: &str) -> Result<ProofRecord, StoreError> {
        self.get(id)?
            .ok_or_else(|| StoreError::RecordNotFound(id.to_string()))
    }
}

type RecordMap = BTreeMap<String, ProofRecord>;

fn newest_first(records: &RecordMap) -> Vec<ProofRecord> {
    let mut all: Vec<ProofRecord> = records.values().cloned().collect();
    all.sort_by(|a, b| b.created_at_time().cmp(&a.created_at_time()));
    all
}

fn merge(records: &mut RecordMap, incoming: Vec<ProofRecord>) -> Result<(), StoreError> {
    if let Some(empty) = incoming.iter().find(|r| r.files.is_empty()) {
        return Err(StoreError::EmptyRecord(empty.id.clone()));
    }
    for record in incoming {
        records.insert(record.id.clone(), record);
    }
    Ok(())
}

/// In-memory store, mainly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: RecordMap,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ProofStore for MemoryStore {
    fn get_all(&self) -> Result<Vec<ProofRecord>, StoreError> {
        Ok(newest_first(&self.records))
    }

    fn get(&self, id: &str) -> Result<Option<ProofRecord>, StoreError> {
        Ok(self.records.get(id).cloned())
    }

    fn put_all(&mut self, records: Vec<ProofRecord>) -> Result<(), StoreError> {
        merge(&mut self.records, records)
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::RecordNotFound(id.to_string()))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.records.clear();
        Ok(())
    }
}

/// Store backed by a single JSON file holding an array of records.
///
/// Every write replaces the file through a sibling temporary file and a
/// rename, so a failed write leaves the previous contents in place.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open (or lazily create) a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<RecordMap, StoreError> {
        if !self.path.exists() {
            return Ok(RecordMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(RecordMap::new());
        }
        let records: Vec<ProofRecord> = serde_json::from_str(&contents)?;
        Ok(records.into_iter().map(|r| (r.id.clone(), r)).collect())
    }

    fn save(&self, records: &RecordMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let ordered = newest_first(records);
        let json = serde_json::to_string_pretty(&ordered)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;
        debug!(path = %self.path.display(), records = ordered.len(), "wrote proof store");
        Ok(())
    }
}

impl ProofStore for FileStore {
    fn get_all(&self) -> Result<Vec<ProofRecord>, StoreError> {
        Ok(newest_first(&self.load()?))
    }

    fn get(&self, id: &str) -> Result<Option<ProofRecord>, StoreError> {
        Ok(self.load()?.remove(id))
    }

    fn put_all(&mut self, records: Vec<ProofRecord>) -> Result<(), StoreError> {
        let mut current = self.load()?;
        let count = records.len();
        merge(&mut current, records)?;
        self.save(&current)?;
        info!(count, "saved proofs");
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let mut current = self.load()?;
        if current.remove(id).is_none() {
            return Err(StoreError::RecordNotFound(id.to_string()));
        }
        self.save(&current)?;
        info!(%id, "deleted proof");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.save(&RecordMap::new())?;
        info!("cleared all proofs");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::create_proof_at;
    use crate::types::{Category, EvidenceFile, Location, ProofDraft};
    use crate::verify::audit_record;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn make_record(title: &str, days: i64) -> ProofRecord {
        let draft = ProofDraft {
            title: title.to_string(),
            description: String::new(),
            category: Category::Purchase,
            files: vec![EvidenceFile::capture("r.txt", "text/plain", title.as_bytes())],
            location: None,
        };
        create_proof_at(draft, base_time() + Duration::days(days)).unwrap()
    }

    fn exercise_store<S: ProofStore>(store: &mut S) {
        let old = make_record("old", 0);
        let new = make_record("new", 5);
        store.put(old.clone()).unwrap();
        store.put(new.clone()).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, new.id);
        assert_eq!(all[1].id, old.id);

        assert_eq!(store.get(&old.id).unwrap(), Some(old.clone()));
        assert!(store.get("missing").unwrap().is_none());

        let mut renamed = old.clone();
        renamed.title = "renamed".to_string();
        store.put(renamed).unwrap();
        assert_eq!(store.get_all().unwrap().len(), 2);
        assert_eq!(store.require(&old.id).unwrap().title, "renamed");

        store.delete(&old.id).unwrap();
        assert!(matches!(
            store.delete(&old.id),
            Err(StoreError::RecordNotFound(_))
        ));
        assert!(matches!(
            store.require(&old.id),
            Err(StoreError::RecordNotFound(_))
        ));

        store.clear().unwrap();
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn memory_store_operations() {
        let mut store = MemoryStore::new();
        exercise_store(&mut store);
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_operations() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("nested").join("proofs.json"));
        exercise_store(&mut store);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proofs.json");
        let record = make_record("receipt", 1);

        let mut store = FileStore::open(&path);
        store.put(record.clone()).unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get_all().unwrap(), vec![record]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn full_precision_location_stays_intact_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proofs.json");
        let draft = ProofDraft {
            title: "gps".to_string(),
            description: String::new(),
            category: Category::Vehicle,
            files: vec![EvidenceFile::capture("dash.jpg", "image/jpeg", b"dashcam")],
            location: Location::new(48.137154372613814, 21.877423353265442),
        };
        let record = create_proof_at(draft, base_time()).unwrap();

        FileStore::open(&path).put(record.clone()).unwrap();

        let reloaded = FileStore::open(&path).require(&record.id).unwrap();
        assert_eq!(reloaded.location, record.location);
        assert!(audit_record(&reloaded).unwrap().is_intact());
    }

    #[test]
    fn put_all_rejects_batch_with_empty_record() {
        let mut store = MemoryStore::new();
        let good = make_record("good", 0);
        let mut empty = make_record("empty", 1);
        empty.files.clear();

        assert!(matches!(
            store.put_all(vec![good, empty]),
            Err(StoreError::EmptyRecord(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn corrupted_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proofs.json");
        fs::write(&path, "not valid json").unwrap();

        let store = FileStore::open(&path);
        assert!(matches!(
            store.get_all(),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn missing_or_blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proofs.json");
        assert!(FileStore::open(&path).get_all().unwrap().is_empty());
        fs::write(&path, "\n").unwrap();
        assert!(FileStore::open(&path).get_all().unwrap().is_empty());
    }
}
