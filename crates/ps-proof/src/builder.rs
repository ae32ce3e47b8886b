//! Proof construction: file capture, salts, identifiers and the combined hash.

use crate::types::{iso_timestamp, EvidenceFile, Location, ProofDraft, ProofRecord};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use thiserror::Error;
use tracing::{debug, info};

/// Separator between preimage fields and between file digests.
pub const PREIMAGE_SEPARATOR: char = '|';

/// Rendered in place of coordinates when a proof has no location.
pub const LOCATION_NONE: &str = "none";

/// Salt size in bytes (hex-encoded to twice as many characters).
pub const SALT_LEN: usize = 16;

/// Errors that can occur while building a proof.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("environment unsupported: {0}")]
    EnvironmentUnsupported(String),

    #[error("failed to start hashing thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    #[error("a proof needs a title")]
    MissingTitle,

    #[error("a proof needs at least one file")]
    NoFiles,

    #[error("invalid location: lat {lat}, lng {lng}")]
    InvalidLocation { lat: f64, lng: f64 },
}

/// Hash in-memory file content.
pub fn hash_bytes(content: &[u8]) -> String {
    ps_digest::digest(content)
}

/// Hash the full content of a file on disk.
pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<String, BuildError> {
    let path = path.as_ref();
    ps_digest::digest_file(path).map_err(|source| BuildError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Hash several files concurrently. Digests come back in input order.
pub fn hash_files<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<String>, BuildError> {
    in_input_order(paths, |path| hash_file(path))
}

/// Read a file from disk and capture it as evidence.
pub fn capture_file<P: AsRef<Path>>(path: P) -> Result<EvidenceFile, BuildError> {
    let path = path.as_ref();
    let content = fs::read(path).map_err(|source| BuildError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file = EvidenceFile::capture(name, content_type_for(path), &content);
    debug!(path = %path.display(), digest = %file.digest, "captured evidence file");
    Ok(file)
}

/// Capture several files concurrently, preserving input order.
pub fn capture_files<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<EvidenceFile>, BuildError> {
    in_input_order(paths, |path| capture_file(path))
}

/// Run `job` on every path on worker threads and re-sequence the results.
///
/// At most `available_parallelism` threads run at once. The first failure in
/// input order wins, regardless of completion order.
fn in_input_order<P, T, F>(paths: &[P], job: F) -> Result<Vec<T>, BuildError>
where
    P: AsRef<Path> + Sync,
    T: Send,
    F: Fn(&Path) -> Result<T, BuildError> + Sync,
{
    let workers = thread::available_parallelism().map_or(1, |n| n.get());
    let job = &job;
    let mut results = Vec::with_capacity(paths.len());
    for batch in paths.chunks(workers) {
        thread::scope(|scope| -> Result<(), BuildError> {
            let handles = batch
                .iter()
                .map(|path| {
                    thread::Builder::new()
                        .name("ps-hash".to_string())
                        .spawn_scoped(scope, move || job(path.as_ref()))
                        .map_err(BuildError::ThreadSpawn)
                })
                .collect::<Result<Vec<_>, _>>()?;
            for handle in handles {
                match handle.join() {
                    Ok(result) => results.push(result?),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            Ok(())
        })?;
    }
    Ok(results)
}

/// Guess a media type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// 16 bytes from the operating system CSPRNG, hex-encoded.
pub fn generate_salt() -> Result<String, BuildError> {
    let mut bytes = [0u8; SALT_LEN];
    getrandom::fill(&mut bytes).map_err(|e| {
        BuildError::EnvironmentUnsupported(format!("secure random source unavailable: {e}"))
    })?;
    Ok(hex::encode(bytes))
}

/// Base-36 millisecond clock followed by 64 random bits in hex.
pub fn generate_id() -> String {
    generate_id_at(Utc::now())
}

fn generate_id_at(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    let entropy: u64 = rand::rng().random();
    format!("{}{entropy:016x}", to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Render one coordinate the way an ECMAScript `Number` prints itself.
///
/// Shortest round-trip decimal, `-0` as `0`, and exponent form below `1e-6`
/// or from `1e21` upward.
pub fn format_coordinate(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if magnitude < 1e-6 || magnitude >= 1e21 {
        let rendered = format!("{value:e}");
        return match rendered.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => rendered,
        };
    }
    format!("{value}")
}

/// `"<lat>,<lng>"`, or [`LOCATION_NONE`] when absent.
pub fn render_location(location: Option<&Location>) -> String {
    match location {
        Some(loc) => format!("{},{}", format_coordinate(loc.lat), format_coordinate(loc.lng)),
        None => LOCATION_NONE.to_string(),
    }
}

/// The canonical string hashed into the combined hash:
/// `digest1|digest2|...|timestamp|location|salt`.
pub fn commitment_preimage(
    files: &[EvidenceFile],
    timestamp: &str,
    location: Option<&Location>,
    salt: &str,
) -> String {
    let separator = PREIMAGE_SEPARATOR.to_string();
    let digests: Vec<&str> = files.iter().map(|f| f.digest.as_str()).collect();
    [
        digests.join(&separator),
        timestamp.to_string(),
        render_location(location),
        salt.to_string(),
    ]
    .join(&separator)
}

/// Hash the commitment preimage. Uses the stored file digests as-is.
pub fn generate_combined_hash(
    files: &[EvidenceFile],
    timestamp: &str,
    location: Option<&Location>,
    salt: &str,
) -> String {
    let preimage = commitment_preimage(files, timestamp, location, salt);
    ps_digest::digest(preimage.as_bytes())
}

/// Create a new proof from a draft, stamped with the current time.
pub fn create_proof(draft: ProofDraft) -> Result<ProofRecord, BuildError> {
    create_proof_at(draft, Utc::now())
}

/// Create a new proof stamped with `now`.
pub fn create_proof_at(draft: ProofDraft, now: DateTime<Utc>) -> Result<ProofRecord, BuildError> {
    let id = generate_id_at(now);
    let created_at = iso_timestamp(now);
    let record = seal(draft, id, created_at, now)?;
    info!(id = %record.id, files = record.files.len(), "created proof");
    Ok(record)
}

/// Replace the editable content of `existing`, keeping its id and creation time.
pub fn edit_proof(existing: &ProofRecord, draft: ProofDraft) -> Result<ProofRecord, BuildError> {
    edit_proof_at(existing, draft, Utc::now())
}

/// Edit-save stamped with `now`. Timestamp, salt and combined hash are regenerated.
pub fn edit_proof_at(
    existing: &ProofRecord,
    draft: ProofDraft,
    now: DateTime<Utc>,
) -> Result<ProofRecord, BuildError> {
    let record = seal(draft, existing.id.clone(), existing.created_at.clone(), now)?;
    info!(id = %record.id, files = record.files.len(), "edited proof");
    Ok(record)
}

fn seal(
    draft: ProofDraft,
    id: String,
    created_at: String,
    now: DateTime<Utc>,
) -> Result<ProofRecord, BuildError> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return Err(BuildError::MissingTitle);
    }
    if draft.files.is_empty() {
        return Err(BuildError::NoFiles);
    }
    if let Some(loc) = draft.location.filter(|l| !l.is_valid()) {
        return Err(BuildError::InvalidLocation {
            lat: loc.lat,
            lng: loc.lng,
        });
    }

    let timestamp = iso_timestamp(now);
    let salt = generate_salt()?;
    let combined_hash =
        generate_combined_hash(&draft.files, &timestamp, draft.location.as_ref(), &salt);
    debug!(%id, %combined_hash, "sealed commitment");

    Ok(ProofRecord {
        id,
        title,
        description: draft.description.trim().to_string(),
        category: draft.category,
        files: draft.files,
        timestamp,
        location: draft.location,
        combined_hash,
        salt,
        created_at,
    })
}
