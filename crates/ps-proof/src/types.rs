//! Proof data structures.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors raised while decoding a stored data URI.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("data URI must start with 'data:'")]
    MissingScheme,

    #[error("data URI has no ',' separating header and payload")]
    MissingPayload,

    #[error("data URI payload is not base64-encoded")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// One file bundled into a proof.
///
/// The digest is computed once in [`EvidenceFile::capture`] and stored; it is
/// never recomputed from the content on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceFile {
    /// Display name (not part of the commitment)
    pub name: String,

    /// Media type, e.g. "image/jpeg"
    #[serde(rename = "type", default)]
    pub content_type: String,

    /// File content as `data:<type>;base64,<payload>`
    #[serde(rename = "dataUrl")]
    pub data_url: String,

    /// Lowercase hex SHA-256 of the content
    #[serde(rename = "hash")]
    pub digest: String,
}

impl EvidenceFile {
    /// Capture a file from its raw bytes, hashing the content once.
    pub fn capture(
        name: impl Into<String>,
        content_type: impl Into<String>,
        content: &[u8],
    ) -> Self {
        let content_type = content_type.into();
        let digest = ps_digest::digest(content);
        Self {
            name: name.into(),
            data_url: encode_data_url(&content_type, content),
            content_type,
            digest,
        }
    }

    /// Images are rendered inline; everything else as a document.
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Decode the stored content bytes.
    pub fn content(&self) -> Result<Vec<u8>, EncodingError> {
        decode_data_url(&self.data_url)
    }
}

/// Render bytes as a base64 data URI.
pub fn encode_data_url(content_type: &str, content: &[u8]) -> String {
    let media = if content_type.is_empty() {
        DEFAULT_CONTENT_TYPE
    } else {
        content_type
    };
    format!("data:{media};base64,{}", BASE64_STANDARD.encode(content))
}

/// Decode a base64 data URI back into bytes.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, EncodingError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or(EncodingError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(EncodingError::MissingPayload)?;
    if !header.ends_with(";base64") {
        return Err(EncodingError::NotBase64);
    }
    BASE64_STANDARD
        .decode(payload)
        .map_err(|e| EncodingError::InvalidBase64(e.to_string()))
}

/// GPS coordinate in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    /// Build a location, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let location = Self { lat, lng };
        location.is_valid().then_some(location)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Fixed category catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Category {
    Apartment,
    Vehicle,
    Purchase,
    Communication,
    Contract,
    Workplace,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Apartment,
        Category::Vehicle,
        Category::Purchase,
        Category::Communication,
        Category::Contract,
        Category::Workplace,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Apartment => "apartment",
            Category::Vehicle => "vehicle",
            Category::Purchase => "purchase",
            Category::Communication => "communication",
            Category::Contract => "contract",
            Category::Workplace => "workplace",
            Category::Other => "other",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Category::Apartment => "\u{1F3E0}",
            Category::Vehicle => "\u{1F697}",
            Category::Purchase => "\u{1F4E6}",
            Category::Communication => "\u{1F4AC}",
            Category::Contract => "\u{1F4C4}",
            Category::Workplace => "\u{1F4BC}",
            Category::Other => "\u{1F4C1}",
        }
    }

    /// Lenient lookup: unknown ids map to [`Category::Other`].
    pub fn from_id(id: &str) -> Self {
        id.parse().unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown category '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::from_id(&raw))
    }
}

/// The persisted unit: files, capture time, location and metadata bound by
/// one combined hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofRecord {
    /// Opaque identifier, stable across edits
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: Category,

    /// Evidence files in submission order (order is part of the commitment)
    pub files: Vec<EvidenceFile>,

    /// Capture time, e.g. "2024-01-01T00:00:00.000Z"
    pub timestamp: String,

    #[serde(default)]
    pub location: Option<Location>,

    /// Commitment over files, timestamp, location and salt
    pub combined_hash: String,

    /// 16 random bytes, hex-encoded
    pub salt: String,

    /// First-creation time, preserved across edits
    pub created_at: String,
}

impl ProofRecord {
    /// Get a file by index.
    pub fn file(&self, index: usize) -> Option<&EvidenceFile> {
        self.files.get(index)
    }

    /// Parsed `created_at`, if it is a valid RFC 3339 time.
    pub fn created_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// The user-editable inputs of a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProofDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub files: Vec<EvidenceFile>,
    pub location: Option<Location>,
}

impl ProofDraft {
    /// Start a draft from an existing record, for editing.
    pub fn from_record(record: &ProofRecord) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            category: record.category,
            files: record.files.clone(),
            location: record.location,
        }
    }
}

/// Render a time the way it enters the commitment: UTC, milliseconds, `Z`.
pub fn iso_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
