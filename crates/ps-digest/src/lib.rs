//! SHA-256 digests rendered as lowercase hex.
//!
//! Every hash in ProofStamp goes through this crate: per-file digests at
//! capture time, the combined commitment, and re-verification.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

type HashState = Sha256;

/// Length of a rendered digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

const READ_CHUNK: usize = 64 * 1024;

/// Hash a byte slice.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = HashState::new();
    hasher.update(bytes);
    finish(hasher)
}

/// Hash everything a reader yields until EOF.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = HashState::new();
    let mut buffer = vec![0u8; READ_CHUNK];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(finish(hasher))
}

/// Open `path` and hash its full content.
pub fn digest_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let file = File::open(path.as_ref())?;
    digest_reader(file)
}

/// True if `value` looks like a digest produced by this crate.
pub fn is_hex_digest(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn finish(hasher: HashState) -> String {
    hex::encode(hasher.finalize())
}
