//! Structural fingerprints for assembled descriptions.

use sha2::{Digest, Sha256};

/// Hashes the canonical JSON form of a value.
///
/// Object keys serialize in sorted order, so two structurally identical
/// values always produce the same fingerprint.
#[must_use]
pub fn fingerprint_json(value: &serde_json::Value) -> String {
    let json = serde_json::to_string(value).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}
