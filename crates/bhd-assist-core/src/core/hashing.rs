// crates/bhd-assist-core/src/core/hashing.rs
// ============================================================================
// Module: BHD Assist Audit Hashing
// Description: Canonical JSON digests for audit chaining and text fingerprints.
// Purpose: Make audit records tamper-evident without logging raw content.
// Dependencies: serde, serde_jcs, sha2, thiserror
// ============================================================================

//! ## Overview
//! Audit records are linked by SHA-256 over `prev_hash || canonical(record)`,
//! where canonical JSON follows RFC 8785 (JCS) so digests are stable across
//! serializers. Candidate text is never logged; callers record
//! [`fingerprint`] instead so identical content can still be correlated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Previous-hash value used for the first record of a chain.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while computing canonical digests.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Digests
// ============================================================================

/// Returns RFC 8785 canonical JSON bytes for a value.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Computes the chain digest linking `payload` to `prev_hash`.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the payload cannot be
/// canonicalized.
pub fn chain_digest<T: Serialize + ?Sized>(
    prev_hash: &str,
    payload: &T,
) -> Result<String, HashError> {
    let canonical = canonical_json_bytes(payload)?;
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(&canonical);
    Ok(hex_encode(&hasher.finalize()))
}

/// Returns the lowercase hex SHA-256 of a text value.
#[must_use]
pub fn fingerprint(text: &str) -> String {
    hex_encode(&Sha256::digest(text.as_bytes()))
}

/// Encodes bytes as lowercase hex.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::GENESIS_HASH;
    use super::chain_digest;
    use super::fingerprint;

    #[test]
    fn fingerprint_matches_known_sha256() {
        assert_eq!(
            fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn chain_digest_ignores_key_order_and_depends_on_prev() -> Result<(), String> {
        let left = chain_digest(GENESIS_HASH, &json!({"a": 1, "b": 2}))
            .map_err(|err| err.to_string())?;
        let right = chain_digest(GENESIS_HASH, &json!({"b": 2, "a": 1}))
            .map_err(|err| err.to_string())?;
        let other = chain_digest(&left, &json!({"a": 1, "b": 2})).map_err(|err| err.to_string())?;
        assert_eq!(left, right);
        assert_ne!(left, other);
        Ok(())
    }
}
