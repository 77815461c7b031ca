//! Deterministic GUID derivation compatible with the IDE's `workspaceHash` macro
//!
//! The id is the first 16 bytes of the SHA-256 digest of the UTF-8 input, with the
//! version nibble and variant bits overwritten. Bytes are laid out the way the
//! IDE's GUID type stores them (first three groups little-endian), so byte 7
//! carries the version nibble and byte 8 the variant.

use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// GUID-shaped identifier derived from a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StableId(Uuid);

impl StableId {
    /// Raw bytes in the IDE's storage order
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_bytes_le()
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Compute the stable id of `input`
pub fn stable_id(input: &str) -> StableId {
    let digest = Sha256::digest(input.as_bytes());

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);

    // Version 4 in the high nibble of byte 7, RFC 4122 variant in byte 8
    bytes[7] = (bytes[7] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    StableId(Uuid::from_bytes_le(bytes))
}
