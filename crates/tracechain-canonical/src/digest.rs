use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::validation::ValidationError;

/// Marker prepended to the hex digest so downstream systems can tell a hash
/// value from a raw hex blob.
pub const HASH_PREFIX: &str = "0x";

/// SHA-256 content hash, rendered as `0x` followed by 64 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hashes the given bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Parses a `0x`-prefixed hex digest. Upper-case hex digits are accepted
    /// and normalized to lower case.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let re = Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("invalid regex");
        if !re.is_match(&s) {
            return Err(ValidationError::PatternMismatch {
                field: "content_hash",
                value: s,
            });
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&s[HASH_PREFIX.len()..], &mut bytes).map_err(|_| {
            ValidationError::PatternMismatch {
                field: "content_hash",
                value: s.clone(),
            }
        })?;
        Ok(Self(bytes))
    }

    /// Raw digest bytes, e.g. for use as a `bytes32` contract argument.
    pub fn to_bytes32(&self) -> [u8; 32] {
        self.0
    }

    /// Wraps raw digest bytes, e.g. a `bytes32` read back from a contract.
    pub fn from_bytes32(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns `true` if `bytes` hash to this value.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        Self::of_bytes(bytes) == *self
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", HASH_PREFIX, hex::encode(self.0))
    }
}

impl From<ContentHash> for String {
    fn from(value: ContentHash) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ContentHash {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
