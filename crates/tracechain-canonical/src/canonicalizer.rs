use canonical_json::to_string;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::digest::ContentHash;
use crate::number::format_json_number;
use crate::validation::ValidationError;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Input was not a JSON object. Callers validate payloads first, so this
    /// only fires when a caller skips validation.
    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was supplied instead.
        found: &'static str,
    },
    /// A string could not be encoded.
    #[error("string encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
    /// The recursive canonicalizer rejected the input.
    #[error("other error: {0}")]
    Other(String),
}

/// Canonicalization profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanonicalProfile {
    /// Sorted top-level key list used as the property allowlist at every depth.
    #[default]
    Legacy,
    /// Keys sorted recursively at every depth.
    Sorted,
}

impl CanonicalProfile {
    /// Stable profile name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalProfile::Legacy => "legacy",
            CanonicalProfile::Sorted => "sorted",
        }
    }
}

impl fmt::Display for CanonicalProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalProfile {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(CanonicalProfile::Legacy),
            "sorted" => Ok(CanonicalProfile::Sorted),
            other => Err(ValidationError::PatternMismatch {
                field: "canonical_profile",
                value: other.to_string(),
            }),
        }
    }
}

/// Normalized string and its content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedJson {
    /// Hash of the normalized string's UTF-8 bytes.
    pub hash: ContentHash,
    /// Canonical serialization of the input object.
    pub normalized: String,
}

/// Canonicalizer that emits deterministic strings for JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct Canonicalizer {
    profile: CanonicalProfile,
}

impl Canonicalizer {
    /// Creates a new canonicalizer for the provided profile.
    pub fn new(profile: CanonicalProfile) -> Self {
        Self { profile }
    }

    /// Profile this canonicalizer applies.
    pub fn profile(&self) -> CanonicalProfile {
        self.profile
    }

    /// Produces the normalized string for a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::NotAnObject`] for arrays and scalars.
    pub fn canonicalize(&self, value: &Value) -> Result<String, CanonicalizationError> {
        let map = value.as_object().ok_or(CanonicalizationError::NotAnObject {
            found: json_type(value),
        })?;

        match self.profile {
            CanonicalProfile::Legacy => {
                let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
                // JavaScript sorts strings by UTF-16 code units, not code points.
                keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));
                let mut out = String::new();
                write_object(&mut out, map, &keys)?;
                Ok(out)
            }
            CanonicalProfile::Sorted => {
                to_string(value).map_err(|err| CanonicalizationError::Other(err.to_string()))
            }
        }
    }

    /// Canonicalizes a JSON object and hashes the result.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tracechain_canonical::Canonicalizer;
    /// use serde_json::json;
    ///
    /// let hashed = Canonicalizer::default().hash_json(&json!({"b": 2, "a": 1}))?;
    /// assert_eq!(hashed.normalized, r#"{"a":1,"b":2}"#);
    /// assert!(hashed.hash.to_string().starts_with("0x"));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn hash_json(&self, value: &Value) -> Result<HashedJson, CanonicalizationError> {
        let normalized = self.canonicalize(value)?;
        let hash = ContentHash::of_bytes(normalized.as_bytes());
        Ok(HashedJson { hash, normalized })
    }
}

fn write_value(
    out: &mut String,
    value: &Value,
    allowlist: &[&str],
) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_json_number(n)),
        Value::String(s) => out.push_str(&serde_json::to_string(s)?),
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_value(out, item, allowlist)?;
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map, allowlist)?,
    }
    Ok(())
}

/// Members are emitted in allowlist order; names outside the list are dropped.
fn write_object(
    out: &mut String,
    map: &Map<String, Value>,
    allowlist: &[&str],
) -> Result<(), CanonicalizationError> {
    out.push('{');
    let mut first = true;
    for key in allowlist {
        let Some(child) = map.get(*key) else {
            continue;
        };
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&serde_json::to_string(key)?);
        out.push(':');
        write_value(out, child, allowlist)?;
    }
    out.push('}');
    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
