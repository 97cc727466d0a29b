use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a tracked shipment.
///
/// Callers may send either a JSON integer or a string. The original form is
/// kept so responses echo it back; [`ShipmentId::key`] gives the form used
/// for lookups, so `7` and `"7"` address the same shipment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShipmentId {
    /// Non-negative integer identifier.
    Number(u64),
    /// Free-form string identifier.
    Text(String),
}

impl ShipmentId {
    /// Reads an identifier from a JSON value. Returns `None` for anything but
    /// a non-negative integer or a non-empty string.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(ShipmentId::Number),
            Value::String(s) if !s.is_empty() => Some(ShipmentId::Text(s.clone())),
            _ => None,
        }
    }

    /// Parses a URL path segment: decimal digits become a number.
    pub fn from_path_segment(segment: &str) -> Self {
        match segment.parse::<u64>() {
            Ok(n) if segment.bytes().all(|b| b.is_ascii_digit()) => ShipmentId::Number(n),
            _ => ShipmentId::Text(segment.to_string()),
        }
    }

    /// Integer value of the identifier, if it has one.
    pub fn as_integer(&self) -> Option<u128> {
        match self {
            ShipmentId::Number(n) => Some(u128::from(*n)),
            ShipmentId::Text(s) if s.bytes().all(|b| b.is_ascii_digit()) => s.parse().ok(),
            ShipmentId::Text(_) => None,
        }
    }

    /// Lookup key shared by every spelling of the same identifier.
    pub fn key(&self) -> String {
        match self.as_integer() {
            Some(n) => n.to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipmentId::Number(n) => write!(f, "{}", n),
            ShipmentId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ShipmentId {
    fn from(value: u64) -> Self {
        ShipmentId::Number(value)
    }
}
