use serde_json::Value;
use thiserror::Error;

use crate::ids::ShipmentId;

/// Reason a batch upload was rejected. The display text is returned to the
/// caller verbatim.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadRejection {
    /// `shipmentId` is missing, `null`, `false` or the empty string.
    #[error("shipmentId is required")]
    MissingShipmentId,
    /// `shipmentId` is present but neither a non-negative integer nor a string.
    #[error("shipmentId must be a non-negative integer or a string")]
    InvalidShipmentId,
    /// `data` is missing or not a JSON object.
    #[error("data must be a valid JSON object")]
    InvalidData,
    /// `metadata` is present but not a string.
    #[error("metadata must be a string")]
    InvalidMetadata,
}

/// Checks a batch upload body without touching it.
///
/// Rules run in order and the first failure is returned:
/// 1. `shipmentId` is present (`0` counts as present) and has a usable type;
/// 2. `data` is a JSON object (arrays, scalars and `null` are refused);
/// 3. `metadata`, when given, is a string.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use tracechain_core::{validate_batch_payload, PayloadRejection};
///
/// assert!(validate_batch_payload(&json!({"shipmentId": 0, "data": {}})).is_ok());
/// assert_eq!(
///     validate_batch_payload(&json!({"data": {}})),
///     Err(PayloadRejection::MissingShipmentId)
/// );
/// ```
pub fn validate_batch_payload(body: &Value) -> Result<(), PayloadRejection> {
    match body.get("shipmentId") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {
            return Err(PayloadRejection::MissingShipmentId)
        }
        Some(Value::String(s)) if s.is_empty() => return Err(PayloadRejection::MissingShipmentId),
        Some(value) if ShipmentId::from_json(value).is_none() => {
            return Err(PayloadRejection::InvalidShipmentId)
        }
        Some(_) => {}
    }

    if !matches!(body.get("data"), Some(Value::Object(_))) {
        return Err(PayloadRejection::InvalidData);
    }

    match body.get("metadata") {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(PayloadRejection::InvalidMetadata),
    }
}

/// A validated batch upload.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPayload {
    /// Shipment the batch belongs to.
    pub shipment_id: ShipmentId,
    /// Uploaded measurements; always a JSON object.
    pub data: Value,
    /// Free-form metadata used when the shipment has to be created.
    pub metadata: Option<String>,
}

impl BatchPayload {
    /// Validates a request body and takes it apart.
    pub fn from_body(body: Value) -> Result<Self, PayloadRejection> {
        validate_batch_payload(&body)?;

        let Value::Object(mut fields) = body else {
            return Err(PayloadRejection::MissingShipmentId);
        };
        let shipment_id = fields
            .get("shipmentId")
            .and_then(ShipmentId::from_json)
            .ok_or(PayloadRejection::MissingShipmentId)?;
        let data = match fields.remove("data") {
            Some(data @ Value::Object(_)) => data,
            _ => return Err(PayloadRejection::InvalidData),
        };
        let metadata = match fields.remove("metadata") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };

        Ok(Self {
            shipment_id,
            data,
            metadata,
        })
    }

    /// Metadata, or the empty string when none was sent.
    pub fn metadata_or_default(&self) -> &str {
        self.metadata.as_deref().unwrap_or("")
    }
}
