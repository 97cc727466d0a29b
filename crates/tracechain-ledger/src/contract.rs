//! Shipment and proof state as the supply-chain contract stores it.
//!
//! Return layouts decoded here:
//!
//! ```text
//! getShipment(uint256) -> (uint256 id, address manufacturer, string metadata, uint8 status)
//! getProofs(uint256)   -> (bytes32 hash, address recorder, uint256 timestamp)[]
//! ```
//!
//! A shipment slot that was never written has a zero `manufacturer`, whether
//! the contract reverts or returns the zeroed struct.

use serde::{Deserialize, Serialize};
use tracechain_canonical::{Address, ContentHash};
use tracechain_core::ShipmentId;

use crate::abi::{self, WORD};
use crate::LedgerError;

/// Lifecycle stage of a shipment on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShipmentStatus {
    /// Created, no proof recorded yet.
    Created,
    /// At least one proof recorded.
    InTransit,
    /// Delivery confirmed.
    Delivered,
}

impl ShipmentStatus {
    /// Maps the contract's `uint8` status code.
    pub fn from_code(code: u128) -> Result<Self, LedgerError> {
        match code {
            0 => Ok(ShipmentStatus::Created),
            1 => Ok(ShipmentStatus::InTransit),
            2 => Ok(ShipmentStatus::Delivered),
            other => Err(LedgerError::InvalidResponse(format!(
                "unknown shipment status {}",
                other
            ))),
        }
    }
}

/// A shipment read back from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainShipment {
    /// Shipment identifier.
    pub id: ShipmentId,
    /// Account that created the shipment.
    pub manufacturer: Address,
    /// Metadata given at creation.
    pub metadata: String,
    /// Current lifecycle stage.
    pub status: ShipmentStatus,
}

/// A proof read back from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainProof {
    /// Content hash anchored by the proof.
    pub hash: ContentHash,
    /// Account that recorded the proof.
    pub recorder: Address,
    /// Block timestamp of the recording, in unix seconds.
    pub timestamp: u64,
}

/// Identifier for a contract `uint256`, numeric when it fits in a `u64`.
fn shipment_id_from_uint(value: u128) -> ShipmentId {
    match u64::try_from(value) {
        Ok(n) => ShipmentId::Number(n),
        Err(_) => ShipmentId::Text(value.to_string()),
    }
}

/// Offset of the tuple a single dynamic return value points at.
fn tuple_base(output: &[u8]) -> Result<usize, LedgerError> {
    abi::decode_usize(abi::word_at(output, 0)?)
}

/// Whether `getShipment` output describes a created shipment.
///
/// Only the head of the tuple is inspected.
pub fn shipment_is_registered(output: &[u8]) -> Result<bool, LedgerError> {
    if output.is_empty() {
        return Ok(false);
    }
    let base = tuple_base(output)?;
    let manufacturer = abi::word_at(output, base.saturating_add(WORD))?;
    Ok(!abi::is_zero(manufacturer))
}

/// Decodes `getShipment` output. `None` for a shipment never created.
pub fn decode_shipment(output: &[u8]) -> Result<Option<OnChainShipment>, LedgerError> {
    if !shipment_is_registered(output)? {
        return Ok(None);
    }
    let base = tuple_base(output)?;
    let field = |i: usize| abi::word_at(output, base.saturating_add(i * WORD));

    let id = abi::decode_uint(field(0)?)?;
    let manufacturer = abi::decode_address(field(1)?)?;
    let metadata_offset = abi::decode_usize(field(2)?)?;
    let metadata = abi::decode_string(output, base.saturating_add(metadata_offset))?;
    let status = ShipmentStatus::from_code(abi::decode_uint(field(3)?)?)?;

    Ok(Some(OnChainShipment {
        id: shipment_id_from_uint(id),
        manufacturer,
        metadata,
        status,
    }))
}

/// Words per encoded proof.
const PROOF_WORDS: usize = 3;

/// Decodes `getProofs` output, oldest proof first.
pub fn decode_proofs(output: &[u8]) -> Result<Vec<OnChainProof>, LedgerError> {
    if output.is_empty() {
        return Ok(Vec::new());
    }
    let base = tuple_base(output)?;
    let count = abi::decode_usize(abi::word_at(output, base)?)?;
    let first = base.saturating_add(WORD);
    let available = output.len().saturating_sub(first) / (PROOF_WORDS * WORD);
    if count > available {
        return Err(LedgerError::InvalidResponse(format!(
            "malformed ABI data: {} proofs declared, {} present",
            count, available
        )));
    }

    (0..count)
        .map(|i| -> Result<OnChainProof, LedgerError> {
            let at = first + i * PROOF_WORDS * WORD;
            let timestamp = abi::decode_uint(abi::word_at(output, at + 2 * WORD)?)?;
            Ok(OnChainProof {
                hash: ContentHash::from_bytes32(*abi::word_at(output, at)?),
                recorder: abi::decode_address(abi::word_at(output, at + WORD)?)?,
                timestamp: u64::try_from(timestamp).map_err(|_| {
                    LedgerError::InvalidResponse(format!("timestamp {} out of range", timestamp))
                })?,
            })
        })
        .collect()
}
