use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracechain_canonical::{ContentHash, TxHash};
use uuid::Uuid;

use crate::ids::ShipmentId;

/// Identifier the durable store assigns to an evidence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for BatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Ledger acknowledgement of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReceipt {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: u64,
}

/// Whether the batch's proof made it onto the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum EvidenceStatus {
    /// Stored; proof not yet confirmed.
    Pending,
    /// Proof confirmed by the ledger.
    Confirmed(LedgerReceipt),
    /// Proof submission failed; the record has no on-chain counterpart.
    Failed {
        /// Error reported by the ledger client.
        reason: String,
    },
}

impl EvidenceStatus {
    /// Returns `true` once the ledger has confirmed the proof.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, EvidenceStatus::Confirmed(_))
    }
}

/// Evidence record before the store has assigned it an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceDraft {
    /// Shipment the batch belongs to.
    pub shipment_id: ShipmentId,
    /// Content hash of `normalized_data`.
    pub hash: ContentHash,
    /// Canonical serialization of the uploaded data.
    pub normalized_data: String,
    /// Metadata supplied with the upload (empty if none).
    pub metadata: String,
    /// When the batch was received.
    pub created_at: DateTime<Utc>,
}

/// Stored evidence for one uploaded batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    /// Store-assigned identifier.
    pub batch_id: BatchId,
    /// Shipment the batch belongs to.
    pub shipment_id: ShipmentId,
    /// Content hash of `normalized_data`.
    pub hash: ContentHash,
    /// Canonical serialization of the uploaded data.
    pub normalized_data: String,
    /// Metadata supplied with the upload.
    pub metadata: String,
    /// When the batch was received.
    pub created_at: DateTime<Utc>,
    /// Proof status.
    pub status: EvidenceStatus,
}

impl EvidenceRecord {
    /// Builds a pending record from a draft.
    pub fn from_draft(batch_id: BatchId, draft: EvidenceDraft) -> Self {
        Self {
            batch_id,
            shipment_id: draft.shipment_id,
            hash: draft.hash,
            normalized_data: draft.normalized_data,
            metadata: draft.metadata,
            created_at: draft.created_at,
            status: EvidenceStatus::Pending,
        }
    }

    /// Recomputes the hash of `normalized_data` and compares it with `hash`.
    pub fn hash_is_consistent(&self) -> bool {
        self.hash.matches(self.normalized_data.as_bytes())
    }
}
