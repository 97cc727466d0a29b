use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracechain_core::{BatchId, EvidenceRecord, EvidenceStatus};

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum JournalEntry {
    /// A newly stored evidence record.
    Evidence {
        /// The record as inserted.
        record: EvidenceRecord,
    },
    /// A proof status change for an earlier record.
    Status {
        /// Record the change applies to.
        #[serde(rename = "batchId")]
        batch_id: BatchId,
        /// New status.
        status: EvidenceStatus,
        /// When the change was written.
        #[serde(rename = "recordedAt")]
        recorded_at: DateTime<Utc>,
    },
}

impl JournalEntry {
    /// Status entry stamped with the current time.
    pub fn status(batch_id: BatchId, status: EvidenceStatus) -> Self {
        JournalEntry::Status {
            batch_id,
            status,
            recorded_at: Utc::now(),
        }
    }

    /// Record the entry refers to.
    pub fn batch_id(&self) -> BatchId {
        match self {
            JournalEntry::Evidence { record } => record.batch_id,
            JournalEntry::Status { batch_id, .. } => *batch_id,
        }
    }
}
