//! Durable storage for evidence records.
//!
//! The [`EvidenceStore`] trait is the seam the ingestion service writes
//! through. Records are insert-only: the store assigns the [`BatchId`], and
//! afterwards only the proof status of a record may change.
//!
//! Backends:
//! - [`MemoryEvidenceStore`]: process-local, for tests and development
//! - [`JournalEvidenceStore`]: append-only journal file, replayed on open

#![deny(missing_docs)]

/// Error types for store operations.
pub mod error;
mod index;
/// Journal-backed store.
pub mod journal;
/// In-memory store.
pub mod memory;

use async_trait::async_trait;
use tracechain_core::{BatchId, EvidenceDraft, EvidenceRecord, EvidenceStatus, ShipmentId};

pub use error::StoreError;
pub use journal::JournalEvidenceStore;
pub use memory::MemoryEvidenceStore;

/// Insert-only evidence storage.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Stores a new record with status `pending` and returns its identifier.
    /// Identical drafts produce distinct records.
    async fn insert(&self, draft: EvidenceDraft) -> Result<BatchId, StoreError>;

    /// Replaces the proof status of an existing record.
    async fn update_status(
        &self,
        batch_id: BatchId,
        status: EvidenceStatus,
    ) -> Result<EvidenceRecord, StoreError>;

    /// Fetches one record.
    async fn get(&self, batch_id: BatchId) -> Result<Option<EvidenceRecord>, StoreError>;

    /// Records for a shipment, newest first. Matching uses
    /// [`ShipmentId::key`], so `7` and `"7"` select the same records.
    async fn list_by_shipment(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Vec<EvidenceRecord>, StoreError>;
}
