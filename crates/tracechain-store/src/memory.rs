use async_trait::async_trait;
use parking_lot::RwLock;
use tracechain_core::{BatchId, EvidenceDraft, EvidenceRecord, EvidenceStatus, ShipmentId};

use crate::index::EvidenceIndex;
use crate::{EvidenceStore, StoreError};

/// Process-local evidence store. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryEvidenceStore {
    index: RwLock<EvidenceIndex>,
}

impl MemoryEvidenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EvidenceStore for MemoryEvidenceStore {
    async fn insert(&self, draft: EvidenceDraft) -> Result<BatchId, StoreError> {
        let batch_id = BatchId::generate();
        self.index
            .write()
            .insert(EvidenceRecord::from_draft(batch_id, draft));
        Ok(batch_id)
    }

    async fn update_status(
        &self,
        batch_id: BatchId,
        status: EvidenceStatus,
    ) -> Result<EvidenceRecord, StoreError> {
        self.index
            .write()
            .set_status(batch_id, status)
            .ok_or(StoreError::NotFound(batch_id))
    }

    async fn get(&self, batch_id: BatchId) -> Result<Option<EvidenceRecord>, StoreError> {
        Ok(self.index.read().get(batch_id))
    }

    async fn list_by_shipment(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Vec<EvidenceRecord>, StoreError> {
        Ok(self.index.read().list_by_shipment(shipment_id))
    }
}
