//! In-memory view of evidence records shared by both backends.

use std::collections::HashMap;
use tracechain_core::{BatchId, EvidenceRecord, EvidenceStatus, ShipmentId};
use tracechain_journal::JournalEntry;

#[derive(Debug, Default)]
pub(crate) struct EvidenceIndex {
    records: Vec<EvidenceRecord>,
    by_id: HashMap<BatchId, usize>,
}

impl EvidenceIndex {
    pub(crate) fn insert(&mut self, record: EvidenceRecord) {
        self.by_id.insert(record.batch_id, self.records.len());
        self.records.push(record);
    }

    pub(crate) fn contains(&self, batch_id: BatchId) -> bool {
        self.by_id.contains_key(&batch_id)
    }

    /// Returns the updated record, or `None` if the id is unknown.
    pub(crate) fn set_status(
        &mut self,
        batch_id: BatchId,
        status: EvidenceStatus,
    ) -> Option<EvidenceRecord> {
        let idx = *self.by_id.get(&batch_id)?;
        let record = &mut self.records[idx];
        record.status = status;
        Some(record.clone())
    }

    pub(crate) fn get(&self, batch_id: BatchId) -> Option<EvidenceRecord> {
        self.by_id
            .get(&batch_id)
            .map(|idx| self.records[*idx].clone())
    }

    /// Newest first; records with equal timestamps keep reverse insertion order.
    pub(crate) fn list_by_shipment(&self, shipment_id: &ShipmentId) -> Vec<EvidenceRecord> {
        let key = shipment_id.key();
        let mut matches: Vec<EvidenceRecord> = self
            .records
            .iter()
            .rev()
            .filter(|record| record.shipment_id.key() == key)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches
    }

    /// Applies a replayed journal entry. Status entries for unknown records
    /// are ignored and reported as `false`.
    pub(crate) fn apply(&mut self, entry: JournalEntry) -> bool {
        match entry {
            JournalEntry::Evidence { record } => {
                self.insert(record);
                true
            }
            JournalEntry::Status {
                batch_id, status, ..
            } => self.set_status(batch_id, status).is_some(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}
