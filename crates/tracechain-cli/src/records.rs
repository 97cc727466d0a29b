//! Replays a journal into evidence records without opening it for writing.

use std::collections::HashMap;
use tracechain_core::{BatchId, EvidenceRecord};
use tracechain_journal::{JournalEntry, JournalReader, ReadMode};

/// Records in the order they were first written, with their latest status.
pub fn load(journal: &str) -> Result<Vec<EvidenceRecord>, Box<dyn std::error::Error>> {
    let mut reader = JournalReader::open(journal, ReadMode::Strict)
        .map_err(|e| format!("Failed to open journal {}: {}", journal, e))?;

    let mut records: Vec<EvidenceRecord> = Vec::new();
    let mut positions: HashMap<BatchId, usize> = HashMap::new();

    while let Some(entry) = reader.read_entry()? {
        match entry {
            JournalEntry::Evidence { record } => {
                positions.insert(record.batch_id, records.len());
                records.push(record);
            }
            JournalEntry::Status {
                batch_id, status, ..
            } => match positions.get(&batch_id) {
                Some(&i) => records[i].status = status,
                None => eprintln!("Warning: status entry for unknown batch {}", batch_id),
            },
        }
    }

    Ok(records)
}
