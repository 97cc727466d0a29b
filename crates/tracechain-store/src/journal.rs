use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracechain_core::{BatchId, EvidenceDraft, EvidenceRecord, EvidenceStatus, ShipmentId};
use tracechain_journal::{JournalEntry, JournalReader, JournalWriter, ReadMode, WriteOptions};

use crate::index::EvidenceIndex;
use crate::{EvidenceStore, StoreError};

/// Evidence store backed by an append-only journal file.
///
/// The journal is replayed into memory on open; reads are served from memory
/// and every write appends one entry before the in-memory view changes.
///
/// Writes hold the writer lock for the append (and fsync, when enabled) and
/// take the index lock only to apply the change, so reads never wait on
/// disk.
pub struct JournalEvidenceStore {
    path: PathBuf,
    writer: Arc<Mutex<JournalWriter>>,
    index: Arc<RwLock<EvidenceIndex>>,
}

impl JournalEvidenceStore {
    /// Largest journal entry, in bytes, the store can append.
    pub const MAX_ENTRY_SIZE: usize = tracechain_journal::frame::MAX_PAYLOAD_SIZE as usize;

    /// Opens (or creates) the journal at `path` and replays it.
    ///
    /// A partial frame left at the tail by an interrupted append is cut off
    /// so new entries start on a frame boundary.
    pub fn open<P: AsRef<Path>>(path: P, sync: bool) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut index = EvidenceIndex::default();

        let existing_len = match std::fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        if existing_len > 0 {
            let mut reader = JournalReader::open(&path, ReadMode::Permissive)?;
            let mut orphaned = 0usize;
            while let Some(entry) = reader.read_entry()? {
                if !index.apply(entry) {
                    orphaned += 1;
                }
            }
            if orphaned > 0 {
                tracing::warn!(
                    path = %path.display(),
                    orphaned,
                    "Ignored status entries for unknown evidence records"
                );
            }

            let valid_len = reader.position();
            if valid_len < existing_len {
                tracing::warn!(
                    path = %path.display(),
                    valid_len,
                    existing_len,
                    "Truncating partial frame at journal tail"
                );
                OpenOptions::new()
                    .write(true)
                    .open(&path)?
                    .set_len(valid_len)?;
            }
        }

        let writer = JournalWriter::open(
            &path,
            WriteOptions {
                sync,
                ..WriteOptions::default()
            },
        )?;

        tracing::info!(
            path = %path.display(),
            records = index.len(),
            "Opened evidence journal"
        );

        Ok(Self {
            path,
            writer: Arc::new(Mutex::new(writer)),
            index: Arc::new(RwLock::new(index)),
        })
    }

    /// Path of the backing journal.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` on a blocking thread with the writer locked.
    async fn with_writer<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut JournalWriter, &RwLock<EvidenceIndex>) -> Result<T, StoreError>
            + Send
            + 'static,
    {
        let writer = Arc::clone(&self.writer);
        let index = Arc::clone(&self.index);
        tokio::task::spawn_blocking(move || {
            let mut writer = writer.lock();
            f(&mut writer, &index)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl EvidenceStore for JournalEvidenceStore {
    async fn insert(&self, draft: EvidenceDraft) -> Result<BatchId, StoreError> {
        self.with_writer(move |writer, index| {
            let record = EvidenceRecord::from_draft(BatchId::generate(), draft);
            let batch_id = record.batch_id;
            writer.append_entry(&JournalEntry::Evidence {
                record: record.clone(),
            })?;
            index.write().insert(record);
            Ok(batch_id)
        })
        .await
    }

    async fn update_status(
        &self,
        batch_id: BatchId,
        status: EvidenceStatus,
    ) -> Result<EvidenceRecord, StoreError> {
        self.with_writer(move |writer, index| {
            if !index.read().contains(batch_id) {
                return Err(StoreError::NotFound(batch_id));
            }
            writer.append_entry(&JournalEntry::status(batch_id, status.clone()))?;
            index
                .write()
                .set_status(batch_id, status)
                .ok_or(StoreError::NotFound(batch_id))
        })
        .await
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
