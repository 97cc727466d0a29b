use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracechain_canonical::{
    CanonicalProfile, CanonicalizationError, Canonicalizer, ContentHash, TxHash,
};
use tracechain_core::{
    BatchId, BatchPayload, EvidenceDraft, EvidenceRecord, EvidenceStatus, LedgerReceipt,
    PayloadRejection, ShipmentId,
};
use tracechain_ledger::{Ledger, LedgerError, OnChainProof, OnChainShipment};
use tracechain_store::{EvidenceStore, StoreError};

use crate::locks::ShipmentLocks;

/// Message returned with every successful upload.
pub const UPLOAD_MESSAGE: &str = "Proof recorded on-chain and evidence stored";

/// Errors from the ingestion pipeline.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The request body failed validation. Nothing was written.
    #[error(transparent)]
    Validation(#[from] PayloadRejection),

    /// The batch data could not be canonicalized.
    #[error(transparent)]
    Canonical(#[from] CanonicalizationError),

    /// A ledger call failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// An evidence store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No evidence record has this identifier.
    #[error("batch {0} not found")]
    BatchNotFound(BatchId),

    /// Reconciliation was requested for a record whose proof is confirmed.
    #[error("batch {0} is already confirmed")]
    AlreadyConfirmed(BatchId),
}

/// Successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    /// Shipment, echoed as sent.
    pub shipment_id: ShipmentId,
    /// Content hash anchored on the ledger.
    pub hash: ContentHash,
    /// Proof transaction.
    pub tx_hash: TxHash,
    /// Block the proof transaction was included in.
    pub block_number: u64,
    /// Evidence record identifier.
    pub batch_id: BatchId,
    /// Human-readable summary.
    pub message: String,
}

/// Validates, hashes, stores and anchors uploaded batches.
///
/// Work for one shipment is serialized through [`ShipmentLocks`], so the
/// ledger's exists-then-create sequence cannot interleave within a process.
pub struct BatchIngestor {
    ledger: Arc<dyn Ledger>,
    store: Arc<dyn EvidenceStore>,
    canonicalizer: Canonicalizer,
    locks: ShipmentLocks,
}

impl BatchIngestor {
    /// Creates an ingestor over the given ledger and store.
    pub fn new(
        ledger: Arc<dyn Ledger>,
        store: Arc<dyn EvidenceStore>,
        profile: CanonicalProfile,
    ) -> Self {
        Self {
            ledger,
            store,
            canonicalizer: Canonicalizer::new(profile),
            locks: ShipmentLocks::new(),
        }
    }

    /// Canonicalization profile in use.
    pub fn profile(&self) -> CanonicalProfile {
        self.canonicalizer.profile()
    }

    /// Handles one upload body.
    ///
    /// Validation runs before anything else. The record is stored as pending
    /// before the proof is submitted; it ends up confirmed, or failed when
    /// the ledger call errors. A store failure means no proof is submitted.
    pub async fn ingest(&self, body: Value) -> Result<IngestOutcome, IngestError> {
        let payload = BatchPayload::from_body(body)?;
        let shipment_id = payload.shipment_id.clone();
        let _guard = self.locks.lock(&shipment_id).await;

        self.ensure_shipment(&shipment_id, payload.metadata_or_default())
            .await?;

        let hashed = self.canonicalizer.hash_json(&payload.data)?;
        let hash = hashed.hash;
        let batch_id = self
            .store
            .insert(EvidenceDraft {
                shipment_id: shipment_id.clone(),
                hash,
                normalized_data: hashed.normalized,
                metadata: payload.metadata_or_default().to_string(),
                created_at: Utc::now(),
            })
            .await?;
        tracing::debug!(
            shipment_id = %shipment_id,
            batch_id = %batch_id,
            hash = %hash,
            "Evidence stored"
        );

        let receipt = self.submit_proof(batch_id, &shipment_id, &hash).await?;

        Ok(IngestOutcome {
            shipment_id,
            hash,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            batch_id,
            message: UPLOAD_MESSAGE.to_string(),
        })
    }

    /// Resubmits the proof of a record that is not confirmed.
    pub async fn reconcile(&self, batch_id: BatchId) -> Result<EvidenceRecord, IngestError> {
        let record = self
            .store
            .get(batch_id)
            .await?
            .ok_or(IngestError::BatchNotFound(batch_id))?;
        let _guard = self.locks.lock(&record.shipment_id).await;

        // A concurrent reconcile may have finished while we waited.
        let record = self
            .store
            .get(batch_id)
            .await?
            .ok_or(IngestError::BatchNotFound(batch_id))?;
        if record.status.is_confirmed() {
            return Err(IngestError::AlreadyConfirmed(batch_id));
        }

        tracing::info!(
            shipment_id = %record.shipment_id,
            batch_id = %batch_id,
            previous = ?record.status,
            "Reconciling evidence record"
        );
        self.ensure_shipment(&record.shipment_id, &record.metadata)
            .await?;
        self.submit_proof(batch_id, &record.shipment_id, &record.hash)
            .await?;

        self.store
            .get(batch_id)
            .await?
            .ok_or(IngestError::BatchNotFound(batch_id))
    }

    /// The shipment as the ledger holds it.
    pub async fn shipment(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Option<OnChainShipment>, IngestError> {
        Ok(self.ledger.shipment(shipment_id).await?)
    }

    /// Proofs anchored on the ledger for a shipment, oldest first.
    pub async fn ledger_proofs(&self, shipment_id: &ShipmentId) -> Result<Vec<OnChainProof>, IngestError> {
        Ok(self.ledger.proofs(shipment_id).await?)
    }

    /// Evidence records for a shipment, newest first.
    pub async fn batches(&self, shipment_id: &ShipmentId) -> Result<Vec<EvidenceRecord>, IngestError> {
        Ok(self.store.list_by_shipment(shipment_id).await?)
    }

    async fn ensure_shipment(&self, shipment_id: &ShipmentId, metadata: &str) -> Result<(), IngestError> {
        if self.ledger.shipment_exists(shipment_id).await? {
            return Ok(());
        }
        let receipt = self.ledger.create_shipment(shipment_id, metadata).await?;
        tracing::info!(
            shipment_id = %shipment_id,
            tx_hash = %receipt.tx_hash,
            "Created shipment"
        );
        Ok(())
    }

    async fn submit_proof(
        &self,
        batch_id: BatchId,
        shipment_id: &ShipmentId,
        hash: &ContentHash,
    ) -> Result<LedgerReceipt, IngestError> {
        match self.ledger.record_proof(shipment_id, hash).await {
            Ok(receipt) => {
                let status = EvidenceStatus::Confirmed(receipt.clone());
                if let Err(e) = self.store.update_status(batch_id, status).await {
                    // The proof is on the ledger; only the local status is stale.
                    tracing::warn!(
                        batch_id = %batch_id,
                        tx_hash = %receipt.tx_hash,
                        error = %e,
                        "Failed to mark evidence record confirmed"
                    );
                }
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!(
                    shipment_id = %shipment_id,
                    batch_id = %batch_id,
                    hash = %hash,
                    error = %e,
                    "Proof submission failed"
                );
                let status = EvidenceStatus::Failed {
                    reason: e.to_string(),
                };
                if let Err(store_err) = self.store.update_status(batch_id, status).await {
                    tracing::error!(
                        batch_id = %batch_id,
                        error = %store_err,
                        "Failed to mark evidence record failed"
                    );
                }
                Err(e.into())
            }
        }
    }
}
