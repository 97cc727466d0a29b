use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sha3::{Digest, Keccak256};
use std::collections::HashMap;
use tracechain_canonical::{Address, ContentHash, TxHash};
use tracechain_core::{LedgerReceipt, ShipmentId};

use crate::contract::{OnChainProof, OnChainShipment, ShipmentStatus};
use crate::{Ledger, LedgerError};

/// Account the in-memory ledger records as manufacturer and recorder.
pub const DEV_ACCOUNT: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

/// Number of calls made to each [`Ledger`] operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `shipment_exists` calls.
    pub shipment_exists: usize,
    /// `create_shipment` calls.
    pub create_shipment: usize,
    /// `record_proof` calls.
    pub record_proof: usize,
}

#[derive(Default)]
struct LedgerState {
    shipments: HashMap<String, OnChainShipment>,
    proofs: HashMap<String, Vec<OnChainProof>>,
    block_number: u64,
    calls: CallCounts,
    proof_failure: Option<String>,
}

impl LedgerState {
    fn next_receipt(&mut self, operation: &str, key: &str) -> LedgerReceipt {
        self.block_number += 1;
        let mut hasher = Keccak256::new();
        hasher.update(operation.as_bytes());
        hasher.update(key.as_bytes());
        hasher.update(self.block_number.to_be_bytes());
        LedgerReceipt {
            tx_hash: TxHash::new(format!("0x{}", hex::encode(hasher.finalize()))),
            block_number: self.block_number,
        }
    }

    fn register(&mut self, shipment_id: &ShipmentId, metadata: &str) {
        let key = shipment_id.key();
        let shipment = OnChainShipment {
            id: ShipmentId::from_path_segment(&key),
            manufacturer: Address::new(DEV_ACCOUNT.to_string()),
            metadata: metadata.to_string(),
            status: ShipmentStatus::Created,
        };
        self.shipments.insert(key, shipment);
    }
}

/// Process-local ledger.
///
/// Shipments are keyed by [`ShipmentId::key`]. Every write mines its own
/// block, so block numbers increase by one per confirmed transaction.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shipment without counting it as a `create_shipment` call.
    pub fn with_shipment(self, shipment_id: &ShipmentId, metadata: &str) -> Self {
        self.state.lock().register(shipment_id, metadata);
        self
    }

    /// Makes every following `record_proof` fail with `reason`.
    pub fn fail_record_proof(&self, reason: impl Into<String>) {
        self.state.lock().proof_failure = Some(reason.into());
    }

    /// Lets `record_proof` succeed again.
    pub fn clear_failure(&self) {
        self.state.lock().proof_failure = None;
    }

    /// Calls made so far.
    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    /// Metadata the shipment was created with.
    pub fn shipment_metadata(&self, shipment_id: &ShipmentId) -> Option<String> {
        self.state
            .lock()
            .shipments
            .get(&shipment_id.key())
            .map(|shipment| shipment.metadata.clone())
    }

    /// Hashes recorded for a shipment, oldest first.
    pub fn recorded_hashes(&self, shipment_id: &ShipmentId) -> Vec<ContentHash> {
        self.state
            .lock()
            .proofs
            .get(&shipment_id.key())
            .map(|proofs| proofs.iter().map(|proof| proof.hash).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn shipment_exists(&self, shipment_id: &ShipmentId) -> Result<bool, LedgerError> {
        let mut state = self.state.lock();
        state.calls.shipment_exists += 1;
        Ok(state.shipments.contains_key(&shipment_id.key()))
    }

    async fn create_shipment(
        &self,
        shipment_id: &ShipmentId,
        metadata: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        let key = shipment_id.key();
        let mut state = self.state.lock();
        state.calls.create_shipment += 1;
        if state.shipments.contains_key(&key) {
            return Err(LedgerError::Rejected(format!(
                "shipment {} already exists",
                shipment_id
            )));
        }
        state.register(shipment_id, metadata);
        Ok(state.next_receipt("createShipment", &key))
    }

    async fn record_proof(
        &self,
        shipment_id: &ShipmentId,
        hash: &ContentHash,
    ) -> Result<LedgerReceipt, LedgerError> {
        let key = shipment_id.key();
        let mut state = self.state.lock();
        state.calls.record_proof += 1;
        if let Some(reason) = &state.proof_failure {
            return Err(LedgerError::Rejected(reason.clone()));
        }
        let Some(shipment) = state.shipments.get_mut(&key) else {
            return Err(LedgerError::Rejected(format!(
                "shipment {} does not exist",
                shipment_id
            )));
        };
        if shipment.status == ShipmentStatus::Created {
            shipment.status = ShipmentStatus::InTransit;
        }
        let proof = OnChainProof {
            hash: *hash,
            recorder: Address::new(DEV_ACCOUNT.to_string()),
            timestamp: u64::try_from(Utc::now().timestamp()).unwrap_or_default(),
        };
        state.proofs.entry(key.clone()).or_default().push(proof);
        Ok(state.next_receipt("recordProof", &key))
    }

    async fn shipment(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Option<OnChainShipment>, LedgerError> {
        Ok(self.state.lock().shipments.get(&shipment_id.key()).cloned())
    }

    async fn proofs(&self, shipment_id: &ShipmentId) -> Result<Vec<OnChainProof>, LedgerError> {
        Ok(self
            .state
            .lock()
            .proofs
            .get(&shipment_id.key())
            .cloned()
            .unwrap_or_default())
    }
}
