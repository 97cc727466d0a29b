//! Ledger clients for anchoring batch proofs.
//!
//! The [`Ledger`] trait covers the contract interactions the ingestion
//! service needs: checking that a shipment exists, creating it, recording
//! the content hash of a batch against it, and reading shipments and proofs
//! back for auditing.
//!
//! Implementations:
//! - [`EvmLedger`]: Ethereum JSON-RPC over HTTP
//! - [`InMemoryLedger`]: process-local, for tests and development

#![deny(missing_docs)]

/// Contract call encoding.
pub mod abi;
/// Shipment and proof state read from the contract.
pub mod contract;
/// Error types for ledger operations.
pub mod error;
/// JSON-RPC client for an EVM node.
pub mod evm;
/// Process-local ledger.
pub mod memory;

use async_trait::async_trait;
use tracechain_canonical::ContentHash;
use tracechain_core::{LedgerReceipt, ShipmentId};

pub use contract::{OnChainProof, OnChainShipment, ShipmentStatus};
pub use error::LedgerError;
pub use evm::{EvmLedger, EvmLedgerConfig};
pub use memory::{CallCounts, InMemoryLedger};

/// Ledger holding shipments and their proofs.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Returns `true` if the shipment has been created on the ledger.
    async fn shipment_exists(&self, shipment_id: &ShipmentId) -> Result<bool, LedgerError>;

    /// Creates a shipment and waits for the transaction to be confirmed.
    async fn create_shipment(
        &self,
        shipment_id: &ShipmentId,
        metadata: &str,
    ) -> Result<LedgerReceipt, LedgerError>;

    /// Records a batch proof and waits for the transaction to be confirmed.
    async fn record_proof(
        &self,
        shipment_id: &ShipmentId,
        hash: &ContentHash,
    ) -> Result<LedgerReceipt, LedgerError>;

    /// Reads a shipment. `None` if it was never created.
    async fn shipment(&self, shipment_id: &ShipmentId)
        -> Result<Option<OnChainShipment>, LedgerError>;

    /// Reads the proofs recorded for a shipment, oldest first. Empty for an
    /// unknown shipment.
    async fn proofs(&self, shipment_id: &ShipmentId) -> Result<Vec<OnChainProof>, LedgerError>;
}

/// Converts a shipment identifier into the contract's `uint256` argument.
pub(crate) fn shipment_word(shipment_id: &ShipmentId) -> Result<u128, LedgerError> {
    shipment_id
        .as_integer()
        .ok_or_else(|| LedgerError::UnsupportedShipmentId(shipment_id.to_string()))
}
