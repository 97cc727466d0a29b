use thiserror::Error;
use tracechain_canonical::TxHash;

/// Errors reported by ledger clients.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Transport failure talking to the node.
    #[error("ledger transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error object.
    #[error("ledger RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the node.
        message: String,
    },

    /// The node's answer could not be interpreted.
    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),

    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted")]
    Reverted {
        /// Hash of the reverted transaction.
        tx_hash: TxHash,
    },

    /// No receipt appeared within the polling budget.
    #[error("no receipt for transaction {tx_hash} after {attempts} attempts")]
    ReceiptTimeout {
        /// Hash of the pending transaction.
        tx_hash: TxHash,
        /// Number of receipt polls made.
        attempts: u32,
    },

    /// The contract addresses shipments by `uint256`; this identifier has no
    /// integer form.
    #[error("shipment id {0:?} cannot be used as a contract uint256")]
    UnsupportedShipmentId(String),

    /// The ledger refused the operation.
    #[error("{0}")]
    Rejected(String),
}

impl LedgerError {
    /// Returns `true` for RPC errors that signal an execution revert.
    pub fn is_revert(&self) -> bool {
        match self {
            LedgerError::Rpc { code, message } => {
                *code == 3 || message.to_ascii_lowercase().contains("revert")
            }
            LedgerError::Reverted { .. } => true,
            _ => false,
        }
    }
}
