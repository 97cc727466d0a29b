//! HTTP ingestion service for batch evidence.
//!
//! Uploaded batches are validated, canonicalized and hashed, stored as
//! evidence records, and anchored on a ledger as proofs. See
//! [`ingest::BatchIngestor`] for the pipeline and [`http::router`] for the
//! routes.

#![deny(missing_docs)]

/// Service configuration.
pub mod config;
/// HTTP routes and error rendering.
pub mod http;
/// Upload pipeline.
pub mod ingest;
/// Per-shipment request serialization.
pub mod locks;
/// Tracing subscriber setup.
pub mod logging;
/// Signal handling.
pub mod shutdown;

use std::sync::Arc;
use thiserror::Error;
use tracechain_ledger::{EvmLedger, InMemoryLedger, Ledger};
use tracechain_store::{EvidenceStore, JournalEvidenceStore, MemoryEvidenceStore, StoreError};

pub use config::{ConfigError, LedgerBackend, LogFormat, ServeConfig, StoreBackend};
pub use ingest::{BatchIngestor, IngestError, IngestOutcome};

/// Errors that stop the service.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The evidence store could not be opened.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Binding or serving failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the ingestor described by `config`.
pub fn build_ingestor(config: &ServeConfig) -> Result<BatchIngestor, ServerError> {
    let ledger: Arc<dyn Ledger> = match config.evm_ledger()? {
        Some(evm) => {
            tracing::info!(
                rpc_url = %evm.rpc_url,
                contract = %evm.contract,
                sender = %evm.sender,
                "Using EVM ledger"
            );
            Arc::new(EvmLedger::new(evm))
        }
        None => {
            tracing::warn!("Using in-memory ledger; proofs are not anchored anywhere");
            Arc::new(InMemoryLedger::new())
        }
    };

    let store: Arc<dyn EvidenceStore> = match config.store {
        StoreBackend::Journal => Arc::new(JournalEvidenceStore::open(
            &config.journal,
            config.journal_sync,
        )?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory evidence store; records are lost on exit");
            Arc::new(MemoryEvidenceStore::new())
        }
    };

    Ok(BatchIngestor::new(ledger, store, config.canonical_profile))
}

/// Runs the HTTP service until Ctrl-C or SIGTERM.
pub async fn serve(config: ServeConfig) -> Result<(), ServerError> {
    let ingestor = Arc::new(build_ingestor(&config)?);
    let app = http::router(ingestor);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!(
        addr = %config.listen,
        profile = %config.canonical_profile,
        "tracechain listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
