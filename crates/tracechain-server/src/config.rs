//! Service configuration.
//!
//! Settings come from command-line flags with `TRACECHAIN_*` environment
//! fallbacks. They are read once at startup and handed to the components
//! that need them.

use clap::{Args, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracechain_canonical::{Address, CanonicalProfile};
use tracechain_ledger::EvmLedgerConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// JSON when stdout is not a terminal, text otherwise.
    #[default]
    Auto,
    /// Human-readable text.
    Text,
    /// One JSON object per line.
    Json,
}

/// Ledger implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedgerBackend {
    /// EVM node over JSON-RPC.
    Evm,
    /// Process-local ledger; nothing leaves the process.
    Memory,
}

/// Evidence store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Append-only journal file.
    Journal,
    /// Process-local store; records are lost on exit.
    Memory,
}

/// Invalid or incomplete configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting required by the selected backend was not given.
    #[error("{setting} is required when the ledger backend is evm")]
    Missing {
        /// Flag name of the missing setting.
        setting: &'static str,
    },
    /// A numeric setting is out of range.
    #[error("{setting} must be greater than zero")]
    Zero {
        /// Flag name of the offending setting.
        setting: &'static str,
    },
}

/// Settings for `tracechain serve`.
///
/// The EVM ledger never signs locally: transactions go out through
/// `eth_sendTransaction` from `sender_address`, so the node at `rpc_url`
/// must hold that account's key (an unlocked account on a local or private
/// node). Hosted RPC providers that only accept raw signed transactions are
/// not supported.
#[derive(Debug, Clone, Args)]
pub struct ServeConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "TRACECHAIN_LISTEN", default_value = "0.0.0.0:4000")]
    pub listen: SocketAddr,

    /// Ledger backend
    #[arg(long, env = "TRACECHAIN_LEDGER", value_enum, default_value_t = LedgerBackend::Evm)]
    pub ledger: LedgerBackend,

    /// JSON-RPC endpoint of the EVM node
    #[arg(long, env = "TRACECHAIN_RPC_URL", default_value = "http://127.0.0.1:8545")]
    pub rpc_url: String,

    /// Address of the deployed supply-chain contract
    #[arg(long, env = "TRACECHAIN_CONTRACT_ADDRESS")]
    pub contract_address: Option<Address>,

    /// Node-managed account that sends transactions; the node must hold its key
    #[arg(long, env = "TRACECHAIN_SENDER_ADDRESS")]
    pub sender_address: Option<Address>,

    /// Delay between transaction receipt polls, in milliseconds
    #[arg(long, env = "TRACECHAIN_RECEIPT_POLL_MS", default_value_t = 1000)]
    pub receipt_poll_ms: u64,

    /// Receipt polls before a transaction is reported as timed out
    #[arg(long, env = "TRACECHAIN_RECEIPT_POLL_ATTEMPTS", default_value_t = 120)]
    pub receipt_poll_attempts: u32,

    /// Evidence store backend
    #[arg(long, env = "TRACECHAIN_STORE", value_enum, default_value_t = StoreBackend::Journal)]
    pub store: StoreBackend,

    /// Journal file for the journal store
    #[arg(long, env = "TRACECHAIN_JOURNAL", default_value = "tracechain.tcj")]
    pub journal: PathBuf,

    /// fsync the journal after every append
    #[arg(long, env = "TRACECHAIN_JOURNAL_SYNC")]
    pub journal_sync: bool,

    /// Canonicalization profile used for content hashes (legacy or sorted)
    #[arg(long, env = "TRACECHAIN_CANONICAL_PROFILE", default_value = "legacy")]
    pub canonical_profile: CanonicalProfile,

    /// Log output format
    #[arg(long, env = "TRACECHAIN_LOG_FORMAT", value_enum, default_value_t = LogFormat::Auto)]
    pub log_format: LogFormat,
}

impl ServeConfig {
    /// EVM client settings, or `None` for the in-memory ledger.
    pub fn evm_ledger(&self) -> Result<Option<EvmLedgerConfig>, ConfigError> {
        if self.ledger == LedgerBackend::Memory {
            return Ok(None);
        }

        let contract = self.contract_address.clone().ok_or(ConfigError::Missing {
            setting: "--contract-address",
        })?;
        let sender = self.sender_address.clone().ok_or(ConfigError::Missing {
            setting: "--sender-address",
        })?;
        if self.receipt_poll_attempts == 0 {
            return Err(ConfigError::Zero {
                setting: "--receipt-poll-attempts",
            });
        }

        Ok(Some(EvmLedgerConfig {
            rpc_url: self.rpc_url.clone(),
            contract,
            sender,
            poll_interval: Duration::from_millis(self.receipt_poll_ms),
            poll_attempts: self.receipt_poll_attempts,
        }))
    }
}
