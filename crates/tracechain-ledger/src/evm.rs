use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracechain_canonical::{Address, ContentHash, TxHash};
use tracechain_core::{LedgerReceipt, ShipmentId};

use crate::abi::{self, Token};
use crate::contract::{self, OnChainProof, OnChainShipment};
use crate::{shipment_word, Ledger, LedgerError};

const GET_SHIPMENT: &str = "getShipment(uint256)";
const GET_PROOFS: &str = "getProofs(uint256)";
const CREATE_SHIPMENT: &str = "createShipment(uint256,string)";
const RECORD_PROOF: &str = "recordProof(uint256,bytes32)";

/// Connection settings for [`EvmLedger`].
#[derive(Debug, Clone)]
pub struct EvmLedgerConfig {
    /// HTTP JSON-RPC endpoint of the node.
    pub rpc_url: String,
    /// Deployed supply-chain contract.
    pub contract: Address,
    /// Account the node signs transactions with.
    pub sender: Address,
    /// Delay between receipt polls.
    pub poll_interval: Duration,
    /// Receipt polls before giving up.
    pub poll_attempts: u32,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Ledger client for an EVM node reached over HTTP JSON-RPC.
///
/// Reads go through `eth_call`. Writes are sent with `eth_sendTransaction`
/// from the configured sender, so the node must hold that account's key.
/// Each write then polls `eth_getTransactionReceipt` until the transaction is
/// mined or the polling budget runs out.
pub struct EvmLedger {
    client: reqwest::Client,
    config: EvmLedgerConfig,
    next_id: AtomicU64,
}

impl EvmLedger {
    /// Creates a client. No request is made until the first call.
    pub fn new(config: EvmLedgerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            next_id: AtomicU64::new(1),
        }
    }

    /// Connection settings.
    pub fn config(&self) -> &EvmLedgerConfig {
        &self.config
    }

    async fn rpc<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({"jsonrpc": "2.0", "method": method, "params": params, "id": id});

        let response: RpcResponse = self
            .client
            .post(&self.config.rpc_url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(response.result.unwrap_or(Value::Null))
            .map_err(|e| LedgerError::InvalidResponse(format!("{}: {}", method, e)))
    }

    fn call_object(&self, data: &[u8]) -> Value {
        json!({
            "from": self.config.sender.as_ref(),
            "to": self.config.contract.as_ref(),
            "data": format!("0x{}", hex::encode(data)),
        })
    }

    /// `eth_call` of a getter taking the shipment id. `None` when the call
    /// reverts.
    async fn read(
        &self,
        signature: &str,
        shipment_id: &ShipmentId,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        let data = abi::encode_call(signature, &[Token::Uint(shipment_word(shipment_id)?)]);
        match self
            .rpc::<String>("eth_call", json!([self.call_object(&data), "latest"]))
            .await
        {
            Ok(output) => hex::decode(output.trim_start_matches("0x"))
                .map(Some)
                .map_err(|e| LedgerError::InvalidResponse(format!("{}: {}", signature, e))),
            Err(e) if e.is_revert() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn transact(&self, data: Vec<u8>) -> Result<LedgerReceipt, LedgerError> {
        let sent: String = self
            .rpc("eth_sendTransaction", json!([self.call_object(&data)]))
            .await?;
        let tx_hash = TxHash::parse(sent.as_str())
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
        tracing::debug!(tx_hash = %tx_hash, "Transaction submitted");
        self.wait_for_receipt(tx_hash).await
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<LedgerReceipt, LedgerError> {
        for attempt in 0..self.config.poll_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.config.poll_interval).await;
            }

            let receipt: Option<TransactionReceipt> = self
                .rpc("eth_getTransactionReceipt", json!([tx_hash.as_ref()]))
                .await?;
            let Some(receipt) = receipt else { continue };
            // Some nodes return the receipt before the block number is known.
            let Some(block) = receipt.block_number.as_deref() else {
                continue;
            };

            if receipt.status.as_deref() == Some("0x0") {
                return Err(LedgerError::Reverted { tx_hash });
            }

            let block_number = parse_quantity(block)?;
            let tx_hash = TxHash::parse(receipt.transaction_hash.as_str())
                .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
            return Ok(LedgerReceipt {
                tx_hash,
                block_number,
            });
        }

        Err(LedgerError::ReceiptTimeout {
            tx_hash,
            attempts: self.config.poll_attempts,
        })
    }
}

#[async_trait]
impl Ledger for EvmLedger {
    async fn shipment_exists(&self, shipment_id: &ShipmentId) -> Result<bool, LedgerError> {
        match self.read(GET_SHIPMENT, shipment_id).await? {
            Some(output) => contract::shipment_is_registered(&output),
            None => Ok(false),
        }
    }

    async fn create_shipment(
        &self,
        shipment_id: &ShipmentId,
        metadata: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        let data = abi::encode_call(
            CREATE_SHIPMENT,
            &[
                Token::Uint(shipment_word(shipment_id)?),
                Token::String(metadata.to_string()),
            ],
        );
        let receipt = self.transact(data).await?;
        tracing::info!(
            shipment_id = %shipment_id,
            tx_hash = %receipt.tx_hash,
            block_number = receipt.block_number,
            "Shipment created on ledger"
        );
        Ok(receipt)
    }

    async fn record_proof(
        &self,
        shipment_id: &ShipmentId,
        hash: &ContentHash,
    ) -> Result<LedgerReceipt, LedgerError> {
        let data = abi::encode_call(
            RECORD_PROOF,
            &[
                Token::Uint(shipment_word(shipment_id)?),
                Token::FixedBytes(hash.to_bytes32()),
            ],
        );
        let receipt = self.transact(data).await?;
        tracing::info!(
            shipment_id = %shipment_id,
            hash = %hash,
            tx_hash = %receipt.tx_hash,
            block_number = receipt.block_number,
            "Proof recorded on ledger"
        );
        Ok(receipt)
    }

    async fn shipment(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Option<OnChainShipment>, LedgerError> {
        match self.read(GET_SHIPMENT, shipment_id).await? {
            Some(output) => contract::decode_shipment(&output),
            None => Ok(None),
        }
    }

    async fn proofs(&self, shipment_id: &ShipmentId) -> Result<Vec<OnChainProof>, LedgerError> {
        match self.read(GET_PROOFS, shipment_id).await? {
            Some(output) => contract::decode_proofs(&output),
            None => Ok(Vec::new()),
        }
    }
}

/// Parses a JSON-RPC hex quantity such as `0x1b4`.
fn parse_quantity(value: &str) -> Result<u64, LedgerError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::InvalidResponse(format!("quantity without 0x prefix: {}", value)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::InvalidResponse(format!("invalid quantity {}: {}", value, e)))
}
