use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracechain_canonical::{Address, ContentHash};
use tracechain_core::ShipmentId;
use tracechain_ledger::abi::{self, Token, WORD};
use tracechain_ledger::{EvmLedger, EvmLedgerConfig, Ledger, LedgerError, ShipmentStatus};

const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
const SENDER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
const MANUFACTURER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

/// How the stub contract answers `getShipment` and `getProofs`.
#[derive(Clone, Copy)]
enum ShipmentState {
    /// Shipment 7 exists with one proof.
    Registered,
    /// Getters return the zeroed struct and an empty array.
    Zeroed,
    /// Getters revert.
    Reverts,
}

#[derive(Clone, Copy)]
enum ReceiptMode {
    /// First poll returns null, second the mined receipt.
    MinedAfterOnePoll,
    Reverted,
    NeverMined,
}

struct Node {
    shipment: ShipmentState,
    receipts: ReceiptMode,
    calls: Vec<(String, Value)>,
    receipt_polls: usize,
}

type SharedNode = Arc<Mutex<Node>>;

fn tx_hash() -> String {
    format!("0x{}", "ab".repeat(32))
}

fn proof_hash() -> ContentHash {
    ContentHash::of_bytes(br#"{"a":1,"b":2}"#)
}

fn address_word(address: &str) -> [u8; 32] {
    let mut word = [0u8; 32];
    hex::decode_to_slice(&address[2..], &mut word[12..]).unwrap();
    word
}

/// Return data for a single dynamic tuple.
fn tuple_output(fields: &[Token]) -> Vec<u8> {
    let mut output = abi::uint_word(WORD as u128).to_vec();
    output.extend(abi::encode(fields));
    output
}

fn shipment_output(state: ShipmentState) -> Vec<u8> {
    let (id, manufacturer, metadata, status) = match state {
        ShipmentState::Registered => (7, address_word(MANUFACTURER), "temp:2-8C", 1),
        _ => (0, [0u8; 32], "", 0),
    };
    tuple_output(&[
        Token::Uint(id),
        Token::FixedBytes(manufacturer),
        Token::String(metadata.into()),
        Token::Uint(status),
    ])
}

fn proofs_output(state: ShipmentState) -> Vec<u8> {
    let mut output = abi::uint_word(WORD as u128).to_vec();
    match state {
        ShipmentState::Registered => {
            output.extend_from_slice(&abi::uint_word(1));
            output.extend_from_slice(&proof_hash().to_bytes32());
            output.extend_from_slice(&address_word(SENDER));
            output.extend_from_slice(&abi::uint_word(1_714_564_800));
        }
        _ => output.extend_from_slice(&abi::uint_word(0)),
    }
    output
}

fn eth_call_result(state: ShipmentState, params: &Value) -> Value {
    if let ShipmentState::Reverts = state {
        return json!({"error": {"code": 3, "message": "execution reverted"}});
    }
    let data = params[0]["data"].as_str().unwrap_or_default();
    let selector = hex::encode(abi::selector("getProofs(uint256)"));
    let output = if data[2..].starts_with(&selector) {
        proofs_output(state)
    } else {
        shipment_output(state)
    };
    json!({"result": format!("0x{}", hex::encode(output))})
}

async fn handle(State(node): State<SharedNode>, Json(request): Json<Value>) -> Json<Value> {
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].clone();
    let id = request["id"].clone();

    let mut node = node.lock().unwrap();
    node.calls.push((method.clone(), params.clone()));

    let body = match method.as_str() {
        "eth_call" => eth_call_result(node.shipment, &params),
        "eth_sendTransaction" => json!({"result": tx_hash()}),
        "eth_getTransactionReceipt" => {
            node.receipt_polls += 1;
            let mined = json!({
                "transactionHash": tx_hash(),
                "blockNumber": "0x2a",
                "status": "0x1",
            });
            match node.receipts {
                ReceiptMode::MinedAfterOnePoll if node.receipt_polls == 1 => json!({"result": null}),
                ReceiptMode::MinedAfterOnePoll => json!({"result": mined}),
                ReceiptMode::Reverted => json!({"result": {
                    "transactionHash": tx_hash(),
                    "blockNumber": "0x2a",
                    "status": "0x0",
                }}),
                ReceiptMode::NeverMined => json!({"result": null}),
            }
        }
        _ => json!({"error": {"code": -32601, "message": "method not found"}}),
    };

    let mut body = body;
    body["jsonrpc"] = json!("2.0");
    body["id"] = id;
    Json(body)
}

async fn start_node(shipment: ShipmentState, receipts: ReceiptMode) -> (EvmLedger, SharedNode) {
    let node = Arc::new(Mutex::new(Node {
        shipment,
        receipts,
        calls: Vec::new(),
        receipt_polls: 0,
    }));
    let app = Router::new()
        .route("/", post(handle))
        .with_state(Arc::clone(&node));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let ledger = EvmLedger::new(EvmLedgerConfig {
        rpc_url: format!("http://{}/", addr),
        contract: Address::parse(CONTRACT).unwrap(),
        sender: Address::parse(SENDER).unwrap(),
        poll_interval: Duration::from_millis(5),
        poll_attempts: 3,
    });
    (ledger, node)
}

fn calls_named(node: &SharedNode, method: &str) -> Vec<Value> {
    node.lock()
        .unwrap()
        .calls
        .iter()
        .filter(|(m, _)| m == method)
        .map(|(_, p)| p.clone())
        .collect()
}

#[tokio::test]
async fn exists_follows_eth_call_outcome() {
    let (ledger, node) = start_node(ShipmentState::Registered, ReceiptMode::MinedAfterOnePoll).await;
    assert!(ledger.shipment_exists(&ShipmentId::Number(7)).await.unwrap());

    let calls = calls_named(&node, "eth_call");
    assert_eq!(calls.len(), 1);
    let expected = abi::encode_call("getShipment(uint256)", &[Token::Uint(7)]);
    assert_eq!(calls[0][0]["data"], json!(format!("0x{}", hex::encode(expected))));
    assert_eq!(calls[0][0]["to"], json!(CONTRACT));
    assert_eq!(calls[0][1], json!("latest"));

    let (ledger, _node) = start_node(ShipmentState::Reverts, ReceiptMode::MinedAfterOnePoll).await;
    assert!(!ledger.shipment_exists(&ShipmentId::Number(7)).await.unwrap());
}

#[tokio::test]
async fn zeroed_shipment_struct_means_absent() {
    let (ledger, _node) = start_node(ShipmentState::Zeroed, ReceiptMode::MinedAfterOnePoll).await;
    let id = ShipmentId::Number(7);
    assert!(!ledger.shipment_exists(&id).await.unwrap());
    assert_eq!(ledger.shipment(&id).await.unwrap(), None);
    assert!(ledger.proofs(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn shipment_is_decoded_from_the_getter() {
    let (ledger, node) = start_node(ShipmentState::Registered, ReceiptMode::MinedAfterOnePoll).await;
    let shipment = ledger
        .shipment(&ShipmentId::Text("7".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shipment.id, ShipmentId::Number(7));
    assert_eq!(shipment.manufacturer.as_ref(), MANUFACTURER);
    assert_eq!(shipment.metadata, "temp:2-8C");
    assert_eq!(shipment.status, ShipmentStatus::InTransit);

    let calls = calls_named(&node, "eth_call");
    let expected = abi::encode_call("getShipment(uint256)", &[Token::Uint(7)]);
    assert_eq!(calls[0][0]["data"], json!(format!("0x{}", hex::encode(expected))));
}

#[tokio::test]
async fn proofs_are_decoded_from_the_getter() {
    let (ledger, node) = start_node(ShipmentState::Registered, ReceiptMode::MinedAfterOnePoll).await;
    let proofs = ledger.proofs(&ShipmentId::Number(7)).await.unwrap();
    assert_eq!(proofs.len(), 1);
    assert_eq!(proofs[0].hash, proof_hash());
    assert_eq!(proofs[0].recorder.as_ref(), SENDER);
    assert_eq!(proofs[0].timestamp, 1_714_564_800);

    let calls = calls_named(&node, "eth_call");
    let expected = abi::encode_call("getProofs(uint256)", &[Token::Uint(7)]);
    assert_eq!(calls[0][0]["data"], json!(format!("0x{}", hex::encode(expected))));

    let (ledger, _node) = start_node(ShipmentState::Reverts, ReceiptMode::MinedAfterOnePoll).await;
    assert!(ledger.proofs(&ShipmentId::Number(7)).await.unwrap().is_empty());
}

#[tokio::test]
async fn record_proof_sends_transaction_and_waits_for_receipt() {
    let (ledger, node) = start_node(ShipmentState::Registered, ReceiptMode::MinedAfterOnePoll).await;
    let hash = ContentHash::of_bytes(b"{\"a\":1,\"b\":2}");

    let receipt = ledger
        .record_proof(&ShipmentId::Text("7".into()), &hash)
        .await
        .unwrap();
    assert_eq!(receipt.block_number, 42);
    assert_eq!(receipt.tx_hash.as_ref(), tx_hash());

    let sent = calls_named(&node, "eth_sendTransaction");
    assert_eq!(sent.len(), 1);
    let expected = abi::encode_call(
        "recordProof(uint256,bytes32)",
        &[Token::Uint(7), Token::FixedBytes(hash.to_bytes32())],
    );
    assert_eq!(sent[0][0]["data"], json!(format!("0x{}", hex::encode(expected))));
    assert_eq!(sent[0][0]["from"], json!(SENDER));
    assert_eq!(calls_named(&node, "eth_getTransactionReceipt").len(), 2);
}

#[tokio::test]
async fn create_shipment_encodes_metadata() {
    let (ledger, node) = start_node(ShipmentState::Zeroed, ReceiptMode::MinedAfterOnePoll).await;
    ledger
        .create_shipment(&ShipmentId::Number(3), "temp:2-8C")
        .await
        .unwrap();

    let sent = calls_named(&node, "eth_sendTransaction");
    let expected = abi::encode_call(
        "createShipment(uint256,string)",
        &[Token::Uint(3), Token::String("temp:2-8C".into())],
    );
    assert_eq!(sent[0][0]["data"], json!(format!("0x{}", hex::encode(expected))));
}

#[tokio::test]
async fn reverted_receipt_is_an_error() {
    let (ledger, _node) = start_node(ShipmentState::Registered, ReceiptMode::Reverted).await;
    let err = ledger
        .record_proof(&ShipmentId::Number(1), &ContentHash::of_bytes(b"x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Reverted { .. }), "{err:?}");
}

#[tokio::test]
async fn receipt_polling_gives_up() {
    let (ledger, node) = start_node(ShipmentState::Registered, ReceiptMode::NeverMined).await;
    let err = ledger
        .record_proof(&ShipmentId::Number(1), &ContentHash::of_bytes(b"x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ReceiptTimeout { attempts: 3, .. }), "{err:?}");
    assert_eq!(node.lock().unwrap().receipt_polls, 3);
}

#[tokio::test]
async fn non_numeric_shipment_ids_are_refused_before_any_request() {
    let (ledger, node) = start_node(ShipmentState::Registered, ReceiptMode::MinedAfterOnePoll).await;
    let err = ledger
        .shipment_exists(&ShipmentId::Text("lot-a".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::UnsupportedShipmentId(_)));
    assert!(node.lock().unwrap().calls.is_empty());
}
