use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracechain_canonical::{CanonicalProfile, ContentHash};
use tracechain_core::{
    BatchId, EvidenceDraft, EvidenceRecord, EvidenceStatus, PayloadRejection, ShipmentId,
};
use tracechain_ledger::{CallCounts, InMemoryLedger};
use tracechain_server::http::BODY_LIMIT;
use tracechain_server::{BatchIngestor, IngestError};
use tracechain_store::{EvidenceStore, JournalEvidenceStore, MemoryEvidenceStore, StoreError};

const H_AB: &str = "0x43258cff783fe7036d8a43033f830adfc60ec037382473548ac742b888292777";

fn setup() -> (BatchIngestor, Arc<InMemoryLedger>, Arc<MemoryEvidenceStore>) {
    let ledger = Arc::new(InMemoryLedger::new());
    let store = Arc::new(MemoryEvidenceStore::new());
    let ingestor = BatchIngestor::new(ledger.clone(), store.clone(), CanonicalProfile::Legacy);
    (ingestor, ledger, store)
}

/// Store whose writes always fail.
struct BrokenStore;

#[async_trait]
impl EvidenceStore for BrokenStore {
    async fn insert(&self, _draft: EvidenceDraft) -> Result<BatchId, StoreError> {
        Err(StoreError::Other("disk full".into()))
    }

    async fn update_status(
        &self,
        batch_id: BatchId,
        _status: EvidenceStatus,
    ) -> Result<EvidenceRecord, StoreError> {
        Err(StoreError::NotFound(batch_id))
    }

    async fn get(&self, _batch_id: BatchId) -> Result<Option<EvidenceRecord>, StoreError> {
        Ok(None)
    }

    async fn list_by_shipment(
        &self,
        _shipment_id: &ShipmentId,
    ) -> Result<Vec<EvidenceRecord>, StoreError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn upload_stores_hashes_and_anchors() {
    let (ingestor, ledger, store) = setup();

    let outcome = ingestor
        .ingest(json!({"shipmentId": 7, "data": {"b": 2, "a": 1}, "metadata": "cold-chain"}))
        .await
        .unwrap();

    let expected = ContentHash::parse(H_AB).unwrap();
    assert_eq!(outcome.hash, expected);
    assert_eq!(outcome.shipment_id, ShipmentId::Number(7));

    let record = store.get(outcome.batch_id).await.unwrap().unwrap();
    assert_eq!(record.normalized_data, r#"{"a":1,"b":2}"#);
    assert_eq!(record.hash, expected);
    assert_eq!(record.metadata, "cold-chain");
    assert_eq!(record.shipment_id, ShipmentId::Number(7));
    match &record.status {
        EvidenceStatus::Confirmed(receipt) => {
            assert_eq!(receipt.tx_hash, outcome.tx_hash);
            assert_eq!(receipt.block_number, outcome.block_number);
        }
        other => panic!("expected confirmed, got {other:?}"),
    }

    assert_eq!(ledger.recorded_hashes(&ShipmentId::Number(7)), vec![expected]);
    assert_eq!(
        ledger.shipment_metadata(&ShipmentId::Number(7)).as_deref(),
        Some("cold-chain")
    );
    assert_eq!(
        ledger.calls(),
        CallCounts {
            shipment_exists: 1,
            create_shipment: 1,
            record_proof: 1,
        }
    );
}

#[tokio::test]
async fn existing_shipment_is_not_recreated() {
    let ledger = Arc::new(InMemoryLedger::new().with_shipment(&ShipmentId::Number(3), "existing"));
    let store = Arc::new(MemoryEvidenceStore::new());
    let ingestor = BatchIngestor::new(ledger.clone(), store, CanonicalProfile::Legacy);

    ingestor
        .ingest(json!({"shipmentId": "3", "data": {"t": 4.5}}))
        .await
        .unwrap();
    assert_eq!(ledger.calls().create_shipment, 0);
    assert_eq!(
        ledger.shipment_metadata(&ShipmentId::Number(3)).as_deref(),
        Some("existing")
    );
}

#[tokio::test]
async fn missing_metadata_creates_shipment_with_empty_string() {
    let (ingestor, ledger, store) = setup();
    let outcome = ingestor
        .ingest(json!({"shipmentId": 0, "data": {}}))
        .await
        .unwrap();
    assert_eq!(
        ledger.shipment_metadata(&ShipmentId::Number(0)).as_deref(),
        Some("")
    );
    let record = store.get(outcome.batch_id).await.unwrap().unwrap();
    assert_eq!(record.metadata, "");
    assert_eq!(record.normalized_data, "{}");
}

#[tokio::test]
async fn resubmission_is_not_deduplicated() {
    let (ingestor, ledger, store) = setup();
    let body = json!({"shipmentId": 7, "data": {"a": 1, "b": 2}});

    let first = ingestor.ingest(body.clone()).await.unwrap();
    let second = ingestor.ingest(body).await.unwrap();

    assert_ne!(first.batch_id, second.batch_id);
    assert_eq!(first.hash, second.hash);
    assert_eq!(store.len(), 2);
    assert_eq!(ledger.calls().record_proof, 2);
    assert_eq!(ledger.calls().create_shipment, 1);
    assert_eq!(ledger.recorded_hashes(&ShipmentId::Number(7)).len(), 2);
}

#[tokio::test]
async fn validation_failure_touches_nothing() {
    let (ingestor, ledger, store) = setup();

    for (body, expected) in [
        (json!({"data": {}}), PayloadRejection::MissingShipmentId),
        (json!({"shipmentId": 1, "data": "not-an-object"}), PayloadRejection::InvalidData),
        (json!({"shipmentId": 1, "data": [1, 2, 3]}), PayloadRejection::InvalidData),
        (json!({"shipmentId": 1, "data": {}, "metadata": 5}), PayloadRejection::InvalidMetadata),
    ] {
        let err = ingestor.ingest(body).await.unwrap_err();
        assert!(matches!(err, IngestError::Validation(r) if r == expected), "{err:?}");
    }

    assert!(store.is_empty());
    assert_eq!(ledger.calls(), CallCounts::default());
}

#[tokio::test]
async fn ledger_failure_leaves_failed_record() {
    let (ingestor, ledger, store) = setup();
    ledger.fail_record_proof("nonce too low");

    let err = ingestor
        .ingest(json!({"shipmentId": 9, "data": {"a": 1}}))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Ledger(_)));
    assert_eq!(err.to_string(), "nonce too low");

    let records = store.list_by_shipment(&ShipmentId::Number(9)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].status,
        EvidenceStatus::Failed {
            reason: "nonce too low".into()
        }
    );
}

#[tokio::test]
async fn store_failure_prevents_proof() {
    let ledger = Arc::new(InMemoryLedger::new());
    let ingestor = BatchIngestor::new(ledger.clone(), Arc::new(BrokenStore), CanonicalProfile::Legacy);

    let err = ingestor
        .ingest(json!({"shipmentId": 1, "data": {"a": 1}}))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Store(_)));
    assert_eq!(ledger.calls().record_proof, 0);
}

#[tokio::test]
async fn reconcile_resubmits_failed_proof() {
    let (ingestor, ledger, store) = setup();
    ledger.fail_record_proof("timeout");
    ingestor
        .ingest(json!({"shipmentId": 5, "data": {"a": 1}}))
        .await
        .unwrap_err();
    let batch_id = store.list_by_shipment(&ShipmentId::Number(5)).await.unwrap()[0].batch_id;

    ledger.clear_failure();
    let record = ingestor.reconcile(batch_id).await.unwrap();
    assert!(record.status.is_confirmed());
    assert_eq!(ledger.recorded_hashes(&ShipmentId::Number(5)).len(), 1);

    let err = ingestor.reconcile(batch_id).await.unwrap_err();
    assert!(matches!(err, IngestError::AlreadyConfirmed(id) if id == batch_id));
    assert_eq!(ledger.calls().record_proof, 2);
}

#[tokio::test]
async fn reconcile_unknown_batch() {
    let (ingestor, _ledger, _store) = setup();
    let missing = BatchId::generate();
    assert!(matches!(
        ingestor.reconcile(missing).await,
        Err(IngestError::BatchNotFound(id)) if id == missing
    ));
}

#[tokio::test]
async fn concurrent_uploads_create_shipment_once() {
    let (ingestor, ledger, store) = setup();
    let ingestor = Arc::new(ingestor);

    let mut tasks = Vec::new();
    for i in 0..10 {
        let ingestor = Arc::clone(&ingestor);
        tasks.push(tokio::spawn(async move {
            ingestor
                .ingest(json!({"shipmentId": 11, "data": {"seq": i}}))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(ledger.calls().create_shipment, 1);
    assert_eq!(ledger.calls().record_proof, 10);
    assert_eq!(store.len(), 10);
}

#[tokio::test]
async fn sorted_profile_changes_nested_hashing() {
    let ledger = Arc::new(InMemoryLedger::new());
    let store = Arc::new(MemoryEvidenceStore::new());
    let ingestor = BatchIngestor::new(ledger, store.clone(), CanonicalProfile::Sorted);

    let outcome = ingestor
        .ingest(json!({"shipmentId": 1, "data": {"b": {"y": 1, "x": 2}, "a": 1}}))
        .await
        .unwrap();
    let record = store.get(outcome.batch_id).await.unwrap().unwrap();
    assert_eq!(record.normalized_data, r#"{"a":1,"b":{"x":2,"y":1}}"#);
    assert!(record.hash_is_consistent());
}

/// Uploads `body` through a journal-backed ingestor, then reads the record
/// back from the reopened journal.
async fn ingest_into_journal(body: &str) -> EvidenceRecord {
    assert!(body.len() <= BODY_LIMIT, "body is {} bytes", body.len());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("evidence.tcj");
    let ledger = Arc::new(InMemoryLedger::new());
    let store = Arc::new(JournalEvidenceStore::open(&path, false).unwrap());
    let ingestor = BatchIngestor::new(ledger.clone(), store, CanonicalProfile::Legacy);

    let outcome = ingestor
        .ingest(serde_json::from_str(body).unwrap())
        .await
        .unwrap();
    assert_eq!(ledger.calls().record_proof, 1);
    drop(ingestor);

    let reopened = JournalEvidenceStore::open(&path, false).unwrap();
    let record = reopened.get(outcome.batch_id).await.unwrap().unwrap();
    assert!(record.status.is_confirmed());
    assert!(record.hash_is_consistent());
    record
}

#[tokio::test]
async fn escape_heavy_upload_fits_the_journal() {
    // Each `\"` is escaped again inside the journal entry.
    let body = format!(
        r#"{{"shipmentId":1,"data":{{"a":"{}"}}}}"#,
        "\\\"".repeat(4_500_000)
    );
    let record = ingest_into_journal(&body).await;
    assert_eq!(record.normalized_data.len(), 9_000_008);
}

#[tokio::test]
async fn exponent_heavy_upload_fits_the_journal() {
    // `1e20` renders as 21 digits.
    let count = (BODY_LIMIT - 64) / 5;
    let body = format!(
        r#"{{"shipmentId":1,"data":{{"a":[{}]}}}}"#,
        vec!["1e20"; count].join(",")
    );
    let record = ingest_into_journal(&body).await;
    assert!(record
        .normalized_data
        .starts_with(r#"{"a":[100000000000000000000,"#));
    assert!(record.normalized_data.len() > 4 * BODY_LIMIT);
}
