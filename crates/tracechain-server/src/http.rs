use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracechain_core::{BatchId, EvidenceRecord, ShipmentId};
use tracechain_ledger::{OnChainProof, OnChainShipment};
use tracechain_store::JournalEvidenceStore;

use crate::ingest::{BatchIngestor, IngestError, IngestOutcome};

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// How many times larger than its upload body a journal entry can get.
///
/// ECMAScript number formatting turns `1e20` (4 bytes) into 21 digits, and
/// each escape in the normalized text is escaped again inside the entry.
/// The two never apply to the same input bytes.
pub const JOURNAL_GROWTH: usize = 6;

const _: () = assert!(BODY_LIMIT * JOURNAL_GROWTH <= JournalEvidenceStore::MAX_ENTRY_SIZE);

/// Error rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let status = match &err {
            IngestError::Validation(_) => StatusCode::BAD_REQUEST,
            IngestError::BatchNotFound(_) => StatusCode::NOT_FOUND,
            IngestError::AlreadyConfirmed(_) => StatusCode::CONFLICT,
            IngestError::Canonical(_) | IngestError::Ledger(_) | IngestError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = %self.message, "Request failed");
        } else {
            tracing::warn!(status = self.status.as_u16(), error = %self.message, "Request rejected");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShipmentView {
    shipment_id: ShipmentId,
    exists: bool,
    shipment: Option<OnChainShipment>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProofsView {
    shipment_id: ShipmentId,
    proofs: Vec<OnChainProof>,
    batches: Vec<EvidenceRecord>,
}

/// Builds the HTTP router.
pub fn router(ingestor: Arc<BatchIngestor>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/shipments/upload-batch", post(upload_batch))
        .route("/api/shipments/:id", get(get_shipment))
        .route("/api/shipments/:id/proofs", get(get_proofs))
        .route("/api/batches/:batch_id/reconcile", post(reconcile))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(ingestor)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "tracechain" }))
}

async fn upload_batch(
    State(ingestor): State<Arc<BatchIngestor>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IngestOutcome>, ApiError> {
    let Json(body) = body?;
    let outcome = ingestor.ingest(body).await?;
    tracing::info!(
        shipment_id = %outcome.shipment_id,
        batch_id = %outcome.batch_id,
        hash = %outcome.hash,
        tx_hash = %outcome.tx_hash,
        "Batch ingested"
    );
    Ok(Json(outcome))
}

async fn get_shipment(
    State(ingestor): State<Arc<BatchIngestor>>,
    Path(id): Path<String>,
) -> Result<Json<ShipmentView>, ApiError> {
    let shipment_id = ShipmentId::from_path_segment(&id);
    let shipment = ingestor.shipment(&shipment_id).await?;
    Ok(Json(ShipmentView {
        shipment_id,
        exists: shipment.is_some(),
        shipment,
    }))
}

async fn get_proofs(
    State(ingestor): State<Arc<BatchIngestor>>,
    Path(id): Path<String>,
) -> Result<Json<ProofsView>, ApiError> {
    let shipment_id = ShipmentId::from_path_segment(&id);
    let proofs = ingestor.ledger_proofs(&shipment_id).await?;
    let batches = ingestor.batches(&shipment_id).await?;
    Ok(Json(ProofsView {
        shipment_id,
        proofs,
        batches,
    }))
}

async fn reconcile(
    State(ingestor): State<Arc<BatchIngestor>>,
    Path(batch_id): Path<String>,
) -> Result<Json<EvidenceRecord>, ApiError> {
    let batch_id: BatchId = batch_id
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid batch id: {}", batch_id)))?;
    Ok(Json(ingestor.reconcile(batch_id).await?))
}
