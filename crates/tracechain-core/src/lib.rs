//! Batch payload validation and evidence record types.
//!
//! This crate provides:
//! - [`validate_batch_payload`]: structural checks run before any side effect
//! - [`BatchPayload`]: the validated upload (`shipmentId`, `data`, `metadata`)
//! - [`EvidenceRecord`]: the off-chain copy of a batch, its hash and proof status
//!
//! Core invariants:
//! - Validation is a pure function of the request body
//! - A record's `hash` is always the content hash of its `normalizedData`
//! - Records are insert-only; only their status changes after insertion
//!
#![deny(missing_docs)]

/// Evidence records, batch identifiers and proof status.
pub mod evidence;
/// Shipment identifiers.
pub mod ids;
/// Batch payload validation.
pub mod payload;

pub use evidence::{BatchId, EvidenceDraft, EvidenceRecord, EvidenceStatus, LedgerReceipt};
pub use ids::ShipmentId;
pub use payload::{validate_batch_payload, BatchPayload, PayloadRejection};
