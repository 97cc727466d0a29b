//! Output formatting utilities.

use chrono::SecondsFormat;
use tracechain_core::{EvidenceRecord, EvidenceStatus};

/// Short status label.
pub fn status_label(status: &EvidenceStatus) -> &'static str {
    match status {
        EvidenceStatus::Pending => "pending",
        EvidenceStatus::Confirmed(_) => "confirmed",
        EvidenceStatus::Failed { .. } => "failed",
    }
}

/// Formats a record as a table row.
pub fn format_table_row(record: &EvidenceRecord) -> String {
    format!(
        "{:<36} {:<16} {:<10} {:<20} {}",
        record.batch_id,
        truncate(&record.shipment_id.to_string(), 16),
        status_label(&record.status),
        record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        record.hash
    )
}

/// Prints table header.
#[allow(clippy::print_literal)]
pub fn print_table_header() {
    println!(
        "{:<36} {:<16} {:<10} {:<20} {}",
        "BATCH_ID", "SHIPMENT", "STATUS", "CREATED_AT", "HASH"
    );
    println!("{}", "-".repeat(150));
}

/// Shortens `s` to at most `max_len` characters, marking the cut with `...`.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
