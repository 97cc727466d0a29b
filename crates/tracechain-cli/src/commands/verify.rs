//! Verify command implementation.

use serde_json::json;

use crate::output;
use crate::records;

pub fn run(journal: String, strict: bool, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let records = records::load(&journal)?;

    let results: Vec<_> = records
        .iter()
        .map(|record| (record, record.hash_is_consistent()))
        .collect();
    let failed = results.iter().filter(|(_, ok)| !ok).count();

    if json_output {
        let json_results: Vec<_> = results
            .iter()
            .map(|(record, ok)| {
                json!({
                    "batchId": record.batch_id,
                    "shipmentId": record.shipment_id,
                    "hash": record.hash,
                    "verdict": if *ok { "ok" } else { "mismatch" },
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_results)?);
    } else {
        println!("{:<36} {:<16} {}", "BATCH_ID", "SHIPMENT", "VERDICT");
        println!("{}", "-".repeat(64));
        for (record, ok) in &results {
            println!(
                "{:<36} {:<16} {}",
                record.batch_id,
                output::truncate(&record.shipment_id.to_string(), 16),
                if *ok { "ok" } else { "mismatch" }
            );
        }
        println!("{} records, {} mismatched", results.len(), failed);
    }

    if strict && failed > 0 {
        return Err(format!("{} of {} records failed verification", failed, results.len()).into());
    }

    Ok(())
}
