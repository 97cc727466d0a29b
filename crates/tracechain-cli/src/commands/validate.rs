//! Validate command implementation.

use serde_json::Value;
use tracechain_core::validate_batch_payload;

use super::read_input;

pub fn run(input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let body: Value = serde_json::from_str(&read_input(input)?)
        .map_err(|e| format!("Invalid JSON: {}", e))?;

    validate_batch_payload(&body)?;
    println!("ok");
    Ok(())
}
