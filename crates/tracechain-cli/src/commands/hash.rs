//! Hash command implementation.

use serde_json::{json, Value};
use tracechain_canonical::{CanonicalProfile, Canonicalizer};

use super::read_input;

pub fn run(
    input: Option<String>,
    profile: CanonicalProfile,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_str = read_input(input)?;
    let value: Value =
        serde_json::from_str(&json_str).map_err(|e| format!("Invalid JSON: {}", e))?;

    let hashed = Canonicalizer::new(profile)
        .hash_json(&value)
        .map_err(|e| format!("Canonicalization failed: {}", e))?;

    if json_output {
        let report = json!({
            "profile": profile.as_str(),
            "normalized": hashed.normalized,
            "hash": hashed.hash.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", hashed.normalized);
        println!("{}", hashed.hash);
    }
    Ok(())
}
