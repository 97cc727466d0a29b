//! List command implementation.

use tracechain_core::ShipmentId;

use crate::output;
use crate::records;

pub fn run(
    journal: String,
    shipment: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = shipment.map(|s| ShipmentId::from_path_segment(&s).key());
    let records = records::load(&journal)?;

    if !json {
        output::print_table_header();
    }

    for record in records
        .iter()
        .filter(|r| filter.as_ref().map_or(true, |key| r.shipment_id.key() == *key))
    {
        if json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!("{}", output::format_table_row(record));
        }
    }

    Ok(())
}
