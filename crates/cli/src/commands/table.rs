use std::path::Path;

use anyhow::{Context, Result};
use packscope_core::model::RecordTally;
use packscope_core::table::{load_table, NO_PACKER, TEXT_HEADER};

/// Print a stored result table (CSV or binary, chosen by extension).
pub fn show_table_command(path: &str, json: bool) -> Result<()> {
    let records = load_table(Path::new(path))
        .with_context(|| format!("Failed to load result table from {}", path))?;

    if json {
        let serialized = serde_json::to_string_pretty(&records)
            .context("Failed to serialize records to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("{}", TEXT_HEADER.join(" | "));
    for record in &records {
        let last = record.error_message().or(record.packer_name()).unwrap_or(NO_PACKER);
        println!(
            "{} | {} | {} | {}",
            record.digest().unwrap_or("-"),
            record.filename(),
            record.status().as_str(),
            last
        );
    }

    let tally = RecordTally::from_records(&records);
    println!(
        "Rows: {} (packed: {}, not packed: {}, errors: {})",
        tally.total(),
        tally.packed,
        tally.not_packed,
        tally.errors
    );
    Ok(())
}
