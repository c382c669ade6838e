//! Delimited-text output.
//!
//! The column header is the union of every key appearing in any record, not
//! a fixed schema: after a duplicate-name merge or optional-field variance
//! the records are not guaranteed to share a key set, and a record missing a
//! column simply gets an empty cell. Column discovery is a separate pure
//! pass ([`compute_header`]) so the header logic is testable without files.

use crate::models::Record;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Union of keys across all records, in first-seen order.
pub fn compute_header(records: &[Record]) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !header.iter().any(|h| h == key) {
                header.push(key.to_string());
            }
        }
    }
    header
}

/// Write one header row and one row per record, using `delimiter`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn write_records(
    records: &[Record],
    path: &Path,
    delimiter: u8,
) -> Result<(), Box<dyn Error>> {
    let header = compute_header(records);

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;

    writer.write_record(&header)?;
    for record in records {
        writer.write_record(header.iter().map(|column| record.get(column)))?;
    }
    writer.flush()?;

    info!(
        rows = records.len(),
        columns = header.len(),
        "Wrote delimited records"
    );
    Ok(())
}
