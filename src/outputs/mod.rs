//! Sink stage: serializing normalized records to their output files.
//!
//! Every source produces two sibling files under the output directory:
//!
//! ```text
//! output_dir/
//! ├── cafa.json            # full record list as one JSON array
//! ├── cafa.csv             # delimited text, union-of-keys header
//! ├── globalgiving.json
//! ├── globalgiving.csv
//! └── ...
//! ```
//!
//! Both files are fully overwritten on each run. The delimiter is per-source
//! configuration; charities.gov.sg ships a pipe, everything else a comma.
//!
//! # Submodules
//!
//! - [`json`]: compact JSON array serializer
//! - [`delimited`]: delimited-text serializer with two-pass column discovery

pub mod delimited;
pub mod json;

use crate::models::Record;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Write both output files for one source: `{stem}.json` and `{stem}.csv`.
#[instrument(level = "info", skip_all, fields(stem = %stem, count = records.len()))]
pub async fn write_source(
    records: &[Record],
    output_dir: &str,
    stem: &str,
    delimiter: u8,
) -> Result<(), Box<dyn Error>> {
    tokio::fs::create_dir_all(output_dir).await?;

    let json_path = Path::new(output_dir).join(format!("{stem}.json"));
    json::write_records(records, &json_path).await?;

    let csv_path = Path::new(output_dir).join(format!("{stem}.csv"));
    delimited::write_records(records, &csv_path, delimiter)?;

    info!(
        stem,
        count = records.len(),
        json = %json_path.display(),
        csv = %csv_path.display(),
        "Wrote source outputs"
    );
    Ok(())
}
