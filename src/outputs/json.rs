//! JSON array output.
//!
//! The whole record list is serialized as one compact JSON array in input
//! order; no pretty-printing. Parsing the file back yields an equal list of
//! records, which the tests in [`crate::models`] rely on.

use crate::models::Record;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialize `records` to `path`, replacing any previous file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_records(records: &[Record], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string(records)?;
    fs::write(path, json).await?;
    info!(count = records.len(), "Wrote JSON records");
    Ok(())
}
