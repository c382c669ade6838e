//! OneWorld365 volunteer-directory extractor.
//!
//! The search API is a plain GET, but the JSON body arrives wrapped in one
//! stray byte on each side which has to be stripped before decoding. A
//! `rows=1` probe reads `total_results`, then a single full-size call
//! returns every profile under `data.profile`.
//!
//! This source already uses the standardized vocabulary, so normalization is
//! the identity: records go to the sinks exactly as fetched.

use crate::fetch::get_text;
use crate::models::Record;
use serde_json::Value;
use std::error::Error;
use tracing::{info, instrument};

const ONEWORLD365_API_URL: &str = "http://api.oneworld365.org/search/volunteer";

pub const OUTPUT_STEM: &str = "oneworld365";
pub const DELIMITER: u8 = b',';

fn query_parameters(rows: u64) -> Vec<(&'static str, String)> {
    vec![
        ("start", "0".to_string()),
        ("rows", rows.to_string()),
        ("fq0", "profile_type:0".to_string()),
        ("0", "0".to_string()),
        ("rf", "1".to_string()),
    ]
}

/// Run the full OneWorld365 pipeline and return the records.
#[instrument(level = "info", skip_all)]
pub async fn extract(client: &reqwest::Client) -> Result<Vec<Record>, Box<dyn Error>> {
    let probe = call_api(client, 1).await?;
    let total = parse_total_results(&probe)?;
    info!(total, "OneWorld365 reported result count");

    let response = call_api(client, total).await?;
    let records = parse_profiles(&response)?;
    info!(count = records.len(), "Extracted OneWorld365 records");
    Ok(records)
}

async fn call_api(client: &reqwest::Client, rows: u64) -> Result<Value, Box<dyn Error>> {
    let body = get_text(client, ONEWORLD365_API_URL, &query_parameters(rows)).await?;
    Ok(serde_json::from_str(unwrap_payload(&body))?)
}

/// Strip the one wrapper character the API adds on each side of the JSON.
fn unwrap_payload(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() < 2 {
        return trimmed;
    }
    &trimmed[1..trimmed.len() - 1]
}

fn parse_total_results(response: &Value) -> Result<u64, Box<dyn Error>> {
    let total = &response["total_results"];
    total
        .as_u64()
        .or_else(|| total.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| "OneWorld365 response missing 'total_results'".into())
}

fn parse_profiles(response: &Value) -> Result<Vec<Record>, Box<dyn Error>> {
    let profiles = response["data"]["profile"]
        .as_array()
        .ok_or("OneWorld365 response missing 'data.profile' array")?;

    Ok(profiles
        .iter()
        .filter_map(Record::from_json_object)
        .collect())
}
