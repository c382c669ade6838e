//! CAFA enhanced-charity-search extractor.
//!
//! CAFA exposes a form-POST search API that pages through results ten at a
//! time. A first call with the default parameters reports the total result
//! count; one call per start offset then collects the `Data` arrays.
//!
//! Raw records keep whatever columns the API returns, minus internal
//! dispatch identifiers; only `Name` and `FieldsOfInterest` are renamed onto
//! the standardized schema.

use crate::fetch::{page_offsets, post_form_json};
use crate::models::Record;
use crate::schema::{Retain, Schema};
use serde_json::Value;
use std::error::Error;
use tracing::{info, instrument};

const CAFA_API_URL: &str = "https://cafa.iphiview.com/cafa/API/EnhancedCharitySearch/\
                            dagenhancedcharitysearchbyfocusandgeographicarea";

const PAGE_SIZE: u64 = 10;

pub const OUTPUT_STEM: &str = "cafa";
pub const DELIMITER: u8 = b',';

const SCHEMA: Schema = Schema {
    renames: &[("Name", "name"), ("FieldsOfInterest", "cause_area")],
    folds: &[],
    constants: &[],
    retain: Retain::Drop(&[
        "Id",
        "Nickname",
        "DetailsDispatch",
        "DagDispatch",
        "GrantDispatch",
    ]),
};

fn default_query_parameters() -> Vec<(&'static str, String)> {
    vec![
        ("startIndex", "0".to_string()),
        ("pageSize", PAGE_SIZE.to_string()),
        ("sortExpressions", "Name ASC".to_string()),
        ("isPaged", "true".to_string()),
        ("format", "json".to_string()),
        (
            "dispatch",
            "dagenhancedcharitysearchbyfocusandgeographicarea\
             _focusArea$0_geographicArea$10004_country$0"
                .to_string(),
        ),
    ]
}

/// Run the full CAFA pipeline and return normalized records.
#[instrument(level = "info", skip_all)]
pub async fn extract(client: &reqwest::Client) -> Result<Vec<Record>, Box<dyn Error>> {
    let total = fetch_count(client).await?;
    info!(total, "CAFA reported result count");

    let mut raw = Vec::new();
    for offset in page_offsets(total, PAGE_SIZE) {
        let page = fetch_page(client, offset).await?;
        info!(offset, count = page.len(), "Fetched CAFA page");
        raw.extend(page);
    }

    let records = SCHEMA.apply(raw);
    info!(count = records.len(), "Extracted CAFA records");
    Ok(records)
}

async fn fetch_count(client: &reqwest::Client) -> Result<u64, Box<dyn Error>> {
    let response = post_form_json(client, CAFA_API_URL, &default_query_parameters()).await?;
    response["Count"]
        .as_u64()
        .ok_or_else(|| "CAFA count response missing numeric 'Count'".into())
}

async fn fetch_page(
    client: &reqwest::Client,
    start_index: u64,
) -> Result<Vec<Record>, Box<dyn Error>> {
    let mut params = default_query_parameters();
    params[0].1 = start_index.to_string();

    let response = post_form_json(client, CAFA_API_URL, &params).await?;
    parse_page(&response)
}

/// One raw record per object in the page's `Data` array.
fn parse_page(response: &Value) -> Result<Vec<Record>, Box<dyn Error>> {
    let data = response["Data"]
        .as_array()
        .ok_or("CAFA page response missing 'Data' array")?;

    Ok(data.iter().filter_map(Record::from_json_object).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page_extracts_data_records() {
        let response = json!({
            "Count": 2,
            "Data": [
                {"Name": "Alpha Aid", "FieldsOfInterest": "Health", "City": "Tel Aviv", "Id": 1},
                {"Name": "Beta Relief", "FieldsOfInterest": "Education", "City": "Haifa", "Id": 2}
            ]
        });
        let records = parse_page(&response).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Name"), "Alpha Aid");
        assert_eq!(records[1].get("City"), "Haifa");
    }

    #[test]
    fn test_parse_page_without_data_is_fatal() {
        assert!(parse_page(&json!({"Count": 0})).is_err());
    }

    #[test]
    fn test_schema_renames_and_drops_dispatch_columns() {
        let raw = Record::from_json_object(&json!({
            "Name": "Alpha Aid",
            "FieldsOfInterest": "Health",
            "City": "Tel Aviv",
            "Id": 1,
            "Nickname": "alpha",
            "DetailsDispatch": "d1",
            "DagDispatch": "d2",
            "GrantDispatch": "d3"
        }))
        .unwrap();

        let normalized = SCHEMA.apply(vec![raw]);
        let keys: Vec<_> = normalized[0].keys().collect();
        assert_eq!(keys, vec!["City", "name", "cause_area"]);
        assert_eq!(normalized[0].get("name"), "Alpha Aid");
        assert_eq!(normalized[0].get("cause_area"), "Health");
    }
}
