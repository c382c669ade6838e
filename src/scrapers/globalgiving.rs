//! GlobalGiving project-search extractor.
//!
//! Two fetches against the search-query API: a `size=1` probe for
//! `hits.total`, then one call asking for every hit at once. Each hit's
//! `_source` object is one raw record, keyed per project rather than per
//! organization, so after normalization records sharing an organization name
//! are merged into one (countries, descriptions, and cause areas
//! concatenated with `", "`).
//!
//! Cause areas arrive as shorthand codes; the public search page's filter
//! bar maps them to display names and is scraped once per run.

use crate::fetch::{get_text, post_form_json};
use crate::models::{Record, flatten_value};
use crate::schema::{Fold, Retain, Schema, merge_by_name};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use std::error::Error;
use tracing::{info, instrument, warn};

const GLOBALGIVING_SEARCH_URL: &str = "https://www.globalgiving.org/search/";
const GLOBALGIVING_API_URL: &str = "https://www.globalgiving.org/dy/v2/search/query";

pub const OUTPUT_STEM: &str = "globalgiving";
pub const DELIMITER: u8 = b',';

/// Fields concatenated when two projects share an organization name.
const MERGE_FIELDS: &[&str] = &["country", "description", "cause_area"];

const SCHEMA: Schema = Schema {
    renames: &[("orgname", "name"), ("countryname", "country")],
    folds: &[Fold {
        target: "description",
        sources: &["projtitle", "projsummary"],
        separator: ": ",
    }],
    constants: &[],
    retain: Retain::Keep(&["name", "cause_area", "country", "description"]),
};

static FILTER_TAB: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.filterBar-filter").unwrap());
static FILTER_LABEL: Lazy<Selector> = Lazy::new(|| Selector::parse("label").unwrap());

fn query_parameters(size: u64) -> Vec<(&'static str, String)> {
    vec![
        ("size", size.to_string()),
        ("nextPage", "0".to_string()),
        ("sortField", "sortorder".to_string()),
        ("keywords", String::new()),
    ]
}

/// Run the full GlobalGiving pipeline and return normalized, merged records.
#[instrument(level = "info", skip_all)]
pub async fn extract(client: &reqwest::Client) -> Result<Vec<Record>, Box<dyn Error>> {
    let total = fetch_count(client).await?;
    info!(total, "GlobalGiving reported hit count");

    let hits = fetch_hits(client, total).await?;
    info!(count = hits.len(), "Fetched GlobalGiving hits");

    let search_page = get_text(client, GLOBALGIVING_SEARCH_URL, &[]).await?;
    let themes = parse_theme_names(&search_page)?;
    info!(count = themes.len(), "Parsed cause-area display names");

    let normalized = normalize(hits, &themes);
    let merged = merge_by_name(normalized, MERGE_FIELDS);
    info!(count = merged.len(), "Extracted GlobalGiving records");
    Ok(merged)
}

async fn fetch_count(client: &reqwest::Client) -> Result<u64, Box<dyn Error>> {
    let response = post_form_json(client, GLOBALGIVING_API_URL, &query_parameters(1)).await?;
    response["hits"]["total"]
        .as_u64()
        .ok_or_else(|| "GlobalGiving response missing numeric 'hits.total'".into())
}

async fn fetch_hits(client: &reqwest::Client, total: u64) -> Result<Vec<Value>, Box<dyn Error>> {
    let response = post_form_json(client, GLOBALGIVING_API_URL, &query_parameters(total)).await?;
    let hits = response["hits"]["hits"]
        .as_array()
        .ok_or("GlobalGiving response missing 'hits.hits' array")?;

    Ok(hits.iter().map(|hit| hit["_source"].clone()).collect())
}

/// Shorthand theme code to display name, from the search page's second
/// filter tab (the theme filter).
fn parse_theme_names(html: &str) -> Result<IndexMap<String, String>, Box<dyn Error>> {
    let document = Html::parse_document(html);
    let theme_tab = document
        .select(&FILTER_TAB)
        .nth(1)
        .ok_or("GlobalGiving search page missing theme filter tab")?;

    let mut themes = IndexMap::new();
    for label in theme_tab.select(&FILTER_LABEL) {
        let (Some(shorthand), Some(display)) = (
            label.value().attr("for"),
            label.value().attr("data-displayname"),
        ) else {
            continue;
        };
        themes.insert(shorthand.to_string(), display.to_string());
    }
    Ok(themes)
}

/// Build raw records from hit `_source` objects and apply the schema.
///
/// `allthemes` is the one non-string field: its codes are converted through
/// the theme map and joined into `cause_area`. A code without a display name
/// is kept as-is rather than failing the run.
fn normalize(sources: Vec<Value>, themes: &IndexMap<String, String>) -> Vec<Record> {
    let mut records = Vec::with_capacity(sources.len());

    for source in &sources {
        let Some(object) = source.as_object() else {
            continue;
        };

        let mut record = Record::new();
        for (key, value) in object {
            if key == "allthemes" {
                continue;
            }
            record.set(key.clone(), flatten_value(value));
        }
        record.set("cause_area", convert_cause_areas(source, themes));
        records.push(record);
    }

    SCHEMA.apply(records)
}

fn convert_cause_areas(source: &Value, themes: &IndexMap<String, String>) -> String {
    let Some(codes) = source["allthemes"].as_array() else {
        return String::new();
    };

    let display_names: Vec<String> = codes
        .iter()
        .filter_map(|code| code.as_str())
        .map(|code| match themes.get(code) {
            Some(display) => display.clone(),
            None => {
                warn!(code, "No display name for cause-area code; keeping shorthand");
                code.to_string()
            }
        })
        .collect();

    display_names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn theme_map() -> IndexMap<String, String> {
        IndexMap::from([
            ("edu".to_string(), "Education".to_string()),
            ("health".to_string(), "Physical Health".to_string()),
        ])
    }

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <div class="grid-parent filterBar-filter">
            <label for="us">United States</label>
          </div>
          <div class="grid-parent filterBar-filter">
            <label for="edu" data-displayname="Education">edu</label>
            <label for="health" data-displayname="Physical Health">health</label>
            <label for="broken">no display name</label>
          </div>
        </body></html>"#;

    #[test]
    fn test_parse_theme_names_reads_second_filter_tab() {
        let themes = parse_theme_names(SEARCH_PAGE).unwrap();
        assert_eq!(themes.len(), 2);
        assert_eq!(themes["edu"], "Education");
        assert_eq!(themes["health"], "Physical Health");
    }

    #[test]
    fn test_parse_theme_names_missing_tab_is_fatal() {
        assert!(parse_theme_names("<html><body></body></html>").is_err());
    }

    #[test]
    fn test_normalize_keeps_only_target_schema_keys() {
        let sources = vec![json!({
            "orgname": "Water For All",
            "countryname": "Kenya",
            "projtitle": "Clean wells",
            "projsummary": "Dig wells in rural Kenya",
            "allthemes": ["health"],
            "projid": 123
        })];
        let records = normalize(sources, &theme_map());
        assert_eq!(records.len(), 1);

        let mut keys: Vec<_> = records[0].keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["cause_area", "country", "description", "name"]);
        assert_eq!(records[0].get("name"), "Water For All");
        assert_eq!(records[0].get("country"), "Kenya");
        assert_eq!(
            records[0].get("description"),
            "Clean wells: Dig wells in rural Kenya"
        );
        assert_eq!(records[0].get("cause_area"), "Physical Health");
    }

    #[test]
    fn test_normalize_unknown_theme_keeps_shorthand() {
        let sources = vec![json!({
            "orgname": "X",
            "allthemes": ["edu", "mystery"]
        })];
        let records = normalize(sources, &theme_map());
        assert_eq!(records[0].get("cause_area"), "Education, mystery");
    }

    #[test]
    fn test_extract_merges_projects_of_one_organization() {
        let sources = vec![
            json!({
                "orgname": "Water For All",
                "countryname": "Kenya",
                "projtitle": "Wells",
                "projsummary": "A",
                "allthemes": ["health"]
            }),
            json!({
                "orgname": "Water For All",
                "countryname": "Uganda",
                "projtitle": "Pumps",
                "projsummary": "B",
                "allthemes": ["edu"]
            }),
        ];
        let merged = merge_by_name(normalize(sources, &theme_map()), MERGE_FIELDS);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get("name"), "Water For All");
        assert_eq!(merged[0].get("country"), "Kenya, Uganda");
        assert_eq!(merged[0].get("description"), "Wells: A, Pumps: B");
        assert_eq!(merged[0].get("cause_area"), "Physical Health, Education");
    }
}
