//! Shared HTTP plumbing for the API-backed extractors.
//!
//! Each run constructs one [`reqwest::Client`] in `main` and lends it to the
//! extractors; there is no process-wide client singleton. All calls are
//! sequential and blocking from the pipeline's point of view, and any
//! transport or decode failure is fatal for the source being scraped.

use serde_json::Value;
use std::error::Error;
use tracing::debug;

/// Start offsets for paginating `total` results `page_size` at a time.
///
/// `page_offsets(23, 10)` is `[0, 10, 20]`: one fetch per page, no trailing
/// empty page.
pub fn page_offsets(total: u64, page_size: u64) -> Vec<u64> {
    if page_size == 0 {
        return Vec::new();
    }
    (0..total).step_by(page_size as usize).collect()
}

/// POST a form-encoded request and decode the response body as JSON.
pub async fn post_form_json(
    client: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<Value, Box<dyn Error>> {
    let body = client
        .post(url)
        .form(params)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    debug!(%url, bytes = body.len(), "POST response received");
    Ok(serde_json::from_str(&body)?)
}

/// GET a URL and return the raw response body.
pub async fn get_text(
    client: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<String, Box<dyn Error>> {
    let body = client
        .get(url)
        .query(params)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    debug!(%url, bytes = body.len(), "GET response received");
    Ok(body)
}
