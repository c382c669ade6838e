//! # charity_harvester
//!
//! A family of independent extractors that pull charity and NGO listings
//! from six external directories and normalize them into a common tabular
//! shape (name, address, cause area, description, country, contact info),
//! written per source as a JSON array file and a delimited text file.
//!
//! ## Sources
//!
//! - CAFA and GlobalGiving and OneWorld365 (paginated JSON search APIs)
//! - Epic Foundation (HTML portfolio with per-organization detail pages)
//! - charities.gov.sg (rendered search-result tables, supplied via captures)
//! - oilseedcrops.org (a scanned Myanmar NGO directory PDF)
//!
//! ## Usage
//!
//! ```sh
//! charity_harvester -o ./data -s cafa,globalgiving
//! ```
//!
//! ## Architecture
//!
//! Every extractor is the same four-stage pipeline, parameterized per
//! source and run strictly top to bottom:
//! 1. **Fetch**: paginated list calls, detail calls, or local PDF pages
//! 2. **Parse**: raw payloads into string field mappings, one per organization
//! 3. **Normalize**: rename/fold raw fields onto the standardized schema
//! 4. **Sink**: overwrite `{source}.json` and `{source}.csv`
//!
//! Sources run sequentially and share nothing but the HTTP client; a fatal
//! error in one source aborts that source only.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod fetch;
mod models;
mod outputs;
mod schema;
mod scrapers;

use cli::{Cli, Source};
use scrapers::{cafa, charitiesgovsg, epicfoundation, globalgiving, oilseedcrops, oneworld365};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("charity_harvester starting up");

    let args = Cli::parse();
    let selected = args.selected_sources();
    info!(?selected, output_dir = %args.output_dir, "Parsed CLI arguments");

    // One explicitly owned client per run, lent to each extractor.
    let client = reqwest::Client::new();

    let mut failed: Vec<Source> = Vec::new();
    for source in selected {
        if let Err(e) = run_source(source, &client, &args).await {
            error!(?source, error = %e, "Source extraction failed");
            failed.push(source);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        failed = failed.len(),
        "Execution complete"
    );

    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("{} source(s) failed: {:?}", failed.len(), failed).into())
    }
}

/// Run one source's pipeline end to end: extract, then write both sinks.
async fn run_source(
    source: Source,
    client: &reqwest::Client,
    args: &Cli,
) -> Result<(), Box<dyn Error>> {
    let out = &args.output_dir;
    match source {
        Source::Cafa => {
            let records = cafa::extract(client).await?;
            outputs::write_source(&records, out, cafa::OUTPUT_STEM, cafa::DELIMITER).await
        }
        Source::Globalgiving => {
            let records = globalgiving::extract(client).await?;
            outputs::write_source(&records, out, globalgiving::OUTPUT_STEM, globalgiving::DELIMITER)
                .await
        }
        Source::Oneworld365 => {
            let records = oneworld365::extract(client).await?;
            outputs::write_source(&records, out, oneworld365::OUTPUT_STEM, oneworld365::DELIMITER)
                .await
        }
        Source::Epicfoundation => {
            let records = epicfoundation::extract(client).await?;
            outputs::write_source(
                &records,
                out,
                epicfoundation::OUTPUT_STEM,
                epicfoundation::DELIMITER,
            )
            .await
        }
        Source::Charitiesgovsg => {
            let Some(pages_dir) = &args.charitiesgovsg_pages else {
                warn!("No --charitiesgovsg-pages directory given; skipping charities.gov.sg");
                return Ok(());
            };
            let mut pager = charitiesgovsg::SavedPages::open(Path::new(pages_dir))?;
            let records = charitiesgovsg::extract(&mut pager)?;
            outputs::write_source(
                &records,
                out,
                charitiesgovsg::OUTPUT_STEM,
                charitiesgovsg::DELIMITER,
            )
            .await
        }
        Source::Oilseedcrops => {
            let records = oilseedcrops::extract(Path::new(&args.pdf_path))?;
            outputs::write_source(&records, out, oilseedcrops::OUTPUT_STEM, oilseedcrops::DELIMITER)
                .await
        }
    }
}
