//! Command-line interface definitions for charity_harvester.
//!
//! All configuration is static per source (endpoint URLs, page sizes,
//! delimiters live next to each scraper); the CLI only selects which sources
//! run and where their inputs and outputs live.

use clap::{Parser, ValueEnum};

/// The six supported directory sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    Cafa,
    Globalgiving,
    Oneworld365,
    Epicfoundation,
    Charitiesgovsg,
    Oilseedcrops,
}

impl Source {
    pub const ALL: &'static [Source] = &[
        Source::Cafa,
        Source::Globalgiving,
        Source::Oneworld365,
        Source::Epicfoundation,
        Source::Charitiesgovsg,
        Source::Oilseedcrops,
    ];
}

/// Command-line arguments for the charity_harvester binary.
///
/// # Examples
///
/// ```sh
/// # Run every source, writing outputs under ./data
/// charity_harvester -o ./data
///
/// # Run only the JSON-API sources
/// charity_harvester -o ./data -s cafa,globalgiving,oneworld365
///
/// # Include the PDF directory from a non-default location
/// charity_harvester -s oilseedcrops --pdf-path ./downloads/ngo-directory.pdf
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory where the JSON and delimited-text outputs are written
    #[arg(short, long, default_value = "./data")]
    pub output_dir: String,

    /// Comma-separated sources to run (default: all)
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub sources: Vec<Source>,

    /// Path to the Myanmar NGO directory PDF (oilseedcrops source)
    #[arg(long, default_value = "./data/Myanmar-Local-NGO-directory-2012.pdf")]
    pub pdf_path: String,

    /// Directory of captured charities.gov.sg result-table fragments
    /// (one .html file per page); the source is skipped when absent
    #[arg(long)]
    pub charitiesgovsg_pages: Option<String>,
}

impl Cli {
    /// Sources to run this time; an empty `--sources` means all of them.
    pub fn selected_sources(&self) -> Vec<Source> {
        if self.sources.is_empty() {
            Source::ALL.to_vec()
        } else {
            self.sources.clone()
        }
    }
}
