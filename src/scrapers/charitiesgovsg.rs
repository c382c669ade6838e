//! charities.gov.sg registered-charity extractor.
//!
//! The government portal renders its search results into an ASP.NET page
//! whose pagination only works through simulated clicks, so the mechanics of
//! driving the page live outside this crate. The extractor consumes a
//! [`ResultsPager`]: anything that can report how many result pages to
//! expect and yield the inner HTML of each page's results table in order.
//! [`SavedPages`] is the shipped implementation, reading table fragments
//! previously captured to disk.
//!
//! Yielding fewer pages than expected is a completeness warning, not an
//! error: whatever was collected is still normalized and written.

use crate::models::Record;
use crate::schema::{Retain, Schema};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const OUTPUT_STEM: &str = "charitiesgovsg";
pub const DELIMITER: u8 = b'|';

const SCHEMA: Schema = Schema {
    renames: &[
        ("Name of Organization", "name"),
        ("Address", "address"),
        ("Primary sector", "cause_area"),
    ],
    folds: &[],
    constants: &[("country", "Singapore")],
    retain: Retain::All,
};

static RESULT_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr[id$=_trSearchDataList]").unwrap());

/// The portal names every cell span with a stable id suffix; the row index
/// embedded in the full id is irrelevant here.
const SPAN_FIELDS: &[(&str, &str)] = &[
    ("UEN No", "span[id$=_lblUENNo]"),
    ("Charity Status", "span[id$=_lblCharityStatus]"),
    ("Date of Charity Registration", "span[id$=_lblDateOfCharityReg]"),
    ("IPC Status", "span[id$=_lblIPCStatus]"),
    ("IPC Period", "span[id$=_lblIPCPeriodNo]"),
    ("Address", "span[id$=_lblAddress]"),
    ("Primary sector", "span[id$=_lblSector]"),
];

static NAME_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span[id$=_lblNameOfOrg]").unwrap());
static WEBSITE_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[id$=_lblOrgWebsite]").unwrap());
static DETAILS_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input[id$=_hfViewDetails]").unwrap());

/// Source of rendered result-table pages.
///
/// Implementations own the session with the portal (or a capture of one) for
/// the run's duration. `next_page_table` returns `None` when there is no
/// next page, which is the loop's natural termination signal.
pub trait ResultsPager {
    /// How many result pages the source claims to have.
    fn expected_pages(&mut self) -> Result<u64, Box<dyn Error>>;

    /// Inner HTML of the next results table, or `None` when exhausted.
    fn next_page_table(&mut self) -> Result<Option<String>, Box<dyn Error>>;
}

/// Pager over result-table fragments captured to disk, one `.html` file per
/// page, consumed in filename order.
pub struct SavedPages {
    files: Vec<PathBuf>,
    next: usize,
}

impl SavedPages {
    pub fn open(dir: &Path) -> Result<Self, Box<dyn Error>> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "html"))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(format!("no saved .html page tables under {}", dir.display()).into());
        }
        Ok(SavedPages { files, next: 0 })
    }
}

impl ResultsPager for SavedPages {
    fn expected_pages(&mut self) -> Result<u64, Box<dyn Error>> {
        Ok(self.files.len() as u64)
    }

    fn next_page_table(&mut self) -> Result<Option<String>, Box<dyn Error>> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        Ok(Some(fs::read_to_string(path)?))
    }
}

/// Run the full charities.gov.sg pipeline over `pager` and return normalized
/// records.
#[instrument(level = "info", skip_all)]
pub fn extract(pager: &mut dyn ResultsPager) -> Result<Vec<Record>, Box<dyn Error>> {
    let expected = pager.expected_pages()?;
    info!(expected, "Expected result pages");

    let mut raw = Vec::new();
    let mut scraped = 0u64;
    while let Some(page_table) = pager.next_page_table()? {
        scraped += 1;
        let charities = parse_page_table(&page_table)?;
        info!(page = scraped, count = charities.len(), "Parsed result page");
        raw.extend(charities);
    }

    if scraped < expected {
        warn!(scraped, expected, "Did not reach last result page");
    }

    let records = SCHEMA.apply(raw);
    info!(count = records.len(), "Extracted charities.gov.sg records");
    Ok(records)
}

/// One record per search-result row of a page table. A row without the
/// organization-name span is a fatal parse error; every other cell is
/// optional.
fn parse_page_table(html: &str) -> Result<Vec<Record>, Box<dyn Error>> {
    // The captured fragment is the results div's innerHTML; re-root it in a
    // table so the row tags survive HTML5 parsing.
    let document = Html::parse_document(&format!("<table>{html}</table>"));

    let span_selectors: Vec<(&str, Selector)> = SPAN_FIELDS
        .iter()
        .map(|(field, selector)| (*field, Selector::parse(selector).unwrap()))
        .collect();

    let mut charities = Vec::new();
    for row in document.select(&RESULT_ROW) {
        let name = row
            .select(&NAME_CELL)
            .next()
            .map(element_text)
            .ok_or("charities.gov.sg result row missing organization name")?;

        let mut record = Record::new();
        record.set("Name of Organization", name);
        for (field, selector) in &span_selectors {
            record.set(*field, select_text(row, selector));
        }
        record.set("Website", select_text(row, &WEBSITE_CELL));
        record.set(
            "Details URL",
            row.select(&DETAILS_CELL)
                .next()
                .and_then(|input| input.value().attr("value"))
                .unwrap_or("")
                .trim(),
        );

        charities.push(record);
    }
    Ok(charities)
}

fn select_text(row: ElementRef, selector: &Selector) -> String {
    row.select(selector).next().map(element_text).unwrap_or_default()
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, name: &str) -> String {
        let prefix = format!("ctl00_PlaceHolderMain_lstSearchResults_ctrl{index}");
        format!(
            r#"<tr id="{prefix}_trSearchDataList">
                 <td><span id="{prefix}_lblNameOfOrg">{name}</span></td>
                 <td><span id="{prefix}_lblUENNo">T01CC{index}</span></td>
                 <td><span id="{prefix}_lblCharityStatus">Registered</span></td>
                 <td><span id="{prefix}_lblAddress">1 Raffles Place</span></td>
                 <td><span id="{prefix}_lblSector">Social Services</span></td>
                 <td><a id="{prefix}_lblOrgWebsite">example.org.sg</a></td>
                 <td><input id="{prefix}_hfViewDetails" value="/details?id={index}"/></td>
               </tr>"#
        )
    }

    struct FakePager {
        pages: Vec<String>,
        expected: u64,
        next: usize,
    }

    impl ResultsPager for FakePager {
        fn expected_pages(&mut self) -> Result<u64, Box<dyn Error>> {
            Ok(self.expected)
        }

        fn next_page_table(&mut self) -> Result<Option<String>, Box<dyn Error>> {
            let page = self.pages.get(self.next).cloned();
            self.next += 1;
            Ok(page)
        }
    }

    #[test]
    fn test_parse_page_table_reads_all_cells() {
        let table = format!("<table>{}{}</table>", row(0, "Willing Hearts"), row(1, "Food Bank"));
        let records = parse_page_table(&table).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Name of Organization"), "Willing Hearts");
        assert_eq!(records[0].get("UEN No"), "T01CC0");
        assert_eq!(records[0].get("Charity Status"), "Registered");
        assert_eq!(records[0].get("Website"), "example.org.sg");
        assert_eq!(records[0].get("Details URL"), "/details?id=0");
        assert_eq!(records[1].get("Name of Organization"), "Food Bank");
    }

    #[test]
    fn test_parse_page_table_optional_cells_default_to_blank() {
        let prefix = "ctl00_PlaceHolderMain_lstSearchResults_ctrl0";
        let table = format!(
            r#"<tr id="{prefix}_trSearchDataList">
                 <td><span id="{prefix}_lblNameOfOrg">Bare Minimum</span></td>
               </tr>"#
        );
        let records = parse_page_table(&table).unwrap();
        assert_eq!(records[0].get("Name of Organization"), "Bare Minimum");
        assert_eq!(records[0].get("Address"), "");
        assert_eq!(records[0].get("IPC Status"), "");
        assert_eq!(records[0].get("Details URL"), "");
    }

    #[test]
    fn test_parse_page_table_missing_name_is_fatal() {
        let table = r#"<tr id="ctl00_PlaceHolderMain_lstSearchResults_ctrl0_trSearchDataList">
                         <td><span id="ctl00_PlaceHolderMain_lstSearchResults_ctrl0_lblUENNo">T1</span></td>
                       </tr>"#;
        assert!(parse_page_table(table).is_err());
    }

    #[test]
    fn test_extract_normalizes_and_adds_country() {
        let mut pager = FakePager {
            pages: vec![format!("<table>{}</table>", row(0, "Willing Hearts"))],
            expected: 1,
            next: 0,
        };
        let records = extract(&mut pager).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), "Willing Hearts");
        assert_eq!(records[0].get("address"), "1 Raffles Place");
        assert_eq!(records[0].get("cause_area"), "Social Services");
        assert_eq!(records[0].get("country"), "Singapore");
        assert!(!records[0].contains_key("Name of Organization"));
        // Non-renamed portal columns survive under their original names.
        assert_eq!(records[0].get("UEN No"), "T01CC0");
    }

    #[test]
    fn test_extract_short_run_still_returns_collected_pages() {
        let mut pager = FakePager {
            pages: vec![format!("<table>{}</table>", row(0, "Only Page"))],
            expected: 3,
            next: 0,
        };
        let records = extract(&mut pager).unwrap();
        assert_eq!(records.len(), 1);
    }
}
