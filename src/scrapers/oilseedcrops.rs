//! Myanmar NGO directory extractor (oilseedcrops.org PDF).
//!
//! The source is a scanned directory PDF. Pages 2-4 hold a numbered
//! table of contents (`12. Organization Name 34-36`); each entry names an
//! organization and the listed page range of its full-text section. The
//! listed numbers are offset from the physical pages by a fixed amount.
//!
//! For every index entry the extractor pulls the text of its page range,
//! strips the organization's own heading block out of the body (that block
//! becomes the address), and walks an ordered list of section markers to
//! slice the body into background, vision/mission, main activities, and
//! primary beneficiaries. A marker the scan dropped yields an empty section,
//! never an error.

use crate::models::{IndexEntry, Record};
use crate::schema::{Fold, Retain, Schema};
use indexmap::IndexMap;
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, instrument};

pub const OUTPUT_STEM: &str = "oilseedcrops";
pub const DELIMITER: u8 = b',';

/// Physical (1-based) pages holding the table of contents.
const INDEX_PAGES: &[u32] = &[2, 3, 4];

/// Listed page 1 is physical page 5.
const PAGE_OFFSET: u32 = 4;

/// Ordered section markers; the last is a terminator only.
const SECTION_MARKERS: &[&str] = &[
    "Background",
    "Vision/Mission",
    "Main Activities",
    "Primary Beneficiaries",
    "Name of Leader",
];

const SCHEMA: Schema = Schema {
    renames: &[("organization_info", "address")],
    folds: &[Fold {
        target: "description",
        sources: &[
            "background",
            "vision_mission",
            "main_activities",
            "primary_beneficiaries",
        ],
        separator: " ",
    }],
    constants: &[("country", "myanmar")],
    retain: Retain::All,
};

static PAGE_NUMBER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ ]*[0-9]+-?[0-9]*\n").unwrap());
static INDEX_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.\s*(.*?)\s*([0-9]+(?:-[0-9]+)?)").unwrap());
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.+?\)").unwrap());

/// Run the full PDF pipeline and return normalized records.
#[instrument(level = "info", skip_all, fields(path = %pdf_path.display()))]
pub fn extract(pdf_path: &Path) -> Result<Vec<Record>, Box<dyn Error>> {
    let document = Document::load(pdf_path)?;

    let mut index_text = String::new();
    for page in INDEX_PAGES {
        index_text.push('\n');
        index_text.push_str(&document.extract_text(&[*page])?);
    }
    let entries = parse_index_entries(&index_text.replace("\n\n", "\n"));
    info!(count = entries.len(), "Parsed organization index");

    let mut raw = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut full_text = String::new();
        for page in entry.start_page..=entry.end_page {
            full_text.push(' ');
            full_text.push_str(&document.extract_text(&[page])?);
        }
        debug!(name = %entry.name, start = entry.start_page, end = entry.end_page, "Extracted page range");
        raw.push(parse_organization(&entry.name, &full_text));
    }

    let records = SCHEMA.apply(raw);
    info!(count = records.len(), "Extracted oilseedcrops records");
    Ok(records)
}

/// Table-of-contents entries, page numbers converted to physical pages.
///
/// The scan sometimes wraps an entry's page number onto its own line; those
/// lines are collapsed back onto the entry before matching. Duplicate names
/// keep the last entry, matching how the directory itself resolves them.
fn parse_index_entries(index_text: &str) -> Vec<IndexEntry> {
    let mut collapsed = index_text.to_string();
    for matched in PAGE_NUMBER_LINE.find_iter(index_text) {
        collapsed = collapsed.replace(matched.as_str(), &format!("{}\n", matched.as_str().trim()));
    }

    let mut entries: IndexMap<String, IndexEntry> = IndexMap::new();
    for line in collapsed.lines() {
        let Some(captures) = INDEX_LINE.captures(line) else {
            continue;
        };
        let name = captures[1].trim().to_string();
        let (start, end) = parse_page_range(&captures[2]);
        entries.insert(
            name.clone(),
            IndexEntry {
                name,
                start_page: PAGE_OFFSET + start,
                end_page: PAGE_OFFSET + end,
            },
        );
    }
    entries.into_values().collect()
}

fn parse_page_range(pages: &str) -> (u32, u32) {
    match pages.split_once('-') {
        Some((start, end)) => (
            start.parse().unwrap_or(0),
            end.parse().unwrap_or(0),
        ),
        None => {
            let page = pages.parse().unwrap_or(0);
            (page, page)
        }
    }
}

/// Parse one organization's page-range text into a raw record.
fn parse_organization(name: &str, full_text: &str) -> Record {
    // The scan renders the "fi" ligature in "Beneficiaries" as a thorn
    // artifact; normalize before marker matching.
    let flattened = full_text
        .replace('\n', " ")
        .replace("BeneÞ  ciaries", "Beneficiaries");

    let (organization_info, body) = strip_heading(&flattened, name);
    let sections = extract_sections(&body, SECTION_MARKERS);

    let mut record = Record::new();
    record.set("name", name);
    record.set("organization_info", organization_info);
    record.set("background", sections[0].clone());
    record.set("vision_mission", sections[1].clone());
    record.set("main_activities", sections[2].clone());
    record.set("primary_beneficiaries", sections[3].clone());
    record
}

/// Cut the organization's heading block out of the body.
///
/// The block starts at the organization's name (parenthetical qualifiers
/// removed, since the scan drops them) and runs up to the "Name of Leader"
/// marker. The cut text, trimmed, is the organization's contact/address
/// info; when either boundary is missing, nothing is cut and the info is
/// empty.
fn strip_heading(full_text: &str, name: &str) -> (String, String) {
    let cleaned_name = PARENTHETICAL.replace_all(name, "");
    let cleaned_name = cleaned_name.trim();
    if cleaned_name.is_empty() {
        return (String::new(), full_text.to_string());
    }

    let Some(name_start) = full_text.find(cleaned_name) else {
        return (String::new(), full_text.to_string());
    };
    let Some(leader_rel) = full_text[name_start..].find("Name of Leader") else {
        return (String::new(), full_text.to_string());
    };
    let leader_start = name_start + leader_rel;

    let info = full_text[name_start..leader_start].trim().to_string();
    let mut body = String::with_capacity(full_text.len());
    body.push_str(&full_text[..name_start]);
    body.push(' ');
    body.push_str(&full_text[leader_start..]);
    (info, body)
}

/// Slice `text` into one section per non-terminal marker.
///
/// Markers are searched in declared order, each from where the previous one
/// was found. A section's content runs from the end of its own marker to the
/// start of the next marker that was actually present; a missing marker
/// produces an empty section and the remaining markers still resolve.
fn extract_sections(text: &str, markers: &[&str]) -> Vec<String> {
    let mut found: Vec<Option<(usize, usize)>> = Vec::with_capacity(markers.len());
    let mut cursor = 0;
    for marker in markers {
        match text[cursor..].find(marker) {
            Some(rel) => {
                let start = cursor + rel;
                cursor = start + marker.len();
                found.push(Some((start, cursor)));
            }
            None => found.push(None),
        }
    }

    let mut sections = Vec::with_capacity(markers.len() - 1);
    for index in 0..markers.len() - 1 {
        let Some((_, content_start)) = found[index] else {
            sections.push(String::new());
            continue;
        };
        let content_end = found[index + 1..]
            .iter()
            .flatten()
            .map(|(start, _)| *start)
            .next()
            .unwrap_or(text.len());
        sections.push(text[content_start..content_end].trim().to_string());
    }
    sections
}
