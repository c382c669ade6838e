//! Epic Foundation portfolio extractor.
//!
//! A list/detail source: the portfolio page yields one `data-link` slug per
//! organization, then each detail page is fetched and parsed on its own.
//! The detail record is merged over the list record, detail fields winning
//! on conflict.
//!
//! The detail markup is loosely structured; every block except the
//! organization name is optional and parses to an empty string when absent.
//! A detail page without an `org-name` heading aborts the run.

use crate::fetch::get_text;
use crate::models::Record;
use crate::schema::{Fold, Retain, Schema};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument};

const EPIC_FOUNDATION_CHARITIES_URL: &str =
    "https://epic.foundation/inside-epic/portfolio-organizations";

pub const OUTPUT_STEM: &str = "epicfoundation";
pub const DELIMITER: u8 = b',';

const SCHEMA: Schema = Schema {
    renames: &[
        ("org-location", "location"),
        ("org-country", "country"),
        ("org-name", "name"),
        ("fact-Sectors", "cause_area"),
    ],
    folds: &[Fold {
        target: "description",
        sources: &["org-intro", "org-quote", "challenge-description"],
        separator: "; ",
    }],
    constants: &[],
    retain: Retain::Keep(&["location", "country", "name", "cause_area", "description"]),
};

static ORG_BROWSER_ENTRY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.org-browser > div[data-link]").unwrap());
static ORG_NAME: Lazy<Selector> = Lazy::new(|| Selector::parse("h2.org-name").unwrap());
static ORG_LOCATION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.org-location[lang=en]").unwrap());
static ORG_COUNTRY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.org-country[lang=en]").unwrap());
static ORG_PRESENTATION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.org-presentation").unwrap());
static ORG_INTRO: Lazy<Selector> = Lazy::new(|| Selector::parse("div.org-intro").unwrap());
static ORG_DETAILS_FACT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.org-details > div").unwrap());
static PROGRAM: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.org-programs-description-wrapper > div.org-programs-description").unwrap()
});
static EN_SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span[lang=en]").unwrap());
static EN_PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p[lang=en]").unwrap());

fn details_url(data_link: &str) -> String {
    format!("https://epic.foundation/inside-epic/portfolio/{data_link}")
}

/// Run the full Epic Foundation pipeline and return normalized records.
#[instrument(level = "info", skip_all)]
pub async fn extract(client: &reqwest::Client) -> Result<Vec<Record>, Box<dyn Error>> {
    let portfolio_page = get_text(client, EPIC_FOUNDATION_CHARITIES_URL, &[]).await?;
    let slugs = parse_portfolio_links(&portfolio_page);
    info!(count = slugs.len(), "Indexed Epic Foundation organizations");

    let mut raw = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let url = details_url(&slug);
        debug!(%url, "Fetching organization detail page");
        let detail_page = get_text(client, &url, &[]).await?;
        let detail = parse_detail_page(&detail_page)?;

        let mut summary = Record::new();
        summary.set("data-link", slug);
        raw.push(Record::merge(summary, detail));
    }

    let records = SCHEMA.apply(raw);
    info!(count = records.len(), "Extracted Epic Foundation records");
    Ok(records)
}

/// `data-link` slugs from the portfolio browser, in page order. A page
/// without the browser container yields no organizations rather than an
/// error.
fn parse_portfolio_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ORG_BROWSER_ENTRY)
        .filter_map(|entry| entry.value().attr("data-link"))
        .map(str::to_string)
        .collect()
}

/// Parse one detail page into a raw record.
///
/// The organization name is the one required element; everything else falls
/// back to an empty string. Key facts become `fact-<label>` fields, and key
/// programs fold into `challenge-description`.
fn parse_detail_page(html: &str) -> Result<Record, Box<dyn Error>> {
    let document = Html::parse_document(html);

    let name = document
        .select(&ORG_NAME)
        .next()
        .map(element_text)
        .ok_or("Epic Foundation detail page missing organization name")?;

    let mut record = Record::new();
    record.set("org-name", name);
    record.set("org-location", select_text(&document, &ORG_LOCATION));
    record.set("org-country", select_text(&document, &ORG_COUNTRY));
    record.set("org-quote", parse_quote(&document));
    record.set("org-intro", parse_intro(&document));
    record.set("challenge-description", parse_challenges(&document));

    for (field, value) in parse_key_facts(&document) {
        record.set(field, value);
    }

    // Programs reuse the challenge-description field and win when both blocks
    // are present.
    let programs = parse_programs(&document);
    if !programs.is_empty() {
        record.set("challenge-description", programs);
    }

    Ok(record)
}

fn parse_quote(document: &Html) -> String {
    let Some(presentation) = document.select(&ORG_PRESENTATION).next() else {
        return String::new();
    };
    presentation
        .select(&EN_SPAN)
        .next()
        .map(|span| flatten_breaks(&element_text(span)))
        .unwrap_or_default()
}

fn parse_intro(document: &Html) -> String {
    let Some(intro) = document.select(&ORG_INTRO).next() else {
        return String::new();
    };
    let joined = intro
        .select(&EN_PARAGRAPH)
        .map(element_text)
        .collect::<Vec<_>>()
        .join(" ");
    flatten_breaks(&joined)
}

/// The "challenge" block: one `"span, span, …"` string per child div,
/// joined with `"; "`.
fn parse_challenges(document: &Html) -> String {
    static CHALLENGE: Lazy<Selector> =
        Lazy::new(|| Selector::parse("div.challenge-description > div").unwrap());

    let facts: Vec<String> = document
        .select(&CHALLENGE)
        .map(|fact| {
            fact.select(&EN_SPAN)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect();

    flatten_breaks(&facts.join("; "))
}

/// Key facts from the `org-details` block. A two-span child is a labelled
/// fact (`fact-<label>`); anything else lands in `fact-unknown`.
fn parse_key_facts(document: &Html) -> Vec<(String, String)> {
    let mut facts = Vec::new();
    for fact in document.select(&ORG_DETAILS_FACT) {
        let spans: Vec<String> = fact.select(&EN_SPAN).map(element_text).collect();
        match spans.as_slice() {
            [label, value] => facts.push((format!("fact-{label}"), value.clone())),
            [first, ..] => facts.push(("fact-unknown".to_string(), first.clone())),
            [] => {}
        }
    }
    facts
}

/// Key programs folded into one `"header: text; header: text"` string.
fn parse_programs(document: &Html) -> String {
    let programs: Vec<String> = document
        .select(&PROGRAM)
        .map(|program| {
            let header = program
                .select(&EN_SPAN)
                .next()
                .map(element_text)
                .unwrap_or_default();
            let text = program
                .select(&EN_PARAGRAPH)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            format!("{header}: {}", flatten_breaks(&text))
        })
        .collect();

    programs.join("; ")
}

fn select_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn flatten_breaks(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
