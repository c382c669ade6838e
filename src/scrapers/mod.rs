//! Per-source extractors for charity and NGO directories.
//!
//! Each submodule is one independent instance of the same four-stage
//! pipeline: fetch (paginated list calls, detail calls, or local PDF pages),
//! parse into raw field mappings, normalize onto the standardized schema,
//! and hand the record list back for the sinks in [`crate::outputs`].
//!
//! # Supported sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | CAFA | [`cafa`] | JSON API | Offset-paginated POST, 10 per page |
//! | GlobalGiving | [`globalgiving`] | JSON API | Count call, then one full fetch; duplicate names merged |
//! | OneWorld365 | [`oneworld365`] | JSON API | Response body wrapped in stray bytes |
//! | Epic Foundation | [`epicfoundation`] | HTML scraping | List page plus one detail fetch per organization |
//! | charities.gov.sg | [`charitiesgovsg`] | Rendered page tables | Pagination supplied externally via [`charitiesgovsg::ResultsPager`] |
//! | oilseedcrops.org | [`oilseedcrops`] | Local PDF | Myanmar NGO directory, index-driven page ranges |
//!
//! # Common shape
//!
//! Every module exports an `extract` entry point returning
//! `Result<Vec<Record>, Box<dyn Error>>`, plus `OUTPUT_STEM` and `DELIMITER`
//! constants consumed by `main`. Transport and decode failures abort that
//! source's run; optional fields that fail to parse become empty strings.

pub mod cafa;
pub mod charitiesgovsg;
pub mod epicfoundation;
pub mod globalgiving;
pub mod oilseedcrops;
pub mod oneworld365;
