//! Core data model shared by every extractor.
//!
//! The whole pipeline moves a single shape around: [`Record`], an ordered
//! mapping from field name to string value representing one organization.
//! Field sets vary per source before normalization; afterwards they are
//! restricted to that source's target schema. All values are flattened to
//! strings, even when the upstream payload carried numbers or arrays.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One organization's field-value mapping.
///
/// Keys keep insertion order so that JSON output and delimited-text column
/// discovery are deterministic across runs. Serializes transparently as a
/// plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub IndexMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Record(IndexMap::new())
    }

    /// Insert or replace a field. Replacing keeps the key's original position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Field value, or `""` when the field is absent.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Remove a field and return its value, preserving the order of the
    /// remaining fields. Absent fields come back as `""`.
    pub fn take(&mut self, key: &str) -> String {
        self.0.shift_remove(key).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Combine a list-summary record with a separately fetched detail record.
    ///
    /// Every field of `detail` is written over `summary`; on a key conflict
    /// the detail side wins. Keys unique to either side survive, summary keys
    /// first.
    pub fn merge(mut summary: Record, detail: Record) -> Record {
        for (key, value) in detail.0 {
            summary.0.insert(key, value);
        }
        summary
    }

    /// Flatten a JSON object into a record.
    ///
    /// Strings pass through, null becomes `""`, and every other value type
    /// keeps its compact JSON rendering. Non-object values yield `None`.
    pub fn from_json_object(value: &Value) -> Option<Record> {
        let object = value.as_object()?;
        let mut record = Record::new();
        for (key, value) in object {
            record.set(key.clone(), flatten_value(value));
        }
        Some(record)
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Record(iter.into_iter().collect())
    }
}

/// Render a JSON value as the flat string the output schema expects.
pub fn flatten_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// One table-of-contents entry from the PDF directory: the organization name
/// and the physical page range its full-text section occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub start_page: u32,
    pub end_page: u32,
}
