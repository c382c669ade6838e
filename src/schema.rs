//! Field normalization: raw source fields to the standardized schema.
//!
//! Every source declares a [`Schema`]: a fixed rename table, zero or more
//! string folds (several source fields concatenated into one target field in
//! declared order), constant fields, and a retention policy. Applying a
//! schema is a pure transformation of the record list; it does no I/O.
//!
//! Folds substitute an empty string for a missing source field but still
//! emit the separator, so the folded value can carry redundant whitespace.
//! That mirrors what the upstream directories actually publish and is kept
//! as-is rather than cleaned.

use crate::models::Record;
use indexmap::IndexMap;
use indexmap::map::Entry;

/// Several source fields concatenated into one target field.
#[derive(Debug, Clone, Copy)]
pub struct Fold {
    pub target: &'static str,
    pub sources: &'static [&'static str],
    pub separator: &'static str,
}

/// Which raw fields survive normalization.
#[derive(Debug, Clone, Copy)]
pub enum Retain {
    /// Keep every field not consumed by a fold or rename.
    All,
    /// Keep only the listed fields; drop everything else.
    Keep(&'static [&'static str]),
    /// Drop the listed fields; keep everything else.
    Drop(&'static [&'static str]),
}

/// A source's complete normalization policy.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// `(source_field, target_field)` pairs. The source field is removed and
    /// its value re-inserted under the target name, appended after the
    /// surviving raw fields.
    pub renames: &'static [(&'static str, &'static str)],
    pub folds: &'static [Fold],
    /// Fields set to a fixed value on every record (e.g. a constant country).
    pub constants: &'static [(&'static str, &'static str)],
    pub retain: Retain,
}

impl Schema {
    /// Normalize a full record list. Folds run first (consuming their source
    /// fields), then renames, then constants, then the retention filter.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        records.into_iter().map(|r| self.apply_one(r)).collect()
    }

    fn apply_one(&self, mut record: Record) -> Record {
        for fold in self.folds {
            let mut parts = Vec::with_capacity(fold.sources.len());
            for source in fold.sources {
                parts.push(record.take(source));
            }
            record.set(fold.target, parts.join(fold.separator));
        }

        for (source, target) in self.renames {
            let value = record.take(source);
            record.set(*target, value);
        }

        for (field, value) in self.constants {
            record.set(*field, *value);
        }

        match self.retain {
            Retain::All => record,
            Retain::Keep(kept) => Record(
                record
                    .0
                    .into_iter()
                    .filter(|(key, _)| kept.contains(&key.as_str()))
                    .collect(),
            ),
            Retain::Drop(dropped) => Record(
                record
                    .0
                    .into_iter()
                    .filter(|(key, _)| !dropped.contains(&key.as_str()))
                    .collect(),
            ),
        }
    }
}

/// Collapse records sharing a `name` into one record per name.
///
/// The first occurrence seeds the merged record and keeps its `name`; each
/// later duplicate appends its value for every field in `concat_fields`,
/// joined with `", "`. Output order is first-occurrence order. Fields of a
/// duplicate outside `concat_fields` are discarded; the merged record carries
/// exactly `name` plus the concatenated fields.
pub fn merge_by_name(records: Vec<Record>, concat_fields: &[&str]) -> Vec<Record> {
    let mut merged: IndexMap<String, Record> = IndexMap::new();

    for record in records {
        let name = record.get("name").to_string();

        match merged.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get();
                let mut combined = Record::new();
                combined.set("name", existing.get("name"));
                for field in concat_fields {
                    combined.set(
                        *field,
                        format!("{}, {}", existing.get(field), record.get(field)),
                    );
                }
                slot.insert(combined);
            }
        }
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const MERGE_FIELDS: &[&str] = &["country", "description", "cause_area"];

    #[test]
    fn test_rename_moves_value_and_removes_source_field() {
        let schema = Schema {
            renames: &[("Name", "name"), ("Sector", "cause_area")],
            folds: &[],
            constants: &[],
            retain: Retain::All,
        };
        let out = schema.apply(vec![record(&[("Name", "Oxfam"), ("Sector", "Poverty")])]);
        assert_eq!(out[0].get("name"), "Oxfam");
        assert_eq!(out[0].get("cause_area"), "Poverty");
        assert!(!out[0].contains_key("Name"));
        assert!(!out[0].contains_key("Sector"));
    }

    #[test]
    fn test_fold_concatenates_in_declared_order() {
        let schema = Schema {
            renames: &[],
            folds: &[Fold {
                target: "contact_number",
                sources: &["phone", "fax"],
                separator: " ",
            }],
            constants: &[],
            retain: Retain::All,
        };
        let out = schema.apply(vec![record(&[("fax", "222"), ("phone", "111")])]);
        assert_eq!(out[0].get("contact_number"), "111 222");
    }

    #[test]
    fn test_fold_keeps_separator_for_missing_fields() {
        let schema = Schema {
            renames: &[],
            folds: &[Fold {
                target: "description",
                sources: &["background", "vision_mission", "main_activities"],
                separator: " ",
            }],
            constants: &[],
            retain: Retain::All,
        };
        let out = schema.apply(vec![record(&[("background", "B"), ("main_activities", "M")])]);
        // The absent middle field still contributes its separator.
        assert_eq!(out[0].get("description"), "B  M");
    }

    #[test]
    fn test_keep_list_drops_raw_field_names() {
        let schema = Schema {
            renames: &[("orgname", "name")],
            folds: &[],
            constants: &[],
            retain: Retain::Keep(&["name", "country"]),
        };
        let out = schema.apply(vec![record(&[
            ("orgname", "Oxfam"),
            ("country", "UK"),
            ("internal_id", "77"),
        ])]);
        let keys: Vec<_> = out[0].keys().collect();
        assert_eq!(keys, vec!["country", "name"]);
    }

    #[test]
    fn test_drop_list_keeps_everything_else() {
        let schema = Schema {
            renames: &[],
            folds: &[],
            constants: &[],
            retain: Retain::Drop(&["Id", "Nickname"]),
        };
        let out = schema.apply(vec![record(&[
            ("Id", "1"),
            ("Nickname", "x"),
            ("City", "Paris"),
        ])]);
        assert_eq!(out[0].keys().collect::<Vec<_>>(), vec!["City"]);
    }

    #[test]
    fn test_constants_apply_to_every_record() {
        let schema = Schema {
            renames: &[],
            folds: &[],
            constants: &[("country", "Singapore")],
            retain: Retain::All,
        };
        let out = schema.apply(vec![record(&[("name", "A")]), record(&[("name", "B")])]);
        assert!(out.iter().all(|r| r.get("country") == "Singapore"));
    }

    #[test]
    fn test_merge_by_name_two_records() {
        let a = record(&[
            ("name", "Shared"),
            ("country", "India"),
            ("description", "water"),
            ("cause_area", "Health"),
        ]);
        let b = record(&[
            ("name", "Shared"),
            ("country", "Nepal"),
            ("description", "schools"),
            ("cause_area", "Education"),
        ]);
        let merged = merge_by_name(vec![a, b], MERGE_FIELDS);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get("name"), "Shared");
        assert_eq!(merged[0].get("country"), "India, Nepal");
        assert_eq!(merged[0].get("description"), "water, schools");
        assert_eq!(merged[0].get("cause_area"), "Health, Education");
    }

    #[test]
    fn test_merge_by_name_keeps_first_occurrence_order() {
        let records = vec![
            record(&[("name", "A"), ("country", "x")]),
            record(&[("name", "B"), ("country", "y")]),
            record(&[("name", "A"), ("country", "z")]),
        ];
        let merged = merge_by_name(records, MERGE_FIELDS);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].get("name"), "A");
        assert_eq!(merged[0].get("country"), "x, z");
        assert_eq!(merged[1].get("name"), "B");
        assert_eq!(merged[1].get("country"), "y");
    }

    #[test]
    fn test_merge_by_name_without_duplicates_is_identity() {
        let records = vec![
            record(&[("name", "A"), ("country", "x")]),
            record(&[("name", "B"), ("country", "y")]),
        ];
        assert_eq!(merge_by_name(records.clone(), MERGE_FIELDS), records);
    }
}
