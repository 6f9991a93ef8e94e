use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::matching::phonetic::PhoneticCode;

/// Separator used when a variation list is flattened into a single column.
pub const VARIATION_SEPARATOR: char = '|';

/// One entry of the reference table.
///
/// `name` is kept uppercase and is the identity key. `phonetic_code` is derived
/// from `name` at ingestion and is never recomputed by the matching core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub name: String,
    pub classification: String,
    pub phonetic_code: PhoneticCode,
    #[serde(default)]
    pub variations: Vec<String>,
}

impl NameRecord {
    /// Variations flattened the way they are persisted (`A|B|C`).
    pub fn variations_joined(&self) -> String {
        join_variations(&self.variations)
    }
}

pub fn join_variations(variations: &[String]) -> String {
    let mut out = String::new();
    for (i, v) in variations.iter().enumerate() {
        if i > 0 {
            out.push(VARIATION_SEPARATOR);
        }
        out.push_str(v);
    }
    out
}

/// Split a persisted variation column, dropping blank entries.
pub fn split_variations(raw: &str) -> Vec<String> {
    raw.split(VARIATION_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A record as held by the store or the database, with its row metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredName {
    pub id: u64,
    #[serde(flatten)]
    pub record: NameRecord,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Input for creating a record; the phonetic code is computed on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewName {
    pub name: String,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub variations: Vec<String>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePatch {
    pub name: Option<String>,
    pub classification: Option<String>,
    pub variations: Option<Vec<String>>,
}

impl NamePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.classification.is_none() && self.variations.is_none()
    }
}

/// Transient match row: a spelling and the score of the record that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityCandidate {
    pub name: String,
    pub score: f64,
}

/// Immutable point-in-time copy of the reference table.
///
/// Built once by a snapshot provider and shared read-only by any number of
/// concurrent resolutions.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSnapshot {
    records: Vec<NameRecord>,
    by_name: HashMap<String, usize>,
}

impl ReferenceSnapshot {
    /// Build a snapshot. On duplicate names the first record wins.
    pub fn new(records: Vec<NameRecord>) -> Self {
        let mut kept = Vec::with_capacity(records.len());
        let mut by_name = HashMap::with_capacity(records.len());
        for rec in records {
            if by_name.contains_key(&rec.name) {
                log::warn!("Duplicate name '{}' in snapshot input; keeping first", rec.name);
                continue;
            }
            by_name.insert(rec.name.clone(), kept.len());
            kept.push(rec);
        }
        Self {
            records: kept,
            by_name,
        }
    }

    pub fn records(&self) -> &[NameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact lookup on the uppercase identity key.
    pub fn get(&self, name: &str) -> Option<&NameRecord> {
        self.by_name.get(name).map(|&i| &self.records[i])
    }

    /// First record (in table order) listing `variation` among its variations.
    pub fn owner_of_variation(&self, variation: &str) -> Option<&NameRecord> {
        self.records
            .iter()
            .find(|r| r.variations.iter().any(|v| v.eq_ignore_ascii_case(variation)))
    }
}

impl FromIterator<NameRecord> for ReferenceSnapshot {
    fn from_iter<I: IntoIterator<Item = NameRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
