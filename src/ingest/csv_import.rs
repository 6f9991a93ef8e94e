//! Bootstrap loader for the reference table.
//!
//! Expected layout, with a header row:
//! `name, classification, metaphone, variations`. The metaphone column is
//! ignored (codes are always recomputed on insert) and variations are
//! pipe-separated.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::models::{NewName, split_variations};
use crate::store::NameStore;

const COL_NAME: usize = 0;
const COL_CLASSIFICATION: usize = 1;
const COL_VARIATIONS: usize = 3;

fn field(rec: &StringRecord, idx: usize) -> &str {
    rec.get(idx).map(str::trim).unwrap_or("")
}

pub fn read_names<R: Read>(reader: R) -> Result<Vec<NewName>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for (i, rec) in rdr.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let line = i + 2;
        let rec = rec.with_context(|| format!("CSV parse error near line {}", line))?;
        let name = field(&rec, COL_NAME).to_uppercase();
        if name.is_empty() {
            log::warn!("Skipping CSV line {}: blank name", line);
            continue;
        }
        if !seen.insert(name.clone()) {
            log::warn!("Skipping CSV line {}: duplicate name {}", line, name);
            continue;
        }
        out.push(NewName {
            name,
            classification: field(&rec, COL_CLASSIFICATION).to_string(),
            variations: split_variations(field(&rec, COL_VARIATIONS)),
        });
    }
    Ok(out)
}

pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<NewName>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Error opening file: {}", path.display()))?;
    read_names(std::io::BufReader::new(file))
}

/// Insert every CSV row into `store`; rows the store rejects are logged and
/// skipped. Returns the number inserted.
pub fn seed_store(store: &NameStore, path: impl AsRef<Path>) -> Result<usize> {
    let start = std::time::Instant::now();
    let names = load_csv(path.as_ref())?;
    let total = names.len();
    let mut inserted = 0usize;
    for n in names {
        match store.insert(n) {
            Ok(_) => inserted += 1,
            Err(e) => log::warn!("Skipping CSV row: {}", e),
        }
    }
    log::info!(
        "Loaded {}/{} names from {} in {:?}",
        inserted,
        total,
        path.as_ref().display(),
        start.elapsed()
    );
    Ok(inserted)
}
