use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use super::{NameLookup, SnapshotProvider};
use crate::error::StoreError;
use crate::matching::phonetic::{DoubleMetaphoneEncoder, PhoneticEncoder};
use crate::models::{NamePatch, NameRecord, NewName, ReferenceSnapshot, StoredName};
use crate::normalize::canonical_case;

#[derive(Default)]
struct Inner {
    rows: BTreeMap<u64, StoredName>,
    ids_by_name: HashMap<String, u64>,
    next_id: u64,
    snapshot: Arc<ReferenceSnapshot>,
}

impl Inner {
    fn refresh(&mut self) {
        let records = self.rows.values().map(|s| s.record.clone()).collect();
        self.snapshot = Arc::new(ReferenceSnapshot::new(records));
    }
}

/// In-memory reference table.
///
/// Every successful write rebuilds the shared snapshot; readers that already
/// hold an older `Arc<ReferenceSnapshot>` keep reading it untouched.
pub struct NameStore {
    encoder: Arc<dyn PhoneticEncoder>,
    inner: RwLock<Inner>,
}

impl Default for NameStore {
    fn default() -> Self {
        Self::new(Arc::new(DoubleMetaphoneEncoder::default()))
    }
}

impl NameStore {
    pub fn new(encoder: Arc<dyn PhoneticEncoder>) -> Self {
        Self {
            encoder,
            inner: RwLock::new(Inner {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    pub fn encoder(&self) -> Arc<dyn PhoneticEncoder> {
        Arc::clone(&self.encoder)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn build_record(
        &self,
        name: &str,
        classification: String,
        variations: Vec<String>,
    ) -> Result<NameRecord, StoreError> {
        let name = canonical_case(name);
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let variations = variations
            .iter()
            .map(|v| canonical_case(v))
            .filter(|v| !v.is_empty())
            .collect();
        Ok(NameRecord {
            phonetic_code: self.encoder.encode(&name),
            name,
            classification,
            variations,
        })
    }

    pub fn insert(&self, new: NewName) -> Result<StoredName, StoreError> {
        let record = self.build_record(&new.name, new.classification, new.variations)?;
        let mut inner = self.write();
        if inner.ids_by_name.contains_key(&record.name) {
            return Err(StoreError::DuplicateName(record.name));
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let now = Utc::now().naive_utc();
        let stored = StoredName {
            id,
            record,
            created_at: Some(now),
            updated_at: Some(now),
        };
        inner.ids_by_name.insert(stored.record.name.clone(), id);
        inner.rows.insert(id, stored.clone());
        inner.refresh();
        log::debug!("Inserted name {} (id {})", stored.record.name, id);
        Ok(stored)
    }

    pub fn get(&self, id: u64) -> Option<StoredName> {
        self.read().rows.get(&id).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<StoredName> {
        let inner = self.read();
        let id = inner.ids_by_name.get(&canonical_case(name))?;
        inner.rows.get(id).cloned()
    }

    pub fn list(&self) -> Vec<StoredName> {
        self.read().rows.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records sharing the exact phonetic code of `name`.
    pub fn find_by_phonetic_code(&self, name: &str) -> Vec<NameRecord> {
        let code = self.encoder.encode(name);
        if code.is_empty() {
            return Vec::new();
        }
        self.current_snapshot()
            .records()
            .iter()
            .filter(|r| r.phonetic_code == code)
            .cloned()
            .collect()
    }

    pub fn update(&self, id: u64, patch: NamePatch) -> Result<StoredName, StoreError> {
        let mut inner = self.write();
        let current = inner.rows.get(&id).cloned().ok_or(StoreError::NotFound(id))?;
        if patch.is_empty() {
            return Ok(current);
        }
        let record = self.build_record(
            patch.name.as_deref().unwrap_or(&current.record.name),
            patch
                .classification
                .unwrap_or_else(|| current.record.classification.clone()),
            patch
                .variations
                .unwrap_or_else(|| current.record.variations.clone()),
        )?;
        if record.name != current.record.name {
            if inner.ids_by_name.contains_key(&record.name) {
                return Err(StoreError::DuplicateName(record.name));
            }
            inner.ids_by_name.remove(&current.record.name);
            inner.ids_by_name.insert(record.name.clone(), id);
        }
        let updated = StoredName {
            id,
            record,
            created_at: current.created_at,
            updated_at: Some(Utc::now().naive_utc()),
        };
        inner.rows.insert(id, updated.clone());
        inner.refresh();
        Ok(updated)
    }

    pub fn delete(&self, id: u64) -> Result<StoredName, StoreError> {
        let mut inner = self.write();
        let removed = inner.rows.remove(&id).ok_or(StoreError::NotFound(id))?;
        inner.ids_by_name.remove(&removed.record.name);
        inner.refresh();
        Ok(removed)
    }

    /// Replace the whole table with rows loaded from persistence. Ids are kept;
    /// rows repeating an earlier name are dropped.
    pub fn replace_all(&self, rows: Vec<StoredName>) {
        let mut inner = self.write();
        inner.rows.clear();
        inner.ids_by_name.clear();
        let mut max_id = 0;
        for row in rows {
            if inner.ids_by_name.contains_key(&row.record.name) {
                log::warn!("Skipping duplicate name {} (id {})", row.record.name, row.id);
                continue;
            }
            max_id = max_id.max(row.id);
            inner.ids_by_name.insert(row.record.name.clone(), row.id);
            inner.rows.insert(row.id, row);
        }
        inner.next_id = max_id + 1;
        inner.refresh();
        log::info!("Reference table loaded: {} names", inner.rows.len());
    }
}

impl SnapshotProvider for NameStore {
    fn current_snapshot(&self) -> Arc<ReferenceSnapshot> {
        Arc::clone(&self.read().snapshot)
    }
}

/// Reads the live table, so names written after a snapshot was handed out
/// are still found.
impl NameLookup for NameStore {
    fn lookup_by_name(&self, name: &str) -> Option<NameRecord> {
        self.get_by_name(name).map(|s| s.record)
    }
}
