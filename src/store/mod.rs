//! Reference-table access used around the matching core.
//!
//! The core only sees two narrow seams: a provider handing out the current
//! [`ReferenceSnapshot`], and an exact-name lookup for records that are not
//! in that snapshot.

pub mod memory;

use std::sync::Arc;

use crate::models::{NameRecord, ReferenceSnapshot};

pub use memory::NameStore;

pub trait SnapshotProvider {
    /// The snapshot to use for one resolution. Freshness is the provider's call.
    fn current_snapshot(&self) -> Arc<ReferenceSnapshot>;
}

pub trait NameLookup {
    /// Exact lookup by canonical (uppercase) name.
    fn lookup_by_name(&self, name: &str) -> Option<NameRecord>;
}

impl NameLookup for ReferenceSnapshot {
    fn lookup_by_name(&self, name: &str) -> Option<NameRecord> {
        self.get(name).cloned()
    }
}

impl<T: NameLookup + ?Sized> NameLookup for Arc<T> {
    fn lookup_by_name(&self, name: &str) -> Option<NameRecord> {
        (**self).lookup_by_name(name)
    }
}

impl<T: SnapshotProvider + ?Sized> SnapshotProvider for Arc<T> {
    fn current_snapshot(&self) -> Arc<ReferenceSnapshot> {
        (**self).current_snapshot()
    }
}

/// Provider that always hands out the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct FixedSnapshot(pub Arc<ReferenceSnapshot>);

impl SnapshotProvider for FixedSnapshot {
    fn current_snapshot(&self) -> Arc<ReferenceSnapshot> {
        Arc::clone(&self.0)
    }
}

impl NameLookup for FixedSnapshot {
    fn lookup_by_name(&self, name: &str) -> Option<NameRecord> {
        self.0.lookup_by_name(name)
    }
}
