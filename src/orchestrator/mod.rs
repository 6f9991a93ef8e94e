//! Request-level coordination around the resolver.
//!
//! `ResolverService` validates the raw query, takes one snapshot from its
//! provider, resolves against it, and logs the outcome. Batch resolution
//! shares a single snapshot across a rayon pool.

pub mod summary;

use chrono::Utc;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{QueryError, ResolveError};
use crate::matching::{NameResolver, PhoneticEncoder, Resolution, ResolverOptions};
use crate::normalize::validate_query;
use crate::store::{NameLookup, NameStore, SnapshotProvider};

pub use summary::BatchSummary;

/// Why a single query produced no canonical record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupFailure {
    #[error("invalid query: {0}")]
    Invalid(#[from] QueryError),
    #[error(transparent)]
    NotFound(#[from] ResolveError),
}

impl LookupFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_query",
            Self::NotFound(e) => e.kind(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub query: String,
    pub result: Result<Resolution, LookupFailure>,
}

pub struct ResolverService<P, L, E> {
    provider: P,
    lookup: L,
    resolver: NameResolver<E>,
}

impl<P, L, E> ResolverService<P, L, E>
where
    P: SnapshotProvider,
    L: NameLookup,
    E: PhoneticEncoder,
{
    pub fn new(provider: P, lookup: L, resolver: NameResolver<E>) -> Self {
        Self {
            provider,
            lookup,
            resolver,
        }
    }

    pub fn resolver(&self) -> &NameResolver<E> {
        &self.resolver
    }

    pub fn resolve(&self, raw: &str) -> Result<Resolution, LookupFailure> {
        let query = validate_query(raw)?;
        let snapshot = self.provider.current_snapshot();
        let res = self
            .resolver
            .resolve_with_lookup(&query, &snapshot, &self.lookup)?;
        log::info!(
            "'{}' -> {} ({} variations, step {})",
            query,
            res.canonical.name,
            res.ordered_variations.len(),
            res.trace.canonical_step.as_str()
        );
        Ok(res)
    }
}

impl<P, L, E> ResolverService<P, L, E>
where
    P: SnapshotProvider + Sync,
    L: NameLookup + Sync,
    E: PhoneticEncoder,
{
    /// Resolve independent queries in parallel against one snapshot.
    /// Output order follows input order.
    pub fn resolve_batch(&self, queries: &[String]) -> (Vec<BatchOutcome>, BatchSummary) {
        let started_utc = Utc::now();
        let start = Instant::now();
        let snapshot = self.provider.current_snapshot();
        let outcomes: Vec<BatchOutcome> = queries
            .par_iter()
            .map(|raw| {
                let result = validate_query(raw)
                    .map_err(LookupFailure::from)
                    .and_then(|q| {
                        self.resolver
                            .resolve_with_lookup(&q, &snapshot, &self.lookup)
                            .map_err(LookupFailure::from)
                    });
                BatchOutcome {
                    query: raw.clone(),
                    result,
                }
            })
            .collect();
        let summary = BatchSummary::from_outcomes(&outcomes, snapshot.len(), started_utc, start.elapsed());
        log::info!("{}", summary);
        (outcomes, summary)
    }
}

/// Service over an in-memory store, the usual deployment shape.
pub type StoreService = ResolverService<Arc<NameStore>, Arc<NameStore>, Arc<dyn PhoneticEncoder>>;

pub fn store_service(store: Arc<NameStore>, options: ResolverOptions) -> StoreService {
    let resolver = NameResolver::new(store.encoder(), options);
    ResolverService::new(Arc::clone(&store), store, resolver)
}
