use thiserror::Error;

use crate::matching::phonetic::PhoneticCode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
}

/// Terminal outcomes of a resolution that found nothing. None of these is a
/// defect; each carries the phonetic code that was searched for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("metaphone not found (code {phonetic_code})")]
    NoPhoneticCandidates { phonetic_code: PhoneticCode },
    #[error("similar names not found (code {phonetic_code})")]
    NoSimilarNames { phonetic_code: PhoneticCode },
    #[error("couldn't find canonical name (code {phonetic_code})")]
    CanonicalizationFailed { phonetic_code: PhoneticCode },
}

impl ResolveError {
    pub fn phonetic_code(&self) -> &PhoneticCode {
        match self {
            Self::NoPhoneticCandidates { phonetic_code }
            | Self::NoSimilarNames { phonetic_code }
            | Self::CanonicalizationFailed { phonetic_code } => phonetic_code,
        }
    }

    /// Stable short label used in exports and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoPhoneticCandidates { .. } => "no_phonetic_candidates",
            Self::NoSimilarNames { .. } => "no_similar_names",
            Self::CanonicalizationFailed { .. } => "canonicalization_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("name must not be empty")]
    Empty,
    #[error("'{0}' should contain a single word with no spaces")]
    ContainsWhitespace(String),
    #[error("'{0}' should not contain any numbers")]
    Numeric(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("name already on the table: {0}")]
    DuplicateName(String),
    #[error("name id not found: {0}")]
    NotFound(u64),
    #[error("name must not be empty")]
    EmptyName,
}
