//! Phonetic encoding capability consumed by candidate retrieval.
//!
//! The matching core only needs two operations: encode a name, and decide
//! whether two codes are close. `DoubleMetaphoneEncoder` is the production
//! implementation; tests and callers may plug in any deterministic encoder.

use rphonetic::{DoubleMetaphone, Encoder};
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Opaque code produced by a [`PhoneticEncoder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneticCode(String);

impl PhoneticCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PhoneticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhoneticCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Deterministic, pure phonetic capability.
pub trait PhoneticEncoder: Send + Sync {
    fn encode(&self, name: &str) -> PhoneticCode;

    /// Binary closeness judgment between two codes.
    fn is_close(&self, a: &PhoneticCode, b: &PhoneticCode) -> bool;
}

impl<T: PhoneticEncoder + ?Sized> PhoneticEncoder for &T {
    fn encode(&self, name: &str) -> PhoneticCode {
        (**self).encode(name)
    }

    fn is_close(&self, a: &PhoneticCode, b: &PhoneticCode) -> bool {
        (**self).is_close(a, b)
    }
}

impl<T: PhoneticEncoder + ?Sized> PhoneticEncoder for std::sync::Arc<T> {
    fn encode(&self, name: &str) -> PhoneticCode {
        (**self).encode(name)
    }

    fn is_close(&self, a: &PhoneticCode, b: &PhoneticCode) -> bool {
        (**self).is_close(a, b)
    }
}

/// Double Metaphone primary code; codes are close when they are within
/// `max_distance` edits of each other.
#[derive(Debug, Clone, Copy)]
pub struct DoubleMetaphoneEncoder {
    pub max_distance: usize,
}

impl Default for DoubleMetaphoneEncoder {
    fn default() -> Self {
        Self { max_distance: 1 }
    }
}

impl DoubleMetaphoneEncoder {
    pub fn with_max_distance(max_distance: usize) -> Self {
        Self { max_distance }
    }
}

impl PhoneticEncoder for DoubleMetaphoneEncoder {
    fn encode(&self, name: &str) -> PhoneticCode {
        let prepared = normalize_for_phonetic(name);
        if prepared.is_empty() {
            return PhoneticCode::default();
        }
        // rphonetic has panicked on odd inputs before; treat that as "no code"
        match std::panic::catch_unwind(|| DoubleMetaphone::default().encode(&prepared)) {
            Ok(code) => PhoneticCode(code.to_string()),
            Err(_) => {
                log::warn!("DoubleMetaphone panicked on input: {:?}", name);
                PhoneticCode::default()
            }
        }
    }

    fn is_close(&self, a: &PhoneticCode, b: &PhoneticCode) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a == b || strsim::levenshtein(a.as_str(), b.as_str()) <= self.max_distance
    }
}

/// Decompose diacritics, keep ASCII letters and single spaces, map a few
/// common non-ASCII letters.
pub(crate) fn normalize_for_phonetic(s: &str) -> String {
    let s = s.trim();
    let mut out = String::with_capacity(s.len());
    for ch in s.nfd() {
        for lc in ch.to_lowercase() {
            if lc.is_ascii_alphabetic() {
                out.push(lc);
            } else if lc.is_ascii_whitespace() {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            } else {
                match lc {
                    'ß' => out.push_str("ss"),
                    'æ' | 'ǽ' => out.push_str("ae"),
                    'ø' => out.push('o'),
                    'đ' => out.push('d'),
                    _ => {}
                }
            }
        }
    }
    let new_len = out.trim_end().len();
    out.truncate(new_len);
    out
}
