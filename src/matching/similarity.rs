//! Normalized edit-distance similarity.
//!
//! Callers normalize case before comparing; the metric itself is
//! case-sensitive and works on Unicode scalar values, not bytes.

/// Scores are compared against thresholds with this tolerance so that
/// thresholds derived by repeated subtraction (0.8 - 0.1 ...) do not
/// reject exact hits such as `1 - 3/10`.
pub const SCORE_EPSILON: f64 = 1e-9;

/// Levenshtein distance (unit cost insert/delete/substitute).
///
/// Working memory is a single column of `min(|a|, |b|) + 1` cells plus the
/// chars of the shorter string; the longer string is streamed in the outer loop.
pub fn edit_distance(a: &str, b: &str) -> usize {
    distance_with_lengths(a, a.chars().count(), b, b.chars().count())
}

fn distance_with_lengths(a: &str, a_len: usize, b: &str, b_len: usize) -> usize {
    let (long, short, short_len) = if a_len >= b_len {
        (a, b, b_len)
    } else {
        (b, a, a_len)
    };
    if short_len == 0 {
        return a_len.max(b_len);
    }

    let short: Vec<char> = short.chars().collect();
    let mut column: Vec<usize> = (0..=short_len).collect();
    for (x, lc) in long.chars().enumerate() {
        let mut last_diag = column[0];
        column[0] = x + 1;
        for (y, &sc) in short.iter().enumerate() {
            let old_diag = column[y + 1];
            let cost = usize::from(lc != sc);
            column[y + 1] = (column[y + 1] + 1)
                .min(column[y] + 1)
                .min(last_diag + cost);
            last_diag = old_diag;
        }
    }
    column[short_len]
}

/// `1 - distance / max_len`, in `[0, 1]`. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    let max_len = a_len.max(b_len);
    if max_len == 0 {
        return 1.0;
    }
    1.0 - distance_with_lengths(a, a_len, b, b_len) as f64 / max_len as f64
}

#[inline]
pub fn meets_threshold(score: f64, threshold: f64) -> bool {
    score + SCORE_EPSILON >= threshold
}

/// Threshold after `step` cascade steps of 0.1, computed in tenths so the
/// result lands on the literal decimal (0.8 -> 0.7, not 0.7000000000000001).
pub fn cascade_threshold(threshold: f64, step: u32) -> f64 {
    (threshold * 10.0 - f64::from(step)) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn distance_basics() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("sitting", "kitten"), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
        assert_eq!(edit_distance("SILVA", "SYLVA"), 1);
    }

    #[test]
    fn distance_counts_chars_not_bytes() {
        assert_eq!(edit_distance("joão", "joao"), 1);
        assert_eq!(edit_distance("ção", "cao"), 2);
    }

    #[test]
    fn long_operand_against_short_one() {
        let long = "x".repeat(100_000);
        assert_eq!(edit_distance("ab", &long), 100_000);
        assert_eq!(edit_distance(&long, "ax"), 99_999);
        let s = similarity(&long, "x");
        assert!((s - 1.0 / 100_000.0).abs() < 1e-12);
    }

    #[test]
    fn similarity_edges() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("a", ""), 0.0);
        assert_eq!(similarity("", "abc"), 0.0);
        assert_eq!(similarity("silva", "silva"), 1.0);
        assert!((similarity("silva", "sylva") - 0.8).abs() < 1e-12);
        // case-sensitive as supplied
        assert!(similarity("SILVA", "silva") < 1.0);
    }

    #[test]
    fn cascade_threshold_lands_on_decimals() {
        assert_eq!(cascade_threshold(0.8, 0), 0.8);
        assert_eq!(cascade_threshold(0.8, 1), 0.7);
        assert_eq!(cascade_threshold(0.8, 2), 0.6);
        assert_eq!(cascade_threshold(0.8, 3), 0.5);
        assert!(meets_threshold(similarity("abcdefghij", "abcdefgxyz"), cascade_threshold(0.8, 1)));
    }

    proptest! {
        #[test]
        fn similarity_is_bounded(a in "\\PC{0,12}", b in "\\PC{0,12}") {
            let s = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn similarity_is_symmetric(a in "[a-zA-Zç]{0,12}", b in "[a-zA-Zç]{0,12}") {
            prop_assert_eq!(similarity(&a, &b), similarity(&b, &a));
        }

        #[test]
        fn similarity_with_self_is_one(a in "[a-z]{1,16}") {
            prop_assert_eq!(similarity(&a, &a), 1.0);
        }

        #[test]
        fn distance_bounded_by_longer_length(a in "[a-d]{0,10}", b in "[a-d]{0,10}") {
            let d = edit_distance(&a, &b);
            prop_assert!(d <= a.chars().count().max(b.chars().count()));
            prop_assert!(d >= a.chars().count().abs_diff(b.chars().count()));
        }
    }
}
