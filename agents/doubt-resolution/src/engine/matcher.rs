//! Token-set fuzzy matching
//!
//! Scores two strings on a 0-100 scale ignoring word order, repeated words,
//! and extra words on either side. A question whose tokens are a subset of
//! a key's tokens (or the reverse) always scores 100.

use std::collections::BTreeSet;

/// Minimum score (inclusive) for a canned answer to be served
pub const DEFAULT_THRESHOLD: u8 = 80;

/// Strip non-ASCII, replace non-alphanumerics with spaces, lowercase, trim
pub fn preprocess(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii)
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Token-set similarity between two strings, 0..=100
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let a = preprocess(a);
    let b = preprocess(b);

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0;
    }

    let sect: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100;
    }

    let diff_ab_joined = diff_ab.join(" ");
    let diff_ba_joined = diff_ba.join(" ");

    let sect_len = sect.join(" ").len();
    let ab_len = diff_ab_joined.len();
    let ba_len = diff_ba_joined.len();

    // `sect + " " + diff`; the separator only exists when sect is non-empty
    let sep = usize::from(sect_len != 0);
    let sect_ab_len = sect_len + sep + ab_len;
    let sect_ba_len = sect_len + sep + ba_len;

    // Both combined strings share the sorted intersection as a prefix, so
    // their distance is the distance between the differences alone.
    let dist = indel_distance(diff_ab_joined.as_bytes(), diff_ba_joined.as_bytes());
    let mut best = normalized_similarity(dist, sect_ab_len + sect_ba_len);

    if sect_len != 0 {
        best = best.max(normalized_similarity(sep + ab_len, sect_len + sect_ab_len));
        best = best.max(normalized_similarity(sep + ba_len, sect_len + sect_ba_len));
    }

    best.round_ties_even().clamp(0.0, 100.0) as u8
}

/// Pick the best-scoring key
///
/// Returns the index of the first key holding the maximum score. Keys that
/// score 0 are never selected.
pub fn best_match<'a, I>(query: &str, keys: I) -> Option<(usize, u8)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, u8)> = None;

    for (index, key) in keys.into_iter().enumerate() {
        let score = token_set_ratio(query, key);
        let current = best.map_or(0, |(_, s)| s);
        if score > current {
            best = Some((index, score));
        }
    }

    best
}

/// Insertion/deletion edit distance: `len(a) + len(b) - 2 * LCS(a, b)`
fn indel_distance(a: &[u8], b: &[u8]) -> usize {
    a.len() + b.len() - 2 * lcs_len(a, b)
}

fn lcs_len(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn normalized_similarity(dist: usize, lensum: usize) -> f64 {
    if lensum == 0 {
        return 100.0;
    }
    100.0 * (1.0 - dist as f64 / lensum as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_preprocess() {
        assert_eq!(preprocess("  What's TCP/UDP?  "), "what s tcp udp");
        assert_eq!(preprocess("⏱️ Big-O"), "big o");
        assert_eq!(preprocess("!!!"), "");
    }

    #[test]
    fn test_identical_strings() {
        assert_eq!(
            token_set_ratio(
                "explain big o notation with examples",
                "Explain Big O notation with examples"
            ),
            100
        );
    }

    #[test]
    fn test_superset_scores_full() {
        assert_eq!(
            token_set_ratio(
                "can you please explain big o notation with some examples thanks",
                "explain big o notation with examples"
            ),
            100
        );
        assert_eq!(token_set_ratio("fuzzy was a bear", "fuzzy fuzzy was a bear"), 100);
    }

    #[test]
    fn test_reordering_ignored() {
        assert_eq!(
            token_set_ratio(
                "new york mets vs atlanta braves",
                "atlanta braves vs new york mets"
            ),
            100
        );
    }

    #[test]
    fn test_disjoint_single_tokens() {
        // indel("abc", "abd") = 2 over 6 chars
        assert_eq!(token_set_ratio("abc", "abd"), 67);
    }

    #[test]
    fn test_partial_overlap() {
        // "tcp" vs "tcp udp" is the best pair: 1 - 4/10
        assert_eq!(token_set_ratio("what tcp", "tcp udp"), 60);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(token_set_ratio("", "anything"), 0);
        assert_eq!(token_set_ratio("???", "anything"), 0);
    }

    #[test]
    fn test_unrelated_question_below_threshold() {
        let keys = [
            "Explain quantum computing in simple terms",
            "Help me understand recursion",
            "What is the difference between TCP and UDP?",
            "Explain Big O notation with examples",
        ];
        for key in keys {
            assert!(token_set_ratio("what time is it", key) < DEFAULT_THRESHOLD);
        }
    }

    #[test]
    fn test_best_match_keeps_first_on_tie() {
        let keys = ["alpha beta", "beta alpha", "gamma"];
        assert_eq!(best_match("alpha beta", keys), Some((0, 100)));
    }

    #[test]
    fn test_best_match_none_when_all_zero() {
        let keys = ["alpha"];
        assert_eq!(best_match("", keys), None);
    }

    proptest! {
        #[test]
        fn prop_symmetric(a in "[a-z ]{0,30}", b in "[a-z ]{0,30}") {
            prop_assert_eq!(token_set_ratio(&a, &b), token_set_ratio(&b, &a));
        }

        #[test]
        fn prop_subset_scores_full(words in prop::collection::vec("[a-z]{1,8}", 1..6), extra in prop::collection::vec("[a-z]{1,8}", 0..4)) {
            let key = words.join(" ");
            let mut padded = extra.clone();
            padded.extend(words.iter().rev().cloned());
            padded.extend(words.iter().cloned());
            prop_assert_eq!(token_set_ratio(&padded.join(" "), &key), 100);
        }

        #[test]
        fn prop_bounded(a in ".{0,40}", b in ".{0,40}") {
            prop_assert!(token_set_ratio(&a, &b) <= 100);
        }
    }
}
