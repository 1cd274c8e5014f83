// 🔤 Similarity - Token-order-insensitive string scores (0-100)
//
// Both metrics first split on whitespace, sort the tokens and re-join them
// with one space, so "SMITH JOHN" and "JOHN SMITH" always score 100.
//
//   Indel        100 * 2 * LCS(a, b) / (len(a) + len(b)), the classic
//                token_sort_ratio used by rapidfuzz/fuzzywuzzy (default)
//   JaroWinkler  strsim::jaro_winkler on the sorted strings, scaled to 100.
//                The prefix bonus is capped at 4 chars, so a name that only
//                extends another ("PRIYA" / "PRIYANKA") stays below 100.
//
// Comparison is on chars and case-sensitive; callers pass normalized names.
// A blank side always scores 0 so empty names never match each other.

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Token-sorted Indel ratio (rapidfuzz `token_sort_ratio`).
    #[default]
    Indel,

    /// Token-sorted Jaro-Winkler. Forgiving of typos in short names.
    JaroWinkler,
}

impl SimilarityMetric {
    /// Symmetric similarity, 0.0 - 100.0
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityMetric::JaroWinkler => token_sort_jaro_winkler(a, b),
            SimilarityMetric::Indel => token_sort_ratio(a, b),
        }
    }
}

/// Sort the whitespace-separated tokens of a string.
pub fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

// ============================================================================
// INDEL (token_sort_ratio)
// ============================================================================

/// Indel-normalized similarity of two strings, 0.0 - 100.0.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let lcs = lcs_length(&a, &b);
    200.0 * lcs as f64 / (a.len() + b.len()) as f64
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Longest common subsequence length, one DP row at a time.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    // Keep the shorter string as the row
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];

    for oc in outer {
        for (j, ic) in inner.iter().enumerate() {
            curr[j + 1] = if oc == ic {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[inner.len()]
}

// ============================================================================
// JARO-WINKLER
// ============================================================================

pub fn token_sort_jaro_winkler(a: &str, b: &str) -> f64 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Greedy Jaro matching is not guaranteed symmetric; fix the argument order.
    let (first, second) = if a <= b { (&a, &b) } else { (&b, &a) };
    jaro_winkler(first, second) * 100.0
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: [SimilarityMetric; 2] = [SimilarityMetric::JaroWinkler, SimilarityMetric::Indel];

    #[test]
    fn test_identical_strings() {
        for metric in METRICS {
            assert!((metric.score("JOHN SMITH", "JOHN SMITH") - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_word_order_ignored() {
        for metric in METRICS {
            assert!((metric.score("SMITH JOHN", "JOHN SMITH") - 100.0).abs() < 1e-9);
            assert!((metric.score("  JOHN   SMITH ", "SMITH JOHN") - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_indel_known_scores() {
        // LCS("JOHN SMITH", "JON SMYTH") = 8, lengths 10 + 9
        let score = token_sort_ratio("JOHN SMITH", "JON SMYTH");
        assert!((score - 1600.0 / 19.0).abs() < 1e-9);

        // LCS = 5 of 5 + 6
        assert!((token_sort_ratio("KUMAR", "KUMARA") - 1000.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_jaro_winkler_tolerates_spelling_variants() {
        let score = token_sort_jaro_winkler("JOHN SMITH", "JON SMYTH");
        assert!(score >= 85.0, "score was {}", score);
        assert!(score < 100.0);
    }

    #[test]
    fn test_unrelated_names_score_low() {
        for metric in METRICS {
            assert!(metric.score("JOHN SMITH", "RAVI KUMAR") < 70.0);
            assert!(metric.score("ACME TRADING", "ZENITH HOLDINGS") < 70.0);
        }
    }

    #[test]
    fn test_longer_name_is_not_an_exact_match() {
        let pairs = [
            ("PRIYA PATEL", "PRIYANKA PATEL"),
            ("RAMESH KUMAR", "RAMESH KUMAR SINGH"),
            ("KUMAR", "KUMARAN"),
        ];

        for metric in METRICS {
            for (a, b) in pairs {
                let score = metric.score(a, b);
                assert!(score < 100.0, "{:?} {} / {} scored {}", metric, a, b, score);
            }
        }

        // Indel keeps both pairs under the default 90 name threshold
        assert!(token_sort_ratio("PRIYA PATEL", "PRIYANKA PATEL") < 90.0);
        assert!(token_sort_ratio("RAMESH KUMAR", "RAMESH KUMAR SINGH") < 90.0);
    }

    #[test]
    fn test_default_metric_is_indel() {
        assert_eq!(SimilarityMetric::default(), SimilarityMetric::Indel);
    }

    #[test]
    fn test_empty_never_matches() {
        for metric in METRICS {
            assert_eq!(metric.score("", ""), 0.0);
            assert_eq!(metric.score("JOHN", ""), 0.0);
            assert_eq!(metric.score("   ", "JOHN"), 0.0);
        }
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("JOHN SMITH", "JON SMYTH"),
            ("A B C", "C B"),
            ("RAMESH KUMAR", "KUMAR RAMESH SINGH"),
            ("ÅSA NILSSON", "ASA NILSON"),
            ("X", "XYZ"),
            ("AABAB", "BAABA"),
        ];

        for metric in METRICS {
            for (a, b) in pairs {
                assert_eq!(metric.score(a, b), metric.score(b, a), "{:?} {} / {}", metric, a, b);
            }
        }
    }

    #[test]
    fn test_lcs_length() {
        let a: Vec<char> = "ABCBDAB".chars().collect();
        let b: Vec<char> = "BDCABA".chars().collect();
        assert_eq!(lcs_length(&a, &b), 4);
    }
}
