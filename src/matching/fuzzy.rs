//! Fuzzy ranking of recognized text against the dataset index.

use std::sync::Arc;

use super::normalize::normalize;
use crate::dataset::{DatasetIndex, ReferenceRecord};

/// Length ratio at which partial (windowed) matching kicks in.
const PARTIAL_LENGTH_RATIO: f64 = 1.5;

/// Shortest string that is matched against windows of a longer one.
const MIN_PARTIAL_LEN: usize = 4;

/// Weight applied to partial-match scores so a full match always wins a tie.
const PARTIAL_SCALE: f64 = 0.9;

/// A scored potential match between recognized text and a reference code.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub record: Arc<ReferenceRecord>,
    /// Similarity in 0..=100
    pub score: u8,
}

impl MatchCandidate {
    pub fn code(&self) -> &str {
        &self.record.code
    }

    /// True when both candidates name the same code with the same score.
    pub fn same_as(&self, other: &MatchCandidate) -> bool {
        self.code() == other.code() && self.score == other.score
    }
}

/// Scores queries against every code in an index.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    /// Candidates scoring below this are dropped
    pub min_score: u8,
    /// Maximum number of candidates returned
    pub limit: usize,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            min_score: 70,
            limit: 5,
        }
    }
}

impl FuzzyMatcher {
    pub fn new(min_score: u8, limit: usize) -> Self {
        Self { min_score, limit }
    }

    /// Ranks every code in `index` against `query`.
    ///
    /// The query is normalized first. Results are ordered by descending
    /// score; equal scores keep index order. Only candidates at or above
    /// `min_score` are returned, at most `limit` of them.
    pub fn rank_candidates(&self, query: &str, index: &DatasetIndex) -> Vec<MatchCandidate> {
        let query = normalize(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<MatchCandidate> = index
            .records()
            .filter_map(|record| {
                let score = similarity(&query, &record.code);
                (score >= self.min_score).then(|| MatchCandidate {
                    record: Arc::clone(record),
                    score,
                })
            })
            .collect();

        // Stable sort keeps index order among equal scores.
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates.truncate(self.limit);
        candidates
    }

    /// Returns the top-ranked candidate, if any clears the threshold.
    pub fn best_candidate(&self, query: &str, index: &DatasetIndex) -> Option<MatchCandidate> {
        self.rank_candidates(query, index).into_iter().next()
    }
}

/// Similarity between two normalized strings, 0..=100.
///
/// Whole-string normalized Levenshtein similarity. When one string is much
/// longer than the other, the shorter one is also compared against every
/// equal-length window of the longer one (OCR often picks up surrounding
/// characters) and the scaled best window score is taken if higher.
pub fn similarity(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }

    let full = strsim::normalized_levenshtein(a, b);

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a_chars.len() <= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };

    let mut best = full;
    let length_ratio = longer.len() as f64 / shorter.len().max(1) as f64;
    if shorter.len() >= MIN_PARTIAL_LEN && length_ratio >= PARTIAL_LENGTH_RATIO {
        let needle: String = shorter.iter().collect();
        let partial = longer
            .windows(shorter.len())
            .map(|window| {
                let window: String = window.iter().collect();
                strsim::normalized_levenshtein(&needle, &window)
            })
            .fold(0.0_f64, f64::max);
        best = best.max(partial * PARTIAL_SCALE);
    }

    (best * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index() -> DatasetIndex {
        DatasetIndex::build(&json!({
            "supports": {
                "kitasan-black": {
                    "Just a Little Longer": ["Speed +10"],
                    "Festival Fun": ["Energy +20"],
                    "Festival Run": ["Guts +5"]
                },
                "super-creek": {
                    "Tea Time": ["Wisdom +5"]
                }
            },
            "umas": {
                "special-week": {
                    "Dream Big": ["Guts +15"],
                    "Extra Training": ["Power +10", "Speed +10"]
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_exact_code_scores_100_and_ranks_first() {
        let index = index();
        let matcher = FuzzyMatcher::default();

        for record in index.records() {
            let ranked = matcher.rank_candidates(&record.code, &index);
            assert_eq!(ranked[0].code(), record.code);
            assert_eq!(ranked[0].score, 100);
        }
    }

    #[test]
    fn test_query_is_normalized_before_matching() {
        let index = index();
        let best = FuzzyMatcher::default()
            .best_candidate("  just a little-longer ", &index)
            .unwrap();
        assert_eq!(best.code(), "JUSTALITTLELONGER");
        assert_eq!(best.score, 100);
    }

    #[test]
    fn test_all_candidates_clear_threshold() {
        let index = index();
        let matcher = FuzzyMatcher::new(70, 10);

        for query in ["FESTIVALFUM", "TEATIM", "DREAMB1G", "XYZ", "EXTRATRAINNG", "FEST"] {
            for candidate in matcher.rank_candidates(query, &index) {
                assert!(candidate.score >= 70, "{} scored {}", candidate.code(), candidate.score);
            }
        }
    }

    #[test]
    fn test_ranked_descending_with_index_order_ties() {
        let index = index();
        let ranked = FuzzyMatcher::new(50, 10).rank_candidates("FESTIVALXUN", &index);

        assert!(ranked.len() >= 2);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        // FUN and RUN are one substitution apart from the query: equal scores,
        // so file order decides.
        assert_eq!(ranked[0].code(), "FESTIVALFUN");
        assert_eq!(ranked[1].code(), "FESTIVALRUN");
        assert_eq!(ranked[0].score, ranked[1].score);
    }

    #[test]
    fn test_no_candidate_for_unrelated_text() {
        let index = index();
        let matcher = FuzzyMatcher::default();
        assert!(matcher.rank_candidates("QQQQQQQQ", &index).is_empty());
        assert!(matcher.best_candidate("QQQQQQQQ", &index).is_none());
        assert!(matcher.rank_candidates("  ( ) ", &index).is_empty());
    }

    #[test]
    fn test_limit_truncates() {
        let index = index();
        let ranked = FuzzyMatcher::new(0, 2).rank_candidates("TEATIME", &index);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].code(), "TEATIME");
    }

    #[test]
    fn test_similarity_partial_window() {
        // Surrounding noise picked up by OCR still finds the code.
        let score = similarity("XXTEATIMEXXXXXX", "TEATIME");
        assert_eq!(score, 90);
        assert_eq!(similarity("TEATIME", "TEATIME"), 100);
        assert!(similarity("TEATIME", "TEATIMF") < 100);
        assert!(similarity("TEATIME", "TEATIMF") > similarity("TEATIME", "TEXXIMF"));
        // Too short for windowed matching
        assert!(similarity("F", "FESTIVALFUN") < 70);
    }
}
