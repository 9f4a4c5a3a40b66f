//! Name similarity scoring.
//!
//! Every measure works on already-normalized strings, is symmetric and
//! deterministic, stays in [0, 1] and scores identical inputs exactly 1.0.

use std::collections::BTreeSet;

use crate::config::SimilarityMeasure;

pub trait Similarity: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Floor applied when one name's tokens are all contained in the other's.
const CONTAINMENT_BASE: f64 = 0.8;

/// Best of character edit ratio, token Jaccard and token containment.
///
/// Containment covers the common invoice case where the document prints a
/// shortened form of the registered name ("Juan Perez" for
/// "Juan Carlos Perez Martinez").
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSet;

impl Similarity for TokenSet {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let edit = strsim::normalized_levenshtein(a, b);

        let left: BTreeSet<&str> = a.split_whitespace().collect();
        let right: BTreeSet<&str> = b.split_whitespace().collect();
        let shared = left.intersection(&right).count();
        let union = left.union(&right).count();
        let jaccard = if union == 0 { 0.0 } else { shared as f64 / union as f64 };

        let (small, large) = if left.len() <= right.len() {
            (&left, &right)
        } else {
            (&right, &left)
        };
        let containment = if !small.is_empty() && small.is_subset(large) {
            CONTAINMENT_BASE + (1.0 - CONTAINMENT_BASE) * small.len() as f64 / large.len() as f64
        } else {
            0.0
        };

        edit.max(jaccard).max(containment).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl Similarity for Levenshtein {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        strsim::normalized_levenshtein(a, b)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl Similarity for JaroWinkler {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        // Greedy Jaro matching depends on argument order; fix it.
        if a <= b {
            strsim::jaro_winkler(a, b)
        } else {
            strsim::jaro_winkler(b, a)
        }
    }
}

pub fn for_measure(measure: SimilarityMeasure) -> Box<dyn Similarity> {
    match measure {
        SimilarityMeasure::TokenSet => Box::new(TokenSet),
        SimilarityMeasure::Levenshtein => Box::new(Levenshtein),
        SimilarityMeasure::JaroWinkler => Box::new(JaroWinkler),
    }
}
