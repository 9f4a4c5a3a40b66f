//! Candidate resolution as an ordered chain of matcher strategies.
//!
//! Each strategy either returns a definitive outcome or declines. The chain
//! stops at the first definitive outcome, so the identifier tier always
//! takes precedence over name similarity.

use std::cmp::Ordering;

use crate::config::MatchingConfig;
use crate::model::{Candidate, CandidateKind, MatchMethod, MatchOutcome, MatchStatus, Suggestion};
use crate::normalize::Normalizer;
use crate::reference::ReferenceTable;
use crate::similarity::{self, Similarity};

pub enum Verdict {
    Definitive(MatchOutcome),
    NoOpinion,
}

pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, candidate: &Candidate, table: &ReferenceTable) -> Verdict;
}

// ---------------------------------------------------------------------------
// Tier 1: exact identifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierStrategy;

impl MatchStrategy for IdentifierStrategy {
    fn name(&self) -> &'static str {
        "identifier"
    }

    fn evaluate(&self, candidate: &Candidate, table: &ReferenceTable) -> Verdict {
        if candidate.kind != CandidateKind::Identifier {
            return Verdict::NoOpinion;
        }
        match table.get(&candidate.normalized_text) {
            Some(entry) => Verdict::Definitive(MatchOutcome::matched(
                candidate,
                MatchMethod::Identifier,
                entry,
                1.0,
            )),
            None => Verdict::NoOpinion,
        }
    }
}

// ---------------------------------------------------------------------------
// Tier 2: fuzzy name
// ---------------------------------------------------------------------------

/// Slack on the separation margin for f64 rounding: a 0.85 vs 0.80 gap
/// must clear a 0.05 margin.
const MARGIN_EPSILON: f64 = 1e-9;

pub struct NameStrategy {
    similarity: Box<dyn Similarity>,
    normalizer: Normalizer,
    threshold: f64,
    margin: f64,
    max_suggestions: usize,
    suggestion_floor: f64,
}

impl NameStrategy {
    pub fn new(config: &MatchingConfig, normalizer: Normalizer, similarity: Box<dyn Similarity>) -> Self {
        Self {
            similarity,
            normalizer,
            threshold: config.similarity_threshold,
            margin: config.minimum_separation_margin,
            max_suggestions: config.max_suggestions,
            suggestion_floor: config.suggestion_floor,
        }
    }

    /// Identifier candidates that missed the index are compared by their
    /// raw text, normalized as a name.
    fn comparison_text(&self, candidate: &Candidate) -> String {
        match candidate.kind {
            CandidateKind::Name => candidate.normalized_text.clone(),
            CandidateKind::Identifier => self.normalizer.name(&candidate.raw_text),
        }
    }

    /// `(entry index, score)` for every entry, best first; ties go to the
    /// earlier table row.
    fn rank(&self, text: &str, table: &ReferenceTable) -> Vec<(usize, f64)> {
        let entries = table.entries();
        let mut scored: Vec<(usize, f64)> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, self.similarity.score(text, &entry.normalized_name)))
            .collect();
        scored.sort_by(|(ia, a), (ib, b)| {
            b.partial_cmp(a)
                .unwrap_or(Ordering::Equal)
                .then(entries[*ia].row.cmp(&entries[*ib].row))
        });
        scored
    }

    fn suggestions(
        &self,
        ranked: &[(usize, f64)],
        table: &ReferenceTable,
        keep: impl Fn(f64) -> bool,
    ) -> Vec<Suggestion> {
        ranked
            .iter()
            .take_while(|(_, score)| keep(*score))
            .take(self.max_suggestions)
            .map(|&(i, score)| Suggestion {
                entry: table.entries()[i].clone(),
                score,
            })
            .collect()
    }
}

impl MatchStrategy for NameStrategy {
    fn name(&self) -> &'static str {
        "name"
    }

    fn evaluate(&self, candidate: &Candidate, table: &ReferenceTable) -> Verdict {
        let text = self.comparison_text(candidate);
        let ranked = self.rank(&text, table);

        let Some(&(best_index, best_score)) = ranked.first() else {
            return Verdict::Definitive(MatchOutcome::unresolved(
                candidate,
                MatchStatus::Unmatched,
                0.0,
                Vec::new(),
            ));
        };

        if best_score < self.threshold {
            let alternatives = self.suggestions(&ranked, table, |score| score >= self.suggestion_floor);
            return Verdict::Definitive(MatchOutcome::unresolved(
                candidate,
                MatchStatus::Unmatched,
                best_score,
                alternatives,
            ));
        }

        let separated = ranked
            .get(1)
            .map_or(true, |&(_, runner_up)| best_score - runner_up >= self.margin - MARGIN_EPSILON);
        if separated {
            return Verdict::Definitive(MatchOutcome::matched(
                candidate,
                MatchMethod::Name,
                &table.entries()[best_index],
                best_score,
            ));
        }

        // Contenders: everything over the threshold, plus anything inside
        // the margin of the best even if it fell just below the threshold.
        let cutoff = self.threshold.min(best_score - self.margin) - MARGIN_EPSILON;
        let alternatives = self.suggestions(&ranked, table, |score| score >= cutoff);
        Verdict::Definitive(MatchOutcome::unresolved(
            candidate,
            MatchStatus::Ambiguous,
            best_score,
            alternatives,
        ))
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct Resolver {
    strategies: Vec<Box<dyn MatchStrategy>>,
    parallel: bool,
}

impl Resolver {
    pub fn new(strategies: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self {
            strategies,
            parallel: false,
        }
    }

    /// Identifier tier, then name tier with the configured measure.
    pub fn from_config(config: &MatchingConfig, normalizer: Normalizer) -> Self {
        let name = NameStrategy::new(config, normalizer, similarity::for_measure(config.measure));
        Self {
            strategies: vec![Box::new(IdentifierStrategy), Box::new(name)],
            parallel: config.parallel,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn resolve(&self, candidate: &Candidate, table: &ReferenceTable) -> MatchOutcome {
        for strategy in &self.strategies {
            if let Verdict::Definitive(outcome) = strategy.evaluate(candidate, table) {
                log::trace!(
                    "{} '{}' -> {} via {}",
                    candidate.kind,
                    candidate.raw_text,
                    outcome.status,
                    strategy.name()
                );
                return outcome;
            }
        }
        MatchOutcome::unresolved(candidate, MatchStatus::Unmatched, 0.0, Vec::new())
    }

    /// Resolve every candidate. Output order always follows input order.
    pub fn resolve_all(&self, candidates: &[Candidate], table: &ReferenceTable) -> Vec<MatchOutcome> {
        #[cfg(feature = "parallel")]
        if self.parallel {
            use rayon::prelude::*;
            return candidates
                .par_iter()
                .map(|candidate| self.resolve(candidate, table))
                .collect();
        }

        candidates
            .iter()
            .map(|candidate| self.resolve(candidate, table))
            .collect()
    }
}
