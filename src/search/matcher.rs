//! Skill matching and "did you mean" suggestions.
//!
//! A skill matches when its normalized label equals the normalized query
//! ([`MatchKind::Exact`]) or contains it ([`MatchKind::Partial`]). Candidates
//! rank by their best match kind, then by how many of their skills matched,
//! then by input order.
//!
//! When nothing matches, the query is compared against the known vocabulary
//! (every candidate skill plus the configured extra terms) with normalized
//! Levenshtein similarity, and the best term at or above the threshold is
//! offered as a suggestion.

use itertools::Itertools;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::config::MatchingConfig;
use crate::model::types::{
    Candidate, MatchKind, MatchResult, RankedMatch, Suggestion, normalize_label,
};

/// Score added per matching skill beyond the first.
const EXTRA_SKILL_BONUS: f32 = 0.05;

/// Upper bound on the extra-skill bonus so a partial match never outranks
/// an exact one on score alone.
const MAX_EXTRA_BONUS: f32 = 0.45;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("match computation failed: {0}")]
    Computation(String),
}

pub type SearchResult<T> = Result<T, SearchError>;

/// Anything that can turn a candidate snapshot and a raw query into ranked
/// matches. The orchestrator is generic over this so tests can count or fail
/// invocations.
pub trait Matcher {
    fn search(&self, candidates: &[Candidate], raw_query: &str) -> SearchResult<MatchResult>;
}

impl<M: Matcher + ?Sized> Matcher for &M {
    fn search(&self, candidates: &[Candidate], raw_query: &str) -> SearchResult<MatchResult> {
        (**self).search(candidates, raw_query)
    }
}

#[derive(Debug, Clone)]
pub struct MatchEngine {
    suggestion_threshold: f64,
    max_results: usize,
    vocabulary: BTreeSet<String>,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::from_config(&MatchingConfig::default())
    }
}

impl MatchEngine {
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self {
            suggestion_threshold: config.suggestion_threshold,
            max_results: config.max_results.max(1),
            vocabulary: config
                .vocabulary
                .iter()
                .map(|term| normalize_label(term))
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }

    pub fn suggestion_threshold(&self) -> f64 {
        self.suggestion_threshold
    }

    fn rank(&self, candidates: &[Candidate], query: &str) -> Vec<RankedMatch> {
        let mut skipped = 0usize;
        let mut scored: Vec<(usize, RankedMatch)> = Vec::new();

        for (idx, candidate) in candidates.iter().enumerate() {
            let mut best: Option<MatchKind> = None;
            let mut matched_skills = Vec::new();

            for skill in &candidate.skills {
                let Some(label) = skill.normalized() else {
                    if skill.label().is_none() {
                        skipped += 1;
                    }
                    continue;
                };
                let kind = if label == query {
                    MatchKind::Exact
                } else if label.contains(query) {
                    MatchKind::Partial
                } else {
                    continue;
                };
                best = best.max(Some(kind));
                matched_skills.push(label);
            }

            if let Some(kind) = best {
                let extra = (matched_skills.len() - 1) as f32 * EXTRA_SKILL_BONUS;
                scored.push((
                    idx,
                    RankedMatch {
                        candidate: candidate.clone(),
                        score: kind.weight() + extra.min(MAX_EXTRA_BONUS),
                        kind,
                        matched_skills,
                    },
                ));
            }
        }

        if skipped > 0 {
            tracing::debug!(skipped, "unrecognized_skill_entries");
        }

        scored.sort_by(|(a_idx, a), (b_idx, b)| {
            b.kind
                .cmp(&a.kind)
                .then_with(|| b.matched_skills.len().cmp(&a.matched_skills.len()))
                .then_with(|| a_idx.cmp(b_idx))
        });
        scored
            .into_iter()
            .take(self.max_results)
            .map(|(_, m)| m)
            .collect()
    }

    /// Best vocabulary term for a query that matched nothing.
    pub fn suggest(&self, candidates: &[Candidate], query: &str) -> Option<Suggestion> {
        if query.is_empty() {
            return None;
        }

        let known = candidates
            .iter()
            .flat_map(|c| c.skills.iter().filter_map(|s| s.normalized()));

        self.vocabulary
            .iter()
            .cloned()
            .chain(known)
            .filter(|term| term != query)
            .unique()
            .map(|term| {
                let confidence = strsim::normalized_levenshtein(query, &term);
                (term, confidence)
            })
            .filter(|(_, confidence)| *confidence >= self.suggestion_threshold)
            .max_by(|(a_term, a_conf), (b_term, b_conf)| {
                a_conf
                    .total_cmp(b_conf)
                    .then_with(|| b_term.cmp(a_term))
            })
            .map(|(term, confidence)| Suggestion { term, confidence })
    }
}

impl Matcher for MatchEngine {
    fn search(&self, candidates: &[Candidate], raw_query: &str) -> SearchResult<MatchResult> {
        let query = normalize_label(raw_query);
        if query.is_empty() {
            return Ok(MatchResult::empty(query));
        }

        let matches = self.rank(candidates, &query);
        let suggestion = if matches.is_empty() {
            self.suggest(candidates, &query)
        } else {
            None
        };

        Ok(MatchResult {
            query,
            matches,
            suggestion,
        })
    }
}
