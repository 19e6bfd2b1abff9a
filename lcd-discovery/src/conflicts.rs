//! Party conflict detection
//!
//! Runs over merged candidates after deduplication. A candidate with more
//! than one contributing source whose observations report two or more
//! distinct parties yields a [`ConflictRecord`]. The record keeps the party
//! already resolved by priority and explains the disagreement.
//!
//! Review rules (either one sends the conflict to a human):
//! 1. Sources aligned with different parties both report the candidate
//! 2. The best-ranked sources of the two leading parties are within
//!    `review_rank_gap` priority ranks of each other
//!
//! A wide priority gap means the automatic resolution is already trustworthy.

use crate::sources::priority;
use crate::types::{ConflictKind, ConflictRecord, ConflictValue, MergedCandidate, Party};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Default rank distance at or below which a disagreement needs review
pub const DEFAULT_REVIEW_RANK_GAP: u32 = 1;

/// Detects party disagreements among a candidate's contributors
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    priorities: HashMap<String, u32>,
    partisan: HashMap<String, Party>,
    review_rank_gap: u32,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self {
            priorities: HashMap::new(),
            partisan: HashMap::new(),
            review_rank_gap: DEFAULT_REVIEW_RANK_GAP,
        }
    }
}

impl ConflictDetector {
    pub fn new(priorities: HashMap<String, u32>, partisan: HashMap<String, Party>) -> Self {
        Self {
            priorities,
            partisan,
            review_rank_gap: DEFAULT_REVIEW_RANK_GAP,
        }
    }

    pub fn with_review_rank_gap(mut self, gap: u32) -> Self {
        self.review_rank_gap = gap;
        self
    }

    fn priority_of(&self, source: &str) -> u32 {
        self.priorities
            .get(source)
            .copied()
            .unwrap_or(priority::UNKNOWN)
    }

    /// Check every candidate, in order
    pub fn detect(&self, candidates: &[MergedCandidate]) -> Vec<ConflictRecord> {
        let conflicts: Vec<ConflictRecord> = candidates.iter().filter_map(|c| self.check(c)).collect();

        tracing::info!(
            "Conflict detection: candidates={}, conflicts={}, requiring review={}",
            candidates.len(),
            conflicts.len(),
            conflicts.iter().filter(|c| c.requires_review).count()
        );

        conflicts
    }

    /// Check one candidate
    pub fn check(&self, candidate: &MergedCandidate) -> Option<ConflictRecord> {
        if !candidate.is_multi_source() {
            return None;
        }

        // party -> best (lowest) priority among its reporters
        let mut best_rank: BTreeMap<Party, u32> = BTreeMap::new();
        let mut values: Vec<ConflictValue> = Vec::new();

        for obs in &candidate.observations {
            let Some(party) = obs.party else { continue };
            let rank = self.priority_of(&obs.source);

            best_rank
                .entry(party)
                .and_modify(|r| *r = (*r).min(rank))
                .or_insert(rank);
            values.push(ConflictValue {
                value: party.code().to_string(),
                source: obs.source.clone(),
                priority: rank,
            });
        }

        if best_rank.len() < 2 {
            return None;
        }

        values.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.source.cmp(&b.source)));

        let affiliations: BTreeSet<Party> = candidate
            .sources
            .iter()
            .filter_map(|s| self.partisan.get(s).copied())
            .collect();
        let partisan_clash = affiliations.len() >= 2;

        let mut ranks: Vec<u32> = best_rank.values().copied().collect();
        ranks.sort_unstable();
        let rank_gap = ranks[1] - ranks[0];
        let close_authority = rank_gap <= self.review_rank_gap;

        let requires_review = partisan_clash || close_authority;
        let explanation = explain(candidate, &values, partisan_clash, close_authority, rank_gap);

        tracing::debug!(
            "Party conflict for {} ({}): review={}",
            candidate.name,
            candidate.district,
            requires_review
        );

        Some(ConflictRecord {
            candidate_name: candidate.name.clone(),
            district: candidate.district.clone(),
            kind: ConflictKind::Party,
            values,
            resolved_value: candidate.party.map(|p| p.code().to_string()),
            resolved_source: candidate.party_source.clone(),
            requires_review,
            explanation,
        })
    }
}

fn explain(
    candidate: &MergedCandidate,
    values: &[ConflictValue],
    partisan_clash: bool,
    close_authority: bool,
    rank_gap: u32,
) -> String {
    let observed = values
        .iter()
        .map(|v| format!("{} ({}, priority {})", v.value, v.source, v.priority))
        .collect::<Vec<_>>()
        .join(", ");

    let resolution = match (&candidate.party, &candidate.party_source) {
        (Some(party), Some(source)) => format!("resolved to {} from {}", party, source),
        _ => "unresolved".to_string(),
    };

    let mut reasons = Vec::new();
    if partisan_clash {
        reasons.push("opposing partisan sources both list this candidate".to_string());
    }
    if close_authority {
        reasons.push(format!("disagreeing sources are {} priority rank(s) apart", rank_gap));
    }

    if reasons.is_empty() {
        format!(
            "Sources disagree on party: {}; {} (priority gap {}, no review needed)",
            observed, resolution, rank_gap
        )
    } else {
        format!(
            "Sources disagree on party: {}; {}; needs review: {}",
            observed,
            resolution,
            reasons.join("; ")
        )
    }
}
