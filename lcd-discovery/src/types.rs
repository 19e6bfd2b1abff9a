//! Core value types for candidate discovery
//!
//! Defines the data contracts between the pipeline stages:
//! - **Observation:** one source's sighting of a candidate (adapter output)
//! - **MergedCandidate:** one resolved candidate (deduplicator output)
//! - **ConflictRecord:** a recorded party disagreement (conflict detector output)
//! - **SourceResult / AggregationResult:** per-run outputs (aggregator output)
//!
//! All types are plain serde values so a downstream store can persist them.

use chrono::{DateTime, Utc};
use lcd_common::DistrictId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// Party, confidence, filing status
// ============================================================================

/// Party affiliation, normalized to a closed code set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Party {
    #[serde(rename = "D")]
    Democratic,
    #[serde(rename = "R")]
    Republican,
    #[serde(rename = "I")]
    Independent,
    #[serde(rename = "O")]
    Other,
}

impl Party {
    /// Single-letter party code
    pub fn code(&self) -> &'static str {
        match self {
            Party::Democratic => "D",
            Party::Republican => "R",
            Party::Independent => "I",
            Party::Other => "O",
        }
    }

    /// Normalize a free-text party label
    ///
    /// Returns `None` for empty or unrecognized text.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .trim()
            .trim_end_matches(" Party")
            .trim_end_matches(" party")
            .trim()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "d" | "dem" | "democrat" | "democratic" => Some(Party::Democratic),
            "r" | "rep" | "gop" | "republican" => Some(Party::Republican),
            "i" | "ind" | "independent" | "nonpartisan" | "unaffiliated" => {
                Some(Party::Independent)
            }
            "o" | "other" | "libertarian" | "lib" | "green" | "constitution" | "working families"
            | "alliance" | "united citizens" | "american" => Some(Party::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// How confident a source is about the party it reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartyConfidence {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl PartyConfidence {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => PartyConfidence::High,
            "medium" => PartyConfidence::Medium,
            "low" => PartyConfidence::Low,
            _ => PartyConfidence::Unknown,
        }
    }
}

impl fmt::Display for PartyConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PartyConfidence::High => "HIGH",
            PartyConfidence::Medium => "MEDIUM",
            PartyConfidence::Low => "LOW",
            PartyConfidence::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Filing status, ordered from least to most advanced
///
/// `max()` over a set of statuses yields the most advanced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilingStatus {
    #[default]
    Unknown,
    Rumored,
    Declared,
    Filed,
    Certified,
}

impl FilingStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "certified" => FilingStatus::Certified,
            "filed" => FilingStatus::Filed,
            "declared" => FilingStatus::Declared,
            "rumored" => FilingStatus::Rumored,
            _ => FilingStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Certified => "certified",
            FilingStatus::Filed => "filed",
            FilingStatus::Declared => "declared",
            FilingStatus::Rumored => "rumored",
            FilingStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Observation (adapter output)
// ============================================================================

/// Source-specific data attached to an observation
pub type ExtraData = BTreeMap<String, serde_json::Value>;

/// One source's sighting of a candidate
///
/// Built once by a source adapter through [`Observation::new`] and the
/// `with_*` builders; treated as immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub name: String,
    pub district: DistrictId,
    pub party: Option<Party>,
    #[serde(default)]
    pub party_confidence: PartyConfidence,
    pub source: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub filing_status: FilingStatus,
    pub discovered_at: DateTime<Utc>,
    #[serde(default)]
    pub incumbent: bool,
    #[serde(default)]
    pub extra: ExtraData,
}

impl Observation {
    /// New observation discovered now, with no party and unknown status
    pub fn new(name: impl Into<String>, district: DistrictId, source: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            district,
            party: None,
            party_confidence: PartyConfidence::Unknown,
            source: source.into(),
            source_url: String::new(),
            filing_status: FilingStatus::Unknown,
            discovered_at: Utc::now(),
            incumbent: false,
            extra: ExtraData::new(),
        }
    }

    pub fn with_party(mut self, party: Party, confidence: PartyConfidence) -> Self {
        self.party = Some(party);
        self.party_confidence = confidence;
        self
    }

    /// Set party from free text; unrecognized labels leave the party unset
    pub fn with_party_label(mut self, label: &str, confidence: PartyConfidence) -> Self {
        self.party = Party::from_label(label);
        self.party_confidence = if self.party.is_some() {
            confidence
        } else {
            PartyConfidence::Unknown
        };
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    pub fn with_filing_status(mut self, status: FilingStatus) -> Self {
        self.filing_status = status;
        self
    }

    pub fn with_discovered_at(mut self, at: DateTime<Utc>) -> Self {
        self.discovered_at = at;
        self
    }

    pub fn with_incumbent(mut self, incumbent: bool) -> Self {
        self.incumbent = incumbent;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

// ============================================================================
// Merged candidate (deduplicator output)
// ============================================================================

/// One resolved real-world candidate, built from a cluster of observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCandidate {
    /// Canonical name from the highest-priority observation
    pub name: String,
    pub district: DistrictId,
    pub party: Option<Party>,
    pub party_confidence: PartyConfidence,
    /// Source that supplied the resolved party
    pub party_source: Option<String>,
    /// Source that supplied the canonical name
    pub primary_source: String,
    /// Contributing sources (never empty)
    pub sources: BTreeSet<String>,
    pub source_urls: BTreeMap<String, String>,
    pub filing_status: FilingStatus,
    pub incumbent: bool,
    /// Earliest discovery timestamp among contributors
    pub first_discovered: DateTime<Utc>,
    /// Contributing observations in priority order
    pub observations: Vec<Observation>,
}

impl MergedCandidate {
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn is_multi_source(&self) -> bool {
        self.sources.len() > 1
    }
}

// ============================================================================
// Conflicts
// ============================================================================

/// Attribute a conflict is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Party,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Party => f.write_str("party"),
        }
    }
}

/// One observed value in a conflict, with its source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictValue {
    pub value: String,
    pub source: String,
    pub priority: u32,
}

/// A disagreement between sources about one merged candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub candidate_name: String,
    pub district: DistrictId,
    pub kind: ConflictKind,
    pub values: Vec<ConflictValue>,
    pub resolved_value: Option<String>,
    pub resolved_source: Option<String>,
    pub requires_review: bool,
    pub explanation: String,
}

// ============================================================================
// Aggregation outputs
// ============================================================================

/// Outcome of one source call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceResult {
    pub source: String,
    pub priority: u32,
    pub success: bool,
    pub observations: Vec<Observation>,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl SourceResult {
    pub fn succeeded(source: &str, priority: u32, observations: Vec<Observation>, elapsed: Duration) -> Self {
        Self {
            source: source.to_string(),
            priority,
            success: true,
            observations,
            error: None,
            elapsed,
        }
    }

    pub fn failed(source: &str, priority: u32, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            source: source.to_string(),
            priority,
            success: false,
            observations: Vec::new(),
            error: Some(error.into()),
            elapsed,
        }
    }
}

/// Output of one aggregation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    pub run_id: Uuid,
    pub candidates: Vec<MergedCandidate>,
    pub source_results: Vec<SourceResult>,
    pub conflicts: Vec<ConflictRecord>,
    pub total_raw: usize,
    pub total_deduplicated: usize,
    pub run_at: DateTime<Utc>,
}

impl AggregationResult {
    /// Result with no sources and no candidates
    pub fn empty() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            candidates: Vec::new(),
            source_results: Vec::new(),
            conflicts: Vec::new(),
            total_raw: 0,
            total_deduplicated: 0,
            run_at: Utc::now(),
        }
    }

    pub fn successful_sources(&self) -> Vec<&str> {
        self.source_results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.source.as_str())
            .collect()
    }

    pub fn failed_sources(&self) -> Vec<&str> {
        self.source_results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.source.as_str())
            .collect()
    }

    pub fn candidates_in<'a>(&'a self, district: &'a DistrictId) -> impl Iterator<Item = &'a MergedCandidate> + 'a {
        self.candidates.iter().filter(move |c| &c.district == district)
    }

    /// Conflicts flagged for human review
    pub fn review_queue(&self) -> Vec<&ConflictRecord> {
        self.conflicts.iter().filter(|c| c.requires_review).collect()
    }
}
