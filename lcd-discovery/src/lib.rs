//! lcd-discovery: candidate discovery aggregation
//!
//! Gathers candidate sightings ("observations") from independent sources,
//! collapses sightings of the same person into merged candidates, flags
//! party disagreements, and reports how much of the district map is covered.
//!
//! Pipeline: [`sources`] → [`aggregator`] → [`dedup`] → [`conflicts`] →
//! [`coverage`].

pub mod aggregator;
pub mod config;
pub mod conflicts;
pub mod coverage;
pub mod dedup;
pub mod sources;
pub mod types;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use config::DiscoveryConfig;
pub use conflicts::ConflictDetector;
pub use coverage::{format_html, format_summary, format_text, CoverageReport, CoverageReporter};
pub use dedup::{Deduplicator, NameMatcher};
pub use sources::{FileSource, RateLimiter, SourceAdapter, SourceError};
pub use types::{
    AggregationResult, ConflictRecord, FilingStatus, MergedCandidate, Observation, Party,
    PartyConfidence, SourceResult,
};
