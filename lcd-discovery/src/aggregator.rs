//! Multi-source aggregation
//!
//! Pipeline for one run:
//! 1. Fan out: call every adapter concurrently, each call time-bounded
//! 2. Fan in: wait for every adapter to succeed, fail or time out
//! 3. Deduplicate the union of all successful observation lists
//! 4. Detect party conflicts over the merged candidates
//!
//! One adapter failing (error or timeout) never affects the others or aborts
//! the run; the failure is recorded in that adapter's [`SourceResult`].

use crate::conflicts::{ConflictDetector, DEFAULT_REVIEW_RANK_GAP};
use crate::dedup::{Deduplicator, NameMatcher, DEFAULT_SIMILARITY_THRESHOLD};
use crate::sources::{SourceAdapter, SourceError};
use crate::types::{AggregationResult, Observation, Party, SourceResult};
use chrono::Utc;
use futures::future::join_all;
use lcd_common::{Chamber, DistrictId};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Default per-source call timeout
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(60);

/// Aggregator settings
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Name similarity needed to cluster two observations
    pub similarity_threshold: f64,
    /// Upper bound on each adapter call
    pub source_timeout: Duration,
    /// Priority distance at or below which party conflicts need review
    pub review_rank_gap: u32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            review_rank_gap: DEFAULT_REVIEW_RANK_GAP,
        }
    }
}

/// Orchestrates one discovery run across all configured sources
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Discover candidates for the given chambers from every source
    pub async fn aggregate(
        &self,
        sources: &[Arc<dyn SourceAdapter>],
        chambers: &BTreeSet<Chamber>,
    ) -> AggregationResult {
        info!(
            "Starting aggregation: {} source(s), chambers={:?}",
            sources.len(),
            chambers
        );

        let source_results = self
            .collect(sources, |source| source.discover(chambers))
            .await;
        self.finish(sources, source_results)
    }

    /// Look up a single district in every source
    pub async fn aggregate_district(
        &self,
        sources: &[Arc<dyn SourceAdapter>],
        district: &DistrictId,
    ) -> AggregationResult {
        info!(
            "Starting district lookup: {} source(s), district={}",
            sources.len(),
            district
        );

        let source_results = self
            .collect(sources, |source| source.lookup(district))
            .await;
        self.finish(sources, source_results)
    }

    /// Run one call per source concurrently and wait for all of them
    ///
    /// Results come back in ascending priority order regardless of which
    /// call finished first.
    async fn collect<'a, F, Fut>(
        &self,
        sources: &'a [Arc<dyn SourceAdapter>],
        call: F,
    ) -> Vec<SourceResult>
    where
        F: Fn(&'a dyn SourceAdapter) -> Fut,
        Fut: Future<Output = Result<Vec<Observation>, SourceError>> + 'a,
    {
        let mut ordered: Vec<&'a Arc<dyn SourceAdapter>> = sources.iter().collect();
        ordered.sort_by_key(|s| s.priority());

        let mut seen = BTreeSet::new();
        for source in &ordered {
            if !seen.insert(source.identifier()) {
                warn!("Source identifier '{}' registered more than once", source.identifier());
            }
        }

        let timeout = self.config.source_timeout;
        let calls = ordered.into_iter().map(|source| {
            let adapter: &'a dyn SourceAdapter = source.as_ref();
            let pending = call(adapter);
            async move {
                let started = Instant::now();
                let outcome = tokio::time::timeout(timeout, pending).await;
                let elapsed = started.elapsed();

                let id = adapter.identifier();
                let priority = adapter.priority();
                match outcome {
                    Ok(Ok(observations)) => {
                        info!(
                            "Source {} (priority {}): {} observation(s) in {:?}",
                            id,
                            priority,
                            observations.len(),
                            elapsed
                        );
                        SourceResult::succeeded(id, priority, observations, elapsed)
                    }
                    Ok(Err(e)) => {
                        warn!("Source {} failed after {:?}: {}", id, elapsed, e);
                        SourceResult::failed(id, priority, e.to_string(), elapsed)
                    }
                    Err(_) => {
                        let e = SourceError::Timeout(timeout);
                        warn!("Source {} failed: {}", id, e);
                        SourceResult::failed(id, priority, e.to_string(), elapsed)
                    }
                }
            }
        });

        join_all(calls).await
    }

    /// Deduplicate and check conflicts once every source has reported
    fn finish(
        &self,
        sources: &[Arc<dyn SourceAdapter>],
        source_results: Vec<SourceResult>,
    ) -> AggregationResult {
        let priorities: HashMap<String, u32> = sources
            .iter()
            .map(|s| (s.identifier().to_string(), s.priority()))
            .collect();
        let partisan: HashMap<String, Party> = sources
            .iter()
            .filter_map(|s| s.partisan_affiliation().map(|p| (s.identifier().to_string(), p)))
            .collect();

        let raw: Vec<Observation> = source_results
            .iter()
            .filter(|r| r.success)
            .flat_map(|r| r.observations.iter().cloned())
            .collect();

        let deduplicator = Deduplicator::new(NameMatcher::new(self.config.similarity_threshold))
            .with_priorities(priorities.clone());
        let candidates = deduplicator.deduplicate(&raw);

        let conflicts = ConflictDetector::new(priorities, partisan)
            .with_review_rank_gap(self.config.review_rank_gap)
            .detect(&candidates);

        let result = AggregationResult {
            run_id: Uuid::new_v4(),
            total_raw: raw.len(),
            total_deduplicated: candidates.len(),
            candidates,
            source_results,
            conflicts,
            run_at: Utc::now(),
        };

        info!(
            "Aggregation complete: run={}, raw={}, deduplicated={}, conflicts={}, failed sources={:?}",
            result.run_id,
            result.total_raw,
            result.total_deduplicated,
            result.conflicts.len(),
            result.failed_sources()
        );

        result
    }
}
