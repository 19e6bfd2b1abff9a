//! Observation deduplication
//!
//! Algorithm:
//! 1. Partition observations by district (exact match, never across districts)
//! 2. Within a district, greedy clustering: each unclustered observation seeds
//!    a cluster and absorbs every later unclustered observation whose name
//!    matches the seed. O(n²) per district; district counts are small.
//! 3. Merge each cluster by source priority (see [`Deduplicator::merge_cluster`])
//!
//! Pure function of the input: identical input yields identical output.

pub mod name_matcher;

pub use name_matcher::{normalize_name, similarity, NameMatcher, DEFAULT_SIMILARITY_THRESHOLD};

use crate::sources::priority;
use crate::types::{MergedCandidate, Observation};
use lcd_common::DistrictId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Clusters and merges observations into candidates
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    matcher: NameMatcher,
    /// Source identifier → priority; absent sources rank last
    priorities: HashMap<String, u32>,
}

impl Deduplicator {
    pub fn new(matcher: NameMatcher) -> Self {
        Self {
            matcher,
            priorities: HashMap::new(),
        }
    }

    pub fn with_priorities(mut self, priorities: HashMap<String, u32>) -> Self {
        self.priorities = priorities;
        self
    }

    pub fn with_priority(mut self, source: impl Into<String>, rank: u32) -> Self {
        self.priorities.insert(source.into(), rank);
        self
    }

    /// Priority of a source (unknown sources rank last)
    pub fn priority_of(&self, source: &str) -> u32 {
        self.priorities
            .get(source)
            .copied()
            .unwrap_or(priority::UNKNOWN)
    }

    /// Cluster observations and merge each cluster into one candidate
    pub fn deduplicate(&self, observations: &[Observation]) -> Vec<MergedCandidate> {
        let mut merged = Vec::new();

        for (district, members) in partition_by_district(observations) {
            let clusters = self.cluster(&members);
            tracing::debug!(
                "District {}: {} observations -> {} candidates",
                district,
                members.len(),
                clusters.len()
            );

            merged.extend(clusters.into_iter().filter_map(|c| self.merge_cluster(c)));
        }

        merged
    }

    /// Greedy clustering of one district's observations
    ///
    /// Returns clusters in seed order; members keep input order.
    pub fn cluster<'a>(&self, observations: &[&'a Observation]) -> Vec<Vec<&'a Observation>> {
        let normalized: Vec<String> = observations.iter().map(|o| normalize_name(&o.name)).collect();
        let mut assigned = vec![false; observations.len()];
        let mut clusters = Vec::new();

        for seed in 0..observations.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut cluster = vec![observations[seed]];

            for other in (seed + 1)..observations.len() {
                if !assigned[other]
                    && self
                        .matcher
                        .matches_normalized(&normalized[seed], &normalized[other])
                {
                    assigned[other] = true;
                    cluster.push(observations[other]);
                }
            }

            clusters.push(cluster);
        }

        clusters
    }

    /// Merge one cluster into a candidate
    ///
    /// - Stable sort by source priority; the first entry supplies the
    ///   canonical name and primary source
    /// - Party, confidence and party source from the first entry with a party
    ///   (priority dominates confidence)
    /// - Incumbent if any contributor says so
    /// - Most advanced filing status
    /// - Earliest discovery timestamp
    /// - Union of sources and URLs (first URL per source wins)
    ///
    /// Returns `None` only for an empty cluster.
    pub fn merge_cluster(&self, cluster: Vec<&Observation>) -> Option<MergedCandidate> {
        let mut ordered: Vec<Observation> = cluster.into_iter().cloned().collect();
        ordered.sort_by_key(|o| self.priority_of(&o.source));

        let primary = ordered.first()?;
        let party_holder = ordered.iter().find(|o| o.party.is_some());

        let mut sources = BTreeSet::new();
        let mut source_urls = BTreeMap::new();
        for obs in &ordered {
            sources.insert(obs.source.clone());
            if !obs.source_url.is_empty() {
                source_urls
                    .entry(obs.source.clone())
                    .or_insert_with(|| obs.source_url.clone());
            }
        }

        let filing_status = ordered
            .iter()
            .map(|o| o.filing_status)
            .max()
            .unwrap_or_default();
        let first_discovered = ordered
            .iter()
            .map(|o| o.discovered_at)
            .min()
            .unwrap_or(primary.discovered_at);

        Some(MergedCandidate {
            name: primary.name.clone(),
            district: primary.district.clone(),
            party: party_holder.and_then(|o| o.party),
            party_confidence: party_holder.map(|o| o.party_confidence).unwrap_or_default(),
            party_source: party_holder.map(|o| o.source.clone()),
            primary_source: primary.source.clone(),
            sources,
            source_urls,
            filing_status,
            incumbent: ordered.iter().any(|o| o.incumbent),
            first_discovered,
            observations: ordered,
        })
    }
}

/// Group observations by district, districts in first-seen order
fn partition_by_district(observations: &[Observation]) -> Vec<(DistrictId, Vec<&Observation>)> {
    let mut index: HashMap<&DistrictId, usize> = HashMap::new();
    let mut groups: Vec<(DistrictId, Vec<&Observation>)> = Vec::new();

    for obs in observations {
        match index.get(&obs.district) {
            Some(&i) => groups[i].1.push(obs),
            None => {
                index.insert(&obs.district, groups.len());
                groups.push((obs.district.clone(), vec![obs]));
            }
        }
    }

    groups
}
