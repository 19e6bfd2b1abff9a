//! JSON fixture source
//!
//! Serves observations captured earlier by a scraper and saved as a JSON
//! array. Each call re-reads the file, so the fixture can be refreshed
//! between runs without restarting.
//!
//! Record format:
//! ```json
//! [{"name": "Jane Doe", "district": "SC-House-042", "party": "Republican",
//!   "party_confidence": "high", "filing_status": "filed", "incumbent": true,
//!   "source_url": "https://...", "discovered_at": "2026-03-01T12:00:00Z",
//!   "extra": {"ballot_order": 2}}]
//! ```

use super::{RateLimiter, SourceAdapter, SourceError};
use crate::types::{ExtraData, FilingStatus, Observation, Party, PartyConfidence};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lcd_common::{Chamber, DistrictId};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ObservationRecord {
    name: String,
    district: String,
    #[serde(default)]
    party: Option<String>,
    #[serde(default)]
    party_confidence: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    filing_status: Option<String>,
    #[serde(default)]
    incumbent: bool,
    #[serde(default)]
    discovered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    extra: ExtraData,
}

/// Source adapter backed by a JSON file
#[derive(Debug)]
pub struct FileSource {
    id: String,
    priority: u32,
    path: PathBuf,
    partisan: Option<Party>,
    rate_limiter: Option<RateLimiter>,
}

impl FileSource {
    pub fn new(id: impl Into<String>, priority: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            priority,
            path: path.into(),
            partisan: None,
            rate_limiter: None,
        }
    }

    pub fn with_partisan(mut self, party: Party) -> Self {
        self.partisan = Some(party);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    async fn load(&self) -> Result<Vec<Observation>, SourceError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let records: Vec<ObservationRecord> = serde_json::from_str(&content).map_err(|e| {
            SourceError::Parse(format!("{}: {}", self.path.display(), e))
        })?;

        let total = records.len();
        let observations: Vec<Observation> = records
            .into_iter()
            .filter_map(|record| self.to_observation(record))
            .collect();

        debug!(
            "Source {} loaded {} of {} records from {}",
            self.id,
            observations.len(),
            total,
            self.path.display()
        );

        Ok(observations)
    }

    fn to_observation(&self, record: ObservationRecord) -> Option<Observation> {
        let Some(district) = DistrictId::parse(&record.district) else {
            warn!(
                "Source {}: skipping '{}' with malformed district '{}'",
                self.id, record.name, record.district
            );
            return None;
        };

        let confidence = record
            .party_confidence
            .as_deref()
            .map(PartyConfidence::from_label)
            .unwrap_or_default();

        let mut obs = Observation::new(record.name, district, self.id.clone())
            .with_incumbent(record.incumbent)
            .with_filing_status(
                record
                    .filing_status
                    .as_deref()
                    .map(FilingStatus::from_label)
                    .unwrap_or_default(),
            );

        if let Some(label) = record.party.as_deref() {
            obs = obs.with_party_label(label, confidence);
        }
        if let Some(url) = record.source_url {
            obs = obs.with_url(url);
        }
        if let Some(at) = record.discovered_at {
            obs = obs.with_discovered_at(at);
        }
        for (key, value) in record.extra {
            obs = obs.with_extra(key, value);
        }

        Some(obs)
    }
}

#[async_trait]
impl SourceAdapter for FileSource {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn partisan_affiliation(&self) -> Option<Party> {
        self.partisan
    }

    async fn discover(&self, chambers: &BTreeSet<Chamber>) -> Result<Vec<Observation>, SourceError> {
        let observations = self.load().await?;
        Ok(observations
            .into_iter()
            .filter(|obs| chambers.contains(&obs.district.chamber()))
            .collect())
    }

    async fn lookup(&self, district: &DistrictId) -> Result<Vec<Observation>, SourceError> {
        let observations = self.load().await?;
        Ok(observations
            .into_iter()
            .filter(|obs| &obs.district == district)
            .collect())
    }
}
