//! Shared test helpers: scripted source adapters

#![allow(dead_code)]

use async_trait::async_trait;
use lcd_common::{Chamber, DistrictId};
use lcd_discovery::sources::{SourceAdapter, SourceError};
use lcd_discovery::types::{Observation, Party, PartyConfidence};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a mock source does when called
#[derive(Debug, Clone)]
pub enum Behavior {
    Return(Vec<Observation>),
    Fail(String),
    /// Sleep, then return the observations
    Delay(Duration, Vec<Observation>),
}

/// Source adapter that replays a scripted outcome
#[derive(Debug)]
pub struct MockSource {
    id: String,
    priority: u32,
    partisan: Option<Party>,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new(id: &str, priority: u32, behavior: Behavior) -> Self {
        Self {
            id: id.to_string(),
            priority,
            partisan: None,
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn partisan(mut self, party: Party) -> Self {
        self.partisan = Some(party);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn run(&self) -> Result<Vec<Observation>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Return(observations) => Ok(observations.clone()),
            Behavior::Fail(message) => Err(SourceError::Network(message.clone())),
            Behavior::Delay(delay, observations) => {
                tokio::time::sleep(*delay).await;
                Ok(observations.clone())
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
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
        let observations = self.run().await?;
        Ok(observations
            .into_iter()
            .filter(|o| chambers.contains(&o.district.chamber()))
            .collect())
    }

    async fn lookup(&self, district: &DistrictId) -> Result<Vec<Observation>, SourceError> {
        let observations = self.run().await?;
        Ok(observations
            .into_iter()
            .filter(|o| &o.district == district)
            .collect())
    }
}

pub fn district(raw: &str) -> DistrictId {
    DistrictId::parse(raw).unwrap()
}

/// Observation attributed to `source`
pub fn obs(name: &str, d: &str, source: &str) -> Observation {
    Observation::new(name, district(d), source)
}

/// Observation with a high-confidence party
pub fn obs_party(name: &str, d: &str, source: &str, party: Party) -> Observation {
    obs(name, d, source).with_party(party, PartyConfidence::High)
}

pub fn arc(source: MockSource) -> Arc<dyn SourceAdapter> {
    Arc::new(source)
}
