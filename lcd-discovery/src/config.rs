//! Discovery configuration (`lcd.toml`)
//!
//! File resolution is shared with the rest of the workspace (see
//! [`lcd_common::config`]); this module owns the discovery-specific schema,
//! its validation, and turning `[[sources]]` entries into adapters.

use crate::aggregator::{AggregatorConfig, DEFAULT_SOURCE_TIMEOUT};
use crate::conflicts::DEFAULT_REVIEW_RANK_GAP;
use crate::dedup::DEFAULT_SIMILARITY_THRESHOLD;
use crate::sources::{FileSource, RateLimiter, SourceAdapter};
use crate::types::Party;
use lcd_common::config::{LoggingConfig, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};
use lcd_common::{Chamber, DistrictScope, Error, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// One `[[sources]]` entry: a JSON fixture served as a source adapter
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub priority: u32,
    pub path: PathBuf,
    /// Party label of a partisan source ("D", "Republican", ...)
    #[serde(default)]
    pub partisan: Option<String>,
    #[serde(default)]
    pub max_requests_per_window: Option<u32>,
    #[serde(default)]
    pub window_secs: Option<u64>,
    #[serde(default)]
    pub min_interval_ms: Option<u64>,
}

impl SourceConfig {
    fn partisan_party(&self) -> Result<Option<Party>> {
        match self.partisan.as_deref() {
            None => Ok(None),
            Some(label) => Party::from_label(label).map(Some).ok_or_else(|| {
                Error::Config(format!(
                    "Source '{}': unrecognized partisan party '{}'",
                    self.id, label
                ))
            }),
        }
    }

    fn rate_limiter(&self) -> Option<RateLimiter> {
        let max_requests = self.max_requests_per_window.unwrap_or(0);
        let window = Duration::from_secs(self.window_secs.unwrap_or(0));
        let min_interval = Duration::from_millis(self.min_interval_ms.unwrap_or(0));

        if (max_requests == 0 || window.is_zero()) && min_interval.is_zero() {
            return None;
        }
        Some(RateLimiter::new(max_requests, window, min_interval))
    }
}

/// Top-level discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub state: String,
    pub house_seats: u16,
    pub senate_seats: u16,
    pub chambers: Vec<Chamber>,
    pub similarity_threshold: f64,
    pub source_timeout_secs: u64,
    pub review_rank_gap: u32,
    pub logging: LoggingConfig,
    pub sources: Vec<SourceConfig>,
    #[serde(skip)]
    loaded_from: Option<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let scope = DistrictScope::default();
        Self {
            state: scope.state,
            house_seats: scope.house_seats,
            senate_seats: scope.senate_seats,
            chambers: Chamber::ALL.to_vec(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            source_timeout_secs: DEFAULT_SOURCE_TIMEOUT.as_secs(),
            review_rank_gap: DEFAULT_REVIEW_RANK_GAP,
            logging: LoggingConfig::default(),
            sources: Vec::new(),
            loaded_from: None,
        }
    }
}

impl DiscoveryConfig {
    /// Resolve, load and validate the configuration
    ///
    /// Relative source paths are taken relative to the config file's
    /// directory. With no config file the built-in defaults apply.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let loaded = lcd_common::config::load_or_default::<DiscoveryConfig>(
            cli_path,
            CONFIG_ENV_VAR,
            DEFAULT_CONFIG_FILE,
        )?;

        let mut config = loaded.value;
        if let Some(base) = loaded.path.as_deref().and_then(Path::parent) {
            config.resolve_source_paths(base);
        }
        config.loaded_from = loaded.path;
        config.normalized()
    }

    /// Parse configuration from TOML text (no path resolution)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DiscoveryConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse failed: {}", e)))?;
        config.normalized()
    }

    /// File the configuration was read from, `None` for built-in defaults
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }

    fn normalized(mut self) -> Result<Self> {
        self.state = self.state.trim().to_ascii_uppercase();
        self.validate()?;
        Ok(self)
    }

    fn resolve_source_paths(&mut self, base: &Path) {
        for source in &mut self.sources {
            if source.path.is_relative() {
                source.path = base.join(&source.path);
            }
        }
    }

    /// Check value ranges and source entries
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(format!(
                "similarity_threshold must be within 0.0..=1.0, got {}",
                self.similarity_threshold
            )));
        }

        if self.source_timeout_secs == 0 {
            return Err(Error::Config("source_timeout_secs must be greater than 0".to_string()));
        }

        if self.state.len() != 2 || !self.state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::Config(format!(
                "state must be a two-letter code, got '{}'",
                self.state
            )));
        }

        let mut ids = HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(Error::Config("Source id must not be empty".to_string()));
            }
            if !ids.insert(source.id.as_str()) {
                return Err(Error::Config(format!("Duplicate source id '{}'", source.id)));
            }
            source.partisan_party()?;
        }

        Ok(())
    }

    pub fn scope(&self) -> DistrictScope {
        DistrictScope::new(self.state.clone(), self.house_seats, self.senate_seats)
    }

    pub fn chamber_set(&self) -> BTreeSet<Chamber> {
        self.chambers.iter().copied().collect()
    }

    pub fn to_aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            similarity_threshold: self.similarity_threshold,
            source_timeout: Duration::from_secs(self.source_timeout_secs),
            review_rank_gap: self.review_rank_gap,
        }
    }

    /// Build one fixture adapter per `[[sources]]` entry
    pub fn build_sources(&self) -> Result<Vec<Arc<dyn SourceAdapter>>> {
        let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::with_capacity(self.sources.len());

        for entry in &self.sources {
            let mut source = FileSource::new(entry.id.clone(), entry.priority, entry.path.clone());
            if let Some(party) = entry.partisan_party()? {
                source = source.with_partisan(party);
            }
            if let Some(limiter) = entry.rate_limiter() {
                debug!("Source {}: {:?}", entry.id, limiter);
                source = source.with_rate_limiter(limiter);
            }

            info!(
                "Registered source {} (priority {}) from {}",
                entry.id,
                entry.priority,
                entry.path.display()
            );
            adapters.push(Arc::new(source));
        }

        Ok(adapters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
state = "SC"
house_seats = 124
senate_seats = 46
chambers = ["House"]
similarity_threshold = 0.9
source_timeout_secs = 30

[logging]
level = "debug"

[[sources]]
id = "ballotpedia"
priority = 2
path = "fixtures/ballotpedia.json"

[[sources]]
id = "scdp"
priority = 3
path = "fixtures/scdp.json"
partisan = "Democratic"
max_requests_per_window = 30
window_secs = 60
min_interval_ms = 500
"#;

    #[test]
    fn test_parse_full_config() {
        let config = DiscoveryConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.state, "SC");
        assert_eq!(config.chambers, vec![Chamber::House]);
        assert_eq!(config.similarity_threshold, 0.9);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].partisan_party().unwrap(), Some(Party::Democratic));

        let aggregator = config.to_aggregator_config();
        assert_eq!(aggregator.source_timeout, Duration::from_secs(30));
        assert_eq!(aggregator.review_rank_gap, DEFAULT_REVIEW_RANK_GAP);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DiscoveryConfig::from_toml_str("").unwrap();
        assert_eq!(config.scope(), DistrictScope::default());
        assert_eq!(config.chamber_set(), Chamber::all());
        assert_eq!(config.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(config.source_timeout_secs, 60);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_state_is_normalized() {
        let config = DiscoveryConfig::from_toml_str("state = \" sc \"").unwrap();
        assert_eq!(config.state, "SC");
        assert_eq!(config.scope().state, "SC");
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        for bad in [
            "similarity_threshold = 1.5",
            "similarity_threshold = -0.1",
            "source_timeout_secs = 0",
            "state = \"South Carolina\"",
        ] {
            let err = DiscoveryConfig::from_toml_str(bad).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_bad_sources_rejected() {
        let duplicate = r#"
[[sources]]
id = "a"
priority = 1
path = "a.json"

[[sources]]
id = "a"
priority = 2
path = "b.json"
"#;
        assert!(matches!(DiscoveryConfig::from_toml_str(duplicate), Err(Error::Config(_))));

        let bad_party = r#"
[[sources]]
id = "a"
priority = 1
path = "a.json"
partisan = "Whig"
"#;
        assert!(matches!(DiscoveryConfig::from_toml_str(bad_party), Err(Error::Config(_))));
    }

    #[test]
    fn test_build_sources() {
        let config = DiscoveryConfig::from_toml_str(SAMPLE).unwrap();
        let sources = config.build_sources().unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].identifier(), "ballotpedia");
        assert_eq!(sources[0].partisan_affiliation(), None);
        assert_eq!(sources[1].priority(), 3);
        assert_eq!(sources[1].partisan_affiliation(), Some(Party::Democratic));
    }

    #[test]
    fn test_rate_limiter_only_when_configured() {
        let config = DiscoveryConfig::from_toml_str(SAMPLE).unwrap();
        assert!(config.sources[0].rate_limiter().is_none());

        let limiter = config.sources[1].rate_limiter().unwrap();
        assert_eq!(limiter.max_requests(), 30);
        assert_eq!(limiter.window(), Duration::from_secs(60));
        assert_eq!(limiter.min_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_relative_paths_resolved_against_config_dir() {
        let mut config = DiscoveryConfig::from_toml_str(SAMPLE).unwrap();
        config.resolve_source_paths(Path::new("/etc/lcd"));
        assert_eq!(config.sources[0].path, PathBuf::from("/etc/lcd/fixtures/ballotpedia.json"));
    }
}
