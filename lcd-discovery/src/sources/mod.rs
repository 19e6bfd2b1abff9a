//! Source adapters
//!
//! Every external source (filings feed, reference site, party site, web
//! search) implements [`SourceAdapter`]. The aggregator depends only on this
//! trait, never on a concrete source, and treats each call as independently
//! failable.

use crate::types::{Observation, Party};
use async_trait::async_trait;
use lcd_common::{Chamber, DistrictId};
use std::collections::BTreeSet;
use thiserror::Error;

pub mod file_source;
pub mod rate_limiter;

pub use file_source::FileSource;
pub use rate_limiter::RateLimiter;

/// Conventional source priorities (lower = more authoritative)
pub mod priority {
    /// Authoritative filings feed
    pub const FILINGS_FEED: u32 = 1;
    /// Encyclopedic reference pages
    pub const REFERENCE: u32 = 2;
    /// Party-affiliated sites
    pub const PARTY_SITE: u32 = 3;
    /// Generic web search
    pub const WEB_SEARCH: u32 = 5;
    /// Rank given to sources absent from a priority table
    pub const UNKNOWN: u32 = 99;
}

/// Source adapter errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Capability contract for a candidate source
///
/// # Example
/// ```rust,ignore
/// struct FilingsFeed { client: reqwest::Client, limiter: RateLimiter }
///
/// #[async_trait::async_trait]
/// impl SourceAdapter for FilingsFeed {
///     fn identifier(&self) -> &str { "scvotes" }
///     fn priority(&self) -> u32 { priority::FILINGS_FEED }
///
///     async fn discover(&self, chambers: &BTreeSet<Chamber>) -> Result<Vec<Observation>, SourceError> {
///         self.limiter.acquire().await;
///         // fetch and parse ...
///     }
///
///     async fn lookup(&self, district: &DistrictId) -> Result<Vec<Observation>, SourceError> {
///         // ...
///     }
/// }
/// ```
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable source identifier, used as the conflict-resolution key
    fn identifier(&self) -> &str;

    /// Authority rank; lower wins
    fn priority(&self) -> u32;

    /// Party this source is aligned with, if it is a partisan source
    ///
    /// Two sources with different affiliations disagreeing about a candidate
    /// always send the conflict to review.
    fn partisan_affiliation(&self) -> Option<Party> {
        None
    }

    /// Discover candidates for every district of the given chambers
    ///
    /// Fails as a unit; partial success is the adapter's own concern.
    async fn discover(&self, chambers: &BTreeSet<Chamber>) -> Result<Vec<Observation>, SourceError>;

    /// Candidates for a single district
    async fn lookup(&self, district: &DistrictId) -> Result<Vec<Observation>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partisan_affiliation_default() {
        struct Dummy;

        #[async_trait]
        impl SourceAdapter for Dummy {
            fn identifier(&self) -> &str {
                "dummy"
            }

            fn priority(&self) -> u32 {
                priority::WEB_SEARCH
            }

            async fn discover(&self, _chambers: &BTreeSet<Chamber>) -> Result<Vec<Observation>, SourceError> {
                unimplemented!()
            }

            async fn lookup(&self, _district: &DistrictId) -> Result<Vec<Observation>, SourceError> {
                unimplemented!()
            }
        }

        let dummy = Dummy;
        assert_eq!(dummy.partisan_affiliation(), None);
        assert_eq!(dummy.priority(), 5);
    }

    #[test]
    fn test_timeout_message() {
        let err = SourceError::Timeout(std::time::Duration::from_secs(3));
        assert_eq!(err.to_string(), "Timed out after 3s");
    }
}
