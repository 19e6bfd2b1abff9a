// Config → fixture sources → aggregation → coverage report
//
// Runs the same path as the CLI binary against JSON fixtures written to a
// temporary directory.

mod helpers;

use helpers::{arc, obs, Behavior, MockSource};
use lcd_common::{Chamber, DistrictScope};
use lcd_discovery::coverage::{format_html, format_summary, format_text};
use lcd_discovery::types::Party;
use lcd_discovery::{Aggregator, CoverageReporter, DiscoveryConfig};
use std::fs;
use std::path::Path;

const FEED: &str = r#"[
    {"name": "Jane Doe", "district": "SC-House-001", "party": "Republican",
     "party_confidence": "high", "filing_status": "filed", "incumbent": true},
    {"name": "Pat Lee", "district": "SC-Senate-002", "party": "Democratic",
     "filing_status": "certified"}
]"#;

const PARTY_SITE: &str = r#"[
    {"name": "Jane A. Doe", "district": "SC-House-001", "party": "D",
     "source_url": "https://example.org/jane"},
    {"name": "Omar Reyes", "district": "SC-House-003", "party": "Dem"},
    {"name": "Bad Row", "district": "not-a-district"}
]"#;

fn write_fixtures(dir: &Path) {
    fs::create_dir_all(dir.join("fixtures")).unwrap();
    fs::write(dir.join("fixtures/feed.json"), FEED).unwrap();
    fs::write(dir.join("fixtures/party.json"), PARTY_SITE).unwrap();
    fs::write(
        dir.join("lcd.toml"),
        r#"
state = "SC"
house_seats = 4
senate_seats = 2
source_timeout_secs = 5

[[sources]]
id = "feed"
priority = 1
path = "fixtures/feed.json"

[[sources]]
id = "scdp"
priority = 2
path = "fixtures/party.json"
partisan = "Democratic"
min_interval_ms = 10
"#,
    )
    .unwrap();
}

#[tokio::test]
async fn test_fixture_run_produces_coverage() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let config_path = dir.path().join("lcd.toml");
    let config = DiscoveryConfig::load(Some(config_path.as_path())).unwrap();
    assert_eq!(config.loaded_from(), Some(config_path.as_path()));
    let sources = config.build_sources().unwrap();
    assert_eq!(sources.len(), 2);

    let chambers = config.chamber_set();
    let result = Aggregator::new(config.to_aggregator_config())
        .aggregate(&sources, &chambers)
        .await;

    assert!(result.failed_sources().is_empty());
    assert_eq!(result.total_raw, 4);
    assert_eq!(result.candidates.len(), 3);

    let doe = result.candidates.iter().find(|c| c.name == "Jane Doe").unwrap();
    assert_eq!(doe.party, Some(Party::Republican));
    assert_eq!(doe.party_source.as_deref(), Some("feed"));
    assert!(doe.incumbent);
    assert_eq!(doe.source_urls.get("scdp").map(String::as_str), Some("https://example.org/jane"));

    // feed (rank 1) and scdp (rank 2) disagree on party
    assert_eq!(result.conflicts.len(), 1);
    assert!(result.conflicts[0].requires_review);

    let report = CoverageReporter::new(config.scope()).report(&result, &chambers, 3, 0);
    assert_eq!(report.total_districts, 6);
    assert_eq!(report.districts_with_candidates, 3);
    assert_eq!(report.coverage_percentage(), 50.0);
    assert_eq!(report.candidates_by_party.get("D"), Some(&2));
    assert_eq!(report.candidates_by_party.get("R"), Some(&1));
    assert_eq!(report.candidates_by_source.get("scdp"), Some(&2));
    assert_eq!(report.review_count, 1);

    assert_eq!(
        format_summary(&report),
        "3/6 districts (50.0%) | 3 candidates | 1 conflicts | 3 new, 0 updated"
    );

    let text = format_text(&report);
    assert!(text.contains("SC-House-002"));
    assert!(text.contains("SC-House-004"));
    assert!(text.contains("SC-Senate-001"));

    let html = format_html(&report);
    assert!(html.starts_with("<div"));
    assert!(html.contains("3 / 6"));
}

#[tokio::test]
async fn test_missing_fixture_fails_only_that_source() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    fs::remove_file(dir.path().join("fixtures/party.json")).unwrap();

    let config = DiscoveryConfig::load(Some(dir.path().join("lcd.toml").as_path())).unwrap();
    let sources = config.build_sources().unwrap();
    let result = Aggregator::new(config.to_aggregator_config())
        .aggregate(&sources, &config.chamber_set())
        .await;

    assert_eq!(result.failed_sources(), vec!["scdp"]);
    assert_eq!(result.total_raw, 2);

    let report = CoverageReporter::new(config.scope()).report(&result, &config.chamber_set(), 0, 0);
    assert_eq!(report.failed_sources, vec!["scdp".to_string()]);
    assert!(format_text(&report).contains("scdp"));
}

#[tokio::test]
async fn test_coverage_of_full_scope() {
    let observations = (1..=85u16)
        .map(|n| {
            let chamber = if n <= 62 { "House" } else { "Senate" };
            let number = if n <= 62 { n } else { n - 62 };
            obs(
                &format!("Candidate Number{}", n),
                &format!("SC-{}-{:03}", chamber, number),
                "ref",
            )
        })
        .collect();
    let sources = vec![arc(MockSource::new("ref", 2, Behavior::Return(observations)))];

    let result = Aggregator::default().aggregate(&sources, &Chamber::all()).await;
    let report = CoverageReporter::new(DistrictScope::default()).report(&result, &Chamber::all(), 0, 0);

    assert_eq!(report.total_districts, 170);
    assert_eq!(report.districts_with_candidates, 85);
    assert_eq!(report.coverage_percentage(), 50.0);
    assert_eq!(report.districts_without_candidates.len(), 85);
    assert!(format_text(&report).contains("... and 65 more"));
}

#[test]
fn test_invalid_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lcd.toml");
    fs::write(&path, "similarity_threshold = 2.0\n").unwrap();

    let err = DiscoveryConfig::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, lcd_common::Error::Config(_)));
}
