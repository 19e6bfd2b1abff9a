//! Coverage reporting
//!
//! Summarizes an [`AggregationResult`] against the district scope: which
//! districts have at least one candidate, how candidates split by party and
//! by source, and how many conflicts were found.
//!
//! Three renderers, all pure functions of a [`CoverageReport`]:
//! - [`format_text`]: multi-section terminal report
//! - [`format_html`]: self-contained fragment for notification bodies
//! - [`format_summary`]: one line

use crate::types::AggregationResult;
use chrono::{DateTime, Utc};
use lcd_common::{Chamber, DistrictId, DistrictScope};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Party bucket for candidates with no resolved party
pub const UNKNOWN_PARTY: &str = "Unknown";

/// Missing districts listed in the text report before truncating
const MISSING_DISTRICTS_SHOWN: usize = 20;

/// Coverage of one aggregation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub state: String,
    pub chambers: Vec<Chamber>,
    pub total_districts: usize,
    pub districts_with_candidates: usize,
    /// In-scope districts with no candidate, in id order
    pub districts_without_candidates: Vec<DistrictId>,
    pub total_candidates: usize,
    pub candidates_by_party: BTreeMap<String, usize>,
    /// Observation counts per successful source
    pub candidates_by_source: BTreeMap<String, usize>,
    pub conflict_count: usize,
    pub review_count: usize,
    pub failed_sources: Vec<String>,
    /// Supplied by the caller (persistence layer)
    pub new_candidates: usize,
    /// Supplied by the caller (persistence layer)
    pub updated_candidates: usize,
    pub generated_at: DateTime<Utc>,
}

impl CoverageReport {
    /// Share of in-scope districts with a candidate, 0.0-100.0
    ///
    /// Zero districts in scope reports 0.0.
    pub fn coverage_percentage(&self) -> f64 {
        if self.total_districts == 0 {
            return 0.0;
        }
        self.districts_with_candidates as f64 / self.total_districts as f64 * 100.0
    }
}

/// Builds coverage reports for a district scope
#[derive(Debug, Clone, Default)]
pub struct CoverageReporter {
    scope: DistrictScope,
}

impl CoverageReporter {
    pub fn new(scope: DistrictScope) -> Self {
        Self { scope }
    }

    /// Compute coverage for the given chambers
    ///
    /// Candidates in districts outside the scope count toward the party
    /// totals but not toward district coverage.
    pub fn report(
        &self,
        result: &AggregationResult,
        chambers: &BTreeSet<Chamber>,
        new_count: usize,
        updated_count: usize,
    ) -> CoverageReport {
        let in_scope = self.scope.districts(chambers);
        let covered: BTreeSet<&DistrictId> = result.candidates.iter().map(|c| &c.district).collect();

        let (with, without): (Vec<DistrictId>, Vec<DistrictId>) =
            in_scope.into_iter().partition(|d| covered.contains(d));

        let mut candidates_by_party: BTreeMap<String, usize> = BTreeMap::new();
        for candidate in &result.candidates {
            let key = candidate
                .party
                .map(|p| p.code().to_string())
                .unwrap_or_else(|| UNKNOWN_PARTY.to_string());
            *candidates_by_party.entry(key).or_insert(0) += 1;
        }

        let mut candidates_by_source: BTreeMap<String, usize> = BTreeMap::new();
        for source in result.source_results.iter().filter(|r| r.success) {
            *candidates_by_source.entry(source.source.clone()).or_insert(0) += source.observations.len();
        }

        let report = CoverageReport {
            state: self.scope.state.clone(),
            chambers: chambers.iter().copied().collect(),
            total_districts: with.len() + without.len(),
            districts_with_candidates: with.len(),
            districts_without_candidates: without,
            total_candidates: result.candidates.len(),
            candidates_by_party,
            candidates_by_source,
            conflict_count: result.conflicts.len(),
            review_count: result.conflicts.iter().filter(|c| c.requires_review).count(),
            failed_sources: result.failed_sources().into_iter().map(String::from).collect(),
            new_candidates: new_count,
            updated_candidates: updated_count,
            generated_at: result.run_at,
        };

        tracing::info!("Coverage: {}", format_summary(&report));
        report
    }
}

fn chamber_list(report: &CoverageReport) -> String {
    if report.chambers.is_empty() {
        return "none".to_string();
    }
    report
        .chambers
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Multi-section plain-text report
pub fn format_text(report: &CoverageReport) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "CANDIDATE DISCOVERY COVERAGE REPORT");
    let _ = writeln!(out, "State: {} | Chambers: {}", report.state, chamber_list(report));
    let _ = writeln!(out, "Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(out, "{}", rule);

    let _ = writeln!(out, "\nCOVERAGE");
    let _ = writeln!(
        out,
        "  Districts with candidates: {} / {} ({:.1}%)",
        report.districts_with_candidates,
        report.total_districts,
        report.coverage_percentage()
    );
    let _ = writeln!(
        out,
        "  Districts without candidates: {}",
        report.districts_without_candidates.len()
    );
    let _ = writeln!(out, "  Total candidates: {}", report.total_candidates);

    let _ = writeln!(out, "\nCANDIDATES BY PARTY");
    if report.candidates_by_party.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (party, count) in &report.candidates_by_party {
        let _ = writeln!(out, "  {:<10} {:>5}", party, count);
    }

    let _ = writeln!(out, "\nOBSERVATIONS BY SOURCE");
    if report.candidates_by_source.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (source, count) in &report.candidates_by_source {
        let _ = writeln!(out, "  {:<20} {:>5}", source, count);
    }

    let _ = writeln!(out, "\nCONFLICTS");
    let _ = writeln!(
        out,
        "  {} party conflict(s), {} requiring review",
        report.conflict_count, report.review_count
    );

    let _ = writeln!(out, "\nFAILED SOURCES");
    if report.failed_sources.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for source in &report.failed_sources {
        let _ = writeln!(out, "  {}", source);
    }

    let _ = writeln!(out, "\nTHIS RUN");
    let _ = writeln!(out, "  New candidates: {}", report.new_candidates);
    let _ = writeln!(out, "  Updated candidates: {}", report.updated_candidates);

    if !report.districts_without_candidates.is_empty() {
        let _ = writeln!(out, "\nDISTRICTS WITHOUT CANDIDATES");
        for district in report
            .districts_without_candidates
            .iter()
            .take(MISSING_DISTRICTS_SHOWN)
        {
            let _ = writeln!(out, "  {}", district);
        }
        let hidden = report
            .districts_without_candidates
            .len()
            .saturating_sub(MISSING_DISTRICTS_SHOWN);
        if hidden > 0 {
            let _ = writeln!(out, "  ... and {} more", hidden);
        }
    }

    out
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn html_table(out: &mut String, title: &str, header: &str, rows: &BTreeMap<String, usize>) {
    let _ = writeln!(out, "<h3 style=\"margin:12px 0 4px 0;\">{}</h3>", escape_html(title));
    let _ = writeln!(out, "<table style=\"border-collapse:collapse;\">");
    let _ = writeln!(
        out,
        "<tr><th style=\"text-align:left;padding:2px 8px;\">{}</th><th style=\"text-align:right;padding:2px 8px;\">Count</th></tr>",
        escape_html(header)
    );
    for (key, count) in rows {
        let _ = writeln!(
            out,
            "<tr><td style=\"padding:2px 8px;\">{}</td><td style=\"text-align:right;padding:2px 8px;\">{}</td></tr>",
            escape_html(key),
            count
        );
    }
    let _ = writeln!(out, "</table>");
}

/// Self-contained HTML fragment with inline styles
pub fn format_html(report: &CoverageReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "<div style=\"font-family:sans-serif;font-size:14px;\">");
    let _ = writeln!(
        out,
        "<h2 style=\"margin:0 0 8px 0;\">Candidate Coverage: {} ({})</h2>",
        escape_html(&report.state),
        escape_html(&chamber_list(report))
    );
    let _ = writeln!(
        out,
        "<p><strong>{} / {}</strong> districts have candidates ({:.1}%). {} candidate(s) total.</p>",
        report.districts_with_candidates,
        report.total_districts,
        report.coverage_percentage(),
        report.total_candidates
    );
    let _ = writeln!(
        out,
        "<p>{} new, {} updated this run. {} conflict(s), {} requiring review.</p>",
        report.new_candidates, report.updated_candidates, report.conflict_count, report.review_count
    );

    html_table(&mut out, "Candidates by party", "Party", &report.candidates_by_party);
    html_table(&mut out, "Observations by source", "Source", &report.candidates_by_source);

    if !report.failed_sources.is_empty() {
        let _ = writeln!(
            out,
            "<p style=\"color:#b00020;\">Failed sources: {}</p>",
            escape_html(&report.failed_sources.join(", "))
        );
    }

    let _ = writeln!(
        out,
        "<p style=\"color:#666;font-size:12px;\">Generated {}</p>",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = write!(out, "</div>");

    out
}

/// One-line summary
pub fn format_summary(report: &CoverageReport) -> String {
    format!(
        "{}/{} districts ({:.1}%) | {} candidates | {} conflicts | {} new, {} updated",
        report.districts_with_candidates,
        report.total_districts,
        report.coverage_percentage(),
        report.total_candidates,
        report.conflict_count,
        report.new_candidates,
        report.updated_candidates
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::Deduplicator;
    use crate::types::{Observation, Party, PartyConfidence, SourceResult};
    use std::time::Duration;

    fn report_with(total: usize, covered: usize) -> CoverageReport {
        CoverageReport {
            state: "SC".to_string(),
            chambers: vec![Chamber::House, Chamber::Senate],
            total_districts: total,
            districts_with_candidates: covered,
            districts_without_candidates: Vec::new(),
            total_candidates: covered,
            candidates_by_party: BTreeMap::new(),
            candidates_by_source: BTreeMap::new(),
            conflict_count: 0,
            review_count: 0,
            failed_sources: Vec::new(),
            new_candidates: 0,
            updated_candidates: 0,
            generated_at: Utc::now(),
        }
    }

    fn result_for(observations: Vec<Observation>, failed: &[&str]) -> AggregationResult {
        let candidates = Deduplicator::default().deduplicate(&observations);
        let mut result = AggregationResult::empty();
        result.total_raw = observations.len();
        result.total_deduplicated = candidates.len();
        result.candidates = candidates;
        result
            .source_results
            .push(SourceResult::succeeded("ref", 2, observations, Duration::ZERO));
        for source in failed {
            result
                .source_results
                .push(SourceResult::failed(source, 3, "unreachable", Duration::ZERO));
        }
        result
    }

    fn obs(name: &str, district: &str) -> Observation {
        Observation::new(name, DistrictId::parse(district).unwrap(), "ref")
    }

    #[test]
    fn test_coverage_percentage() {
        assert_eq!(report_with(170, 85).coverage_percentage(), 50.0);
        assert_eq!(report_with(0, 0).coverage_percentage(), 0.0);
        assert_eq!(report_with(4, 4).coverage_percentage(), 100.0);
    }

    #[test]
    fn test_report_counts() {
        let observations = vec![
            obs("Jane Doe", "SC-House-001").with_party(Party::Republican, PartyConfidence::High),
            obs("John Smith", "SC-House-001"),
            obs("Pat Lee", "SC-Senate-002").with_party(Party::Democratic, PartyConfidence::Medium),
            obs("Out Of Scope", "SC-House-200"),
        ];
        let result = result_for(observations, &["partyB"]);

        let report = CoverageReporter::new(DistrictScope::new("SC", 3, 2))
            .report(&result, &Chamber::all(), 2, 1);

        assert_eq!(report.total_districts, 5);
        assert_eq!(report.districts_with_candidates, 2);
        assert_eq!(
            report
                .districts_without_candidates
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>(),
            vec!["SC-House-002", "SC-House-003", "SC-Senate-001"]
        );
        assert_eq!(report.total_candidates, 4);
        assert_eq!(report.candidates_by_party["R"], 1);
        assert_eq!(report.candidates_by_party["D"], 1);
        assert_eq!(report.candidates_by_party[UNKNOWN_PARTY], 2);
        assert_eq!(report.candidates_by_source["ref"], 4);
        assert!(!report.candidates_by_source.contains_key("partyB"));
        assert_eq!(report.failed_sources, vec!["partyB".to_string()]);
        assert_eq!(report.new_candidates, 2);
        assert_eq!(report.updated_candidates, 1);
    }

    #[test]
    fn test_zero_scope_report() {
        let result = AggregationResult::empty();
        let report = CoverageReporter::default().report(&result, &BTreeSet::new(), 0, 0);
        assert_eq!(report.total_districts, 0);
        assert_eq!(report.coverage_percentage(), 0.0);
        assert!(format_text(&report).contains("0 / 0 (0.0%)"));
    }

    #[test]
    fn test_summary_line() {
        let mut report = report_with(170, 85);
        report.total_candidates = 120;
        report.conflict_count = 3;
        report.new_candidates = 7;
        report.updated_candidates = 2;

        let summary = format_summary(&report);
        assert_eq!(
            summary,
            "85/170 districts (50.0%) | 120 candidates | 3 conflicts | 7 new, 2 updated"
        );
        assert!(!summary.contains('\n'));
    }

    #[test]
    fn test_text_truncates_missing_districts() {
        let result = AggregationResult::empty();
        let report = CoverageReporter::new(DistrictScope::new("SC", 25, 0))
            .report(&result, &Chamber::all(), 0, 0);

        let text = format_text(&report);
        assert!(text.contains("SC-House-001"));
        assert!(text.contains("SC-House-020"));
        assert!(!text.contains("SC-House-021"));
        assert!(text.contains("... and 5 more"));
    }

    #[test]
    fn test_html_is_escaped_and_self_contained() {
        let mut report = report_with(10, 5);
        report.failed_sources = vec!["<script>".to_string()];
        report.candidates_by_source.insert("R&D".to_string(), 4);

        let html = format_html(&report);
        assert!(html.starts_with("<div"));
        assert!(html.ends_with("</div>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("R&amp;D"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_formatters_are_deterministic() {
        let report = report_with(170, 85);
        assert_eq!(format_text(&report), format_text(&report));
        assert_eq!(format_html(&report), format_html(&report));
    }
}
