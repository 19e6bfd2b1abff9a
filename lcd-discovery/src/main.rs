//! lcd-discovery - one-shot candidate discovery run
//!
//! Loads `lcd.toml`, registers each configured fixture source, runs a single
//! aggregation (whole chambers or one district) and prints the coverage
//! report or the raw aggregation result.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use lcd_common::{Chamber, DistrictId};
use lcd_discovery::{coverage, Aggregator, CoverageReporter, DiscoveryConfig};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Html,
    Summary,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "lcd-discovery")]
#[command(about = "Aggregate and deduplicate legislative candidate sightings")]
#[command(version)]
struct Args {
    /// Configuration file (overrides the per-user lcd.toml)
    #[arg(short, long, env = "LCD_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Chambers to cover (defaults to the configured chambers)
    #[arg(long, value_delimiter = ',')]
    chambers: Vec<String>,

    /// Look up a single district (e.g. SC-House-042) instead of whole chambers
    #[arg(short, long)]
    district: Option<String>,

    /// Newly stored candidates, as counted by the persistence layer
    #[arg(long, default_value_t = 0)]
    new_count: usize,

    /// Updated candidates, as counted by the persistence layer
    #[arg(long, default_value_t = 0)]
    updated_count: usize,

    /// Log level (overrides the configured level; RUST_LOG wins over both)
    #[arg(long, env = "LCD_LOG_LEVEL")]
    log_level: Option<String>,
}

fn parse_chambers(labels: &[String]) -> Result<BTreeSet<Chamber>> {
    labels
        .iter()
        .map(|label| {
            Chamber::from_label(label).ok_or_else(|| anyhow!("Unknown chamber '{}'", label))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = DiscoveryConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    lcd_common::logging::init_logging(level).context("Failed to initialize logging")?;

    info!(
        "Starting lcd-discovery v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Config is read before the subscriber exists, so report its origin here
    match config.loaded_from() {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => warn!("No configuration file found; using built-in defaults"),
    }

    let chambers = if args.chambers.is_empty() {
        config.chamber_set()
    } else {
        parse_chambers(&args.chambers)?
    };

    let sources = config.build_sources().context("Failed to register sources")?;
    if sources.is_empty() {
        warn!("No sources configured; the report will show zero candidates");
    }

    let aggregator = Aggregator::new(config.to_aggregator_config());
    let (result, report_chambers) = match &args.district {
        Some(raw) => {
            let district = DistrictId::parse(raw)
                .ok_or_else(|| anyhow!("Malformed district id '{}'", raw))?;
            let scope: BTreeSet<Chamber> = [district.chamber()].into_iter().collect();
            let result = aggregator.aggregate_district(&sources, &district).await;
            info!(
                "{} candidate(s) found in {}",
                result.candidates_in(&district).count(),
                district
            );
            (result, scope)
        }
        None => (aggregator.aggregate(&sources, &chambers).await, chambers),
    };

    let output = match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        }
        format => {
            let report = CoverageReporter::new(config.scope()).report(
                &result,
                &report_chambers,
                args.new_count,
                args.updated_count,
            );
            match format {
                OutputFormat::Html => coverage::format_html(&report),
                OutputFormat::Summary => coverage::format_summary(&report),
                _ => coverage::format_text(&report),
            }
        }
    };

    println!("{}", output);
    Ok(())
}
