#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the NYC traffic survey geocoder.
//!
//! Reads traffic volume survey rows from CSV, geocodes each distinct
//! (roadway, from, to) segment once, and writes the rows back out with
//! `LATITUDE`, `LONGITUDE` and `BOROUGH` columns.
//!
//! Runs on a current-thread runtime: lookups are strictly sequential so the
//! geocoding quota is never hit by concurrent requests.

mod config;
mod table_io;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use nyc_traffic_augment::progress::null_progress;
use nyc_traffic_augment::{REQUESTS_PER_SEGMENT, augment, distinct_segments, row_segments};
use nyc_traffic_cli_utils::IndicatifProgress;
use nyc_traffic_geocoder::google::GoogleGeocoder;
use nyc_traffic_geocoder::resolver::SegmentResolver;
use nyc_traffic_geocoder::service::google_service;
use nyc_traffic_survey_models::SegmentColumns;

#[derive(Parser)]
#[command(
    name = "nyc_traffic_cli",
    about = "Geocode NYC traffic survey segments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Geocode every distinct segment and write the augmented survey
    Augment {
        /// Survey CSV with a header row
        #[arg(long)]
        input: PathBuf,
        /// Where to write the augmented CSV
        #[arg(long, default_value = "Traffic_Volume.csv")]
        output: PathBuf,
        /// TOML config file (defaults to `config.toml` when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Minutes to wait after the geocoder denies a request
        #[arg(long)]
        wait_minutes: Option<f64>,
        /// Give up on a segment after this many passes (default: never)
        #[arg(long)]
        max_attempts: Option<u32>,
        #[command(flatten)]
        columns: ColumnArgs,
    },
    /// List the distinct segments and the number of requests they need
    Segments {
        /// Survey CSV with a header row
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        columns: ColumnArgs,
    },
}

/// Names of the survey columns forming a segment.
#[derive(Args)]
struct ColumnArgs {
    /// Column holding the roadway name
    #[arg(long, default_value = "roadway_name")]
    roadway_column: String,
    /// Column holding the start cross street
    #[arg(long, default_value = "from")]
    from_column: String,
    /// Column holding the end cross street
    #[arg(long, default_value = "to")]
    to_column: String,
}

impl From<ColumnArgs> for SegmentColumns {
    fn from(args: ColumnArgs) -> Self {
        Self {
            roadway: args.roadway_column,
            from: args.from_column,
            to: args.to_column,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = nyc_traffic_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Segments { input, columns } => {
            let table = table_io::read_survey(&input)?;
            let segments = row_segments(&table, &columns.into())?;
            let distinct = distinct_segments(&segments);

            println!("{:<32} {:<32} TO", "ROADWAY", "FROM");
            println!("{}", "-".repeat(90));
            for segment in &distinct {
                println!(
                    "{:<32} {:<32} {}",
                    segment.roadway, segment.from, segment.to
                );
            }
            println!();
            println!(
                "{} rows, {} distinct segments, total number of requests = {}",
                table.rows.len(),
                distinct.len(),
                REQUESTS_PER_SEGMENT * distinct.len() as u64
            );
        }
        Commands::Augment {
            input,
            output,
            config,
            wait_minutes,
            max_attempts,
            columns,
        } => {
            let file_config = config::load(config.as_deref())?;
            let run = config::merge(
                file_config,
                std::env::var(config::GOOGLE_KEY_ENV).ok(),
                wait_minutes,
                max_attempts,
            );
            if run.api_key.is_none() {
                log::warn!(
                    "No Google API key configured (set {} or api_keys.google_key); \
                     requests will be sent without a key",
                    config::GOOGLE_KEY_ENV
                );
            }

            let service = google_service();
            let policy = service
                .retry_policy(run.wait_minutes)
                .with_max_attempts(run.max_attempts);
            log::info!(
                "Using {} (cooldown {:?}, wait {:.1} min, max attempts {})",
                service.name,
                policy.cooldown,
                policy.wait.as_secs_f64() / 60.0,
                policy
                    .max_attempts
                    .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
            );

            let client = reqwest::Client::builder()
                .user_agent("nyc-traffic-geocoder/0.1")
                .build()?;
            let geocoder = GoogleGeocoder::new(client, &service.base_url, run.api_key);
            let resolver = SegmentResolver::new(Arc::new(geocoder), policy);

            let table = table_io::read_survey(&input)?;
            log::info!("Read {} survey rows from {}", table.rows.len(), input.display());

            let progress = if table.rows.is_empty() {
                null_progress()
            } else {
                IndicatifProgress::requests_bar(&multi, "Geocoding segments")
            };

            let start = Instant::now();
            let augmented = augment(&table, &columns.into(), &resolver, progress.as_ref()).await?;

            table_io::write_augmented(&output, &augmented.table)?;

            let stats = augmented.stats;
            log::info!(
                "Geocoded {}/{} segments for {} rows with {} requests in {:.1}s; wrote {}",
                stats.resolved,
                stats.segments,
                stats.rows,
                stats.requests,
                start.elapsed().as_secs_f64(),
                output.display()
            );
            if stats.failed > 0 {
                log::warn!("{} segment(s) left without a location", stats.failed);
            }
        }
    }

    Ok(())
}
