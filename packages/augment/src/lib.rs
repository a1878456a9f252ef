#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Attaches geocoded segment locations to traffic survey rows.
//!
//! Many survey rows share the same (roadway, from, to) segment. Each
//! distinct segment is resolved exactly once, in first-seen order, and the
//! result is copied onto every row that references it. Every input column is
//! kept as-is and `LATITUDE`, `LONGITUDE`, `BOROUGH` are appended.

pub mod progress;

use std::collections::{BTreeMap, BTreeSet};

use nyc_traffic_geocoder::GeocodeError;
use nyc_traffic_geocoder::resolver::SegmentResolver;
use nyc_traffic_survey_models::{
    AugmentedRow, AugmentedTable, ResolvedLocation, Segment, SegmentColumns, SurveyTable,
};

use crate::progress::ProgressCallback;

/// Geocoding requests issued per segment (one per endpoint).
pub const REQUESTS_PER_SEGMENT: u64 = 2;

/// Errors that can occur while augmenting a survey table.
#[derive(Debug, thiserror::Error)]
pub enum AugmentError {
    /// A segment key column is not present in the input.
    #[error("Missing segment column: {name}")]
    MissingColumn {
        /// The column name that was looked up.
        name: String,
    },
}

/// Counters for one augmentation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AugmentStats {
    /// Rows read from the input.
    pub rows: u64,
    /// Distinct segments among those rows.
    pub segments: u64,
    /// Segments that resolved to a location.
    pub resolved: u64,
    /// Segments abandoned by a bounded retry policy.
    pub failed: u64,
    /// Geocoding requests issued, retried passes included.
    pub requests: u64,
}

/// The augmented table together with its run counters.
#[derive(Debug, Clone)]
pub struct Augmented {
    /// Input rows with their segment locations attached.
    pub table: AugmentedTable,
    /// Counters for the run.
    pub stats: AugmentStats,
}

/// Column positions of the three segment key columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyIndices {
    roadway: usize,
    from: usize,
    to: usize,
}

impl KeyIndices {
    fn locate(table: &SurveyTable, columns: &SegmentColumns) -> Result<Self, AugmentError> {
        let find = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| AugmentError::MissingColumn {
                    name: name.to_string(),
                })
        };
        Ok(Self {
            roadway: find(&columns.roadway)?,
            from: find(&columns.from)?,
            to: find(&columns.to)?,
        })
    }

    fn segment(self, row: &[String]) -> Segment {
        let field = |i: usize| row.get(i).map_or("", String::as_str);
        Segment::new(field(self.roadway), field(self.from), field(self.to))
    }
}

/// Derives the [`Segment`] of every row, in row order.
///
/// # Errors
///
/// Returns [`AugmentError::MissingColumn`] if a key column is absent.
pub fn row_segments(
    table: &SurveyTable,
    columns: &SegmentColumns,
) -> Result<Vec<Segment>, AugmentError> {
    let keys = KeyIndices::locate(table, columns)?;
    Ok(table.rows.iter().map(|row| keys.segment(row)).collect())
}

/// Distinct segments in first-seen order.
#[must_use]
pub fn distinct_segments(segments: &[Segment]) -> Vec<Segment> {
    let mut seen = BTreeSet::new();
    segments
        .iter()
        .filter(|s| seen.insert(*s))
        .cloned()
        .collect()
}

/// Resolves every distinct segment of `table` once and fans the locations
/// out onto all rows.
///
/// Progress counts requests: the total is set to
/// [`REQUESTS_PER_SEGMENT`] × distinct segments, the first-pass estimate,
/// and advanced by [`REQUESTS_PER_SEGMENT`] for every pass a segment took.
/// [`AugmentStats::requests`] is advanced by the same amount.
///
/// A segment whose bounded retry policy is exhausted is logged and its rows
/// get no location; the run continues with the next segment.
///
/// # Errors
///
/// Returns [`AugmentError::MissingColumn`] if a key column is absent.
pub async fn augment(
    table: &SurveyTable,
    columns: &SegmentColumns,
    resolver: &SegmentResolver,
    progress: &dyn ProgressCallback,
) -> Result<Augmented, AugmentError> {
    let keys = KeyIndices::locate(table, columns)?;
    let segments: Vec<Segment> = table.rows.iter().map(|row| keys.segment(row)).collect();
    let distinct = distinct_segments(&segments);

    let mut stats = AugmentStats {
        rows: table.rows.len() as u64,
        segments: distinct.len() as u64,
        ..AugmentStats::default()
    };

    log::info!(
        "Deduplicated to {} unique segments from {} rows",
        stats.segments,
        stats.rows
    );
    log::info!(
        "Total number of requests = {}",
        REQUESTS_PER_SEGMENT * stats.segments
    );
    progress.set_total(REQUESTS_PER_SEGMENT * stats.segments);

    let mut resolved: BTreeMap<Segment, Option<ResolvedLocation>> = BTreeMap::new();

    for segment in distinct {
        progress.set_message(segment.to_string());

        let (location, passes) = match resolver.resolve(&segment).await {
            Ok(resolution) => {
                stats.resolved += 1;
                (Some(resolution.location), resolution.passes)
            }
            Err(GeocodeError::RetriesExhausted { attempts, last }) => {
                log::error!("Giving up on segment {segment} after {attempts} attempts: {last}");
                stats.failed += 1;
                (None, attempts)
            }
            Err(e) => {
                log::error!("Failed to resolve segment {segment}: {e}");
                stats.failed += 1;
                (None, 1)
            }
        };

        let requests = REQUESTS_PER_SEGMENT * u64::from(passes);
        stats.requests += requests;
        progress.inc(requests);
        log::debug!("Number of requests done: {}", stats.requests);

        resolved.insert(segment, location);
    }

    let table = fan_out(table, &segments, &resolved);

    progress.finish(format!(
        "Resolved {}/{} segments ({} requests)",
        stats.resolved, stats.segments, stats.requests
    ));

    Ok(Augmented { table, stats })
}

/// Copies each segment's location onto its rows. Row values are untouched.
fn fan_out(
    table: &SurveyTable,
    segments: &[Segment],
    resolved: &BTreeMap<Segment, Option<ResolvedLocation>>,
) -> AugmentedTable {
    let rows = table
        .rows
        .iter()
        .zip(segments)
        .map(|(row, segment)| AugmentedRow {
            values: row.clone(),
            location: resolved.get(segment).copied().flatten(),
        })
        .collect();

    AugmentedTable {
        columns: table.columns.clone(),
        rows,
    }
}
