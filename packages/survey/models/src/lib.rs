#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core types for the NYC traffic survey geocoder.
//!
//! A traffic survey row identifies a road span only by its roadway name and
//! two cross streets. That triple is the [`Segment`]; every distinct segment
//! resolves to one [`ResolvedLocation`] which is then copied onto every
//! [`SurveyTable`] row referencing it, producing an [`AugmentedTable`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Output column holding the segment midpoint latitude.
pub const LATITUDE_COLUMN: &str = "LATITUDE";
/// Output column holding the segment midpoint longitude.
pub const LONGITUDE_COLUMN: &str = "LONGITUDE";
/// Output column holding the upper-cased borough name (or empty).
pub const BOROUGH_COLUMN: &str = "BOROUGH";

/// One of the five New York City boroughs.
///
/// Displays in upper case (`"STATEN ISLAND"`), which is the form written to
/// the augmented output.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Borough {
    /// The Bronx.
    #[strum(serialize = "BRONX")]
    Bronx,
    /// Brooklyn (Kings County).
    #[strum(serialize = "BROOKLYN")]
    Brooklyn,
    /// Manhattan (New York County).
    #[strum(serialize = "MANHATTAN")]
    Manhattan,
    /// Queens.
    #[strum(serialize = "QUEENS")]
    Queens,
    /// Staten Island (Richmond County).
    #[strum(serialize = "STATEN ISLAND")]
    StatenIsland,
}

impl Borough {
    /// All five boroughs, in the order they are matched against address
    /// components.
    pub const ALL: &[Self] = &[
        Self::Bronx,
        Self::Brooklyn,
        Self::Manhattan,
        Self::Queens,
        Self::StatenIsland,
    ];

    /// The name as it appears in a geocoder's `long_name` address component.
    #[must_use]
    pub const fn long_name(self) -> &'static str {
        match self {
            Self::Bronx => "Bronx",
            Self::Brooklyn => "Brooklyn",
            Self::Manhattan => "Manhattan",
            Self::Queens => "Queens",
            Self::StatenIsland => "Staten Island",
        }
    }

    /// Matches a geocoder `long_name` exactly (case-sensitive).
    #[must_use]
    pub fn from_long_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.long_name() == name)
    }
}

/// A road span identified by its roadway and two cross streets.
///
/// Identity is structural over the trimmed fields. Normalization for
/// geocoding happens later and never changes the key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// Roadway the segment runs along (e.g., `"BROADWAY"`).
    pub roadway: String,
    /// Cross street at the start of the segment.
    pub from: String,
    /// Cross street at the end of the segment.
    pub to: String,
}

impl Segment {
    /// Builds a segment from raw survey fields, trimming surrounding
    /// whitespace from each.
    #[must_use]
    pub fn new(roadway: &str, from: &str, to: &str) -> Self {
        Self {
            roadway: roadway.trim().to_string(),
            from: from.trim().to_string(),
            to: to.trim().to_string(),
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} -> {})", self.roadway, self.from, self.to)
    }
}

/// Midpoint coordinates and borough for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// Latitude (WGS84), mean of both endpoints.
    pub latitude: f64,
    /// Longitude (WGS84), mean of both endpoints.
    pub longitude: f64,
    /// Borough of the "from" endpoint, if one was recognised.
    pub borough: Option<Borough>,
}

impl ResolvedLocation {
    /// Borough rendered for output: upper case, or empty when unknown.
    #[must_use]
    pub fn borough_label(&self) -> String {
        self.borough.map(|b| b.to_string()).unwrap_or_default()
    }
}

/// Names of the three columns that together form a [`Segment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentColumns {
    /// Column holding the roadway name (default `roadway_name`).
    pub roadway: String,
    /// Column holding the starting cross street (default `from`).
    pub from: String,
    /// Column holding the ending cross street (default `to`).
    pub to: String,
}

impl Default for SegmentColumns {
    fn default() -> Self {
        Self {
            roadway: "roadway_name".to_string(),
            from: "from".to_string(),
            to: "to".to_string(),
        }
    }
}

/// Raw survey rows as read from the input collaborator.
///
/// Every row has one value per entry in `columns`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyTable {
    /// Header names in input order, case preserved.
    pub columns: Vec<String>,
    /// Row values, each aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl SurveyTable {
    /// Position of `name` among the columns, ignoring ASCII case.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name.trim()))
    }
}

/// A survey row, every input value kept, with its location attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedRow {
    /// Input values unchanged, aligned with [`AugmentedTable::columns`].
    pub values: Vec<String>,
    /// `None` only when the segment could not be resolved.
    pub location: Option<ResolvedLocation>,
}

impl AugmentedRow {
    /// Output record: passthrough values followed by latitude, longitude
    /// and borough. Unresolved rows get empty location cells.
    #[must_use]
    pub fn to_record(&self) -> Vec<String> {
        let mut record = self.values.clone();
        match &self.location {
            Some(loc) => {
                record.push(loc.latitude.to_string());
                record.push(loc.longitude.to_string());
                record.push(loc.borough_label());
            }
            None => record.extend(std::iter::repeat_n(String::new(), 3)),
        }
        record
    }
}

/// The augmented survey handed to the output collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AugmentedTable {
    /// Input column names, as read.
    pub columns: Vec<String>,
    /// One row per input row, in input order.
    pub rows: Vec<AugmentedRow>,
}

impl AugmentedTable {
    /// Output header: every passthrough column upper-cased, then
    /// `LATITUDE`, `LONGITUDE`, `BOROUGH`.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.to_uppercase())
            .chain(
                [LATITUDE_COLUMN, LONGITUDE_COLUMN, BOROUGH_COLUMN]
                    .iter()
                    .map(ToString::to_string),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_trims_fields() {
        let seg = Segment::new("  BROADWAY ", "W 42 ST ", " W 43 ST");
        assert_eq!(seg, Segment::new("BROADWAY", "W 42 ST", "W 43 ST"));
    }

    #[test]
    fn borough_displays_upper_case() {
        assert_eq!(Borough::StatenIsland.to_string(), "STATEN ISLAND");
        assert_eq!(Borough::Queens.to_string(), "QUEENS");
    }

    #[test]
    fn borough_matches_long_name_exactly() {
        assert_eq!(Borough::from_long_name("Brooklyn"), Some(Borough::Brooklyn));
        assert_eq!(
            Borough::from_long_name("Staten Island"),
            Some(Borough::StatenIsland)
        );
        assert_eq!(Borough::from_long_name("BROOKLYN"), None);
        assert_eq!(Borough::from_long_name("New York"), None);
    }

    #[test]
    fn header_upper_cases_and_appends_location_columns() {
        let table = AugmentedTable {
            columns: vec!["id".to_string(), "Direction".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(
            table.header(),
            vec!["ID", "DIRECTION", "LATITUDE", "LONGITUDE", "BOROUGH"]
        );
    }

    #[test]
    fn unresolved_row_gets_empty_location_cells() {
        let row = AugmentedRow {
            values: vec!["1".to_string()],
            location: None,
        };
        assert_eq!(row.to_record(), vec!["1", "", "", ""]);
    }

    #[test]
    fn missing_borough_renders_empty() {
        let row = AugmentedRow {
            values: Vec::new(),
            location: Some(ResolvedLocation {
                latitude: 40.5,
                longitude: -73.5,
                borough: None,
            }),
        };
        assert_eq!(row.to_record(), vec!["40.5", "-73.5", ""]);
    }

    #[test]
    fn column_lookup_ignores_case() {
        let table = SurveyTable {
            columns: vec!["Roadway_Name".to_string(), "from".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(table.column_index("roadway_name"), Some(0));
        assert_eq!(table.column_index("FROM"), Some(1));
        assert_eq!(table.column_index("to"), None);
    }
}
