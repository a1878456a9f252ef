#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Segment geocoding for NYC traffic survey data.
//!
//! Survey rows name a road span by its roadway and two cross streets. This
//! crate turns such a [`Segment`](nyc_traffic_survey_models::Segment) into a
//! midpoint location:
//!
//! 1. [`address`] adds missing ordinal suffixes (`"42 ST"` → `"42ND ST"`).
//! 2. [`google`] looks up each endpoint against the Google Geocoding API.
//! 3. [`retry`] repeats the pair of lookups with a flat wait whenever the
//!    quota is exceeded or a response is malformed.
//! 4. [`resolver`] averages both endpoints and picks the borough with
//!    [`borough`].
//!
//! Service defaults (endpoint, cooldown, wait) come from the embedded TOML
//! in `services/`, see [`service`].

pub mod address;
pub mod borough;
pub mod google;
pub mod resolver;
pub mod retry;
pub mod service;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// One component of a geocoded address (street, neighborhood, borough...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressComponent {
    /// Display name (e.g., `"Queens"`).
    pub long_name: String,
    /// Semantic tags (e.g., `["political", "sublocality"]`).
    #[serde(default)]
    pub types: Vec<String>,
}

/// A successful lookup of a single free-form address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Address components in the order the service returned them.
    pub address_components: Vec<AddressComponent>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The service answered with a status other than `"OK"`
    /// (`OVER_QUERY_LIMIT`, `REQUEST_DENIED`, `ZERO_RESULTS`, ...).
    #[error("Geocoder returned status {status}")]
    Status {
        /// Raw status string from the response.
        status: String,
        /// Optional `error_message` accompanying the status.
        message: Option<String>,
    },

    /// A bounded retry policy ran out of attempts.
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of full passes made.
        attempts: u32,
        /// The failure seen on the final pass.
        last: Box<GeocodeError>,
    },
}

/// A single-attempt geocoding backend.
///
/// Implementations perform exactly one request per call; retrying is the
/// caller's decision (see [`retry::lookup_pair`]).
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Looks up a free-form address.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails, the response cannot be
    /// parsed, or the service reports a non-`"OK"` status.
    async fn lookup(&self, address: &str) -> Result<GeocodeResult, GeocodeError>;
}
