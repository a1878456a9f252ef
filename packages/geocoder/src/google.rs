//! Google Maps Geocoding API client.
//!
//! One request per [`Geocoder::lookup`] call, no retries. The public API
//! enforces a per-second rate limit and a daily quota; exceeding either
//! yields a non-`"OK"` status (usually `OVER_QUERY_LIMIT`), which is surfaced
//! as [`GeocodeError::Status`] so the caller can decide whether to wait.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use async_trait::async_trait;

use crate::{AddressComponent, GeocodeError, GeocodeResult, Geocoder};

/// Geocoder backed by the Google Geocoding JSON endpoint.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleGeocoder {
    /// Creates a client for `base_url` (e.g.,
    /// `"https://maps.googleapis.com/maps/api/geocode/json"`).
    ///
    /// Requests are sent without a `key` parameter when `api_key` is `None`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn lookup(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        let mut params = vec![("address", address)];
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }

        let resp = self.client.get(&self.base_url).query(&params).send().await?;
        let text = resp.text().await?;

        let body: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| GeocodeError::Parse {
                message: format!("Response is not JSON: {e}"),
            })?;

        parse_response(&body)
    }
}

/// Parses a Geocoding API JSON response, keeping only the first result.
fn parse_response(body: &serde_json::Value) -> Result<GeocodeResult, GeocodeError> {
    let status = body["status"].as_str().ok_or_else(|| GeocodeError::Parse {
        message: "Missing status in geocoding response".to_string(),
    })?;

    if status != "OK" {
        return Err(GeocodeError::Status {
            status: status.to_string(),
            message: body["error_message"].as_str().map(String::from),
        });
    }

    let first = body["results"]
        .as_array()
        .and_then(|results| results.first())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Status OK but results array is empty".to_string(),
        })?;

    let location = &first["geometry"]["location"];
    let latitude = location["lat"]
        .as_f64()
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in geocoding response".to_string(),
        })?;
    let longitude = location["lng"]
        .as_f64()
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lng in geocoding response".to_string(),
        })?;

    let address_components: Vec<AddressComponent> = match first.get("address_components") {
        Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| GeocodeError::Parse {
            message: format!("Malformed address_components: {e}"),
        })?,
        None => Vec::new(),
    };

    Ok(GeocodeResult {
        latitude,
        longitude,
        address_components,
    })
}
