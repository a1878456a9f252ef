//! Borough detection from geocoder address components.

use nyc_traffic_survey_models::Borough;

use crate::AddressComponent;

/// Finds the borough named among `components`.
///
/// Every component is checked in order and a later match replaces an
/// earlier one. Only exact `long_name` matches count (`"Brooklyn"`, not
/// `"Brooklyn Heights"`).
#[must_use]
pub fn extract_borough(components: &[AddressComponent]) -> Option<Borough> {
    components
        .iter()
        .filter_map(|c| Borough::from_long_name(&c.long_name))
        .last()
}
