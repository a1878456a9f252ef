//! Resolves one survey segment to its midpoint and borough.

use std::sync::Arc;

use nyc_traffic_survey_models::{ResolvedLocation, Segment};

use crate::address::{add_ordinal_suffix, endpoint_query};
use crate::borough::extract_borough;
use crate::retry::{PairLookup, RetryPolicy, Sleeper, TokioSleeper, lookup_pair};
use crate::{GeocodeError, Geocoder};

/// Log target for segments whose "from" endpoint named no borough.
pub const BOROUGH_MISS_TARGET: &str = "borough_miss";

/// A resolved segment and the lookup passes it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Midpoint and borough of the segment.
    pub location: ResolvedLocation,
    /// Passes of the retry controller, each one lookup per endpoint.
    pub passes: u32,
}

/// Turns a [`Segment`] into a [`ResolvedLocation`].
///
/// Holds no cache; calling [`resolve`](Self::resolve) twice for the same
/// segment issues the lookups twice.
pub struct SegmentResolver {
    geocoder: Arc<dyn Geocoder>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl SegmentResolver {
    /// Creates a resolver that sleeps with [`TokioSleeper`].
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(geocoder, Arc::new(TokioSleeper), policy)
    }

    /// Creates a resolver with a custom [`Sleeper`].
    #[must_use]
    pub fn with_sleeper(
        geocoder: Arc<dyn Geocoder>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            geocoder,
            sleeper,
            policy,
        }
    }

    /// Resolves `segment` to the mean of its two endpoint locations, with
    /// the borough taken from the "from" endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::RetriesExhausted`] if the retry policy is
    /// bounded and ran out of attempts.
    pub async fn resolve(&self, segment: &Segment) -> Result<Resolution, GeocodeError> {
        let (from_query, to_query) = segment_queries(segment);

        let PairLookup { from, to, passes } = lookup_pair(
            self.geocoder.as_ref(),
            self.sleeper.as_ref(),
            &self.policy,
            &from_query,
            &to_query,
        )
        .await?;

        let borough = extract_borough(&from.address_components);
        if borough.is_none() {
            log::warn!(
                target: BOROUGH_MISS_TARGET,
                "No borough in address components for {from_query} (segment {segment})"
            );
        }

        Ok(Resolution {
            location: ResolvedLocation {
                latitude: f64::midpoint(from.latitude, to.latitude),
                longitude: f64::midpoint(from.longitude, to.longitude),
                borough,
            },
            passes,
        })
    }
}

/// Builds the normalized `(from, to)` endpoint queries for a segment.
#[must_use]
pub fn segment_queries(segment: &Segment) -> (String, String) {
    let roadway = add_ordinal_suffix(&segment.roadway);
    let from = add_ordinal_suffix(&segment.from);
    let to = add_ordinal_suffix(&segment.to);
    (endpoint_query(&roadway, &from), endpoint_query(&roadway, &to))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Mutex, Once};
    use std::time::Duration;

    use async_trait::async_trait;
    use nyc_traffic_survey_models::Borough;

    use super::*;
    use crate::{AddressComponent, GeocodeResult};

    /// Answers from a fixed address → result table.
    struct TableGeocoder {
        answers: Answers,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Geocoder for TableGeocoder {
        async fn lookup(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
            self.calls.lock().unwrap().push(address.to_string());
            let (latitude, longitude, names) =
                self.answers
                    .get(address)
                    .ok_or_else(|| GeocodeError::Status {
                        status: "ZERO_RESULTS".to_string(),
                        message: None,
                    })?;
            Ok(GeocodeResult {
                latitude: *latitude,
                longitude: *longitude,
                address_components: names
                    .iter()
                    .map(|n| AddressComponent {
                        long_name: (*n).to_string(),
                        types: Vec::new(),
                    })
                    .collect(),
            })
        }
    }

    struct NoSleep;

    #[async_trait]
    impl Sleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    /// Records `(target, message)` of every log event.
    struct CaptureLogger {
        records: Mutex<Vec<(String, String)>>,
    }

    impl log::Log for CaptureLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            self.records
                .lock()
                .unwrap()
                .push((record.target().to_string(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger {
        records: Mutex::new(Vec::new()),
    };
    static INIT_LOGGER: Once = Once::new();

    fn capture_logs() -> &'static CaptureLogger {
        INIT_LOGGER.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Trace);
            }
        });
        &LOGGER
    }

    type Answers = BTreeMap<String, (f64, f64, Vec<&'static str>)>;

    fn resolver(answers: Answers) -> (Arc<TableGeocoder>, SegmentResolver) {
        let geocoder = Arc::new(TableGeocoder {
            answers,
            calls: Mutex::new(Vec::new()),
        });
        let resolver = SegmentResolver::with_sleeper(
            geocoder.clone(),
            Arc::new(NoSleep),
            RetryPolicy::unbounded(Duration::ZERO, Duration::ZERO).with_max_attempts(Some(3)),
        );
        (geocoder, resolver)
    }

    #[test]
    fn builds_normalized_queries() {
        let segment = Segment::new("3 AVE", "E 42 ST", "E 43 ST");
        let (from, to) = segment_queries(&segment);
        assert_eq!(from, "3RD AVE+E 42ND ST+NEW YORK CITY");
        assert_eq!(to, "3RD AVE+E 43RD ST+NEW YORK CITY");
    }

    #[tokio::test]
    async fn averages_endpoints_and_uses_from_borough() {
        let answers = BTreeMap::from([
            (
                "BROADWAY+W 42ND ST+NEW YORK CITY".to_string(),
                (40.70, -73.90, vec!["Queens", "New York"]),
            ),
            (
                "BROADWAY+W 43RD ST+NEW YORK CITY".to_string(),
                (40.72, -73.92, vec!["Brooklyn", "New York"]),
            ),
        ]);
        let (geocoder, resolver) = resolver(answers);

        let location = resolver
            .resolve(&Segment::new("BROADWAY", "W 42 ST", "W 43 ST"))
            .await
            .unwrap()
            .location;

        assert!((location.latitude - 40.71).abs() < 1e-9);
        assert!((location.longitude - -73.91).abs() < 1e-9);
        assert_eq!(location.borough, Some(Borough::Queens));
        assert_eq!(geocoder.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_borough_is_not_an_error() {
        let answers = BTreeMap::from([
            ("A+B+NEW YORK CITY".to_string(), (40.0, -74.0, vec!["New Jersey"])),
            ("A+C+NEW YORK CITY".to_string(), (41.0, -75.0, vec!["Bronx"])),
        ]);
        let (_, resolver) = resolver(answers);

        let resolution = resolver.resolve(&Segment::new("A", "B", "C")).await.unwrap();
        let location = resolution.location;

        assert_eq!(resolution.passes, 1);
        assert_eq!(location.borough, None);
        assert_eq!(location.borough_label(), "");
        assert!((location.latitude - 40.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn borough_miss_is_logged_with_from_query() {
        let logger = capture_logs();
        let answers = BTreeMap::from([
            (
                "HOBOKEN AVE+1ST ST+NEW YORK CITY".to_string(),
                (40.74, -74.03, vec!["Hoboken", "New Jersey"]),
            ),
            (
                "HOBOKEN AVE+2ND ST+NEW YORK CITY".to_string(),
                (40.75, -74.03, vec!["Manhattan"]),
            ),
        ]);
        let (_, resolver) = resolver(answers);

        resolver
            .resolve(&Segment::new("HOBOKEN AVE", "1 ST", "2 ST"))
            .await
            .unwrap();

        let records = logger.records.lock().unwrap();
        let misses: Vec<&String> = records
            .iter()
            .filter(|(target, message)| {
                target == BOROUGH_MISS_TARGET && message.contains("HOBOKEN AVE+")
            })
            .map(|(_, message)| message)
            .collect();
        assert_eq!(misses.len(), 1);
        assert!(misses[0].contains("HOBOKEN AVE+1ST ST+NEW YORK CITY"));
        assert!(!misses[0].contains("HOBOKEN AVE+2ND ST+NEW YORK CITY"));
    }

    #[tokio::test]
    async fn no_caching_between_calls() {
        let answers = BTreeMap::from([
            ("A+B+NEW YORK CITY".to_string(), (40.0, -74.0, vec![])),
            ("A+C+NEW YORK CITY".to_string(), (40.0, -74.0, vec![])),
        ]);
        let (geocoder, resolver) = resolver(answers);
        let segment = Segment::new("A", "B", "C");

        resolver.resolve(&segment).await.unwrap();
        resolver.resolve(&segment).await.unwrap();

        assert_eq!(geocoder.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn surfaces_exhausted_retries() {
        let (geocoder, resolver) = resolver(BTreeMap::new());

        let err = resolver
            .resolve(&Segment::new("NOWHERE", "X", "Y"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GeocodeError::RetriesExhausted { attempts: 3, .. }
        ));
        assert_eq!(geocoder.calls.lock().unwrap().len(), 6);
    }
}
