//! Quota-aware retry for a segment's pair of endpoint lookups.
//!
//! A segment needs both endpoints from the *same* pass. After every lookup
//! the controller pauses for [`RetryPolicy::cooldown`] so consecutive
//! requests stay under the per-second limit. If either lookup fails
//! (quota denial, malformed body, network error) the whole pair is
//! discarded, the controller sleeps a flat [`RetryPolicy::wait`] and both
//! lookups are issued again.
//!
//! With `max_attempts = None` this never gives up; the process has to be
//! stopped externally if the quota never recovers.

use std::time::Duration;

use async_trait::async_trait;

use crate::{GeocodeError, GeocodeResult, Geocoder};

/// How a segment's lookups are paced and retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause after every single lookup, successful or not.
    pub cooldown: Duration,
    /// Pause before re-attempting a pass that had a failure.
    pub wait: Duration,
    /// Maximum number of passes, or `None` to retry forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// A policy that retries forever with a flat `wait`.
    #[must_use]
    pub const fn unbounded(cooldown: Duration, wait: Duration) -> Self {
        Self {
            cooldown,
            wait,
            max_attempts: None,
        }
    }

    /// Limits the number of passes. `0` is treated as `1`.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = match max_attempts {
            Some(0) => Some(1),
            other => other,
        };
        self
    }

    /// Builds a wait duration from a number of minutes.
    ///
    /// Negative and NaN values become zero; values too large for a
    /// [`Duration`] (including infinity) saturate to [`Duration::MAX`].
    #[must_use]
    pub fn minutes(minutes: f64) -> Duration {
        if minutes.is_nan() || minutes <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(minutes * 60.0).unwrap_or(Duration::MAX)
    }
}

/// Both endpoint results of the pass that succeeded.
#[derive(Debug, Clone)]
pub struct PairLookup {
    /// Result for the "from" query.
    pub from: GeocodeResult,
    /// Result for the "to" query.
    pub to: GeocodeResult,
    /// Passes made, including the successful one. Each pass is two lookups.
    pub passes: u32,
}

/// Suspends the current task for a duration.
///
/// Production code uses [`TokioSleeper`]; tests substitute a recorder so
/// no real time passes.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Sleeps for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Looks up both endpoints of a segment, retrying the pair until one pass
/// succeeds for both.
///
/// Returns the `from` and `to` results of the same pass together with the
/// number of passes it took.
///
/// # Errors
///
/// Returns [`GeocodeError::RetriesExhausted`] only when `policy` has a
/// `max_attempts` limit and every pass had a failure.
pub async fn lookup_pair(
    geocoder: &dyn Geocoder,
    sleeper: &dyn Sleeper,
    policy: &RetryPolicy,
    from_query: &str,
    to_query: &str,
) -> Result<PairLookup, GeocodeError> {
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let from = lookup_with_cooldown(geocoder, sleeper, policy.cooldown, from_query).await;
        let to = lookup_with_cooldown(geocoder, sleeper, policy.cooldown, to_query).await;

        let failure = match (from, to) {
            (Ok(from), Ok(to)) => {
                return Ok(PairLookup {
                    from,
                    to,
                    passes: attempt,
                });
            }
            (Err(e), _) | (_, Err(e)) => e,
        };

        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            return Err(GeocodeError::RetriesExhausted {
                attempts: attempt,
                last: Box::new(failure),
            });
        }

        log::warn!(
            "Waiting for {:.1} min(s) @ {} before retrying (pass {attempt} failed)",
            policy.wait.as_secs_f64() / 60.0,
            chrono::Local::now().format("%H:%M"),
        );
        sleeper.sleep(policy.wait).await;
    }
}

async fn lookup_with_cooldown(
    geocoder: &dyn Geocoder,
    sleeper: &dyn Sleeper,
    cooldown: Duration,
    query: &str,
) -> Result<GeocodeResult, GeocodeError> {
    let result = geocoder.lookup(query).await;
    match &result {
        Ok(_) => log::debug!("Geocoded {query}"),
        Err(GeocodeError::Status { status, message }) => {
            log::warn!("Geocoder status {status} for {query}: {message:?}");
        }
        Err(e) => log::warn!("Geocoding {query} failed: {e}"),
    }
    sleeper.sleep(cooldown).await;
    result
}
