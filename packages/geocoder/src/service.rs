//! Compile-time geocoding service configuration.
//!
//! The Google endpoint and its pacing defaults live in
//! `services/google.toml`, embedded at compile time and exposed via
//! [`google_service`].

use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"google"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Endpoint the free-form `address` query is sent to.
    pub base_url: String,
    /// Pause after every lookup in milliseconds.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Wait before retrying a failed pass, in minutes.
    #[serde(default = "default_wait_minutes")]
    pub wait_minutes: f64,
}

const fn default_cooldown_ms() -> u64 {
    500
}

const fn default_wait_minutes() -> f64 {
    10.0
}

impl GeocodingService {
    /// Unbounded retry policy using this service's pacing, with the wait
    /// overridden by `wait_minutes` when given.
    #[must_use]
    pub fn retry_policy(&self, wait_minutes: Option<f64>) -> RetryPolicy {
        RetryPolicy::unbounded(
            Duration::from_millis(self.cooldown_ms),
            RetryPolicy::minutes(wait_minutes.unwrap_or(self.wait_minutes)),
        )
    }
}

const GOOGLE_TOML: &str = include_str!("../services/google.toml");

/// Returns the embedded Google geocoding service configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (it ships with the crate, so
/// this is caught by the unit tests).
#[must_use]
pub fn google_service() -> GeocodingService {
    toml::de::from_str(GOOGLE_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse geocoding service 'google': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_google_service() {
        let svc = google_service();
        assert_eq!(svc.id, "google");
        assert!(!svc.name.is_empty());
        assert!(svc.base_url.starts_with("https://"));
        assert!(svc.cooldown_ms > 0);
        assert!(svc.wait_minutes > 0.0);
    }

    #[test]
    fn retry_policy_uses_service_defaults() {
        let svc = google_service();
        let policy = svc.retry_policy(None);
        assert_eq!(policy.cooldown, Duration::from_millis(svc.cooldown_ms));
        assert_eq!(policy.wait, RetryPolicy::minutes(svc.wait_minutes));
        assert_eq!(policy.max_attempts, None);
    }

    #[test]
    fn retry_policy_wait_override() {
        let policy = google_service().retry_policy(Some(1.0));
        assert_eq!(policy.wait, Duration::from_secs(60));
    }

    #[test]
    fn fills_missing_pacing_with_defaults() {
        let svc: GeocodingService = toml::de::from_str(
            "id = \"x\"\nname = \"X\"\nbase_url = \"http://localhost\"\n",
        )
        .unwrap();
        assert_eq!(svc.cooldown_ms, 500);
        assert!((svc.wait_minutes - 10.0).abs() < f64::EPSILON);
    }
}
