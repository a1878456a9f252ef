//! Run configuration: API key and retry pacing.
//!
//! Values are layered, highest precedence first:
//!
//! 1. Command-line flags (`--wait-minutes`, `--max-attempts`)
//! 2. The `GOOGLE_KEY` environment variable (API key only)
//! 3. The TOML config file (`config.toml` by default)
//! 4. The embedded service defaults in `nyc_traffic_geocoder`
//!
//! ```toml
//! [api_keys]
//! google_key = "..."
//!
//! [geocoding]
//! wait_minutes = 1.0
//! max_attempts = 50
//! ```

use std::path::Path;

use serde::Deserialize;

/// Environment variable that overrides `api_keys.google_key`.
pub const GOOGLE_KEY_ENV: &str = "GOOGLE_KEY";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Errors from loading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`FileConfig`].
    #[error("Invalid config {path}: {source}")]
    Toml {
        /// Path that was parsed.
        path: String,
        /// Underlying parse error.
        source: toml::de::Error,
    },
}

/// Contents of the TOML config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileConfig {
    /// `[api_keys]` section.
    #[serde(default)]
    pub api_keys: ApiKeys,
    /// `[geocoding]` section.
    #[serde(default)]
    pub geocoding: GeocodingSettings,
}

/// `[api_keys]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiKeys {
    /// Google Geocoding API key.
    #[serde(alias = "GOOGLE_KEY")]
    pub google_key: Option<String>,
}

/// `[geocoding]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeocodingSettings {
    /// Minutes to wait after a denied pass.
    pub wait_minutes: Option<f64>,
    /// Give up on a segment after this many passes.
    pub max_attempts: Option<u32>,
}

/// Effective settings for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunConfig {
    /// Google API key; requests go out without one when `None`.
    pub api_key: Option<String>,
    /// Wait after a denied pass; `None` uses the service default.
    pub wait_minutes: Option<f64>,
    /// Pass limit per segment; `None` retries forever.
    pub max_attempts: Option<u32>,
}

/// Loads the config file.
///
/// When `path` is `None` the default `config.toml` is used if it exists,
/// otherwise an empty config is returned. An explicit `path` must exist.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match path {
        Some(p) => p,
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                log::debug!("No {DEFAULT_CONFIG_PATH} found, using defaults");
                return Ok(FileConfig::default());
            }
            default
        }
    };

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse(&text).map_err(|source| ConfigError::Toml {
        path: path.display().to_string(),
        source,
    })
}

fn parse(text: &str) -> Result<FileConfig, toml::de::Error> {
    toml::de::from_str(text)
}

/// Layers flags and environment over the file config.
#[must_use]
pub fn merge(
    file: FileConfig,
    env_key: Option<String>,
    wait_minutes: Option<f64>,
    max_attempts: Option<u32>,
) -> RunConfig {
    RunConfig {
        api_key: env_key
            .filter(|k| !k.is_empty())
            .or(file.api_keys.google_key),
        wait_minutes: wait_minutes.or(file.geocoding.wait_minutes),
        max_attempts: max_attempts.or(file.geocoding.max_attempts),
    }
}
