//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. The
//! `*_from_env_value` helpers take the raw value of an environment variable so binaries can
//! read the environment in one place; nothing in this crate reads it during request handling.

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_PROTOCOL_LENGTH,
    DEFAULT_TOXICITY_THRESHOLD,
};
use crate::error::ConfigError;
use rda_types::DetailLevel;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    data_dir: PathBuf,
    history_capacity: NonZeroUsize,
    max_protocol_length: NonZeroUsize,
    detail_level: DetailLevel,
    toxicity_threshold: u8,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `toxicity_threshold` is above 100.
    pub fn new(
        data_dir: PathBuf,
        history_capacity: NonZeroUsize,
        max_protocol_length: NonZeroUsize,
        detail_level: DetailLevel,
        toxicity_threshold: u8,
    ) -> Result<Self, ConfigError> {
        if toxicity_threshold > 100 {
            return Err(ConfigError::InvalidValue {
                name: "RDA_TOXICITY_THRESHOLD",
                message: format!("{} is outside 0..=100", toxicity_threshold),
            });
        }

        Ok(Self {
            data_dir,
            history_capacity,
            max_protocol_length,
            detail_level,
            toxicity_threshold,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn history_capacity(&self) -> NonZeroUsize {
        self.history_capacity
    }

    pub fn max_protocol_length(&self) -> usize {
        self.max_protocol_length.get()
    }

    pub fn detail_level(&self) -> DetailLevel {
        self.detail_level
    }

    pub fn toxicity_threshold(&self) -> u8 {
        self.toxicity_threshold
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            history_capacity: non_zero(DEFAULT_HISTORY_CAPACITY),
            max_protocol_length: non_zero(DEFAULT_MAX_PROTOCOL_LENGTH),
            detail_level: DetailLevel::default(),
            toxicity_threshold: DEFAULT_TOXICITY_THRESHOLD,
        }
    }
}

fn non_zero(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN)
}

/// Trims `value` and drops it if nothing is left.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_value<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match present(value) {
        Some(v) => v.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            name,
            message: format!("'{}': {}", v, e),
        }),
        None => Ok(default),
    }
}

/// Resolve the data directory. Empty or missing values fall back to `rda_data`.
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    present(value).map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from)
}

/// Parse the history capacity; must be at least 1. Defaults to 50.
pub fn history_capacity_from_env_value(value: Option<String>) -> Result<NonZeroUsize, ConfigError> {
    parse_value(
        "RDA_HISTORY_CAPACITY",
        value,
        non_zero(DEFAULT_HISTORY_CAPACITY),
    )
}

/// Parse the maximum conversation length in characters; must be at least 1. Defaults to 15000.
pub fn max_protocol_length_from_env_value(
    value: Option<String>,
) -> Result<NonZeroUsize, ConfigError> {
    parse_value(
        "RDA_MAX_PROTOCOL_LENGTH",
        value,
        non_zero(DEFAULT_MAX_PROTOCOL_LENGTH),
    )
}

/// Parse the detail level (`compact`, `standard` or `deep`). Defaults to `standard`.
pub fn detail_level_from_env_value(value: Option<String>) -> Result<DetailLevel, ConfigError> {
    parse_value("RDA_DETAIL_LEVEL", value, DetailLevel::default())
}

/// Parse the toxicity threshold (0..=100). Defaults to 70.
pub fn toxicity_threshold_from_env_value(value: Option<String>) -> Result<u8, ConfigError> {
    let threshold = parse_value("RDA_TOXICITY_THRESHOLD", value, DEFAULT_TOXICITY_THRESHOLD)?;
    if threshold > 100 {
        return Err(ConfigError::InvalidValue {
            name: "RDA_TOXICITY_THRESHOLD",
            message: format!("{} is outside 0..=100", threshold),
        });
    }
    Ok(threshold)
}

/// Builds a `CoreConfig` from raw environment values, applying defaults for missing ones.
///
/// `lookup` is called with each variable name; binaries pass `|name| std::env::var(name).ok()`.
pub fn core_config_from_env<F>(lookup: F) -> Result<CoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    CoreConfig::new(
        data_dir_from_env_value(lookup("RDA_DATA_DIR")),
        history_capacity_from_env_value(lookup("RDA_HISTORY_CAPACITY"))?,
        max_protocol_length_from_env_value(lookup("RDA_MAX_PROTOCOL_LENGTH"))?,
        detail_level_from_env_value(lookup("RDA_DETAIL_LEVEL"))?,
        toxicity_threshold_from_env_value(lookup("RDA_TOXICITY_THRESHOLD"))?,
    )
}
