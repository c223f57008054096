//! # RDA Gemini
//!
//! HTTP implementation of the [`rda_core::Analyzer`] boundary against Google's Gemini
//! `generateContent` API.
//!
//! The analyzer asks for JSON output constrained by a response schema that mirrors the record
//! wire format, then hands the parsed (still untrusted) value back to the core for validation.
//! Transport failures, non-success statuses, empty candidates and unparsable output all surface
//! as [`rda_core::AnalyzerUnavailable`]; nothing is retried.

mod client;
mod prompt;

pub use client::GeminiAnalyzer;

use rda_core::ConfigError;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_FLASH_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_PRO_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for [`GeminiAnalyzer`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` leaves the analyzer unconfigured: every call fails with `NotConfigured`.
    pub api_key: Option<String>,
    pub base_url: String,
    pub flash_model: String,
    pub pro_model: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            flash_model: DEFAULT_FLASH_MODEL.to_string(),
            pro_model: DEFAULT_PRO_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GeminiConfig {
    /// Builds the configuration from raw environment values.
    ///
    /// `lookup` is called with `GEMINI_API_KEY`, `GEMINI_BASE_URL` and `GEMINI_TIMEOUT_SECS`;
    /// blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the timeout is not a positive whole number of
    /// seconds.
    pub fn from_env<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout = match present("GEMINI_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "GEMINI_TIMEOUT_SECS",
                        message: format!("'{}' is not a positive number of seconds", raw),
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key: present("GEMINI_API_KEY"),
            base_url: present("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout,
            ..Self::default()
        })
    }
}
