//! # RDA Core
//!
//! Core logic for rhetorical dynamics analysis: turning an analyzer's structured response into
//! an immutable [`AnalysisRecord`], locating the evidence it cites in the submitted text,
//! splitting that text into display segments, and keeping a bounded, persisted history.
//!
//! - [`locate`] finds a citation in the source text (case-insensitive, leftmost match).
//! - [`partition`] splits the source text into plain and evidence [`Segment`]s.
//! - [`Assembler`] validates a raw response and builds a record.
//! - [`HistoryStore`] holds the most recent records on top of a [`KeyValueStorage`].
//! - [`AnalysisService`] ties these together behind an injected [`Analyzer`].
//!
//! **No transport concerns**: the HTTP client for the analyzer lives in `rda-gemini`, and the
//! REST and command-line front ends live in `api-rest` and `rda-cli`.

pub mod analyzer;
pub mod assembler;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod locator;
pub mod record;
pub mod report;
pub mod segments;
pub mod service;
pub mod storage;
pub mod validation;

pub use analyzer::{AnalysisRequest, Analyzer, AnalyzerUnavailable};
pub use assembler::Assembler;
pub use config::{core_config_from_env, CoreConfig};
pub use error::{
    AnalysisError, AnalysisResult, ConfigError, SchemaValidationError, StorageError,
    StorageResult,
};
pub use history::HistoryStore;
pub use locator::locate;
pub use record::{
    ActionPlan, Advice, AnalysisRecord, DetectedPattern, Fingerprint, ReplySuggestions, TextRange,
};
pub use report::{exceeds_threshold, pattern_distribution, patterns_by_severity, SeverityGroup};
pub use segments::{partition, Segment};
pub use service::AnalysisService;
pub use storage::{KeyValueStorage, MemoryStorage};

pub use rda_types::{DetailLevel, NonEmptyText, Priority, Severity};
pub use rda_uuid::Identifier;
