use crate::analyzer::AnalyzerUnavailable;

/// The analyzer's response did not match the expected shape.
///
/// `path` names the offending field (e.g. `patterns[1].severity`); `<root>` means the problem
/// is at the top level, typically a missing required field named in `message`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("analyzer response failed validation at {path}: {message}")]
pub struct SchemaValidationError {
    pub path: String,
    pub message: String,
}

/// Failures of a single analysis attempt.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Rejected before any analyzer or storage activity.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    SchemaValidation(#[from] SchemaValidationError),
    #[error("analyzer unavailable: {0}")]
    AnalyzerUnavailable(#[from] AnalyzerUnavailable),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Durable persistence failures. Never fatal to the history store's in-memory state.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend failed for key '{key}': {message}")]
    Backend { key: String, message: String },
    #[error("file storage error: {0}")]
    Files(#[from] rda_files::FilesError),
    #[error("failed to serialize history: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize history: {0}")]
    Deserialization(serde_json::Error),
    #[error("unsupported history format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Invalid startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
}
