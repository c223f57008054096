//! Boundary to the remote language-analysis service.
//!
//! The core never talks to the network itself. Callers inject an [`Analyzer`] (the production
//! one lives in `rda-gemini`) and the core treats whatever it returns as untrusted JSON that
//! must pass [`crate::assembler`] validation before it is used. Timeouts, retries and
//! de-duplication of in-flight requests are the implementation's or the caller's business.

use async_trait::async_trait;
use rda_types::{DetailLevel, NonEmptyText};

/// What gets sent to the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub conversation: NonEmptyText,
    /// Free-form background supplied by the user; may be empty.
    pub context: String,
    pub detail_level: DetailLevel,
}

/// The analyzer could not produce a response.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerUnavailable {
    #[error("analyzer is not configured: {0}")]
    NotConfigured(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("analyzer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("analyzer returned no content")]
    EmptyResponse,
    #[error("analyzer returned unparsable content: {0}")]
    MalformedPayload(String),
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Runs one analysis and returns the raw structured response.
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<serde_json::Value, AnalyzerUnavailable>;
}
