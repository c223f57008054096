//! Turning a raw analyzer response into an [`AnalysisRecord`].
//!
//! The response is validated against the wire schema below before anything else happens; a
//! record is only built from a response that has every required field with the right type.
//! Each detected pattern then gets a fresh identifier and its citation is located in the
//! source text.
//!
//! Wire schema (camelCase JSON):
//!
//! ```text
//! {
//!   "summary": string,
//!   "score": number,
//!   "safetyAlert": bool,            // optional, defaults to false
//!   "subtext": string,              // optional, defaults to ""
//!   "fingerprint": { "tags": [string], "dominanceRatio": string, "validationScore": number },
//!   "patterns": [ { "name", "citation", "explanation", "countermeasure": string,
//!                   "severity": "low" | "medium" | "high" | "critical" } ],
//!   "plan": { "conclusion": string,
//!             "advice": [ { "title", "text": string, "priority": "low" | "medium" | "high" } ],
//!             "replies": { "deescalating", "assertive", "rationale": string } }
//! }
//! ```

use crate::error::SchemaValidationError;
use crate::locator::locate;
use crate::record::{ActionPlan, AnalysisRecord, DetectedPattern, Fingerprint};
use rda_types::Severity;
use rda_uuid::{Clock, IdGenerator};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    summary: String,
    score: f64,
    #[serde(default)]
    safety_alert: bool,
    #[serde(default)]
    subtext: String,
    fingerprint: Fingerprint,
    patterns: Vec<RawPattern>,
    plan: ActionPlan,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPattern {
    name: String,
    citation: String,
    explanation: String,
    countermeasure: String,
    severity: Severity,
}

fn parse_response(raw: &serde_json::Value) -> Result<RawResponse, SchemaValidationError> {
    serde_path_to_error::deserialize(raw).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_owned()
        } else {
            path
        };
        SchemaValidationError {
            path,
            message: err.into_inner().to_string(),
        }
    })
}

/// Builds analysis records, drawing identifiers and timestamps from injected collaborators.
///
/// Stateless apart from those collaborators; safe to share between threads.
#[derive(Clone)]
pub struct Assembler {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Assembler {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    /// Validates `raw` and builds a record for `source_text` with an empty context.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError`] naming the first missing or mistyped field.
    pub fn assemble(
        &self,
        raw: &serde_json::Value,
        source_text: &str,
    ) -> Result<AnalysisRecord, SchemaValidationError> {
        self.assemble_with_context(raw, source_text, "")
    }

    /// Validates `raw` and builds a record for `source_text`, keeping the caller's context.
    ///
    /// `source_text` is stored verbatim. Nothing is persisted; the caller decides whether to
    /// add the record to history.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError`] naming the first missing or mistyped field.
    pub fn assemble_with_context(
        &self,
        raw: &serde_json::Value,
        source_text: &str,
        context: &str,
    ) -> Result<AnalysisRecord, SchemaValidationError> {
        let response = parse_response(raw)?;

        let id = self.ids.next_id();
        let patterns: Vec<DetectedPattern> = response
            .patterns
            .into_iter()
            .map(|p| {
                let range = locate(source_text, &p.citation);
                DetectedPattern {
                    id: self.ids.next_id(),
                    name: p.name,
                    citation: p.citation,
                    explanation: p.explanation,
                    countermeasure: p.countermeasure,
                    severity: p.severity,
                    range,
                }
            })
            .collect();

        let unlocated = patterns.iter().filter(|p| p.range.is_none()).count();
        tracing::debug!(
            %id,
            patterns = patterns.len(),
            unlocated,
            "assembled analysis record"
        );

        Ok(AnalysisRecord {
            id,
            created_at: self.clock.now(),
            source_text: source_text.to_owned(),
            context: context.to_owned(),
            summary: response.summary,
            subtext: response.subtext,
            score: response.score,
            safety_alert: response.safety_alert,
            fingerprint: response.fingerprint,
            patterns,
            plan: response.plan,
        })
    }
}

impl std::fmt::Debug for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler").finish_non_exhaustive()
    }
}
