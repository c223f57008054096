//! Analysis records.
//!
//! An [`AnalysisRecord`] is built once by the [`Assembler`](crate::Assembler) and never changes
//! afterwards: its fields are private and exposed through accessors only. The structured parts
//! the core never inspects (fingerprint, action plan) are plain data passed through as received.

use chrono::{DateTime, Utc};
use rda_types::{Priority, Severity};
use rda_uuid::Identifier;
use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a record's source text.
///
/// Ranges produced by the locator always lie on character boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    /// Returns `None` for empty or inverted ranges.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// The slice of `text` covered by this range, if it is non-empty, in bounds and on
    /// character boundaries.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.start >= self.end {
            return None;
        }
        text.get(self.start..self.end)
    }
}

/// Tone and dominance summary produced by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    pub tags: Vec<String>,
    pub dominance_ratio: String,
    pub validation_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advice {
    pub title: String,
    pub text: String,
    pub priority: Priority,
}

/// Alternative replies suggested to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplySuggestions {
    pub deescalating: String,
    pub assertive: String,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlan {
    pub conclusion: String,
    pub advice: Vec<Advice>,
    pub replies: ReplySuggestions,
}

/// One flagged rhetorical pattern together with the evidence the analyzer cited for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPattern {
    pub(crate) id: Identifier,
    pub(crate) name: String,
    pub(crate) citation: String,
    pub(crate) explanation: String,
    pub(crate) countermeasure: String,
    pub(crate) severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) range: Option<TextRange>,
}

impl DetectedPattern {
    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn citation(&self) -> &str {
        &self.citation
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn countermeasure(&self) -> &str {
        &self.countermeasure
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Where the citation was found in the source text; `None` if it could not be located.
    pub fn range(&self) -> Option<TextRange> {
        self.range
    }
}

/// The complete, immutable result of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub(crate) id: Identifier,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) source_text: String,
    #[serde(default)]
    pub(crate) context: String,
    pub(crate) summary: String,
    #[serde(default)]
    pub(crate) subtext: String,
    pub(crate) score: f64,
    pub(crate) safety_alert: bool,
    pub(crate) fingerprint: Fingerprint,
    pub(crate) patterns: Vec<DetectedPattern>,
    pub(crate) plan: ActionPlan,
}

impl AnalysisRecord {
    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The submitted conversation, exactly as received.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn subtext(&self) -> &str {
        &self.subtext
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn safety_alert(&self) -> bool {
        self.safety_alert
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Detected patterns in the order the analyzer emitted them.
    pub fn patterns(&self) -> &[DetectedPattern] {
        &self.patterns
    }

    pub fn plan(&self) -> &ActionPlan {
        &self.plan
    }

    pub fn pattern(&self, id: Identifier) -> Option<&DetectedPattern> {
        self.patterns.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_range_rejects_empty_and_inverted() {
        assert!(TextRange::new(3, 3).is_none());
        assert!(TextRange::new(5, 2).is_none());
        assert_eq!(TextRange::new(0, 5), Some(TextRange { start: 0, end: 5 }));
    }

    #[test]
    fn text_range_slice_checks_bounds_and_boundaries() {
        let text = "Grüße";
        assert_eq!(TextRange { start: 0, end: 4 }.slice(text), Some("Grü"));
        // 'ü' occupies bytes 2..4; 3 is inside it.
        assert_eq!(TextRange { start: 3, end: 4 }.slice(text), None);
        assert_eq!(TextRange { start: 0, end: 99 }.slice(text), None);
        assert_eq!(TextRange { start: 2, end: 2 }.slice(text), None);
    }

    #[test]
    fn pattern_without_range_omits_field() {
        let pattern = DetectedPattern {
            id: Identifier::from_u128(1),
            name: "Gaslighting".into(),
            citation: "you dreamt it".into(),
            explanation: "Denies a shared memory".into(),
            countermeasure: "Keep written records".into(),
            severity: Severity::High,
            range: None,
        };

        let json = serde_json::to_value(&pattern).unwrap();
        assert!(json.get("range").is_none());
        assert_eq!(json["severity"], "high");

        let back: DetectedPattern = serde_json::from_value(json).unwrap();
        assert_eq!(back, pattern);
    }
}
