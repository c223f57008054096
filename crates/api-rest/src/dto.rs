//! Request and response bodies for the REST API.
//!
//! These mirror the core types with OpenAPI schemas attached; the core crate itself carries no
//! HTTP or documentation concerns.

use rda_core::{
    exceeds_threshold, pattern_distribution, patterns_by_severity, AnalysisRecord,
    DetectedPattern, Segment,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeReq {
    /// The conversation to analyse, kept verbatim.
    pub conversation: String,
    #[serde(default)]
    pub context: String,
    /// `compact`, `standard` or `deep`; the server default applies when omitted.
    #[serde(default)]
    pub detail_level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    /// Offending field of the analyzer response, for schema validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FingerprintRes {
    pub tags: Vec<String>,
    pub dominance_ratio: String,
    pub validation_score: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatternRes {
    pub id: String,
    pub name: String,
    pub citation: String,
    pub explanation: String,
    pub countermeasure: String,
    pub severity: String,
    /// Byte offset of the located citation, absent if it was not found in the text.
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl From<&DetectedPattern> for PatternRes {
    fn from(pattern: &DetectedPattern) -> Self {
        let range = pattern.range();
        Self {
            id: pattern.id().to_string(),
            name: pattern.name().to_string(),
            citation: pattern.citation().to_string(),
            explanation: pattern.explanation().to_string(),
            countermeasure: pattern.countermeasure().to_string(),
            severity: pattern.severity().to_string(),
            start: range.map(|r| r.start),
            end: range.map(|r| r.end),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdviceRes {
    pub title: String,
    pub text: String,
    pub priority: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RepliesRes {
    pub deescalating: String,
    pub assertive: String,
    pub rationale: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanRes {
    pub conclusion: String,
    pub advice: Vec<AdviceRes>,
    pub replies: RepliesRes,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordRes {
    pub id: String,
    pub created_at: String,
    pub source_text: String,
    pub context: String,
    pub summary: String,
    pub subtext: String,
    pub score: f64,
    pub safety_alert: bool,
    pub fingerprint: FingerprintRes,
    pub patterns: Vec<PatternRes>,
    pub plan: PlanRes,
}

impl From<&AnalysisRecord> for RecordRes {
    fn from(record: &AnalysisRecord) -> Self {
        let fingerprint = record.fingerprint();
        let plan = record.plan();
        Self {
            id: record.id().to_string(),
            created_at: record.created_at().to_rfc3339(),
            source_text: record.source_text().to_string(),
            context: record.context().to_string(),
            summary: record.summary().to_string(),
            subtext: record.subtext().to_string(),
            score: record.score(),
            safety_alert: record.safety_alert(),
            fingerprint: FingerprintRes {
                tags: fingerprint.tags.clone(),
                dominance_ratio: fingerprint.dominance_ratio.clone(),
                validation_score: fingerprint.validation_score,
            },
            patterns: record.patterns().iter().map(PatternRes::from).collect(),
            plan: PlanRes {
                conclusion: plan.conclusion.clone(),
                advice: plan
                    .advice
                    .iter()
                    .map(|a| AdviceRes {
                        title: a.title.clone(),
                        text: a.text.clone(),
                        priority: a.priority.to_string(),
                    })
                    .collect(),
                replies: RepliesRes {
                    deescalating: plan.replies.deescalating.clone(),
                    assertive: plan.replies.assertive.clone(),
                    rationale: plan.replies.rationale.clone(),
                },
            },
        }
    }
}

/// One history entry without the full text and plan.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordSummaryRes {
    pub id: String,
    pub created_at: String,
    pub summary: String,
    pub score: f64,
    pub safety_alert: bool,
    pub pattern_count: usize,
}

impl From<&AnalysisRecord> for RecordSummaryRes {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            id: record.id().to_string(),
            created_at: record.created_at().to_rfc3339(),
            summary: record.summary().to_string(),
            score: record.score(),
            safety_alert: record.safety_alert(),
            pattern_count: record.patterns().len(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListHistoryRes {
    pub capacity: usize,
    pub records: Vec<RecordSummaryRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SegmentRes {
    /// `plain` or `evidence`.
    pub kind: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub pattern_id: Option<String>,
}

impl From<&Segment> for SegmentRes {
    fn from(segment: &Segment) -> Self {
        let range = segment.range();
        Self {
            kind: if segment.is_evidence() {
                "evidence".to_string()
            } else {
                "plain".to_string()
            },
            start: range.start,
            end: range.end,
            text: segment.text().to_string(),
            pattern_id: segment.pattern_id().map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SegmentsRes {
    pub segments: Vec<SegmentRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeverityGroupRes {
    pub severity: String,
    pub pattern_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatternCountRes {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportRes {
    pub score: f64,
    pub threshold: u8,
    pub exceeds_threshold: bool,
    pub severity_groups: Vec<SeverityGroupRes>,
    pub distribution: Vec<PatternCountRes>,
}

impl ReportRes {
    pub fn new(record: &AnalysisRecord, threshold: u8) -> Self {
        Self {
            score: record.score(),
            threshold,
            exceeds_threshold: exceeds_threshold(record, threshold),
            severity_groups: patterns_by_severity(record)
                .into_iter()
                .map(|group| SeverityGroupRes {
                    severity: group.severity.to_string(),
                    pattern_ids: group.patterns.iter().map(|p| p.id().to_string()).collect(),
                })
                .collect(),
            distribution: pattern_distribution(record)
                .into_iter()
                .map(|(name, count)| PatternCountRes { name, count })
                .collect(),
        }
    }
}
