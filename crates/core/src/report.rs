//! Derived, read-only views over an analysis record.

use crate::record::{AnalysisRecord, DetectedPattern};
use rda_types::Severity;
use serde::Serialize;

/// Patterns sharing one severity, in the order the analyzer emitted them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityGroup<'a> {
    pub severity: Severity,
    pub patterns: Vec<&'a DetectedPattern>,
}

/// Groups patterns from `critical` down to `low`. Empty groups are omitted.
pub fn patterns_by_severity(record: &AnalysisRecord) -> Vec<SeverityGroup<'_>> {
    Severity::DESCENDING
        .iter()
        .filter_map(|&severity| {
            let patterns: Vec<_> = record
                .patterns()
                .iter()
                .filter(|p| p.severity() == severity)
                .collect();
            (!patterns.is_empty()).then_some(SeverityGroup { severity, patterns })
        })
        .collect()
}

/// How often each pattern name occurs.
///
/// Sorted by count, most frequent first; equal counts keep the order in which the name first
/// appeared.
pub fn pattern_distribution(record: &AnalysisRecord) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for pattern in record.patterns() {
        match counts.iter_mut().find(|(name, _)| name == pattern.name()) {
            Some((_, count)) => *count += 1,
            None => counts.push((pattern.name().to_owned(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Whether the record's score reaches `threshold`.
pub fn exceeds_threshold(record: &AnalysisRecord, threshold: u8) -> bool {
    record.score() >= f64::from(threshold)
}
