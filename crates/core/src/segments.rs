//! Splitting a source text into plain and evidence segments for display.
//!
//! The output always covers the source text exactly: concatenating the segment texts in order
//! gives back the input, no two evidence segments overlap, and no segment is empty.
//!
//! When two located citations overlap, the one that starts first wins (ties go to the pattern
//! the analyzer emitted first) and the other is not rendered inline at all. The pattern itself
//! is untouched and still appears in the record's pattern list.

use crate::record::{DetectedPattern, TextRange};
use rda_uuid::Identifier;
use serde::{Deserialize, Serialize};

/// A contiguous slice of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Plain {
        range: TextRange,
        text: String,
    },
    Evidence {
        range: TextRange,
        text: String,
        pattern_id: Identifier,
    },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain { text, .. } | Segment::Evidence { text, .. } => text,
        }
    }

    pub fn range(&self) -> TextRange {
        match self {
            Segment::Plain { range, .. } | Segment::Evidence { range, .. } => *range,
        }
    }

    /// The pattern this segment is evidence for, if any.
    pub fn pattern_id(&self) -> Option<Identifier> {
        match self {
            Segment::Plain { .. } => None,
            Segment::Evidence { pattern_id, .. } => Some(*pattern_id),
        }
    }

    pub fn is_evidence(&self) -> bool {
        matches!(self, Segment::Evidence { .. })
    }
}

/// Partitions `source_text` into segments using the located ranges of `patterns`.
///
/// Patterns without a range are ignored. Ranges that do not fit the text (out of bounds or not
/// on a character boundary) are treated as unlocated; they can only come from tampered
/// storage, since the locator never produces them.
pub fn partition(source_text: &str, patterns: &[DetectedPattern]) -> Vec<Segment> {
    let mut located: Vec<(TextRange, Identifier)> = patterns
        .iter()
        .filter_map(|p| {
            p.range()
                .filter(|r| r.slice(source_text).is_some())
                .map(|r| (r, p.id()))
        })
        .collect();
    // `sort_by_key` is stable, so equal starts keep the analyzer's order.
    located.sort_by_key(|(range, _)| range.start);

    let mut segments = Vec::with_capacity(located.len() * 2 + 1);
    let mut cursor = 0;

    for (range, pattern_id) in located {
        if range.start < cursor {
            tracing::debug!(%pattern_id, start = range.start, cursor, "skipping overlapping evidence");
            continue;
        }
        push_plain(&mut segments, source_text, cursor, range.start);
        segments.push(Segment::Evidence {
            range,
            text: source_text[range.start..range.end].to_owned(),
            pattern_id,
        });
        cursor = range.end;
    }

    push_plain(&mut segments, source_text, cursor, source_text.len());
    segments
}

fn push_plain(segments: &mut Vec<Segment>, source_text: &str, start: usize, end: usize) {
    if let Some(range) = TextRange::new(start, end) {
        segments.push(Segment::Plain {
            range,
            text: source_text[start..end].to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rda_types::Severity;

    fn pattern(id: u128, citation: &str, range: Option<(usize, usize)>) -> DetectedPattern {
        DetectedPattern {
            id: Identifier::from_u128(id),
            name: format!("pattern {}", id),
            citation: citation.into(),
            explanation: String::new(),
            countermeasure: String::new(),
            severity: Severity::Medium,
            range: range.map(|(start, end)| TextRange { start, end }),
        }
    }

    fn texts(segments: &[Segment]) -> Vec<&str> {
        segments.iter().map(Segment::text).collect()
    }

    fn assert_covers(source: &str, segments: &[Segment]) {
        let joined: String = segments.iter().map(Segment::text).collect();
        assert_eq!(joined, source);

        let mut expected_start = 0;
        for segment in segments {
            let range = segment.range();
            assert_eq!(range.start, expected_start, "segments must be contiguous");
            assert!(range.end > range.start, "segments must not be empty");
            assert_eq!(&source[range.start..range.end], segment.text());
            expected_start = range.end;
        }
        assert_eq!(expected_start, source.len());
    }

    #[test]
    fn single_citation_at_end() {
        let source = "Hello world";
        let patterns = [pattern(1, "world", Some((6, 11)))];

        let segments = partition(source, &patterns);

        assert_eq!(
            segments,
            vec![
                Segment::Plain {
                    range: TextRange { start: 0, end: 6 },
                    text: "Hello ".into(),
                },
                Segment::Evidence {
                    range: TextRange { start: 6, end: 11 },
                    text: "world".into(),
                    pattern_id: Identifier::from_u128(1),
                },
            ]
        );
    }

    #[test]
    fn overlapping_citation_is_dropped() {
        let source = "Hello world";
        let patterns = [
            pattern(1, "Hello", Some((0, 5))),
            pattern(2, "lo wor", Some((3, 9))),
        ];

        let segments = partition(source, &patterns);

        assert_eq!(texts(&segments), vec!["Hello", " world"]);
        assert_eq!(segments[0].pattern_id(), Some(Identifier::from_u128(1)));
        assert!(!segments[1].is_evidence());
        // The pattern list itself is untouched.
        assert_eq!(patterns[1].range(), Some(TextRange { start: 3, end: 9 }));
    }

    #[test]
    fn equal_starts_keep_emission_order() {
        let source = "abcdef";
        let patterns = [
            pattern(7, "abc", Some((0, 3))),
            pattern(3, "ab", Some((0, 2))),
        ];

        let segments = partition(source, &patterns);

        assert_eq!(texts(&segments), vec!["abc", "def"]);
        assert_eq!(segments[0].pattern_id(), Some(Identifier::from_u128(7)));
    }

    #[test]
    fn unsorted_patterns_are_ordered_by_start() {
        let source = "one two three four";
        let patterns = [
            pattern(1, "four", Some((14, 18))),
            pattern(2, "one", Some((0, 3))),
            pattern(3, "three", Some((8, 13))),
        ];

        let segments = partition(source, &patterns);

        assert_eq!(texts(&segments), vec!["one", " two ", "three", " ", "four"]);
        assert_covers(source, &segments);
    }

    #[test]
    fn adjacent_evidence_has_no_plain_between() {
        let source = "abcdef";
        let patterns = [pattern(1, "abc", Some((0, 3))), pattern(2, "def", Some((3, 6)))];

        let segments = partition(source, &patterns);

        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(Segment::is_evidence));
    }

    #[test]
    fn unlocated_patterns_are_ignored() {
        let source = "nothing to see";
        let patterns = [pattern(1, "hallucinated", None)];

        let segments = partition(source, &patterns);

        assert_eq!(texts(&segments), vec!["nothing to see"]);
    }

    #[test]
    fn empty_source_yields_no_segments() {
        assert!(partition("", &[]).is_empty());
        assert!(partition("", &[pattern(1, "x", None)]).is_empty());
    }

    #[test]
    fn invalid_stored_ranges_are_ignored() {
        let source = "Grüße";
        let patterns = [
            pattern(1, "x", Some((3, 4))),
            pattern(2, "x", Some((0, 40))),
            pattern(3, "x", Some((4, 4))),
        ];

        let segments = partition(source, &patterns);

        assert_eq!(texts(&segments), vec!["Grüße"]);
    }

    #[test]
    fn evidence_never_overlaps_and_text_is_covered() {
        let source = "A: ich fühle mich einsam. B: Einsam? Ich arbeite für unsere Zukunft!";
        let patterns = [
            pattern(1, "", Some((3, 24))),
            pattern(2, "", Some((10, 30))),
            pattern(3, "", Some((29, 36))),
            pattern(4, "", Some((24, 25))),
            pattern(5, "", Some((37, 40))),
        ];

        let segments = partition(source, &patterns);

        assert_covers(source, &segments);
        let evidence: Vec<TextRange> = segments
            .iter()
            .filter(|s| s.is_evidence())
            .map(Segment::range)
            .collect();
        for pair in evidence.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn segment_serialises_with_kind_tag() {
        let segment = Segment::Evidence {
            range: TextRange { start: 0, end: 5 },
            text: "Hello".into(),
            pattern_id: Identifier::from_u128(1),
        };

        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["kind"], "evidence");
        assert_eq!(json["pattern_id"], "00000000000000000000000000000001");
        assert_eq!(json["range"]["start"], 0);
    }
}
