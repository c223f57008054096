//! Citation lookup.
//!
//! The analyzer quotes excerpts it claims appear in the submitted text. This module finds the
//! first case-insensitive occurrence of such a quote. Case folding is the simple per-character
//! `to_lowercase` comparison; full Unicode case folding (e.g. `ß` against `SS`) is not
//! attempted, so a quote only matches a slice with the same number of characters.

use crate::record::TextRange;

/// Finds the leftmost case-insensitive occurrence of `citation` in `source_text`.
///
/// Returns `None` when the citation is empty, longer than the source, or simply not present;
/// a missing citation is an expected outcome, not an error. The returned range is a byte range
/// on character boundaries, so `&source_text[range.start..range.end]` is always valid.
pub fn locate(source_text: &str, citation: &str) -> Option<TextRange> {
    if citation.is_empty() {
        return None;
    }

    let needle: Vec<char> = citation.chars().collect();
    let haystack: Vec<(usize, char)> = source_text.char_indices().collect();
    if needle.len() > haystack.len() {
        return None;
    }

    (0..=haystack.len() - needle.len())
        .find(|&first| {
            haystack[first..first + needle.len()]
                .iter()
                .zip(&needle)
                .all(|(&(_, a), &b)| chars_match(a, b))
        })
        .and_then(|first| {
            let start = haystack[first].0;
            let end = haystack
                .get(first + needle.len())
                .map_or(source_text.len(), |&(offset, _)| offset);
            TextRange::new(start, end)
        })
}

fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
