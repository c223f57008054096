//! Input validation applied before a conversation is sent for analysis.

use crate::error::{AnalysisError, AnalysisResult};
use rda_types::NonEmptyText;

/// Validates a submitted conversation.
///
/// The text is kept verbatim; surrounding whitespace is not stripped.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the conversation is empty, whitespace-only, or
/// longer than `max_chars` characters.
pub fn validate_conversation(conversation: &str, max_chars: usize) -> AnalysisResult<NonEmptyText> {
    let text = NonEmptyText::new(conversation)
        .map_err(|_| AnalysisError::InvalidInput("conversation cannot be empty".into()))?;

    let length = text.char_count();
    if length > max_chars {
        return Err(AnalysisError::InvalidInput(format!(
            "conversation is {} characters long; the maximum is {}",
            length, max_chars
        )));
    }

    Ok(text)
}
