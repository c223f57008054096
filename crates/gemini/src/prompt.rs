//! Prompt text, response schema and reply clean-up for the Gemini analyzer.

use rda_core::DetailLevel;
use serde_json::{json, Value};

pub(crate) const SYSTEM_INSTRUCTION: &str = "\
You are a forensic communication analyst. Deconstruct the conversation you are given and \
identify manipulative rhetorical patterns such as gaslighting, blame shifting, guilt \
tripping, word salad and circular reasoning.

For every pattern you report, `citation` MUST be a verbatim excerpt of the conversation, \
copied character for character, short enough to point at the exact offending phrase.

Also decode the functional goal behind the messages (status preservation, emotional \
destabilisation, control) and write clinically neutral, de-escalating replies that offer no \
emotional surface to attack.

Tone: precise, analytical, free of filler. Respond with JSON only.";

/// Model used for a given detail level: the faster model for compact analyses, the stronger
/// one otherwise.
pub(crate) fn model_for<'a>(detail_level: DetailLevel, flash: &'a str, pro: &'a str) -> &'a str {
    match detail_level {
        DetailLevel::Compact => flash,
        DetailLevel::Standard | DetailLevel::Deep => pro,
    }
}

pub(crate) fn thinking_budget(detail_level: DetailLevel) -> u32 {
    match detail_level {
        DetailLevel::Deep => 32_768,
        DetailLevel::Compact | DetailLevel::Standard => 24_576,
    }
}

pub(crate) fn user_prompt(conversation: &str, context: &str) -> String {
    let context = if context.trim().is_empty() {
        "(none given)"
    } else {
        context
    };
    format!(
        "TASK: analyse the conversation below.\n\
         CONTEXT: {}\n\
         CONVERSATION:\n\"\"\"\n{}\n\"\"\"\n\
         Map every manipulative pattern you can support with a citation.",
        context, conversation
    )
}

/// JSON schema the model is asked to follow. Mirrors the record wire format.
pub(crate) fn response_schema() -> Value {
    let string = json!({ "type": "STRING" });
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": string,
            "score": { "type": "NUMBER" },
            "safetyAlert": { "type": "BOOLEAN" },
            "subtext": string,
            "fingerprint": {
                "type": "OBJECT",
                "properties": {
                    "tags": { "type": "ARRAY", "items": string },
                    "dominanceRatio": string,
                    "validationScore": { "type": "NUMBER" }
                },
                "required": ["tags", "dominanceRatio", "validationScore"]
            },
            "patterns": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": string,
                        "citation": string,
                        "explanation": string,
                        "countermeasure": string,
                        "severity": { "type": "STRING", "enum": ["low", "medium", "high", "critical"] }
                    },
                    "required": ["name", "citation", "explanation", "countermeasure", "severity"]
                }
            },
            "plan": {
                "type": "OBJECT",
                "properties": {
                    "conclusion": string,
                    "advice": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "title": string,
                                "text": string,
                                "priority": { "type": "STRING", "enum": ["low", "medium", "high"] }
                            },
                            "required": ["title", "text", "priority"]
                        }
                    },
                    "replies": {
                        "type": "OBJECT",
                        "properties": {
                            "deescalating": string,
                            "assertive": string,
                            "rationale": string
                        },
                        "required": ["deescalating", "assertive", "rationale"]
                    }
                },
                "required": ["conclusion", "advice", "replies"]
            }
        },
        "required": ["summary", "score", "safetyAlert", "subtext", "fingerprint", "patterns", "plan"]
    })
}

/// Removes a surrounding Markdown code fence (```` ```json ```` or bare ```` ``` ````).
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
