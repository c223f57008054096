use crate::prompt::{
    model_for, response_schema, strip_code_fence, thinking_budget, user_prompt,
    SYSTEM_INSTRUCTION,
};
use crate::GeminiConfig;
use async_trait::async_trait;
use rda_core::{AnalysisRequest, Analyzer, AnalyzerUnavailable};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
    response_schema: Value,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn text_part(text: String) -> Part {
    Part { text: Some(text) }
}

fn build_request(request: &AnalysisRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![text_part(SYSTEM_INSTRUCTION.to_string())],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![text_part(user_prompt(
                request.conversation.as_str(),
                &request.context,
            ))],
        }],
        generation_config: GenerationConfig {
            temperature: 0.1,
            response_mime_type: "application/json",
            response_schema: response_schema(),
            thinking_config: ThinkingConfig {
                thinking_budget: thinking_budget(request.detail_level),
            },
        },
    }
}

/// Joins the text parts of the first candidate. `None` if there is no text at all.
fn first_candidate_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

fn parse_model_output(text: &str) -> Result<Value, AnalyzerUnavailable> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AnalyzerUnavailable::MalformedPayload(e.to_string()))
}

fn transport_error(e: reqwest::Error) -> AnalyzerUnavailable {
    if e.is_timeout() {
        AnalyzerUnavailable::Timeout
    } else {
        AnalyzerUnavailable::Transport(e.to_string())
    }
}

/// [`Analyzer`] backed by the Gemini `generateContent` endpoint.
pub struct GeminiAnalyzer {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiAnalyzer {
    /// # Errors
    ///
    /// Returns `AnalyzerUnavailable::Transport` if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, AnalyzerUnavailable> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl Analyzer for GeminiAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Value, AnalyzerUnavailable> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AnalyzerUnavailable::NotConfigured("GEMINI_API_KEY is not set".to_string())
        })?;

        let model = model_for(
            request.detail_level,
            &self.config.flash_model,
            &self.config.pro_model,
        );
        debug!(model, detail_level = %request.detail_level, "calling Gemini");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .header("content-type", "application/json")
            .json(&build_request(request))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerUnavailable::Status {
                status: status.as_u16(),
                body,
            });
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            AnalyzerUnavailable::MalformedPayload(format!("failed to parse response: {}", e))
        })?;

        let text = first_candidate_text(api_response).ok_or(AnalyzerUnavailable::EmptyResponse)?;
        parse_model_output(&text)
    }
}

impl std::fmt::Debug for GeminiAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAnalyzer")
            .field("base_url", &self.config.base_url)
            .field("configured", &self.config.api_key.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rda_core::{DetailLevel, NonEmptyText};
    use serde_json::json;

    fn request(detail_level: DetailLevel) -> AnalysisRequest {
        AnalysisRequest {
            conversation: NonEmptyText::new("A: hi").unwrap(),
            context: "Family".to_string(),
            detail_level,
        }
    }

    #[test]
    fn request_body_uses_camel_case_wire_names() {
        let body = serde_json::to_value(build_request(&request(DetailLevel::Deep))).unwrap();

        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 32_768);
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(body["contents"][0]["role"], "user");
        assert!(body["systemInstruction"].get("role").is_none());
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("A: hi"));
    }

    #[test]
    fn candidate_text_parts_are_joined() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        }))
        .unwrap();

        assert_eq!(first_candidate_text(response).as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn missing_candidates_yield_no_text() {
        for body in [
            json!({}),
            json!({ "candidates": [] }),
            json!({ "candidates": [{ "finishReason": "SAFETY" }] }),
            json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] }),
        ] {
            let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
            assert_eq!(first_candidate_text(response), None);
        }
    }

    #[test]
    fn fenced_output_is_parsed() {
        let value = parse_model_output("```json\n{\"score\": 12}\n```").unwrap();
        assert_eq!(value["score"], 12);
    }

    #[test]
    fn unparsable_output_is_malformed() {
        let err = parse_model_output("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, AnalyzerUnavailable::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn missing_api_key_is_not_configured() {
        let analyzer = GeminiAnalyzer::new(GeminiConfig::default()).unwrap();

        let err = analyzer
            .analyze(&request(DetailLevel::Standard))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzerUnavailable::NotConfigured(_)));
    }

    #[test]
    fn endpoint_joins_base_url_and_model() {
        let config = GeminiConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..GeminiConfig::default()
        };
        let analyzer = GeminiAnalyzer::new(config).unwrap();

        assert_eq!(
            analyzer.endpoint("m"),
            "http://localhost:8080/v1beta/models/m:generateContent"
        );
    }
}
