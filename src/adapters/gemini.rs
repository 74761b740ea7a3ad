//! Google Gemini generateContent adapter. Key differences:
//! - Uses `contents` with `parts`, not `messages` with `content`.
//! - There is no system role here; the system prompt is prefixed into the
//!   user part.
//! - Parameters live under `generationConfig` (`maxOutputTokens`).
//! - Response content lives at `candidates[0].content.parts[0].text`.

use super::{extract_text_at, ProviderAdapter};
use crate::catalog::ApiStyle;
use crate::error::ProviderFailure;
use crate::types::Request;
use serde_json::Value;

#[derive(Debug)]
pub struct GeminiAdapter;

impl GeminiAdapter {
    /// Fold the system prompt into the user text, separated by a blank line.
    fn user_text(request: &Request) -> String {
        match &request.system_prompt {
            Some(system) => format!("{}\n\n{}", system, request.prompt),
            None => request.prompt.clone(),
        }
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn api_style(&self) -> ApiStyle {
        ApiStyle::Gemini
    }

    fn build_payload(&self, _model: &str, request: &Request) -> Value {
        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": Self::user_text(request) }],
            }],
        });

        let mut gen_config = serde_json::Map::new();
        if let Some(t) = request.temperature {
            gen_config.insert("temperature".into(), serde_json::json!(t));
        }
        if let Some(mt) = request.max_tokens {
            gen_config.insert("maxOutputTokens".into(), serde_json::json!(mt));
        }
        if !gen_config.is_empty() {
            body["generationConfig"] = Value::Object(gen_config);
        }
        body
    }

    fn extract_content(&self, body: &Value) -> Result<String, ProviderFailure> {
        extract_text_at(body, "/candidates/0/content/parts/0/text")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskKind;

    #[test]
    fn test_system_prompt_prefixed_into_user_part() {
        let req = Request::new(TaskKind::Summarization, "Summarize the report")
            .system_prompt("Be terse.");
        let body = GeminiAdapter.build_payload("gemini-1.5-pro", &req);
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "Be terse.\n\nSummarize the report"
        );
        // No system field anywhere in the payload.
        assert!(body.get("system").is_none());
        assert!(body.get("system_instruction").is_none());
    }

    #[test]
    fn test_generation_config_only_when_needed() {
        let bare = Request::new(TaskKind::Question, "Hi");
        let body = GeminiAdapter.build_payload("gemini-1.5-flash", &bare);
        assert!(body.get("generationConfig").is_none());

        let tuned = Request::new(TaskKind::Question, "Hi")
            .temperature(0.3)
            .max_tokens(128);
        let body = GeminiAdapter.build_payload("gemini-1.5-flash", &tuned);
        assert_eq!(body["generationConfig"]["temperature"], 0.3);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 128);
    }

    #[test]
    fn test_extract_content() {
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Done."}], "role": "model"}}]
        });
        assert_eq!(GeminiAdapter.extract_content(&body).unwrap(), "Done.");
    }

    #[test]
    fn test_missing_candidates_is_failure() {
        let body = serde_json::json!({"candidates": []});
        assert!(matches!(
            GeminiAdapter.extract_content(&body),
            Err(ProviderFailure::EmptyContent)
        ));
    }
}
