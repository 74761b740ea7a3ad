//! Provider adapter layer: payload shaping and content extraction per API
//! style, behind an object-safe trait.
//!
//! The same executor code works against OpenAI-compatible, Anthropic and
//! Gemini endpoints; adding a provider means adding (or reusing) an adapter,
//! never editing a central branch statement.

pub mod anthropic;
pub mod gemini;

use crate::catalog::ApiStyle;
use crate::error::ProviderFailure;
use crate::types::Request;
use serde_json::Value;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;

/// Provider-specific request/response adaptation.
///
/// Implementations are stateless; one static instance per API style is
/// selected through [`adapter_for`].
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    fn api_style(&self) -> ApiStyle;

    /// Build the provider wire payload from the normalized request.
    fn build_payload(&self, model: &str, request: &Request) -> Value;

    /// Pull the normalized text content out of the provider envelope.
    /// Empty or missing content is a failure, not an empty success.
    fn extract_content(&self, body: &Value) -> Result<String, ProviderFailure>;
}

/// OpenAI chat-completions dialect. Also covers the many OpenAI-compatible
/// providers (DeepSeek, Moonshot, etc.).
#[derive(Debug)]
pub struct OpenAiAdapter;

impl ProviderAdapter for OpenAiAdapter {
    fn api_style(&self) -> ApiStyle {
        ApiStyle::OpenAi
    }

    fn build_payload(&self, model: &str, request: &Request) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": request.prompt }));

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });
        if let Some(t) = request.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        if let Some(mt) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(mt);
        }
        body
    }

    fn extract_content(&self, body: &Value) -> Result<String, ProviderFailure> {
        extract_text_at(body, "/choices/0/message/content")
    }
}

/// Shared extraction helper: a missing node or an empty string both count as
/// an empty response.
pub(crate) fn extract_text_at(body: &Value, pointer: &str) -> Result<String, ProviderFailure> {
    match body.pointer(pointer) {
        Some(Value::String(text)) if !text.is_empty() => Ok(text.clone()),
        Some(Value::String(_)) | None => Err(ProviderFailure::EmptyContent),
        Some(other) => Err(ProviderFailure::Malformed(format!(
            "expected string at '{pointer}', got {other}"
        ))),
    }
}

static OPENAI: OpenAiAdapter = OpenAiAdapter;
static ANTHROPIC: AnthropicAdapter = AnthropicAdapter;
static GEMINI: GeminiAdapter = GeminiAdapter;

/// Select the adapter for an API style.
pub fn adapter_for(style: ApiStyle) -> &'static dyn ProviderAdapter {
    match style {
        ApiStyle::OpenAi => &OPENAI,
        ApiStyle::Anthropic => &ANTHROPIC,
        ApiStyle::Gemini => &GEMINI,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskKind;

    #[test]
    fn test_openai_payload_shape() {
        let req = Request::new(TaskKind::Question, "Hello")
            .system_prompt("Be brief.")
            .temperature(0.7)
            .max_tokens(256);
        let body = OpenAiAdapter.build_payload("gpt-4o", &req);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello");
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["max_tokens"], 256);
    }

    #[test]
    fn test_openai_payload_without_system() {
        let req = Request::new(TaskKind::Question, "Hello");
        let body = OpenAiAdapter.build_payload("gpt-4o", &req);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_openai_extract_content() {
        let body = serde_json::json!({
            "choices": [{"message": {"content": "Hi there"}}]
        });
        assert_eq!(OpenAiAdapter.extract_content(&body).unwrap(), "Hi there");
    }

    #[test]
    fn test_empty_content_is_a_failure() {
        let empty = serde_json::json!({"choices": [{"message": {"content": ""}}]});
        assert!(matches!(
            OpenAiAdapter.extract_content(&empty),
            Err(ProviderFailure::EmptyContent)
        ));
        let missing = serde_json::json!({"choices": []});
        assert!(matches!(
            OpenAiAdapter.extract_content(&missing),
            Err(ProviderFailure::EmptyContent)
        ));
    }

    #[test]
    fn test_non_string_content_is_malformed() {
        let body = serde_json::json!({"choices": [{"message": {"content": 42}}]});
        assert!(matches!(
            OpenAiAdapter.extract_content(&body),
            Err(ProviderFailure::Malformed(_))
        ));
    }

    #[test]
    fn test_adapter_selection_by_style() {
        assert_eq!(adapter_for(ApiStyle::OpenAi).api_style(), ApiStyle::OpenAi);
        assert_eq!(
            adapter_for(ApiStyle::Anthropic).api_style(),
            ApiStyle::Anthropic
        );
        assert_eq!(adapter_for(ApiStyle::Gemini).api_style(), ApiStyle::Gemini);
    }
}
