//! Anthropic Messages API adapter. Key differences from OpenAI:
//! - The system prompt is a top-level `system` field, not a message role.
//! - Content uses typed blocks: `[{"type": "text", "text": "..."}]`.
//! - `max_tokens` is required, not optional.
//! - Response content lives at `content[0].text`.

use super::{extract_text_at, ProviderAdapter};
use crate::catalog::ApiStyle;
use crate::error::ProviderFailure;
use crate::types::Request;
use serde_json::Value;

const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug)]
pub struct AnthropicAdapter;

impl ProviderAdapter for AnthropicAdapter {
    fn api_style(&self) -> ApiStyle {
        ApiStyle::Anthropic
    }

    fn build_payload(&self, model: &str, request: &Request) -> Value {
        let mut body = serde_json::json!({
            "model": model,
            "messages": [{
                "role": "user",
                "content": [{ "type": "text", "text": request.prompt }],
            }],
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });
        if let Some(system) = &request.system_prompt {
            body["system"] = Value::String(system.clone());
        }
        if let Some(t) = request.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        body
    }

    fn extract_content(&self, body: &Value) -> Result<String, ProviderFailure> {
        extract_text_at(body, "/content/0/text")
    }
}
