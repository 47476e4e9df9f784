//! Chat Completions API wire types.
//!
//! These map directly onto the JSON the endpoint accepts and emits.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::message::{ChatRequest, Message};

/// Body of a streaming chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionBody<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
}

impl<'a> ChatCompletionBody<'a> {
    /// Builds a streaming body, falling back to `default_model` when the
    /// request leaves the model empty.
    #[must_use]
    pub fn streaming(request: &'a ChatRequest, default_model: &'a str) -> Self {
        let model = if request.model.is_empty() {
            default_model
        } else {
            request.model.as_str()
        };

        Self {
            model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: true,
        }
    }
}

/// The decoded payload of one event: one increment of a generated response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One candidate completion within a chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub message: Option<ChunkMessage>,
    #[serde(default)]
    pub delta: Option<ChunkMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message body of a choice, either a full `message` or an incremental `delta`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkMessage {
    #[serde(default)]
    pub role: Option<String>,
    /// `None` when the key is absent, `Some(Value::Null)` when it is `null`.
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Value>,
}

impl ChunkMessage {
    /// Whether the payload had a `content` key at all.
    #[must_use]
    pub const fn has_content_key(&self) -> bool {
        self.content.is_some()
    }

    /// The content, if it is a string.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().and_then(Value::as_str)
    }
}

/// Keeps an explicit `null` distinct from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// OpenAI error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// OpenAI error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}
