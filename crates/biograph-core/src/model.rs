//! The chat-model seam.
//!
//! The orchestrator talks to the LLM provider through the [`ChatModel`]
//! trait only; the HTTP implementation lives in the interaction crate.
//! Requests carry the running conversation as provider-agnostic contents;
//! responses carry extractable text, requested tool calls and token usage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BioGraphError;
use crate::mode::ToolMode;
use crate::tool::{ToolCallRequest, ToolName};

/// Role of one content block in a model conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
    User,
    Model,
}

/// One piece of a content block.
#[derive(Debug, Clone)]
pub enum Part {
    /// Plain text.
    Text(String),
    /// Inline binary data; encoded to base64 at the wire.
    InlineData { mime_type: String, data: Vec<u8> },
    /// A tool call the model issued.
    FunctionCall(ToolCallRequest),
    /// The resolved result of a tool call, fed back to the model.
    FunctionResponse { name: ToolName, response: Value },
}

/// One content block in the running conversation.
#[derive(Debug, Clone)]
pub struct Content {
    pub role: ContentRole,
    pub parts: Vec<Part>,
}

impl Content {
    /// A user content block with a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ContentRole::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// A model content block with a single text part.
    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: ContentRole::Model,
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// A single model round-trip request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Running conversation, oldest first.
    pub contents: Vec<Content>,
    /// Which tool set is active for this turn.
    pub mode: ToolMode,
    /// System guidance prepended by the mode controller.
    pub system_instruction: String,
}

/// Prompt/completion token counts for one round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Creates a usage pair.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    /// Accumulates another round trip's usage.
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
    }

    /// Total tokens across prompt and completion.
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// A decoded model response.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    /// Extractable answer text, if the model produced any.
    pub text: Option<String>,
    /// Tool calls the model requested, in emission order.
    pub tool_calls: Vec<ToolCallRequest>,
    /// Token usage reported for this round trip.
    pub usage: TokenUsage,
}

impl ModelResponse {
    /// Returns the answer text if it is non-empty after trimming.
    pub fn extractable_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Abstraction over the LLM provider.
///
/// Implementations must be safe to call repeatedly within one turn: the
/// orchestrator sends the initial request, then one follow-up per tool
/// batch, then possibly a finalization request.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends one request and decodes the response.
    ///
    /// # Errors
    ///
    /// Returns [`BioGraphError::ModelProtocol`] when the provider answers
    /// without any candidate content, and transport-level variants for
    /// network or serialization failures.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, BioGraphError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usage_accumulates_saturating() {
        let mut usage = TokenUsage::new(10, 5);
        usage.add(TokenUsage::new(7, 3));
        assert_eq!(usage, TokenUsage::new(17, 8));
        assert_eq!(usage.total(), 25);

        usage.add(TokenUsage::new(u32::MAX, 0));
        assert_eq!(usage.prompt_tokens, u32::MAX);
    }

    #[test]
    fn extractable_text_ignores_whitespace() {
        let response = ModelResponse {
            text: Some("   \n".to_string()),
            ..ModelResponse::default()
        };
        assert_eq!(response.extractable_text(), None);

        let response = ModelResponse {
            text: Some(" answer ".to_string()),
            ..ModelResponse::default()
        };
        assert_eq!(response.extractable_text(), Some("answer"));
    }
}
