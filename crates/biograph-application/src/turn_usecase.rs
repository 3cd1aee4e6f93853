//! Conversation turn use case.
//!
//! This module provides the `TurnUseCase` which drives one full
//! user-prompt-to-assistant-answer cycle: it sends the windowed history
//! and new prompt to the model, executes the tool calls the model
//! requests, feeds the results back, and repeats until the model answers
//! or the tool-batch budget is exhausted. On exit it synthesizes an
//! optional renderable graph from everything the tools returned.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use biograph_core::BioGraphError;
use biograph_core::graph::{self, GraphPayload};
use biograph_core::history::{
    DEFAULT_MAX_MESSAGE_CHARS, DEFAULT_MAX_MESSAGES, window_history,
};
use biograph_core::message::{ConversationMessage, MessageAttachment, MessageRole};
use biograph_core::mode::ToolMode;
use biograph_core::model::{ChatModel, Content, ContentRole, ModelRequest, Part, TokenUsage};
use biograph_core::tool::ToolCallResult;

use crate::tools::ToolRegistry;

/// Hard ceiling on tool batches per turn.
///
/// A model still requesting tools past this point is treated as having
/// exhausted its usefulness for the turn.
pub const MAX_TOOL_BATCHES: usize = 5;

const APOLOGY_TEXT: &str = "I'm sorry, I wasn't able to put together an answer for that \
request. Please try rephrasing your question.";

const FALLBACK_AFTER_TOOLS: &str = "I've gathered the requested data. See the structured \
results for details.";

const FINALIZE_INSTRUCTION: &str = "Using only the tool results already gathered in this \
conversation, provide your final answer now. Do not request any further tool calls.";

/// Per-turn options supplied by the caller.
///
/// The active tool mode is an explicit field here rather than ambient
/// session state, so no stickiness leaks across turns.
#[derive(Debug, Clone)]
pub struct TurnOptions {
    /// Run this turn in web-search mode instead of knowledge-graph mode.
    pub web_search: bool,
    /// Maximum history messages sent per request.
    pub max_history_messages: usize,
    /// Per-message character cap for windowed history.
    pub max_message_chars: usize,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            web_search: false,
            max_history_messages: DEFAULT_MAX_MESSAGES,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }
}

/// A finished assistant turn.
#[derive(Debug, Clone)]
pub struct CompletedTurn {
    /// The assistant's answer text; never empty.
    pub text: String,
    /// Every tool result accumulated during the turn.
    pub tool_results: Vec<ToolCallResult>,
    /// Renderable graph synthesized from the tool results, if any.
    pub graph: Option<GraphPayload>,
    /// Token usage summed across every model round trip in the turn.
    pub token_usage: TokenUsage,
}

/// Outcome of one turn. Cancellation is a distinct outcome, not an error.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Completed(CompletedTurn),
    Cancelled,
}

/// Use case driving the multi-turn tool-calling conversation loop.
///
/// Stateless across turns: each call to [`run_turn`](Self::run_turn)
/// starts with a fresh tool-result accumulator and a fresh graph
/// synthesis pass. The caller owns the conversation history; this use
/// case only reads it and returns new content for the caller to append.
pub struct TurnUseCase {
    /// The LLM provider.
    model: Arc<dyn ChatModel>,
    /// Adapter table executing the model's tool calls.
    tools: ToolRegistry,
}

impl TurnUseCase {
    /// Creates a new `TurnUseCase` over the given model and tool registry.
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry) -> Self {
        Self { model, tools }
    }

    /// Runs one full user turn.
    ///
    /// # Arguments
    ///
    /// * `prompt` - The new user message.
    /// * `attachments` - Inline files forwarded to the model with the prompt.
    /// * `history` - Caller-owned conversation history (read-only).
    /// * `options` - Per-turn options, including the tool mode.
    /// * `cancel` - Cooperative cancellation token, checked before every
    ///   network-bound step.
    ///
    /// # Errors
    ///
    /// Transport failures on the initial request or a tool-batch reply
    /// are propagated. A model that answers without usable content is
    /// not an error: the turn completes with a fixed apology text.
    pub async fn run_turn(
        &self,
        prompt: &str,
        attachments: &[MessageAttachment],
        history: &[ConversationMessage],
        options: &TurnOptions,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, BioGraphError> {
        let mode = ToolMode::select(options.web_search);
        let mut request = ModelRequest {
            contents: build_initial_contents(prompt, attachments, history, options),
            mode,
            system_instruction: mode.system_instruction().to_string(),
        };

        let mut token_usage = TokenUsage::default();
        let mut tool_results: Vec<ToolCallResult> = Vec::new();

        if cancel.is_cancelled() {
            return Ok(TurnOutcome::Cancelled);
        }
        let mut response = match self.model.generate(&request).await {
            Ok(response) => response,
            Err(err) => return self.complete_on_protocol_error(err, tool_results, token_usage),
        };
        token_usage.add(response.usage);

        let mut batches = 0usize;
        while !response.tool_calls.is_empty() && batches < MAX_TOOL_BATCHES {
            batches += 1;
            let calls = std::mem::take(&mut response.tool_calls);
            tracing::debug!(
                target: "turn_loop",
                batch = batches,
                calls = calls.len(),
                "executing tool batch"
            );

            // Record the model's calls in the running conversation before
            // answering them.
            request.contents.push(Content {
                role: ContentRole::Model,
                parts: calls.iter().cloned().map(Part::FunctionCall).collect(),
            });

            let mut response_parts = Vec::with_capacity(calls.len());
            for call in &calls {
                if cancel.is_cancelled() {
                    tracing::info!(target: "turn_loop", "cancelled before tool execution");
                    return Ok(TurnOutcome::Cancelled);
                }
                let result = self.tools.execute(call).await;
                response_parts.push(Part::FunctionResponse {
                    name: call.name,
                    response: result.to_model_value(),
                });
                tool_results.push(result);
            }
            request.contents.push(Content {
                role: ContentRole::User,
                parts: response_parts,
            });

            if cancel.is_cancelled() {
                tracing::info!(target: "turn_loop", "cancelled before tool-batch reply");
                return Ok(TurnOutcome::Cancelled);
            }
            response = match self.model.generate(&request).await {
                Ok(response) => response,
                Err(err) => {
                    return self.complete_on_protocol_error(err, tool_results, token_usage);
                }
            };
            token_usage.add(response.usage);
        }

        if !response.tool_calls.is_empty() {
            tracing::info!(
                target: "turn_loop",
                batches,
                "tool-batch budget exhausted with calls still pending"
            );
        }

        let mut text = response.extractable_text().map(str::to_string);

        // The model went quiet after gathering data: nudge it once to
        // produce an answer from what it already has.
        if text.is_none() && !tool_results.is_empty() {
            if cancel.is_cancelled() {
                return Ok(TurnOutcome::Cancelled);
            }
            request.contents.push(Content::user_text(FINALIZE_INSTRUCTION));
            match self.model.generate(&request).await {
                Ok(final_response) => {
                    token_usage.add(final_response.usage);
                    if !final_response.tool_calls.is_empty() {
                        tracing::debug!(
                            target: "turn_loop",
                            "finalization response requested tools; not honored"
                        );
                    }
                    text = final_response.extractable_text().map(str::to_string);
                }
                Err(err) => {
                    tracing::warn!(
                        target: "turn_loop",
                        error = %err,
                        "finalization request failed; falling back"
                    );
                }
            }
            if text.is_none() {
                text = Some(FALLBACK_AFTER_TOOLS.to_string());
            }
        }

        Ok(TurnOutcome::Completed(self.complete(
            text,
            tool_results,
            token_usage,
        )))
    }

    /// A model-protocol failure is fatal to the round, not the process:
    /// the turn completes with whatever was gathered so far. Transport
    /// failures still propagate.
    fn complete_on_protocol_error(
        &self,
        err: BioGraphError,
        tool_results: Vec<ToolCallResult>,
        token_usage: TokenUsage,
    ) -> Result<TurnOutcome, BioGraphError> {
        if !err.is_model_protocol() {
            return Err(err);
        }
        tracing::warn!(target: "turn_loop", error = %err, "model returned no usable content");
        let text = (!tool_results.is_empty()).then(|| FALLBACK_AFTER_TOOLS.to_string());
        Ok(TurnOutcome::Completed(self.complete(
            text,
            tool_results,
            token_usage,
        )))
    }

    fn complete(
        &self,
        text: Option<String>,
        tool_results: Vec<ToolCallResult>,
        token_usage: TokenUsage,
    ) -> CompletedTurn {
        let graph = graph::synthesize(&tool_results);
        tracing::debug!(
            target: "turn_loop",
            tools = tool_results.len(),
            has_graph = graph.is_some(),
            total_tokens = token_usage.total(),
            "turn completed"
        );
        CompletedTurn {
            // Callers never render a blank assistant turn.
            text: text.unwrap_or_else(|| APOLOGY_TEXT.to_string()),
            tool_results,
            graph,
            token_usage,
        }
    }
}

fn build_initial_contents(
    prompt: &str,
    attachments: &[MessageAttachment],
    history: &[ConversationMessage],
    options: &TurnOptions,
) -> Vec<Content> {
    let windowed = window_history(history, options.max_history_messages, options.max_message_chars);
    let mut contents: Vec<Content> = windowed.iter().map(content_from_message).collect();

    let mut parts = vec![Part::Text(prompt.to_string())];
    for attachment in attachments {
        parts.push(Part::InlineData {
            mime_type: attachment.mime_type.clone(),
            data: attachment.data.clone(),
        });
    }
    contents.push(Content {
        role: ContentRole::User,
        parts,
    });
    contents
}

fn content_from_message(message: &ConversationMessage) -> Content {
    match message.role {
        MessageRole::Assistant => Content::model_text(message.content.clone()),
        // The provider only accepts user/model roles in contents, so
        // synthetic system messages travel as user text.
        MessageRole::User | MessageRole::System => Content::user_text(message.content.clone()),
    }
}

#[cfg(test)]
#[path = "turn_usecase_test.rs"]
mod turn_usecase_test;
