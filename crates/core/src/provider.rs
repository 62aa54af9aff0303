//! Provider trait — the abstraction over the language-model endpoint.
//!
//! A Provider takes the working conversation plus the tool catalog and
//! returns a channel of typed [`StreamEvent`]s for one completion round.
//! Only the two event kinds the completion loop acts on get their own
//! variants; everything else arrives as [`StreamEvent::Other`] and is skipped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::message::{Conversation, ConversationItem};
use crate::tool::ToolInvocation;

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,

    /// Ask the model to follow the schema exactly
    #[serde(default)]
    pub strict: bool,
}

/// One streamed completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The full working conversation
    pub input: Vec<ConversationItem>,

    /// Tools the model may call this round
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

impl CompletionRequest {
    pub fn new(
        model: impl Into<String>,
        conversation: &Conversation,
        tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            model: model.into(),
            input: conversation.items().to_vec(),
            tools,
        }
    }
}

/// An event from a streamed completion round.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Partial output text, to be forwarded as-is.
    TextDelta(String),

    /// The round finished; carries every output item of the response.
    Completed(CompletedResponse),

    /// Any other upstream event kind, named by its type tag.
    Other(String),
}

/// The finished response of a completion round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletedResponse {
    /// Upstream response ID, if reported
    pub id: Option<String>,

    /// Output items in the order the model produced them
    pub output: Vec<OutputItem>,
}

impl CompletedResponse {
    /// Every tool invocation in this response, in emission order.
    pub fn tool_invocations(&self) -> Vec<ToolInvocation> {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::FunctionCall(inv) => Some(inv.clone()),
                _ => None,
            })
            .collect()
    }
}

/// An output item of a finished response.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputItem {
    /// Assistant text
    Message { text: String },

    /// A request to run a tool
    FunctionCall(ToolInvocation),

    /// Item kinds the loop does not interpret (reasoning, web search, ...)
    Other(String),
}

/// Receiver half of a completion round.
pub type EventReceiver = mpsc::Receiver<Result<StreamEvent, ProviderError>>;

/// The core Provider trait.
///
/// The completion loop calls `stream()` once per round without knowing which
/// backend answers it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Start a streamed completion round.
    ///
    /// Dropping the returned receiver cancels the round and releases the
    /// upstream connection.
    async fn stream(&self, request: CompletionRequest) -> Result<EventReceiver, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}
