//! OpenAI Responses API provider.
//!
//! Speaks the streamed `/responses` protocol: the working conversation is
//! sent as `input` items, and the reply is an SSE stream of typed events.
//!
//! Recognized event types:
//! - `response.output_text.delta` → [`StreamEvent::TextDelta`]
//! - `response.completed` / `response.incomplete` → [`StreamEvent::Completed`]
//! - `error` / `response.failed` → a terminal [`ProviderError`]
//!
//! Everything else is surfaced as [`StreamEvent::Other`].

use async_trait::async_trait;
use briefly_core::error::ProviderError;
use briefly_core::message::ConversationItem;
use briefly_core::provider::*;
use briefly_core::tool::ToolInvocation;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::status::check_status;

/// A provider for the OpenAI Responses API (or any compatible endpoint).
pub struct OpenAiResponsesProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiResponsesProvider {
    /// Create a new Responses API provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        // No overall request timeout: streams may legitimately run long and the
        // completion loop bounds each round itself.
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Build the JSON body for a streamed request.
    fn request_body(request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "input": to_api_input(&request.input),
            "stream": true,
        });
        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(to_api_tools(&request.tools));
        }
        body
    }
}

/// Convert the working conversation to Responses API input items.
fn to_api_input(items: &[ConversationItem]) -> Vec<serde_json::Value> {
    items
        .iter()
        .map(|item| match item {
            ConversationItem::Message(m) => serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            }),
            ConversationItem::ToolInvocation(inv) => {
                let mut value = serde_json::json!({
                    "type": "function_call",
                    "call_id": inv.call_id,
                    "name": inv.name,
                    "arguments": inv.arguments,
                });
                if let Some(id) = &inv.item_id {
                    value["id"] = serde_json::json!(id);
                }
                value
            }
            ConversationItem::ToolResult(res) => serde_json::json!({
                "type": "function_call_output",
                "call_id": res.invocation_id,
                "output": res.output,
            }),
        })
        .collect()
}

/// Convert tool definitions to Responses API format (flat function tools).
fn to_api_tools(tools: &[ToolDefinition]) -> Vec<serde_json::Value> {
    tools
        .iter()
        .map(|t| {
            serde_json::json!({
                "type": "function",
                "name": t.name,
                "description": t.description,
                "parameters": t.parameters,
                "strict": t.strict,
            })
        })
        .collect()
}

#[async_trait]
impl briefly_core::Provider for OpenAiResponsesProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(&self, request: CompletionRequest) -> Result<EventReceiver, ProviderError> {
        let url = format!("{}/responses", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            input_items = request.input.len(),
            "Sending streaming request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = check_status(response).await?;

        let (tx, rx) = mpsc::channel(64);
        let provider_name = self.name.clone();

        // Spawn task to read the SSE byte stream and parse events
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::default();

            loop {
                let next = tokio::select! {
                    _ = tx.closed() => {
                        debug!(provider = %provider_name, "Stream receiver dropped, closing upstream connection");
                        return;
                    }
                    next = byte_stream.next() => next,
                };

                let bytes = match next {
                    Some(Ok(b)) => b,
                    Some(Err(e)) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                    None => break,
                };

                for data in decoder.push(&bytes) {
                    match parse_event_data(&data) {
                        Some(Ok(event)) => {
                            let finished = matches!(event, StreamEvent::Completed(_));
                            if tx.send(Ok(event)).await.is_err() {
                                return; // receiver dropped
                            }
                            if finished {
                                return;
                            }
                        }
                        Some(Err(e)) => {
                            warn!(provider = %provider_name, error = %e, "Upstream reported a failed response");
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                        None => {
                            trace!(provider = %provider_name, data = %data, "Ignoring unparseable SSE payload");
                        }
                    }
                }
            }

            // Byte stream ended before the response finished
            let _ = tx
                .send(Err(ProviderError::StreamInterrupted(
                    "stream ended before the response completed".into(),
                )))
                .await;
        });

        Ok(rx)
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

/// Splits an SSE byte stream into `data:` payloads.
///
/// Bytes are buffered until a line is complete, so a multi-byte character
/// that straddles two network chunks decodes intact. Blank separators,
/// comments and `event:` names are skipped (the type is repeated inside the
/// data payload).
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }
        payloads
    }
}

/// Parse one SSE `data:` payload.
///
/// Returns `None` for payloads that are not JSON (including `[DONE]`),
/// `Some(Err(..))` for upstream failure events.
fn parse_event_data(data: &str) -> Option<Result<StreamEvent, ProviderError>> {
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    let kind = value["type"].as_str().unwrap_or_default().to_string();

    let event: ApiStreamEvent = match serde_json::from_value(value) {
        Ok(event) => event,
        Err(e) => {
            trace!(kind = %kind, error = %e, "Known event type with unexpected shape");
            return Some(Ok(StreamEvent::Other(kind)));
        }
    };

    Some(match event {
        ApiStreamEvent::OutputTextDelta { delta } => Ok(StreamEvent::TextDelta(delta)),
        ApiStreamEvent::Completed { response } | ApiStreamEvent::Incomplete { response } => {
            Ok(StreamEvent::Completed(response.into_completed()))
        }
        ApiStreamEvent::Failed { response } => {
            let message = response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "response failed".into());
            Err(ProviderError::StreamInterrupted(message))
        }
        ApiStreamEvent::Error { code, message } => Err(ProviderError::StreamInterrupted(
            match code {
                Some(code) => format!("{code}: {message}"),
                None => message,
            },
        )),
        ApiStreamEvent::Unknown => Ok(StreamEvent::Other(kind)),
    })
}

// --- Responses API streaming types (internal) ---

/// The subset of upstream event kinds the loop interprets.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ApiStreamEvent {
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { delta: String },

    #[serde(rename = "response.completed")]
    Completed { response: ApiResponse },

    #[serde(rename = "response.incomplete")]
    Incomplete { response: ApiResponse },

    #[serde(rename = "response.failed")]
    Failed { response: ApiFailedResponse },

    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: String,
    },

    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    output: Vec<serde_json::Value>,
}

impl ApiResponse {
    fn into_completed(self) -> CompletedResponse {
        CompletedResponse {
            id: self.id,
            output: self.output.into_iter().map(convert_output_item).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiFailedResponse {
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiFunctionCall {
    #[serde(default)]
    id: Option<String>,
    call_id: String,
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessageItem {
    #[serde(default)]
    content: Vec<ApiContentPart>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ApiContentPart {
    #[serde(rename = "output_text")]
    OutputText { text: String },
    #[serde(other)]
    Unknown,
}

fn convert_output_item(value: serde_json::Value) -> OutputItem {
    let kind = value["type"].as_str().unwrap_or_default().to_string();
    match kind.as_str() {
        "function_call" => match serde_json::from_value::<ApiFunctionCall>(value) {
            Ok(call) => OutputItem::FunctionCall(ToolInvocation {
                call_id: call.call_id,
                item_id: call.id,
                name: call.name,
                arguments: call.arguments,
            }),
            Err(e) => {
                warn!(error = %e, "Malformed function_call output item");
                OutputItem::Other(kind)
            }
        },
        "message" => match serde_json::from_value::<ApiMessageItem>(value) {
            Ok(msg) => OutputItem::Message {
                text: msg
                    .content
                    .into_iter()
                    .filter_map(|part| match part {
                        ApiContentPart::OutputText { text } => Some(text),
                        ApiContentPart::Unknown => None,
                    })
                    .collect(),
            },
            Err(_) => OutputItem::Other(kind),
        },
        _ => OutputItem::Other(kind),
    }
}
