//! The streaming completion loop implementation.

use std::sync::Arc;
use std::time::Duration;

use briefly_config::AppConfig;
use briefly_core::error::{Error, ProviderError, ToolError};
use briefly_core::message::{Conversation, Message, Role};
use briefly_core::provider::{CompletedResponse, CompletionRequest, Provider, StreamEvent, ToolDefinition};
use briefly_core::tool::{ToolInvocation, ToolRegistry, ToolResult};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::prompt::SYSTEM_PROMPT;

/// Receiver half of a chat stream: visible text chunks, then at most one error.
pub type ChunkReceiver = mpsc::Receiver<Result<String, Error>>;

/// Emitted when the round cap is hit while the model still wants tools.
const MAX_ROUNDS_NOTICE: &str = "\n\nI've reached the maximum number of article lookups for this message. \
Please ask again, or share a single article URL.";

/// Orchestrates streamed completion rounds and tool execution for one chat.
///
/// Cheap to clone: the provider and tool registry are shared, and nothing
/// here is mutated after construction.
#[derive(Clone)]
pub struct CompletionLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Tools advertised to the model
    tools: Arc<ToolRegistry>,

    /// The model to use
    model: String,

    /// Preamble prepended to every conversation
    system_prompt: String,

    /// Maximum completion rounds per request
    max_rounds: u32,

    /// Bound on a whole completion round, from request to completion event
    round_timeout: Duration,

    /// Bound on a single tool execution
    tool_timeout: Duration,
}

/// How a single completion round ended.
enum RoundOutcome {
    Completed(CompletedResponse),
    Cancelled,
}

impl CompletionLoop {
    /// Create a new completion loop with default limits.
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, model: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            max_rounds: 8,
            round_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(30),
        }
    }

    /// Create a completion loop using the limits from `config`.
    pub fn from_config(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: &AppConfig) -> Self {
        let mut runner = Self::new(provider, tools, &config.model)
            .with_max_rounds(config.agent.max_rounds)
            .with_round_timeout(Duration::from_secs(config.agent.round_timeout_secs))
            .with_tool_timeout(Duration::from_secs(config.agent.tool_timeout_secs));
        if let Some(prompt) = &config.agent.system_prompt_override {
            runner = runner.with_system_prompt(prompt);
        }
        runner
    }

    /// Set the maximum number of completion rounds.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    /// Set the per-round timeout.
    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }

    /// Set the per-tool-call timeout.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Replace the system preamble.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start the loop over `history` and return the visible output stream.
    ///
    /// History is validated up front: it must be non-empty and contain only
    /// user and assistant turns. Everything after that is reported through the
    /// receiver. Dropping the receiver cancels the loop and any in-flight
    /// upstream request.
    pub fn run(&self, history: Vec<Message>) -> Result<ChunkReceiver, Error> {
        validate_history(&history)?;

        info!(
            model = %self.model,
            messages = history.len(),
            "Starting completion loop"
        );

        let conversation = Conversation::seeded(&self.system_prompt, history);
        let (tx, rx) = mpsc::channel(128);
        let runner = self.clone();

        tokio::spawn(async move {
            runner.drive(conversation, tx).await;
        });

        Ok(rx)
    }

    async fn drive(self, mut conversation: Conversation, tx: mpsc::Sender<Result<String, Error>>) {
        let tool_definitions = self.tools.definitions();

        for round in 1..=self.max_rounds {
            debug!(round, items = conversation.len(), "Completion round");

            let outcome = tokio::select! {
                _ = tx.closed() => {
                    debug!(round, "Client disconnected, cancelling completion round");
                    return;
                }
                outcome = self.stream_round(&conversation, &tool_definitions, &tx) => outcome,
            };

            let response = match outcome {
                Ok(RoundOutcome::Completed(response)) => response,
                Ok(RoundOutcome::Cancelled) => {
                    debug!(round, "Client disconnected mid-round");
                    return;
                }
                Err(e) => {
                    warn!(round, error = %e, "Completion round failed");
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };

            let invocations = response.tool_invocations();
            if invocations.is_empty() {
                info!(rounds = round, tool_exchanges = conversation.tool_exchanges(), "Completion loop finished");
                return;
            }

            if round == self.max_rounds {
                warn!(rounds = round, "Max completion rounds reached with tool calls pending");
                let _ = tx.send(Ok(MAX_ROUNDS_NOTICE.to_string())).await;
                return;
            }

            debug!(tool_count = invocations.len(), "Executing tool calls");

            for invocation in invocations {
                let result = tokio::select! {
                    _ = tx.closed() => {
                        debug!(tool = %invocation.name, "Client disconnected during tool call");
                        return;
                    }
                    result = self.run_tool(&invocation) => result,
                };
                conversation.push_tool_exchange(invocation, result);
            }

            // Loop back: the model sees the tool results and decides what to do next
        }
    }

    /// Stream one round, forwarding text deltas to `tx` in arrival order.
    ///
    /// The round timeout bounds the time spent waiting on the upstream only.
    /// Time blocked handing chunks to a slow reader is not charged to it.
    async fn stream_round(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
        tx: &mpsc::Sender<Result<String, Error>>,
    ) -> Result<RoundOutcome, Error> {
        let mut budget = self.round_timeout;
        let request = CompletionRequest::new(&self.model, conversation, tools.to_vec());
        let mut events = self.upstream(&mut budget, self.provider.stream(request)).await??;

        while let Some(event) = self.upstream(&mut budget, events.recv()).await? {
            match event? {
                StreamEvent::TextDelta(delta) => {
                    if tx.send(Ok(delta)).await.is_err() {
                        return Ok(RoundOutcome::Cancelled);
                    }
                }
                StreamEvent::Completed(response) => return Ok(RoundOutcome::Completed(response)),
                StreamEvent::Other(kind) => trace!(kind = %kind, "Skipping stream event"),
            }
        }

        Err(ProviderError::StreamInterrupted("event stream closed before the response completed".into()).into())
    }

    /// Await an upstream future, charging the wait to the remaining round budget.
    async fn upstream<F: Future>(&self, budget: &mut Duration, fut: F) -> Result<F::Output, Error> {
        let start = tokio::time::Instant::now();
        match tokio::time::timeout(*budget, fut).await {
            Ok(output) => {
                *budget = budget.saturating_sub(start.elapsed());
                Ok(output)
            }
            Err(_) => {
                let secs = self.round_timeout.as_secs();
                warn!(timeout_secs = secs, "Completion round timed out waiting on upstream");
                Err(Error::Provider(ProviderError::Timeout(format!(
                    "completion round exceeded {secs}s"
                ))))
            }
        }
    }

    /// Run one tool call under the tool timeout. Never fails: errors become
    /// error-shaped results the model can read.
    async fn run_tool(&self, invocation: &ToolInvocation) -> ToolResult {
        let start = std::time::Instant::now();
        match tokio::time::timeout(self.tool_timeout, self.tools.dispatch(invocation)).await {
            Ok(result) => {
                debug!(
                    tool = %invocation.name,
                    call_id = %invocation.call_id,
                    is_error = result.is_error,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call finished"
                );
                result
            }
            Err(_) => {
                let err = ToolError::Timeout {
                    tool_name: invocation.name.clone(),
                    timeout_secs: self.tool_timeout.as_secs(),
                };
                warn!(tool = %invocation.name, error = %err, "Tool call timed out");
                ToolResult::error(&invocation.call_id, err)
            }
        }
    }
}

/// Reject histories the loop cannot run on.
fn validate_history(history: &[Message]) -> Result<(), Error> {
    if history.is_empty() {
        return Err(Error::InvalidInput("messages must not be empty".into()));
    }
    if let Some(m) = history.iter().find(|m| m.role == Role::System) {
        return Err(Error::InvalidInput(format!(
            "unsupported message role: {}",
            m.role.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use briefly_core::message::ConversationItem;
    use briefly_core::provider::{EventReceiver, OutputItem};
    use briefly_core::tool::Tool;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// One scripted completion round.
    enum Round {
        Events(Vec<Result<StreamEvent, ProviderError>>),
        /// Never completes; the sender is parked so the stream stays open.
        Hang,
        /// `stream()` itself fails.
        Reject(ProviderError),
    }

    /// A provider that replays scripted rounds and records every request.
    struct ScriptedProvider {
        rounds: Mutex<VecDeque<Round>>,
        requests: Mutex<Vec<CompletionRequest>>,
        parked: Mutex<Vec<mpsc::Sender<Result<StreamEvent, ProviderError>>>>,
    }

    impl ScriptedProvider {
        fn new(rounds: Vec<Round>) -> Arc<Self> {
            Arc::new(Self {
                rounds: Mutex::new(rounds.into()),
                requests: Mutex::new(vec![]),
                parked: Mutex::new(vec![]),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn parked_sender(&self) -> mpsc::Sender<Result<StreamEvent, ProviderError>> {
            self.parked.lock().unwrap()[0].clone()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn stream(&self, request: CompletionRequest) -> Result<EventReceiver, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let round = self
                .rounds
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedProvider: no more rounds");

            match round {
                Round::Events(events) => {
                    let (tx, rx) = mpsc::channel(events.len().max(1));
                    for event in events {
                        tx.try_send(event).unwrap();
                    }
                    Ok(rx)
                }
                Round::Hang => {
                    let (tx, rx) = mpsc::channel(1);
                    self.parked.lock().unwrap().push(tx);
                    Ok(rx)
                }
                Round::Reject(e) => Err(e),
            }
        }
    }

    /// Stands in for the article tool.
    struct FakeArticleTool {
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Tool for FakeArticleTool {
        fn name(&self) -> &str {
            "fetch_article"
        }
        fn description(&self) -> &str {
            "Fetch an article"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": { "url": { "type": "string" } },
                "required": ["url"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let url = arguments["url"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;
            if url.contains("paywall") {
                return Err(ToolError::ExecutionFailed {
                    tool_name: "fetch_article".into(),
                    reason: "Could not extract article content.".into(),
                });
            }
            Ok(serde_json::json!({ "title": "T", "content": "body text" }).to_string())
        }
    }

    fn registry(delay: Option<Duration>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FakeArticleTool { delay }));
        Arc::new(registry)
    }

    fn delta(text: &str) -> Result<StreamEvent, ProviderError> {
        Ok(StreamEvent::TextDelta(text.into()))
    }

    fn completed(output: Vec<OutputItem>) -> Result<StreamEvent, ProviderError> {
        Ok(StreamEvent::Completed(CompletedResponse {
            id: None,
            output,
        }))
    }

    fn call(call_id: &str, arguments: &str) -> OutputItem {
        OutputItem::FunctionCall(ToolInvocation::new(call_id, "fetch_article", arguments))
    }

    fn text_round(chunks: &[&str]) -> Round {
        let mut events: Vec<_> = chunks.iter().map(|c| delta(c)).collect();
        events.push(completed(vec![OutputItem::Message {
            text: chunks.concat(),
        }]));
        Round::Events(events)
    }

    fn tool_round(calls: Vec<OutputItem>) -> Round {
        Round::Events(vec![
            Ok(StreamEvent::Other("response.created".into())),
            completed(calls),
        ])
    }

    /// Drain the stream into (chunks, terminal error).
    async fn collect(mut rx: ChunkReceiver) -> (Vec<String>, Option<Error>) {
        let mut chunks = vec![];
        while let Some(item) = rx.recv().await {
            match item {
                Ok(chunk) => chunks.push(chunk),
                Err(e) => return (chunks, Some(e)),
            }
        }
        (chunks, None)
    }

    fn user(text: &str) -> Vec<Message> {
        vec![Message::user(text)]
    }

    #[tokio::test]
    async fn plain_answer_uses_one_round() {
        let provider = ScriptedProvider::new(vec![text_round(&["Hello", "! How", " can I help?"])]);
        let runner = CompletionLoop::new(provider.clone(), registry(None), "gpt-4o-mini");

        let (chunks, err) = collect(runner.run(user("hi")).unwrap()).await;

        assert!(err.is_none());
        assert_eq!(chunks, vec!["Hello", "! How", " can I help?"]);
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].name, "fetch_article");
    }

    #[tokio::test]
    async fn conversation_is_seeded_with_system_prompt() {
        let provider = ScriptedProvider::new(vec![text_round(&["ok"])]);
        let runner = CompletionLoop::new(provider.clone(), registry(None), "m")
            .with_system_prompt("Be brief.");

        let history = vec![
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
        ];
        collect(runner.run(history).unwrap()).await;

        let input = &provider.requests()[0].input;
        assert_eq!(input.len(), 4);
        assert_eq!(input[0], ConversationItem::Message(Message::system("Be brief.")));
        assert_eq!(input[3], ConversationItem::Message(Message::user("second")));
    }

    #[tokio::test]
    async fn tool_call_adds_one_round_with_paired_result() {
        let provider = ScriptedProvider::new(vec![
            tool_round(vec![call("call_1", r#"{"url":"https://example.com/a"}"#)]),
            text_round(&["Summary: ", "body text"]),
        ]);
        let runner = CompletionLoop::new(provider.clone(), registry(None), "m");

        let (chunks, err) = collect(runner.run(user("Summarize https://example.com/a")).unwrap()).await;

        assert!(err.is_none());
        assert_eq!(chunks.concat(), "Summary: body text");

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let input = &requests[1].input;
        assert_eq!(input.len(), 4);
        match (&input[2], &input[3]) {
            (ConversationItem::ToolInvocation(inv), ConversationItem::ToolResult(res)) => {
                assert_eq!(inv.call_id, "call_1");
                assert_eq!(res.invocation_id, "call_1");
                assert!(!res.is_error);
                assert!(res.output.contains("body text"));
            }
            other => panic!("expected invocation then result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deltas_keep_order_across_rounds() {
        let provider = ScriptedProvider::new(vec![
            Round::Events(vec![
                delta("Let me "),
                delta("read that."),
                completed(vec![call("c1", r#"{"url":"https://example.com/a"}"#)]),
            ]),
            text_round(&["\n\n", "Héllo ", "wörld"]),
        ]);
        let runner = CompletionLoop::new(provider, registry(None), "m");

        let (chunks, _) = collect(runner.run(user("go")).unwrap()).await;

        assert_eq!(chunks, vec!["Let me ", "read that.", "\n\n", "Héllo ", "wörld"]);
    }

    #[tokio::test]
    async fn malformed_arguments_become_error_result() {
        let provider = ScriptedProvider::new(vec![
            tool_round(vec![call("call_bad", "{not json")]),
            text_round(&["Sorry, that link did not work."]),
        ]);
        let runner = CompletionLoop::new(provider.clone(), registry(None), "m");

        let (chunks, err) = collect(runner.run(user("go")).unwrap()).await;

        assert!(err.is_none());
        assert_eq!(chunks, vec!["Sorry, that link did not work."]);
        let input = &provider.requests()[1].input;
        let ConversationItem::ToolResult(result) = input.last().unwrap() else {
            panic!("expected a tool result last");
        };
        assert!(result.is_error);
        assert_eq!(result.invocation_id, "call_bad");
        let payload: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert!(payload["error"].as_str().unwrap().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn tool_failure_is_fed_back_to_model() {
        let provider = ScriptedProvider::new(vec![
            tool_round(vec![call("c1", r#"{"url":"https://example.com/paywall"}"#)]),
            text_round(&["That article is paywalled."]),
        ]);
        let runner = CompletionLoop::new(provider.clone(), registry(None), "m");

        let (_, err) = collect(runner.run(user("go")).unwrap()).await;

        assert!(err.is_none());
        let input = &provider.requests()[1].input;
        let ConversationItem::ToolResult(result) = &input[3] else {
            panic!("expected a tool result");
        };
        assert!(result.is_error);
        assert!(result.output.contains("Could not extract article content"));
    }

    #[tokio::test]
    async fn every_call_in_a_round_is_executed_in_order() {
        let provider = ScriptedProvider::new(vec![
            tool_round(vec![
                call("c1", r#"{"url":"https://example.com/a"}"#),
                call("c2", r#"{"url":"https://example.com/b"}"#),
            ]),
            text_round(&["Both read."]),
        ]);
        let runner = CompletionLoop::new(provider.clone(), registry(None), "m");

        collect(runner.run(user("compare")).unwrap()).await;

        let input = &provider.requests()[1].input;
        let ids: Vec<_> = input[2..]
            .iter()
            .map(|item| match item {
                ConversationItem::ToolInvocation(inv) => format!("call:{}", inv.call_id),
                ConversationItem::ToolResult(res) => format!("result:{}", res.invocation_id),
                ConversationItem::Message(_) => "message".to_string(),
            })
            .collect();
        assert_eq!(ids, vec!["call:c1", "result:c1", "call:c2", "result:c2"]);
    }

    #[tokio::test]
    async fn round_cap_emits_notice_and_stops() {
        let provider = ScriptedProvider::new(vec![
            tool_round(vec![call("c1", r#"{"url":"https://example.com/a"}"#)]),
            tool_round(vec![call("c2", r#"{"url":"https://example.com/a"}"#)]),
            tool_round(vec![call("c3", r#"{"url":"https://example.com/a"}"#)]),
        ]);
        let runner = CompletionLoop::new(provider.clone(), registry(None), "m").with_max_rounds(3);

        let (chunks, err) = collect(runner.run(user("loop")).unwrap()).await;

        assert!(err.is_none());
        assert_eq!(chunks, vec![MAX_ROUNDS_NOTICE.to_string()]);
        assert_eq!(provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn rejected_request_is_terminal_error() {
        let provider = ScriptedProvider::new(vec![Round::Reject(ProviderError::AuthenticationFailed(
            "bad key".into(),
        ))]);
        let runner = CompletionLoop::new(provider, registry(None), "m");

        let (chunks, err) = collect(runner.run(user("hi")).unwrap()).await;

        assert!(chunks.is_empty());
        assert!(matches!(
            err,
            Some(Error::Provider(ProviderError::AuthenticationFailed(_)))
        ));
    }

    #[tokio::test]
    async fn mid_stream_failure_truncates_output() {
        let provider = ScriptedProvider::new(vec![Round::Events(vec![
            delta("Partial"),
            Err(ProviderError::StreamInterrupted("connection reset".into())),
        ])]);
        let runner = CompletionLoop::new(provider, registry(None), "m");

        let (chunks, err) = collect(runner.run(user("hi")).unwrap()).await;

        assert_eq!(chunks, vec!["Partial"]);
        assert!(matches!(
            err,
            Some(Error::Provider(ProviderError::StreamInterrupted(_)))
        ));
    }

    #[tokio::test]
    async fn stream_without_completion_is_error() {
        let provider = ScriptedProvider::new(vec![Round::Events(vec![delta("Dangling")])]);
        let runner = CompletionLoop::new(provider, registry(None), "m");

        let (_, err) = collect(runner.run(user("hi")).unwrap()).await;

        assert!(matches!(
            err,
            Some(Error::Provider(ProviderError::StreamInterrupted(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_round_times_out() {
        let provider = ScriptedProvider::new(vec![Round::Hang]);
        let runner = CompletionLoop::new(provider, registry(None), "m")
            .with_round_timeout(Duration::from_secs(5));

        let (_, err) = collect(runner.run(user("hi")).unwrap()).await;

        assert!(matches!(err, Some(Error::Provider(ProviderError::Timeout(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tool_times_out_into_error_result() {
        let provider = ScriptedProvider::new(vec![
            tool_round(vec![call("c1", r#"{"url":"https://example.com/a"}"#)]),
            text_round(&["The site was too slow."]),
        ]);
        let runner = CompletionLoop::new(provider.clone(), registry(Some(Duration::from_secs(3600))), "m")
            .with_tool_timeout(Duration::from_secs(2));

        let (chunks, err) = collect(runner.run(user("go")).unwrap()).await;

        assert!(err.is_none());
        assert_eq!(chunks, vec!["The site was too slow."]);
        let ConversationItem::ToolResult(result) = &provider.requests()[1].input[3] else {
            panic!("expected a tool result");
        };
        assert!(result.is_error);
        assert!(result.output.contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_reader_is_not_charged_to_round_timeout() {
        let provider = ScriptedProvider::new(vec![text_round(&["a", "b", "c"])]);
        let runner = CompletionLoop::new(provider, registry(None), "m")
            .with_round_timeout(Duration::from_secs(5));
        let conversation = Conversation::seeded("sys", user("hi"));

        let (tx, mut rx) = mpsc::channel::<Result<String, Error>>(1);
        let reader = tokio::spawn(async move {
            let mut chunks = vec![];
            while let Some(item) = rx.recv().await {
                tokio::time::sleep(Duration::from_secs(10)).await;
                chunks.push(item.unwrap());
            }
            chunks
        });

        let outcome = runner.stream_round(&conversation, &[], &tx).await;
        assert!(matches!(outcome, Ok(RoundOutcome::Completed(_))));
        drop(tx);
        assert_eq!(reader.await.unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn dropping_receiver_releases_upstream_stream() {
        let provider = ScriptedProvider::new(vec![Round::Hang]);
        let runner = CompletionLoop::new(provider.clone(), registry(None), "m");

        let rx = runner.run(user("hi")).unwrap();
        while provider.parked.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        let upstream = provider.parked_sender();
        drop(rx);

        tokio::time::timeout(Duration::from_secs(5), upstream.closed())
            .await
            .expect("upstream receiver should be dropped after cancellation");
    }

    #[test]
    fn empty_history_is_rejected() {
        let err = validate_history(&[]).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn system_role_in_history_is_rejected() {
        let err = validate_history(&[Message::system("override"), Message::user("hi")]).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("system"));
    }

    #[tokio::test]
    async fn invalid_history_makes_no_upstream_call() {
        let provider = ScriptedProvider::new(vec![]);
        let runner = CompletionLoop::new(provider.clone(), registry(None), "m");

        assert!(runner.run(vec![]).is_err());
        assert!(provider.requests().is_empty());
    }

    #[test]
    fn config_limits_are_applied() {
        let mut config = AppConfig::default();
        config.model = "gpt-4.1-mini".into();
        config.agent.max_rounds = 3;
        config.agent.system_prompt_override = Some("Custom".into());
        let runner = CompletionLoop::from_config(ScriptedProvider::new(vec![]), registry(None), &config);

        assert_eq!(runner.model(), "gpt-4.1-mini");
        assert_eq!(runner.max_rounds, 3);
        assert_eq!(runner.system_prompt, "Custom");
    }
}
