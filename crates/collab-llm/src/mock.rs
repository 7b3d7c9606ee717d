use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use collab_core::context::LlmContext;
use collab_core::errors::GatewayError;
use collab_core::ids::ToolCallId;
use collab_core::messages::{AssistantContent, AssistantMessage, StopReason, ToolCallBlock};
use collab_core::provider::{CompletionOptions, LlmProvider};

/// Pre-programmed responses for deterministic testing without API calls.
pub enum MockResponse {
    Message(AssistantMessage),
    /// Return an error from the complete() call itself.
    Error(GatewayError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockResponse>),
    /// Never resolve.
    Hang,
}

impl MockResponse {
    /// A natural end of turn with a single text segment.
    pub fn text(text: &str) -> Self {
        Self::Message(AssistantMessage::text(text))
    }

    /// A tool-use turn requesting `calls` in order. Ids are generated.
    pub fn tool_calls(calls: Vec<(&str, serde_json::Value)>) -> Self {
        Self::Message(AssistantMessage {
            content: calls
                .into_iter()
                .map(|(name, arguments)| {
                    AssistantContent::ToolCall(ToolCallBlock {
                        id: ToolCallId::new(),
                        name: name.to_string(),
                        arguments,
                    })
                })
                .collect(),
            usage: None,
            stop_reason: Some(StopReason::ToolUse),
        })
    }

    /// Convenience: wrap any response with a delay.
    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Mock provider that returns pre-programmed responses in sequence and
/// records every context it is queried with.
pub struct MockProvider {
    responses: Mutex<VecDeque<MockResponse>>,
    contexts: Mutex<Vec<LlmContext>>,
    call_count: AtomicUsize,
}

impl MockProvider {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            contexts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Contexts received so far, in call order.
    pub fn contexts(&self) -> Vec<LlmContext> {
        self.contexts.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(
        &self,
        context: &LlmContext,
        _options: &CompletionOptions,
    ) -> Result<AssistantMessage, GatewayError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.contexts.lock().push(context.clone());

        let next = self.responses.lock().pop_front();
        let Some(mut current) = next else {
            return Err(GatewayError::InvalidRequest(format!(
                "MockProvider: no response configured for call {idx}"
            )));
        };

        // Unroll nested delays iteratively to avoid recursive async.
        loop {
            match current {
                MockResponse::Message(msg) => return Ok(msg),
                MockResponse::Error(e) => return Err(e),
                MockResponse::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    current = *inner;
                }
                MockResponse::Hang => futures::future::pending::<()>().await,
            }
        }
    }
}
