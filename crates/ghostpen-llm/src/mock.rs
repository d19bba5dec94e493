use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use ghostpen_core::context::SystemContext;
use ghostpen_core::errors::GatewayError;
use ghostpen_core::ids::ToolUseId;
use ghostpen_core::messages::{Block, Message};
use ghostpen_core::provider::{LlmProvider, ModelRequest, ModelResponse, StopReason};
use ghostpen_core::tokens::UsageCounters;

/// Pre-programmed responses for deterministic testing without API calls.
pub enum MockResponse {
    Response(ModelResponse),
    Error(GatewayError),
}

impl MockResponse {
    /// A final text answer with a small, fixed usage footprint.
    pub fn text(text: &str) -> Self {
        Self::Response(ModelResponse {
            stop_reason: StopReason::EndTurn,
            content: vec![Block::text(text)],
            usage: Self::default_usage(),
        })
    }

    /// A response requesting the given tool calls, in order.
    pub fn tool_calls(calls: Vec<(ToolUseId, &str, Value)>) -> Self {
        Self::Response(ModelResponse {
            stop_reason: StopReason::ToolUse,
            content: calls
                .into_iter()
                .map(|(id, name, input)| Block::ToolUse {
                    id,
                    name: name.to_string(),
                    input,
                })
                .collect(),
            usage: Self::default_usage(),
        })
    }

    pub fn with_usage(self, usage: UsageCounters) -> Self {
        match self {
            Self::Response(mut response) => {
                response.usage = usage;
                Self::Response(response)
            }
            other => other,
        }
    }

    fn default_usage() -> UsageCounters {
        UsageCounters {
            input: 100,
            output: 50,
            cache_write: 0,
            cache_read: 0,
        }
    }
}

/// Snapshot of what the engine sent on one call.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub system: SystemContext,
    pub tool_names: Vec<String>,
    pub messages: Vec<Message>,
}

/// Mock provider that returns pre-programmed responses in sequence and
/// records every request it receives.
pub struct MockProvider {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
    call_count: AtomicUsize,
}

impl MockProvider {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
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

    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, GatewayError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().push(RecordedRequest {
            system: request.system.clone(),
            tool_names: request.tools.iter().map(|t| t.name.clone()).collect(),
            messages: request.messages.to_vec(),
        });

        match self.responses.lock().pop_front() {
            Some(MockResponse::Response(response)) => Ok(response),
            Some(MockResponse::Error(error)) => Err(error),
            None => Err(GatewayError::InvalidRequest(format!(
                "MockProvider: no response configured for call {idx}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn responses_in_sequence_then_error() {
        let provider = MockProvider::new(vec![
            MockResponse::tool_calls(vec![(
                ToolUseId::from_raw("toolu_1"),
                "read_past_posts",
                json!({"keywords": ["a"]}),
            )]),
            MockResponse::text("done"),
        ]);
        let system = SystemContext::default();
        let messages = vec![Message::user_text("hi")];
        let request = ModelRequest {
            system: &system,
            tools: &[],
            messages: &messages,
        };

        let first = provider.complete(request).await.unwrap();
        assert!(first.wants_tools());
        let second = provider.complete(request).await.unwrap();
        assert_eq!(second.text(), "done");
        assert!(provider.complete(request).await.is_err());
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.requests().len(), 3);
        assert_eq!(provider.requests()[0].messages, messages);
    }

    #[tokio::test]
    async fn scripted_error_is_returned() {
        let provider = MockProvider::new(vec![MockResponse::Error(GatewayError::NetworkError(
            "down".into(),
        ))]);
        let system = SystemContext::default();
        let err = provider
            .complete(ModelRequest {
                system: &system,
                tools: &[],
                messages: &[],
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_kind(), "network_error");
    }

    #[test]
    fn with_usage_overrides_counters() {
        let usage = UsageCounters {
            input: 1,
            output: 2,
            cache_write: 3,
            cache_read: 4,
        };
        match MockResponse::text("x").with_usage(usage) {
            MockResponse::Response(r) => assert_eq!(r.usage, usage),
            MockResponse::Error(_) => panic!("expected response"),
        }
    }
}
