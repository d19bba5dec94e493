use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::SystemContext;
use crate::errors::GatewayError;
use crate::messages::{Block, Message};
use crate::tokens::UsageCounters;
use crate::tools::ToolDescriptor;

/// Everything one model call needs. Borrowed: the engine owns all three.
#[derive(Clone, Copy, Debug)]
pub struct ModelRequest<'a> {
    pub system: &'a SystemContext,
    pub tools: &'a [ToolDescriptor],
    pub messages: &'a [Message],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    PauseTurn,
    Other,
}

impl StopReason {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "end_turn" => Self::EndTurn,
            "tool_use" => Self::ToolUse,
            "max_tokens" => Self::MaxTokens,
            "stop_sequence" => Self::StopSequence,
            "pause_turn" => Self::PauseTurn,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub stop_reason: StopReason,
    pub content: Vec<Block>,
    pub usage: UsageCounters,
}

impl ModelResponse {
    /// True when the response carries at least one locally dispatched tool call.
    pub fn wants_tools(&self) -> bool {
        self.content.iter().any(Block::is_tool_use)
    }

    /// Concatenated text blocks; tool calls and server blocks are skipped.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                Block::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn into_message(self) -> Message {
        Message::assistant(self.content)
    }
}

/// The model call boundary. Implementations must not retry.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ToolUseId;
    use serde_json::json;

    #[test]
    fn stop_reason_from_wire() {
        assert_eq!(StopReason::from_wire("tool_use"), StopReason::ToolUse);
        assert_eq!(StopReason::from_wire("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_wire("refusal"), StopReason::Other);
    }

    #[test]
    fn wants_tools_looks_at_blocks() {
        let response = ModelResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![
                Block::text("Checking past posts."),
                Block::ToolUse {
                    id: ToolUseId::from_raw("toolu_1"),
                    name: "read_past_posts".into(),
                    input: json!({"keywords": ["burnout"]}),
                },
            ],
            usage: UsageCounters::default(),
        };
        assert!(response.wants_tools());
        assert_eq!(response.text(), "Checking past posts.");
    }

    #[test]
    fn server_blocks_do_not_request_dispatch() {
        let response = ModelResponse {
            stop_reason: StopReason::EndTurn,
            content: vec![
                Block::Server {
                    raw: json!({"type": "server_tool_use", "name": "web_search"}),
                },
                Block::text("Draft"),
            ],
            usage: UsageCounters::default(),
        };
        assert!(!response.wants_tools());
        assert_eq!(response.into_message().text_content(), "Draft");
    }
}
