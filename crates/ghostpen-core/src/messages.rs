use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::ToolUseId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One content block inside a message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Text {
        text: String,
    },
    ToolUse {
        id: ToolUseId,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: ToolUseId,
        content: String,
    },
    /// A block produced and executed by the provider itself (web search
    /// calls and their results). Kept verbatim so it can be echoed back.
    Server {
        raw: Value,
    },
}

impl Block {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse { .. })
    }

    pub fn is_tool_result(&self) -> bool {
        matches!(self, Self::ToolResult { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<Block>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![Block::text(text)],
        }
    }

    pub fn assistant(content: Vec<Block>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// A user message bundling the results of one dispatch round.
    pub fn tool_results(results: Vec<(ToolUseId, String)>) -> Self {
        Self {
            role: Role::User,
            content: results
                .into_iter()
                .map(|(tool_use_id, content)| Block::ToolResult {
                    tool_use_id,
                    content,
                })
                .collect(),
        }
    }

    /// Concatenation of all text blocks; other blocks are ignored.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                Block::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tool_use_ids(&self) -> impl Iterator<Item = &ToolUseId> {
        self.content.iter().filter_map(|b| match b {
            Block::ToolUse { id, .. } => Some(id),
            _ => None,
        })
    }

    pub fn tool_result_ids(&self) -> impl Iterator<Item = &ToolUseId> {
        self.content.iter().filter_map(|b| match b {
            Block::ToolResult { tool_use_id, .. } => Some(tool_use_id),
            _ => None,
        })
    }

    pub fn has_tool_uses(&self) -> bool {
        self.content.iter().any(Block::is_tool_use)
    }

    pub fn has_tool_results(&self) -> bool {
        self.content.iter().any(Block::is_tool_result)
    }
}
