use serde_json::{json, Value};

use ghostpen_core::context::SystemSegment;
use ghostpen_core::errors::GatewayError;
use ghostpen_core::ids::ToolUseId;
use ghostpen_core::messages::{Block, Message, Role};
use ghostpen_core::provider::{ModelRequest, ModelResponse, StopReason};
use ghostpen_core::tokens::UsageCounters;

/// Request knobs that are fixed per provider rather than per call.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub max_tokens: u32,
    /// `Some(max_uses)` adds the provider-side web search tool.
    pub web_search: Option<u32>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            web_search: None,
        }
    }
}

/// Convert a model request into the Anthropic Messages API body.
pub fn build_request_body(request: &ModelRequest<'_>, options: &RequestOptions, model: &str) -> Value {
    let mut body = json!({
        "model": model,
        "max_tokens": options.max_tokens,
    });

    let system = convert_system_segments(request.system.segments());
    if !system.is_empty() {
        body["system"] = json!(system);
    }

    body["messages"] = json!(convert_messages(request.messages));

    let mut tools: Vec<Value> = request
        .tools
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.input_schema,
            })
        })
        .collect();
    if let Some(max_uses) = options.web_search {
        tools.push(json!({
            "type": "web_search_20250305",
            "name": "web_search",
            "max_uses": max_uses,
        }));
    }
    if !tools.is_empty() {
        body["tools"] = json!(tools);
    }

    body
}

/// System segments with a cache breakpoint on every segment marked cacheable.
fn convert_system_segments(segments: &[SystemSegment]) -> Vec<Value> {
    segments
        .iter()
        .map(|segment| {
            let mut entry = json!({"type": "text", "text": segment.content});
            if segment.cacheable {
                entry["cache_control"] = json!({"type": "ephemeral"});
            }
            entry
        })
        .collect()
}

fn convert_messages(messages: &[Message]) -> Vec<Value> {
    let mut result: Vec<Value> = messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            let content: Vec<Value> = msg.content.iter().map(convert_block).collect();
            json!({"role": role, "content": content})
        })
        .collect();

    // Breakpoint on the last user block so revision turns reuse the history prefix.
    if let Some(last_user_idx) = result.iter().rposition(|m| m["role"] == "user") {
        if let Some(content) = result[last_user_idx]["content"].as_array_mut() {
            if let Some(last_block) = content.last_mut() {
                last_block["cache_control"] = json!({"type": "ephemeral"});
            }
        }
    }

    result
}

fn convert_block(block: &Block) -> Value {
    match block {
        Block::Text { text } => json!({"type": "text", "text": text}),
        Block::ToolUse { id, name, input } => json!({
            "type": "tool_use",
            "id": id.as_str(),
            "name": name,
            "input": input,
        }),
        Block::ToolResult {
            tool_use_id,
            content,
        } => json!({
            "type": "tool_result",
            "tool_use_id": tool_use_id.as_str(),
            "content": content,
        }),
        Block::Server { raw } => raw.clone(),
    }
}

/// Parse a non-streaming Messages API response body.
pub fn parse_response(body: &Value) -> Result<ModelResponse, GatewayError> {
    let blocks = body
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::MalformedResponse("missing content array".into()))?;

    let content = blocks
        .iter()
        .map(parse_block)
        .collect::<Result<Vec<_>, _>>()?;

    let stop_reason = body
        .get("stop_reason")
        .and_then(Value::as_str)
        .map(StopReason::from_wire)
        .unwrap_or(StopReason::Other);

    Ok(ModelResponse {
        stop_reason,
        content,
        usage: parse_usage(body.get("usage")),
    })
}

fn parse_block(block: &Value) -> Result<Block, GatewayError> {
    match block.get("type").and_then(Value::as_str) {
        Some("text") => Ok(Block::Text {
            text: block
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
        Some("tool_use") => {
            let id = block
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| GatewayError::MalformedResponse("tool_use without id".into()))?;
            let name = block
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| GatewayError::MalformedResponse("tool_use without name".into()))?;
            Ok(Block::ToolUse {
                id: ToolUseId::from_raw(id),
                name: name.to_string(),
                input: block.get("input").cloned().unwrap_or_else(|| json!({})),
            })
        }
        Some(_) => Ok(Block::Server { raw: block.clone() }),
        None => Err(GatewayError::MalformedResponse(
            "content block without type".into(),
        )),
    }
}

fn parse_usage(usage: Option<&Value>) -> UsageCounters {
    let field = |name: &str| {
        usage
            .and_then(|u| u.get(name))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    };
    UsageCounters {
        input: field("input_tokens"),
        output: field("output_tokens"),
        cache_write: field("cache_creation_input_tokens"),
        cache_read: field("cache_read_input_tokens"),
    }
}
