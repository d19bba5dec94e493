//! Bounded conversation history.
//!
//! [`History`] owns the message list sent to the model. Two passes keep it
//! small: [`History::compress`] swaps stale, oversized tool results for a
//! short summary, and [`History::trim`] drops old exchanges while keeping
//! the original request. Both are idempotent.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use ghostpen_core::ids::ToolUseId;
use ghostpen_core::messages::{Block, Message, Role};

/// Text of the synthetic user message that stands in for dropped history.
pub const TRIM_PLACEHOLDER: &str = "[...earlier history trimmed...]";

#[derive(Clone, Debug)]
struct ToolRecord {
    name: String,
    /// The model has seen this tool's result in at least one request.
    consumed: bool,
}

#[derive(Clone, Debug)]
pub struct History {
    messages: Vec<Message>,
    tools: HashMap<ToolUseId, ToolRecord>,
    max_pairs: usize,
    compress_threshold: usize,
    version: u64,
}

fn is_placeholder(message: &Message) -> bool {
    message.role == Role::User
        && matches!(message.content.as_slice(), [Block::Text { text }] if text == TRIM_PLACEHOLDER)
}

impl History {
    /// `max_pairs` is N in the `1 + 2N` cap; `compress_threshold` is in chars.
    pub fn new(max_pairs: usize, compress_threshold: usize) -> Self {
        Self {
            messages: Vec::new(),
            tools: HashMap::new(),
            max_pairs: max_pairs.max(1),
            compress_threshold,
            version: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Bumped on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Name of the tool that produced `id`, from the side-table.
    pub fn tool_name(&self, id: &ToolUseId) -> Option<&str> {
        self.tools.get(id).map(|r| r.name.as_str())
    }

    pub fn append(&mut self, message: Message) {
        if message.role == Role::Assistant {
            for block in &message.content {
                if let Block::ToolUse { id, name, .. } = block {
                    self.tools.insert(
                        id.clone(),
                        ToolRecord {
                            name: name.clone(),
                            consumed: false,
                        },
                    );
                }
            }
        }
        self.messages.push(message);
        self.version += 1;
    }

    /// Record that the model has read every tool result currently in the
    /// history. Call after each successful model call.
    pub fn mark_consumed(&mut self) {
        let seen: Vec<ToolUseId> = self
            .messages
            .iter()
            .flat_map(Message::tool_result_ids)
            .cloned()
            .collect();
        for id in seen {
            if let Some(record) = self.tools.get_mut(&id) {
                record.consumed = true;
            }
        }
    }

    /// Replace consumed tool results longer than the threshold with the
    /// tool's fixed summary. Returns how many results were replaced.
    pub fn compress(&mut self, summary_for: impl Fn(&str) -> Option<&'static str>) -> usize {
        let mut replaced = 0;
        for message in &mut self.messages {
            for block in &mut message.content {
                let Block::ToolResult {
                    tool_use_id,
                    content,
                } = block
                else {
                    continue;
                };
                let Some(record) = self.tools.get(tool_use_id) else {
                    continue;
                };
                if !record.consumed || content.chars().count() <= self.compress_threshold {
                    continue;
                }
                let Some(summary) = summary_for(&record.name) else {
                    continue;
                };
                if content != summary {
                    *content = summary.to_string();
                    replaced += 1;
                }
            }
        }
        if replaced > 0 {
            self.version += 1;
            debug!(replaced, "tool results compressed");
        }
        replaced
    }

    /// Keep the first message plus roughly the last `2N`, with one
    /// placeholder in between. The kept tail always starts at an assistant
    /// message so no ToolResult is separated from its ToolUse.
    pub fn trim(&mut self) -> bool {
        let keep = 2 * self.max_pairs;
        if self.messages.len() <= 1 + keep {
            return false;
        }

        let earliest = self.messages.len() - keep;
        let Some(start) = (earliest..self.messages.len())
            .find(|&i| self.messages[i].role == Role::Assistant)
        else {
            return false;
        };
        if start <= 1 || (start == 2 && is_placeholder(&self.messages[1])) {
            return false;
        }

        let tail = self.messages.split_off(start);
        let dropped: HashSet<ToolUseId> = self
            .messages
            .drain(1..)
            .flat_map(|m| m.tool_use_ids().cloned().collect::<Vec<_>>())
            .collect();
        self.tools.retain(|id, _| !dropped.contains(id));

        self.messages.push(Message::user_text(TRIM_PLACEHOLDER));
        self.messages.extend(tail);
        self.version += 1;
        debug!(
            kept = self.messages.len(),
            dropped_tools = dropped.len(),
            "history trimmed"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::summary_for;
    use proptest::prelude::*;
    use serde_json::json;

    fn tool_exchange(history: &mut History, calls: &[(&str, usize)]) -> Vec<ToolUseId> {
        let ids: Vec<ToolUseId> = calls.iter().map(|_| ToolUseId::new()).collect();
        history.append(Message::assistant(
            calls
                .iter()
                .zip(&ids)
                .map(|((name, _), id)| Block::ToolUse {
                    id: id.clone(),
                    name: name.to_string(),
                    input: json!({}),
                })
                .collect(),
        ));
        history.append(Message::tool_results(
            calls
                .iter()
                .zip(&ids)
                .map(|((_, len), id)| (id.clone(), "r".repeat(*len)))
                .collect(),
        ));
        ids
    }

    fn result_content<'a>(history: &'a History, id: &ToolUseId) -> &'a str {
        history
            .messages()
            .iter()
            .flat_map(|m| &m.content)
            .find_map(|b| match b {
                Block::ToolResult {
                    tool_use_id,
                    content,
                } if tool_use_id == id => Some(content.as_str()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn fresh_results_are_not_compressed() {
        let mut history = History::new(6, 200);
        history.append(Message::user_text("write a post about burnout"));
        let ids = tool_exchange(&mut history, &[("read_style_profile", 500)]);

        assert_eq!(history.compress(summary_for), 0);
        assert_eq!(result_content(&history, &ids[0]).len(), 500);

        history.mark_consumed();
        assert_eq!(history.compress(summary_for), 1);
        assert_eq!(
            result_content(&history, &ids[0]),
            r#"{"summary":"style profile loaded"}"#
        );
        assert_eq!(history.compress(summary_for), 0);
    }

    #[test]
    fn compression_respects_threshold_and_unknown_tools() {
        let mut history = History::new(6, 200);
        history.append(Message::user_text("topic"));
        let ids = tool_exchange(
            &mut history,
            &[("read_past_posts", 200), ("mystery_tool", 900), ("read_past_posts", 201)],
        );
        history.mark_consumed();

        assert_eq!(history.compress(summary_for), 1);
        assert_eq!(result_content(&history, &ids[0]).len(), 200);
        assert_eq!(result_content(&history, &ids[1]).len(), 900);
        assert_eq!(
            result_content(&history, &ids[2]),
            r#"{"summary":"past posts checked"}"#
        );
    }

    #[test]
    fn trim_keeps_first_and_inserts_placeholder() {
        let mut history = History::new(2, 200);
        history.append(Message::user_text("original"));
        for i in 0..4 {
            history.append(Message::assistant(vec![Block::text(format!("draft {i}"))]));
            history.append(Message::user_text(format!("feedback {i}")));
        }
        assert_eq!(history.len(), 9);

        assert!(history.trim());
        let texts: Vec<String> = history.messages().iter().map(Message::text_content).collect();
        assert_eq!(
            texts,
            vec![
                "original",
                TRIM_PLACEHOLDER,
                "draft 2",
                "feedback 2",
                "draft 3",
                "feedback 3"
            ]
        );

        let version = history.version();
        assert!(!history.trim());
        assert_eq!(history.version(), version);
    }

    #[test]
    fn trim_never_orphans_tool_results() {
        let mut history = History::new(1, 200);
        history.append(Message::user_text("original"));
        tool_exchange(&mut history, &[("read_style_profile", 10)]);
        history.append(Message::assistant(vec![Block::text("draft")]));
        history.append(Message::user_text("shorter"));
        let ids = tool_exchange(&mut history, &[("read_past_posts", 10)]);

        assert!(history.trim());
        // The tail begins at the latest assistant message.
        assert_eq!(history.len(), 4);
        assert!(history.messages()[2].has_tool_uses());
        assert!(history.messages()[3].has_tool_results());
        assert_eq!(history.tool_name(&ids[0]), Some("read_past_posts"));
    }

    #[test]
    fn trim_prunes_side_table() {
        let mut history = History::new(1, 200);
        history.append(Message::user_text("original"));
        let old = tool_exchange(&mut history, &[("read_style_profile", 10)]);
        tool_exchange(&mut history, &[("save_to_file", 10)]);

        assert!(history.trim());
        assert_eq!(history.tool_name(&old[0]), None);
    }

    #[derive(Clone, Debug)]
    enum Exchange {
        Chat(String),
        Tools(Vec<(&'static str, usize)>),
    }

    fn exchange() -> impl Strategy<Value = Exchange> {
        let names = vec!["read_style_profile", "read_past_posts", "save_to_file", "mystery_tool"];
        prop_oneof![
            "[a-z ]{1,12}".prop_map(Exchange::Chat),
            prop::collection::vec((prop::sample::select(names), 0usize..400), 1..4)
                .prop_map(Exchange::Tools),
        ]
    }

    fn assert_pairing(messages: &[Message]) {
        for (i, message) in messages.iter().enumerate() {
            let uses: Vec<&ToolUseId> = message.tool_use_ids().collect();
            if !uses.is_empty() {
                let results: Vec<&ToolUseId> = messages[i + 1].tool_result_ids().collect();
                assert_eq!(uses, results, "pair split at {i}");
            }
            if message.has_tool_results() {
                let prev: Vec<&ToolUseId> = messages[i - 1].tool_use_ids().collect();
                let results: Vec<&ToolUseId> = message.tool_result_ids().collect();
                assert_eq!(prev, results, "orphan results at {i}");
            }
        }
    }

    proptest! {
        #[test]
        fn window_invariants_hold(
            max_pairs in 1usize..5,
            exchanges in prop::collection::vec(exchange(), 1..30),
        ) {
            let mut history = History::new(max_pairs, 200);
            let original = Message::user_text("write a post about remote work");
            history.append(original.clone());

            for ex in exchanges {
                history.mark_consumed();
                let fresh = match ex {
                    Exchange::Chat(text) => {
                        history.append(Message::assistant(vec![Block::text("draft")]));
                        history.append(Message::user_text(text));
                        Vec::new()
                    }
                    Exchange::Tools(calls) => {
                        let lens: Vec<usize> = calls.iter().map(|(_, len)| *len).collect();
                        let ids = tool_exchange(&mut history, &calls);
                        ids.into_iter().zip(lens).collect()
                    }
                };
                history.compress(summary_for);
                history.trim();

                prop_assert_eq!(&history.messages()[0], &original);
                prop_assert!(history.len() <= 2 * max_pairs + 2);
                assert_pairing(history.messages());
                for (id, len) in &fresh {
                    prop_assert_eq!(result_content(&history, id).len(), *len);
                }

                let snapshot = history.messages().to_vec();
                history.compress(summary_for);
                history.trim();
                prop_assert_eq!(history.messages(), snapshot.as_slice());
            }
        }
    }
}
