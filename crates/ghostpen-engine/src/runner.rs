//! The turn engine: model call, tool dispatch, human review, save.

use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use ghostpen_core::ids::ToolUseId;
use ghostpen_core::messages::{Block, Message};
use ghostpen_core::provider::{LlmProvider, ModelRequest, ModelResponse, StopReason};
use ghostpen_core::tools::ToolOutcome;
use ghostpen_settings::GhostpenSettings;
use ghostpen_store::{EventKind, PostRecord};

use crate::context::{AssembledContext, History};
use crate::error::EngineError;
use crate::human::HumanIo;
use crate::intent::{IntentClassifier, UserIntent};
use crate::recorder::SessionRecorder;
use crate::registry::ToolRegistry;
use crate::save;
use crate::tools::{summary_for, Platform, SaveInput, ToolCall, ToolKind};
use crate::usage::UsageTracker;

pub const FEEDBACK_PROMPT: &str = r#"What to change? ("ok" to save, "exit" to quit)"#;
pub const NOTION_PROMPT: &str = "Also save to Notion? (y/n)";

/// Tunables for one engine instance.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub max_history_pairs: usize,
    pub compress_threshold: usize,
    pub intents: IntentClassifier,
}

impl EngineConfig {
    pub fn from_settings(settings: &GhostpenSettings) -> Self {
        Self {
            max_history_pairs: settings.max_history_pairs,
            compress_threshold: settings.compress_threshold,
            intents: IntentClassifier::from_settings(settings),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_settings(&GhostpenSettings::default())
    }
}

/// What the save path produced.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveReport {
    pub record: PostRecord,
    pub file_path: Option<String>,
    pub notion_url: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionOutcome {
    Saved(SaveReport),
    Abandoned,
}

enum TurnState {
    Thinking,
    ToolDispatch(ModelResponse),
    Present(ModelResponse),
    Revise {
        response: ModelResponse,
        feedback: String,
    },
    Save(String),
    Done(SessionOutcome),
}

impl TurnState {
    fn name(&self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::ToolDispatch(_) => "tool_dispatch",
            Self::Present(_) => "present",
            Self::Revise { .. } => "revise",
            Self::Save(_) => "save",
            Self::Done(_) => "done",
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "т" | "так"
    )
}

fn failure_text(outcome: &ToolOutcome) -> &str {
    outcome
        .message()
        .or_else(|| outcome.error_code())
        .unwrap_or("failed")
}

/// Drives one session. Owns the history exclusively; the usage tracker and
/// recorder are handed back by [`TurnEngine::into_parts`] for teardown.
pub struct TurnEngine<'a> {
    provider: &'a dyn LlmProvider,
    registry: &'a ToolRegistry,
    context: &'a AssembledContext,
    intents: IntentClassifier,
    history: History,
    usage: UsageTracker,
    recorder: SessionRecorder,
}

impl<'a> TurnEngine<'a> {
    pub fn new(
        provider: &'a dyn LlmProvider,
        registry: &'a ToolRegistry,
        context: &'a AssembledContext,
        config: EngineConfig,
        recorder: SessionRecorder,
    ) -> Self {
        Self {
            usage: UsageTracker::new(provider.model()),
            provider,
            registry,
            context,
            intents: config.intents,
            history: History::new(config.max_history_pairs, config.compress_threshold),
            recorder,
        }
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn into_parts(self) -> (UsageTracker, SessionRecorder) {
        (self.usage, self.recorder)
    }

    /// Run until the draft is saved or abandoned. Transport errors end the
    /// run immediately; tool failures never do.
    #[instrument(skip_all, fields(profile = %self.context.profile_used))]
    pub async fn run(
        &mut self,
        input: &str,
        human: &mut dyn HumanIo,
    ) -> Result<SessionOutcome, EngineError> {
        self.history.append(Message::user_text(input));
        let mut state = TurnState::Thinking;

        loop {
            debug!(state = state.name(), messages = self.history.len(), "turn state");
            state = match state {
                TurnState::Thinking => {
                    let response = self.think().await?;
                    if response.wants_tools() {
                        TurnState::ToolDispatch(response)
                    } else if response.stop_reason == StopReason::PauseTurn {
                        // Server tool still running; hand the partial turn back.
                        self.history.append(response.into_message());
                        TurnState::Thinking
                    } else {
                        TurnState::Present(response)
                    }
                }
                TurnState::ToolDispatch(response) => {
                    self.dispatch_tools(response, human).await;
                    TurnState::Thinking
                }
                TurnState::Present(response) => {
                    let draft = response.text();
                    self.recorder
                        .record(EventKind::AssistantText, json!({ "text": draft }));
                    human.show_draft(&draft);
                    match self.solicit_feedback(human).await? {
                        UserIntent::Exit => TurnState::Done(SessionOutcome::Abandoned),
                        UserIntent::Accept => TurnState::Save(draft),
                        UserIntent::Revise(feedback) => TurnState::Revise { response, feedback },
                    }
                }
                TurnState::Revise { response, feedback } => {
                    self.history.append(response.into_message());
                    self.history.append(Message::user_text(feedback));
                    self.maintain_window();
                    TurnState::Thinking
                }
                TurnState::Save(draft) => {
                    let report = self.save(&draft, input, human).await?;
                    TurnState::Done(SessionOutcome::Saved(report))
                }
                TurnState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    fn maintain_window(&mut self) {
        self.history.compress(summary_for);
        self.history.trim();
    }

    #[instrument(skip(self), fields(model = %self.provider.model(), messages = self.history.len()))]
    async fn think(&mut self) -> Result<ModelResponse, EngineError> {
        self.maintain_window();
        let request = ModelRequest {
            system: &self.context.system,
            tools: self.registry.descriptors(),
            messages: self.history.messages(),
        };
        let response = self.provider.complete(request).await?;

        self.history.mark_consumed();
        self.usage.record(&response.usage);
        self.recorder.record(
            EventKind::ApiCall,
            json!({ "stop_reason": response.stop_reason, "usage": response.usage }),
        );
        for block in &response.content {
            if let Block::Server { raw } = block {
                self.recorder.record(EventKind::ServerTool, raw.clone());
            }
        }
        debug!(stop_reason = ?response.stop_reason, output = response.usage.output, "model responded");
        Ok(response)
    }

    /// Dispatch every ToolUse in order, then append all results as one
    /// message directly after the assistant message.
    async fn dispatch_tools(&mut self, response: ModelResponse, human: &mut dyn HumanIo) {
        let calls: Vec<(ToolUseId, String, Value)> = response
            .content
            .iter()
            .filter_map(|b| match b {
                Block::ToolUse { id, name, input } => Some((id.clone(), name.clone(), input.clone())),
                _ => None,
            })
            .collect();
        self.history.append(response.into_message());

        let mut results = Vec::with_capacity(calls.len());
        for (id, name, input) in calls {
            if let Some(kind) = ToolKind::from_name(&name) {
                human.notice(kind.label());
            }
            self.recorder
                .record(EventKind::ToolCall, json!({ "name": name, "input": input }));

            let outcome = self.registry.dispatch_block(&name, &input).await;
            if !outcome.success {
                warn!(tool = %name, error = ?outcome.error_code(), "tool reported failure");
                human.warn(&format!("{name}: {}", failure_text(&outcome)));
            }
            let summary = if outcome.success {
                summary_for(&name).map(str::to_string)
            } else {
                Some(failure_text(&outcome).to_string())
            };
            self.recorder.record(
                EventKind::ToolResult,
                json!({
                    "name": name,
                    "success": outcome.success,
                    "summary": summary,
                    "duration_ms": outcome.duration.as_millis() as u64,
                }),
            );
            results.push((id, outcome.to_content()));
        }

        self.history.append(Message::tool_results(results));
        self.maintain_window();
    }

    /// Ask until a non-empty answer arrives. Closed input means exit.
    async fn solicit_feedback(&mut self, human: &mut dyn HumanIo) -> Result<UserIntent, EngineError> {
        loop {
            let Some(answer) = human.ask(FEEDBACK_PROMPT).await? else {
                self.recorder.record(
                    EventKind::UserFeedback,
                    json!({ "raw": null, "intent": UserIntent::Exit.as_str() }),
                );
                return Ok(UserIntent::Exit);
            };
            if answer.is_empty() {
                continue;
            }
            let intent = self.intents.classify(&answer);
            self.recorder.record(
                EventKind::UserFeedback,
                json!({ "raw": answer, "intent": intent.as_str() }),
            );
            return Ok(intent);
        }
    }

    async fn save(
        &mut self,
        draft: &str,
        input: &str,
        human: &mut dyn HumanIo,
    ) -> Result<SaveReport, EngineError> {
        let record = save::build_record(
            draft,
            input,
            &self.context.default_platform,
            &self.context.profile_used,
        );
        let mut warnings = Vec::new();

        human.notice(ToolKind::SaveToFile.label());
        let call = ToolCall::SaveToFile(SaveInput {
            content: record.content.clone(),
            platform: Platform::from_name(&record.platform).unwrap_or_default(),
            topic: record.topic.clone(),
            profile_used: Some(record.profile_used.clone()),
        });
        let saved = self.registry.dispatch(&call).await;
        let file_path = saved.payload["file_path"].as_str().map(str::to_string);
        match &file_path {
            Some(path) => human.notice(&format!("Saved: {path}")),
            None => {
                let text = format!("Could not save the post: {}", failure_text(&saved));
                human.warn(&text);
                warnings.push(text);
            }
        }

        let mut notion_url = None;
        if self.context.notion_configured {
            let answer = human.ask(NOTION_PROMPT).await?;
            if answer.as_deref().is_some_and(is_yes) {
                human.notice(ToolKind::WriteToNotion.label());
                let mirrored = self.registry.write_to_notion_direct(&record).await;
                if mirrored.success {
                    notion_url = mirrored.payload["page_url"].as_str().map(str::to_string);
                    human.notice(&format!("Notion: {}", notion_url.as_deref().unwrap_or("saved")));
                } else {
                    let text = format!("Notion save failed: {}", failure_text(&mirrored));
                    human.warn(&text);
                    warnings.push(text);
                }
            }
        }

        self.recorder.record(
            EventKind::Save,
            json!({
                "file_path": file_path,
                "platform": record.platform,
                "topic": record.topic,
                "notion_url": notion_url,
                "warnings": warnings,
            }),
        );
        info!(platform = %record.platform, saved = file_path.is_some(), "draft accepted");

        Ok(SaveReport {
            record,
            file_path,
            notion_url,
            warnings,
        })
    }
}
