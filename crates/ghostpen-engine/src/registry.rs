use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use ghostpen_core::tools::{ToolDescriptor, ToolOutcome};
use ghostpen_settings::{GhostpenSettings, NotionSettings};
use ghostpen_store::{
    FeedbackCategory, FeedbackTracker, PostRecord, PostSearch, PostStore, ProfileError,
    ProfileStore,
};

use crate::notion::{extract_page_id, NotionClient, NotionTarget};
use crate::save;
use crate::tools::{
    FeedbackInput, NotionWriteInput, ReadNotionInput, ReadProfileInput, SaveInput, ToolCall,
    ToolKind, UpdateProfileInput,
};

const DEFAULT_PROFILE: &str = "default";

/// Dispatches the closed set of tools against the file stores and, when
/// configured, Notion.
pub struct ToolRegistry {
    profiles: ProfileStore,
    posts: PostStore,
    feedback: FeedbackTracker,
    notion: Option<NotionTarget>,
    descriptors: Vec<ToolDescriptor>,
}

fn descriptors_for(notion_configured: bool) -> Vec<ToolDescriptor> {
    ToolKind::ALL
        .into_iter()
        .filter(|kind| notion_configured || !kind.requires_notion())
        .map(ToolKind::descriptor)
        .collect()
}

fn notion_target(settings: &NotionSettings) -> Option<NotionTarget> {
    if !settings.is_configured() {
        return None;
    }
    let token = settings.token.clone()?;
    let database_id = settings.database_id.clone()?;
    match NotionClient::new(token, Duration::from_secs(settings.timeout_secs)) {
        Ok(client) => Some(NotionTarget {
            client,
            database_id,
        }),
        Err(e) => {
            warn!(error = %e, "Notion client unavailable, continuing without it");
            None
        }
    }
}

fn serialized(value: &impl Serialize, error_code: &str) -> ToolOutcome {
    match serde_json::to_value(value) {
        Ok(fields) => ToolOutcome::ok(fields),
        Err(e) => ToolOutcome::failure(error_code, e.to_string()),
    }
}

fn profile_failure(err: &ProfileError) -> ToolOutcome {
    match err {
        ProfileError::NotFound { available, .. } => ToolOutcome::failure_with(
            err.code(),
            err.to_string(),
            json!({"available_profiles": available}),
        ),
        other => ToolOutcome::failure(other.code(), other.to_string()),
    }
}

fn unknown_tool(name: &str) -> ToolOutcome {
    ToolOutcome::failure("unknown_tool", format!("Tool '{name}' not found"))
}

impl ToolRegistry {
    pub fn new(profiles: ProfileStore, posts: PostStore, feedback: FeedbackTracker) -> Self {
        Self {
            profiles,
            posts,
            feedback,
            notion: None,
            descriptors: descriptors_for(false),
        }
    }

    pub fn with_notion(mut self, target: NotionTarget) -> Self {
        self.notion = Some(target);
        self.descriptors = descriptors_for(true);
        self
    }

    /// Stores under the configured data directory. Notion is attached only
    /// when both its token and database id are set.
    pub fn from_settings(settings: &GhostpenSettings) -> Self {
        let paths = &settings.paths;
        let registry = Self::new(
            ProfileStore::new(paths.profiles_dir()),
            PostStore::new(paths.generated_dir()),
            FeedbackTracker::new(paths.feedback_tracker()),
        );
        match notion_target(&settings.notion) {
            Some(target) => registry.with_notion(target),
            None => registry,
        }
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn notion_configured(&self) -> bool {
        self.notion.is_some()
    }

    /// Tool definitions offered to the model.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Parse and dispatch one ToolUse block. Never fails: every problem is
    /// reported as a failed outcome the model can read.
    pub async fn dispatch_block(&self, name: &str, input: &Value) -> ToolOutcome {
        match ToolCall::parse(name, input) {
            Ok(call) => self.dispatch(&call).await,
            Err(e) => ToolOutcome::failure("invalid_input", e.to_string()),
        }
    }

    #[instrument(skip_all, fields(tool = %call.name()))]
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutcome {
        let start = Instant::now();
        let outcome = match call {
            ToolCall::ReadStyleProfile(input) => self.read_style_profile(input).await,
            ToolCall::SaveToFile(input) => self.save_to_file(input).await,
            ToolCall::ReadPastPosts(search) => self.read_past_posts(search).await,
            ToolCall::TrackFeedback(input) => self.track_feedback(input).await,
            ToolCall::UpdateStyleProfile(input) => self.update_style_profile(input).await,
            ToolCall::ReadNotionPage(input) => match &self.notion {
                Some(target) => Self::read_notion_page(target, input).await,
                None => unknown_tool(call.name()),
            },
            ToolCall::WriteToNotion(input) => match &self.notion {
                Some(target) => self.write_to_notion(target, input).await,
                None => unknown_tool(call.name()),
            },
            ToolCall::Unknown { name } => unknown_tool(name),
        };
        let outcome = outcome.with_duration(start.elapsed());
        debug!(
            success = outcome.success,
            duration_ms = outcome.duration.as_millis() as u64,
            "tool dispatched"
        );
        outcome
    }

    /// Mirror an already saved post to Notion. Unlike the model-facing
    /// tool there is no local fallback; the caller already saved locally.
    pub async fn write_to_notion_direct(&self, record: &PostRecord) -> ToolOutcome {
        let start = Instant::now();
        let outcome = match &self.notion {
            Some(target) => match target.client.create_page(&target.database_id, record).await {
                Ok(page_url) => ToolOutcome::ok(json!({"page_url": page_url})),
                Err(e) => ToolOutcome::failure("notion_write_error", e.to_string()),
            },
            None => unknown_tool(ToolKind::WriteToNotion.name()),
        };
        outcome.with_duration(start.elapsed())
    }

    async fn read_style_profile(&self, input: &ReadProfileInput) -> ToolOutcome {
        let name = input.profile_name.as_deref().unwrap_or(DEFAULT_PROFILE);
        match self.profiles.load(name).await {
            Ok(profile) => match serde_json::to_value(&profile) {
                Ok(profile) => ToolOutcome::ok(json!({"profile": profile})),
                Err(e) => ToolOutcome::failure("invalid_profile", e.to_string()),
            },
            Err(e) => profile_failure(&e),
        }
    }

    async fn save_to_file(&self, input: &SaveInput) -> ToolOutcome {
        let record = PostRecord {
            title: save::title(&input.content),
            content: input.content.clone(),
            platform: input.platform.as_str().to_string(),
            topic: input.topic.clone(),
            profile_used: input
                .profile_used
                .clone()
                .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
        };
        match self.posts.save(&record).await {
            Ok(path) => ToolOutcome::ok(json!({"file_path": path.display().to_string()})),
            Err(e) => ToolOutcome::failure("save_failed", e.to_string()),
        }
    }

    async fn read_past_posts(&self, search: &PostSearch) -> ToolOutcome {
        match self.posts.search(search).await {
            Ok(result) => serialized(&result, "search_failed"),
            Err(e) => ToolOutcome::failure("search_failed", e.to_string()),
        }
    }

    async fn track_feedback(&self, input: &FeedbackInput) -> ToolOutcome {
        let category: FeedbackCategory = match input.category.parse() {
            Ok(category) => category,
            Err(message) => return ToolOutcome::failure("invalid_category", message),
        };
        match self.feedback.record(category, &input.raw_feedback).await {
            Ok(record) => serialized(&record, "tracker_error"),
            Err(e) => ToolOutcome::failure("tracker_error", e.to_string()),
        }
    }

    async fn update_style_profile(&self, input: &UpdateProfileInput) -> ToolOutcome {
        let name = input.profile_name.as_deref().unwrap_or(DEFAULT_PROFILE);
        match self.profiles.update(name, &input.changes, &input.reason).await {
            Ok(update) => serialized(&update, "validation_failed"),
            Err(ProfileError::Invalid { reason, .. }) => {
                ToolOutcome::failure("invalid_json", reason)
            }
            Err(ProfileError::Validation { field, reason }) => ToolOutcome::failure_with(
                "validation_failed",
                reason,
                json!({"field": field}),
            ),
            Err(e) => profile_failure(&e),
        }
    }

    async fn read_notion_page(target: &NotionTarget, input: &ReadNotionInput) -> ToolOutcome {
        let Some(page_id) = extract_page_id(&input.page_id) else {
            return ToolOutcome::failure(
                "invalid_page_id",
                format!("Could not extract a Notion page id from '{}'", input.page_id),
            );
        };
        match target.client.read_page(&page_id).await {
            Ok(page) => ToolOutcome::ok(json!({
                "page_id": page.id,
                "title": page.title,
                "content": page.markdown,
                "blocks_count": page.blocks_count,
            })),
            Err(e) => ToolOutcome::failure("notion_read_error", e.to_string()),
        }
    }

    async fn write_to_notion(&self, target: &NotionTarget, input: &NotionWriteInput) -> ToolOutcome {
        let record = PostRecord {
            content: input.content.clone(),
            platform: input.platform.as_str().to_string(),
            topic: input.topic.clone(),
            title: input.title.clone(),
            profile_used: input
                .profile_used
                .clone()
                .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
        };
        let err = match target.client.create_page(&target.database_id, &record).await {
            Ok(page_url) => return ToolOutcome::ok(json!({"page_url": page_url})),
            Err(e) => e,
        };

        warn!(error = %err, "Notion write failed, saving locally");
        match self.posts.save(&record).await {
            Ok(path) => ToolOutcome::failure_with(
                "notion_write_error",
                format!("{err}. The post was saved locally instead."),
                json!({"fallback_file": path.display().to_string()}),
            ),
            Err(local) => ToolOutcome::failure(
                "notion_write_error",
                format!("{err}. Local fallback also failed: {local}"),
            ),
        }
    }
}
