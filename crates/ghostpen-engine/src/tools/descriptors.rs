use serde_json::json;

use ghostpen_core::tools::ToolDescriptor;
use ghostpen_store::FeedbackCategory;

use super::{Platform, ToolKind};

pub(super) fn describe(kind: ToolKind) -> ToolDescriptor {
    let (description, input_schema) = match kind {
        ToolKind::ReadStyleProfile => (
            "Read a style profile by name. Returns the full profile JSON.",
            json!({
                "type": "object",
                "properties": {
                    "profile_name": {
                        "type": "string",
                        "description": "Profile name without extension. Default: 'default'"
                    }
                }
            }),
        ),
        ToolKind::SaveToFile => (
            "Save the final version of a post as a Markdown file with metadata. \
             Call only after the user has approved the final version ('ok', 'save').",
            json!({
                "type": "object",
                "properties": {
                    "content": {"type": "string", "description": "Full post text"},
                    "platform": {"type": "string", "enum": Platform::ALL.map(Platform::as_str), "description": "Target platform"},
                    "topic": {"type": "string", "description": "Post topic in 2-3 words, used in the file name"},
                    "profile_used": {
                        "type": "string",
                        "description": "Profile name or 'mix:base+reference'. Default: 'default'"
                    }
                },
                "required": ["content", "platform", "topic"]
            }),
        ),
        ToolKind::ReadPastPosts => (
            "Search previously generated posts by keywords and platform. \
             Use it to avoid repeating topics and to reference earlier content.",
            json!({
                "type": "object",
                "properties": {
                    "keywords": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Keywords to search for (case-insensitive)"
                    },
                    "platform": {"type": "string", "enum": Platform::ALL.map(Platform::as_str), "description": "Optional platform filter"},
                    "limit": {"type": "number", "description": "Maximum results. Default: 5"}
                },
                "required": ["keywords"]
            }),
        ),
        ToolKind::TrackFeedback => (
            "Record user feedback in the tracker under a category. Once a category \
             reaches 3 reports, suggest a style profile update to the user.",
            json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "enum": FeedbackCategory::ALL.map(FeedbackCategory::as_str),
                        "description": "Feedback category"
                    },
                    "raw_feedback": {"type": "string", "description": "The user's original feedback text"}
                },
                "required": ["category", "raw_feedback"]
            }),
        ),
        ToolKind::UpdateStyleProfile => (
            "Apply changes to a personal style profile. Call only after the user \
             explicitly agreed to the change. Reference profiles are read-only.",
            json!({
                "type": "object",
                "properties": {
                    "profile_name": {"type": "string", "description": "Profile to update. Default: 'default'"},
                    "changes": {
                        "type": "object",
                        "description": "Dot-path to new value, e.g. {\"voice.formality\": \"casual\"}"
                    },
                    "reason": {"type": "string", "description": "Why the change is made, recorded in the changelog"}
                },
                "required": ["changes", "reason"]
            }),
        ),
        ToolKind::ReadNotionPage => (
            "Read a Notion page and return its content as Markdown. \
             Accepts a page URL (https://notion.so/...) or a bare page id.",
            json!({
                "type": "object",
                "properties": {
                    "page_id": {"type": "string", "description": "Notion page URL or id"}
                },
                "required": ["page_id"]
            }),
        ),
        ToolKind::WriteToNotion => (
            "Create a draft page in the Notion database with the post text. \
             If Notion is unavailable the post is saved locally instead.",
            json!({
                "type": "object",
                "properties": {
                    "content": {"type": "string", "description": "Full post text"},
                    "title": {"type": "string", "description": "Page title"},
                    "platform": {"type": "string", "enum": Platform::ALL.map(Platform::as_str), "description": "Target platform"},
                    "topic": {"type": "string", "description": "Post topic"},
                    "profile_used": {"type": "string", "description": "Profile name or mix. Default: 'default'"}
                },
                "required": ["content", "title", "platform", "topic"]
            }),
        ),
    };

    ToolDescriptor {
        name: kind.name().to_string(),
        description: description.to_string(),
        input_schema,
    }
}
