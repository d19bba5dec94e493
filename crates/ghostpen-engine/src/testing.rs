//! Shared fixtures for engine tests.

use std::path::Path;

use serde_json::{json, Value};

use ghostpen_store::{FeedbackTracker, PostStore, ProfileStore};

use crate::registry::ToolRegistry;

pub(crate) fn profile_json(name: &str, kind: &str) -> Value {
    json!({
        "profile_name": name,
        "profile_type": kind,
        "source": "test",
        "version": 1,
        "created_at": "2025-01-01T00:00:00.000Z",
        "updated_at": "2025-01-01T00:00:00.000Z",
        "language": "uk",
        "voice": {
            "tone": "direct",
            "formality": "casual",
            "personality": "curious",
            "sentence_style": "short",
            "paragraph_style": "one idea per paragraph",
            "hooks": ["provocative statement"],
            "closings": ["question to the reader"],
            "signature_phrases": ["let's be honest"],
            "avoid": ["corporate jargon"],
            "emoji_usage": "none"
        },
        "platforms": {
            "linkedin": {"max_length": 1300, "structure": "hook-story-lesson", "formatting": "short paragraphs"},
            "x": {"max_length": 280, "structure": "one punch", "formatting": "plain"}
        },
        "examples": [
            {"id": "ex1", "platform": "linkedin", "text": "Ship it.", "why_good": "short"}
        ],
        "changelog": []
    })
}

/// Writes `{root}/profiles/{name}.json` for each `(name, profile_type)`.
pub(crate) async fn write_profiles(root: &Path, profiles: &[(&str, &str)]) {
    let dir = root.join("profiles");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    for (name, kind) in profiles {
        let body = serde_json::to_string_pretty(&profile_json(name, kind)).unwrap();
        tokio::fs::write(dir.join(format!("{name}.json")), body).await.unwrap();
    }
}

/// A registry rooted at `root`, laid out like the default data directory.
pub(crate) fn registry_in(root: &Path) -> ToolRegistry {
    ToolRegistry::new(
        ProfileStore::new(root.join("profiles")),
        PostStore::new(root.join("output/generated")),
        FeedbackTracker::new(root.join("feedback-tracker.json")),
    )
}
