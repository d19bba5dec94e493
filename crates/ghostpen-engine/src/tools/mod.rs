//! The closed set of tools the model can call, with typed inputs.

mod descriptors;

use serde::Deserialize;
use serde_json::{Map, Value};

use ghostpen_core::tools::ToolDescriptor;
use ghostpen_store::PostSearch;

/// Every tool the registry knows by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ReadStyleProfile,
    SaveToFile,
    ReadPastPosts,
    TrackFeedback,
    UpdateStyleProfile,
    ReadNotionPage,
    WriteToNotion,
}

impl ToolKind {
    pub const ALL: [ToolKind; 7] = [
        Self::ReadStyleProfile,
        Self::SaveToFile,
        Self::ReadPastPosts,
        Self::TrackFeedback,
        Self::UpdateStyleProfile,
        Self::ReadNotionPage,
        Self::WriteToNotion,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ReadStyleProfile => "read_style_profile",
            Self::SaveToFile => "save_to_file",
            Self::ReadPastPosts => "read_past_posts",
            Self::TrackFeedback => "track_feedback",
            Self::UpdateStyleProfile => "update_style_profile",
            Self::ReadNotionPage => "read_notion_page",
            Self::WriteToNotion => "write_to_notion",
        }
    }

    /// Replacement payload for a stale, oversized result of this tool.
    pub fn summary(self) -> &'static str {
        match self {
            Self::ReadStyleProfile => r#"{"summary":"style profile loaded"}"#,
            Self::SaveToFile => r#"{"summary":"file saved"}"#,
            Self::ReadPastPosts => r#"{"summary":"past posts checked"}"#,
            Self::TrackFeedback => r#"{"summary":"feedback tracked"}"#,
            Self::UpdateStyleProfile => r#"{"summary":"profile updated"}"#,
            Self::ReadNotionPage => r#"{"summary":"notion page read"}"#,
            Self::WriteToNotion => r#"{"summary":"saved to notion"}"#,
        }
    }

    /// Progress line shown to the human before dispatch.
    pub fn label(self) -> &'static str {
        match self {
            Self::ReadStyleProfile => "Reading style profile...",
            Self::SaveToFile => "Saving file...",
            Self::ReadPastPosts => "Checking past posts...",
            Self::TrackFeedback => "Recording feedback...",
            Self::UpdateStyleProfile => "Updating profile...",
            Self::ReadNotionPage => "Reading Notion page...",
            Self::WriteToNotion => "Saving to Notion...",
        }
    }

    pub fn requires_notion(self) -> bool {
        matches!(self, Self::ReadNotionPage | Self::WriteToNotion)
    }

    pub fn descriptor(self) -> ToolDescriptor {
        descriptors::describe(self)
    }
}

/// Summary for a tool identified only by name. Unknown tools have none.
pub fn summary_for(name: &str) -> Option<&'static str> {
    ToolKind::from_name(name).map(ToolKind::summary)
}

/// Platforms a post can be written for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Linkedin,
    Instagram,
    X,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Self::Linkedin, Self::Instagram, Self::X];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::Instagram => "instagram",
            Self::X => "x",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ReadProfileInput {
    #[serde(default)]
    pub profile_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SaveInput {
    pub content: String,
    pub platform: Platform,
    pub topic: String,
    #[serde(default)]
    pub profile_used: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FeedbackInput {
    pub category: String,
    pub raw_feedback: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UpdateProfileInput {
    #[serde(default)]
    pub profile_name: Option<String>,
    pub changes: Map<String, Value>,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ReadNotionInput {
    pub page_id: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NotionWriteInput {
    pub content: String,
    pub title: String,
    pub platform: Platform,
    pub topic: String,
    #[serde(default)]
    pub profile_used: Option<String>,
}

/// One parsed tool invocation.
#[derive(Clone, Debug)]
pub enum ToolCall {
    ReadStyleProfile(ReadProfileInput),
    SaveToFile(SaveInput),
    ReadPastPosts(PostSearch),
    TrackFeedback(FeedbackInput),
    UpdateStyleProfile(UpdateProfileInput),
    ReadNotionPage(ReadNotionInput),
    WriteToNotion(NotionWriteInput),
    Unknown { name: String },
}

/// Input that did not match the tool's schema.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("invalid input for {tool}: {reason}")]
pub struct InvalidInput {
    pub tool: &'static str,
    pub reason: String,
}

fn typed<T: for<'de> Deserialize<'de>>(kind: ToolKind, input: &Value) -> Result<T, InvalidInput> {
    // A model that sends no arguments at all means "all defaults".
    let input = match input {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(input).map_err(|e| InvalidInput {
        tool: kind.name(),
        reason: e.to_string(),
    })
}

impl ToolCall {
    /// Parse a ToolUse block's name and input.
    pub fn parse(name: &str, input: &Value) -> Result<Self, InvalidInput> {
        let Some(kind) = ToolKind::from_name(name) else {
            return Ok(Self::Unknown {
                name: name.to_string(),
            });
        };
        Ok(match kind {
            ToolKind::ReadStyleProfile => Self::ReadStyleProfile(typed(kind, input)?),
            ToolKind::SaveToFile => Self::SaveToFile(typed(kind, input)?),
            ToolKind::ReadPastPosts => Self::ReadPastPosts(typed(kind, input)?),
            ToolKind::TrackFeedback => Self::TrackFeedback(typed(kind, input)?),
            ToolKind::UpdateStyleProfile => Self::UpdateStyleProfile(typed(kind, input)?),
            ToolKind::ReadNotionPage => Self::ReadNotionPage(typed(kind, input)?),
            ToolKind::WriteToNotion => Self::WriteToNotion(typed(kind, input)?),
        })
    }

    pub fn kind(&self) -> Option<ToolKind> {
        Some(match self {
            Self::ReadStyleProfile(_) => ToolKind::ReadStyleProfile,
            Self::SaveToFile(_) => ToolKind::SaveToFile,
            Self::ReadPastPosts(_) => ToolKind::ReadPastPosts,
            Self::TrackFeedback(_) => ToolKind::TrackFeedback,
            Self::UpdateStyleProfile(_) => ToolKind::UpdateStyleProfile,
            Self::ReadNotionPage(_) => ToolKind::ReadNotionPage,
            Self::WriteToNotion(_) => ToolKind::WriteToNotion,
            Self::Unknown { .. } => return None,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Unknown { name } => name,
            known => known.kind().map(ToolKind::name).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.descriptor().name, kind.name());
        }
        assert_eq!(ToolKind::from_name("web_search"), None);
    }

    #[test]
    fn summaries_are_short_json() {
        for kind in ToolKind::ALL {
            let summary = kind.summary();
            assert!(summary.len() < 200);
            assert!(serde_json::from_str::<Value>(summary).is_ok());
        }
        assert_eq!(summary_for("delete_everything"), None);
    }

    #[test]
    fn parse_typed_inputs() {
        let call = ToolCall::parse("read_past_posts", &json!({"keywords": ["ai"], "limit": 2})).unwrap();
        match call {
            ToolCall::ReadPastPosts(search) => {
                assert_eq!(search.keywords, vec!["ai"]);
                assert_eq!(search.limit, Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }

        let call = ToolCall::parse("read_style_profile", &Value::Null).unwrap();
        assert!(matches!(
            call,
            ToolCall::ReadStyleProfile(ReadProfileInput { profile_name: None })
        ));
    }

    #[test]
    fn unknown_names_become_unknown_variant() {
        let call = ToolCall::parse("launch_rockets", &json!({})).unwrap();
        assert_eq!(call.name(), "launch_rockets");
        assert_eq!(call.kind(), None);
    }

    #[test]
    fn mismatched_input_is_invalid() {
        let err = ToolCall::parse("save_to_file", &json!({"content": 3})).unwrap_err();
        assert_eq!(err.tool, "save_to_file");
        let err = ToolCall::parse("update_style_profile", &json!({"changes": {}})).unwrap_err();
        assert!(err.reason.contains("reason"));
    }

    #[test]
    fn platform_outside_the_set_is_invalid() {
        let call = ToolCall::parse(
            "save_to_file",
            &json!({"content": "c", "platform": "instagram", "topic": "t"}),
        )
        .unwrap();
        assert!(matches!(
            call,
            ToolCall::SaveToFile(SaveInput { platform: Platform::Instagram, .. })
        ));

        let err = ToolCall::parse(
            "save_to_file",
            &json!({"content": "c", "platform": "myspace", "topic": "t"}),
        )
        .unwrap_err();
        assert_eq!(err.tool, "save_to_file");
        assert!(err.reason.contains("myspace"));

        let err = ToolCall::parse(
            "write_to_notion",
            &json!({"content": "c", "title": "t", "platform": "LinkedIn", "topic": "t"}),
        )
        .unwrap_err();
        assert_eq!(err.tool, "write_to_notion");
    }

    #[test]
    fn platform_names() {
        for platform in Platform::ALL {
            assert_eq!(Platform::from_name(platform.as_str()), Some(platform));
        }
        assert_eq!(Platform::from_name("telegram"), None);
        assert_eq!(Platform::default(), Platform::Linkedin);
    }
}
