use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Occurrences of one category before a profile update is suggested.
pub const SUGGESTION_THRESHOLD: u32 = 3;
const MAX_HISTORY: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    TooFormal,
    TooCasual,
    TooLong,
    TooShort,
    HookWeak,
    HookStrong,
    ToneOff,
    StructureWrong,
    VocabularyWrong,
    CtaMissing,
    CtaTooPushy,
    Other,
}

impl FeedbackCategory {
    pub const ALL: [FeedbackCategory; 12] = [
        Self::TooFormal,
        Self::TooCasual,
        Self::TooLong,
        Self::TooShort,
        Self::HookWeak,
        Self::HookStrong,
        Self::ToneOff,
        Self::StructureWrong,
        Self::VocabularyWrong,
        Self::CtaMissing,
        Self::CtaTooPushy,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TooFormal => "too_formal",
            Self::TooCasual => "too_casual",
            Self::TooLong => "too_long",
            Self::TooShort => "too_short",
            Self::HookWeak => "hook_weak",
            Self::HookStrong => "hook_strong",
            Self::ToneOff => "tone_off",
            Self::StructureWrong => "structure_wrong",
            Self::VocabularyWrong => "vocabulary_wrong",
            Self::CtaMissing => "cta_missing",
            Self::CtaTooPushy => "cta_too_pushy",
            Self::Other => "other",
        }
    }

    /// Suggested profile change once the threshold is reached.
    pub fn suggestion(self, count: u32) -> String {
        match self {
            Self::TooFormal => format!("The user said {count} times that the text is too formal. Suggest updating voice.formality in the style profile."),
            Self::TooCasual => format!("The user said {count} times that the text is too casual. Suggest updating voice.formality in the style profile."),
            Self::TooLong => format!("The user asked {count} times for shorter text. Suggest lowering platforms.*.max_length in the style profile."),
            Self::TooShort => format!("The user asked {count} times for longer text. Suggest raising platforms.*.max_length in the style profile."),
            Self::HookWeak => format!("The user said {count} times that the hook is weak. Suggest updating voice.hooks in the style profile."),
            Self::HookStrong => format!("The user said {count} times that the hook is too aggressive. Suggest updating voice.hooks in the style profile."),
            Self::ToneOff => format!("The user said {count} times that the tone is off. Suggest updating voice.tone in the style profile."),
            Self::StructureWrong => format!("The user complained {count} times about structure. Suggest updating platforms.*.structure in the style profile."),
            Self::VocabularyWrong => format!("The user complained {count} times about vocabulary. Suggest updating voice.avoid or voice.signature_phrases in the style profile."),
            Self::CtaMissing => format!("The user asked {count} times to add a call to action. Suggest updating voice.closings in the style profile."),
            Self::CtaTooPushy => format!("The user said {count} times that the call to action is too pushy. Suggest updating voice.closings in the style profile."),
            Self::Other => format!("The user gave similar feedback {count} times. Check whether the style profile needs an update."),
        }
    }

    pub fn valid_values() -> String {
        Self::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Invalid category '{s}'. Valid: {}", Self::valid_values()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    pub raw: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub count: u32,
    pub last_seen: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Result of recording one piece of feedback.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedbackRecord {
    pub category: FeedbackCategory,
    pub count: u32,
    pub threshold_reached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Per-category feedback counts persisted as a single JSON file.
#[derive(Clone, Debug)]
pub struct FeedbackTracker {
    path: PathBuf,
}

impl FeedbackTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current counts. A missing or unreadable file starts from zero.
    pub async fn snapshot(&self) -> BTreeMap<FeedbackCategory, CategoryStats> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(_) => return BTreeMap::new(),
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "feedback tracker unreadable, starting fresh");
            BTreeMap::new()
        })
    }

    pub async fn record(
        &self,
        category: FeedbackCategory,
        raw_feedback: &str,
    ) -> Result<FeedbackRecord, StoreError> {
        self.record_at(category, raw_feedback, Utc::now()).await
    }

    pub async fn record_at(
        &self,
        category: FeedbackCategory,
        raw_feedback: &str,
        now: DateTime<Utc>,
    ) -> Result<FeedbackRecord, StoreError> {
        let mut tracker = self.snapshot().await;

        let stats = tracker.entry(category).or_default();
        stats.count += 1;
        stats.last_seen = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        stats.history.push(HistoryEntry {
            date: now.format("%Y-%m-%d").to_string(),
            raw: raw_feedback.to_string(),
        });
        if stats.history.len() > MAX_HISTORY {
            let excess = stats.history.len() - MAX_HISTORY;
            stats.history.drain(..excess);
        }
        let count = stats.count;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&tracker).map_err(|e| StoreError::json(&self.path, e))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        let threshold_reached = count >= SUGGESTION_THRESHOLD;
        debug!(%category, count, threshold_reached, "feedback tracked");
        Ok(FeedbackRecord {
            category,
            count,
            threshold_reached,
            suggestion: threshold_reached.then(|| category.suggestion(count)),
        })
    }
}
