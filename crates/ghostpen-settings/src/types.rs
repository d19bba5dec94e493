//! Settings type definitions.
//!
//! All types use camelCase JSON names. Every type implements [`Default`]
//! with production values, so a settings file only lists what it changes.
//! Secrets are never read from or written to the file.

use std::path::PathBuf;

use ghostpen_core::security::ApiKey;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "model": "claude-opus-4-6",
///   "maxHistoryPairs": 8,
///   "paths": { "dataDir": "/home/me/ghostpen-data" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GhostpenSettings {
    /// Model identifier sent to the API and used for pricing.
    pub model: String,
    pub max_tokens: u32,
    /// Whole-request timeout for model calls.
    pub request_timeout_secs: u64,
    /// Retained user/assistant turn pairs after trimming (N in `1 + 2N`).
    pub max_history_pairs: usize,
    /// Tool results longer than this (in chars) are compressed once consumed.
    pub compress_threshold: usize,
    /// Feedback that accepts the draft (case-insensitive, exact).
    pub accept_keywords: Vec<String>,
    /// Feedback that abandons the session (case-insensitive, exact).
    pub exit_keywords: Vec<String>,
    pub web_search: WebSearchSettings,
    pub paths: PathSettings,
    pub notion: NotionSettings,
    #[serde(skip)]
    pub api_key: Option<ApiKey>,
}

impl Default for GhostpenSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
            request_timeout_secs: 120,
            max_history_pairs: 6,
            compress_threshold: 200,
            accept_keywords: ["ok", "ок", "save", "зберігай", "готово"]
                .map(String::from)
                .to_vec(),
            exit_keywords: ["exit", "quit", "вихід"].map(String::from).to_vec(),
            web_search: WebSearchSettings::default(),
            paths: PathSettings::default(),
            notion: NotionSettings::default(),
            api_key: None,
        }
    }
}

/// Provider-side web search tool.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebSearchSettings {
    pub enabled: bool,
    pub max_uses: u32,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_uses: 3,
        }
    }
}

/// Filesystem layout. Everything lives under `data_dir`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathSettings {
    pub data_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl PathSettings {
    pub fn profiles_dir(&self) -> PathBuf {
        self.data_dir.join("profiles")
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.data_dir.join("output").join("generated")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("output").join("logs")
    }

    pub fn feedback_tracker(&self) -> PathBuf {
        self.data_dir.join("feedback-tracker.json")
    }
}

/// Optional Notion mirror for saved posts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotionSettings {
    pub database_id: Option<String>,
    pub timeout_secs: u64,
    #[serde(skip)]
    pub token: Option<SecretString>,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            database_id: None,
            timeout_secs: 15,
            token: None,
        }
    }
}

impl NotionSettings {
    /// Both the token and the target database must be present.
    pub fn is_configured(&self) -> bool {
        self.token.is_some() && self.database_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = GhostpenSettings::default();
        assert_eq!(s.model, "claude-sonnet-4-20250514");
        assert_eq!(s.max_history_pairs, 6);
        assert_eq!(s.compress_threshold, 200);
        assert!(s.accept_keywords.contains(&"ok".to_string()));
        assert!(s.exit_keywords.contains(&"exit".to_string()));
        assert!(s.web_search.enabled);
        assert_eq!(s.web_search.max_uses, 3);
        assert_eq!(s.notion.timeout_secs, 15);
    }

    #[test]
    fn camel_case_json() {
        let v = serde_json::to_value(GhostpenSettings::default()).unwrap();
        assert!(v.get("maxHistoryPairs").is_some());
        assert!(v["paths"].get("dataDir").is_some());
        assert!(v["webSearch"].get("maxUses").is_some());
        assert!(v.get("apiKey").is_none());
        assert!(v["notion"].get("token").is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: GhostpenSettings = serde_json::from_str(r#"{"maxHistoryPairs": 3}"#).unwrap();
        assert_eq!(s.max_history_pairs, 3);
        assert_eq!(s.max_tokens, 4096);
    }

    #[test]
    fn derived_paths() {
        let paths = PathSettings {
            data_dir: PathBuf::from("/srv/gp"),
        };
        assert_eq!(paths.profiles_dir(), PathBuf::from("/srv/gp/profiles"));
        assert_eq!(paths.generated_dir(), PathBuf::from("/srv/gp/output/generated"));
        assert_eq!(paths.logs_dir(), PathBuf::from("/srv/gp/output/logs"));
        assert_eq!(
            paths.feedback_tracker(),
            PathBuf::from("/srv/gp/feedback-tracker.json")
        );
    }

    #[test]
    fn notion_needs_token_and_database() {
        let mut notion = NotionSettings::default();
        assert!(!notion.is_configured());
        notion.database_id = Some("db".into());
        assert!(!notion.is_configured());
        notion.token = Some(SecretString::from("secret_x".to_string()));
        assert!(notion.is_configured());
        notion.database_id = Some(String::new());
        assert!(!notion.is_configured());
    }
}
