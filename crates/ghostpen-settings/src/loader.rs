//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use ghostpen_core::security::ApiKey;
use secrecy::SecretString;
use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::GhostpenSettings;

/// Resolve the settings file: `GHOSTPEN_SETTINGS` if set, else `./ghostpen.json`.
pub fn settings_path() -> PathBuf {
    read_env_string("GHOSTPEN_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ghostpen.json"))
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<GhostpenSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<GhostpenSettings> {
    let mut settings = load_file_layer(path)?;
    apply_overrides(&mut settings, |name| std::env::var(name).ok());
    validate(&settings)?;
    Ok(settings)
}

/// Defaults deep-merged with the settings file, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<GhostpenSettings> {
    let defaults = serde_json::to_value(GhostpenSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides from an environment lookup.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_overrides(settings: &mut GhostpenSettings, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = get("GHOSTPEN_MODEL") {
        settings.model = v;
    }
    if let Some(v) = get("GHOSTPEN_MAX_TOKENS") {
        if let Some(n) = warn_invalid("GHOSTPEN_MAX_TOKENS", &v, parse_u64_range(&v, 1, 64_000)) {
            settings.max_tokens = n as u32;
        }
    }
    if let Some(v) = get("GHOSTPEN_REQUEST_TIMEOUT") {
        if let Some(n) = warn_invalid("GHOSTPEN_REQUEST_TIMEOUT", &v, parse_u64_range(&v, 1, 3600)) {
            settings.request_timeout_secs = n;
        }
    }
    if let Some(v) = get("GHOSTPEN_MAX_HISTORY_PAIRS") {
        if let Some(n) = warn_invalid(
            "GHOSTPEN_MAX_HISTORY_PAIRS",
            &v,
            parse_usize_range(&v, 1, 100),
        ) {
            settings.max_history_pairs = n;
        }
    }
    if let Some(v) = get("GHOSTPEN_WEB_SEARCH") {
        if let Some(b) = warn_invalid("GHOSTPEN_WEB_SEARCH", &v, parse_bool(&v)) {
            settings.web_search.enabled = b;
        }
    }
    if let Some(v) = get("GHOSTPEN_DATA_DIR") {
        settings.paths.data_dir = PathBuf::from(v);
    }

    // ── Secrets ─────────────────────────────────────────────────────
    if let Some(v) = get("ANTHROPIC_API_KEY") {
        settings.api_key = Some(ApiKey::new(v));
    }
    if let Some(v) = get("NOTION_TOKEN") {
        settings.notion.token = Some(SecretString::from(v));
    }
    if let Some(v) = get("NOTION_DATABASE_ID") {
        settings.notion.database_id = Some(v);
    }
}

/// Reject combinations no session could run with.
pub fn validate(settings: &GhostpenSettings) -> Result<()> {
    if settings.max_history_pairs == 0 {
        return Err(SettingsError::InvalidValue(
            "maxHistoryPairs must be at least 1".into(),
        ));
    }
    if settings.accept_keywords.is_empty() || settings.exit_keywords.is_empty() {
        return Err(SettingsError::InvalidValue(
            "acceptKeywords and exitKeywords must not be empty".into(),
        ));
    }
    let clash = settings.accept_keywords.iter().find(|accept| {
        settings
            .exit_keywords
            .iter()
            .any(|exit| exit.to_lowercase() == accept.to_lowercase())
    });
    if let Some(word) = clash {
        return Err(SettingsError::InvalidValue(format!(
            "keyword '{word}' is both an accept and an exit keyword"
        )));
    }
    Ok(())
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn warn_invalid<T>(key: &str, value: &str, parsed: Option<T>) -> Option<T> {
    if parsed.is_none() {
        tracing::warn!(key, value, "invalid env var, ignoring");
    }
    parsed
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
