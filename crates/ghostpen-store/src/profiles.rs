use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::error::{ProfileError, StoreError};

/// Top-level fields an update may never touch.
const IMMUTABLE_FIELDS: &[&str] = &["profile_name", "profile_type", "created_at"];

/// Platform used when a profile declares none.
pub const FALLBACK_PLATFORM: &str = "linkedin";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    /// The author's own voice. Editable through feedback.
    Personal,
    /// Someone else's style, used for techniques only. Read-only.
    Reference,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Voice {
    pub tone: String,
    pub formality: String,
    pub personality: String,
    pub sentence_style: String,
    pub paragraph_style: String,
    pub hooks: Vec<String>,
    pub closings: Vec<String>,
    pub signature_phrases: Vec<String>,
    pub avoid: Vec<String>,
    pub emoji_usage: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A style profile as stored in `{profiles}/{name}.json`.
///
/// `platforms` keeps file order: the first entry is the default platform.
/// Fields this type does not model are carried in `extra` and written back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StyleProfile {
    pub profile_name: String,
    pub profile_type: ProfileType,
    #[serde(default)]
    pub source: String,
    pub version: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    pub language: String,
    pub voice: Voice,
    pub platforms: Map<String, Value>,
    pub examples: Vec<Value>,
    #[serde(default)]
    pub changelog: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StyleProfile {
    /// Deserialize and validate. `name` is only used for error messages.
    pub fn from_value(name: &str, value: Value) -> Result<Self, ProfileError> {
        let profile: Self = serde_json::from_value(value).map_err(|e| ProfileError::Invalid {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        profile.validate().map_err(|reason| ProfileError::Invalid {
            name: name.to_string(),
            reason,
        })?;
        Ok(profile)
    }

    /// Structural checks beyond what the type already enforces.
    pub fn validate(&self) -> Result<(), String> {
        if self.version < 1 {
            return Err("version must be at least 1".into());
        }
        if self.voice.hooks.is_empty() {
            return Err("voice.hooks must not be empty".into());
        }
        if self.voice.avoid.is_empty() {
            return Err("voice.avoid must not be empty".into());
        }
        if self.platforms.is_empty() {
            return Err("platforms must not be empty".into());
        }
        if self.examples.is_empty() {
            return Err("examples must not be empty".into());
        }
        Ok(())
    }

    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms.keys().map(String::as_str).collect()
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// First declared platform, or `linkedin` when there is none.
pub fn default_platform(profile: &StyleProfile) -> String {
    profile
        .platforms
        .keys()
        .next()
        .cloned()
        .unwrap_or_else(|| FALLBACK_PLATFORM.to_string())
}

/// One row of `ghostpen profile list`. Unreadable files show `?`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    pub profile_type: String,
    pub tone: String,
    pub updated: String,
}

/// Outcome of a successful profile update.
#[derive(Clone, Debug, Serialize)]
pub struct ProfileUpdate {
    pub version: u64,
    pub changes_applied: Vec<String>,
    pub changelog_entry: Value,
}

/// Directory of `{name}.json` style profiles.
#[derive(Clone, Debug)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ProfileError> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\'])
            && !name.contains("..");
        if !valid {
            return Err(ProfileError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Names of all `*.json` files, sorted. A missing directory is empty.
    pub async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_str().and_then(|f| f.strip_suffix(".json")) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn not_found(&self, name: &str) -> ProfileError {
        let available = self.list_names().await.unwrap_or_default();
        if name == "default" && available.is_empty() {
            ProfileError::NoProfiles
        } else {
            ProfileError::NotFound {
                name: name.to_string(),
                available,
            }
        }
    }

    async fn read_raw(&self, name: &str) -> Result<(PathBuf, Value), ProfileError> {
        let path = self.path_for(name)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(self.not_found(name).await)
            }
            Err(e) => return Err(StoreError::io(&path, e).into()),
        };
        let value = serde_json::from_str(&raw).map_err(|e| ProfileError::Invalid {
            name: name.to_string(),
            reason: format!("invalid JSON: {e}"),
        })?;
        Ok((path, value))
    }

    /// Load and validate a profile.
    #[instrument(skip(self))]
    pub async fn load(&self, name: &str) -> Result<StyleProfile, ProfileError> {
        let (_, value) = self.read_raw(name).await?;
        let profile = StyleProfile::from_value(name, value)?;
        debug!(version = profile.version, "profile loaded");
        Ok(profile)
    }

    pub async fn summaries(&self) -> Result<Vec<ProfileSummary>, StoreError> {
        let mut rows = Vec::new();
        for name in self.list_names().await? {
            let path = self.dir.join(format!("{name}.json"));
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .ok()
                .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());
            let row = match parsed {
                Some(v) => ProfileSummary {
                    name: v["profile_name"].as_str().unwrap_or(&name).to_string(),
                    profile_type: v["profile_type"].as_str().unwrap_or("?").to_string(),
                    tone: v["voice"]["tone"].as_str().unwrap_or("-").to_string(),
                    updated: v["updated_at"]
                        .as_str()
                        .map(|s| s.chars().take(10).collect())
                        .unwrap_or_else(|| "-".to_string()),
                },
                None => ProfileSummary {
                    name: name.clone(),
                    profile_type: "?".into(),
                    tone: "?".into(),
                    updated: "?".into(),
                },
            };
            rows.push(row);
        }
        Ok(rows)
    }

    /// Delete a profile. `default` is protected.
    pub async fn delete(&self, name: &str) -> Result<(), ProfileError> {
        if name == "default" {
            return Err(ProfileError::Protected(name.to_string()));
        }
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(self.not_found(name).await),
            Err(e) => Err(StoreError::io(&path, e).into()),
        }
    }

    /// Apply dot-path changes to a personal profile, bump its version and
    /// append a changelog entry. Nothing is written unless the result is valid.
    #[instrument(skip(self, changes), fields(fields = changes.len()))]
    pub async fn update(
        &self,
        name: &str,
        changes: &Map<String, Value>,
        reason: &str,
    ) -> Result<ProfileUpdate, ProfileError> {
        let (path, mut profile) = self.read_raw(name).await?;

        if profile["profile_type"] == "reference" {
            return Err(ProfileError::ReadOnly(name.to_string()));
        }
        if changes.is_empty() {
            return Err(ProfileError::Validation {
                field: None,
                reason: "no changes supplied".into(),
            });
        }

        let mut applied = Vec::with_capacity(changes.len());
        for (dot_path, value) in changes {
            validate_change(dot_path, value).map_err(|reason| ProfileError::Validation {
                field: Some(dot_path.clone()),
                reason,
            })?;
            set_nested(&mut profile, dot_path, value.clone());
            applied.push(dot_path.clone());
        }

        let version = profile["version"].as_u64().unwrap_or(0) + 1;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let entry = json!({
            "version": version,
            "date": now,
            "action": "updated",
            "description": reason,
            "fields_changed": applied,
        });
        profile["version"] = json!(version);
        profile["updated_at"] = json!(now);
        match profile.get_mut("changelog").and_then(Value::as_array_mut) {
            Some(log) => log.push(entry.clone()),
            None => profile["changelog"] = json!([entry.clone()]),
        }

        StyleProfile::from_value(name, profile.clone()).map_err(|e| ProfileError::Validation {
            field: None,
            reason: format!("profile validation failed after applying changes, nothing saved: {e}"),
        })?;

        let pretty = serde_json::to_string_pretty(&profile).map_err(|e| StoreError::json(&path, e))?;
        tokio::fs::write(&path, pretty)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        debug!(version, "profile updated");
        Ok(ProfileUpdate {
            version,
            changes_applied: applied,
            changelog_entry: entry,
        })
    }
}

fn validate_change(dot_path: &str, value: &Value) -> Result<(), String> {
    let top = dot_path.split('.').next().unwrap_or(dot_path);
    if IMMUTABLE_FIELDS.contains(&top) {
        return Err(format!("Field '{top}' is immutable and cannot be changed"));
    }

    if dot_path == "voice.hooks" || dot_path == "voice.avoid" {
        let items = value
            .as_array()
            .filter(|items| items.iter().all(Value::is_string))
            .ok_or_else(|| format!("'{dot_path}' must be an array of strings"))?;
        if items.is_empty() {
            return Err(format!("'{dot_path}' cannot be empty"));
        }
    }

    let is_max_length = dot_path
        .strip_prefix("platforms.")
        .and_then(|rest| rest.strip_suffix(".max_length"))
        .is_some_and(|platform| !platform.is_empty());
    if is_max_length && !value.as_f64().is_some_and(|n| n > 0.0) {
        return Err(format!("'{dot_path}' must be a positive number"));
    }

    Ok(())
}

/// Set `value` at a dot-separated path, creating intermediate objects.
fn set_nested(root: &mut Value, dot_path: &str, value: Value) {
    let mut keys: Vec<&str> = dot_path.split('.').collect();
    let last = keys.pop().unwrap_or(dot_path);

    let mut current = root;
    for key in keys {
        current = ensure_object(current)
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(current).insert(last.to_string(), value);
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}
