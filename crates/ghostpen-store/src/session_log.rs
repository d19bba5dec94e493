use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use ghostpen_core::ids::SessionId;
use ghostpen_core::tokens::UsageCounters;

use crate::error::StoreError;
use crate::write_new_file;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ApiCall,
    ToolCall,
    ToolResult,
    ServerTool,
    AssistantText,
    UserFeedback,
    Save,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: Value,
}

/// Append-only record of one session, written once at teardown.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionLog {
    pub id: SessionId,
    pub started_at: String,
    pub input: String,
    pub profile_used: String,
    pub events: Vec<LogEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageCounters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl SessionLog {
    pub fn new(id: SessionId, input: impl Into<String>, profile_used: impl Into<String>) -> Self {
        Self {
            id,
            started_at: timestamp(Utc::now()),
            input: input.into(),
            profile_used: profile_used.into(),
            events: Vec::new(),
            usage: None,
            cost_usd: None,
            finished_at: None,
        }
    }

    pub fn push(&mut self, kind: EventKind, data: Value) {
        self.events.push(LogEvent {
            timestamp: timestamp(Utc::now()),
            kind,
            data,
        });
    }

    pub fn finish(&mut self, usage: UsageCounters, cost_usd: f64) {
        self.usage = Some(usage);
        self.cost_usd = Some(cost_usd);
        self.finished_at = Some(timestamp(Utc::now()));
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn events_of(&self, kind: EventKind) -> impl Iterator<Item = &LogEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }
}

/// Writes session logs as `{dir}/{id}.json`, never overwriting.
#[derive(Clone, Debug)]
pub struct SessionLogWriter {
    dir: PathBuf,
}

impl SessionLogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn write(&self, log: &SessionLog) -> Result<PathBuf, StoreError> {
        let json = serde_json::to_vec_pretty(log).map_err(|e| StoreError::json(&self.dir, e))?;
        let path = write_new_file(&self.dir, log.id.as_str(), ".json", &json).await?;
        debug!(path = %path.display(), events = log.events.len(), "session log written");
        Ok(path)
    }
}
