use std::path::PathBuf;

use serde_json::Value;
use tracing::debug;

use ghostpen_core::ids::SessionId;
use ghostpen_store::{EventKind, SessionLog, SessionLogWriter, StoreError};

use crate::usage::UsageTracker;

/// Collects session events in memory; the log file is written once, by
/// [`SessionRecorder::flush`].
#[derive(Debug)]
pub struct SessionRecorder {
    log: SessionLog,
    writer: SessionLogWriter,
}

impl SessionRecorder {
    pub fn new(
        writer: SessionLogWriter,
        id: SessionId,
        input: impl Into<String>,
        profile_used: impl Into<String>,
    ) -> Self {
        Self {
            log: SessionLog::new(id, input, profile_used),
            writer,
        }
    }

    pub fn record(&mut self, kind: EventKind, data: Value) {
        debug!(?kind, "session event");
        self.log.push(kind, data);
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Stamp usage and finish time, then write the log file.
    pub async fn flush(mut self, usage: &UsageTracker) -> Result<PathBuf, StoreError> {
        self.log.finish(usage.totals(), usage.cost());
        self.writer.write(&self.log).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostpen_core::tokens::UsageCounters;
    use serde_json::json;

    #[tokio::test]
    async fn flush_writes_usage_and_events() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = SessionRecorder::new(
            SessionLogWriter::new(dir.path()),
            SessionId::from_raw("2025-06-01-143005"),
            "write a post about burnout",
            "default",
        );
        recorder.record(EventKind::UserFeedback, json!({"raw": "ok", "intent": "accept"}));
        assert_eq!(recorder.log().events.len(), 1);

        let mut usage = UsageTracker::new("claude-sonnet-4-20250514");
        usage.record(&UsageCounters {
            input: 10,
            output: 5,
            cache_write: 0,
            cache_read: 0,
        });
        let path = recorder.flush(&usage).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "2025-06-01-143005.json");

        let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["input"], "write a post about burnout");
        assert_eq!(written["events"][0]["type"], "user_feedback");
        assert_eq!(written["usage"]["input"], 10);
        assert!(written["cost_usd"].as_f64().unwrap() > 0.0);
        assert!(written["finished_at"].is_string());
    }
}
