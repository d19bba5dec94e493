use chrono::Local;
use serde_json::json;
use tracing::{debug, instrument, warn};

use ghostpen_core::ids::SessionId;
use ghostpen_core::provider::LlmProvider;
use ghostpen_store::{EventKind, SessionLogWriter};

use crate::context::{assemble, ProfileSelection};
use crate::error::EngineError;
use crate::human::HumanIo;
use crate::recorder::SessionRecorder;
use crate::registry::ToolRegistry;
use crate::runner::{EngineConfig, SessionOutcome, TurnEngine};

/// One interactive session: assemble, run the engine, tear down.
pub struct Session<'a> {
    provider: &'a dyn LlmProvider,
    registry: &'a ToolRegistry,
    logs: SessionLogWriter,
    config: EngineConfig,
}

impl<'a> Session<'a> {
    pub fn new(
        provider: &'a dyn LlmProvider,
        registry: &'a ToolRegistry,
        logs: SessionLogWriter,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            logs,
            config,
        }
    }

    /// Setup errors return before anything is recorded. Once the engine
    /// starts, the usage summary and session log are produced however the
    /// run ends.
    #[instrument(skip(self, input, human), fields(profile = %selection.profile_used()))]
    pub async fn run(
        self,
        input: &str,
        selection: &ProfileSelection,
        human: &mut dyn HumanIo,
    ) -> Result<SessionOutcome, EngineError> {
        let context = assemble(
            self.registry.profiles(),
            selection,
            self.registry.notion_configured(),
        )
        .await?;
        human.notice(&format!("Profile: {}", context.profile_used));

        let recorder = SessionRecorder::new(
            self.logs,
            SessionId::at(Local::now()),
            input,
            context.profile_used.clone(),
        );
        let mut engine = TurnEngine::new(self.provider, self.registry, &context, self.config, recorder);
        let result = engine.run(input, human).await;
        let (usage, mut recorder) = engine.into_parts();

        if let Err(e) = &result {
            recorder.record(
                EventKind::Error,
                json!({ "message": e.to_string(), "category": e.category().to_string() }),
            );
        }

        human.notice(&usage.summary());
        match recorder.flush(&usage).await {
            Ok(path) => debug!(path = %path.display(), "session log saved"),
            Err(e) => {
                warn!(error = %e, "failed to write session log");
                human.warn(&format!("Session log not saved: {e}"));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostpen_core::errors::GatewayError;
    use ghostpen_llm::mock::{MockProvider, MockResponse};
    use serde_json::Value;

    use crate::error::{ProfileSide, SetupError};
    use crate::human::ScriptedHuman;
    use crate::testing::{registry_in, write_profiles};

    fn logs(root: &std::path::Path) -> SessionLogWriter {
        SessionLogWriter::new(root.join("output/logs"))
    }

    fn written_logs(root: &std::path::Path) -> Vec<Value> {
        let Ok(entries) = std::fs::read_dir(root.join("output/logs")) else {
            return Vec::new();
        };
        entries
            .map(|e| {
                let raw = std::fs::read_to_string(e.unwrap().path()).unwrap();
                serde_json::from_str(&raw).unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn missing_profile_aborts_before_any_model_call() {
        let dir = tempfile::tempdir().unwrap();
        write_profiles(dir.path(), &[("me", "personal")]).await;
        let registry = registry_in(dir.path());
        let provider = MockProvider::new(vec![MockResponse::text("never")]);
        let mut human = ScriptedHuman::new(["ok"]);

        let selection = ProfileSelection::mix("me ghost").unwrap();
        let err = Session::new(&provider, &registry, logs(dir.path()), EngineConfig::default())
            .run("topic", &selection, &mut human)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Setup(SetupError::Profile {
                side: Some(ProfileSide::Reference),
                ..
            })
        ));
        assert_eq!(provider.call_count(), 0);
        assert!(written_logs(dir.path()).is_empty());
        assert!(human.prompts.is_empty());
    }

    #[tokio::test]
    async fn completed_session_writes_log_with_usage() {
        let dir = tempfile::tempdir().unwrap();
        write_profiles(dir.path(), &[("default", "personal")]).await;
        let registry = registry_in(dir.path());
        let provider = MockProvider::new(vec![MockResponse::text("Draft")]);
        let mut human = ScriptedHuman::new(["ok"]);

        let outcome = Session::new(&provider, &registry, logs(dir.path()), EngineConfig::default())
            .run("write a post about focus", &ProfileSelection::default(), &mut human)
            .await
            .unwrap();
        assert!(matches!(outcome, SessionOutcome::Saved(_)));

        let written = written_logs(dir.path());
        assert_eq!(written.len(), 1);
        let log = &written[0];
        assert_eq!(log["input"], "write a post about focus");
        assert_eq!(log["profile_used"], "default");
        assert_eq!(log["usage"]["input"], 100);
        assert!(log["finished_at"].is_string());
        let kinds: Vec<&str> = log["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["type"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["api_call", "assistant_text", "user_feedback", "save"]);
        assert!(human.notices.iter().any(|n| n.starts_with("Tokens:")));
    }

    #[tokio::test]
    async fn transport_failure_still_flushes_log() {
        let dir = tempfile::tempdir().unwrap();
        write_profiles(dir.path(), &[("default", "personal")]).await;
        let registry = registry_in(dir.path());
        let provider = MockProvider::new(vec![MockResponse::Error(GatewayError::AuthenticationFailed(
            "bad key".into(),
        ))]);
        let mut human = ScriptedHuman::default();

        let err = Session::new(&provider, &registry, logs(dir.path()), EngineConfig::default())
            .run("topic", &ProfileSelection::default(), &mut human)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Gateway(_)));

        let written = written_logs(dir.path());
        assert_eq!(written.len(), 1);
        let events = written[0]["events"].as_array().unwrap();
        assert_eq!(events.last().unwrap()["type"], "error");
        assert_eq!(events.last().unwrap()["data"]["category"], "auth");
    }

    #[tokio::test]
    async fn mix_mode_profile_used_reaches_the_save() {
        let dir = tempfile::tempdir().unwrap();
        write_profiles(dir.path(), &[("me", "personal"), ("alex", "reference")]).await;
        let registry = registry_in(dir.path());
        let provider = MockProvider::new(vec![MockResponse::text("Draft")]);
        let mut human = ScriptedHuman::new(["save"]);

        let outcome = Session::new(&provider, &registry, logs(dir.path()), EngineConfig::default())
            .run("topic", &ProfileSelection::mix("me alex").unwrap(), &mut human)
            .await
            .unwrap();
        let SessionOutcome::Saved(report) = outcome else {
            panic!("expected a save");
        };
        assert_eq!(report.record.profile_used, "mix:me+alex");
        let body = std::fs::read_to_string(report.file_path.unwrap()).unwrap();
        assert!(body.contains("profile_used: mix:me+alex"));

        let system = &provider.requests()[0].system;
        assert_eq!(system.segments().len(), 5);
    }
}
