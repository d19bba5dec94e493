//! # ghostpen
//!
//! Binary entry point: parses arguments, loads settings, wires the model
//! provider and the tool registry together and runs one interactive session.

#![deny(unsafe_code)]

mod cli;
mod profiles;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::{debug, info};

use ghostpen_engine::{
    ConsoleIo, EngineConfig, EngineError, Session, SessionOutcome, SetupError, ToolRegistry,
};
use ghostpen_llm::AnthropicProvider;
use ghostpen_settings::GhostpenSettings;
use ghostpen_store::{ProfileStore, SessionLogWriter};
use ghostpen_telemetry::{init_telemetry, TelemetryConfig};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = if cli.debug {
        TelemetryConfig::debug()
    } else {
        TelemetryConfig::default()
    };
    init_telemetry(&telemetry);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = ghostpen_settings::load_settings().context("failed to load settings")?;
    debug!(model = %settings.model, data_dir = %settings.paths.data_dir.display(), "settings loaded");

    if let Some(Command::Profile(command)) = &cli.command {
        let store = ProfileStore::new(settings.paths.profiles_dir());
        return profiles::run(&store, command).await;
    }

    let topic = cli.topic_text();
    if topic.is_empty() {
        Cli::command().print_help()?;
        return Ok(());
    }
    let selection = cli.selection().map_err(EngineError::from)?;
    let provider = build_provider(&settings)?;
    let registry = ToolRegistry::from_settings(&settings);
    let logs = SessionLogWriter::new(settings.paths.logs_dir());

    let mut human = ConsoleIo::new();
    let outcome = Session::new(&provider, &registry, logs, EngineConfig::from_settings(&settings))
        .run(&topic, &selection, &mut human)
        .await?;

    match outcome {
        SessionOutcome::Saved(report) => {
            info!(file = ?report.file_path, notion = ?report.notion_url, "session saved")
        }
        SessionOutcome::Abandoned => info!("session abandoned"),
    }
    Ok(())
}

fn build_provider(settings: &GhostpenSettings) -> Result<AnthropicProvider, EngineError> {
    let api_key = settings
        .api_key
        .clone()
        .ok_or(SetupError::MissingApiKey)?;
    let web_search = settings
        .web_search
        .enabled
        .then_some(settings.web_search.max_uses);
    let provider = AnthropicProvider::new(api_key, settings.model.clone())?
        .with_timeout(Duration::from_secs(settings.request_timeout_secs))?
        .with_max_tokens(settings.max_tokens)
        .with_web_search(web_search);
    Ok(provider)
}

/// Print the error, with a category hint when the failure is one the user
/// can act on.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<EngineError>() {
        Some(engine) => {
            eprintln!("Error: {engine}");
            let category = engine.category();
            if category != ghostpen_core::errors::ErrorCategory::Generic {
                eprintln!("{}", category.hint());
            }
        }
        None => eprintln!("Error: {err:#}"),
    }
}
