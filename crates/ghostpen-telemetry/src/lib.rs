//! Tracing setup. Logs go to stderr; stdout belongs to the conversation.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Crates whose level follows `crate_level` rather than `log_level`.
const OWN_CRATES: &[&str] = &[
    "ghostpen",
    "ghostpen_core",
    "ghostpen_settings",
    "ghostpen_llm",
    "ghostpen_store",
    "ghostpen_engine",
];

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Level for third-party crates. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Level for the ghostpen crates.
    pub crate_level: Level,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::WARN,
            crate_level: Level::WARN,
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// `--debug`: verbose for our crates, third-party stays quiet.
    pub fn debug() -> Self {
        Self {
            crate_level: Level::DEBUG,
            ..Self::default()
        }
    }

    /// The `EnvFilter` directive string this config stands for.
    pub fn filter_directive(&self) -> String {
        let mut filter = self.log_level.to_string().to_lowercase();
        let crate_level = self.crate_level.to_string().to_lowercase();
        for name in OWN_CRATES {
            filter.push_str(&format!(",{name}={crate_level}"));
        }
        filter
    }
}

/// Initialize tracing. Call once at startup; later calls are no-ops.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init();
}
