use std::fmt;

use ghostpen_core::errors::{ErrorCategory, GatewayError};
use ghostpen_store::{ProfileError, StoreError};

/// Which half of a mix-mode pair failed to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileSide {
    Base,
    Reference,
}

impl fmt::Display for ProfileSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("base"),
            Self::Reference => f.write_str("reference"),
        }
    }
}

/// Failures that abort a session before the first model call.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("{}", describe_profile_failure(.side, .source))]
    Profile {
        side: Option<ProfileSide>,
        #[source]
        source: ProfileError,
    },

    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,

    #[error("{0}")]
    InvalidArguments(String),
}

fn describe_profile_failure(side: &Option<ProfileSide>, source: &ProfileError) -> String {
    match side {
        Some(side) => format!("could not load {side} profile: {source}"),
        None => format!("could not load style profile: {source}"),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("model call failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("input error: {0}")]
    Input(#[from] std::io::Error),
}

impl EngineError {
    /// Category used by the binary to pick a human-readable message.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Gateway(e) => e.category(),
            Self::Setup(SetupError::MissingApiKey) => ErrorCategory::Auth,
            _ => ErrorCategory::Generic,
        }
    }
}
