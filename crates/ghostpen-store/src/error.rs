use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Failures specific to style profiles. Each maps to a stable error code
/// that tool results expose to the model.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("no style profiles found; add default.json to the profiles directory")]
    NoProfiles,

    #[error("profile '{name}' not found (available: {})", format_available(.available))]
    NotFound { name: String, available: Vec<String> },

    #[error("invalid profile name '{0}'")]
    InvalidName(String),

    #[error("profile '{name}' has invalid structure: {reason}")]
    Invalid { name: String, reason: String },

    #[error("profile '{0}' is a reference profile and is read-only")]
    ReadOnly(String),

    #[error("profile '{0}' cannot be deleted")]
    Protected(String),

    #[error("{reason}")]
    Validation { field: Option<String>, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    }
}

impl ProfileError {
    /// Stable machine code for tool results.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoProfiles => "no_profiles",
            Self::NotFound { .. } | Self::InvalidName(_) => "profile_not_found",
            Self::Invalid { .. } => "invalid_profile",
            Self::ReadOnly(_) => "reference_profile",
            Self::Protected(_) => "protected_profile",
            Self::Validation { .. } => "validation_failed",
            Self::Store(_) => "store_error",
        }
    }
}
