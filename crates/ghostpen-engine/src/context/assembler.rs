use tracing::{debug, instrument};

use ghostpen_core::context::{SegmentLabel, SystemContext, SystemSegment};
use ghostpen_store::{default_platform, ProfileError, ProfileStore, StyleProfile};

use super::{GHOSTWRITER_PROMPT, MIX_DIRECTIVE};
use crate::error::{ProfileSide, SetupError};

/// Which profile(s) drive the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileSelection {
    Single(String),
    Mix { base: String, reference: String },
}

impl ProfileSelection {
    /// Parse a `--mix` argument: exactly two whitespace-separated names.
    pub fn mix(arg: &str) -> Result<Self, SetupError> {
        match arg.split_whitespace().collect::<Vec<_>>().as_slice() {
            [base, reference] => Ok(Self::Mix {
                base: (*base).to_string(),
                reference: (*reference).to_string(),
            }),
            _ => Err(SetupError::InvalidArguments(format!(
                "--mix expects exactly two profile names, got '{arg}'"
            ))),
        }
    }

    /// The string downstream tools echo back as `profile_used`.
    pub fn profile_used(&self) -> String {
        match self {
            Self::Single(name) => name.clone(),
            Self::Mix { base, reference } => format!("mix:{base}+{reference}"),
        }
    }
}

impl Default for ProfileSelection {
    fn default() -> Self {
        Self::Single("default".to_string())
    }
}

/// Everything the engine needs from preparation, built once per session.
#[derive(Clone, Debug)]
pub struct AssembledContext {
    pub system: SystemContext,
    pub profile_used: String,
    pub default_platform: String,
    pub notion_configured: bool,
}

fn segment(label: SegmentLabel, content: String, cacheable: bool) -> SystemSegment {
    SystemSegment {
        label,
        content,
        cacheable,
    }
}

async fn load(
    store: &ProfileStore,
    name: &str,
    side: Option<ProfileSide>,
) -> Result<(StyleProfile, String), SetupError> {
    let failed = |source| SetupError::Profile { side, source };
    let profile = store.load(name).await.map_err(failed)?;
    let json = profile.to_pretty_json().map_err(|e| {
        failed(ProfileError::Invalid {
            name: name.to_string(),
            reason: e.to_string(),
        })
    })?;
    Ok((profile, json))
}

fn metadata(profile_used: &str) -> String {
    format!(
        "--- SESSION METADATA ---\n\
         profile_used: \"{profile_used}\"\n\
         When calling save_to_file, pass profile_used exactly as shown above."
    )
}

/// Load the selected profile(s) and build the ordered system context.
///
/// Any load or validation failure aborts before a model call is made.
#[instrument(skip(store), fields(profile_used = %selection.profile_used()))]
pub async fn assemble(
    store: &ProfileStore,
    selection: &ProfileSelection,
    notion_configured: bool,
) -> Result<AssembledContext, SetupError> {
    let instructions = segment(SegmentLabel::Instructions, GHOSTWRITER_PROMPT.to_string(), true);

    let (mut segments, default_platform) = match selection {
        ProfileSelection::Single(name) => {
            let (profile, json) = load(store, name, None).await?;
            let segments = vec![
                instructions,
                segment(
                    SegmentLabel::Profile,
                    format!("--- STYLE PROFILE ({name}) ---\n{json}"),
                    true,
                ),
            ];
            (segments, default_platform(&profile))
        }
        ProfileSelection::Mix { base, reference } => {
            let (base_profile, base_json) = load(store, base, Some(ProfileSide::Base)).await?;
            let (_, reference_json) =
                load(store, reference, Some(ProfileSide::Reference)).await?;
            let segments = vec![
                instructions,
                segment(
                    SegmentLabel::BaseProfile,
                    format!("--- BASE PROFILE ---\n{base_json}"),
                    false,
                ),
                segment(
                    SegmentLabel::ReferenceProfile,
                    format!("--- REFERENCE PROFILE ---\n{reference_json}"),
                    false,
                ),
                segment(SegmentLabel::MixDirective, MIX_DIRECTIVE.to_string(), true),
            ];
            (segments, default_platform(&base_profile))
        }
    };

    let profile_used = selection.profile_used();
    segments.push(segment(SegmentLabel::Metadata, metadata(&profile_used), false));
    debug!(segments = segments.len(), %default_platform, "system context assembled");

    Ok(AssembledContext {
        system: SystemContext::new(segments),
        profile_used,
        default_platform,
        notion_configured,
    })
}
