use serde::{Deserialize, Serialize};

/// A system prompt segment. `cacheable` marks the end of a prefix that is
/// stable across calls and may be served from the provider's prompt cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemSegment {
    pub label: SegmentLabel,
    pub content: String,
    pub cacheable: bool,
}

/// Labels for tracking what's in the context (debugging, session logs).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentLabel {
    Instructions,
    Profile,
    BaseProfile,
    ReferenceProfile,
    MixDirective,
    Metadata,
}

/// Ordered system context, built once per session and immutable afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemContext {
    segments: Vec<SystemSegment>,
}

impl SystemContext {
    pub fn new(segments: Vec<SystemSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[SystemSegment] {
        &self.segments
    }

    pub fn labels(&self) -> Vec<&SegmentLabel> {
        self.segments.iter().map(|s| &s.label).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
