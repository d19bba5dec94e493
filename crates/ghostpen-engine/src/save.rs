//! Deriving a save record from an accepted draft without another model call.

use std::sync::LazyLock;

use regex::Regex;

use ghostpen_store::PostRecord;

use crate::tools::Platform;

const MAX_TITLE_CHARS: usize = 80;
const MAX_PREAMBLE_CHARS: usize = 200;

static REQUEST_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(напиши|створи|згенеруй|зроби|write|create|generate|make)\s+(?:(?:a|an|the)\s+)?(пост|допис|тред|статтю|текст|post|thread|article)\s+(про|на тему|about)\s+",
    )
    .unwrap()
});
static PREAMBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)профіль|генерую|profile|generating").unwrap());
static LINKEDIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)linkedin|лінкедін|лінкедин").unwrap());
static INSTAGRAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)instagram|інстаграм|инстаграм").unwrap());
static X_TWITTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:x|twitter)\b|твіт+ер").unwrap());

/// The request with a leading "write a post about" phrase removed.
pub fn extract_topic(input: &str) -> String {
    let topic = REQUEST_PHRASE.replace(input.trim(), "").trim().to_string();
    if topic.is_empty() {
        input.trim().to_string()
    } else {
        topic
    }
}

/// Drop a short leading "read the profile, generating..." line.
pub fn strip_preamble(text: &str) -> &str {
    match text.split_once("\n\n") {
        Some((first, rest))
            if first.chars().count() < MAX_PREAMBLE_CHARS && PREAMBLE.is_match(first) =>
        {
            rest
        }
        _ => text,
    }
}

/// Platform named in the request, if any.
pub fn detect_platform(input: &str) -> Option<Platform> {
    if LINKEDIN.is_match(input) {
        Some(Platform::Linkedin)
    } else if INSTAGRAM.is_match(input) {
        Some(Platform::Instagram)
    } else if X_TWITTER.is_match(input) {
        Some(Platform::X)
    } else {
        None
    }
}

/// First non-empty line, at most 80 chars.
pub fn title(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect()
}

/// Build the record for an accepted draft. A default platform outside the
/// supported set falls back to LinkedIn.
pub fn build_record(
    draft: &str,
    original_input: &str,
    default_platform: &str,
    profile_used: &str,
) -> PostRecord {
    let content = strip_preamble(draft).trim().to_string();
    let platform = detect_platform(original_input)
        .or_else(|| Platform::from_name(default_platform))
        .unwrap_or_default();
    PostRecord {
        title: title(&content),
        platform: platform.as_str().to_string(),
        topic: extract_topic(original_input),
        profile_used: profile_used.to_string(),
        content,
    }
}
