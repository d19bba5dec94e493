use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::StoreError;
use crate::write_new_file;

const MAX_SLUG_LEN: usize = 50;
const PREVIEW_CHARS: usize = 200;
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

fn transliterate_char(c: char) -> Option<&'static str> {
    Some(match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "h",
        'ґ' => "g",
        'д' => "d",
        'е' => "e",
        'є' => "ye",
        'ж' => "zh",
        'з' => "z",
        'и' => "y",
        'і' => "i",
        'ї' => "yi",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ь' => "",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    })
}

/// Lower-case and romanise Ukrainian Cyrillic. Other characters pass through.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        match transliterate_char(c) {
            Some(latin) => out.push_str(latin),
            None => out.push(c),
        }
    }
    out
}

/// File-name-safe slug: `[a-z0-9-]`, no leading or trailing dashes,
/// at most 50 characters.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in transliterate(text).chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// A finished post ready for persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub content: String,
    pub platform: String,
    pub topic: String,
    pub title: String,
    pub profile_used: String,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct PostMeta {
    pub platform: String,
    pub topic: String,
    pub created: String,
    pub profile_used: String,
}

/// Split a saved post into its frontmatter and body. Files without a
/// `platform` and `topic` header are not posts.
pub fn parse_frontmatter(raw: &str) -> Option<(PostMeta, String)> {
    let rest = raw.strip_prefix("---\n")?;
    let end = rest.find("---\n")?;
    let header = &rest[..end];
    let body = rest[end + 4..].trim().to_string();

    let fields: HashMap<&str, &str> = header
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect();

    let meta = PostMeta {
        platform: fields.get("platform")?.to_string(),
        topic: fields.get("topic")?.to_string(),
        created: fields.get("created").copied().unwrap_or_default().to_string(),
        profile_used: fields.get("profile_used").copied().unwrap_or("default").to_string(),
    };
    Some((meta, body))
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostSearch {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PostHit {
    pub file: String,
    pub platform: String,
    pub topic: String,
    pub created: String,
    pub preview: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_posts: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<usize>,
    pub posts: Vec<PostHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Markdown posts under the generated-output directory.
#[derive(Clone, Debug)]
pub struct PostStore {
    dir: PathBuf,
}

impl PostStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save(&self, record: &PostRecord) -> Result<PathBuf, StoreError> {
        self.save_at(record, Utc::now()).await
    }

    /// Write `{date}-{slug}-{platform}.md`, suffixing on collision.
    #[instrument(skip(self, record), fields(platform = %record.platform))]
    pub async fn save_at(&self, record: &PostRecord, now: DateTime<Utc>) -> Result<PathBuf, StoreError> {
        let slug = match slugify(&record.topic) {
            s if s.is_empty() => "untitled".to_string(),
            s => s,
        };
        let platform = match slugify(&record.platform) {
            p if p.is_empty() => "post".to_string(),
            p => p,
        };
        let stem = format!("{}-{slug}-{platform}", now.format("%Y-%m-%d"));

        let contents = format!(
            "---\nplatform: {}\ntopic: {}\ncreated: {}\nprofile_used: {}\n---\n\n{}\n",
            record.platform,
            single_line(&record.topic),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
            record.profile_used,
            record.content,
        );

        let path = write_new_file(&self.dir, &stem, ".md", contents.as_bytes()).await?;
        debug!(path = %path.display(), "post saved");
        Ok(path)
    }

    /// Keyword search over saved posts, best matches first.
    #[instrument(skip(self, query), fields(keywords = query.keywords.len()))]
    pub async fn search(&self, query: &PostSearch) -> Result<SearchResult, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SearchResult {
                    message: Some("No posts directory yet.".into()),
                    ..SearchResult::default()
                })
            }
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            if let Some(name) = entry.file_name().to_str().filter(|n| n.ends_with(".md")) {
                files.push(name.to_string());
            }
        }
        files.sort();

        if files.is_empty() {
            return Ok(SearchResult {
                message: Some("No saved posts.".into()),
                ..SearchResult::default()
            });
        }

        let keywords: Vec<String> = query.keywords.iter().map(|k| k.to_lowercase()).collect();
        let mut scored: Vec<(usize, PostHit)> = Vec::new();
        for file in &files {
            let path = self.dir.join(file);
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable post");
                    continue;
                }
            };
            let Some((meta, body)) = parse_frontmatter(&raw) else {
                continue;
            };
            if query.platform.as_deref().is_some_and(|p| p != meta.platform) {
                continue;
            }

            let haystack = format!("{} {}", meta.topic, body).to_lowercase();
            let score = keywords.iter().filter(|k| haystack.contains(k.as_str())).count();
            if score == 0 {
                continue;
            }

            scored.push((
                score,
                PostHit {
                    file: file.clone(),
                    platform: meta.platform,
                    topic: meta.topic,
                    created: meta.created,
                    preview: preview(&body),
                },
            ));
        }

        // Stable sort keeps file order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        let posts: Vec<PostHit> = scored
            .into_iter()
            .take(query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .map(|(_, hit)| hit)
            .collect();

        Ok(SearchResult {
            total_posts: Some(files.len()),
            matched: Some(posts.len()),
            posts,
            message: None,
        })
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn preview(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(topic: &str, platform: &str, content: &str) -> PostRecord {
        PostRecord {
            content: content.into(),
            platform: platform.into(),
            topic: topic.into(),
            title: content.lines().next().unwrap_or_default().into(),
            profile_used: "default".into(),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn slugify_transliterates_ukrainian() {
        assert_eq!(slugify("Штучний інтелект у бізнесі"), "shtuchnyy-intelekt-u-biznesi");
        assert_eq!(slugify("Їжак і ґанок"), "yizhak-i-ganok");
        assert_eq!(slugify("Хмара"), "khmara");
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("  AI -- for  *everyone*!! "), "ai-for-everyone");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_caps_length_without_trailing_dash() {
        let long = "word ".repeat(30);
        let slug = slugify(&long);
        assert!(slug.len() <= 50);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn parse_frontmatter_reads_fields() {
        let raw = "---\nplatform: x\ntopic: remote work\ncreated: 2025-01-01T00:00:00.000Z\nprofile_used: mix:a+b\n---\n\nBody here\n";
        let (meta, body) = parse_frontmatter(raw).unwrap();
        assert_eq!(meta.platform, "x");
        assert_eq!(meta.topic, "remote work");
        assert_eq!(meta.created, "2025-01-01T00:00:00.000Z");
        assert_eq!(meta.profile_used, "mix:a+b");
        assert_eq!(body, "Body here");
    }

    #[test]
    fn parse_frontmatter_requires_platform_and_topic() {
        assert!(parse_frontmatter("just text").is_none());
        assert!(parse_frontmatter("---\ntopic: a\n---\nbody").is_none());
    }

    #[tokio::test]
    async fn save_writes_frontmatter_and_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let store = PostStore::new(dir.path().join("generated"));
        let post = record("Штучний інтелект", "linkedin", "Hook line\n\nBody");

        let first = store.save_at(&post, fixed_now()).await.unwrap();
        let second = store.save_at(&post, fixed_now()).await.unwrap();
        assert_eq!(
            first.file_name().unwrap(),
            "2025-03-14-shtuchnyy-intelekt-linkedin.md"
        );
        assert_eq!(
            second.file_name().unwrap(),
            "2025-03-14-shtuchnyy-intelekt-linkedin-2.md"
        );

        let raw = tokio::fs::read_to_string(&first).await.unwrap();
        assert!(raw.starts_with("---\nplatform: linkedin\ntopic: Штучний інтелект\n"));
        assert!(raw.contains("created: 2025-03-14T09:30:00.000Z\n"));
        assert!(raw.ends_with("---\n\nHook line\n\nBody\n"));
    }

    #[tokio::test]
    async fn empty_topic_becomes_untitled() {
        let dir = tempfile::tempdir().unwrap();
        let store = PostStore::new(dir.path());
        let path = store.save_at(&record("???", "x", "text"), fixed_now()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "2025-03-14-untitled-x.md");
    }

    #[tokio::test]
    async fn search_scores_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let store = PostStore::new(dir.path());
        store
            .save_at(&record("remote work", "linkedin", "Remote teams need async habits"), fixed_now())
            .await
            .unwrap();
        store
            .save_at(&record("coffee", "x", "Coffee and async code"), fixed_now())
            .await
            .unwrap();
        store
            .save_at(&record("gardening", "linkedin", "Tomatoes"), fixed_now())
            .await
            .unwrap();

        let result = store
            .search(&PostSearch {
                keywords: vec!["REMOTE".into(), "async".into()],
                platform: None,
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(result.total_posts, Some(3));
        assert_eq!(result.matched, Some(2));
        assert_eq!(result.posts[0].topic, "remote work");

        let filtered = store
            .search(&PostSearch {
                keywords: vec!["async".into()],
                platform: Some("x".into()),
                limit: Some(5),
            })
            .await
            .unwrap();
        assert_eq!(filtered.posts.len(), 1);
        assert_eq!(filtered.posts[0].platform, "x");
    }

    #[tokio::test]
    async fn search_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PostStore::new(dir.path().join("nope"));
        let result = store
            .search(&PostSearch {
                keywords: vec!["a".into()],
                ..PostSearch::default()
            })
            .await
            .unwrap();
        assert!(result.posts.is_empty());
        assert!(result.message.is_some());
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let long = "a".repeat(250);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 203);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }
}
