//! File-backed persistence: style profiles, generated posts, the feedback
//! tracker and per-session JSON logs. Everything is plain JSON or Markdown
//! under the configured data directory.

pub mod error;
pub mod feedback;
pub mod posts;
pub mod profiles;
pub mod session_log;

pub use error::{ProfileError, StoreError};
pub use feedback::{FeedbackCategory, FeedbackRecord, FeedbackTracker, SUGGESTION_THRESHOLD};
pub use posts::{slugify, transliterate, PostHit, PostRecord, PostSearch, PostStore, SearchResult};
pub use profiles::{
    default_platform, ProfileStore, ProfileSummary, ProfileType, ProfileUpdate, StyleProfile,
};
pub use session_log::{EventKind, LogEvent, SessionLog, SessionLogWriter};

use std::path::{Path, PathBuf};

/// Write `contents` to `{stem}{ext}`, or `{stem}-2{ext}`, `{stem}-3{ext}`…
/// if taken. Never overwrites; returns the path actually written.
pub(crate) async fn write_new_file(
    dir: &Path,
    stem: &str,
    ext: &str,
    contents: &[u8],
) -> Result<PathBuf, StoreError> {
    use tokio::io::AsyncWriteExt;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| StoreError::io(dir, e))?;

    let mut suffix = 1u32;
    loop {
        let name = if suffix == 1 {
            format!("{stem}{ext}")
        } else {
            format!("{stem}-{suffix}{ext}")
        };
        let path = dir.join(name);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(contents)
                    .await
                    .map_err(|e| StoreError::io(&path, e))?;
                file.flush().await.map_err(|e| StoreError::io(&path, e))?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(StoreError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_new_file_suffixes_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_new_file(dir.path(), "a", ".md", b"1").await.unwrap();
        let second = write_new_file(dir.path(), "a", ".md", b"2").await.unwrap();
        let third = write_new_file(dir.path(), "a", ".md", b"3").await.unwrap();
        assert_eq!(first.file_name().unwrap(), "a.md");
        assert_eq!(second.file_name().unwrap(), "a-2.md");
        assert_eq!(third.file_name().unwrap(), "a-3.md");
        assert_eq!(std::fs::read_to_string(first).unwrap(), "1");
    }

    #[tokio::test]
    async fn write_new_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("output/logs");
        let path = write_new_file(&nested, "s", ".json", b"{}").await.unwrap();
        assert!(path.starts_with(&nested));
    }
}
