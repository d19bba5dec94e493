//! # ghostpen-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** ([`GhostpenSettings::default()`])
//! 2. **Settings file**: `ghostpen.json` in the working directory, or the
//!    file named by `GHOSTPEN_SETTINGS` (deep-merged over defaults)
//! 3. **Environment variables**: `GHOSTPEN_*`, `ANTHROPIC_API_KEY`,
//!    `NOTION_TOKEN`, `NOTION_DATABASE_ID` (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
