//! `ghostpen profile ...` subcommands. Output goes to stdout.

use std::io::Write;

use anyhow::Result;

use ghostpen_store::{ProfileStore, ProfileSummary, ProfileType, StyleProfile};

use crate::cli::ProfileCommand;

pub async fn run(store: &ProfileStore, command: &ProfileCommand) -> Result<()> {
    let mut out = std::io::stdout().lock();
    match command {
        ProfileCommand::List => {
            let rows = store.summaries().await?;
            write_list(&mut out, &rows)?;
        }
        ProfileCommand::Show { name } => {
            let profile = store.load(name).await?;
            write_summary(&mut out, &profile)?;
        }
        ProfileCommand::Delete { name } => {
            store.delete(name).await?;
            writeln!(out, "Deleted profile '{name}'.")?;
        }
    }
    Ok(())
}

fn write_list(out: &mut impl Write, rows: &[ProfileSummary]) -> std::io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "No profiles found.");
    }
    let width = rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
    for row in rows {
        writeln!(
            out,
            "{:<width$}  {:<9}  {:<24}  {}",
            row.name, row.profile_type, row.tone, row.updated
        )?;
    }
    Ok(())
}

fn write_summary(out: &mut impl Write, profile: &StyleProfile) -> std::io::Result<()> {
    let kind = match profile.profile_type {
        ProfileType::Personal => "personal",
        ProfileType::Reference => "reference",
    };
    writeln!(out, "Profile:   {}", profile.profile_name)?;
    writeln!(out, "Type:      {kind}")?;
    writeln!(out, "Language:  {}", profile.language)?;
    writeln!(out, "Version:   {}", profile.version)?;
    writeln!(out, "Tone:      {}", profile.voice.tone)?;
    writeln!(out, "Formality: {}", profile.voice.formality)?;
    writeln!(out, "Hooks:     {}", profile.voice.hooks.join("; "))?;
    writeln!(out, "Avoid:     {}", profile.voice.avoid.join("; "))?;
    writeln!(out, "Platforms: {}", profile.platform_names().join(", "))?;
    writeln!(out, "Examples:  {}", profile.examples.len())
}
