use clap::{Parser, Subcommand};

use ghostpen_engine::{ProfileSelection, SetupError};

/// Ghostwriter for social posts in your own voice.
#[derive(Parser, Debug)]
#[command(
    name = "ghostpen",
    version,
    about = "Write social posts in your own voice",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// What to write about, e.g. `write a post about burnout for linkedin`.
    #[arg(value_name = "TOPIC")]
    pub topic: Vec<String>,

    /// Style profile to write with.
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Write in BASE's voice using REFERENCE's techniques.
    #[arg(long, value_name = "BASE REFERENCE", conflicts_with = "profile")]
    pub mix: Option<String>,

    /// Verbose logging to stderr.
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage style profiles.
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// List profiles with type, tone and last update.
    List,
    /// Summarize one profile.
    Show { name: String },
    /// Delete a profile. `default` cannot be deleted.
    Delete { name: String },
}

impl Cli {
    /// The request as typed, words joined by single spaces.
    pub fn topic_text(&self) -> String {
        self.topic.join(" ").trim().to_string()
    }

    pub fn selection(&self) -> Result<ProfileSelection, SetupError> {
        match (&self.mix, &self.profile) {
            (Some(pair), _) => ProfileSelection::mix(pair),
            (None, Some(name)) => Ok(ProfileSelection::Single(name.clone())),
            (None, None) => Ok(ProfileSelection::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn topic_words_are_joined() {
        let cli = Cli::try_parse_from(["ghostpen", "write", "a", "post", "-p", "me"]).unwrap();
        assert_eq!(cli.topic_text(), "write a post");
        assert_eq!(cli.selection().unwrap(), ProfileSelection::Single("me".into()));
    }

    #[test]
    fn no_profile_flag_means_default() {
        let cli = Cli::try_parse_from(["ghostpen", "burnout"]).unwrap();
        assert_eq!(cli.selection().unwrap().profile_used(), "default");
        assert!(!cli.debug);
    }

    #[test]
    fn mix_takes_two_names() {
        let cli = Cli::try_parse_from(["ghostpen", "topic", "--mix", "me alex"]).unwrap();
        assert_eq!(cli.selection().unwrap().profile_used(), "mix:me+alex");

        let cli = Cli::try_parse_from(["ghostpen", "topic", "--mix", "me"]).unwrap();
        assert!(matches!(cli.selection(), Err(SetupError::InvalidArguments(_))));
    }

    #[test]
    fn mix_conflicts_with_profile() {
        let err = Cli::try_parse_from(["ghostpen", "t", "--mix", "a b", "-p", "c"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn empty_topic_parses() {
        let cli = Cli::try_parse_from(["ghostpen"]).unwrap();
        assert!(cli.topic_text().is_empty());
        assert!(cli.command.is_none());
    }

    #[test]
    fn profile_subcommands() {
        let cli = Cli::try_parse_from(["ghostpen", "profile", "show", "alex"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Profile(ProfileCommand::Show { ref name })) if name == "alex"
        ));
        let cli = Cli::try_parse_from(["ghostpen", "profile", "list"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Profile(ProfileCommand::List))));
    }
}
