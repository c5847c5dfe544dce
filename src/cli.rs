//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "devlog",
    version,
    about = "Track development sessions as append-only logs"
)]
pub struct Cli {
    /// Session directory (default: <cwd>/.devlog/sessions, or $DEVLOG_ROOT).
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a new session.
    Start {
        /// Session name; words are joined with spaces.
        name: Vec<String>,

        /// End the active session first instead of refusing to start.
        #[arg(long)]
        close_active: bool,
    },
    /// Append a progress note to the active session.
    Update {
        notes: Vec<String>,
    },
    /// Close the active session.
    End {
        notes: Vec<String>,
    },
    /// Print the active session id.
    Current,
    /// Describe the active session.
    Status,
    /// List every recorded session.
    List,
    /// Print one session record.
    Show {
        id: String,
    },
}

/// Joins free-text words; `None` when nothing but whitespace was given.
pub fn joined_words(words: &[String]) -> Option<String> {
    let joined = words.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn start_accepts_multi_word_name_and_close_active() {
        let cli = Cli::parse_from(["devlog", "start", "fix", "login", "--close-active"]);
        match cli.command {
            Command::Start { name, close_active } => {
                assert_eq!(joined_words(&name).as_deref(), Some("fix login"));
                assert!(close_active);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["devlog", "list", "--json", "--root", "/tmp/sessions"]);
        assert!(cli.json);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/sessions")));
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn show_requires_an_id() {
        assert!(Cli::try_parse_from(["devlog", "show"]).is_err());
    }

    #[test]
    fn joined_words_treats_blank_as_absent() {
        assert_eq!(joined_words(&[]), None);
        assert_eq!(joined_words(&["  ".to_string()]), None);
        assert_eq!(
            joined_words(&["added".to_string(), "tests".to_string()]).as_deref(),
            Some("added tests")
        );
    }
}
