//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cb-tracker")]
#[command(about = "CodeBench engagement tracker - session replay, export and collector tools")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (TOML or JSON)
    #[arg(long, global = true, env = "CB_TRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a recorded session of host events through the tracker
    Replay {
        /// JSON Lines file, one `{"at_ms": .., "event": ..}` object per line
        events: PathBuf,

        /// Keep logs local instead of sending them to the collector
        #[arg(long)]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch the logs the collector holds for a student
    Logs {
        /// Student id (defaults to the configured net_id)
        #[arg(long)]
        net_id: Option<String>,

        /// Course id (defaults to the configured course_id)
        #[arg(long)]
        course_id: Option<String>,

        /// Print the raw records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write save/export documents for a recorded session
    Export {
        /// JSON Lines session recording
        events: PathBuf,

        /// Which document to write
        #[arg(long, value_enum, default_value = "all")]
        kind: ExportKind,

        /// Directory to write into (defaults to the configured contents API)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Notebook records on the collector
    Notebook {
        #[command(subcommand)]
        action: NotebookAction,
    },

    /// Daily study goal
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// cb-tracker-logs.json
    Logs,
    /// cb-tracker-logs-human-readable.json
    Readable,
    /// copy-paste-logs.json
    CopyPaste,
    /// All three documents
    All,
}

#[derive(Subcommand, Clone)]
pub enum NotebookAction {
    /// Create the notebook record for a path; an existing record is fine
    Register {
        /// Notebook path, e.g. `CS101/lab1.ipynb`
        path: String,

        /// Mark the notebook as an activebook
        #[arg(long)]
        activebook: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum GoalAction {
    /// Show the goal for a day
    Get {
        /// Day as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Set the goal for a day
    Set {
        /// Goal in minutes
        minutes: u32,

        /// Day as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Validate the configuration
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_args() {
        let cli = Cli::try_parse_from([
            "cb-tracker",
            "replay",
            "session.jsonl",
            "--dry-run",
            "--config",
            "tracker.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("tracker.toml")));
        match cli.command {
            Commands::Replay { events, dry_run, json } => {
                assert_eq!(events, PathBuf::from("session.jsonl"));
                assert!(dry_run);
                assert!(!json);
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_export_kind_values() {
        let cli = Cli::try_parse_from([
            "cb-tracker",
            "export",
            "session.jsonl",
            "--kind",
            "copy-paste",
            "--out",
            "saved",
        ])
        .unwrap();
        match cli.command {
            Commands::Export { kind, out, .. } => {
                assert_eq!(kind, ExportKind::CopyPaste);
                assert_eq!(out, Some(PathBuf::from("saved")));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_goal_set_requires_minutes() {
        assert!(Cli::try_parse_from(["cb-tracker", "goal", "set"]).is_err());
        assert!(Cli::try_parse_from(["cb-tracker", "goal", "set", "45"]).is_ok());
    }
}
