//! CLI interface for rxassist
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rxassist prescription assistant
///
/// Walks through uploading a lab report, confirming the extracted profile,
/// choosing additional tests and generating a prescription.
#[derive(Parser, Debug)]
#[command(name = "rxassist")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive chat session
    Chat,

    /// Upload a lab report and print what was extracted
    Extract {
        /// Lab report to upload
        file: PathBuf,
    },

    /// Download a generated prescription
    Download {
        /// Artifact path returned by generation
        artifact_path: String,

        /// Directory to save into (default: core.download_dir)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Check configuration and backend reachability
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rxassist",
            "download",
            "/out/rx.pdf",
            "--output",
            "/tmp",
            "--json",
            "--log",
            "debug",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.log.as_deref(), Some("debug"));
        match cli.command {
            Command::Download {
                artifact_path,
                output,
            } => {
                assert_eq!(artifact_path, "/out/rx.pdf");
                assert_eq!(output, Some(PathBuf::from("/tmp")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::try_parse_from(["rxassist", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
