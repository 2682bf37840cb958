//! Command-line arguments.

use clap::{ArgAction, Parser, Subcommand};
use gdfleet::kernel::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gdfleet")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Enable threat-detection features on every detector and member of the fleet")]
pub struct Cli {
    /// Configuration file; `GDFLEET__*` variables override its values
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Raise the log level once per occurrence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Enable the configured features across every selected region
    Apply {
        /// List the changes without issuing any update call
        #[arg(long)]
        dry_run: bool,

        /// Write the run report as JSON to this file
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,

        /// Number of regions processed at the same time
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
        concurrency: Option<u16>,
    },
    /// Same as `apply --dry-run`
    Plan {
        /// Write the run report as JSON to this file
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },
    /// Load and validate the configuration, then print the resolved exceptions
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plan_takes_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gdfleet", "plan", "-vv", "--config", "fleet.toml"]).unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from("fleet.toml"));
        assert!(matches!(cli.command, Commands::Plan { report: None }));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(Cli::try_parse_from(["gdfleet", "apply", "--concurrency", "0"]).is_err());
    }
}
