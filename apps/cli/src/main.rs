#![allow(clippy::print_stdout)]

mod args;
mod handlers;

use crate::args::{Cli, Commands};
use crate::handlers::apply::{Overrides, apply};
use crate::handlers::{bootstrap, validate::validate};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let (settings, _log) = bootstrap(&cli.config, cli.verbose)?;

    match cli.command {
        Commands::Apply { dry_run, report, concurrency } => {
            apply(settings, &Overrides { dry_run, concurrency }, report.as_deref()).await
        },
        Commands::Plan { report } => {
            apply(settings, &Overrides { dry_run: true, concurrency: None }, report.as_deref()).await
        },
        Commands::Validate => {
            validate(settings, &cli.config)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}
