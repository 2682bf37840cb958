use anyhow::{Context, Result};
use gdfleet::domain::config::FleetSettings;
use gdfleet::enablement::{Outcome, RunReport};
use gdfleet::kernel::config::freeze;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};

/// Exit status when the run completed but some units failed.
const EXIT_PARTIAL: u8 = 2;

/// Command-line overrides layered over the `[run]` section.
#[derive(Debug, Default)]
pub struct Overrides {
    pub dry_run: bool,
    pub concurrency: Option<u16>,
}

impl Overrides {
    fn apply(&self, settings: &mut FleetSettings) {
        settings.run.dry_run |= self.dry_run;
        if let Some(concurrency) = self.concurrency {
            settings.run.max_concurrent_regions = usize::from(concurrency);
        }
    }
}

/// Runs the pipeline against the provider and reports the outcome.
pub async fn apply(
    mut settings: FleetSettings,
    overrides: &Overrides,
    report_path: Option<&Path>,
) -> Result<ExitCode> {
    overrides.apply(&mut settings);
    let config = freeze(settings).context("Critical: configuration is invalid")?;

    let runner = gdfleet::connect(&config).await;
    let report = runner.run().await.context("Enablement run aborted")?;

    if let Some(path) = report_path {
        write_report(&report, path)?;
    }
    for line in summary_lines(&report) {
        println!("{line}");
    }

    Ok(exit_code(&report))
}

/// Maps a finished run onto the process exit status.
fn exit_code(report: &RunReport) -> ExitCode {
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        warn!(failed = report.summary.failed, "Run completed with failed units");
        ExitCode::from(EXIT_PARTIAL)
    }
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file '{}'", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write report to '{}'", path.display()))?;
    info!(path = %path.display(), "Run report written");
    Ok(())
}

/// One totals line followed by one line per failed unit.
fn summary_lines(report: &RunReport) -> Vec<String> {
    let summary = &report.summary;
    let mut lines = vec![format!(
        "{} region(s): {} applied, {} planned, {} failed",
        summary.regions, summary.applied, summary.planned, summary.failed
    )];

    for unit in report.failures() {
        let Outcome::Failed { kind, message } = &unit.outcome else { continue };
        let target = unit
            .account
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| unit.detector.as_ref().map(ToString::to_string));
        let line = match target {
            Some(target) => format!("  failed {} {} {target} [{kind}]: {message}", unit.scope, unit.region),
            None => format!("  failed {} {} [{kind}]: {message}", unit.scope, unit.region),
        };
        lines.push(line);
    }
    lines
}
