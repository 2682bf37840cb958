//! Execution stage: applies region plans and assembles the run report.

use crate::api::ManagementApi;
use crate::error::{EnablementError, EnablementErrorExt, ProviderError};
use crate::options::RunOptions;
use crate::plan::{DetectorPlan, MemberPlan, RegionPlan, plan_region};
use crate::report::{Outcome, RunReport, UnitOutcome, UnitScope};
use chrono::Utc;
use gdfleet_domain::features::FeatureToggle;
use gdfleet_domain::ids::{DetectorId, RegionName};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Drives a run over every selected region.
///
/// Regions are independent and run concurrently up to
/// [`RunOptions::max_concurrent_regions`]; calls within a region are sequential.
pub struct FleetRunner<P: ?Sized> {
    api: Arc<P>,
    options: Arc<RunOptions>,
}

impl<P: ?Sized> fmt::Debug for FleetRunner<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FleetRunner").field("options", &self.options).finish_non_exhaustive()
    }
}

impl<P: ?Sized> Clone for FleetRunner<P> {
    fn clone(&self) -> Self {
        Self { api: Arc::clone(&self.api), options: Arc::clone(&self.options) }
    }
}

impl<P> FleetRunner<P>
where
    P: ManagementApi + ?Sized + 'static,
{
    pub fn new(api: Arc<P>, options: RunOptions) -> Self {
        Self { api, options: Arc::new(options) }
    }

    #[must_use]
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Runs the whole pipeline.
    ///
    /// Failed units are recorded in the report and never stop their siblings.
    ///
    /// # Errors
    /// Fails only when the regions cannot be enumerated or a region worker dies.
    pub async fn run(&self) -> Result<RunReport, EnablementError> {
        let mut report = RunReport::new(Utc::now(), self.options.dry_run);

        let regions: Vec<RegionName> = self
            .api
            .list_regions()
            .await
            .context("Failed to enumerate regions")?
            .into_iter()
            .filter(|region| self.options.selects(region))
            .collect();

        info!(
            regions = regions.len(),
            dry_run = self.options.dry_run,
            concurrency = self.options.max_concurrent_regions,
            "Starting enablement run"
        );

        let limiter = Arc::new(Semaphore::new(self.options.max_concurrent_regions));
        let mut workers = JoinSet::new();

        for (index, region) in regions.iter().cloned().enumerate() {
            let permit = Arc::clone(&limiter)
                .acquire_owned()
                .await
                .map_err(|_| EnablementError::from("Region limiter closed"))?;
            let api = Arc::clone(&self.api);
            let options = Arc::clone(&self.options);

            workers.spawn(async move {
                let _permit = permit;
                let units = process_region(api.as_ref(), &region, &options).await;
                (index, units)
            });
        }

        let mut slots: Vec<Option<Vec<UnitOutcome>>> = vec![None; regions.len()];
        while let Some(joined) = workers.join_next().await {
            let (index, units) = joined.context("Region worker terminated abnormally")?;
            slots[index] = Some(units);
        }

        for (region, units) in regions.into_iter().zip(slots) {
            report.push_region(region, units.unwrap_or_default());
        }
        report.finish();

        info!(
            regions = report.summary.regions,
            applied = report.summary.applied,
            planned = report.summary.planned,
            failed = report.summary.failed,
            "Enablement run finished"
        );

        Ok(report)
    }
}

async fn process_region<P>(api: &P, region: &RegionName, options: &RunOptions) -> Vec<UnitOutcome>
where
    P: ManagementApi + ?Sized,
{
    let plan = plan_region(api, region, options).await;
    info!(
        region = %region,
        detectors = plan.detectors.len(),
        updates = plan.update_count(),
        "Region planned"
    );
    execute_plan(api, plan, options.dry_run).await
}

/// Applies a region plan unit by unit. In a dry run no update call is issued
/// and every unit is [`Outcome::Planned`].
pub async fn execute_plan<P>(api: &P, plan: RegionPlan, dry_run: bool) -> Vec<UnitOutcome>
where
    P: ManagementApi + ?Sized,
{
    let RegionPlan { region, detectors, failures } = plan;
    let mut units = failures;

    for detector in &detectors {
        units.extend(enable_detector_features(api, &region, detector, dry_run).await);
        units.extend(propagate_to_members(api, &region, &detector.detector, &detector.members, dry_run).await);
    }

    units
}

/// Enables the detector's features on the detector itself and as
/// organization auto-enable defaults, then applies malware scan settings.
pub async fn enable_detector_features<P>(
    api: &P,
    region: &RegionName,
    plan: &DetectorPlan,
    dry_run: bool,
) -> Vec<UnitOutcome>
where
    P: ManagementApi + ?Sized,
{
    let detector = &plan.detector;
    let mut units = Vec::with_capacity(plan.toggles.len() + plan.organization.len() + 1);

    for toggle in &plan.toggles {
        let outcome = attempt(dry_run, api.update_detector(region, detector, toggle)).await;
        match &outcome {
            Outcome::Failed { message, .. } => warn!(
                feature = %toggle.feature,
                detector = %detector,
                region = %region,
                error = %message,
                "Failed to update detector feature"
            ),
            _ => info!(
                feature = %toggle.feature,
                status = %toggle.status,
                detector = %detector,
                region = %region,
                dry_run,
                "Detector feature {}",
                verb(dry_run)
            ),
        }
        units.push(
            UnitOutcome::new(UnitScope::DetectorFeature, region.clone(), outcome)
                .with_detector(detector.clone())
                .with_toggles(vec![*toggle]),
        );
    }

    for feature in &plan.organization {
        let outcome =
            attempt(dry_run, api.update_organization_configuration(region, detector, *feature)).await;
        match &outcome {
            Outcome::Failed { message, .. } => warn!(
                feature = %feature,
                detector = %detector,
                region = %region,
                error = %message,
                "Failed to update organization auto-enable"
            ),
            _ => info!(
                feature = %feature,
                detector = %detector,
                region = %region,
                dry_run,
                "Organization auto-enable for new accounts {}",
                verb(dry_run)
            ),
        }
        units.push(
            UnitOutcome::new(UnitScope::OrganizationFeature, region.clone(), outcome)
                .with_detector(detector.clone())
                .with_toggles(vec![FeatureToggle::enabled(*feature)]),
        );
    }

    if let Some(preservation) = plan.malware {
        let outcome =
            attempt(dry_run, api.update_malware_scan_settings(region, detector, preservation)).await;
        match &outcome {
            Outcome::Failed { message, .. } => warn!(
                detector = %detector,
                region = %region,
                error = %message,
                "Failed to update malware scan settings"
            ),
            _ => info!(
                snapshot_preservation = %preservation,
                detector = %detector,
                region = %region,
                dry_run,
                "Malware scan settings {}",
                verb(dry_run)
            ),
        }
        units.push(
            UnitOutcome::new(UnitScope::MalwareScanSettings, region.clone(), outcome)
                .with_detector(detector.clone()),
        );
    }

    units
}

/// Applies each member's resolved feature set, one call per member.
pub async fn propagate_to_members<P>(
    api: &P,
    region: &RegionName,
    detector: &DetectorId,
    members: &[MemberPlan],
    dry_run: bool,
) -> Vec<UnitOutcome>
where
    P: ManagementApi + ?Sized,
{
    let mut units = Vec::with_capacity(members.len());

    for member in members {
        let account = &member.account;
        let outcome =
            attempt(dry_run, api.update_member_detectors(region, detector, account, &member.toggles))
                .await;

        match &outcome {
            Outcome::Failed { kind, message } => warn!(
                account = %account,
                region = %region,
                kind = %kind,
                error = %message,
                "Failed to update member features"
            ),
            _ => {
                for toggle in &member.toggles {
                    info!(
                        feature = %toggle.feature,
                        status = %toggle.status,
                        account = %account,
                        region = %region,
                        dry_run,
                        "Member feature {}",
                        verb(dry_run)
                    );
                }
            },
        }

        units.push(
            UnitOutcome::new(UnitScope::MemberFeatures, region.clone(), outcome)
                .with_detector(detector.clone())
                .with_account(account.clone())
                .with_toggles(member.toggles.clone()),
        );
    }

    units
}

// `call` is only polled outside a dry run, so no request leaves the process.
async fn attempt<F>(dry_run: bool, call: F) -> Outcome
where
    F: Future<Output = Result<(), ProviderError>>,
{
    if dry_run {
        return Outcome::Planned;
    }
    match call.await {
        Ok(()) => Outcome::Applied,
        Err(err) => Outcome::failed(&err),
    }
}

const fn verb(dry_run: bool) -> &'static str {
    if dry_run { "planned" } else { "updated" }
}
