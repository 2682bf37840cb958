//! Discovery stage: turns one region into the list of changes it needs.

use crate::api::ManagementApi;
use crate::options::RunOptions;
use crate::policy::resolve_member_features;
use crate::report::{Outcome, UnitOutcome, UnitScope};
use gdfleet_domain::features::{Feature, FeatureToggle, SnapshotPreservation};
use gdfleet_domain::ids::{AccountId, DetectorId, RegionName};
use tracing::{debug, warn};

/// Changes required in one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPlan {
    pub region: RegionName,
    pub detectors: Vec<DetectorPlan>,
    /// Discovery failures, already final.
    pub failures: Vec<UnitOutcome>,
}

/// Changes required on one detector and its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorPlan {
    pub detector: DetectorId,
    pub toggles: Vec<FeatureToggle>,
    /// Features to auto-enable for accounts that join later.
    pub organization: Vec<Feature>,
    pub malware: Option<SnapshotPreservation>,
    pub members: Vec<MemberPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPlan {
    pub account: AccountId,
    pub toggles: Vec<FeatureToggle>,
}

impl RegionPlan {
    /// Number of update calls the plan would issue.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.detectors
            .iter()
            .map(|d| {
                d.toggles.len() + d.organization.len() + d.members.len() + usize::from(d.malware.is_some())
            })
            .sum()
    }
}

/// Lists the detectors of `region` and the members of each, resolving every
/// member's toggles against the exception policy.
///
/// A failed listing is recorded in [`RegionPlan::failures`]; detectors whose
/// members could not be listed still get their own detector-level changes.
pub async fn plan_region<P>(api: &P, region: &RegionName, options: &RunOptions) -> RegionPlan
where
    P: ManagementApi + ?Sized,
{
    let mut plan =
        RegionPlan { region: region.clone(), detectors: Vec::new(), failures: Vec::new() };

    let detectors = match api.list_detectors(region).await {
        Ok(detectors) => detectors,
        Err(err) => {
            warn!(region = %region, error = %err, "Failed to list detectors");
            plan.failures.push(UnitOutcome::new(
                UnitScope::DetectorDiscovery,
                region.clone(),
                Outcome::failed(&err),
            ));
            return plan;
        },
    };

    if detectors.is_empty() {
        debug!(region = %region, "No detector configured");
    }

    let toggles: Vec<FeatureToggle> = options.features.features().map(FeatureToggle::enabled).collect();
    let organization: Vec<Feature> = options.features.features().collect();

    for detector in detectors {
        let members = match api.list_members(region, &detector).await {
            Ok(accounts) => accounts
                .into_iter()
                .map(|account| MemberPlan {
                    toggles: resolve_member_features(options.features, &options.policy, region, &account),
                    account,
                })
                .collect(),
            Err(err) => {
                warn!(region = %region, detector = %detector, error = %err, "Failed to list members");
                plan.failures.push(
                    UnitOutcome::new(UnitScope::MemberDiscovery, region.clone(), Outcome::failed(&err))
                        .with_detector(detector.clone()),
                );
                Vec::new()
            },
        };

        debug!(region = %region, detector = %detector, members = members.len(), "Detector planned");
        plan.detectors.push(DetectorPlan {
            detector,
            toggles: toggles.clone(),
            organization: organization.clone(),
            malware: options.malware,
            members,
        });
    }

    plan
}
