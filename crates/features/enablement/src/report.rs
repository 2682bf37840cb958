use crate::error::{ProviderError, ProviderErrorKind};
use chrono::{DateTime, Utc};
use gdfleet_domain::features::FeatureToggle;
use gdfleet_domain::ids::{AccountId, DetectorId, RegionName};
use serde::Serialize;
use strum_macros::Display;

/// What a unit of work touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnitScope {
    /// Listing the detectors of a region.
    DetectorDiscovery,
    /// Listing the members of a detector.
    MemberDiscovery,
    /// One feature on the detector itself.
    DetectorFeature,
    /// One auto-enable default for accounts joining later.
    OrganizationFeature,
    /// The feature set of one existing member.
    MemberFeatures,
    MalwareScanSettings,
}

/// Result of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// Dry run; the call was not issued.
    Planned,
    Failed { kind: ProviderErrorKind, message: String },
}

impl Outcome {
    #[must_use]
    pub fn failed(err: &ProviderError) -> Self {
        Self::Failed { kind: err.kind(), message: err.to_string() }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOutcome {
    pub scope: UnitScope,
    pub region: RegionName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detector: Option<DetectorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub toggles: Vec<FeatureToggle>,
    pub outcome: Outcome,
}

impl UnitOutcome {
    #[must_use]
    pub const fn new(scope: UnitScope, region: RegionName, outcome: Outcome) -> Self {
        Self { scope, region, detector: None, account: None, toggles: Vec::new(), outcome }
    }

    #[must_use]
    pub fn with_detector(mut self, detector: DetectorId) -> Self {
        self.detector = Some(detector);
        self
    }

    #[must_use]
    pub fn with_account(mut self, account: AccountId) -> Self {
        self.account = Some(account);
        self
    }

    #[must_use]
    pub fn with_toggles(mut self, toggles: Vec<FeatureToggle>) -> Self {
        self.toggles = toggles;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub regions: usize,
    pub applied: usize,
    pub planned: usize,
    pub failed: usize,
}

/// The partial-completion record of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub regions: Vec<RegionName>,
    pub units: Vec<UnitOutcome>,
    pub summary: RunSummary,
}

impl RunReport {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            dry_run,
            regions: Vec::new(),
            units: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    /// Appends the units of one region, keeping the counters in step.
    pub fn push_region(&mut self, region: RegionName, units: impl IntoIterator<Item = UnitOutcome>) {
        self.regions.push(region);
        self.summary.regions += 1;
        for unit in units {
            match unit.outcome {
                Outcome::Applied => self.summary.applied += 1,
                Outcome::Planned => self.summary.planned += 1,
                Outcome::Failed { .. } => self.summary.failed += 1,
            }
            self.units.push(unit);
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.units.iter().filter(|unit| unit.outcome.is_failed())
    }
}
