//! Fleet-wide protection feature enablement.
//!
//! A run walks regions → detectors → members. Each region is planned
//! ([`plan_region`]) and then executed unit by unit; every unit yields an
//! [`Outcome`] collected into a [`RunReport`], so one failed call never hides
//! how far the rest of the fleet got.

mod api;
mod error;
mod options;
mod plan;
mod policy;
mod report;
mod runner;

pub use crate::api::ManagementApi;
pub use crate::error::{
    EnablementError, EnablementErrorExt, ProviderError, ProviderErrorExt, ProviderErrorKind,
};
pub use crate::options::RunOptions;
pub use crate::plan::{DetectorPlan, MemberPlan, RegionPlan, plan_region};
pub use crate::policy::{ExceptionPolicy, resolve_member_features};
pub use crate::report::{Outcome, RunReport, RunSummary, UnitOutcome, UnitScope};
pub use crate::runner::{FleetRunner, enable_detector_features, execute_plan, propagate_to_members};
