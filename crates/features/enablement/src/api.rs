use crate::error::ProviderError;
use async_trait::async_trait;
use gdfleet_domain::features::{Feature, FeatureToggle, SnapshotPreservation};
use gdfleet_domain::ids::{AccountId, DetectorId, RegionName};

/// The provider management surface used by a run.
///
/// This is the only network boundary of the workspace. Implementations must be
/// cheap to share across region workers; every call is awaited before the next
/// one in the same region is issued.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Regions enabled for the bootstrap account.
    async fn list_regions(&self) -> Result<Vec<RegionName>, ProviderError>;

    /// Detectors configured in `region`.
    async fn list_detectors(&self, region: &RegionName) -> Result<Vec<DetectorId>, ProviderError>;

    /// Member accounts attached to `detector`.
    async fn list_members(
        &self,
        region: &RegionName,
        detector: &DetectorId,
    ) -> Result<Vec<AccountId>, ProviderError>;

    /// Sets one feature (and its sub-features) on the detector itself.
    async fn update_detector(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        toggle: &FeatureToggle,
    ) -> Result<(), ProviderError>;

    /// Makes `feature` an auto-enable default for accounts that join the organization later.
    async fn update_organization_configuration(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        feature: Feature,
    ) -> Result<(), ProviderError>;

    /// Sets the given features (and their sub-features) on an existing member account.
    ///
    /// A provider that accepts the call but leaves the account unprocessed must
    /// report [`ProviderError::Rejected`].
    async fn update_member_detectors(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        account: &AccountId,
        toggles: &[FeatureToggle],
    ) -> Result<(), ProviderError>;

    /// Updates how malware-scan snapshots are preserved on the detector.
    async fn update_malware_scan_settings(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        preservation: SnapshotPreservation,
    ) -> Result<(), ProviderError>;
}
