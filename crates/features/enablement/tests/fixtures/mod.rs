#![allow(dead_code)]

use async_trait::async_trait;
use gdfleet_domain::features::{Feature, FeatureToggle, SnapshotPreservation};
use gdfleet_domain::ids::{AccountId, DetectorId, RegionName};
use gdfleet_enablement::{ManagementApi, ProviderError, ProviderErrorKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListRegions,
    ListDetectors(RegionName),
    ListMembers(RegionName, DetectorId),
    UpdateDetector(RegionName, DetectorId, FeatureToggle),
    UpdateOrganization(RegionName, DetectorId, Feature),
    UpdateMembers(RegionName, DetectorId, AccountId, Vec<FeatureToggle>),
    UpdateMalware(RegionName, DetectorId, SnapshotPreservation),
}

impl Call {
    pub const fn is_update(&self) -> bool {
        matches!(
            self,
            Self::UpdateDetector(..)
                | Self::UpdateOrganization(..)
                | Self::UpdateMembers(..)
                | Self::UpdateMalware(..)
        )
    }
}

/// Where an injected failure fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Regions,
    Detectors(RegionName),
    Members(RegionName),
    Member(RegionName, AccountId),
    DetectorFeature(RegionName, Feature),
}

/// In-memory fleet that records every call in order.
#[derive(Default)]
pub struct FakeFleet {
    regions: Vec<RegionName>,
    detectors: HashMap<RegionName, Vec<(DetectorId, Vec<AccountId>)>>,
    failures: HashMap<FailPoint, ProviderErrorKind>,
    delays: HashMap<RegionName, Duration>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

pub fn region(name: &str) -> RegionName {
    RegionName::parse(name).unwrap()
}

pub fn account(id: &str) -> AccountId {
    AccountId::parse(id).unwrap()
}

pub fn detector(id: &str) -> DetectorId {
    DetectorId::parse(id).unwrap()
}

impl FakeFleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a region with one detector named `det-<region>` and the given members.
    #[must_use]
    pub fn with_region(mut self, name: &str, members: &[&str]) -> Self {
        let region = region(name);
        self.regions.push(region.clone());
        self.detectors.insert(
            region,
            vec![(detector(&format!("det-{name}")), members.iter().map(|id| account(id)).collect())],
        );
        self
    }

    #[must_use]
    pub fn with_empty_region(mut self, name: &str) -> Self {
        self.regions.push(region(name));
        self
    }

    #[must_use]
    pub fn failing(mut self, point: FailPoint, kind: ProviderErrorKind) -> Self {
        self.failures.insert(point, kind);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(region(name), delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn updates(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_update).collect()
    }

    pub fn member_updates(&self, name: &str) -> HashMap<AccountId, Vec<FeatureToggle>> {
        let region = region(name);
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdateMembers(r, _, account, toggles) if r == region => Some((account, toggles)),
                _ => None,
            })
            .collect()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn check(&self, point: FailPoint) -> Result<(), ProviderError> {
        match self.failures.get(&point) {
            Some(kind) => Err(ProviderError::new(*kind, format!("injected failure at {point:?}"))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ManagementApi for FakeFleet {
    async fn list_regions(&self) -> Result<Vec<RegionName>, ProviderError> {
        self.record(Call::ListRegions);
        self.check(FailPoint::Regions)?;
        Ok(self.regions.clone())
    }

    async fn list_detectors(&self, region: &RegionName) -> Result<Vec<DetectorId>, ProviderError> {
        self.record(Call::ListDetectors(region.clone()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(region) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.check(FailPoint::Detectors(region.clone()))?;
        Ok(self
            .detectors
            .get(region)
            .map(|detectors| detectors.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default())
    }

    async fn list_members(
        &self,
        region: &RegionName,
        detector: &DetectorId,
    ) -> Result<Vec<AccountId>, ProviderError> {
        self.record(Call::ListMembers(region.clone(), detector.clone()));
        self.check(FailPoint::Members(region.clone()))?;
        Ok(self
            .detectors
            .get(region)
            .and_then(|detectors| detectors.iter().find(|(id, _)| id == detector))
            .map(|(_, members)| members.clone())
            .unwrap_or_default())
    }

    async fn update_detector(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        toggle: &FeatureToggle,
    ) -> Result<(), ProviderError> {
        self.record(Call::UpdateDetector(region.clone(), detector.clone(), *toggle));
        self.check(FailPoint::DetectorFeature(region.clone(), toggle.feature))
    }

    async fn update_organization_configuration(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        feature: Feature,
    ) -> Result<(), ProviderError> {
        self.record(Call::UpdateOrganization(region.clone(), detector.clone(), feature));
        Ok(())
    }

    async fn update_member_detectors(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        account: &AccountId,
        toggles: &[FeatureToggle],
    ) -> Result<(), ProviderError> {
        self.record(Call::UpdateMembers(
            region.clone(),
            detector.clone(),
            account.clone(),
            toggles.to_vec(),
        ));
        self.check(FailPoint::Member(region.clone(), account.clone()))
    }

    async fn update_malware_scan_settings(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        preservation: SnapshotPreservation,
    ) -> Result<(), ProviderError> {
        self.record(Call::UpdateMalware(region.clone(), detector.clone(), preservation));
        Ok(())
    }
}
