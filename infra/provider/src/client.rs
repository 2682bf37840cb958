use crate::convert;
use crate::error::classify;
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use fxhash::FxHashMap;
use gdfleet_domain::config::ProviderSettings;
use gdfleet_domain::features::{Feature, FeatureToggle, SnapshotPreservation};
use gdfleet_domain::ids::{AccountId, DetectorId, RegionName};
use gdfleet_enablement::{ManagementApi, ProviderError, ProviderErrorKind};
use parking_lot::Mutex;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, warn};

/// [`ManagementApi`] backed by the official SDK.
///
/// Regions are enumerated with the bootstrap session; every regional call uses
/// the delegated administrator session. Regional clients are built on first
/// use and reused for the rest of the run.
#[derive(Debug)]
pub struct AwsManagementApi {
    bootstrap: SdkConfig,
    admin: SdkConfig,
    only_associated_members: bool,
    clients: Mutex<FxHashMap<RegionName, aws_sdk_guardduty::Client>>,
}

impl AwsManagementApi {
    /// Resolves both sessions from the shared credential and config files.
    ///
    /// Throttled or transient failures are retried by the SDK in standard mode,
    /// up to `max_attempts` attempts per call.
    pub async fn connect(settings: &ProviderSettings) -> Self {
        let retry = RetryConfig::standard().with_max_attempts(settings.max_attempts);

        let bootstrap =
            load_session(settings.profile.as_deref(), settings.region.as_ref(), retry.clone()).await;
        let admin =
            load_session(settings.effective_admin_profile(), settings.region.as_ref(), retry).await;

        debug!(
            profile = settings.profile.as_deref().unwrap_or("default"),
            admin_profile = settings.effective_admin_profile().unwrap_or("default"),
            region = ?bootstrap.region(),
            "Provider sessions resolved"
        );

        Self::from_sessions(bootstrap, admin, settings.only_associated_members)
    }

    #[must_use]
    pub fn from_sessions(bootstrap: SdkConfig, admin: SdkConfig, only_associated_members: bool) -> Self {
        Self { bootstrap, admin, only_associated_members, clients: Mutex::new(FxHashMap::default()) }
    }

    fn guardduty(&self, region: &RegionName) -> aws_sdk_guardduty::Client {
        let mut clients = self.clients.lock();
        clients
            .entry(region.clone())
            .or_insert_with(|| {
                let config = aws_sdk_guardduty::config::Builder::from(&self.admin)
                    .region(Region::new(region.to_string()))
                    .build();
                aws_sdk_guardduty::Client::from_conf(config)
            })
            .clone()
    }
}

async fn load_session(
    profile: Option<&str>,
    region: Option<&RegionName>,
    retry: RetryConfig,
) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).retry_config(retry);
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}

/// Parses every listed id. A single malformed value fails the whole listing so the
/// affected scope shows up as a failed discovery unit instead of a skipped account.
fn parse_ids<T>(raw: &[String], what: &str) -> Result<Vec<T>, ProviderError>
where
    T: FromStr,
    T::Err: Display,
{
    let mut ids = Vec::with_capacity(raw.len());
    let mut malformed = Vec::new();
    for value in raw {
        match value.parse::<T>() {
            Ok(id) => ids.push(id),
            Err(err) => {
                warn!(value = %value, error = %err, "Malformed {what} in provider response");
                malformed.push(format!("'{value}'"));
            },
        }
    }

    if malformed.is_empty() {
        Ok(ids)
    } else {
        Err(ProviderError::new(
            ProviderErrorKind::MalformedResponse,
            format!("malformed {what}: {}", malformed.join(", ")),
        ))
    }
}

/// Turns the unprocessed-account list of a member update into the unit result.
fn member_update_result<'a>(
    unprocessed: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<(), ProviderError> {
    match unprocessed.into_iter().next() {
        Some((account, reason)) => {
            Err(ProviderError::new(ProviderErrorKind::Rejected, format!("{account}: {reason}")))
        },
        None => Ok(()),
    }
}

#[async_trait]
impl ManagementApi for AwsManagementApi {
    async fn list_regions(&self) -> Result<Vec<RegionName>, ProviderError> {
        let output = aws_sdk_ec2::Client::new(&self.bootstrap)
            .describe_regions()
            .send()
            .await
            .map_err(|err| classify(&err))?;

        let names: Vec<String> = output
            .regions()
            .iter()
            .filter_map(|region| region.region_name().map(str::to_owned))
            .collect();
        parse_ids(&names, "region")
    }

    async fn list_detectors(&self, region: &RegionName) -> Result<Vec<DetectorId>, ProviderError> {
        let mut pages = self.guardduty(region).list_detectors().into_paginator().send();
        let mut ids = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| classify(&err))?;
            ids.extend_from_slice(page.detector_ids());
        }
        parse_ids(&ids, "detector id")
    }

    async fn list_members(
        &self,
        region: &RegionName,
        detector: &DetectorId,
    ) -> Result<Vec<AccountId>, ProviderError> {
        let mut pages = self
            .guardduty(region)
            .list_members()
            .detector_id(detector.as_str())
            .only_associated(self.only_associated_members.to_string())
            .into_paginator()
            .send();

        let mut accounts = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| classify(&err))?;
            accounts.extend(page.members().iter().map(|member| member.account_id().to_owned()));
        }
        parse_ids(&accounts, "account id")
    }

    async fn update_detector(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        toggle: &FeatureToggle,
    ) -> Result<(), ProviderError> {
        self.guardduty(region)
            .update_detector()
            .detector_id(detector.as_str())
            .features(convert::detector_feature(toggle))
            .send()
            .await
            .map_err(|err| classify(&err))?;
        Ok(())
    }

    async fn update_organization_configuration(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        feature: Feature,
    ) -> Result<(), ProviderError> {
        self.guardduty(region)
            .update_organization_configuration()
            .detector_id(detector.as_str())
            .auto_enable_organization_members(convert::AUTO_ENABLE_MEMBERS)
            .features(convert::organization_feature(feature))
            .send()
            .await
            .map_err(|err| classify(&err))?;
        Ok(())
    }

    async fn update_member_detectors(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        account: &AccountId,
        toggles: &[FeatureToggle],
    ) -> Result<(), ProviderError> {
        let mut request = self
            .guardduty(region)
            .update_member_detectors()
            .detector_id(detector.as_str())
            .account_ids(account.as_str());
        for toggle in toggles {
            request = request.features(convert::member_feature(toggle));
        }

        let output = request.send().await.map_err(|err| classify(&err))?;

        member_update_result(
            output
                .unprocessed_accounts()
                .iter()
                .map(|unprocessed| (unprocessed.account_id(), unprocessed.result())),
        )
    }

    async fn update_malware_scan_settings(
        &self,
        region: &RegionName,
        detector: &DetectorId,
        preservation: SnapshotPreservation,
    ) -> Result<(), ProviderError> {
        self.guardduty(region)
            .update_malware_scan_settings()
            .detector_id(detector.as_str())
            .ebs_snapshot_preservation(convert::snapshot_preservation(preservation))
            .send()
            .await
            .map_err(|err| classify(&err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_ids_are_parsed() {
        let raw = vec!["111111111111".to_owned(), " 222222222222 ".to_owned()];

        let ids: Vec<AccountId> = parse_ids(&raw, "account id").unwrap();

        assert_eq!(
            ids,
            vec![AccountId::parse("111111111111").unwrap(), AccountId::parse("222222222222").unwrap()]
        );
    }

    #[test]
    fn malformed_id_fails_the_listing() {
        let raw = vec!["111111111111".to_owned(), "not-an-account".to_owned(), "1234".to_owned()];

        let err = parse_ids::<AccountId>(&raw, "account id").unwrap_err();

        assert_eq!(err.kind(), ProviderErrorKind::MalformedResponse);
        assert!(err.to_string().contains("'not-an-account', '1234'"));
    }

    #[test]
    fn unprocessed_account_is_rejected() {
        let unprocessed = [("111111111111", "The request is rejected because the account is suspended.")];

        let err = member_update_result(unprocessed).unwrap_err();

        assert_eq!(err.kind(), ProviderErrorKind::Rejected);
        assert!(err.to_string().contains("111111111111: The request is rejected"));
    }

    #[test]
    fn no_unprocessed_accounts_is_success() {
        assert_eq!(member_update_result(std::iter::empty::<(&str, &str)>()), Ok(()));
    }

    #[test]
    fn regional_clients_are_cached() {
        let session = SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let api = AwsManagementApi::from_sessions(session.clone(), session, true);

        let us_east = RegionName::parse("us-east-1").unwrap();
        let eu_west = RegionName::parse("eu-west-1").unwrap();
        let _ = api.guardduty(&us_east);
        let _ = api.guardduty(&us_east);
        let eu = api.guardduty(&eu_west);

        assert_eq!(api.clients.lock().len(), 2);
        assert_eq!(eu.config().region(), Some(&Region::new("eu-west-1")));
    }
}
