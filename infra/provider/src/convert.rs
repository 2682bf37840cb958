//! Domain values to SDK request shapes.

use aws_sdk_guardduty::types::{
    AutoEnableMembers, DetectorAdditionalConfiguration, DetectorFeature,
    DetectorFeatureConfiguration, EbsSnapshotPreservation, FeatureAdditionalConfiguration,
    FeatureStatus as SdkFeatureStatus, MemberAdditionalConfiguration,
    MemberFeaturesConfiguration, OrgFeature, OrgFeatureAdditionalConfiguration, OrgFeatureStatus,
    OrganizationAdditionalConfiguration, OrganizationFeatureConfiguration,
};
use gdfleet_domain::features::{
    AdditionalFeature, Feature, FeatureStatus, FeatureToggle, SnapshotPreservation,
};

/// Every organization update auto-enables for accounts that join later only.
pub(crate) const AUTO_ENABLE_MEMBERS: AutoEnableMembers = AutoEnableMembers::New;

fn status(status: FeatureStatus) -> SdkFeatureStatus {
    match status {
        FeatureStatus::Enabled => SdkFeatureStatus::Enabled,
        FeatureStatus::Disabled => SdkFeatureStatus::Disabled,
    }
}

fn wire(feature: Feature) -> &'static str {
    feature.into()
}

fn additional_wire(feature: AdditionalFeature) -> &'static str {
    feature.into()
}

pub(crate) fn detector_feature(toggle: &FeatureToggle) -> DetectorFeatureConfiguration {
    let mut builder = DetectorFeatureConfiguration::builder()
        .name(DetectorFeature::from(wire(toggle.feature)))
        .status(status(toggle.status));
    for (sub, sub_status) in toggle.additional() {
        builder = builder.additional_configuration(
            DetectorAdditionalConfiguration::builder()
                .name(FeatureAdditionalConfiguration::from(additional_wire(sub)))
                .status(status(sub_status))
                .build(),
        );
    }
    builder.build()
}

pub(crate) fn organization_feature(feature: Feature) -> OrganizationFeatureConfiguration {
    let mut builder = OrganizationFeatureConfiguration::builder()
        .name(OrgFeature::from(wire(feature)))
        .auto_enable(OrgFeatureStatus::New);
    for sub in feature.additional() {
        builder = builder.additional_configuration(
            OrganizationAdditionalConfiguration::builder()
                .name(OrgFeatureAdditionalConfiguration::from(additional_wire(*sub)))
                .auto_enable(OrgFeatureStatus::New)
                .build(),
        );
    }
    builder.build()
}

pub(crate) fn member_feature(toggle: &FeatureToggle) -> MemberFeaturesConfiguration {
    let mut builder = MemberFeaturesConfiguration::builder()
        .name(OrgFeature::from(wire(toggle.feature)))
        .status(status(toggle.status));
    for (sub, sub_status) in toggle.additional() {
        builder = builder.additional_configuration(
            MemberAdditionalConfiguration::builder()
                .name(OrgFeatureAdditionalConfiguration::from(additional_wire(sub)))
                .status(status(sub_status))
                .build(),
        );
    }
    builder.build()
}

pub(crate) fn snapshot_preservation(value: SnapshotPreservation) -> EbsSnapshotPreservation {
    match value {
        SnapshotPreservation::NoRetention => EbsSnapshotPreservation::NoRetention,
        SnapshotPreservation::RetentionWithFinding => EbsSnapshotPreservation::RetentionWithFinding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdfleet_domain::features::FeatureSet;

    #[test]
    fn detector_feature_carries_wire_name_and_status() {
        let config = detector_feature(&FeatureToggle::enabled(Feature::RdsLoginEvents));

        assert_eq!(config.name().map(DetectorFeature::as_str), Some("RDS_LOGIN_EVENTS"));
        assert_eq!(config.status(), Some(&SdkFeatureStatus::Enabled));
        assert!(config.additional_configuration().is_empty());
    }

    #[test]
    fn disabled_runtime_monitoring_disables_addon() {
        let config = member_feature(&FeatureToggle::disabled(Feature::EksRuntimeMonitoring));

        assert_eq!(config.name().map(OrgFeature::as_str), Some("EKS_RUNTIME_MONITORING"));
        assert_eq!(config.status(), Some(&SdkFeatureStatus::Disabled));

        let addons = config.additional_configuration();
        assert_eq!(addons.len(), 1);
        assert_eq!(
            addons[0].name().map(OrgFeatureAdditionalConfiguration::as_str),
            Some("EKS_ADDON_MANAGEMENT")
        );
        assert_eq!(addons[0].status(), Some(&SdkFeatureStatus::Disabled));
    }

    #[test]
    fn organization_feature_auto_enables_new_accounts() {
        let config = organization_feature(Feature::EksRuntimeMonitoring);

        assert_eq!(config.auto_enable(), Some(&OrgFeatureStatus::New));
        assert_eq!(config.additional_configuration()[0].auto_enable(), Some(&OrgFeatureStatus::New));
    }

    #[test]
    fn every_feature_maps_to_a_known_sdk_value() {
        for feature in FeatureSet::ALL.features() {
            assert!(DetectorFeature::values().contains(&wire(feature)), "{feature}");
            assert!(OrgFeature::values().contains(&wire(feature)), "{feature}");
        }
    }
}
