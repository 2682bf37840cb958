use crate::error::DomainError;
use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// A protection feature of the threat-detection service.
///
/// `Display` and `FromStr` use the provider wire names (`RDS_LOGIN_EVENTS`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum Feature {
    #[serde(rename = "EKS_AUDIT_LOGS")]
    #[strum(serialize = "EKS_AUDIT_LOGS")]
    EksAuditLogs,
    #[serde(rename = "EKS_RUNTIME_MONITORING")]
    #[strum(serialize = "EKS_RUNTIME_MONITORING")]
    EksRuntimeMonitoring,
    #[serde(rename = "S3_DATA_EVENTS")]
    #[strum(serialize = "S3_DATA_EVENTS")]
    S3DataEvents,
    #[serde(rename = "EBS_MALWARE_PROTECTION")]
    #[strum(serialize = "EBS_MALWARE_PROTECTION")]
    EbsMalwareProtection,
    #[serde(rename = "LAMBDA_NETWORK_LOGS")]
    #[strum(serialize = "LAMBDA_NETWORK_LOGS")]
    LambdaNetworkLogs,
    #[serde(rename = "RDS_LOGIN_EVENTS")]
    #[strum(serialize = "RDS_LOGIN_EVENTS")]
    RdsLoginEvents,
}

impl Feature {
    /// Parses a provider wire name.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        raw.trim()
            .parse()
            .map_err(|_| DomainError::UnknownFeature { value: raw.to_owned().into(), context: None })
    }

    /// Sub-features that are configured together with this feature.
    #[must_use]
    pub const fn additional(self) -> &'static [AdditionalFeature] {
        match self {
            Self::EksRuntimeMonitoring => &[AdditionalFeature::EksAddonManagement],
            _ => &[],
        }
    }

    /// Short human-readable description, printed next to the wire name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EksAuditLogs => "container audit logs",
            Self::EksRuntimeMonitoring => "container runtime monitoring",
            Self::S3DataEvents => "object storage data events",
            Self::EbsMalwareProtection => "malware protection",
            Self::LambdaNetworkLogs => "serverless network logs",
            Self::RdsLoginEvents => "database login events",
        }
    }
}

/// Nested configuration carried under a parent [`Feature`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum AdditionalFeature {
    #[serde(rename = "EKS_ADDON_MANAGEMENT")]
    #[strum(serialize = "EKS_ADDON_MANAGEMENT")]
    EksAddonManagement,
}

/// Desired state of a feature on a detector or member.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum FeatureStatus {
    #[serde(rename = "ENABLED")]
    #[strum(serialize = "ENABLED")]
    Enabled,
    #[serde(rename = "DISABLED")]
    #[strum(serialize = "DISABLED")]
    Disabled,
}

/// How long malware-scan snapshots are kept.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum SnapshotPreservation {
    #[serde(rename = "NO_RETENTION")]
    #[strum(serialize = "NO_RETENTION")]
    NoRetention,
    #[serde(rename = "RETENTION_WITH_FINDING")]
    #[strum(serialize = "RETENTION_WITH_FINDING")]
    RetentionWithFinding,
}

/// A (feature, status) pair sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureToggle {
    pub feature: Feature,
    pub status: FeatureStatus,
}

impl FeatureToggle {
    #[must_use]
    pub const fn enabled(feature: Feature) -> Self {
        Self { feature, status: FeatureStatus::Enabled }
    }

    #[must_use]
    pub const fn disabled(feature: Feature) -> Self {
        Self { feature, status: FeatureStatus::Disabled }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self.status, FeatureStatus::Enabled)
    }

    /// Sub-feature toggles; they always follow the parent status.
    pub fn additional(&self) -> impl Iterator<Item = (AdditionalFeature, FeatureStatus)> {
        let status = self.status;
        self.feature.additional().iter().map(move |sub| (*sub, status))
    }
}

bitflags! {
    /// A set of protection features.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FeatureSet: u32 {
        const EKS_AUDIT_LOGS = 1 << 0;
        const EKS_RUNTIME_MONITORING = 1 << 1;
        const S3_DATA_EVENTS = 1 << 2;
        const EBS_MALWARE_PROTECTION = 1 << 3;
        const LAMBDA_NETWORK_LOGS = 1 << 4;
        const RDS_LOGIN_EVENTS = 1 << 5;

        const ALL = Self::EKS_AUDIT_LOGS.bits()
            | Self::EKS_RUNTIME_MONITORING.bits()
            | Self::S3_DATA_EVENTS.bits()
            | Self::EBS_MALWARE_PROTECTION.bits()
            | Self::LAMBDA_NETWORK_LOGS.bits()
            | Self::RDS_LOGIN_EVENTS.bits();
    }
}

impl FeatureSet {
    /// Iterates the contained features in declaration order.
    pub fn features(self) -> impl Iterator<Item = Feature> {
        Feature::iter().filter(move |feature| self.contains(Self::from(*feature)))
    }

    #[must_use]
    pub fn contains_feature(self, feature: Feature) -> bool {
        self.contains(Self::from(feature))
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<Feature> for FeatureSet {
    fn from(feature: Feature) -> Self {
        match feature {
            Feature::EksAuditLogs => Self::EKS_AUDIT_LOGS,
            Feature::EksRuntimeMonitoring => Self::EKS_RUNTIME_MONITORING,
            Feature::S3DataEvents => Self::S3_DATA_EVENTS,
            Feature::EbsMalwareProtection => Self::EBS_MALWARE_PROTECTION,
            Feature::LambdaNetworkLogs => Self::LAMBDA_NETWORK_LOGS,
            Feature::RdsLoginEvents => Self::RDS_LOGIN_EVENTS,
        }
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, feature| set | Self::from(feature))
    }
}

// Serialized as a list of wire names so configuration files stay readable.
impl Serialize for FeatureSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.features())
    }
}

impl<'de> Deserialize<'de> for FeatureSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let features = Vec::<Feature>::deserialize(deserializer)?;
        Ok(features.into_iter().collect())
    }
}
