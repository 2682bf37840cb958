use crate::features::{Feature, FeatureSet, SnapshotPreservation};
use crate::ids::{AccountId, RegionName};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level settings read from the configuration file.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetSettings {
    pub logging: LoggingSettings,
    pub provider: ProviderSettings,
    pub run: RunSettings,
    pub malware: MalwareSettings,
    pub exceptions: ExceptionSettings,
}

/// Immutable, Arc-wrapped settings handed to every stage of a run.
#[derive(Default, Debug, Clone)]
pub struct FleetConfig {
    inner: Arc<FleetSettings>,
}

impl FleetConfig {
    #[must_use]
    pub fn new(settings: FleetSettings) -> Self {
        Self { inner: Arc::new(settings) }
    }
}

impl From<FleetSettings> for FleetConfig {
    fn from(settings: FleetSettings) -> Self {
        Self::new(settings)
    }
}

impl Deref for FleetConfig {
    type Target = FleetSettings;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Console and file logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub console: bool,
    pub directory: Option<PathBuf>,
    pub json: bool,
    pub max_files: usize,
}

/// Provider sessions.
///
/// `profile` and `region` describe the bootstrap session used to enumerate
/// regions. `admin_profile` is the delegated administrator used for every
/// regional call; it falls back to `profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub profile: Option<String>,
    pub admin_profile: Option<String>,
    pub region: Option<RegionName>,
    pub max_attempts: u32,
    pub only_associated_members: bool,
}

/// Scope and pacing of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub dry_run: bool,
    pub max_concurrent_regions: usize,
    pub include_regions: Vec<RegionName>,
    pub exclude_regions: Vec<RegionName>,
    pub features: FeatureSet,
}

/// Malware scan settings applied once per detector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MalwareSettings {
    pub snapshot_preservation: Option<SnapshotPreservation>,
}

/// Per-member exception list for a single feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExceptionSettings {
    pub enabled: bool,
    pub feature: Feature,
    pub entries: Vec<ExceptionEntry>,
}

/// A member that receives the feature disabled in one region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExceptionEntry {
    pub account_id: AccountId,
    pub region: RegionName,
}

// --- Default ---

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_owned(), console: true, directory: None, json: false, max_files: 10 }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            profile: None,
            admin_profile: None,
            region: None,
            max_attempts: 3,
            only_associated_members: true,
        }
    }
}

impl ProviderSettings {
    /// Profile used for regional calls.
    #[must_use]
    pub fn effective_admin_profile(&self) -> Option<&str> {
        self.admin_profile.as_deref().or(self.profile.as_deref())
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_concurrent_regions: 1,
            include_regions: Vec::new(),
            exclude_regions: Vec::new(),
            features: FeatureSet::ALL,
        }
    }
}

impl Default for ExceptionSettings {
    fn default() -> Self {
        Self { enabled: true, feature: Feature::EksRuntimeMonitoring, entries: Vec::new() }
    }
}
