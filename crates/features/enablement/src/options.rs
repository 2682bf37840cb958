use crate::policy::ExceptionPolicy;
use gdfleet_domain::config::FleetSettings;
use gdfleet_domain::features::{FeatureSet, SnapshotPreservation};
use gdfleet_domain::ids::RegionName;

/// Everything a run needs from the configuration, resolved once.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    pub max_concurrent_regions: usize,
    pub include_regions: Vec<RegionName>,
    pub exclude_regions: Vec<RegionName>,
    pub features: FeatureSet,
    pub malware: Option<SnapshotPreservation>,
    pub policy: ExceptionPolicy,
}

impl RunOptions {
    #[must_use]
    pub fn from_settings(settings: &FleetSettings) -> Self {
        Self {
            dry_run: settings.run.dry_run,
            max_concurrent_regions: settings.run.max_concurrent_regions.max(1),
            include_regions: settings.run.include_regions.clone(),
            exclude_regions: settings.run.exclude_regions.clone(),
            features: settings.run.features,
            malware: settings.malware.snapshot_preservation,
            policy: ExceptionPolicy::from_settings(&settings.exceptions),
        }
    }

    /// An empty include list selects every region; exclusion always wins.
    #[must_use]
    pub fn selects(&self, region: &RegionName) -> bool {
        if self.exclude_regions.contains(region) {
            return false;
        }
        self.include_regions.is_empty() || self.include_regions.contains(region)
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_settings(&FleetSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(name: &str) -> RegionName {
        RegionName::parse(name).unwrap()
    }

    #[test]
    fn defaults_select_everything_sequentially() {
        let options = RunOptions::default();

        assert!(!options.dry_run);
        assert_eq!(options.max_concurrent_regions, 1);
        assert_eq!(options.features, FeatureSet::ALL);
        assert!(options.selects(&region("ap-south-1")));
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        let options = RunOptions {
            include_regions: vec![region("us-east-1"), region("eu-west-1")],
            exclude_regions: vec![region("eu-west-1")],
            ..RunOptions::default()
        };

        assert!(options.selects(&region("us-east-1")));
        assert!(!options.selects(&region("eu-west-1")));
        assert!(!options.selects(&region("ap-south-1")));
    }
}
