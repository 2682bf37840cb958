//! Member exception policy.
//!
//! A member is excepted for the policy feature in a region iff at least one
//! exception entry names both that account and that region. Duplicate entries
//! collapse into one; entries matching only the account or only the region
//! never apply.

use fxhash::{FxHashMap, FxHashSet};
use gdfleet_domain::config::{ExceptionEntry, ExceptionSettings};
use gdfleet_domain::features::{Feature, FeatureSet, FeatureToggle};
use gdfleet_domain::ids::{AccountId, RegionName};

/// Which members receive the policy feature disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExceptionPolicy {
    /// Every member gets every feature enabled.
    #[default]
    Disabled,
    /// Listed (region, account) pairs get `feature` disabled.
    Active { feature: Feature, members: FxHashMap<RegionName, FxHashSet<AccountId>> },
}

impl ExceptionPolicy {
    /// Builds a policy from entries. An empty list yields [`ExceptionPolicy::Disabled`].
    pub fn new(feature: Feature, entries: impl IntoIterator<Item = ExceptionEntry>) -> Self {
        let mut members: FxHashMap<RegionName, FxHashSet<AccountId>> = FxHashMap::default();
        for entry in entries {
            members.entry(entry.region).or_default().insert(entry.account_id);
        }

        if members.is_empty() { Self::Disabled } else { Self::Active { feature, members } }
    }

    /// Builds the policy from settings. A switched-off policy ignores any leftover entries.
    #[must_use]
    pub fn from_settings(settings: &ExceptionSettings) -> Self {
        if !settings.enabled {
            return Self::Disabled;
        }
        Self::new(settings.feature, settings.entries.iter().cloned())
    }

    /// The feature subject to exceptions, if the policy is active.
    #[must_use]
    pub const fn feature(&self) -> Option<Feature> {
        match self {
            Self::Disabled => None,
            Self::Active { feature, .. } => Some(*feature),
        }
    }

    /// Number of distinct (region, account) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Disabled => 0,
            Self::Active { members, .. } => members.values().map(FxHashSet::len).sum(),
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Whether `account` is listed for `region`, regardless of feature.
    #[must_use]
    pub fn is_excepted(&self, region: &RegionName, account: &AccountId) -> bool {
        match self {
            Self::Disabled => false,
            Self::Active { members, .. } => {
                members.get(region).is_some_and(|accounts| accounts.contains(account))
            },
        }
    }

    /// Status `feature` must take for `account` in `region`.
    #[must_use]
    pub fn toggle_for(
        &self,
        feature: Feature,
        region: &RegionName,
        account: &AccountId,
    ) -> FeatureToggle {
        if self.feature() == Some(feature) && self.is_excepted(region, account) {
            FeatureToggle::disabled(feature)
        } else {
            FeatureToggle::enabled(feature)
        }
    }

    /// Entries grouped for display, sorted by region then account.
    #[must_use]
    pub fn entries(&self) -> Vec<ExceptionEntry> {
        let Self::Active { members, .. } = self else {
            return Vec::new();
        };

        let mut entries: Vec<ExceptionEntry> = members
            .iter()
            .flat_map(|(region, accounts)| {
                accounts.iter().map(|account| ExceptionEntry {
                    account_id: account.clone(),
                    region: region.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| (&a.region, &a.account_id).cmp(&(&b.region, &b.account_id)));
        entries
    }
}

/// Resolves the toggles one member receives in one region.
#[must_use]
pub fn resolve_member_features(
    features: FeatureSet,
    policy: &ExceptionPolicy,
    region: &RegionName,
    account: &AccountId,
) -> Vec<FeatureToggle> {
    features.features().map(|feature| policy.toggle_for(feature, region, account)).collect()
}
