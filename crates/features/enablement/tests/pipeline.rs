pub mod fixtures;

use fixtures::*;
use gdfleet_domain::config::ExceptionEntry;
use gdfleet_domain::features::{Feature, FeatureSet, FeatureStatus, FeatureToggle, SnapshotPreservation};
use gdfleet_enablement::{
    EnablementError, ExceptionPolicy, FleetRunner, Outcome, ProviderErrorKind, RunOptions, UnitScope,
    plan_region,
};
use std::sync::Arc;
use std::time::Duration;

fn options_with_exception(account_id: &str, region_name: &str) -> RunOptions {
    RunOptions {
        policy: ExceptionPolicy::new(
            Feature::EksRuntimeMonitoring,
            [ExceptionEntry { account_id: account(account_id), region: region(region_name) }],
        ),
        ..RunOptions::default()
    }
}

fn status_of(toggles: &[FeatureToggle], feature: Feature) -> FeatureStatus {
    toggles.iter().find(|t| t.feature == feature).map(|t| t.status).unwrap()
}

#[tokio::test]
async fn excepted_member_gets_runtime_monitoring_disabled() {
    let fleet = Arc::new(FakeFleet::new().with_region("us-east-1", &["111111111111", "222222222222"]));
    let runner = FleetRunner::new(Arc::clone(&fleet), options_with_exception("111111111111", "us-east-1"));

    let report = runner.run().await.unwrap();
    assert!(report.is_success());

    let members = fleet.member_updates("us-east-1");
    let excepted = &members[&account("111111111111")];
    let regular = &members[&account("222222222222")];

    assert_eq!(status_of(excepted, Feature::EksRuntimeMonitoring), FeatureStatus::Disabled);
    assert_eq!(status_of(regular, Feature::EksRuntimeMonitoring), FeatureStatus::Enabled);
    for feature in FeatureSet::ALL.features().filter(|f| *f != Feature::EksRuntimeMonitoring) {
        assert_eq!(status_of(excepted, feature), FeatureStatus::Enabled, "{feature}");
        assert_eq!(status_of(regular, feature), FeatureStatus::Enabled, "{feature}");
    }
}

#[tokio::test]
async fn exception_does_not_apply_in_other_region() {
    let fleet = Arc::new(FakeFleet::new().with_region("eu-west-1", &["111111111111"]));
    let runner = FleetRunner::new(Arc::clone(&fleet), options_with_exception("111111111111", "us-east-1"));

    runner.run().await.unwrap();

    let members = fleet.member_updates("eu-west-1");
    assert!(members[&account("111111111111")].iter().all(FeatureToggle::is_enabled));
}

#[tokio::test]
async fn detector_and_organization_receive_every_feature() {
    let fleet = Arc::new(FakeFleet::new().with_region("us-east-1", &["111111111111"]));
    let runner = FleetRunner::new(Arc::clone(&fleet), options_with_exception("111111111111", "us-east-1"));

    let report = runner.run().await.unwrap();

    let updates = fleet.updates();
    let detector_features: Vec<Feature> = updates
        .iter()
        .filter_map(|call| match call {
            Call::UpdateDetector(_, _, toggle) => {
                assert!(toggle.is_enabled());
                Some(toggle.feature)
            },
            _ => None,
        })
        .collect();
    let org_features: Vec<Feature> = updates
        .iter()
        .filter_map(|call| match call {
            Call::UpdateOrganization(_, _, feature) => Some(*feature),
            _ => None,
        })
        .collect();

    let all: Vec<Feature> = FeatureSet::ALL.features().collect();
    assert_eq!(detector_features, all);
    assert_eq!(org_features, all);

    // 6 detector + 6 organization + 1 member unit
    assert_eq!(report.summary.applied, 13);
    assert_eq!(report.summary.failed, 0);
}

#[tokio::test]
async fn failed_member_does_not_stop_siblings() {
    let fleet = Arc::new(
        FakeFleet::new()
            .with_region("us-east-1", &["111111111111", "222222222222", "333333333333"])
            .with_region("eu-west-1", &["444444444444"])
            .failing(FailPoint::Member(region("us-east-1"), account("222222222222")), ProviderErrorKind::AccessDenied),
    );
    let runner = FleetRunner::new(Arc::clone(&fleet), RunOptions::default());

    let report = runner.run().await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.summary.failed, 1);

    let failure = report.failures().next().unwrap();
    assert_eq!(failure.scope, UnitScope::MemberFeatures);
    assert_eq!(failure.account, Some(account("222222222222")));
    assert!(matches!(failure.outcome, Outcome::Failed { kind: ProviderErrorKind::AccessDenied, .. }));

    assert!(fleet.member_updates("us-east-1").contains_key(&account("333333333333")));
    assert!(fleet.member_updates("eu-west-1").contains_key(&account("444444444444")));
}

#[tokio::test]
async fn failed_detector_feature_does_not_stop_the_others() {
    let fleet = Arc::new(
        FakeFleet::new()
            .with_region("us-east-1", &["111111111111"])
            .failing(
                FailPoint::DetectorFeature(region("us-east-1"), Feature::S3DataEvents),
                ProviderErrorKind::Throttled,
            ),
    );
    let runner = FleetRunner::new(Arc::clone(&fleet), RunOptions::default());

    let report = runner.run().await.unwrap();

    assert_eq!(report.summary.failed, 1);
    let failure = report.failures().next().unwrap();
    assert_eq!(failure.scope, UnitScope::DetectorFeature);
    assert_eq!(failure.toggles, vec![FeatureToggle::enabled(Feature::S3DataEvents)]);

    let detector_calls =
        fleet.updates().iter().filter(|call| matches!(call, Call::UpdateDetector(..))).count();
    assert_eq!(detector_calls, FeatureSet::ALL.features().count());
    assert_eq!(fleet.member_updates("us-east-1").len(), 1);
}

#[tokio::test]
async fn detector_discovery_failure_is_recorded_per_region() {
    let fleet = Arc::new(
        FakeFleet::new()
            .with_region("us-east-1", &["111111111111"])
            .with_region("eu-west-1", &["222222222222"])
            .failing(FailPoint::Detectors(region("us-east-1")), ProviderErrorKind::AccessDenied),
    );
    let runner = FleetRunner::new(Arc::clone(&fleet), RunOptions::default());

    let report = runner.run().await.unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].scope, UnitScope::DetectorDiscovery);
    assert_eq!(failures[0].region, region("us-east-1"));

    assert!(fleet.member_updates("us-east-1").is_empty());
    assert_eq!(fleet.member_updates("eu-west-1").len(), 1);
}

#[tokio::test]
async fn member_discovery_failure_keeps_detector_changes() {
    let fleet = Arc::new(
        FakeFleet::new()
            .with_region("us-east-1", &["111111111111"])
            .failing(FailPoint::Members(region("us-east-1")), ProviderErrorKind::Transport),
    );
    let options = RunOptions::default();

    let plan = plan_region(fleet.as_ref(), &region("us-east-1"), &options).await;

    assert_eq!(plan.failures.len(), 1);
    assert_eq!(plan.failures[0].scope, UnitScope::MemberDiscovery);
    assert_eq!(plan.failures[0].detector, Some(detector("det-us-east-1")));
    assert_eq!(plan.detectors.len(), 1);
    assert!(plan.detectors[0].members.is_empty());
    assert_eq!(plan.detectors[0].toggles.len(), FeatureSet::ALL.features().count());
}

#[tokio::test]
async fn unparseable_member_listing_fails_the_run() {
    let fleet = Arc::new(
        FakeFleet::new()
            .with_region("us-east-1", &["111111111111"])
            .with_region("eu-west-1", &["222222222222"])
            .failing(FailPoint::Members(region("us-east-1")), ProviderErrorKind::MalformedResponse),
    );
    let runner = FleetRunner::new(Arc::clone(&fleet), RunOptions::default());

    let report = runner.run().await.unwrap();

    assert!(!report.is_success());
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].scope, UnitScope::MemberDiscovery);
    assert!(matches!(
        failures[0].outcome,
        Outcome::Failed { kind: ProviderErrorKind::MalformedResponse, .. }
    ));
    assert!(fleet.member_updates("us-east-1").is_empty());
    assert_eq!(fleet.member_updates("eu-west-1").len(), 1);
}

#[tokio::test]
async fn region_enumeration_failure_is_fatal() {
    let fleet = Arc::new(
        FakeFleet::new()
            .with_region("us-east-1", &["111111111111"])
            .failing(FailPoint::Regions, ProviderErrorKind::AccessDenied),
    );
    let runner = FleetRunner::new(Arc::clone(&fleet), RunOptions::default());

    let err = runner.run().await.unwrap_err();

    assert!(matches!(&err, EnablementError::Provider { source, .. } if source.kind() == ProviderErrorKind::AccessDenied));
    assert!(err.to_string().contains("Failed to enumerate regions"));
    assert_eq!(fleet.calls(), vec![Call::ListRegions]);
}

#[tokio::test]
async fn dry_run_issues_no_updates() {
    let fleet = Arc::new(
        FakeFleet::new()
            .with_region("us-east-1", &["111111111111", "222222222222"])
            .with_region("eu-west-1", &["333333333333"]),
    );
    let options = RunOptions {
        dry_run: true,
        malware: Some(SnapshotPreservation::RetentionWithFinding),
        ..options_with_exception("111111111111", "us-east-1")
    };
    let runner = FleetRunner::new(Arc::clone(&fleet), options);

    let report = runner.run().await.unwrap();

    assert!(fleet.updates().is_empty());
    assert!(report.dry_run);
    assert!(report.is_success());
    assert_eq!(report.summary.applied, 0);
    // per region: 6 detector + 6 organization + 1 malware, plus one unit per member
    assert_eq!(report.summary.planned, 2 * 13 + 3);
    assert!(report.units.iter().all(|unit| unit.outcome == Outcome::Planned));

    let excepted = report
        .units
        .iter()
        .find(|unit| unit.account == Some(account("111111111111")))
        .unwrap();
    assert_eq!(status_of(&excepted.toggles, Feature::EksRuntimeMonitoring), FeatureStatus::Disabled);
}

#[tokio::test]
async fn region_filters_limit_the_run() {
    let fleet = Arc::new(
        FakeFleet::new()
            .with_region("us-east-1", &["111111111111"])
            .with_region("eu-west-1", &["222222222222"])
            .with_region("ap-south-1", &["333333333333"]),
    );
    let options = RunOptions {
        include_regions: vec![region("us-east-1"), region("eu-west-1")],
        exclude_regions: vec![region("eu-west-1")],
        ..RunOptions::default()
    };
    let runner = FleetRunner::new(Arc::clone(&fleet), options);

    let report = runner.run().await.unwrap();

    assert_eq!(report.regions, vec![region("us-east-1")]);
    assert!(!fleet.calls().contains(&Call::ListDetectors(region("eu-west-1"))));
    assert!(!fleet.calls().contains(&Call::ListDetectors(region("ap-south-1"))));
}

#[tokio::test]
async fn malware_settings_follow_configuration() {
    let fleet = Arc::new(FakeFleet::new().with_region("us-east-1", &[]));
    let options =
        RunOptions { malware: Some(SnapshotPreservation::NoRetention), ..RunOptions::default() };

    FleetRunner::new(Arc::clone(&fleet), options).run().await.unwrap();

    let malware: Vec<_> =
        fleet.updates().into_iter().filter(|call| matches!(call, Call::UpdateMalware(..))).collect();
    assert_eq!(
        malware,
        vec![Call::UpdateMalware(
            region("us-east-1"),
            detector("det-us-east-1"),
            SnapshotPreservation::NoRetention
        )]
    );

    let fleet = Arc::new(FakeFleet::new().with_region("us-east-1", &[]));
    FleetRunner::new(Arc::clone(&fleet), RunOptions::default()).run().await.unwrap();
    assert!(!fleet.calls().iter().any(|call| matches!(call, Call::UpdateMalware(..))));
}

#[tokio::test]
async fn selected_features_only() {
    let fleet = Arc::new(FakeFleet::new().with_region("us-east-1", &["111111111111"]));
    let options = RunOptions { features: FeatureSet::RDS_LOGIN_EVENTS, ..RunOptions::default() };

    FleetRunner::new(Arc::clone(&fleet), options).run().await.unwrap();

    assert_eq!(
        fleet.updates(),
        vec![
            Call::UpdateDetector(
                region("us-east-1"),
                detector("det-us-east-1"),
                FeatureToggle::enabled(Feature::RdsLoginEvents)
            ),
            Call::UpdateOrganization(region("us-east-1"), detector("det-us-east-1"), Feature::RdsLoginEvents),
            Call::UpdateMembers(
                region("us-east-1"),
                detector("det-us-east-1"),
                account("111111111111"),
                vec![FeatureToggle::enabled(Feature::RdsLoginEvents)]
            ),
        ]
    );
}

#[tokio::test]
async fn region_without_detector_is_reported_empty() {
    let fleet = Arc::new(FakeFleet::new().with_empty_region("sa-east-1"));

    let report = FleetRunner::new(Arc::clone(&fleet), RunOptions::default()).run().await.unwrap();

    assert_eq!(report.regions, vec![region("sa-east-1")]);
    assert!(report.units.is_empty());
    assert!(report.is_success());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn report_follows_enumeration_order_under_concurrency() {
    let fleet = Arc::new(
        FakeFleet::new()
            .with_region("us-east-1", &["111111111111"])
            .with_region("eu-west-1", &["222222222222"])
            .with_region("ap-south-1", &["333333333333"])
            .with_delay("us-east-1", Duration::from_millis(60))
            .with_delay("eu-west-1", Duration::from_millis(30)),
    );
    let options = RunOptions { max_concurrent_regions: 3, ..RunOptions::default() };

    let report = FleetRunner::new(Arc::clone(&fleet), options).run().await.unwrap();

    assert_eq!(report.regions, vec![region("us-east-1"), region("eu-west-1"), region("ap-south-1")]);
    let unit_regions: Vec<_> = report.units.iter().map(|unit| unit.region.clone()).collect();
    let mut sorted = unit_regions.clone();
    sorted.sort_by_key(|r| report.regions.iter().position(|x| x == r));
    assert_eq!(unit_regions, sorted);
    assert!(fleet.peak_in_flight() > 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_limit_is_respected() {
    let fleet = Arc::new(
        FakeFleet::new()
            .with_region("us-east-1", &[])
            .with_region("eu-west-1", &[])
            .with_region("ap-south-1", &[])
            .with_delay("us-east-1", Duration::from_millis(20))
            .with_delay("eu-west-1", Duration::from_millis(20))
            .with_delay("ap-south-1", Duration::from_millis(20)),
    );

    FleetRunner::new(Arc::clone(&fleet), RunOptions::default()).run().await.unwrap();

    assert_eq!(fleet.peak_in_flight(), 1);
}
