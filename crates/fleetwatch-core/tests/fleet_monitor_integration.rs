use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use kameo::actor::Spawn;
use tokio_util::sync::CancellationToken;

use fleetwatch_cloud::{
    InstanceStatus, MOCK_PROVIDER_NAME, MockInstance, MockProvider, ProviderRegistry,
};
use fleetwatch_core::*;

async fn fleet() -> (Arc<MemoryHostStore>, Arc<MockProvider>) {
    let store = Arc::new(MemoryHostStore::new());
    let provider = Arc::new(MockProvider::new());
    let stale = Utc::now() - ChronoDuration::minutes(30);

    let hosts = [
        ("gone", HostStatus::Running, InstanceStatus::Terminated),
        ("healthy", HostStatus::Running, InstanceStatus::Running),
        ("done", HostStatus::Terminated, InstanceStatus::Terminated),
    ];
    for (id, status, instance_status) in hosts {
        let host = Host::new(id, MOCK_PROVIDER_NAME, "ci", status).with_last_communication(stale);
        store.insert(host).await.unwrap();
        provider.set(
            id,
            MockInstance {
                status: instance_status,
                ..MockInstance::default()
            },
        );
    }
    store
        .insert(Host::new("orphan", "ec2", "ci", HostStatus::Running))
        .await
        .unwrap();

    (store, provider)
}

fn monitor_args(
    store: Arc<MemoryHostStore>,
    provider: Arc<MockProvider>,
) -> FleetMonitorActorArgs {
    FleetMonitorActorArgs {
        env: MonitorEnv::new(
            store,
            ProviderRegistry::new().with_provider(provider),
            MonitorConfig {
                workers: 2,
                ..MonitorConfig::default()
            },
        ),
    }
}

#[tokio::test]
async fn test_monitoring_pass_reconciles_active_hosts() {
    let (store, provider) = fleet().await;
    let monitor = FleetMonitorActor::spawn(monitor_args(store.clone(), provider.clone()));

    let report = monitor.ask(RunMonitoringPass::default()).await.unwrap();

    assert_eq!(
        report,
        PassReport {
            checked: 3,
            transitioned: 1,
            unchanged: 1,
            conflicts: 0,
            failed: 1,
            cancelled: 0,
        }
    );
    assert_eq!(
        store.find_one("gone").await.unwrap().unwrap().status,
        HostStatus::Terminated
    );
    assert_eq!(
        store.find_one("healthy").await.unwrap().unwrap().status,
        HostStatus::Running
    );
    // Terminated hosts are not even queried
    assert_eq!(provider.status_queries(), 2);

    let status = monitor.ask(GetFleetStatus).await.unwrap();
    assert_eq!(status.passes, 1);
    assert_eq!(status.jobs_started, 3);
    assert_eq!(status.last_report, Some(report));

    monitor.stop_gracefully().await.unwrap();
}

#[tokio::test]
async fn test_second_pass_finds_nothing_to_change() {
    let (store, provider) = fleet().await;
    let monitor = FleetMonitorActor::spawn(monitor_args(store.clone(), provider));

    monitor.ask(RunMonitoringPass::default()).await.unwrap();
    let second = monitor.ask(RunMonitoringPass::default()).await.unwrap();

    assert_eq!(second.checked, 2);
    assert_eq!(second.transitioned, 0);
    assert_eq!(store.write_count(), 1);

    monitor.stop_gracefully().await.unwrap();
}

#[tokio::test]
async fn test_cancelled_pass_changes_nothing() {
    let (store, provider) = fleet().await;
    let monitor = FleetMonitorActor::spawn(monitor_args(store.clone(), provider));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = monitor.ask(RunMonitoringPass { cancel }).await.unwrap();

    assert_eq!(report.checked, 3);
    assert_eq!(report.cancelled, 3);
    assert_eq!(store.write_count(), 0);

    monitor.stop_gracefully().await.unwrap();
}
