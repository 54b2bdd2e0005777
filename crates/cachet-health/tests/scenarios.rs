//! End-to-end lifecycle scenarios.
//!
//! Drives real monitors cycle by cycle with a switchable mock probe against
//! an in-memory status page, and checks the external effects.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cachet_api::{Call, FakeStatusPage};
use cachet_core::{CheckKind, ComponentStatus, Incident, IncidentStatus, MonitorConfig};
use cachet_health::{MockProbe, Monitor, TickReport, Transition, Verdict};

fn config(history_size: i64) -> MonitorConfig {
    MonitorConfig {
        name: "api".to_string(),
        kind: CheckKind::Mock,
        component_id: 1,
        history_size,
        ..Default::default()
    }
}

async fn start(
    config: MonitorConfig,
    status: ComponentStatus,
) -> (Monitor, Arc<FakeStatusPage>, Arc<AtomicBool>) {
    let fake = Arc::new(FakeStatusPage::new(1, status));
    let probe = MockProbe::new(true);
    let switch = probe.handle();
    let mut monitor = Monitor::with_probe(config, Box::new(probe), fake.clone()).unwrap();
    monitor.init().await.unwrap();
    (monitor, fake, switch)
}

async fn feed(monitor: &mut Monitor, switch: &AtomicBool, outcomes: &[bool]) -> Vec<TickReport> {
    let mut reports = Vec::new();
    for &up in outcomes {
        switch.store(up, Ordering::SeqCst);
        reports.push(monitor.tick().await.unwrap());
    }
    reports
}

#[tokio::test]
async fn scenario_a_and_b_open_then_resolve() {
    let mut cfg = config(3);
    cfg.threshold = 50;
    let (mut monitor, fake, switch) = start(cfg, ComponentStatus::Operational).await;

    let reports = feed(&mut monitor, &switch, &[true, true, true]).await;
    let transitions: Vec<_> = reports.iter().map(|r| r.transition).collect();
    assert_eq!(
        transitions,
        vec![Transition::Accumulating, Transition::Healthy, Transition::Healthy]
    );
    assert!(monitor.state().incident.is_none());
    assert!(fake.sent_incidents().is_empty());

    // The 50% threshold is clamped to the window size, so 3%: the first down
    // (33%) already opens the incident.
    let reports = feed(&mut monitor, &switch, &[false, false, true]).await;
    let percents: Vec<_> = reports.iter().map(|r| r.classification.down_percent).collect();
    assert_eq!(percents, vec![33, 66, 66]);
    let transitions: Vec<_> = reports.iter().map(|r| r.transition).collect();
    assert_eq!(
        transitions,
        vec![
            Transition::Opened(ComponentStatus::MajorOutage),
            Transition::Steady,
            Transition::Steady,
        ]
    );
    let last = reports.last().unwrap();
    assert_eq!(monitor.state().window.iter().collect::<Vec<_>>(), vec![false, false, true]);
    assert_eq!(last.classification.down_percent, 66);
    assert!(last.classification.verdict.is_triggered());

    let sent = fake.sent_incidents();
    assert_eq!(sent.len(), 1, "exactly one incident while down");
    assert_eq!(sent[0].component_status, ComponentStatus::MajorOutage);
    assert_eq!(sent[0].status, IncidentStatus::Investigating);
    assert_eq!(fake.status(), ComponentStatus::MajorOutage);
    assert!(monitor.state().incident.is_some());

    let reports = feed(&mut monitor, &switch, &[true, true, true]).await;
    let transitions: Vec<_> = reports.iter().map(|r| r.transition).collect();
    assert_eq!(
        transitions,
        vec![
            Transition::Steady,
            Transition::Resolved(Some(1)),
            Transition::Healthy,
        ]
    );

    let sent = fake.sent_incidents();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].status, IncidentStatus::Fixed);
    assert_eq!(sent[1].id, Some(1));
    assert!(monitor.state().incident.is_none());
    assert!(monitor.state().last_failure.is_none());
    assert_eq!(fake.status(), ComponentStatus::Operational);
}

#[tokio::test]
async fn percent_threshold_is_clamped_to_history_size() {
    let mut cfg = config(3);
    cfg.threshold = 50;
    let (mut monitor, fake, switch) = start(cfg, ComponentStatus::Operational).await;
    assert_eq!(monitor.thresholds().plain.percent, 3);

    let reports = feed(&mut monitor, &switch, &[true, false]).await;
    assert_eq!(reports[0].transition, Transition::Accumulating);
    assert_eq!(reports[1].classification.down_percent, 33);
    assert_eq!(reports[1].transition, Transition::Opened(ComponentStatus::MajorOutage));
    assert_eq!(fake.sent_incidents().len(), 1);
}

#[tokio::test]
async fn scenario_c_partial_beats_critical() {
    let mut cfg = config(3);
    cfg.threshold_critical_count = 2;
    cfg.threshold_partial_count = 1;
    let (mut monitor, fake, switch) = start(cfg, ComponentStatus::Operational).await;

    let reports = feed(&mut monitor, &switch, &[true, false]).await;
    let last = reports.last().unwrap();
    assert_eq!(last.classification.down_count, 1);
    assert_eq!(last.classification.verdict, Verdict::Partial);
    assert_eq!(last.transition, Transition::Opened(ComponentStatus::PartialOutage));

    let sent = fake.sent_incidents();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].component_status, ComponentStatus::PartialOutage);
    assert_eq!(fake.status(), ComponentStatus::PartialOutage);

    // A second down escalates the component, not the incident count.
    let reports = feed(&mut monitor, &switch, &[false]).await;
    assert_eq!(
        reports[0].transition,
        Transition::Reissued(ComponentStatus::MajorOutage)
    );
    assert_eq!(fake.sent_incidents().len(), 1);
    assert_eq!(fake.status(), ComponentStatus::MajorOutage);
}

#[tokio::test]
async fn scenario_d_drift_is_reset_once() {
    let (mut monitor, fake, switch) = start(config(3), ComponentStatus::MajorOutage).await;

    let reports = feed(&mut monitor, &switch, &[true, true, true, true]).await;
    let transitions: Vec<_> = reports.iter().map(|r| r.transition).collect();
    assert_eq!(
        transitions,
        vec![
            Transition::Accumulating,
            Transition::StatusReset,
            Transition::Healthy,
            Transition::Healthy,
        ]
    );
    assert_eq!(fake.status_updates(), vec![ComponentStatus::Operational]);
    assert!(fake.sent_incidents().is_empty());
}

#[tokio::test]
async fn all_up_run_is_idempotent() {
    let (mut monitor, fake, switch) = start(config(5), ComponentStatus::Operational).await;

    feed(&mut monitor, &switch, &[true; 20]).await;
    assert!(fake.status_updates().is_empty());
    assert!(fake.sent_incidents().is_empty());
    assert_eq!(monitor.state().window.len(), 5);
}

#[tokio::test]
async fn default_threshold_needs_fully_down_window() {
    let (mut monitor, fake, switch) = start(config(3), ComponentStatus::Operational).await;

    feed(&mut monitor, &switch, &[false, false]).await;
    assert!(fake.sent_incidents().is_empty());

    let reports = feed(&mut monitor, &switch, &[false]).await;
    assert_eq!(reports[0].classification.down_percent, 100);
    assert_eq!(reports[0].transition, Transition::Opened(ComponentStatus::MajorOutage));
}

#[tokio::test]
async fn resync_picks_up_manual_edit() {
    let mut cfg = config(2);
    cfg.threshold_count = 1;
    cfg.resync = 1;
    let (mut monitor, fake, switch) = start(cfg, ComponentStatus::Operational).await;

    let reports = feed(&mut monitor, &switch, &[false]).await;
    assert_eq!(reports[0].transition, Transition::Opened(ComponentStatus::MajorOutage));

    // An operator flips the component back by hand.
    fake.set_status(ComponentStatus::Operational);
    let reports = feed(&mut monitor, &switch, &[false, false]).await;
    assert_eq!(reports[0].transition, Transition::Steady);
    assert_eq!(
        reports[1].transition,
        Transition::Reissued(ComponentStatus::MajorOutage)
    );
    assert_eq!(fake.status(), ComponentStatus::MajorOutage);
    assert_eq!(fake.sent_incidents().len(), 1);
}

#[tokio::test]
async fn open_incident_survives_restart() {
    let fake = Arc::new(FakeStatusPage::new(1, ComponentStatus::MajorOutage));
    let mut open = Incident::new(
        1,
        "api is down".to_string(),
        String::new(),
        ComponentStatus::MajorOutage,
    );
    open.id = Some(42);
    fake.set_open_incident(Some(open));

    let probe = MockProbe::new(true);
    let mut monitor = Monitor::with_probe(config(2), Box::new(probe), fake.clone()).unwrap();
    monitor.init().await.unwrap();
    assert_eq!(monitor.state().incident.as_ref().and_then(|i| i.id), Some(42));

    let report = monitor.tick().await.unwrap();
    assert_eq!(report.transition, Transition::Resolved(Some(42)));
    assert!(fake.open_incident().is_none());
    assert!(!fake.calls().contains(&Call::SetComponentStatus(1, ComponentStatus::Operational)));
}
