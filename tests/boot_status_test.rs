//! Integration tests for the boot-status proxy.
//!
//! These tests validate:
//! 1. `bootup` instantiation accepts only `true`
//! 2. The latch satisfies pending requirements once per boot cycle
//! 3. Transient failures are retried after the fixed delay
//! 4. Permanent failures end the subscription until the next enable
//! 5. Disable cancels both open calls and pending retries
//!
//! Tests run on paused tokio time so the retry delay is virtual.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use prometheus_activity_manager::builders::build_boot_status_proxy;
use prometheus_activity_manager::config::{BootStatusConfig, ServiceConfig};
use prometheus_activity_manager::core::{
    Activity, BootStatusProxy, CallFailure, MasterRequirementManager, RequirementError,
    RequirementManager, SchedulerHooks, BOOTUP_REQUIREMENT,
};
use prometheus_activity_manager::infra::{
    InMemoryRequirementRegistry, InMemoryScheduler, InMemoryStatusSource,
};
use prometheus_activity_manager::runtime::TokioSpawner;
use prometheus_activity_manager::util::{ActivityId, SubsystemTag};
use serde_json::{json, Value};

// ============================================================================
// HELPERS
// ============================================================================

struct TestActivity {
    id: ActivityId,
    met: AtomicUsize,
}

impl TestActivity {
    fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id: ActivityId(id),
            met: AtomicUsize::new(0),
        })
    }

    fn met_count(&self) -> usize {
        self.met.load(Ordering::SeqCst)
    }
}

impl Activity for TestActivity {
    fn id(&self) -> ActivityId {
        self.id
    }

    fn requirement_met(&self, requirement: &str) {
        assert_eq!(requirement, BOOTUP_REQUIREMENT);
        self.met.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    source: Arc<InMemoryStatusSource>,
    scheduler: Arc<InMemoryScheduler>,
    proxy: Arc<BootStatusProxy<TokioSpawner>>,
}

fn harness() -> Harness {
    let source = Arc::new(InMemoryStatusSource::new());
    let scheduler = Arc::new(InMemoryScheduler::new());
    let proxy = Arc::new(BootStatusProxy::new(
        BootStatusConfig::default(),
        source.clone(),
        scheduler.clone(),
        TokioSpawner::current(),
    ));
    Harness {
        source,
        scheduler,
        proxy,
    }
}

fn finished(value: bool) -> Result<Value, CallFailure> {
    Ok(json!({ "finished": value, "firstUse": false }))
}

/// Let spawned tasks run without crossing the retry delay.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

// ============================================================================
// INSTANTIATION
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_instantiate_bootup_true() {
    let h = harness();
    let activity = TestActivity::new(1);

    let req = h
        .proxy
        .instantiate_requirement(activity.clone(), "bootup", &json!(true))
        .unwrap();

    assert_eq!(req.name(), "bootup");
    assert_eq!(req.activity_id(), ActivityId(1));
    assert!(!req.is_met());
    assert_eq!(h.proxy.pending_requirements(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_instantiate_bootup_rejects_other_values() {
    let h = harness();
    let activity = TestActivity::new(2);

    for value in [json!(false), json!("true"), json!(1), Value::Null] {
        let err = h
            .proxy
            .instantiate_requirement(activity.clone(), "bootup", &value)
            .unwrap_err();
        assert!(matches!(err, RequirementError::InvalidValue { .. }));
    }
    assert_eq!(h.proxy.pending_requirements(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_instantiate_unknown_requirement() {
    let h = harness();
    let activity = TestActivity::new(3);

    let err = h
        .proxy
        .instantiate_requirement(activity, "other", &json!(true))
        .unwrap_err();

    match err {
        RequirementError::UnknownRequirement {
            manager,
            requirement,
            activity,
        } => {
            assert_eq!(manager, "BootStatusProxy");
            assert_eq!(requirement, "other");
            assert_eq!(activity, ActivityId(3));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.proxy.pending_requirements(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_late_registration_after_latch_is_met_immediately() {
    let h = harness();
    h.proxy.boot_status_update(&json!({ "finished": true }));
    assert!(h.proxy.is_boot_latched());

    let late = TestActivity::new(4);
    let req = h
        .proxy
        .instantiate_requirement(late.clone(), "bootup", &json!(true))
        .unwrap();

    assert!(req.is_met());
    assert_eq!(late.met_count(), 1);
}

// ============================================================================
// LATCH
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_false_true_true_satisfies_once() {
    let h = harness();
    let activity = TestActivity::new(10);
    let _req = h
        .proxy
        .instantiate_requirement(activity.clone(), "bootup", &json!(true))
        .unwrap();

    h.source
        .script_call(vec![finished(false), finished(true), finished(true)]);
    h.proxy.enable();
    settle().await;

    assert_eq!(activity.met_count(), 1);
    assert!(h.proxy.is_boot_latched());
    assert_eq!(h.scheduler.disable_calls(SubsystemTag::Ui), 1);
    // The enable hook runs on every `true`, latched or not.
    assert_eq!(h.scheduler.enable_calls(SubsystemTag::Ui), 2);
    assert!(h.scheduler.is_enabled(SubsystemTag::Ui));
}

#[tokio::test(start_paused = true)]
async fn test_true_false_true_satisfies_twice() {
    let h = harness();
    let activity = TestActivity::new(11);
    let _req = h
        .proxy
        .instantiate_requirement(activity.clone(), "bootup", &json!(true))
        .unwrap();

    h.source
        .script_call(vec![finished(true), finished(false), finished(true)]);
    h.proxy.enable();
    settle().await;

    assert_eq!(activity.met_count(), 2);
    assert!(h.proxy.is_boot_latched());
}

#[tokio::test(start_paused = true)]
async fn test_false_clears_latch_and_disables_ui() {
    let h = harness();
    h.proxy.enable();
    settle().await;

    h.source.push_status(json!({ "finished": true }));
    settle().await;
    assert!(h.proxy.is_boot_latched());
    assert!(h.scheduler.is_enabled(SubsystemTag::Ui));

    h.source.push_status(json!({ "finished": false }));
    settle().await;
    assert!(!h.proxy.is_boot_latched());
    assert!(!h.scheduler.is_enabled(SubsystemTag::Ui));
}

#[tokio::test(start_paused = true)]
async fn test_missing_finished_field_is_ignored() {
    let h = harness();
    let activity = TestActivity::new(12);
    let _req = h
        .proxy
        .instantiate_requirement(activity.clone(), "bootup", &json!(true))
        .unwrap();

    h.source.script_call(vec![Ok(json!({ "firstUse": true }))]);
    h.proxy.enable();
    settle().await;

    assert_eq!(activity.met_count(), 0);
    assert!(h.scheduler.history().is_empty());
    assert!(h.proxy.is_subscribed());
}

#[tokio::test(start_paused = true)]
async fn test_every_pending_requirement_is_satisfied() {
    let h = harness();
    let activities: Vec<_> = (20..25).map(TestActivity::new).collect();
    let reqs: Vec<_> = activities
        .iter()
        .map(|a| {
            h.proxy
                .instantiate_requirement(a.clone(), "bootup", &json!(true))
                .unwrap()
        })
        .collect();

    h.proxy.boot_status_update(&json!({ "finished": true }));

    assert!(activities.iter().all(|a| a.met_count() == 1));
    assert!(reqs.iter().all(|r| r.is_met()));
}

// ============================================================================
// RETRY AND FAILURE
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_transient_failure_retries_once() {
    let h = harness();
    let activity = TestActivity::new(30);
    let _req = h
        .proxy
        .instantiate_requirement(activity.clone(), "bootup", &json!(true))
        .unwrap();

    h.source
        .script_call(vec![Err(CallFailure::transient(json!({ "errorCode": -1 })))]);
    h.source.script_call(vec![finished(true)]);
    h.proxy.enable();

    settle().await;
    assert_eq!(h.source.call_count(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.source.call_count(), 2);
    assert_eq!(activity.met_count(), 1);

    // The reissued call stays open; nothing else is retried.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.source.call_count(), 2);
    assert_eq!(h.source.open_calls(), 1);
    assert_eq!(activity.met_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_waits_for_the_configured_delay() {
    let h = harness();
    h.source
        .script_call(vec![Err(CallFailure::transient(Value::Null))]);
    h.proxy.enable();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.source.call_count(), 1);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.source.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_retry_without_limit() {
    let h = harness();
    for _ in 0..10 {
        h.source
            .script_call(vec![Err(CallFailure::transient(Value::Null))]);
    }
    h.proxy.enable();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.source.call_count(), 11);
    assert!(h.proxy.is_subscribed());
}

#[tokio::test(start_paused = true)]
async fn test_permanent_failure_stops_until_reenabled() {
    let h = harness();
    let activity = TestActivity::new(31);
    let _req = h
        .proxy
        .instantiate_requirement(activity.clone(), "bootup", &json!(true))
        .unwrap();

    h.source
        .script_call(vec![Err(CallFailure::permanent(json!({ "errorText": "denied" })))]);
    h.proxy.enable();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.source.call_count(), 1);
    assert!(!h.proxy.is_subscribed());
    assert_eq!(h.source.open_calls(), 0);

    h.source.script_call(vec![finished(true)]);
    h.proxy.enable();
    settle().await;

    assert_eq!(h.source.call_count(), 2);
    assert!(h.proxy.is_subscribed());
    assert_eq!(activity.met_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_closed_stream_ends_subscription() {
    let h = harness();
    h.proxy.enable();
    settle().await;
    assert!(h.proxy.is_subscribed());

    h.source.close_all();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(!h.proxy.is_subscribed());
    assert_eq!(h.source.call_count(), 1);
}

// ============================================================================
// CANCELLATION
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_disable_closes_standing_call() {
    let h = harness();
    h.proxy.enable();
    settle().await;
    assert_eq!(h.source.open_calls(), 1);

    h.proxy.disable();
    settle().await;
    assert!(!h.proxy.is_subscribed());
    assert_eq!(h.source.open_calls(), 0);

    // Pushes after disable reach nobody.
    assert_eq!(h.source.push_status(json!({ "finished": true })), 0);
    assert!(h.scheduler.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disable_abandons_pending_retry() {
    let h = harness();
    h.source
        .script_call(vec![Err(CallFailure::transient(Value::Null))]);
    h.proxy.enable();
    settle().await;
    assert_eq!(h.source.call_count(), 1);

    h.proxy.disable();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.source.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reenable_replaces_standing_call() {
    let h = harness();
    h.proxy.enable();
    settle().await;
    h.proxy.enable();
    settle().await;

    assert_eq!(h.source.call_count(), 2);
    assert_eq!(h.source.open_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_standing_call_request_shape() {
    let h = harness();
    h.proxy.enable();
    settle().await;

    let requests = h.source.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].endpoint,
        "palm://com.palm.systemmanager/getBootStatus"
    );
    assert_eq!(requests[0].params, json!({ "subscribe": true }));
}

// ============================================================================
// REGISTRATION
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_register_and_unregister_with_master() {
    let h = harness();
    let master = InMemoryRequirementRegistry::new();

    h.proxy.clone().register_requirements(&master);
    assert_eq!(master.names(), vec!["bootup".to_string()]);

    let activity = TestActivity::new(40);
    let req = master
        .instantiate(activity.clone(), "bootup", &json!(true))
        .unwrap();
    assert_eq!(req.activity_id(), ActivityId(40));
    assert!(master
        .instantiate(activity, "network", &json!(true))
        .is_err());

    h.proxy.clone().unregister_requirements(&master);
    assert!(master.names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unregister_ignores_foreign_provider() {
    let first = harness();
    let second = harness();
    let master = InMemoryRequirementRegistry::new();

    first.proxy.clone().register_requirements(&master);
    master.unregister_requirement("bootup", second.proxy.clone());
    assert!(master.provider("bootup").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_builder_registers_and_drives_scheduler() {
    let source = Arc::new(InMemoryStatusSource::new());
    let scheduler = Arc::new(InMemoryScheduler::new());
    let master = InMemoryRequirementRegistry::new();

    let proxy = build_boot_status_proxy(
        &ServiceConfig::default(),
        source.clone(),
        scheduler.clone(),
        &master,
        TokioSpawner::current(),
    )
    .unwrap();
    assert!(master.provider("bootup").is_some());
    assert!(!proxy.is_subscribed());

    scheduler.enable_subsystem(SubsystemTag::External);
    source.script_call(vec![finished(true)]);
    proxy.enable();
    settle().await;

    assert!(scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_builder_rejects_invalid_config() {
    let mut cfg = ServiceConfig::default();
    cfg.boot_status.retry_delay_ms = 0;

    let result = build_boot_status_proxy(
        &cfg,
        Arc::new(InMemoryStatusSource::new()),
        Arc::new(InMemoryScheduler::new()),
        &InMemoryRequirementRegistry::new(),
        TokioSpawner::current(),
    );
    assert!(result.is_err());
}
