//! Tests for configuration validation

use delayed_task_scheduler::config::SchedulerConfig;
use std::collections::HashMap;
use std::time::Duration;

#[test]
fn test_default_config_is_valid() {
    let cfg = SchedulerConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.ingress_capacity, 1000);
    assert_eq!(cfg.ready_capacity, 100);
    assert_eq!(cfg.submit_timeout(), Duration::from_millis(100));
    assert_eq!(cfg.handoff_timeout(), Duration::from_secs(1));
    assert_eq!(cfg.task_timeout(), Duration::from_secs(120));
    assert_eq!(cfg.shutdown_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.idle_wake(), Duration::from_secs(3600));
    assert!(cfg.worker_count >= 1);
}

#[test]
fn test_invalid_capacities() {
    assert!(SchedulerConfig::default().with_ingress_capacity(0).validate().is_err());
    assert!(SchedulerConfig::default().with_ready_capacity(0).validate().is_err());
    assert!(SchedulerConfig::default().with_worker_count(0).validate().is_err());
}

#[test]
fn test_invalid_timeouts() {
    assert!(SchedulerConfig::default()
        .with_task_timeout(Duration::ZERO)
        .validate()
        .is_err());
    assert!(SchedulerConfig::default()
        .with_shutdown_timeout(Duration::ZERO)
        .validate()
        .is_err());
    // A zero submit wait means "try once".
    assert!(SchedulerConfig::default()
        .with_submit_timeout(Duration::ZERO)
        .validate()
        .is_ok());
}

#[test]
fn test_partial_json_uses_defaults() {
    let cfg = SchedulerConfig::from_json_str(r#"{"worker_count": 3, "task_timeout_ms": 5000}"#)
        .unwrap();
    assert_eq!(cfg.worker_count, 3);
    assert_eq!(cfg.task_timeout(), Duration::from_secs(5));
    assert_eq!(cfg.ready_capacity, 100);
}

#[test]
fn test_invalid_json_is_rejected() {
    assert!(SchedulerConfig::from_json_str(r#"{"ready_capacity": 0}"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_lookup_overrides() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DELAYED_SCHEDULER_WORKER_COUNT", "6"),
        ("DELAYED_SCHEDULER_SUBMIT_TIMEOUT_MS", " 250 "),
    ]);
    let cfg = SchedulerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap();
    assert_eq!(cfg.worker_count, 6);
    assert_eq!(cfg.submit_timeout(), Duration::from_millis(250));
    assert_eq!(cfg.ingress_capacity, 1000);
}

#[test]
fn test_lookup_rejects_bad_value() {
    let err = SchedulerConfig::from_lookup(|key| {
        (key == "DELAYED_SCHEDULER_READY_CAPACITY").then(|| "lots".to_string())
    })
    .unwrap_err();
    assert!(err.contains("DELAYED_SCHEDULER_READY_CAPACITY"));
}
