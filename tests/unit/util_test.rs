//! Tests for utility functions

use delayed_task_scheduler::util::{clamp_to_now, due_in, init_tracing, millis, now_ms};
use std::time::{Duration, Instant};

#[test]
fn test_due_in_adds_delay() {
    let before = Instant::now();
    let due = due_in(Duration::from_secs(2));
    assert!(due >= before + Duration::from_secs(2));
    assert!(due <= Instant::now() + Duration::from_secs(2));
}

#[test]
fn test_clamp_to_now() {
    let now = Instant::now();
    let past = now.checked_sub(Duration::from_millis(500)).unwrap_or(now);
    assert!(clamp_to_now(past) >= now);
}

#[test]
fn test_millis() {
    assert_eq!(millis(1_500), Duration::from_millis(1_500));
}

#[test]
fn test_now_ms_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
