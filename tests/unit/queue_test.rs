//! Tests for the time-ordered delay queue

use delayed_task_scheduler::core::{DelayQueue, DelayedTask};
use std::time::{Duration, Instant};

fn task(id: &str, delay_ms: u64) -> DelayedTask {
    DelayedTask::new(id, Duration::from_millis(delay_ms), |_ctx| async { Ok(()) })
}

#[test]
fn test_pop_order_follows_due_time() {
    let mut queue = DelayQueue::new();
    queue.push(task("B", 12_000));
    queue.push(task("A", 2_000));
    queue.push(task("C", 10_000));

    let far_future = Instant::now() + Duration::from_secs(60);
    let order: Vec<String> = std::iter::from_fn(|| queue.pop_due(far_future))
        .map(|t| t.id().to_string())
        .collect();
    assert_eq!(order, vec!["A", "C", "B"]);
    assert!(queue.is_empty());
}

#[test]
fn test_nothing_due_before_deadline() {
    let mut queue = DelayQueue::new();
    queue.push(task("later", 5_000));
    assert!(queue.pop_due(Instant::now()).is_none());
    assert_eq!(queue.len(), 1);
    assert!(queue.next_deadline().unwrap() > Instant::now());
}

#[test]
fn test_drain_empties_queue() {
    let mut queue = DelayQueue::new();
    for i in 0..5 {
        queue.push(task(&format!("t{i}"), 1_000));
    }
    assert_eq!(queue.drain().len(), 5);
    assert!(queue.is_empty());
    assert!(queue.next_deadline().is_none());
}
