//! Wall-clock and monotonic time helpers.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, or `0` if the system clock is before it.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Absolute due instant for a task submitted now with `delay`.
#[must_use]
pub fn due_in(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or(now)
}

/// Clamp an instant that already passed to "now".
#[must_use]
pub fn clamp_to_now(at: Instant) -> Instant {
    at.max(Instant::now())
}

/// Convert a millisecond count from configuration into a [`Duration`].
#[must_use]
pub const fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
