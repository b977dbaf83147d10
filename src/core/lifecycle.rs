//! Lifecycle primitives: run state and the shutdown broadcast.

use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Scheduler run state. Transitions only forward: idle -> running -> stopped.
#[derive(Debug, Default)]
pub(crate) struct RunState(AtomicU8);

impl RunState {
    /// Claim the idle -> running transition. `false` if another caller won or it already ran.
    pub fn try_start(&self) -> bool {
        self.0
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claim the running -> stopped transition.
    pub fn try_stop(&self) -> bool {
        self.0
            .compare_exchange(RUNNING, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Force the stopped state, e.g. after a failed start.
    pub fn mark_stopped(&self) {
        self.0.store(STOPPED, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire) == RUNNING
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire) == STOPPED
    }
}

/// One-shot shutdown broadcast for blocking threads.
///
/// Listeners select on the receiver; triggering drops the only sender, which
/// disconnects every listener at once.
pub(crate) struct ShutdownSignal {
    trigger: Mutex<Option<Sender<()>>>,
    listener: Receiver<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Mutex::new(Some(tx)),
            listener: rx,
        }
    }

    pub fn listener(&self) -> Receiver<()> {
        self.listener.clone()
    }

    /// Fire the signal. Idempotent.
    pub fn trigger(&self) {
        self.trigger.lock().take();
    }
}

/// Non-blocking check of a shutdown listener.
pub(crate) fn is_signalled(listener: &Receiver<()>) -> bool {
    matches!(listener.try_recv(), Err(TryRecvError::Disconnected))
}
