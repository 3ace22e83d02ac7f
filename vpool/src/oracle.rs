//! Completion probes.
//!
//! Idleness is sampled, never cached: a group reported idle can receive a
//! task a moment later. Callers that need a barrier must stop submitting
//! before relying on these answers.

use std::thread;
use std::time::{Duration, Instant};

use crate::group::GroupState;

/// True when the group has no queued and no in-flight tasks right now.
///
/// Pending retire signals are not tasks: a group whose queue holds only
/// retire signals is idle.
pub fn check_stop(group: &GroupState) -> bool {
    group.is_idle()
}

/// Blocks until the group is observed idle, polling every `interval`.
pub fn wait(group: &GroupState, interval: Duration) {
    while !check_stop(group) {
        thread::sleep(interval);
    }
}

/// Like [`wait`], but gives up after `timeout`. Returns whether the group was
/// observed idle.
pub fn wait_timeout(group: &GroupState, interval: Duration, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if check_stop(group) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(interval.min(deadline - now));
    }
}
