//! # Lifecycle Monitor
//!
//! Worker threads are regular (non-daemon) threads. When the thread that
//! submits work is not the process's main thread, nothing else would ever
//! retire them. The monitor watches two conditions at the context's poll
//! interval:
//!
//! - the driving thread has finished
//! - every known group is idle
//!
//! When both hold it closes every group once and exits. It is never
//! restarted. A task submitted concurrently with the final poll is still
//! delivered: retire signals queue up behind it.

use std::cell::RefCell;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::context::{ContextInner, PoolContext};
use crate::logging;

/// Tells the monitor whether the driving thread has finished.
#[derive(Clone)]
pub struct DriverSignal {
    finished: Arc<AtomicBool>,
}

impl fmt::Debug for DriverSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverSignal")
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Marks its signal finished when dropped.
#[derive(Debug)]
pub struct DriverGuard {
    finished: Arc<AtomicBool>,
}

impl Drop for DriverGuard {
    fn drop(&mut self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

impl DriverGuard {
    /// Marks the driving work as done. Same as dropping the guard.
    pub fn finish(self) {}
}

thread_local! {
    // dropped by the thread-local destructors when the owning thread exits
    static THREAD_EXIT: RefCell<Option<DriverGuard>> = const { RefCell::new(None) };
}

impl DriverSignal {
    /// Signal that completes when the calling thread exits.
    ///
    /// The main thread's thread-local destructors are not guaranteed to run,
    /// but when the main thread returns the process ends anyway.
    pub fn current_thread() -> Self {
        let registered = THREAD_EXIT.try_with(|slot| {
            let mut slot = slot.borrow_mut();
            let guard = slot.get_or_insert_with(|| DriverGuard {
                finished: Arc::new(AtomicBool::new(false)),
            });
            Arc::clone(&guard.finished)
        });

        match registered {
            Ok(finished) => Self { finished },
            // the thread is already tearing down its locals
            Err(_) => Self {
                finished: Arc::new(AtomicBool::new(true)),
            },
        }
    }

    /// Signal completed explicitly by dropping (or finishing) the guard.
    pub fn manual() -> (Self, DriverGuard) {
        let finished = Arc::new(AtomicBool::new(false));
        (
            Self {
                finished: Arc::clone(&finished),
            },
            DriverGuard { finished },
        )
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Starts the monitor thread for a context.
///
/// The thread holds only a weak reference to the context and exits if the
/// context is dropped before the shutdown condition is met.
pub(crate) fn start(
    context: Weak<ContextInner>,
    driver: DriverSignal,
    interval: Duration,
    fired: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>> {
    let dispatch = logging::current_subscriber();
    thread::Builder::new()
        .name("vpool-monitor".to_string())
        .spawn(move || {
            let _dispatch = tracing::dispatcher::set_default(&dispatch);
            debug!(event = "monitor_started", "lifecycle monitor started");
            run(context, driver, interval, fired);
        })
}

fn run(context: Weak<ContextInner>, driver: DriverSignal, interval: Duration, fired: Arc<AtomicBool>) {
    loop {
        thread::sleep(interval);

        let Some(inner) = context.upgrade() else {
            debug!(event = "monitor_stopped", "context dropped, lifecycle monitor exiting");
            return;
        };
        let context = PoolContext::from_inner(inner);

        if driver.is_finished() && context.directory().all_idle() {
            if let Err(err) = context.close_all() {
                error!(error = %err, "lifecycle monitor failed to close groups");
            }
            fired.store(true, Ordering::SeqCst);
            info!(
                event = "auto_shutdown",
                groups = context.directory().len(),
                "driving thread finished and all groups idle, closed every group"
            );
            return;
        }
    }
}
