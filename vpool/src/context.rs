//! # Pool Context
//!
//! Owns everything that would otherwise be process-wide mutable state: the
//! group directory, the critical section, the lifecycle monitor slot and the
//! configuration. Tests build one context per case; the free functions in
//! [`crate::global`] share a lazily created one.
//!
//! ## Lifecycle
//! - `PoolContext::new(config)` validates the configuration and starts nothing
//! - workers are spawned by `construct` / `change_worker_count`
//! - `shutdown(timeout)` closes every group and waits for the workers to retire

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::{PoolConfig, PoolOptions};
use crate::console::Console;
use crate::critical::CriticalSection;
use crate::directory::Directory;
use crate::error::{PoolError, PoolResult};
use crate::group::{GroupId, GroupState, GroupStatus};
use crate::handle::PoolHandle;
use crate::monitor::{self, DriverSignal};
use crate::oracle;
use crate::scaler::{self, ScaleOutcome};
use crate::worker::WorkerEnv;

pub(crate) struct ContextInner {
    config: PoolConfig,
    directory: Directory,
    section: Arc<CriticalSection>,
    env: WorkerEnv,
    monitor: Mutex<Option<JoinHandle<()>>>,
    monitor_fired: Arc<AtomicBool>,
}

// Runs once no context, handle or submitter is left. Workers only hold
// their group and would otherwise block on their queues forever.
impl Drop for ContextInner {
    fn drop(&mut self) {
        for group in self.directory.snapshot() {
            let mut scaling = group.scaling();
            if let Err(err) = scaler::converge(&group, &mut scaling, 0, &self.env) {
                debug!(group = %group.id(), error = %err, "failed to retire workers of dropped context");
            }
        }
    }
}

/// Explicit runtime context for worker groups.
#[derive(Clone)]
pub struct PoolContext {
    inner: Arc<ContextInner>,
}

impl fmt::Debug for PoolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolContext")
            .field("config", &self.inner.config)
            .field("groups", &self.inner.directory.len())
            .field("monitor_started", &self.monitor_started())
            .finish()
    }
}

impl PoolContext {
    /// Creates an isolated context. No thread is started until a group is built.
    pub fn new(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    pub(crate) fn build(config: PoolConfig) -> Self {
        let section = Arc::new(CriticalSection::new());
        let env = WorkerEnv {
            thread_name_prefix: config.thread_name_prefix.clone(),
            log_task_errors: config.log_task_errors,
            section: Arc::clone(&section),
        };
        Self {
            inner: Arc::new(ContextInner {
                config,
                directory: Directory::new(),
                section,
                env,
                monitor: Mutex::new(None),
                monitor_fired: Arc::new(AtomicBool::new(false)),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ContextInner>) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    pub(crate) fn directory(&self) -> &Directory {
        &self.inner.directory
    }

    // --- Pool Facade ---

    /// Resolves or creates `group` and returns a handle bound to it.
    ///
    /// An explicit `options.workers` always resizes the group. Without one,
    /// the group gets the default count only if it never had a target; an
    /// earlier explicit count is never overridden.
    pub fn construct(&self, group: impl Into<GroupId>, options: PoolOptions) -> PoolResult<PoolHandle> {
        let group_id = group.into();
        let requested = options
            .workers
            .map(|count| self.inner.config.check_worker_count(count))
            .transpose()?;

        let group = self.inner.directory.get_or_create(&group_id);
        {
            let mut scaling = group.scaling();
            match requested {
                Some(count) => {
                    scaler::converge(&group, &mut scaling, count, &self.inner.env)?;
                    scaling.explicit = true;
                    scaling.initialized = true;
                }
                None if !scaling.initialized => {
                    let count = self.inner.config.heuristic_workers();
                    scaler::converge(&group, &mut scaling, count, &self.inner.env)?;
                    scaling.initialized = true;
                }
                None => {}
            }
        }

        if options.monitor {
            self.ensure_monitor(options.driver)?;
        }

        debug!(group = %group_id, "pool handle constructed");
        Ok(PoolHandle::new(group, self.clone()))
    }

    // --- Scaler Entry Points ---

    /// Converges the worker count of an existing group to `count`.
    ///
    /// Growth is immediate; shrinking happens as workers reach the queued
    /// retire signals.
    pub fn change_worker_count(&self, group: impl Into<GroupId>, count: usize) -> PoolResult<ScaleOutcome> {
        let count = self.inner.config.check_worker_count(count)?;
        let group = self.group(group.into())?;
        let mut scaling = group.scaling();
        let outcome = scaler::converge(&group, &mut scaling, count, &self.inner.env)?;
        scaling.explicit = true;
        scaling.initialized = true;
        Ok(outcome)
    }

    /// Retires every worker of `group` once its queued work has drained.
    pub fn close_group(&self, group: impl Into<GroupId>) -> PoolResult<ScaleOutcome> {
        self.change_worker_count(group, 0)
    }

    /// Closes every known group.
    pub fn close_all(&self) -> PoolResult<()> {
        let mut first_error = None;
        for group in self.inner.directory.snapshot() {
            let mut scaling = group.scaling();
            match scaler::converge(&group, &mut scaling, 0, &self.inner.env) {
                Ok(_) => {
                    scaling.explicit = true;
                    scaling.initialized = true;
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // --- Completion Oracle ---

    /// Non-blocking idle probe. May be stale as soon as it returns.
    ///
    /// A group is idle when no task is queued or running. Retire signals
    /// still waiting in the queue are not counted.
    pub fn check_stop(&self, group: impl Into<GroupId>) -> PoolResult<bool> {
        let group = self.group(group.into())?;
        Ok(oracle::check_stop(&group))
    }

    /// Blocks until `group` is observed idle.
    pub fn wait(&self, group: impl Into<GroupId>) -> PoolResult<()> {
        let group = self.group(group.into())?;
        oracle::wait(&group, self.inner.config.poll_interval);
        Ok(())
    }

    /// Blocks until `group` is observed idle or `timeout` elapses.
    pub fn wait_timeout(&self, group: impl Into<GroupId>, timeout: Duration) -> PoolResult<()> {
        let group = self.group(group.into())?;
        if oracle::wait_timeout(&group, self.inner.config.poll_interval, timeout) {
            Ok(())
        } else {
            Err(PoolError::WaitTimeout {
                group: group.id().clone(),
                timeout,
            })
        }
    }

    // --- Diagnostics ---

    pub fn status(&self, group: impl Into<GroupId>) -> PoolResult<GroupStatus> {
        Ok(self.group(group.into())?.status())
    }

    /// Status of every group, also written to the log.
    pub fn show_status(&self) -> StatusReport {
        let report = StatusReport {
            groups: self
                .inner
                .directory
                .snapshot()
                .iter()
                .map(|group| group.status())
                .collect(),
        };
        info!(groups = report.groups.len(), "\n{}", report);
        report
    }

    pub fn monitor_started(&self) -> bool {
        self.inner.monitor.lock().is_some()
    }

    /// Whether the lifecycle monitor has closed every group.
    pub fn monitor_fired(&self) -> bool {
        self.inner.monitor_fired.load(Ordering::SeqCst)
    }

    // --- Shared Side Effects ---

    pub fn critical_section(&self) -> Arc<CriticalSection> {
        Arc::clone(&self.inner.section)
    }

    /// Console writing to stdout, serialized on this context's critical section.
    pub fn console(&self) -> Console {
        Console::stdout(Arc::clone(&self.inner.section)).thread_names(self.inner.config.console_thread_names)
    }

    // --- Teardown ---

    /// Closes every group, then waits for all workers to retire.
    pub fn shutdown(&self, timeout: Duration) -> PoolResult<()> {
        self.close_all()?;
        let deadline = Instant::now() + timeout;
        loop {
            let live: usize = self
                .inner
                .directory
                .snapshot()
                .iter()
                .map(|group| group.live_workers())
                .sum();
            if live == 0 {
                info!(groups = self.inner.directory.len(), "pool context shut down");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PoolError::ShutdownTimeout(timeout));
            }
            thread::sleep(self.inner.config.poll_interval.min(Duration::from_millis(10)));
        }
    }

    // --- Internals ---

    fn group(&self, id: GroupId) -> PoolResult<Arc<GroupState>> {
        self.inner
            .directory
            .get(&id)
            .ok_or(PoolError::UnknownGroup(id))
    }

    /// Starts the monitor once per context; later calls are no-ops even after it exits.
    fn ensure_monitor(&self, driver: Option<DriverSignal>) -> PoolResult<()> {
        let mut slot = self.inner.monitor.lock();
        if slot.is_some() {
            return Ok(());
        }

        let driver = driver.unwrap_or_else(DriverSignal::current_thread);
        let handle = monitor::start(
            Arc::downgrade(&self.inner),
            driver,
            self.inner.config.poll_interval,
            Arc::clone(&self.inner.monitor_fired),
        )
        .map_err(PoolError::MonitorSpawnFailed)?;
        *slot = Some(handle);
        Ok(())
    }
}

/// Output of [`PoolContext::show_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub groups: Vec<GroupStatus>,
}

impl StatusReport {
    pub fn get(&self, id: &GroupId) -> Option<&GroupStatus> {
        self.groups.iter().find(|status| &status.id == id)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "threads group number: {}", self.groups.len())?;
        for status in &self.groups {
            writeln!(
                f,
                "group: {}, alive threads number: {} (target {}, queued {}, in flight {})",
                status.id, status.live_workers, status.target_workers, status.queued, status.in_flight
            )?;
        }
        Ok(())
    }
}
