use std::time::Duration;

use crate::error::PoolError;
use crate::monitor::DriverSignal;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
pub const DEFAULT_MAX_WORKERS_PER_GROUP: usize = 4096;
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "vpool";

// --- Context Configuration ---

/// Configuration for a `PoolContext`.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Worker count used when a group has never received an explicit count.
    /// `None` falls back to the host's available parallelism.
    pub default_workers: Option<usize>,

    /// Upper bound accepted for explicit worker counts.
    pub max_workers_per_group: usize,

    /// Interval used by `wait` and by the lifecycle monitor.
    pub poll_interval: Duration,

    /// Whether workers log failed tasks.
    pub log_task_errors: bool,

    /// Worker threads are named `{prefix}-{group}-{n}`.
    pub thread_name_prefix: String,

    /// Whether console lines are prefixed with the writing thread's name.
    pub console_thread_names: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_workers: None,
            max_workers_per_group: DEFAULT_MAX_WORKERS_PER_GROUP,
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_task_errors: true,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            console_thread_names: true,
        }
    }
}

impl PoolConfig {
    /// Checks the configuration before a context is built from it.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_workers_per_group == 0 {
            return Err(PoolError::InvalidConfig(
                "max_workers_per_group must be at least 1".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(PoolError::InvalidConfig(
                "poll_interval must be non-zero".to_string(),
            ));
        }
        if let Some(workers) = self.default_workers {
            if workers > self.max_workers_per_group {
                return Err(PoolError::InvalidConfig(format!(
                    "default_workers ({}) exceeds max_workers_per_group ({})",
                    workers, self.max_workers_per_group
                )));
            }
        }
        Ok(())
    }

    /// The worker count applied to a group that never got an explicit one.
    pub fn heuristic_workers(&self) -> usize {
        self.default_workers
            .unwrap_or_else(num_cpus::get)
            .clamp(1, self.max_workers_per_group)
    }

    /// Rejects explicit counts above the per-group maximum.
    pub fn check_worker_count(&self, requested: usize) -> Result<usize, PoolError> {
        if requested > self.max_workers_per_group {
            return Err(PoolError::InvalidWorkerCount {
                requested,
                max: self.max_workers_per_group,
            });
        }
        Ok(requested)
    }
}

// --- Per-Construction Options ---

/// Options for a single `construct` call.
#[derive(Clone, Debug)]
pub struct PoolOptions {
    /// Explicit worker count for the group.
    pub workers: Option<usize>,

    /// Whether this construction starts the lifecycle monitor.
    pub monitor: bool,

    /// Driving thread observed by the monitor. Defaults to the calling thread.
    pub driver: Option<DriverSignal>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            workers: None,
            monitor: true,
            driver: None,
        }
    }
}

impl PoolOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn monitor(mut self, monitor: bool) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn driver(mut self, driver: DriverSignal) -> Self {
        self.driver = Some(driver);
        self
    }
}
