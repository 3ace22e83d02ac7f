//! Process-wide convenience layer.
//!
//! Every function here forwards to one lazily built [`PoolContext`] with the
//! default configuration. Code that needs isolation (tests, libraries) should
//! build its own context instead.

use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;

use crate::config::{PoolConfig, PoolOptions};
use crate::console::Console;
use crate::context::{PoolContext, StatusReport};
use crate::critical::CriticalSection;
use crate::error::PoolResult;
use crate::group::GroupId;
use crate::handle::PoolHandle;
use crate::scaler::ScaleOutcome;

lazy_static! {
    static ref GLOBAL: PoolContext = PoolContext::build(PoolConfig::default());
}

/// The shared context behind the free functions.
pub fn global() -> &'static PoolContext {
    &GLOBAL
}

/// Constructs a handle for `group` on the shared context.
pub fn pool(group: impl Into<GroupId>, options: PoolOptions) -> PoolResult<PoolHandle> {
    GLOBAL.construct(group, options)
}

pub fn change_worker_count(group: impl Into<GroupId>, count: usize) -> PoolResult<ScaleOutcome> {
    GLOBAL.change_worker_count(group, count)
}

pub fn close_group(group: impl Into<GroupId>) -> PoolResult<ScaleOutcome> {
    GLOBAL.close_group(group)
}

pub fn close_all() -> PoolResult<()> {
    GLOBAL.close_all()
}

pub fn check_stop(group: impl Into<GroupId>) -> PoolResult<bool> {
    GLOBAL.check_stop(group)
}

pub fn wait(group: impl Into<GroupId>) -> PoolResult<()> {
    GLOBAL.wait(group)
}

pub fn wait_timeout(group: impl Into<GroupId>, timeout: Duration) -> PoolResult<()> {
    GLOBAL.wait_timeout(group, timeout)
}

pub fn show_status() -> StatusReport {
    GLOBAL.show_status()
}

pub fn critical_section() -> Arc<CriticalSection> {
    GLOBAL.critical_section()
}

pub fn console() -> Console {
    GLOBAL.console()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_is_a_single_context() {
        let first = global().critical_section();
        let second = critical_section();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_global_group_round_trip() {
        let handle = pool("global-unit", PoolOptions::new().workers(1).monitor(false)).unwrap();
        handle.execute(|| ());
        wait_timeout("global-unit", Duration::from_secs(5)).unwrap();
        assert!(check_stop("global-unit").unwrap());
        close_group("global-unit").unwrap();
        assert_eq!(show_status().get(&GroupId::from("global-unit")).map(|s| s.target_workers), Some(0));
    }
}
