// vpool: grouped worker pools on plain OS threads
//
// A function is wrapped once and every call enqueues a task on its group's
// queue. Each group has its own workers, its own idle probe and can be
// resized at runtime. A lifecycle monitor retires every worker once the
// driving thread has finished and all groups are idle.

pub mod config;
pub mod console;
pub mod context;
pub mod critical;
pub(crate) mod directory;
pub mod error;
pub mod fanout;
pub mod global;
pub mod group;
pub mod handle;
pub mod logging;
pub mod monitor;
pub mod oracle;
pub(crate) mod queue;
pub mod scaler;
pub mod task;
pub(crate) mod worker;

// Re-export commonly used types
pub use config::{PoolConfig, PoolOptions};
pub use console::Console;
pub use context::{PoolContext, StatusReport};
pub use critical::{CriticalGuard, CriticalSection};
pub use error::{PoolError, PoolResult};
pub use fanout::{FanOut, FanOutFn};
pub use global::{
    change_worker_count, check_stop, close_all, close_group, console, critical_section, global, pool,
    show_status, wait, wait_timeout,
};
pub use group::{GroupId, GroupStatus};
pub use handle::{PoolHandle, Submitter};
pub use monitor::{DriverGuard, DriverSignal};
pub use scaler::ScaleOutcome;
pub use task::{Task, TaskOutcome};
