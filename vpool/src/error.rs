use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::group::GroupId;

/// Errors surfaced by the pool facade and the context operations.
///
/// Task failures never show up here: they are caught at the worker boundary
/// and only reach the log sink.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid worker count {requested} (maximum per group: {max})")]
    InvalidWorkerCount { requested: usize, max: usize },
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),
    #[error("Unknown group: {0}")]
    UnknownGroup(GroupId),
    #[error("Failed to spawn worker thread for group {group}: {source}")]
    SpawnFailed {
        group: GroupId,
        #[source]
        source: io::Error,
    },
    #[error("Failed to spawn lifecycle monitor thread: {0}")]
    MonitorSpawnFailed(#[source] io::Error),
    #[error("Failed to spawn fan-out thread: {0}")]
    FanOutSpawnFailed(#[source] io::Error),
    #[error("Group {group} did not become idle within {timeout:?}")]
    WaitTimeout { group: GroupId, timeout: Duration },
    #[error("Workers did not retire within {0:?}")]
    ShutdownTimeout(Duration),
    #[error("Internal pool error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type PoolResult<T> = Result<T, PoolError>;
