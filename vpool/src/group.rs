//! # Group State
//!
//! A group is an isolated pool: one task queue, the workers bound to it, and
//! the bookkeeping the scaler and the completion oracle rely on.
//!
//! ## Counters
//! - `committed`: workers spawned minus retire signals already enqueued.
//!   This is what the scaler converges; it moves immediately.
//! - `live`: worker threads currently running their loop. It follows
//!   `committed` eventually, after retire signals are consumed.
//! - `queued` / `in_flight`: owned by the queue, see [`TaskQueue`].

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::queue::TaskQueue;

/// Identifier of a worker group.
///
/// Integers and strings are both accepted; the default group is `0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupId {
    Index(i64),
    Name(String),
}

impl Default for GroupId {
    fn default() -> Self {
        GroupId::Index(0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Index(index) => write!(f, "{}", index),
            GroupId::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for GroupId {
    fn from(value: i64) -> Self {
        GroupId::Index(value)
    }
}

impl From<i32> for GroupId {
    fn from(value: i32) -> Self {
        GroupId::Index(i64::from(value))
    }
}

impl From<u32> for GroupId {
    fn from(value: u32) -> Self {
        GroupId::Index(i64::from(value))
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        GroupId::Name(value.to_string())
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        GroupId::Name(value)
    }
}

impl From<&GroupId> for GroupId {
    fn from(value: &GroupId) -> Self {
        value.clone()
    }
}

/// Scaling bookkeeping, guarded by the group's scaling lock.
///
/// Holding the guard serializes resize operations on one group.
#[derive(Debug, Default)]
pub(crate) struct Scaling {
    /// Workers spawned minus retire signals enqueued.
    pub committed: usize,
    /// Whether a caller has ever asked for an explicit count.
    pub explicit: bool,
    /// Whether the group received its first target (explicit or heuristic).
    pub initialized: bool,
}

/// Shared state of one group.
#[derive(Debug)]
pub struct GroupState {
    id: GroupId,
    ordinal: usize,
    queue: TaskQueue,
    scaling: Mutex<Scaling>,
    live: AtomicUsize,
    spawned: AtomicUsize,
}

impl GroupState {
    pub(crate) fn new(id: GroupId, ordinal: usize) -> Self {
        Self {
            id,
            ordinal,
            queue: TaskQueue::new(),
            scaling: Mutex::new(Scaling::default()),
            live: AtomicUsize::new(0),
            spawned: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    /// Creation order within the directory.
    pub(crate) fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub(crate) fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub(crate) fn scaling(&self) -> MutexGuard<'_, Scaling> {
        self.scaling.lock()
    }

    /// The worker count the group is converging to.
    pub fn target_workers(&self) -> usize {
        self.scaling.lock().committed
    }

    /// Worker threads currently running their loop.
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Idle probe: no queued tasks and none in flight, at this instant.
    /// Queued retire signals are ignored.
    pub fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    /// Next worker index, used only for thread names.
    pub(crate) fn next_worker_index(&self) -> usize {
        self.spawned.fetch_add(1, Ordering::Relaxed)
    }

    /// Counts the calling worker as live until the guard is dropped.
    pub(crate) fn enter_live(self: &Arc<Self>) -> LiveWorker {
        self.live.fetch_add(1, Ordering::SeqCst);
        LiveWorker {
            group: Arc::clone(self),
        }
    }

    /// Point-in-time view of the group's counters.
    pub fn status(&self) -> GroupStatus {
        let scaling = self.scaling.lock();
        GroupStatus {
            id: self.id.clone(),
            target_workers: scaling.committed,
            explicit: scaling.explicit,
            live_workers: self.live_workers(),
            queued: self.queue.queued(),
            in_flight: self.queue.in_flight(),
            pending_retire: self.queue.pending_retire(),
        }
    }
}

/// Decrements the live count when a worker leaves its loop, however it leaves.
pub(crate) struct LiveWorker {
    group: Arc<GroupState>,
}

impl Drop for LiveWorker {
    fn drop(&mut self) {
        self.group.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Snapshot of one group, as reported by `status` and `show_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStatus {
    pub id: GroupId,
    pub target_workers: usize,
    pub explicit: bool,
    pub live_workers: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub pending_retire: usize,
}

impl GroupStatus {
    pub fn is_idle(&self) -> bool {
        self.queued == 0 && self.in_flight == 0
    }
}
