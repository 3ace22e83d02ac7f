use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use flume::{Receiver, Sender};

use crate::task::Task;

/// An entry in a group queue.
///
/// `Retire` is its own variant, so no task payload can ever be mistaken
/// for a retirement request.
pub(crate) enum Job {
    Run(Task),
    Retire,
}

/// What a worker gets back from a blocking pop.
pub(crate) enum Dequeued<'a> {
    /// A task together with the guard that keeps it counted as in flight.
    Task(Task, InFlight<'a>),
    Retire,
}

/// Keeps a dequeued task counted in `in_flight` until dropped.
pub(crate) struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Unbounded FIFO shared by the workers of one group.
///
/// Besides the channel it keeps two counters: tasks waiting in the channel
/// (`queued`) and tasks popped but not yet finished (`in_flight`). Retire
/// signals are not counted as queued work.
///
/// # Thread Safety
/// - Any number of producers may push concurrently
/// - Pops come only from the group's own workers
/// - `in_flight` is raised before `queued` is lowered, and `is_idle` reads
///   `queued` before `in_flight`, so a task is never invisible to both
pub(crate) struct TaskQueue {
    sender: Sender<Job>,
    receiver: Receiver<Job>,
    queued: AtomicUsize,
    in_flight: AtomicUsize,
    pending_retire: AtomicUsize,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("queued", &self.queued())
            .field("in_flight", &self.in_flight())
            .field("pending_retire", &self.pending_retire())
            .finish()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            sender,
            receiver,
            queued: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            pending_retire: AtomicUsize::new(0),
        }
    }

    /// Enqueues a task. Never blocks; returns false if the channel is gone.
    pub fn push_task(&self, task: Task) -> bool {
        // counted before the send so a fast worker can never decrement first
        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(Job::Run(task)).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Enqueues one retirement request behind everything already queued.
    pub fn push_retire(&self) -> bool {
        self.pending_retire.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(Job::Retire).is_err() {
            self.pending_retire.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Blocks until a job is available.
    ///
    /// Returns `None` only if the channel is disconnected, which cannot
    /// happen while the queue owns both ends.
    pub fn recv(&self) -> Option<Dequeued<'_>> {
        match self.receiver.recv() {
            Ok(Job::Run(task)) => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                self.queued.fetch_sub(1, Ordering::SeqCst);
                Some(Dequeued::Task(task, InFlight { counter: &self.in_flight }))
            }
            Ok(Job::Retire) => {
                self.pending_retire.fetch_sub(1, Ordering::SeqCst);
                Some(Dequeued::Retire)
            }
            Err(_) => None,
        }
    }

    /// Snapshot of the idle predicate: no queued tasks and none in flight.
    pub fn is_idle(&self) -> bool {
        self.queued.load(Ordering::SeqCst) == 0 && self.in_flight.load(Ordering::SeqCst) == 0
    }

    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn pending_retire(&self) -> usize {
        self.pending_retire.load(Ordering::SeqCst)
    }
}
