//! # Worker Thread
//!
//! A worker is one OS thread bound to one group's queue.
//!
//! ## Core Algorithm
//! 1. Block on the group queue
//! 2. On a retire signal, leave the loop (the in-flight count is untouched)
//! 3. On a task, run it with panics and errors caught, then loop
//!
//! A failing task never ends the loop. Leaving on failure would silently
//! shrink the group below its target.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::critical::CriticalSection;
use crate::group::GroupState;
use crate::logging;
use crate::queue::Dequeued;
use crate::task::Task;

/// Settings shared by every worker a context spawns.
#[derive(Debug, Clone)]
pub(crate) struct WorkerEnv {
    pub thread_name_prefix: String,
    pub log_task_errors: bool,
    pub section: Arc<CriticalSection>,
}

pub(crate) struct Worker {
    group: Arc<GroupState>,
    index: usize,
    log_task_errors: bool,
    section: Arc<CriticalSection>,
}

impl Worker {
    pub fn new(group: Arc<GroupState>, env: &WorkerEnv) -> Self {
        let index = group.next_worker_index();
        Self {
            group,
            index,
            log_task_errors: env.log_task_errors,
            section: Arc::clone(&env.section),
        }
    }

    /// Starts the worker on its own named thread.
    ///
    /// The thread inherits the caller's tracing dispatcher.
    pub fn spawn(self, prefix: &str) -> io::Result<JoinHandle<()>> {
        let name = format!("{}-{}-{}", prefix, self.group.id(), self.index).replace('\0', "");
        let dispatch = logging::current_subscriber();
        thread::Builder::new().name(name).spawn(move || {
            let _dispatch = tracing::dispatcher::set_default(&dispatch);
            self.run();
        })
    }

    fn run(self) {
        let _live = self.group.enter_live();
        crate::log_worker!(self.group.id(), self.index, "started");

        loop {
            match self.group.queue().recv() {
                Some(Dequeued::Task(task, _in_flight)) => self.execute(task),
                Some(Dequeued::Retire) => {
                    crate::log_worker!(self.group.id(), self.index, "retired");
                    break;
                }
                None => {
                    crate::log_worker!(self.group.id(), self.index, "queue disconnected");
                    break;
                }
            }
        }
    }

    fn execute(&self, task: Task) {
        let name = task.name();
        if let Err(failure) = task.run_caught() {
            if self.log_task_errors {
                let _section = self.section.enter();
                crate::log_task_failure!(self.group.id(), name, failure, worker = self.index);
            }
        }
    }
}
