use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::context::PoolContext;
use crate::group::{GroupId, GroupState};
use crate::oracle;
use crate::task::{Task, TaskOutcome};

/// Handle bound to one group, returned by `PoolContext::construct`.
///
/// Cloning is cheap; all clones submit into the same queue. A handle keeps
/// its context alive, so the group's workers are not retired by dropping the
/// last `PoolContext` while handles remain.
#[derive(Clone)]
pub struct PoolHandle {
    group: Arc<GroupState>,
    context: PoolContext,
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolHandle")
            .field("group", self.group.id())
            .finish()
    }
}

impl PoolHandle {
    pub(crate) fn new(group: Arc<GroupState>, context: PoolContext) -> Self {
        Self { group, context }
    }

    pub fn group_id(&self) -> &GroupId {
        self.group.id()
    }

    /// Wraps `f` so that each `submit(args)` enqueues one call to it.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use vpool::{PoolContext, PoolConfig, PoolOptions};
    ///
    /// let context = PoolContext::new(PoolConfig::default()).unwrap();
    /// let pool = context.construct("crawl", PoolOptions::new().workers(8)).unwrap();
    /// let fetch = pool.wrap(|page: u32| println!("fetching page {}", page));
    /// for page in 0..20 {
    ///     fetch.submit(page);
    /// }
    /// context.wait("crawl").unwrap();
    /// ```
    pub fn wrap<A, F, R>(&self, f: F) -> Submitter<A>
    where
        A: Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
        R: TaskOutcome + 'static,
    {
        Submitter {
            func: Arc::new(move |args: A| f(args).into_outcome()),
            name: std::any::type_name::<F>(),
            group: Arc::clone(&self.group),
            context: self.context.clone(),
        }
    }

    /// Enqueues a single closure.
    pub fn execute<F, R>(&self, f: F)
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutcome + 'static,
    {
        enqueue(&self.group, Task::new(std::any::type_name::<F>(), f));
    }

    /// Idle probe for the bound group. Queued retire signals do not count as
    /// pending work.
    pub fn check_stop(&self) -> bool {
        oracle::check_stop(&self.group)
    }

    /// Blocks until the bound group is observed idle.
    pub fn wait(&self) {
        oracle::wait(&self.group, self.context.config().poll_interval);
    }

    pub fn target_workers(&self) -> usize {
        self.group.target_workers()
    }

    pub fn live_workers(&self) -> usize {
        self.group.live_workers()
    }
}

type SharedBody<A> = Arc<dyn Fn(A) -> anyhow::Result<()> + Send + Sync>;

/// Fire-and-forget entry point produced by [`PoolHandle::wrap`].
pub struct Submitter<A> {
    func: SharedBody<A>,
    name: &'static str,
    group: Arc<GroupState>,
    // keeps the workers of `group` from being retired by a context drop
    context: PoolContext,
}

impl<A> Clone for Submitter<A> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            name: self.name,
            group: Arc::clone(&self.group),
            context: self.context.clone(),
        }
    }
}

impl<A> fmt::Debug for Submitter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter")
            .field("name", &self.name)
            .field("group", self.group.id())
            .finish()
    }
}

impl<A: Send + 'static> Submitter<A> {
    /// Enqueues one call with `args` and returns immediately.
    ///
    /// The outcome of the call is never reported back; failures are logged
    /// by the worker that runs it.
    pub fn submit(&self, args: A) {
        let func = Arc::clone(&self.func);
        enqueue(&self.group, Task::new(self.name, move || func(args)));
    }

    pub fn group_id(&self) -> &GroupId {
        self.group.id()
    }
}

fn enqueue(group: &GroupState, task: Task) {
    let name = task.name();
    if !group.queue().push_task(task) {
        error!(group = %group.id(), task = name, "group queue disconnected, task dropped");
    }
}
