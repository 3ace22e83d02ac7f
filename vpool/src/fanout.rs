//! Fan-out threads.
//!
//! A [`FanOut`] runs the same function on `count` fresh threads per call.
//! Nothing is shared with worker groups: there is no queue, no scaling and
//! no idleness tracking.

use std::any::type_name;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::error;

use crate::error::{PoolError, PoolResult};
use crate::logging;
use crate::task::{self, TaskOutcome};

pub const DEFAULT_FANOUT_PREFIX: &str = "vpool-fanout";

/// Builder for fan-out functions.
#[derive(Debug, Clone)]
pub struct FanOut {
    count: usize,
    join: bool,
    name_prefix: String,
    log_errors: bool,
}

impl FanOut {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            join: false,
            name_prefix: DEFAULT_FANOUT_PREFIX.to_string(),
            log_errors: true,
        }
    }

    /// Whether each call blocks until all of its threads finish.
    pub fn join(mut self, join: bool) -> Self {
        self.join = join;
        self
    }

    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn log_errors(mut self, log_errors: bool) -> Self {
        self.log_errors = log_errors;
        self
    }

    pub fn wrap<A, F, R>(&self, f: F) -> FanOutFn<A>
    where
        A: Clone + Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
        R: TaskOutcome + 'static,
    {
        FanOutFn {
            func: Arc::new(move |args: A| f(args).into_outcome()),
            name: type_name::<F>(),
            settings: self.clone(),
        }
    }
}

type SharedBody<A> = Arc<dyn Fn(A) -> anyhow::Result<()> + Send + Sync>;

/// Function produced by [`FanOut::wrap`].
pub struct FanOutFn<A> {
    func: SharedBody<A>,
    name: &'static str,
    settings: FanOut,
}

impl<A> Clone for FanOutFn<A> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            name: self.name,
            settings: self.settings.clone(),
        }
    }
}

impl<A> fmt::Debug for FanOutFn<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanOutFn")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .finish()
    }
}

impl<A: Clone + Send + 'static> FanOutFn<A> {
    /// Starts `count` threads, each calling the function with a clone of `args`.
    ///
    /// With `join(true)` the call returns after every thread has finished and
    /// the returned list is empty. Otherwise the handles are returned and the
    /// threads keep running detached if they are dropped.
    ///
    /// If a thread cannot be spawned, the threads already started are joined
    /// first when `join(true)` is set, then the spawn error is returned.
    pub fn call(&self, args: A) -> PoolResult<Vec<JoinHandle<()>>> {
        let prefix = &self.settings.name_prefix;
        self.call_with(args, |index, body| {
            thread::Builder::new()
                .name(format!("{}-{}", prefix, index))
                .spawn(body)
        })
    }

    fn call_with<S>(&self, args: A, mut spawn: S) -> PoolResult<Vec<JoinHandle<()>>>
    where
        S: FnMut(usize, ThreadBody) -> io::Result<JoinHandle<()>>,
    {
        let dispatch = logging::current_subscriber();
        let mut handles = Vec::with_capacity(self.settings.count);

        for index in 0..self.settings.count {
            let func = Arc::clone(&self.func);
            let args = args.clone();
            let dispatch = dispatch.clone();
            let name = self.name;
            let log_errors = self.settings.log_errors;

            let body: ThreadBody = Box::new(move || {
                let _dispatch = tracing::dispatcher::set_default(&dispatch);
                if let Err(failure) = task::run_caught(move || func(args)) {
                    if log_errors {
                        error!(task = name, thread = index, error = %failure, "fan-out call failed");
                    }
                }
            });

            match spawn(index, body) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    if self.settings.join {
                        join_all(&mut handles);
                    }
                    return Err(PoolError::FanOutSpawnFailed(err));
                }
            }
        }

        if self.settings.join {
            join_all(&mut handles);
        }
        Ok(handles)
    }
}

type ThreadBody = Box<dyn FnOnce() + Send + 'static>;

fn join_all(handles: &mut Vec<JoinHandle<()>>) {
    for handle in handles.drain(..) {
        // bodies run under catch_unwind, so a join error is not expected
        let _ = handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_joined_call_runs_every_thread() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let fan = FanOut::new(3).join(true).wrap(move |step: usize| {
            seen.fetch_add(step, Ordering::SeqCst);
        });

        let handles = fan.call(2).unwrap();
        assert!(handles.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_detached_call_returns_handles() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let fan = FanOut::new(4).name_prefix("fan").wrap(move |_: ()| {
            assert!(thread::current().name().unwrap_or("").starts_with("fan-"));
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let handles = fan.call(()).unwrap();
        assert_eq!(handles.len(), 4);
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_failures_stay_inside_threads() {
        let fan = FanOut::new(2)
            .join(true)
            .log_errors(false)
            .wrap(|fail: bool| -> anyhow::Result<()> {
                if fail {
                    anyhow::bail!("fan-out failure");
                }
                Ok(())
            });
        assert!(fan.call(true).unwrap().is_empty());
    }

    #[test]
    fn test_joined_call_waits_for_started_threads_when_spawn_fails() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let fan = FanOut::new(4).join(true).wrap(move |_: ()| {
            thread::sleep(std::time::Duration::from_millis(50));
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let result = fan.call_with((), |index, body| {
            if index == 2 {
                return Err(io::Error::new(io::ErrorKind::Other, "thread limit reached"));
            }
            thread::Builder::new().spawn(body)
        });

        assert!(matches!(result, Err(PoolError::FanOutSpawnFailed(_))));
        // both started threads finished before the error came back
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
