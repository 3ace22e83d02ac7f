use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Guard returned by [`CriticalSection::enter`]; the section is released on drop.
pub type CriticalGuard<'a> = ReentrantMutexGuard<'a, ()>;

/// Re-entrant lock shared by task bodies and the worker failure path.
///
/// It protects nothing by itself. Callers decide what goes inside: console
/// output, a shared file, any side effect that must not interleave. The
/// thread holding it may enter again without deadlocking.
#[derive(Default)]
pub struct CriticalSection {
    lock: ReentrantMutex<()>,
}

impl fmt::Debug for CriticalSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriticalSection")
            .field("locked", &self.lock.is_locked())
            .finish()
    }
}

impl CriticalSection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the section is available, then holds it until the guard drops.
    pub fn enter(&self) -> CriticalGuard<'_> {
        self.lock.lock()
    }

    pub fn try_enter(&self) -> Option<CriticalGuard<'_>> {
        self.lock.try_lock()
    }

    /// Runs `f` inside the section.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    /// Wraps `f` so that every call runs inside the section.
    pub fn atom<A, R, F>(self: &Arc<Self>, f: F) -> impl Fn(A) -> R + Send + Sync + 'static
    where
        A: 'static,
        R: 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let section = Arc::clone(self);
        move |args: A| section.run(|| f(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_reentrant_acquisition() {
        let section = CriticalSection::new();
        let outer = section.enter();
        let inner = section.enter();
        let value = section.run(|| 5);
        drop(inner);
        drop(outer);
        assert_eq!(value, 5);
    }

    #[test]
    fn test_other_threads_are_excluded() {
        let section = Arc::new(CriticalSection::new());
        let guard = section.enter();

        let probe = Arc::clone(&section);
        let acquired = thread::spawn(move || probe.try_enter().is_some())
            .join()
            .unwrap();
        assert!(!acquired);

        drop(guard);
        let probe = Arc::clone(&section);
        let acquired = thread::spawn(move || probe.try_enter().is_some())
            .join()
            .unwrap();
        assert!(acquired);
    }

    #[test]
    fn test_atom_serializes_read_modify_write() {
        let section = Arc::new(CriticalSection::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let bump = {
            let counter = Arc::clone(&counter);
            Arc::new(section.atom(move |by: usize| {
                // split load/store is only safe because the section serializes it
                let current = counter.load(Ordering::Relaxed);
                thread::yield_now();
                counter.store(current + by, Ordering::Relaxed);
            }))
        };

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bump = Arc::clone(&bump);
                thread::spawn(move || {
                    for _ in 0..250 {
                        bump(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::Relaxed), 1000);
    }
}
