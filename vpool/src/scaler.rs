use std::fmt;
use std::sync::Arc;

use crate::error::{PoolError, PoolResult};
use crate::group::{GroupState, Scaling};
use crate::worker::{Worker, WorkerEnv};

/// Result of one resize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleOutcome {
    /// The group was already committed to the requested count.
    Unchanged { workers: usize },
    /// New workers were spawned.
    Grew { from: usize, to: usize },
    /// Retire signals were queued; live workers follow once they reach them.
    Shrinking { from: usize, to: usize },
}

impl ScaleOutcome {
    /// The count the group is now converging to.
    pub fn target(&self) -> usize {
        match *self {
            ScaleOutcome::Unchanged { workers } => workers,
            ScaleOutcome::Grew { to, .. } | ScaleOutcome::Shrinking { to, .. } => to,
        }
    }
}

impl fmt::Display for ScaleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleOutcome::Unchanged { workers } => write!(f, "unchanged at {}", workers),
            ScaleOutcome::Grew { from, to } => write!(f, "grew {} -> {}", from, to),
            ScaleOutcome::Shrinking { from, to } => write!(f, "shrinking {} -> {}", from, to),
        }
    }
}

/// Moves a group's committed worker count to `desired`.
///
/// The caller holds the group's scaling guard for the whole call, which
/// serializes resizes of the same group. Growth spawns threads right away.
/// Shrinking only enqueues retire signals behind the work already queued.
/// If a spawn fails, the committed count reflects the workers that did
/// start and the error is returned.
pub(crate) fn converge(
    group: &Arc<GroupState>,
    scaling: &mut Scaling,
    desired: usize,
    env: &WorkerEnv,
) -> PoolResult<ScaleOutcome> {
    let current = scaling.committed;

    let outcome = if desired > current {
        for _ in current..desired {
            Worker::new(Arc::clone(group), env)
                .spawn(&env.thread_name_prefix)
                .map_err(|source| PoolError::SpawnFailed {
                    group: group.id().clone(),
                    source,
                })?;
            scaling.committed += 1;
        }
        ScaleOutcome::Grew { from: current, to: desired }
    } else if desired < current {
        for _ in desired..current {
            if !group.queue().push_retire() {
                return Err(PoolError::Other(anyhow::anyhow!(
                    "queue of group {} is disconnected",
                    group.id()
                )));
            }
            scaling.committed -= 1;
        }
        ScaleOutcome::Shrinking { from: current, to: desired }
    } else {
        ScaleOutcome::Unchanged { workers: current }
    };

    if !matches!(outcome, ScaleOutcome::Unchanged { .. }) {
        crate::log_group!(group.id(), "resized", outcome = %outcome);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical::CriticalSection;
    use crate::group::GroupId;
    use std::thread;
    use std::time::{Duration, Instant};

    fn env() -> WorkerEnv {
        WorkerEnv {
            thread_name_prefix: "scale".to_string(),
            log_task_errors: false,
            section: Arc::new(CriticalSection::new()),
        }
    }

    fn wait_for_live(group: &GroupState, expected: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if group.live_workers() == expected {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_grow_then_shrink() {
        let group = Arc::new(GroupState::new(GroupId::from("s"), 0));
        let env = env();

        let grown = converge(&group, &mut group.scaling(), 4, &env).unwrap();
        assert_eq!(grown, ScaleOutcome::Grew { from: 0, to: 4 });
        assert!(wait_for_live(&group, 4));

        let shrunk = converge(&group, &mut group.scaling(), 1, &env).unwrap();
        assert_eq!(shrunk, ScaleOutcome::Shrinking { from: 4, to: 1 });
        assert_eq!(group.target_workers(), 1);
        assert!(wait_for_live(&group, 1));

        converge(&group, &mut group.scaling(), 0, &env).unwrap();
        assert!(wait_for_live(&group, 0));
    }

    #[test]
    fn test_repeated_shrinks_do_not_over_retire() {
        let group = Arc::new(GroupState::new(GroupId::from("s"), 0));
        let env = env();

        converge(&group, &mut group.scaling(), 4, &env).unwrap();
        converge(&group, &mut group.scaling(), 2, &env).unwrap();
        converge(&group, &mut group.scaling(), 1, &env).unwrap();
        assert_eq!(group.target_workers(), 1);
        assert!(wait_for_live(&group, 1));
        assert_eq!(group.queue().pending_retire(), 0);

        converge(&group, &mut group.scaling(), 0, &env).unwrap();
        assert!(wait_for_live(&group, 0));
    }

    #[test]
    fn test_same_count_is_unchanged() {
        let group = Arc::new(GroupState::new(GroupId::from("s"), 0));
        let env = env();
        converge(&group, &mut group.scaling(), 2, &env).unwrap();
        let outcome = converge(&group, &mut group.scaling(), 2, &env).unwrap();
        assert_eq!(outcome, ScaleOutcome::Unchanged { workers: 2 });
        assert_eq!(outcome.target(), 2);
        converge(&group, &mut group.scaling(), 0, &env).unwrap();
        assert!(wait_for_live(&group, 0));
    }
}
