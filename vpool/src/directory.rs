use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::group::{GroupId, GroupState};

/// Registry of every group a context knows about.
///
/// Entries are created on first reference and never removed: a closed group
/// keeps its queue and counters so it can still be probed.
pub struct Directory {
    groups: RwLock<HashMap<GroupId, Arc<GroupState>>>,
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("group_count", &self.len())
            .finish()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the state for `id`, creating it on first use.
    pub fn get_or_create(&self, id: &GroupId) -> Arc<GroupState> {
        if let Some(group) = self.groups.read().get(id) {
            return Arc::clone(group);
        }

        let mut groups = self.groups.write();
        let ordinal = groups.len();
        Arc::clone(
            groups
                .entry(id.clone())
                .or_insert_with(|| Arc::new(GroupState::new(id.clone(), ordinal))),
        )
    }

    /// Looks up an existing group without creating it.
    pub fn get(&self, id: &GroupId) -> Option<Arc<GroupState>> {
        self.groups.read().get(id).cloned()
    }

    /// All known groups, in creation order.
    pub fn snapshot(&self) -> Vec<Arc<GroupState>> {
        let mut groups: Vec<_> = self.groups.read().values().cloned().collect();
        groups.sort_by_key(|group| group.ordinal());
        groups
    }

    /// True when every known group is idle at the time it is probed.
    ///
    /// Groups are probed one after another, not under a common lock.
    pub fn all_idle(&self) -> bool {
        self.snapshot().iter().all(|group| group.is_idle())
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}
