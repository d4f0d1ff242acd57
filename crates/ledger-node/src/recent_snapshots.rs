use ledger_core::RecentSnapshot;
use parking_lot::RwLock;

/// Shared holder for a node's `recentSnapshots` list (spec §5: "guarded by
/// an atomic-reference holder with `modify(fn) -> (new, returned)` and
/// `set`"). Newest entry at index 0, per C9's `broadcastSnapshot` step 1
/// ("prepend `(hash, height)`").
#[derive(Default)]
pub struct RecentSnapshotsHandle {
    inner: RwLock<Vec<RecentSnapshot>>,
}

impl RecentSnapshotsHandle {
    pub fn new(initial: Vec<RecentSnapshot>) -> Self {
        Self { inner: RwLock::new(initial) }
    }

    pub fn get(&self) -> Vec<RecentSnapshot> {
        self.inner.read().clone()
    }

    /// Prepends `snapshot` and truncates to `cap` (I4), returning the
    /// resulting list.
    pub fn prepend_and_truncate(&self, snapshot: RecentSnapshot, cap: usize) -> Vec<RecentSnapshot> {
        let mut guard = self.inner.write();
        guard.insert(0, snapshot);
        guard.truncate(cap);
        guard.clone()
    }

    pub fn set(&self, snapshots: Vec<RecentSnapshot>) {
        *self.inner.write() = snapshots;
    }
}
