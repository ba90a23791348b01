//! Follower's single pending-snapshot slot

use crate::Snapshot;
use std::sync::Mutex;

/// Newest snapshot received from the leader. A new arrival overwrites the
/// previous one; there is never a backlog.
#[derive(Debug, Default)]
pub struct PendingSnapshot {
    slot: Mutex<Option<Snapshot>>,
}

impl PendingSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, snapshot: Snapshot) {
        *self.lock() = Some(snapshot);
    }

    /// Latest snapshot, left in place so held controls keep applying
    pub fn latest(&self) -> Option<Snapshot> {
        *self.lock()
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Snapshot>> {
        // A Snapshot is Copy, so a poisoned slot still holds a whole value
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
