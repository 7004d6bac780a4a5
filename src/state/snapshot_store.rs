//! Versioned container for the published snapshot.
//!
//! Readers clone an `Arc` under a momentary read lock; `publish` swaps the
//! whole snapshot in a single assignment. A reader therefore always sees
//! either the previous complete snapshot or the new one, never a partially
//! built state, and a failed refresh never touches the store at all.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::types::Snapshot;

pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
    version: AtomicU64,
}

impl SnapshotStore {
    /// Starts at version 0 with empty structures: the state before any
    /// refresh has ever succeeded.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
            version: AtomicU64::new(0),
        }
    }

    /// Get the last published snapshot.
    pub fn load(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the published snapshot, stamping version and refresh time.
    /// Returns the new version.
    pub fn publish(&self, mut snapshot: Snapshot) -> u64 {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        snapshot.version = version;
        snapshot.refreshed_at = Some(chrono::Utc::now());

        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(snapshot);
        version
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
