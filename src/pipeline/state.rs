//! Shared current snapshot and poller control state.
//!
//! The poller owns the single [`SnapshotWriter`]; status queries hold
//! cloneable [`SnapshotReader`]s. Snapshots are immutable, so swapping the
//! whole `Arc` is the only synchronization readers need.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::models::Snapshot;

type Slot = Arc<ArcSwap<Snapshot>>;

/// Constructor for the writer/reader pair.
pub struct SnapshotCell;

impl SnapshotCell {
    /// Create the shared slot holding `initial`.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(initial: Snapshot) -> (SnapshotWriter, SnapshotReader) {
        let slot: Slot = Arc::new(ArcSwap::from_pointee(initial));
        (
            SnapshotWriter {
                slot: Arc::clone(&slot),
            },
            SnapshotReader { slot },
        )
    }
}

/// Read access to the current snapshot.
#[derive(Clone)]
pub struct SnapshotReader {
    slot: Slot,
}

impl SnapshotReader {
    /// An owned handle; stays consistent if the poller swaps in a new one.
    pub fn current(&self) -> Arc<Snapshot> {
        self.slot.load_full()
    }
}

/// The only handle that can replace the current snapshot.
pub struct SnapshotWriter {
    slot: Slot,
}

impl SnapshotWriter {
    pub fn current(&self) -> Arc<Snapshot> {
        self.slot.load_full()
    }

    /// Swap in `next`, returning the snapshot it replaced.
    pub fn replace(&mut self, next: Arc<Snapshot>) -> Arc<Snapshot> {
        self.slot.swap(next)
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Whether the poller fetches or idles this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Running,
    Paused,
}

/// What one loop iteration does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAction {
    /// Run a full cycle, then idle for the poll interval
    Poll { then_idle: Duration },
    /// Idle only
    Idle(Duration),
}

impl PollState {
    pub fn action(self, poll_interval: Duration, paused_idle: Duration) -> CycleAction {
        match self {
            PollState::Running => CycleAction::Poll {
                then_idle: poll_interval,
            },
            PollState::Paused => CycleAction::Idle(paused_idle),
        }
    }
}

/// Pause flag shared between the poller and its handle.
#[derive(Debug, Clone, Default)]
pub struct PauseFlag {
    paused: Arc<AtomicBool>,
}

impl PauseFlag {
    pub fn new(paused: bool) -> Self {
        Self {
            paused: Arc::new(AtomicBool::new(paused)),
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn state(&self) -> PollState {
        if self.paused.load(Ordering::SeqCst) {
            PollState::Paused
        } else {
            PollState::Running
        }
    }
}
