//! Polling pipeline.
//!
//! - `diff`: change detection between consecutive snapshots
//! - `notify`: delivery of change events
//! - `state`: shared current snapshot and pause state
//! - `poll`: the periodic fetch/extract/diff/persist loop

pub mod diff;
pub mod notify;
pub mod poll;
pub mod state;

pub use diff::{ChangeDetector, diff};
pub use notify::{ChangeBatch, ChangeNotifier, ChannelNotifier, LogNotifier};
pub use poll::{CycleReport, Poller, PollerHandle};
pub use state::{CycleAction, PauseFlag, PollState, SnapshotCell, SnapshotReader, SnapshotWriter};
