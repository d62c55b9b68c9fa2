//! Storage abstractions for snapshot persistence.
//!
//! One JSON document per source holds the latest snapshot:
//!
//! ```text
//! storage/
//! ├── config.toml
//! └── snapshots/
//!     └── {source-slug}.json   # source name, capture time, records, fingerprint
//! ```
//!
//! Persistence is best effort: a missing or unreadable document loads as an
//! empty snapshot and a failed save is only logged.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Snapshot;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Load the stored snapshot, `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<Snapshot>>;

    /// Replace the stored snapshot.
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Where the snapshot lives, for log lines.
    fn location(&self) -> String;
}

/// Load the stored snapshot, degrading to an empty one on any failure.
pub async fn load_or_empty(storage: &dyn SnapshotStorage, source_name: &str) -> Snapshot {
    match storage.load().await {
        Ok(Some(snapshot)) => {
            log::info!(
                "Loaded snapshot with {} records from {}",
                snapshot.len(),
                storage.location()
            );
            snapshot
        }
        Ok(None) => {
            log::info!("No stored snapshot at {}", storage.location());
            Snapshot::empty(source_name)
        }
        Err(e) => {
            log::warn!(
                "Failed to load snapshot from {}: {}. Starting empty.",
                storage.location(),
                e
            );
            Snapshot::empty(source_name)
        }
    }
}

/// Save a snapshot, logging instead of failing.
pub async fn save_best_effort(storage: &dyn SnapshotStorage, snapshot: &Snapshot) -> bool {
    match storage.save(snapshot).await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to save snapshot to {}: {}", storage.location(), e);
            false
        }
    }
}

/// Storage that keeps nothing, for runs with persistence disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStorage;

#[async_trait]
impl SnapshotStorage for NullStorage {
    async fn load(&self) -> Result<Option<Snapshot>> {
        Ok(None)
    }

    async fn save(&self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }

    fn location(&self) -> String {
        "(disabled)".to_string()
    }
}
