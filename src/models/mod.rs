// src/models/mod.rs

//! Domain models for the standings crawler.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod change;
mod config;
mod record;
mod snapshot;

// Re-export all public types
pub use change::ChangeEvent;
pub use config::{Config, ExtractionConfig, LoggingConfig, SourceConfig, StorageConfig};
pub use record::{CanonicalField, Record};
pub use snapshot::{Snapshot, fingerprint};
