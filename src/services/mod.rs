//! Service layer for the standings crawler.
//!
//! This module contains the extraction pipeline:
//! - Page fetching (`Fetcher`)
//! - Standings table detection (`TableLocator`)
//! - Header mapping (`ColumnMapper`)
//! - Row parsing (`RowParser`)
//! - The composed pipeline (`StandingsExtractor`)

pub mod columns;
mod extractor;
mod fetcher;
pub mod rows;
pub mod table;

pub use columns::{ColumnMapper, ColumnMapping, HeaderRule};
pub use extractor::StandingsExtractor;
pub use fetcher::{DocumentSource, Fetcher, backoff_delay};
pub use rows::{RowBounds, RowParser};
pub use table::{RawTable, TableLocator};
