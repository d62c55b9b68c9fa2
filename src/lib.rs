// src/lib.rs

//! Standings Crawler Library
//!
//! Polls a tournament standings page, turns its table into a snapshot of
//! player records, and reports what changed between polls.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, Result};
