//! Error Types for Chronolog
//!
//! This module defines all error types that can occur when reading or
//! appending to a store.
//!
//! ## Error Categories
//!
//! ### Open Errors
//! - `Open`: one of the two store files could not be opened (store missing
//!   or inaccessible)
//!
//! ### Bounds Errors
//! - `OutOfBounds`: requested index or range end exceeds the (refreshed)
//!   entry count
//! - `InvalidRange`: batch request with `end <= start`
//!
//! ### Data Integrity Errors
//! - `Corrupted`: a decoded payload span runs backwards — structural damage
//!   on disk, not a transient condition
//! - `MalformedIndex`: an index file whose size cannot hold a whole number
//!   of entries (detected only when a writer re-opens a store)
//!
//! ### Query Errors
//! - `NotInRange`: a well-formed timestamp query past the stored range; the
//!   error carries the insertion index rather than being a pure failure
//! - `RangeNotInRange`: a range query whose end timestamp fell past the
//!   stored range after the start index was already resolved
//!
//! ## Propagation Policy
//!
//! Every fallible path returns an explicit error and there is no internal
//! retry: a failure is treated as authoritative fact about file state. The
//! single fail-soft exception is the entry-count refresh, which absorbs a
//! stat failure and keeps the last known count (see
//! `LogReader::refresh_len` in `chronolog-storage`).
//!
//! ## Usage
//!
//! All functions return `Result<T>`, aliased to `Result<T, Error>`, so `?`
//! propagation works throughout.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index {index} out of bounds (entry count {len})")]
    OutOfBounds { index: i64, len: i64 },

    #[error("invalid range: start {start} must be below end {end}")]
    InvalidRange { start: i64, end: i64 },

    #[error("store corrupted at entry {index}: payload span {start}..{end} runs backwards")]
    Corrupted { index: i64, start: i64, end: i64 },

    #[error("timestamp not within stored range (would insert at index {index})")]
    NotInRange { index: i64 },

    #[error("range end timestamp not within stored range (resolved {start}..{end})")]
    RangeNotInRange { start: i64, end: i64 },

    #[error("malformed index file: {0}")]
    MalformedIndex(String),
}

pub type Result<T> = std::result::Result<T, Error>;
