//! Entry Data Structure
//!
//! This module defines the `Entry` type - the unit of stored data in a
//! chronolog store.
//!
//! ## Structure
//! Each entry contains:
//! - **index**: zero-based position in write order, unique within a store
//! - **timestamp**: 64-bit signed timestamp, non-decreasing in write order
//! - **payload**: the actual data (arbitrary bytes, may be empty)
//!
//! ## Design Decisions
//! - Uses `bytes::Bytes` for zero-copy payload slicing (batch reads hand out
//!   views into one shared buffer without allocating per entry)
//! - Timestamps are `i64` so pre-epoch values are representable
//! - An empty payload is a legal entry, not an error condition

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single stored entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Zero-based index of this entry in write order
    pub index: i64,

    /// Timestamp, non-decreasing across entries in write order
    pub timestamp: i64,

    /// Payload bytes
    pub payload: Bytes,
}

impl Entry {
    pub fn new(index: i64, timestamp: i64, payload: Bytes) -> Self {
        Self {
            index,
            timestamp,
            payload,
        }
    }

    /// Size of this entry on disk: 16 index-file bytes plus the payload
    pub fn stored_size(&self) -> usize {
        8 + // blob location
        8 + // timestamp
        self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_stored_size() {
        let entry = Entry::new(0, 1_700_000_000_000, Bytes::from("hello"));
        assert_eq!(entry.stored_size(), 21);
    }

    #[test]
    fn test_empty_payload_is_legal() {
        let entry = Entry::new(3, 42, Bytes::new());
        assert_eq!(entry.stored_size(), 16);
        assert!(entry.payload.is_empty());
    }
}
