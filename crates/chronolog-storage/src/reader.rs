//! Log Reader - Random-Access and Time-Indexed Reads
//!
//! This module implements `LogReader`, which owns read-only handles to a
//! store's index and blob files and resolves entry indexes and timestamps
//! to stored data.
//!
//! ## What Does LogReader Do?
//!
//! 1. **Opens both files** of a store (index at `P`, blob at `P + ".data"`)
//! 2. **Tracks a cached entry count**, refreshed by re-statting the index file
//! 3. **Reads single entries** with one fixed-size index read and at most one
//!    blob read
//! 4. **Reads contiguous batches** with exactly one read per file
//! 5. **Locates timestamps** with an upper-bound binary search over 8-byte
//!    timestamp reads
//!
//! ## Bounds and Staleness
//!
//! The cached entry count is a point-in-time snapshot. A bound check that
//! fails against the cache triggers one `len()` refresh before the request
//! is rejected, so a reader notices a concurrent writer's appends exactly
//! when it first needs them. `cached_len()` exposes the snapshot without
//! refreshing.
//!
//! An entry whose index is below the observed count is guaranteed fully
//! written and stable: the writer appends payload bytes before extending
//! the index file, and never rewrites existing bytes.
//!
//! ## Corruption Detection
//!
//! Every decoded payload span is checked for `start <= end`; a backwards
//! span is reported as `Corrupted`. Equal bounds are a legal empty payload.
//! The reader does not verify that the index file size is well-formed or
//! that timestamps are actually non-decreasing; a store violating those
//! produces incorrect search results rather than a detected error.
//!
//! ## Thread Safety
//!
//! Reads are positioned, so a `LogReader` never moves a file cursor. The
//! bound-check methods take `&mut self` only to update the cached count;
//! for concurrent access, open one reader per thread - they coordinate
//! through nothing but the files themselves.

use std::fs::File;
use std::path::Path;

use bytes::Bytes;
use tracing::{debug, warn};

use chronolog_core::offsets::{self, ENTRY_STRIDE, SENTINEL_BYTES, SPAN_BYTES};
use chronolog_core::{Entry, Error, Result};

use crate::{blob_path, read_exact_at};

/// Outcome of an entry-count refresh.
///
/// A stat failure is deliberately absorbed rather than propagated: failing
/// every bound check on a transient stat error would be overly strict for a
/// read path, so the reader keeps the last known count. Both variants carry
/// a usable count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountRefresh {
    /// Count recomputed from a fresh stat of the index file.
    Refreshed(i64),

    /// Stat failed; the last known count is still in effect.
    Stale(i64),
}

impl CountRefresh {
    /// The entry count, however it was obtained.
    pub fn count(self) -> i64 {
        match self {
            CountRefresh::Refreshed(count) | CountRefresh::Stale(count) => count,
        }
    }
}

/// Reads entries from a store by index or timestamp
#[derive(Debug)]
pub struct LogReader {
    /// The index file: fixed-stride (location, timestamp) pairs
    index_file: File,

    /// The blob file: concatenated payload bytes
    blob_file: File,

    /// Number of entries when last checked
    entry_count: i64,
}

impl LogReader {
    /// Open the store at `path` for reading.
    ///
    /// Opens `path` (index) and `path + ".data"` (blob) read-only and caches
    /// the entry count. If the blob file fails to open, the index handle is
    /// released on the way out.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let index_file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let blob = blob_path(path);
        let blob_file = File::open(&blob).map_err(|source| Error::Open {
            path: blob,
            source,
        })?;

        let mut reader = Self {
            index_file,
            blob_file,
            entry_count: 0,
        };
        reader.len();

        debug!(
            path = %path.display(),
            entries = reader.entry_count,
            "opened store for reading"
        );

        Ok(reader)
    }

    /// Close the reader, releasing both file handles.
    ///
    /// Dropping the reader has the same effect; consuming `self` just makes
    /// a double close unrepresentable.
    pub fn close(self) {}

    /// Current entry count, refreshed from a fresh stat of the index file.
    ///
    /// This is the only way the reader discovers growth from a concurrent
    /// writer. On stat failure the last known count is returned unchanged;
    /// see [`CountRefresh`].
    pub fn len(&mut self) -> i64 {
        self.refresh_len().count()
    }

    /// Refresh the entry count, reporting whether the stat succeeded.
    pub fn refresh_len(&mut self) -> CountRefresh {
        match self.index_file.metadata() {
            Ok(meta) => {
                // 16 index bytes per entry, plus the 8-byte sentinel
                self.entry_count =
                    (meta.len() as i64 - SENTINEL_BYTES as i64) / ENTRY_STRIDE as i64;
                CountRefresh::Refreshed(self.entry_count)
            }
            Err(err) => {
                warn!(error = %err, "index stat failed, keeping last known entry count");
                CountRefresh::Stale(self.entry_count)
            }
        }
    }

    /// The entry count as of the last refresh, with no stat.
    pub fn cached_len(&self) -> i64 {
        self.entry_count
    }

    /// Bound check against the cached count, refreshing once on a miss.
    fn check_index(&mut self, index: i64) -> Result<()> {
        if index < 0 {
            return Err(Error::OutOfBounds {
                index,
                len: self.entry_count,
            });
        }
        if index >= self.entry_count && index >= self.len() {
            return Err(Error::OutOfBounds {
                index,
                len: self.entry_count,
            });
        }
        Ok(())
    }

    /// Read entry `index`: its timestamp and payload.
    ///
    /// Costs one 24-byte index read, plus one blob read when the payload is
    /// non-empty. A span with equal bounds yields an empty payload; a span
    /// that runs backwards yields `Corrupted`.
    pub fn read(&mut self, index: i64) -> Result<Entry> {
        self.check_index(index)?;

        let mut buf = [0u8; SPAN_BYTES];
        read_exact_at(
            &self.index_file,
            &mut buf,
            (index * ENTRY_STRIDE as i64) as u64,
        )?;
        let span = offsets::decode_span(&buf);

        if span.start > span.end {
            return Err(Error::Corrupted {
                index,
                start: span.start,
                end: span.end,
            });
        }
        if span.start == span.end {
            return Ok(Entry::new(index, span.timestamp, Bytes::new()));
        }

        let mut payload = vec![0u8; span.payload_len() as usize];
        read_exact_at(&self.blob_file, &mut payload, span.start as u64)?;

        Ok(Entry::new(index, span.timestamp, Bytes::from(payload)))
    }

    /// Read only entry `index`'s timestamp.
    ///
    /// One 8-byte index read, no blob access. The fast path backing
    /// [`find_time`](Self::find_time).
    pub fn read_timestamp(&mut self, index: i64) -> Result<i64> {
        self.check_index(index)?;

        let mut buf = [0u8; SENTINEL_BYTES];
        read_exact_at(
            &self.index_file,
            &mut buf,
            (index * ENTRY_STRIDE as i64 + SENTINEL_BYTES as i64) as u64,
        )?;

        Ok(offsets::decode_timestamp(&buf))
    }

    /// Read the contiguous range `[start, end)` of entries.
    ///
    /// Returns parallel vectors of timestamps and payloads. The whole range
    /// costs exactly one index read and one blob read; per-entry payloads
    /// are zero-copy slices of the single blob buffer. This is the reason to
    /// prefer batches over repeated single reads.
    pub fn read_batch(&mut self, start: i64, end: i64) -> Result<(Vec<i64>, Vec<Bytes>)> {
        if end <= start {
            return Err(Error::InvalidRange { start, end });
        }
        if start < 0 {
            return Err(Error::OutOfBounds {
                index: start,
                len: self.entry_count,
            });
        }
        if end > self.entry_count && end > self.len() {
            return Err(Error::OutOfBounds {
                index: end,
                len: self.entry_count,
            });
        }

        let count = (end - start) as usize;

        // One read covers every (location, timestamp) pair in the range
        // plus the location one past it.
        let mut buf = vec![0u8; count * ENTRY_STRIDE + SENTINEL_BYTES];
        read_exact_at(
            &self.index_file,
            &mut buf,
            (start * ENTRY_STRIDE as i64) as u64,
        )?;
        let (locations, timestamps) = offsets::decode_block(&buf, count);

        let first = locations[0];
        let last = locations[count];
        if first > last {
            return Err(Error::Corrupted {
                index: start,
                start: first,
                end: last,
            });
        }

        let mut span = vec![0u8; (last - first) as usize];
        read_exact_at(&self.blob_file, &mut span, first as u64)?;
        let span = Bytes::from(span);

        let payloads = (0..count)
            .map(|i| span.slice((locations[i] - first) as usize..(locations[i + 1] - first) as usize))
            .collect();

        Ok((timestamps, payloads))
    }

    /// Find the first entry whose timestamp strictly exceeds `timestamp`
    /// (an upper-bound search; equivalently the insertion point just past
    /// all entries with timestamp <= the query).
    ///
    /// Returns 0 when the query precedes all stored data. When the query is
    /// at or past the last stored timestamp, returns
    /// `Err(NotInRange { index })` with `index` equal to the store's length
    /// - the answer rides along with the explicit out-of-range signal.
    ///
    /// O(log N) 8-byte reads, no blob access. Correct only if stored
    /// timestamps are non-decreasing; the reader does not verify that.
    pub fn find_time(&mut self, timestamp: i64) -> Result<i64> {
        let first = self.read_timestamp(0)?;
        if first > timestamp {
            return Ok(0);
        }

        // read_timestamp(0) succeeding means the store is non-empty
        let mut left = 0i64;
        let mut right = self.len() - 1;
        let last = self.read_timestamp(right)?;
        if last <= timestamp {
            return Err(Error::NotInRange {
                index: self.entry_count,
            });
        }

        // Invariant: ts[left] <= timestamp < ts[right]
        while right - left > 1 {
            let mid = (left + right) / 2;
            let ts = self.read_timestamp(mid)?;
            if ts <= timestamp {
                left = mid;
            } else {
                right = mid;
            }
        }

        Ok(right)
    }

    /// Resolve `(t1, t2]`-style bounds into the half-open index range
    /// `[i1, i2)`, directly usable by [`read_batch`](Self::read_batch).
    ///
    /// Two independent [`find_time`](Self::find_time) lookups. The first
    /// error propagates with whichever index was already computed attached:
    /// a `NotInRange` on `t2` after `i1` resolved becomes
    /// `RangeNotInRange { start: i1, end }`.
    pub fn find_time_range(&mut self, t1: i64, t2: i64) -> Result<(i64, i64)> {
        let i1 = self.find_time(t1)?;
        match self.find_time(t2) {
            Ok(i2) => Ok((i1, i2)),
            Err(Error::NotInRange { index }) => Err(Error::RangeNotInRange {
                start: i1,
                end: index,
            }),
            Err(err) => Err(err),
        }
    }
}
