//! Log Writer - The Append Path
//!
//! This module implements `LogWriter`, the single producer side of a store.
//! It creates and grows the two files the reader depends on, and never
//! rewrites a byte it has already written.
//!
//! ## What Does an Append Do?
//!
//! 1. **Writes the payload** to the blob file at the current sentinel
//!    position
//! 2. **Extends the index file** by exactly 16 bytes: the entry's timestamp
//!    followed by the new sentinel `loc_{N+1} = loc_N + payload_len`
//!
//! Payload bytes land before the index bytes that reference them, so any
//! entry a reader can see through the index file is fully written.
//!
//! ## Fresh and Existing Stores
//!
//! A fresh store is an index file holding a single 8-byte `loc_0 = 0` and
//! an empty blob file. Re-opening an existing store recovers the sentinel
//! from the trailing 8 bytes of the index file, after checking that the
//! file size can actually hold a whole number of entries (`16*N + 8`);
//! appending to a misshapen index would corrupt the store, so that open
//! fails with `MalformedIndex`.
//!
//! ## Durability
//!
//! Appends go straight to the file handles with no buffering layer, but the
//! writer does not sync on its own: call [`LogWriter::sync`] when a
//! durability point is needed. Choosing when is caller policy.
//!
//! ## Thread Safety
//!
//! LogWriter is NOT thread-safe and a store supports one appender at a
//! time. Timestamps should be appended in non-decreasing order for the
//! reader's timestamp search to be meaningful; this is not enforced.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use bytes::BytesMut;
use tracing::debug;

use chronolog_core::offsets::{self, ENTRY_STRIDE, SENTINEL_BYTES};
use chronolog_core::{Error, Result};

use crate::{blob_path, read_exact_at};

/// Appends entries to a store
pub struct LogWriter {
    /// The index file, opened for append
    index_file: File,

    /// The blob file, opened for append
    blob_file: File,

    /// Blob offset where the next payload will start (`loc_N`)
    sentinel: i64,

    /// Number of entries written so far
    entry_count: i64,
}

impl LogWriter {
    /// Open the store at `path` for appending, creating it if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let index_file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| Error::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let blob = blob_path(path);
        let blob_file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&blob)
            .map_err(|source| Error::Open {
                path: blob,
                source,
            })?;

        let index_size = index_file.metadata()?.len() as i64;
        let mut writer = Self {
            index_file,
            blob_file,
            sentinel: 0,
            entry_count: 0,
        };

        if index_size == 0 {
            // Fresh store: a single sentinel location of 0
            let mut buf = BytesMut::with_capacity(SENTINEL_BYTES);
            offsets::encode_sentinel(&mut buf, 0);
            writer.index_file.write_all(&buf)?;
        } else {
            if (index_size - SENTINEL_BYTES as i64) % ENTRY_STRIDE as i64 != 0 {
                return Err(Error::MalformedIndex(format!(
                    "index file is {index_size} bytes, expected 16*N + 8"
                )));
            }
            writer.entry_count = (index_size - SENTINEL_BYTES as i64) / ENTRY_STRIDE as i64;

            let mut buf = [0u8; SENTINEL_BYTES];
            read_exact_at(
                &writer.index_file,
                &mut buf,
                (index_size - SENTINEL_BYTES as i64) as u64,
            )?;
            writer.sentinel = offsets::decode_sentinel(&buf);
        }

        debug!(
            path = %path.display(),
            entries = writer.entry_count,
            sentinel = writer.sentinel,
            "opened store for appending"
        );

        Ok(writer)
    }

    /// Append one entry, returning its index.
    ///
    /// Payload first, then the 16 index bytes referencing it. Timestamps
    /// should be non-decreasing across appends.
    pub fn append(&mut self, timestamp: i64, payload: &[u8]) -> Result<i64> {
        self.blob_file.write_all(payload)?;

        let sentinel = self.sentinel + payload.len() as i64;
        let mut buf = BytesMut::with_capacity(ENTRY_STRIDE);
        offsets::encode_entry(&mut buf, timestamp, sentinel);
        self.index_file.write_all(&buf)?;

        self.sentinel = sentinel;
        let index = self.entry_count;
        self.entry_count += 1;
        Ok(index)
    }

    /// Number of entries written, including those by previous writers of
    /// the same store.
    pub fn len(&self) -> i64 {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Flush both files to stable storage.
    pub fn sync(&self) -> Result<()> {
        self.blob_file.sync_data()?;
        self.index_file.sync_data()?;
        Ok(())
    }

    /// Close the writer, releasing both file handles. Dropping has the same
    /// effect.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_store_on_disk_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events");
        let writer = LogWriter::open(&path).unwrap();
        assert!(writer.is_empty());

        // Index: one 8-byte zero sentinel. Blob: empty.
        assert_eq!(std::fs::read(&path).unwrap(), vec![0u8; 8]);
        assert_eq!(std::fs::metadata(blob_path(&path)).unwrap().len(), 0);
    }

    #[test]
    fn test_append_extends_index_by_16_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events");
        let mut writer = LogWriter::open(&path).unwrap();

        assert_eq!(writer.append(100, b"abc").unwrap(), 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 8 + 16);
        assert_eq!(std::fs::metadata(blob_path(&path)).unwrap().len(), 3);

        assert_eq!(writer.append(200, b"").unwrap(), 1);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 8 + 32);
        assert_eq!(std::fs::metadata(blob_path(&path)).unwrap().len(), 3);
    }

    #[test]
    fn test_reopen_recovers_sentinel_and_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events");

        let mut writer = LogWriter::open(&path).unwrap();
        writer.append(1, b"first").unwrap();
        writer.append(2, b"second").unwrap();
        writer.close();

        let mut writer = LogWriter::open(&path).unwrap();
        assert_eq!(writer.len(), 2);
        assert_eq!(writer.append(3, b"third").unwrap(), 2);

        // Payloads are back to back in the blob file
        assert_eq!(
            std::fs::read(blob_path(&path)).unwrap(),
            b"firstsecondthird"
        );
    }

    #[test]
    fn test_open_rejects_misshapen_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events");
        // 12 bytes cannot be 16*N + 8
        std::fs::write(&path, vec![0u8; 12]).unwrap();

        assert!(matches!(
            LogWriter::open(&path),
            Err(Error::MalformedIndex(_))
        ));
    }

    #[test]
    fn test_sync_succeeds() {
        let dir = TempDir::new().unwrap();
        let mut writer = LogWriter::open(dir.path().join("events")).unwrap();
        writer.append(1, b"x").unwrap();
        writer.sync().unwrap();
    }
}
