//! Chronolog Storage Layer
//!
//! This crate implements the on-disk layer of chronolog: a two-file,
//! append-only, time-indexed event store. Each stored entry is a
//! timestamped, variable-length byte payload, retrievable by sequential
//! index or by timestamp binary search.
//!
//! ## The Two Files
//!
//! ```text
//! store path P
//! ┌──────────────────────────────────────────────┐
//! │ P            (index file, fixed stride)      │
//! │  loc_0 ts_0 loc_1 ts_1 ... loc_{N-1} ts_{N-1}│
//! │  loc_N                    (sentinel)         │
//! ├──────────────────────────────────────────────┤
//! │ P + ".data"  (blob file, flat bytes)         │
//! │  payload_0 | payload_1 | ... | payload_{N-1} │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The index file gives every lookup a small fixed-size read; payload bytes
//! are fetched from the blob file only when actually requested. Entry i's
//! payload occupies `blob[loc_i .. loc_{i+1})`, so the index file of an
//! N-entry store is exactly `16*N + 8` bytes.
//!
//! ## Main Components
//!
//! ### LogReader
//! Read-only access over both files:
//! - `read` / `read_timestamp` for single entries
//! - `read_batch` for a contiguous range in one read per file
//! - `find_time` / `find_time_range` for timestamp upper-bound search
//!
//! ### LogWriter
//! The append path: writes the payload to the blob file, then extends the
//! index file by exactly 16 bytes (timestamp + new sentinel).
//!
//! ## Concurrency Model
//!
//! All reads are positioned reads against already-open handles; there is no
//! file cursor to share and no internal locking. Any number of `LogReader`s
//! may work on the same store concurrently, and a single appending
//! `LogWriter` is tolerated alongside them: appends only grow the files, and
//! a reader's bound checks re-stat the index file when an index falls past
//! the cached entry count.
//!
//! ## Usage Example
//!
//! ```ignore
//! use chronolog_storage::{LogReader, LogWriter};
//!
//! let mut writer = LogWriter::open("./data/events")?;
//! writer.append(1_700_000_000_000, b"payload")?;
//!
//! let mut reader = LogReader::open("./data/events")?;
//! let entry = reader.read(0)?;
//! let (timestamps, payloads) = reader.read_batch(0, reader.len())?;
//! let first_after = reader.find_time(1_700_000_000_000)?;
//! ```

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

pub mod reader;
pub mod writer;

pub use chronolog_core::{Entry, Error, Result};
pub use reader::{CountRefresh, LogReader};
pub use writer::LogWriter;

/// File name extension that turns a store path into its blob file path.
pub const BLOB_SUFFIX: &str = ".data";

/// Blob file path for the store at `index_path`.
pub fn blob_path(index_path: &Path) -> PathBuf {
    let mut os_string = index_path.as_os_str().to_os_string();
    os_string.push(BLOB_SUFFIX);
    PathBuf::from(os_string)
}

/// Read exactly `buf.len()` bytes at `offset` without moving any file
/// cursor, so concurrent readers never need coordination.
#[cfg(unix)]
pub(crate) fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    std::os::unix::fs::FileExt::read_exact_at(file, buf, offset)
}

#[cfg(windows)]
pub(crate) fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    let mut filled = 0;
    while filled < buf.len() {
        let n = file.seek_read(&mut buf[filled..], offset + filled as u64)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "unexpected end of file in positioned read",
            ));
        }
        filled += n;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_path_appends_suffix() {
        let path = blob_path(Path::new("/tmp/store/events"));
        assert_eq!(path, PathBuf::from("/tmp/store/events.data"));
    }

    #[test]
    fn test_blob_path_keeps_existing_extension() {
        // The suffix is appended, not substituted
        let path = blob_path(Path::new("events.log"));
        assert_eq!(path, PathBuf::from("events.log.data"));
    }
}
