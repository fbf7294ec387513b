//! Index File Offset Codec
//!
//! This module encodes and decodes the fixed-stride index file format. The
//! index file is a flat sequence of little-endian i64 values: interleaved
//! (location, timestamp) pairs terminated by one unpaired trailing location.
//!
//! ## Index File Layout
//!
//! ```text
//! offset 0:          loc_0        (8 bytes)
//! offset 8:          ts_0         (8 bytes)
//! offset 16:         loc_1
//! offset 24:         ts_1
//! ...
//! offset 16*(N-1):   loc_{N-1}
//! offset 16*(N-1)+8: ts_{N-1}
//! offset 16*N:       loc_N        (sentinel, no paired timestamp)
//!
//! total size = 16*N + 8 bytes
//! ```
//!
//! `loc_i` is the byte offset in the blob file where entry i's payload
//! begins; entry i occupies `blob[loc_i .. loc_{i+1})`. The trailing
//! `loc_N` marks where the next payload will start, so an empty store is a
//! single 8-byte location and every append extends the file by exactly 16
//! bytes.
//!
//! ## Why Decode Explicitly?
//!
//! Values are parsed byte-by-byte with explicit little-endian cursors
//! rather than by casting packed structs, so the on-disk format never
//! depends on host layout or endianness.
//!
//! This module is pure: no I/O and no validation. Callers are responsible
//! for checking that decoded spans do not run backwards.

use bytes::{Buf, BufMut};

/// Bytes added to the index file per entry: one location + one timestamp.
pub const ENTRY_STRIDE: usize = 16;

/// Size of the trailing sentinel location (and of a lone timestamp).
pub const SENTINEL_BYTES: usize = 8;

/// Bytes covering one entry's full span: its location, its timestamp, and
/// the next entry's location.
pub const SPAN_BYTES: usize = ENTRY_STRIDE + SENTINEL_BYTES;

/// Decoded index data for a single entry: where its payload lives in the
/// blob file, and when it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySpan {
    /// Blob offset where the payload begins (`loc_i`)
    pub start: i64,

    /// Entry timestamp (`ts_i`)
    pub timestamp: i64,

    /// Blob offset one past the payload end (`loc_{i+1}`)
    pub end: i64,
}

impl EntrySpan {
    /// Payload length implied by the span. Meaningless if the span runs
    /// backwards; callers must reject `start > end` first.
    pub fn payload_len(&self) -> i64 {
        self.end - self.start
    }
}

/// Decode the 24 bytes at index-file offset `16*i` into entry i's span.
pub fn decode_span(buf: &[u8; SPAN_BYTES]) -> EntrySpan {
    let mut cursor = &buf[..];
    EntrySpan {
        start: cursor.get_i64_le(),
        timestamp: cursor.get_i64_le(),
        end: cursor.get_i64_le(),
    }
}

/// Decode a contiguous block of `count` entries plus the trailing location.
///
/// `buf` must hold exactly `16*count + 8` bytes read from index-file offset
/// `16*start`. Returns `count + 1` locations and `count` timestamps.
pub fn decode_block(buf: &[u8], count: usize) -> (Vec<i64>, Vec<i64>) {
    debug_assert_eq!(buf.len(), ENTRY_STRIDE * count + SENTINEL_BYTES);

    let mut cursor = buf;
    let mut locations = Vec::with_capacity(count + 1);
    let mut timestamps = Vec::with_capacity(count);

    for _ in 0..count {
        locations.push(cursor.get_i64_le());
        timestamps.push(cursor.get_i64_le());
    }
    locations.push(cursor.get_i64_le());

    (locations, timestamps)
}

/// Decode the 8 bytes at index-file offset `16*i + 8` into entry i's
/// timestamp. The fast path for timestamp binary search: no location
/// decoding, no blob access.
pub fn decode_timestamp(buf: &[u8; SENTINEL_BYTES]) -> i64 {
    let mut cursor = &buf[..];
    cursor.get_i64_le()
}

/// Decode a lone location, such as the trailing sentinel a writer recovers
/// when re-opening a store.
pub fn decode_sentinel(buf: &[u8; SENTINEL_BYTES]) -> i64 {
    let mut cursor = &buf[..];
    cursor.get_i64_le()
}

/// Encode one appended entry: its timestamp followed by the new sentinel
/// location. Exactly the 16 bytes an append adds to the index file.
pub fn encode_entry(buf: &mut impl BufMut, timestamp: i64, sentinel: i64) {
    buf.put_i64_le(timestamp);
    buf.put_i64_le(sentinel);
}

/// Encode a lone sentinel location: the entire index file of a fresh store.
pub fn encode_sentinel(buf: &mut impl BufMut, location: i64) {
    buf.put_i64_le(location);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_decode_span_known_bytes() {
        // loc=2, ts=300, next loc=7, hand-written little-endian
        let mut buf = [0u8; SPAN_BYTES];
        buf[0] = 2;
        buf[8] = 0x2C; // 300 = 0x012C
        buf[9] = 0x01;
        buf[16] = 7;

        let span = decode_span(&buf);
        assert_eq!(span.start, 2);
        assert_eq!(span.timestamp, 300);
        assert_eq!(span.end, 7);
        assert_eq!(span.payload_len(), 5);
    }

    #[test]
    fn test_decode_span_negative_timestamp() {
        // Pre-epoch timestamps are representable
        let mut buf = BytesMut::new();
        buf.put_i64_le(0);
        buf.put_i64_le(-1_000);
        buf.put_i64_le(16);

        let arr: [u8; SPAN_BYTES] = buf.as_ref().try_into().unwrap();
        let span = decode_span(&arr);
        assert_eq!(span.timestamp, -1_000);
    }

    #[test]
    fn test_decode_span_is_little_endian() {
        let mut buf = [0u8; SPAN_BYTES];
        buf[0] = 0x01; // LE: 1, BE would read 0x0100...00
        let span = decode_span(&buf);
        assert_eq!(span.start, 1);
    }

    #[test]
    fn test_decode_timestamp_matches_span() {
        let mut buf = BytesMut::new();
        buf.put_i64_le(40);
        buf.put_i64_le(987_654_321);
        buf.put_i64_le(55);

        let arr: [u8; SPAN_BYTES] = buf.as_ref().try_into().unwrap();
        let ts_arr: [u8; SENTINEL_BYTES] = buf[8..16].try_into().unwrap();

        assert_eq!(decode_span(&arr).timestamp, decode_timestamp(&ts_arr));
    }

    #[test]
    fn test_decode_block_interleaving() {
        // Three entries: locations 0,4,4,10 with timestamps 10,20,30
        let mut buf = BytesMut::new();
        for (loc, ts) in [(0i64, 10i64), (4, 20), (4, 30)] {
            buf.put_i64_le(loc);
            buf.put_i64_le(ts);
        }
        buf.put_i64_le(10);

        let (locations, timestamps) = decode_block(&buf, 3);
        assert_eq!(locations, vec![0, 4, 4, 10]);
        assert_eq!(timestamps, vec![10, 20, 30]);
    }

    #[test]
    fn test_decode_block_single_entry() {
        let mut buf = BytesMut::new();
        buf.put_i64_le(100);
        buf.put_i64_le(5);
        buf.put_i64_le(112);

        let (locations, timestamps) = decode_block(&buf, 1);
        assert_eq!(locations, vec![100, 112]);
        assert_eq!(timestamps, vec![5]);
    }

    #[test]
    fn test_encode_entry_roundtrip() {
        let mut buf = BytesMut::new();
        encode_sentinel(&mut buf, 0);
        encode_entry(&mut buf, 1_700_000_000_000, 9);

        let arr: [u8; SPAN_BYTES] = buf.as_ref().try_into().unwrap();
        let span = decode_span(&arr);
        assert_eq!(span.start, 0);
        assert_eq!(span.timestamp, 1_700_000_000_000);
        assert_eq!(span.end, 9);
    }

    #[test]
    fn test_encode_entry_is_16_bytes() {
        let mut buf = BytesMut::new();
        encode_entry(&mut buf, 1, 2);
        assert_eq!(buf.len(), ENTRY_STRIDE);
    }

    #[test]
    fn test_fresh_store_index_is_8_bytes() {
        let mut buf = BytesMut::new();
        encode_sentinel(&mut buf, 0);
        assert_eq!(buf.len(), SENTINEL_BYTES);
        assert_eq!(buf.as_ref(), &[0u8; 8]);
    }
}
