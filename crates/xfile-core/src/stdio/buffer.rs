//! Read buffer engine.
//!
//! A fixed-capacity chunk buffer with an explicit cursor and an
//! end-of-source latch. The buffer is refilled whole from the raw channel
//! once the cursor catches up with the filled length.
//!
//! Design: refills never shift or compact data. A refill overwrites the
//! entire chunk and resets the cursor, so every byte is copied from the
//! channel exactly once and out of the buffer exactly once.
//!
//! Channel errors: reads and line reads report byte counts, not errors, so a
//! failed refill ends the data the same way a short one does. It latches the
//! buffer as exhausted and bumps `read_errors`, which the stream exposes
//! through its stats. Callers that must tell truncation from end of file
//! compare `read_errors` against zero after a short read.

use super::channel::RawChannel;

/// Default chunk size: 512 KiB.
pub const CHUNK_SIZE: usize = 512 * 1024;

/// Read-direction buffer slot.
///
/// Invariants:
/// - `cursor <= filled <= data.len()`
/// - `data.len()` is fixed at creation
#[derive(Debug)]
pub struct ReadBuffer {
    data: Vec<u8>,
    /// Number of valid bytes in `data`.
    filled: usize,
    /// Next unread offset within `data`.
    cursor: usize,
    /// Set once a refill came back short; no later refill yields data.
    exhausted: bool,
    /// Number of refills that actually hit the channel.
    refills: u64,
    /// Refills that failed with a channel error.
    read_errors: u64,
}

impl ReadBuffer {
    /// Create an empty buffer of the given capacity (at least one byte).
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(1)],
            filled: 0,
            cursor: 0,
            exhausted: false,
            refills: 0,
            read_errors: 0,
        }
    }

    /// Create a buffer with the default [`CHUNK_SIZE`].
    pub fn with_default_capacity() -> Self {
        Self::new(CHUNK_SIZE)
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// How many refills have read from the channel so far.
    pub fn refill_count(&self) -> u64 {
        self.refills
    }

    /// How many refills failed with a channel error.
    pub fn read_error_count(&self) -> u64 {
        self.read_errors
    }

    /// Bytes ready without a refill.
    pub fn available(&self) -> usize {
        self.filled - self.cursor
    }

    /// Cursor has caught up with the filled length.
    pub fn is_drained(&self) -> bool {
        self.cursor == self.filled
    }

    /// Drained and nothing more will ever arrive.
    pub fn at_end(&self) -> bool {
        self.is_drained() && self.exhausted
    }

    /// Pull the next chunk from `channel`.
    ///
    /// Performs at most one channel read. Once the source is exhausted this
    /// only clears the buffer and returns 0. A channel error is counted and
    /// then treated as end of data.
    pub fn refill<C: RawChannel>(&mut self, channel: &mut C) -> usize {
        if self.exhausted {
            self.filled = 0;
            self.cursor = 0;
            return 0;
        }
        let count = match channel.read_full(&mut self.data) {
            Ok(count) => count,
            Err(_) => {
                self.read_errors += 1;
                0
            }
        };
        self.refills += 1;
        self.filled = count;
        self.cursor = 0;
        if count < self.data.len() {
            self.exhausted = true;
        }
        count
    }

    /// Copy up to `dest.len()` buffered bytes out, advancing the cursor.
    pub fn take_into(&mut self, dest: &mut [u8]) -> usize {
        let take = dest.len().min(self.available());
        dest[..take].copy_from_slice(&self.data[self.cursor..self.cursor + take]);
        self.cursor += take;
        take
    }

    /// Consume one byte, if any is buffered.
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek_byte()?;
        self.cursor += 1;
        Some(byte)
    }

    /// Look at the next byte without consuming it.
    pub fn peek_byte(&self) -> Option<u8> {
        (self.cursor < self.filled).then(|| self.data[self.cursor])
    }

    /// Unread bytes as a slice.
    pub fn unread(&self) -> &[u8] {
        &self.data[self.cursor..self.filled]
    }

    /// Return to the just-allocated state (after a rewind or seek).
    pub fn reset(&mut self) {
        self.filled = 0;
        self.cursor = 0;
        self.exhausted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdio::mode::Mode;
    use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

    struct Mem(Cursor<Vec<u8>>);

    impl RawChannel for Mem {
        fn open(_path: &str, _mode: &Mode) -> io::Result<Self> {
            Ok(Mem(Cursor::new(Vec::new())))
        }
        fn read_raw(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
        fn write_raw(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.write(data)
        }
        fn seek_raw(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.0.seek(pos)
        }
    }

    fn mem(bytes: &[u8]) -> Mem {
        Mem(Cursor::new(bytes.to_vec()))
    }

    #[test]
    fn test_refill_full_chunk_not_exhausted() {
        let mut ch = mem(b"abcdefgh");
        let mut buf = ReadBuffer::new(4);
        assert_eq!(buf.refill(&mut ch), 4);
        assert_eq!(buf.filled(), 4);
        assert_eq!(buf.cursor(), 0);
        assert!(!buf.is_exhausted());
    }

    #[test]
    fn test_short_refill_sets_exhausted() {
        let mut ch = mem(b"abc");
        let mut buf = ReadBuffer::new(8);
        assert_eq!(buf.refill(&mut ch), 3);
        assert!(buf.is_exhausted());
        assert_eq!(buf.unread(), b"abc");
    }

    #[test]
    fn test_exact_multiple_needs_one_empty_refill() {
        let mut ch = mem(b"abcd");
        let mut buf = ReadBuffer::new(4);
        assert_eq!(buf.refill(&mut ch), 4);
        assert!(!buf.is_exhausted());
        buf.cursor = 4;
        assert_eq!(buf.refill(&mut ch), 0);
        assert!(buf.at_end());
    }

    #[test]
    fn test_refill_after_exhaustion_is_idempotent() {
        let mut ch = mem(b"xy");
        let mut buf = ReadBuffer::new(8);
        buf.refill(&mut ch);
        assert_eq!(buf.refill_count(), 1);
        assert_eq!(buf.refill(&mut ch), 0);
        assert_eq!(buf.refill(&mut ch), 0);
        assert_eq!(buf.filled(), 0);
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.refill_count(), 1);
    }

    #[test]
    fn test_take_into_and_next_byte() {
        let mut ch = mem(b"hello world");
        let mut buf = ReadBuffer::new(64);
        buf.refill(&mut ch);
        let mut out = [0u8; 5];
        assert_eq!(buf.take_into(&mut out), 5);
        assert_eq!(&out, b"hello");
        assert_eq!(buf.next_byte(), Some(b' '));
        assert_eq!(buf.peek_byte(), Some(b'w'));
        assert_eq!(buf.available(), 5);
    }

    #[test]
    fn test_take_into_stops_at_filled() {
        let mut ch = mem(b"ab");
        let mut buf = ReadBuffer::new(64);
        buf.refill(&mut ch);
        let mut out = [0u8; 10];
        assert_eq!(buf.take_into(&mut out), 2);
        assert!(buf.at_end());
        assert_eq!(buf.next_byte(), None);
    }

    #[test]
    fn test_reset_clears_exhaustion() {
        let mut ch = mem(b"ab");
        let mut buf = ReadBuffer::new(64);
        buf.refill(&mut ch);
        assert!(buf.is_exhausted());
        buf.reset();
        assert!(!buf.is_exhausted());
        assert!(buf.is_drained());
    }

    /// Yields one chunk, then fails every read.
    struct Flaky(Option<Vec<u8>>);

    impl RawChannel for Flaky {
        fn open(_path: &str, _mode: &Mode) -> io::Result<Self> {
            Ok(Flaky(None))
        }
        fn read_raw(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some(chunk) = self.0.take() else {
                return Err(io::Error::other("device gone"));
            };
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
        fn write_raw(&mut self, _data: &[u8]) -> io::Result<usize> {
            Ok(0)
        }
        fn seek_raw(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_channel_error_is_counted_and_ends_data() {
        let mut ch = Flaky(Some(b"abcd".to_vec()));
        let mut buf = ReadBuffer::new(4);
        assert_eq!(buf.refill(&mut ch), 4);
        assert_eq!(buf.read_error_count(), 0);
        buf.cursor = 4;
        assert_eq!(buf.refill(&mut ch), 0);
        assert_eq!(buf.read_error_count(), 1);
        assert!(buf.at_end());
    }

    #[test]
    fn test_zero_capacity_rounds_up() {
        let buf = ReadBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
    }
}
