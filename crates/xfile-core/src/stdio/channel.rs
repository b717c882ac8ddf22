//! Raw channel: the unbuffered byte source/sink under a stream.
//!
//! The stream layer only ever needs open, read, write, seek and tell from
//! the host. Everything above this trait is pure buffer bookkeeping, so an
//! alternate backend (in-memory, compressed, remote) only has to implement
//! these few calls.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use super::mode::Mode;

/// Minimal host I/O primitive consumed by [`FileStream`](super::file::FileStream).
pub trait RawChannel: Sized {
    /// Open the resource named by `path` with the given mode.
    fn open(path: &str, mode: &Mode) -> io::Result<Self>;

    /// Read up to `buf.len()` bytes. Returns 0 only at end of data.
    fn read_raw(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write bytes, returning how many were accepted.
    fn write_raw(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Reposition the channel and return the new absolute offset.
    fn seek_raw(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Current absolute offset.
    fn tell(&mut self) -> io::Result<u64> {
        self.seek_raw(SeekFrom::Current(0))
    }

    /// Total size in bytes, restoring the current offset afterwards.
    fn total_len(&mut self) -> io::Result<u64> {
        let here = self.tell()?;
        let end = self.seek_raw(SeekFrom::End(0))?;
        self.seek_raw(SeekFrom::Start(here))?;
        Ok(end)
    }

    /// Read until `buf` is full or the source ends.
    ///
    /// A short count therefore always means end of data, which is what the
    /// refill logic relies on. Interrupted reads are retried.
    fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut done = 0;
        while done < buf.len() {
            match self.read_raw(&mut buf[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(done)
    }
}

impl RawChannel for File {
    fn open(path: &str, mode: &Mode) -> io::Result<Self> {
        mode.open_options().open(path)
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }

    fn write_raw(&mut self, data: &[u8]) -> io::Result<usize> {
        self.write(data)
    }

    fn seek_raw(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek(pos)
    }

    fn total_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}
