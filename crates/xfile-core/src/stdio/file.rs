//! Buffered file stream.
//!
//! `FileStream` is the aggregate that ties a raw channel to a read buffer,
//! a detected line ending and the capability mask from its open mode.
//!
//! Lifecycle: `create` is pure in-memory setup. `open` acquires the
//! channel, records length/blank/offset, allocates buffers per capability,
//! detects the line ending (which rewinds) and performs the initial fill.
//! `close` releases buffers and the channel exactly once; a closed stream
//! cannot be reopened.
//!
//! Zero-effect convention: calls lacking the needed capability, or made on
//! a stream that is not open, return 0 / `None` rather than an error.

use std::fs::File;
use std::io::{self, SeekFrom};

use super::buffer::ReadBuffer;
use super::channel::RawChannel;
use super::error::StreamError;
use super::line::LineBuffer;
use super::line_ending::{self, LF, LineEnding};
use super::mode::{Capabilities, Mode};
use super::template::{self, Arg};
use crate::config::StreamConfig;

// ---------------------------------------------------------------------------
// Operations table
// ---------------------------------------------------------------------------

/// Operations every stream backend provides.
///
/// Object safe, so callers can hold a `Box<dyn StreamOps>` when the backend
/// is chosen at runtime.
pub trait StreamOps {
    /// Acquire the backing resource and prime the read buffer.
    fn open(&mut self) -> Result<(), StreamError>;

    /// Release buffers and the channel. Closing twice is not an error.
    fn close(&mut self) -> Result<(), StreamError>;

    /// Fill `dest` from the stream, returning the number of bytes copied.
    fn read(&mut self, dest: &mut [u8]) -> usize;

    /// Next line without its terminator, or `None` when no lines remain.
    fn read_line(&mut self) -> Option<Vec<u8>>;

    /// Unbuffered pass-through write.
    fn write(&mut self, data: &[u8]) -> usize;

    /// Render a printf-style template and write the result.
    fn write_formatted(&mut self, template: &str, args: &[Arg<'_>]) -> usize;

    /// Reposition the stream, returning the new absolute offset.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError>;

    /// Total size recorded at open time.
    fn length(&self) -> u64;

    /// `read_line` decoded as UTF-8, replacing invalid sequences.
    fn read_line_string(&mut self) -> Option<String> {
        self.read_line()
            .map(|line| String::from_utf8_lossy(&line).into_owned())
    }

    /// Iterate over the remaining lines.
    fn lines(&mut self) -> Lines<'_, Self>
    where
        Self: Sized,
    {
        Lines { stream: self }
    }
}

/// Iterator returned by [`StreamOps::lines`].
pub struct Lines<'a, S: StreamOps> {
    stream: &'a mut S,
}

impl<S: StreamOps> Iterator for Lines<'_, S> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        self.stream.read_line()
    }
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Cumulative activity counters for one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Refills that read from the channel (detection included).
    pub refills: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub lines_read: u64,
    /// Line buffer enlargements across all lines.
    pub line_growths: u64,
    /// Refills cut short by a channel error; the data ended early.
    pub read_errors: u64,
}

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

/// Buffered sequential stream over a [`RawChannel`].
#[derive(Debug)]
pub struct FileStream<C: RawChannel = File> {
    path: String,
    mode: Mode,
    config: StreamConfig,
    line_ending: LineEnding,
    /// `Some` while open.
    channel: Option<C>,
    /// Set by the first successful open; blocks reopening.
    opened: bool,
    is_empty: bool,
    /// Total size at open time.
    length: u64,
    /// Logical offset consumed by the caller.
    position: u64,
    read_buffer: Option<ReadBuffer>,
    /// Staging slot for formatted writes.
    write_buffer: Option<Vec<u8>>,
    stats: StreamStats,
}

impl FileStream<File> {
    /// Set up a stream over a host file. Does not touch storage.
    pub fn create(path: impl Into<String>, mode: &str) -> Self {
        Self::with_backend(path, mode)
    }
}

impl<C: RawChannel> FileStream<C> {
    /// Set up a stream over an arbitrary channel type.
    pub fn with_backend(path: impl Into<String>, mode: &str) -> Self {
        Self {
            path: path.into(),
            mode: Mode::parse(mode),
            config: StreamConfig::default(),
            line_ending: LineEnding::Unknown,
            channel: None,
            opened: false,
            is_empty: false,
            length: 0,
            position: 0,
            read_buffer: None,
            write_buffer: None,
            stats: StreamStats::default(),
        }
    }

    /// Replace the buffer sizing. Only meaningful before `open`.
    #[must_use]
    pub fn with_config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn capabilities(&self) -> Capabilities {
        self.mode.capabilities()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// True when the resource had no bytes at open time.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Open and fully consumed. Lets callers tell a zero-byte read at end of
    /// data apart from one refused for capability or state reasons.
    pub fn is_eof(&self) -> bool {
        self.is_open() && self.position >= self.length
    }

    pub fn has_read_buffer(&self) -> bool {
        self.read_buffer.is_some()
    }

    pub fn has_write_buffer(&self) -> bool {
        self.write_buffer.is_some()
    }

    pub fn stats(&self) -> StreamStats {
        let mut stats = self.stats;
        if let Some(buf) = &self.read_buffer {
            stats.refills += buf.refill_count();
            stats.read_errors += buf.read_error_count();
        }
        stats
    }

    /// Read up to `n` bytes into a fresh vector.
    pub fn read_exact_or_less(&mut self, n: usize) -> Vec<u8> {
        let remaining = self.length.saturating_sub(self.position);
        let cap = n.min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let mut out = vec![0u8; cap];
        let got = self.read(&mut out);
        out.truncate(got);
        out
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn refill(&mut self) -> usize {
        match (self.read_buffer.as_mut(), self.channel.as_mut()) {
            (Some(buf), Some(ch)) => buf.refill(ch),
            _ => 0,
        }
    }

    /// Classify the line ending if it is still unknown.
    ///
    /// Leaves the channel and buffer rewound to offset 0.
    fn detect_line_ending(&mut self) -> Result<bool, StreamError> {
        if self.line_ending.is_known() || self.is_empty {
            return Ok(false);
        }
        let (Some(buf), Some(ch)) = (self.read_buffer.as_mut(), self.channel.as_mut()) else {
            return Ok(false);
        };
        self.line_ending = line_ending::detect(buf, ch, self.length)?;
        self.position = 0;
        Ok(true)
    }

    /// Move the channel to `pos`, drop buffered data and prime the buffer.
    ///
    /// `Current` is measured from the caller's logical position. The channel
    /// itself sits at the end of the buffered chunk.
    fn reposition(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        let ch = self.channel.as_mut().ok_or(StreamError::NotOpen)?;
        let pos = match pos {
            SeekFrom::Current(delta) => {
                let target = self.position.checked_add_signed(delta).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "seek before the start of the stream",
                    )
                })?;
                SeekFrom::Start(target)
            }
            other => other,
        };
        let offset = ch.seek_raw(pos)?;
        self.position = offset;
        if let Some(buf) = self.read_buffer.as_mut() {
            buf.reset();
            buf.refill(ch);
        }
        Ok(offset)
    }

    /// Run detection from `read_line` when open-time detection did not.
    /// The caller's position survives the rewind.
    fn ensure_line_ending(&mut self) -> Option<LineEnding> {
        if !self.line_ending.is_known() {
            let resume = self.position;
            self.detect_line_ending().ok()?;
            self.reposition(SeekFrom::Start(resume)).ok()?;
        }
        self.line_ending.is_known().then_some(self.line_ending)
    }
}

impl<C: RawChannel> StreamOps for FileStream<C> {
    fn open(&mut self) -> Result<(), StreamError> {
        if self.opened {
            return Err(StreamError::Reopen {
                path: self.path.clone(),
            });
        }
        let mut channel =
            C::open(&self.path, &self.mode).map_err(|source| StreamError::ResourceUnavailable {
                path: self.path.clone(),
                source,
            })?;
        // The starting offset depends on the mode, so ask the channel.
        self.position = channel.tell()?;
        self.length = channel.total_len()?;
        self.is_empty = self.length == 0;
        self.opened = true;

        let caps = self.mode.capabilities();
        if caps.is_readable() {
            self.read_buffer = Some(ReadBuffer::new(self.config.chunk_size));
        }
        if caps.is_writable() {
            self.write_buffer = Some(Vec::with_capacity(self.config.format_limit));
        }
        self.channel = Some(channel);

        self.detect_line_ending()?;
        self.refill();
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        if let Some(buf) = self.read_buffer.take() {
            self.stats.refills += buf.refill_count();
            self.stats.read_errors += buf.read_error_count();
        }
        self.write_buffer = None;
        // Dropping the channel closes it.
        self.channel = None;
        Ok(())
    }

    fn read(&mut self, dest: &mut [u8]) -> usize {
        if !self.mode.capabilities().is_readable() {
            return 0;
        }
        let (Some(buf), Some(ch)) = (self.read_buffer.as_mut(), self.channel.as_mut()) else {
            return 0;
        };
        if self.position >= self.length {
            return 0;
        }

        // Never ask for more than the known remaining size.
        let remaining = self.length - self.position;
        let size = usize::try_from(remaining).map_or(dest.len(), |r| dest.len().min(r));
        let avail = buf.available();

        let copied = if size >= avail && avail as u64 == self.length {
            // Whole file sits in one buffer load.
            buf.take_into(&mut dest[..avail])
        } else if size < avail {
            buf.take_into(&mut dest[..size])
        } else {
            let mut done = 0;
            while done < size {
                done += buf.take_into(&mut dest[done..size]);
                if buf.is_drained() && buf.refill(ch) == 0 && done < size {
                    break;
                }
            }
            done
        };

        self.position += copied as u64;
        self.stats.bytes_read += copied as u64;
        copied
    }

    fn read_line(&mut self) -> Option<Vec<u8>> {
        if !self.mode.capabilities().is_readable() || !self.is_open() || self.length == 0 {
            return None;
        }
        let style = self.ensure_line_ending()?;
        let terminator = style.first_byte()?;
        let paired = style == LineEnding::CrLf;

        let (Some(buf), Some(ch)) = (self.read_buffer.as_mut(), self.channel.as_mut()) else {
            return None;
        };
        if buf.is_drained() && !buf.is_exhausted() {
            buf.refill(ch);
        }
        if buf.at_end() {
            return None;
        }

        let mut line = LineBuffer::new(
            self.config.line_initial_capacity,
            self.config.line_growth_factor,
        );
        loop {
            if buf.is_drained() && !buf.is_exhausted() {
                buf.refill(ch);
            }
            let Some(byte) = buf.next_byte() else {
                break;
            };
            self.position += 1;

            if byte == terminator {
                if !paired {
                    break;
                }
                if buf.is_drained() && !buf.is_exhausted() {
                    buf.refill(ch);
                }
                if buf.peek_byte() == Some(LF) {
                    buf.next_byte();
                    self.position += 1;
                    break;
                }
                // A lone CR inside a CRLF file is ordinary content.
            }
            line.push(byte);
        }

        self.stats.lines_read += 1;
        self.stats.line_growths += u64::from(line.growths());
        Some(line.into_bytes())
    }

    fn write(&mut self, data: &[u8]) -> usize {
        if !self.mode.capabilities().is_writable() {
            return 0;
        }
        let Some(ch) = self.channel.as_mut() else {
            return 0;
        };
        let mut written = 0;
        while written < data.len() {
            match ch.write_raw(&data[written..]) {
                Ok(0) | Err(_) => break,
                Ok(n) => written += n,
            }
        }
        self.stats.bytes_written += written as u64;
        written
    }

    fn write_formatted(&mut self, template: &str, args: &[Arg<'_>]) -> usize {
        if !self.mode.capabilities().is_writable() || !self.is_open() {
            return 0;
        }
        let Some(mut staging) = self.write_buffer.take() else {
            return 0;
        };
        staging.clear();
        // One slot is reserved for the terminator, as with snprintf.
        let bound = self.config.format_limit.saturating_sub(1);
        template::render(template.as_bytes(), args, bound, &mut staging);
        let written = self.write(&staging);
        self.write_buffer = Some(staging);
        written
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        self.reposition(pos)
    }

    fn length(&self) -> u64 {
        self.length
    }
}
