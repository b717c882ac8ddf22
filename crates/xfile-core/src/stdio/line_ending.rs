//! Line terminator detection.
//!
//! The terminator style is a property of the file content, not of the host
//! platform. It is decided once, from the first CR or LF byte in the file,
//! and then frozen for the lifetime of the open stream.

use std::fmt;
use std::io::{self, SeekFrom};

use super::buffer::ReadBuffer;
use super::channel::RawChannel;

pub const LF: u8 = b'\n';
pub const CR: u8 = b'\r';

/// Terminator style of a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// `\n` (Unix).
    Lf,
    /// `\r` (classic Mac OS).
    Cr,
    /// `\r\n` (Windows).
    CrLf,
    /// Not yet detected.
    #[default]
    Unknown,
}

impl LineEnding {
    /// The byte that starts a terminator, if known.
    #[must_use]
    pub const fn first_byte(self) -> Option<u8> {
        match self {
            Self::Lf => Some(LF),
            Self::Cr | Self::CrLf => Some(CR),
            Self::Unknown => None,
        }
    }

    /// Terminator width in bytes (0 while unknown).
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Lf | Self::Cr => 1,
            Self::CrLf => 2,
            Self::Unknown => 0,
        }
    }

    /// Terminator bytes, empty while unknown.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::Cr => b"\r",
            Self::CrLf => b"\r\n",
            Self::Unknown => b"",
        }
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lf => "lf",
            Self::Cr => "cr",
            Self::CrLf => "crlf",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify the first terminator byte given the byte after it.
///
/// `first` must be CR or LF. The CRLF lookahead is skipped for one-byte
/// files.
fn classify(first: u8, next: Option<u8>, length: u64) -> LineEnding {
    if first == LF {
        return LineEnding::Lf;
    }
    if length > 1 && next == Some(LF) {
        LineEnding::CrLf
    } else {
        LineEnding::Cr
    }
}

/// Scan the content from the start for its first terminator.
///
/// Pulls chunks through `buf` as needed, then rewinds `channel` to offset 0
/// and resets `buf`, so the caller observes the stream exactly as before the
/// scan. Content without any terminator byte is classified as LF.
pub fn detect<C: RawChannel>(
    buf: &mut ReadBuffer,
    channel: &mut C,
    length: u64,
) -> io::Result<LineEnding> {
    channel.seek_raw(SeekFrom::Start(0))?;
    buf.reset();

    let mut style = LineEnding::Lf;
    'scan: loop {
        if buf.is_drained() && buf.refill(channel) == 0 {
            break;
        }
        while let Some(byte) = buf.next_byte() {
            if byte != LF && byte != CR {
                continue;
            }
            if buf.is_drained() && !buf.is_exhausted() {
                buf.refill(channel);
            }
            style = classify(byte, buf.peek_byte(), length);
            break 'scan;
        }
    }

    channel.seek_raw(SeekFrom::Start(0))?;
    buf.reset();
    Ok(style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdio::mode::Mode;
    use std::io::{Cursor, Read, Seek, Write};

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

    fn run(content: &[u8], chunk: usize) -> LineEnding {
        let mut ch = Mem(Cursor::new(content.to_vec()));
        let mut buf = ReadBuffer::new(chunk);
        let style = detect(&mut buf, &mut ch, content.len() as u64).unwrap();
        assert_eq!(ch.tell().unwrap(), 0, "channel must be rewound");
        assert!(buf.is_drained() && !buf.is_exhausted());
        style
    }

    #[test]
    fn test_detect_lf() {
        assert_eq!(run(b"abc\ndef\n", 64), LineEnding::Lf);
    }

    #[test]
    fn test_detect_cr() {
        assert_eq!(run(b"abc\rdef\r", 64), LineEnding::Cr);
    }

    #[test]
    fn test_detect_crlf() {
        assert_eq!(run(b"abc\r\ndef\r\n", 64), LineEnding::CrLf);
    }

    #[test]
    fn test_first_terminator_wins_on_mixed_content() {
        assert_eq!(run(b"a\nb\r\nc\r", 64), LineEnding::Lf);
        assert_eq!(run(b"a\r\nb\nc", 64), LineEnding::CrLf);
    }

    #[test]
    fn test_lf_then_cr_is_plain_lf() {
        assert_eq!(run(b"a\n\rb", 64), LineEnding::Lf);
    }

    #[test]
    fn test_single_terminator_byte_uses_single_byte_rule() {
        assert_eq!(run(b"\r", 64), LineEnding::Cr);
        assert_eq!(run(b"\n", 64), LineEnding::Lf);
    }

    #[test]
    fn test_no_terminator_defaults_to_lf() {
        assert_eq!(run(b"just text", 64), LineEnding::Lf);
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        // CR is the last byte of the first chunk, LF the first of the second.
        assert_eq!(run(b"abc\r\nxyz", 4), LineEnding::CrLf);
    }

    #[test]
    fn test_terminator_beyond_first_chunk() {
        let mut content = vec![b'x'; 50];
        content.extend_from_slice(b"\r\n");
        assert_eq!(run(&content, 8), LineEnding::CrLf);
    }

    #[test]
    fn test_line_ending_bytes() {
        assert_eq!(LineEnding::CrLf.as_bytes(), b"\r\n");
        assert_eq!(LineEnding::CrLf.first_byte(), Some(CR));
        assert_eq!(LineEnding::Lf.width(), 1);
        assert_eq!(LineEnding::Unknown.first_byte(), None);
        assert_eq!(LineEnding::default(), LineEnding::Unknown);
        assert_eq!(LineEnding::CrLf.to_string(), "crlf");
    }
}
