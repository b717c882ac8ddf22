//! Stream errors.
//!
//! Only conditions a caller must act on are errors. Missing capabilities,
//! reads on a closed stream and end of data are reported through zero-byte
//! or `None` results instead.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    /// The backing resource could not be opened.
    #[error("cannot open {path}: {source}")]
    ResourceUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },
    /// Operation needs an open stream.
    #[error("stream is not open")]
    NotOpen,
    /// Streams cannot be reopened after close; create a fresh one.
    #[error("stream {path} was already opened once")]
    Reopen { path: String },
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl StreamError {
    /// Closest errno value, for callers reporting in C terms.
    #[must_use]
    pub fn errno(&self) -> i32 {
        match self {
            Self::ResourceUnavailable { source, .. } => source.raw_os_error().unwrap_or(ENOENT),
            Self::NotOpen | Self::Reopen { .. } => EBADF,
            Self::Io(e) => e.raw_os_error().unwrap_or(EIO),
        }
    }
}

const ENOENT: i32 = 2;
const EIO: i32 = 5;
const EBADF: i32 = 9;
