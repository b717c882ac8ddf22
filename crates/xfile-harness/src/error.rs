//! Harness errors.

use thiserror::Error;
use xfile_core::StreamError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// The stream's mode lacks the capability the command needs.
    #[error("mode '{mode}' does not allow {needed}")]
    Capability { mode: String, needed: &'static str },
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
}

impl HarnessError {
    /// Errno-style code for log records, when one applies.
    #[must_use]
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Stream(e) => Some(e.errno()),
            Self::Io(e) => e.raw_os_error(),
            Self::Capability { .. } => Some(EBADF),
            Self::Json(_) | Self::ShortWrite { .. } => None,
        }
    }
}

const EBADF: i32 = 9;
