//! # xfile-core
//!
//! Buffered sequential file streams with lazy line-ending detection.
//!
//! A [`FileStream`] reads through a fixed-size chunk buffer, discovers
//! whether its content uses LF, CR or CRLF terminators on open, and hands
//! out lines or arbitrary-size reads without re-reading the source. No
//! `unsafe` code is permitted at the crate level.

#![deny(unsafe_code)]

pub mod config;
pub mod stdio;

pub use config::StreamConfig;
pub use stdio::{
    Arg, Capabilities, FileStream, LineEnding, Mode, RawChannel, StreamError, StreamOps,
    StreamStats,
};
