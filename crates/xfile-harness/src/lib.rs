//! Driver and structured logging for xfile streams.
//!
//! This crate provides:
//! - [`runner::StreamRunner`]: runs stream operations against real files and
//!   records each step as a structured log event.
//! - [`structured_log`]: JSONL log records, an emitter and a schema validator.
//! - [`HarnessError`]: the error type shared by the runner and the CLI.

#![forbid(unsafe_code)]

pub mod error;
pub mod runner;
pub mod structured_log;

pub use error::HarnessError;
pub use runner::{RunSummary, StreamRunner};
pub use structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};
