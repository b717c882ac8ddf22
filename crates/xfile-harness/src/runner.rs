//! Stream operation runner.
//!
//! Each command opens one stream, drives it to completion and closes it.
//! When a log emitter is attached, open, line-ending detection, close and
//! failures are recorded as structured events carrying the stream's counters.

use std::io::Write;
use std::time::Instant;

use xfile_core::stdio::template;
use xfile_core::{Arg, FileStream, LineEnding, StreamConfig, StreamOps, StreamStats};

use crate::error::HarnessError;
use crate::structured_log::{LogEmitter, LogLevel, Outcome};

/// What one command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub line_ending: LineEnding,
    /// Bytes moved to or from the stream.
    pub bytes: u64,
    pub lines: u64,
    pub stats: StreamStats,
}

/// Drives streams for the CLI and logs what happened.
pub struct StreamRunner {
    config: StreamConfig,
    log: Option<LogEmitter>,
}

impl StreamRunner {
    #[must_use]
    pub fn new(config: StreamConfig) -> Self {
        Self { config, log: None }
    }

    #[must_use]
    pub fn with_log(mut self, emitter: LogEmitter) -> Self {
        self.log = Some(emitter);
        self
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Flush and hand back the emitter, if any.
    pub fn finish(mut self) -> Result<Option<LogEmitter>, HarnessError> {
        if let Some(log) = self.log.as_mut() {
            log.flush()?;
        }
        Ok(self.log)
    }

    /// Write every line of `path` to `out`, one per output line.
    pub fn lines(
        &mut self,
        path: &str,
        mode: &str,
        number: bool,
        out: &mut dyn Write,
    ) -> Result<RunSummary, HarnessError> {
        self.run(path, mode, "lines", |stream| {
            if !stream.capabilities().is_readable() {
                return Err(capability(stream, "reading"));
            }
            let mut count = 0u64;
            let mut bytes = 0u64;
            while let Some(line) = stream.read_line() {
                count += 1;
                bytes += line.len() as u64;
                if number {
                    write!(out, "{count:6}\t")?;
                }
                out.write_all(&line)?;
                out.write_all(b"\n")?;
            }
            Ok((bytes, count))
        })
    }

    /// Copy `path` to `out` through sized reads of `chunk` bytes.
    pub fn copy(
        &mut self,
        path: &str,
        chunk: usize,
        out: &mut dyn Write,
    ) -> Result<RunSummary, HarnessError> {
        self.run(path, "rb", "read", |stream| {
            let mut piece = vec![0u8; chunk.max(1)];
            let mut total = 0u64;
            loop {
                let n = stream.read(&mut piece);
                if n == 0 {
                    break;
                }
                out.write_all(&piece[..n])?;
                total += n as u64;
            }
            Ok((total, 0))
        })
    }

    /// Open `path` only to learn its line ending.
    pub fn detect(&mut self, path: &str) -> Result<LineEnding, HarnessError> {
        self.run(path, "r", "detect", |_| Ok((0, 0)))
            .map(|summary| summary.line_ending)
    }

    /// Render `template` with string arguments and write it to `path`.
    pub fn write(
        &mut self,
        path: &str,
        mode: &str,
        template_text: &str,
        args: &[String],
    ) -> Result<RunSummary, HarnessError> {
        let limit = self.config.format_limit.saturating_sub(1);
        self.run(path, mode, "write", |stream| {
            if !stream.capabilities().is_writable() {
                return Err(capability(stream, "writing"));
            }
            let args: Vec<Arg<'_>> = args.iter().map(|a| Arg::from(a.as_str())).collect();
            let mut preview = Vec::new();
            let needed = template::render(template_text.as_bytes(), &args, limit, &mut preview);
            let expected = needed.min(limit);
            let written = stream.write_formatted(template_text, &args);
            if written < expected {
                return Err(HarnessError::ShortWrite { written, expected });
            }
            Ok((written as u64, 0))
        })
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn run<F>(
        &mut self,
        path: &str,
        mode: &str,
        command: &str,
        body: F,
    ) -> Result<RunSummary, HarnessError>
    where
        F: FnOnce(&mut FileStream) -> Result<(u64, u64), HarnessError>,
    {
        let started = Instant::now();
        let mut stream = FileStream::create(path, mode).with_config(self.config);
        if let Err(err) = stream.open() {
            let err = HarnessError::from(err);
            self.log_failure(path, mode, command, &err)?;
            return Err(err);
        }
        self.log_open(&stream, command)?;
        self.log_detect(&stream)?;

        let result = body(&mut stream);
        stream.close()?;

        match result {
            Ok((bytes, lines)) => {
                let summary = RunSummary {
                    line_ending: stream.line_ending(),
                    bytes,
                    lines,
                    stats: stream.stats(),
                };
                self.log_close(&stream, command, started)?;
                Ok(summary)
            }
            Err(err) => {
                self.log_failure(path, mode, command, &err)?;
                Err(err)
            }
        }
    }

    fn log_open(&mut self, stream: &FileStream, command: &str) -> Result<(), HarnessError> {
        let Some(log) = self.log.as_mut() else {
            return Ok(());
        };
        let entry = log
            .entry(LogLevel::Debug, "stream_open")
            .with_stream(stream.path(), stream.mode().as_str())
            .with_line_ending(stream.line_ending().name())
            .with_details(serde_json::json!({
                "command": command,
                "length": stream.length(),
                "empty": stream.is_empty(),
                "chunk_size": self.config.chunk_size,
            }));
        log.emit_entry(entry)?;
        Ok(())
    }

    /// Detection runs inside `open` for readable, non-empty streams.
    fn log_detect(&mut self, stream: &FileStream) -> Result<(), HarnessError> {
        let Some(log) = self.log.as_mut() else {
            return Ok(());
        };
        if !stream.line_ending().is_known() {
            return Ok(());
        }
        let entry = log
            .entry(LogLevel::Debug, "stream_detect")
            .with_stream(stream.path(), stream.mode().as_str())
            .with_line_ending(stream.line_ending().name())
            .with_details(serde_json::json!({ "refills": stream.stats().refills }));
        log.emit_entry(entry)?;
        Ok(())
    }

    fn log_close(
        &mut self,
        stream: &FileStream,
        command: &str,
        started: Instant,
    ) -> Result<(), HarnessError> {
        let Some(log) = self.log.as_mut() else {
            return Ok(());
        };
        let elapsed = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let stats = stream.stats();
        // Channel errors end reads early without failing the command.
        let level = if stats.read_errors > 0 {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        let entry = log
            .entry(level, "stream_close")
            .with_stream(stream.path(), stream.mode().as_str())
            .with_line_ending(stream.line_ending().name())
            .with_outcome(Outcome::Pass)
            .with_stats(&stats)
            .with_latency_ns(elapsed)
            .with_details(serde_json::json!({ "command": command }));
        log.emit_entry(entry)?;
        Ok(())
    }

    fn log_failure(
        &mut self,
        path: &str,
        mode: &str,
        command: &str,
        err: &HarnessError,
    ) -> Result<(), HarnessError> {
        let Some(log) = self.log.as_mut() else {
            return Ok(());
        };
        let outcome = match err {
            HarnessError::Capability { .. } | HarnessError::ShortWrite { .. } => Outcome::Fail,
            _ => Outcome::Error,
        };
        let mut entry = log
            .entry(LogLevel::Error, "stream_error")
            .with_stream(path, mode)
            .with_outcome(outcome)
            .with_details(serde_json::json!({
                "command": command,
                "error": err.to_string(),
            }));
        if let Some(errno) = err.errno() {
            entry = entry.with_errno(errno);
        }
        log.emit_entry(entry)?;
        Ok(())
    }
}

fn capability(stream: &FileStream, needed: &'static str) -> HarnessError {
    HarnessError::Capability {
        mode: stream.mode().as_str().to_string(),
        needed,
    }
}
