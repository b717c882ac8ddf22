//! Stream tuning configuration.
//!
//! Defaults can be overridden per process through environment variables:
//! - `XFILE_CHUNK_SIZE`: read buffer capacity in bytes (default 512 KiB).
//! - `XFILE_LINE_CAPACITY`: initial line buffer capacity (default 1024).
//! - `XFILE_GROWTH_FACTOR`: line buffer growth multiplier (default 1.5).
//! - `XFILE_FORMAT_LIMIT`: formatted write staging bound (default 1024).
//!
//! Parsing is lenient: a missing or unparsable value keeps the default,
//! sizes are raised to at least 1, and a growth factor that would not grow
//! falls back to the default.

use crate::stdio::buffer::CHUNK_SIZE;

pub const DEFAULT_LINE_CAPACITY: usize = 1024;
pub const DEFAULT_GROWTH_FACTOR: f64 = 1.5;
pub const DEFAULT_FORMAT_LIMIT: usize = 1024;

pub const ENV_CHUNK_SIZE: &str = "XFILE_CHUNK_SIZE";
pub const ENV_LINE_CAPACITY: &str = "XFILE_LINE_CAPACITY";
pub const ENV_GROWTH_FACTOR: &str = "XFILE_GROWTH_FACTOR";
pub const ENV_FORMAT_LIMIT: &str = "XFILE_FORMAT_LIMIT";

/// Buffer sizing for a [`FileStream`](crate::stdio::FileStream).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConfig {
    /// Read buffer capacity; one refill pulls at most this many bytes.
    pub chunk_size: usize,
    /// Starting capacity of the per-line output buffer.
    pub line_initial_capacity: usize,
    /// Multiplier applied to the line buffer capacity when it fills up.
    pub line_growth_factor: f64,
    /// Size of the formatted-write staging buffer, terminator slot included.
    pub format_limit: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            line_initial_capacity: DEFAULT_LINE_CAPACITY,
            line_growth_factor: DEFAULT_GROWTH_FACTOR,
            format_limit: DEFAULT_FORMAT_LIMIT,
        }
    }
}

impl StreamConfig {
    /// Defaults with any environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, CLI, tests).
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = Self::default();
        Self {
            chunk_size: parse_size(lookup(ENV_CHUNK_SIZE).as_deref()).unwrap_or(base.chunk_size),
            line_initial_capacity: parse_size(lookup(ENV_LINE_CAPACITY).as_deref())
                .unwrap_or(base.line_initial_capacity),
            line_growth_factor: parse_factor(lookup(ENV_GROWTH_FACTOR).as_deref())
                .unwrap_or(base.line_growth_factor),
            format_limit: parse_size(lookup(ENV_FORMAT_LIMIT).as_deref())
                .unwrap_or(base.format_limit),
        }
    }

    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_line_capacity(mut self, capacity: usize) -> Self {
        self.line_initial_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_growth_factor(mut self, factor: f64) -> Self {
        if factor.is_finite() && factor > 1.0 {
            self.line_growth_factor = factor;
        }
        self
    }

    #[must_use]
    pub fn with_format_limit(mut self, limit: usize) -> Self {
        self.format_limit = limit.max(1);
        self
    }
}

/// Accepts plain decimal or a `k`/`m` suffix (KiB/MiB).
fn parse_size(raw: Option<&str>) -> Option<usize> {
    let raw = raw?.trim().to_ascii_lowercase();
    let (digits, scale) = if let Some(d) = raw.strip_suffix('k') {
        (d, 1024)
    } else if let Some(d) = raw.strip_suffix('m') {
        (d, 1024 * 1024)
    } else {
        (raw.as_str(), 1)
    };
    let value: usize = digits.trim().parse().ok()?;
    Some(value.saturating_mul(scale).max(1))
}

fn parse_factor(raw: Option<&str>) -> Option<f64> {
    let value: f64 = raw?.trim().parse().ok()?;
    (value.is_finite() && value > 1.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = StreamConfig::default();
        assert_eq!(cfg.chunk_size, 512 * 1024);
        assert_eq!(cfg.line_initial_capacity, 1024);
        assert_eq!(cfg.line_growth_factor, 1.5);
        assert_eq!(cfg.format_limit, 1024);
    }

    #[test]
    fn overrides_parse_sizes_and_suffixes() {
        let cfg = StreamConfig::from_lookup(lookup_from(&[
            (ENV_CHUNK_SIZE, "64k"),
            (ENV_LINE_CAPACITY, " 16 "),
            (ENV_GROWTH_FACTOR, "2.0"),
            (ENV_FORMAT_LIMIT, "1M"),
        ]));
        assert_eq!(cfg.chunk_size, 64 * 1024);
        assert_eq!(cfg.line_initial_capacity, 16);
        assert_eq!(cfg.line_growth_factor, 2.0);
        assert_eq!(cfg.format_limit, 1024 * 1024);
    }

    #[test]
    fn bogus_values_keep_defaults() {
        let cfg = StreamConfig::from_lookup(lookup_from(&[
            (ENV_CHUNK_SIZE, "lots"),
            (ENV_GROWTH_FACTOR, "0.5"),
            (ENV_FORMAT_LIMIT, "-3"),
        ]));
        assert_eq!(cfg, StreamConfig::default());
    }

    #[test]
    fn zero_sizes_are_raised_to_one() {
        let cfg = StreamConfig::from_lookup(lookup_from(&[(ENV_CHUNK_SIZE, "0")]));
        assert_eq!(cfg.chunk_size, 1);
        assert_eq!(StreamConfig::default().with_line_capacity(0).line_initial_capacity, 1);
    }

    #[test]
    fn builder_rejects_non_growing_factor() {
        let cfg = StreamConfig::default()
            .with_growth_factor(1.0)
            .with_growth_factor(f64::NAN);
        assert_eq!(cfg.line_growth_factor, DEFAULT_GROWTH_FACTOR);
        assert_eq!(StreamConfig::default().with_growth_factor(3.0).line_growth_factor, 3.0);
    }
}
