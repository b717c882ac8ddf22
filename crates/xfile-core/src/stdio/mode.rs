//! Open-mode capabilities.
//!
//! A mode specifier is any combination of `r`, `w`, `+`, `b`, `a` in any
//! order. It decodes into an immutable capability bitmask that every stream
//! operation consults before touching the channel. Unknown characters are
//! ignored rather than rejected.

use std::fs::OpenOptions;

// ---------------------------------------------------------------------------
// Capability bitmask
// ---------------------------------------------------------------------------

/// Capability bits derived from a mode specifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const READABLE: u8 = 1 << 0;
    pub const WRITABLE: u8 = 1 << 1;
    pub const APPENDABLE: u8 = 1 << 2;
    pub const BINARY: u8 = 1 << 3;

    /// Empty mask: nothing is permitted.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    const fn has(self, bit: u8) -> bool {
        self.0 & bit == bit
    }

    #[must_use]
    pub const fn is_readable(self) -> bool {
        self.has(Self::READABLE)
    }

    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.has(Self::WRITABLE)
    }

    #[must_use]
    pub const fn is_appendable(self) -> bool {
        self.has(Self::APPENDABLE)
    }

    #[must_use]
    pub const fn is_binary(self) -> bool {
        self.has(Self::BINARY)
    }

    const fn with(self, bit: u8) -> Self {
        Self(self.0 | bit)
    }
}

/// Decode a mode specifier into capabilities.
///
/// `r` and `+` grant reading; `w`, `+` and `a` grant writing; `a` also marks
/// the stream appendable and `b` binary.
#[must_use]
pub fn parse_capabilities(mode: &str) -> Capabilities {
    mode.bytes().fold(Capabilities::empty(), |caps, c| match c {
        b'r' => caps.with(Capabilities::READABLE),
        b'w' => caps.with(Capabilities::WRITABLE),
        b'+' => caps
            .with(Capabilities::READABLE)
            .with(Capabilities::WRITABLE),
        b'a' => caps
            .with(Capabilities::WRITABLE)
            .with(Capabilities::APPENDABLE),
        b'b' => caps.with(Capabilities::BINARY),
        _ => caps,
    })
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// A parsed mode: the specifier text as given plus its capabilities.
///
/// The text is kept because host open semantics (create/truncate) depend on
/// which letters were given, not only on the capability bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    text: String,
    capabilities: Capabilities,
}

impl Mode {
    /// Parse a mode specifier. Never fails; unknown characters are dropped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            text: text.to_string(),
            capabilities: parse_capabilities(text),
        }
    }

    /// The specifier exactly as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// `w` and `a` create a missing file.
    #[must_use]
    pub fn creates(&self) -> bool {
        self.text.contains(['w', 'a'])
    }

    /// `w` truncates, unless `a` asks to keep existing content.
    #[must_use]
    pub fn truncates(&self) -> bool {
        self.text.contains('w') && !self.text.contains('a')
    }

    /// Host open options equivalent to this mode.
    #[must_use]
    pub fn open_options(&self) -> OpenOptions {
        let caps = self.capabilities;
        let mut opts = OpenOptions::new();
        opts.read(caps.is_readable())
            .write(caps.is_writable() && !caps.is_appendable())
            .append(caps.is_appendable())
            .create(self.creates())
            .truncate(self.truncates());
        opts
    }
}
