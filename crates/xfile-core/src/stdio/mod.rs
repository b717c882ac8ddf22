//! Buffered sequential streams.
//!
//! Layers a chunked read buffer, lazy line-ending detection and line
//! assembly over a raw host channel. Writes pass straight through.

pub mod buffer;
pub mod channel;
pub mod error;
pub mod file;
pub mod line;
pub mod line_ending;
pub mod mode;
pub mod template;

pub use channel::RawChannel;
pub use error::StreamError;
pub use file::{FileStream, Lines, StreamOps, StreamStats};
pub use line_ending::LineEnding;
pub use mode::{Capabilities, Mode, parse_capabilities};
pub use template::Arg;
