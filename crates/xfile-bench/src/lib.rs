//! Fixtures shared by the stream benchmarks.

/// Text of `lines` lines, each `width` bytes of content plus `terminator`.
#[must_use]
pub fn text_fixture(lines: usize, width: usize, terminator: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(lines * (width + terminator.len()));
    for i in 0..lines {
        out.extend((0..width).map(|j| b'a' + ((i + j) % 26) as u8));
        out.extend_from_slice(terminator);
    }
    out
}
