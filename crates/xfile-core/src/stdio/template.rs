//! printf-style template rendering for formatted writes.
//!
//! Supports the integer, string and character subset of the C directive
//! grammar: `%[flags][width][.precision][length]conversion` with flags
//! `- + space # 0`, fixed or `*` width and precision, length modifiers
//! `hh h l ll z t j` (accepted and ignored, arguments are already 64-bit),
//! and conversions `d i u x X o s c`. `%%` emits a literal percent.
//!
//! Rendering is bounded: the caller supplies a byte limit and output past it
//! is dropped, matching `snprintf` into a fixed array.

// ---------------------------------------------------------------------------
// Directive types
// ---------------------------------------------------------------------------

/// Flags parsed from a directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub left_justify: bool, // '-'
    pub force_sign: bool,   // '+'
    pub space_sign: bool,   // ' '
    pub alt_form: bool,     // '#'
    pub zero_pad: bool,     // '0'
}

/// Width or precision: absent, literal, or taken from the argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    None,
    Fixed(usize),
    FromArg,
}

/// A parsed conversion directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive {
    pub flags: Flags,
    pub width: Amount,
    pub precision: Amount,
    pub conversion: u8,
}

/// Typed template argument.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Int(i64),
    Uint(u64),
    Str(&'a [u8]),
    Char(u8),
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Str(s.as_bytes())
    }
}

impl From<i64> for Arg<'_> {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<u64> for Arg<'_> {
    fn from(v: u64) -> Self {
        Arg::Uint(v)
    }
}

impl Arg<'_> {
    // Strings feeding numeric conversions are read as decimal text, so
    // command-line callers can pass every argument as a string.
    fn as_signed(self) -> Option<i64> {
        match self {
            Arg::Int(v) => Some(v),
            Arg::Uint(v) => Some(v as i64),
            Arg::Char(c) => Some(i64::from(c)),
            Arg::Str(s) => std::str::from_utf8(s).ok()?.trim().parse().ok(),
        }
    }

    fn as_unsigned(self) -> Option<u64> {
        match self {
            Arg::Int(v) => Some(v as u64),
            Arg::Uint(v) => Some(v),
            Arg::Char(c) => Some(u64::from(c)),
            Arg::Str(s) => {
                let text = std::str::from_utf8(s).ok()?.trim();
                text.parse::<u64>()
                    .ok()
                    .or_else(|| text.parse::<i64>().ok().map(|v| v as u64))
            }
        }
    }
}

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a [u8]),
    Percent,
    Directive(Directive),
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse one directive from the bytes following a '%'.
///
/// Returns the directive and how many bytes it spans, or `None` if the
/// conversion character is missing or unsupported.
pub fn parse_directive(fmt: &[u8]) -> Option<(Directive, usize)> {
    let mut pos = 0;

    let mut flags = Flags::default();
    while let Some(&c) = fmt.get(pos) {
        match c {
            b'-' => flags.left_justify = true,
            b'+' => flags.force_sign = true,
            b' ' => flags.space_sign = true,
            b'#' => flags.alt_form = true,
            b'0' => flags.zero_pad = true,
            _ => break,
        }
        pos += 1;
    }
    if flags.force_sign {
        flags.space_sign = false;
    }
    if flags.left_justify {
        flags.zero_pad = false;
    }

    let width = parse_amount(fmt, &mut pos, Amount::None);
    let precision = if fmt.get(pos) == Some(&b'.') {
        pos += 1;
        parse_amount(fmt, &mut pos, Amount::Fixed(0))
    } else {
        Amount::None
    };

    // Length modifiers carry no meaning for 64-bit arguments.
    while matches!(fmt.get(pos), Some(b'h' | b'l' | b'z' | b't' | b'j')) {
        pos += 1;
    }

    let conversion = *fmt.get(pos)?;
    if !matches!(
        conversion,
        b'd' | b'i' | b'u' | b'x' | b'X' | b'o' | b's' | b'c'
    ) {
        return None;
    }

    Some((
        Directive {
            flags,
            width,
            precision,
            conversion,
        },
        pos + 1,
    ))
}

fn parse_amount(fmt: &[u8], pos: &mut usize, empty: Amount) -> Amount {
    if fmt.get(*pos) == Some(&b'*') {
        *pos += 1;
        return Amount::FromArg;
    }
    let start = *pos;
    let mut value = 0_usize;
    while let Some(&d) = fmt.get(*pos).filter(|d| d.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(usize::from(d - b'0'));
        *pos += 1;
    }
    if *pos > start {
        Amount::Fixed(value)
    } else {
        empty
    }
}

/// Split a template into literal runs and directives.
///
/// A malformed directive keeps its '%' as a literal byte.
pub fn parse_template(fmt: &[u8]) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < fmt.len() {
        let start = pos;
        while pos < fmt.len() && fmt[pos] != b'%' {
            pos += 1;
        }
        if pos > start {
            segments.push(Segment::Literal(&fmt[start..pos]));
        }
        if pos >= fmt.len() {
            break;
        }
        pos += 1;
        if fmt.get(pos) == Some(&b'%') {
            segments.push(Segment::Percent);
            pos += 1;
            continue;
        }
        match parse_directive(&fmt[pos..]) {
            Some((directive, consumed)) => {
                segments.push(Segment::Directive(directive));
                pos += consumed;
            }
            None => segments.push(Segment::Literal(&fmt[pos - 1..pos])),
        }
    }
    segments
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render `template` with `args` into `out`, keeping at most `limit` bytes.
///
/// Returns the number of bytes the full rendering would have needed, so a
/// caller can tell whether truncation happened.
pub fn render(template: &[u8], args: &[Arg<'_>], limit: usize, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    let mut next_arg = args.iter().copied();

    for segment in parse_template(template) {
        match segment {
            Segment::Literal(bytes) => out.extend_from_slice(bytes),
            Segment::Percent => out.push(b'%'),
            Segment::Directive(mut d) => {
                if d.width == Amount::FromArg {
                    let w = next_arg.next().and_then(Arg::as_signed).unwrap_or(0);
                    if w < 0 {
                        d.flags.left_justify = true;
                        d.flags.zero_pad = false;
                    }
                    d.width = Amount::Fixed(w.unsigned_abs() as usize);
                }
                if d.precision == Amount::FromArg {
                    let p = next_arg.next().and_then(Arg::as_signed).unwrap_or(-1);
                    d.precision = if p < 0 {
                        Amount::None
                    } else {
                        Amount::Fixed(p as usize)
                    };
                }
                if let Some(arg) = next_arg.next() {
                    render_directive(&d, arg, out);
                }
            }
        }
    }

    let needed = out.len() - start;
    out.truncate(start + needed.min(limit));
    needed
}

fn render_directive(d: &Directive, arg: Arg<'_>, out: &mut Vec<u8>) {
    match d.conversion {
        b'd' | b'i' => {
            if let Some(v) = arg.as_signed() {
                render_signed(v, d, out);
            }
        }
        b'u' | b'x' | b'X' | b'o' => {
            if let Some(v) = arg.as_unsigned() {
                render_unsigned(v, d, out);
            }
        }
        b's' => {
            if let Arg::Str(s) = arg {
                render_str(s, d, out);
            }
        }
        b'c' => {
            let c = match arg {
                Arg::Char(c) => Some(c),
                Arg::Int(v) => Some(v as u8),
                Arg::Uint(v) => Some(v as u8),
                Arg::Str(s) => s.first().copied(),
            };
            if let Some(c) = c {
                render_str(&[c], &Directive { precision: Amount::None, ..*d }, out);
            }
        }
        _ => {}
    }
}

fn render_signed(value: i64, d: &Directive, out: &mut Vec<u8>) {
    let sign = if value < 0 {
        Some(b'-')
    } else if d.flags.force_sign {
        Some(b'+')
    } else if d.flags.space_sign {
        Some(b' ')
    } else {
        None
    };
    let mut digits = [0u8; 64];
    let count = render_digits(value.unsigned_abs(), 10, false, &mut digits);
    let zero_value = value == 0;
    emit_number(sign, b"", &digits[64 - count..], zero_value, d, out);
}

fn render_unsigned(value: u64, d: &Directive, out: &mut Vec<u8>) {
    let (base, upper) = match d.conversion {
        b'o' => (8, false),
        b'x' => (16, false),
        b'X' => (16, true),
        _ => (10, false),
    };
    let prefix: &[u8] = match (d.flags.alt_form && value != 0, d.conversion) {
        (true, b'o') => b"0",
        (true, b'x') => b"0x",
        (true, b'X') => b"0X",
        _ => b"",
    };
    let mut digits = [0u8; 64];
    let count = render_digits(value, base, upper, &mut digits);
    emit_number(None, prefix, &digits[64 - count..], value == 0, d, out);
}

/// Shared width/precision/padding layout for integer conversions.
fn emit_number(
    sign: Option<u8>,
    prefix: &[u8],
    digits: &[u8],
    zero_value: bool,
    d: &Directive,
    out: &mut Vec<u8>,
) {
    // Explicit precision 0 with value 0 prints no digits.
    let digits: &[u8] = if zero_value && d.precision == Amount::Fixed(0) {
        b""
    } else {
        digits
    };
    let min_digits = match d.precision {
        Amount::Fixed(p) => p,
        _ => 0,
    };
    let zeros = min_digits.saturating_sub(digits.len());
    let content = usize::from(sign.is_some()) + prefix.len() + zeros + digits.len();
    let pad_total = width_of(d).saturating_sub(content);
    // A precision disables the '0' flag for integers.
    let zero_pad = d.flags.zero_pad && d.precision == Amount::None;

    if !d.flags.left_justify && !zero_pad {
        pad(out, b' ', pad_total);
    }
    out.extend(sign);
    out.extend_from_slice(prefix);
    if !d.flags.left_justify && zero_pad {
        pad(out, b'0', pad_total);
    }
    pad(out, b'0', zeros);
    out.extend_from_slice(digits);
    if d.flags.left_justify {
        pad(out, b' ', pad_total);
    }
}

fn render_str(s: &[u8], d: &Directive, out: &mut Vec<u8>) {
    let shown = match d.precision {
        Amount::Fixed(p) => &s[..s.len().min(p)],
        _ => s,
    };
    let pad_total = width_of(d).saturating_sub(shown.len());
    if !d.flags.left_justify {
        pad(out, b' ', pad_total);
    }
    out.extend_from_slice(shown);
    if d.flags.left_justify {
        pad(out, b' ', pad_total);
    }
}

fn width_of(d: &Directive) -> usize {
    match d.width {
        Amount::Fixed(w) => w,
        _ => 0,
    }
}

/// Write `value` right-aligned into `buf`, returning the digit count.
fn render_digits(mut value: u64, base: u64, upper: bool, buf: &mut [u8; 64]) -> usize {
    if value == 0 {
        buf[63] = b'0';
        return 1;
    }
    let alpha = if upper { b'A' } else { b'a' };
    let mut pos = 64;
    while value > 0 {
        pos -= 1;
        let digit = (value % base) as u8;
        buf[pos] = if digit < 10 {
            b'0' + digit
        } else {
            alpha + (digit - 10)
        };
        value /= base;
    }
    64 - pos
}

fn pad(out: &mut Vec<u8>, byte: u8, count: usize) {
    // Widths are user controlled; cap a single pad run.
    out.resize(out.len() + count.min(4096), byte);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(template: &str, args: &[Arg<'_>]) -> String {
        let mut out = Vec::new();
        render(template.as_bytes(), args, usize::MAX, &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_directive_full() {
        let (d, consumed) = parse_directive(b"-08.3lld").unwrap();
        assert_eq!(consumed, 8);
        assert!(d.flags.left_justify);
        assert!(!d.flags.zero_pad); // '-' overrides '0'
        assert_eq!(d.width, Amount::Fixed(8));
        assert_eq!(d.precision, Amount::Fixed(3));
        assert_eq!(d.conversion, b'd');
    }

    #[test]
    fn test_parse_star_amounts() {
        let (d, _) = parse_directive(b"*.*s").unwrap();
        assert_eq!(d.width, Amount::FromArg);
        assert_eq!(d.precision, Amount::FromArg);
    }

    #[test]
    fn test_parse_rejects_float() {
        assert!(parse_directive(b"f").is_none());
        assert!(parse_directive(b"").is_none());
    }

    #[test]
    fn test_template_segments() {
        let segments = parse_template(b"n=%d, 100%%");
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], Segment::Literal(b"n="));
        assert!(matches!(segments[1], Segment::Directive(d) if d.conversion == b'd'));
        assert_eq!(segments[2], Segment::Literal(b", 100"));
        assert_eq!(segments[3], Segment::Percent);
    }

    #[test]
    fn test_malformed_directive_is_literal() {
        assert_eq!(fmt("50%q", &[]), "50%q");
        assert_eq!(fmt("tail%", &[]), "tail%");
    }

    #[test]
    fn test_signed() {
        assert_eq!(fmt("%d", &[Arg::Int(42)]), "42");
        assert_eq!(fmt("%d", &[Arg::Int(-123)]), "-123");
        assert_eq!(fmt("%+d", &[Arg::Int(5)]), "+5");
        assert_eq!(fmt("% d", &[Arg::Int(5)]), " 5");
        assert_eq!(fmt("%8d|", &[Arg::Int(42)]), "      42|");
        assert_eq!(fmt("%-8d|", &[Arg::Int(42)]), "42      |");
        assert_eq!(fmt("%08d", &[Arg::Int(-42)]), "-0000042");
        assert_eq!(fmt("%.4d", &[Arg::Int(7)]), "0007");
        assert_eq!(fmt("%.0d|", &[Arg::Int(0)]), "|");
        assert_eq!(fmt("%d", &[Arg::Int(i64::MIN)]), "-9223372036854775808");
    }

    #[test]
    fn test_unsigned_bases() {
        assert_eq!(fmt("%u", &[Arg::Uint(u64::MAX)]), "18446744073709551615");
        assert_eq!(fmt("%#x", &[Arg::Uint(255)]), "0xff");
        assert_eq!(fmt("%X", &[Arg::Uint(255)]), "FF");
        assert_eq!(fmt("%#o", &[Arg::Uint(8)]), "010");
        assert_eq!(fmt("%#x", &[Arg::Uint(0)]), "0");
        assert_eq!(fmt("%#010x", &[Arg::Uint(255)]), "0x000000ff");
    }

    #[test]
    fn test_strings_and_chars() {
        assert_eq!(fmt("%s!", &["hello".into()]), "hello!");
        assert_eq!(fmt("%.3s", &["hello".into()]), "hel");
        assert_eq!(fmt("[%6s]", &["ab".into()]), "[    ab]");
        assert_eq!(fmt("[%-6s]", &["ab".into()]), "[ab    ]");
        assert_eq!(fmt("%c%c", &[Arg::Char(b'o'), Arg::Int(107)]), "ok");
    }

    #[test]
    fn test_star_width_from_args() {
        assert_eq!(fmt("[%*d]", &[Arg::Int(5), Arg::Int(42)]), "[   42]");
        assert_eq!(fmt("[%*d]", &[Arg::Int(-5), Arg::Int(42)]), "[42   ]");
        assert_eq!(fmt("%.*s", &[Arg::Int(2), "hello".into()]), "he");
    }

    #[test]
    fn test_missing_and_mismatched_args_render_nothing() {
        assert_eq!(fmt("a%db", &[]), "ab");
        assert_eq!(fmt("a%sb", &[Arg::Int(1)]), "ab");
        assert_eq!(fmt("a%db", &["x".into()]), "ab");
    }

    #[test]
    fn test_numeric_text_feeds_numeric_conversions() {
        assert_eq!(fmt("%05d", &["42".into()]), "00042");
        assert_eq!(fmt("%x", &["255".into()]), "ff");
        assert_eq!(fmt("%u", &["-1".into()]), "18446744073709551615");
    }

    #[test]
    fn test_render_truncates_to_limit() {
        let mut out = Vec::new();
        let needed = render(b"%s", &["abcdefgh".into()], 5, &mut out);
        assert_eq!(needed, 8);
        assert_eq!(&out, b"abcde");
    }

    #[test]
    fn test_pad_is_capped() {
        let mut out = Vec::new();
        render(b"%100000d", &[Arg::Int(1)], usize::MAX, &mut out);
        assert_eq!(out.len(), 4096 + 1);
    }
}
