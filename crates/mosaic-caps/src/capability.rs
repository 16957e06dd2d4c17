#![forbid(unsafe_code)]

//! A single terminal capability: template string, padding, and cost.
//!
//! Templates use the terminfo parameter language (`%p1`-positional
//! substitution, a small arithmetic stack, `%?…%t…%e…%;` conditionals) plus
//! `$<n>` padding directives. Expansion is bit-exact with respect to the
//! template; padding directives are stripped from the produced bytes and
//! accounted for in the capability's duration instead.
//!
//! # Invariants
//!
//! 1. A capability with no template is *unsupported*: [`Capability::expand`]
//!    returns `None` and [`Capability::cost`] returns [`Cost::INFINITE`], so
//!    no planner ever selects it.
//! 2. [`Cost`] orders by `(time, bytes)`. The byte count breaks ties when the
//!    baud-scaled time component rounds to zero on fast terminals.
//! 3. Expansion is a pure function of the template and its parameters.

use smallvec::SmallVec;

/// Transmission cost of a capability, in tenths of a millisecond plus a
/// byte-length tiebreaker.
///
/// Derived `Ord` compares `time` first, then `bytes` (field order), which is
/// exactly the lexicographic order the planners rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Cost {
    /// Estimated wire time in tenths of a millisecond.
    pub time: u32,
    /// Literal byte length (padding directives excluded).
    pub bytes: u32,
}

impl Cost {
    /// Free.
    pub const ZERO: Self = Self { time: 0, bytes: 0 };

    /// Sentinel for "unsupported"; never chosen by a planner and absorbing
    /// under addition.
    pub const INFINITE: Self = Self {
        time: u32::MAX,
        bytes: u32::MAX,
    };

    /// Check for the unsupported sentinel.
    #[inline]
    pub const fn is_infinite(self) -> bool {
        self.time == u32::MAX
    }

    /// Saturating sum; anything plus [`Cost::INFINITE`] stays infinite.
    #[inline]
    pub const fn add(self, other: Self) -> Self {
        if self.is_infinite() || other.is_infinite() {
            return Self::INFINITE;
        }
        Self {
            time: self.time.saturating_add(other.time),
            bytes: self.bytes.saturating_add(other.bytes),
        }
    }

    /// Saturating multiply, for repeated single-step capabilities.
    #[inline]
    pub const fn times(self, n: u32) -> Self {
        if self.is_infinite() {
            return Self::INFINITE;
        }
        Self {
            time: self.time.saturating_mul(n),
            bytes: self.bytes.saturating_mul(n),
        }
    }
}

/// A named terminal control sequence, possibly parameterized, possibly absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capability {
    template: Option<Box<str>>,
    /// Estimated emitted length in bytes, padding stripped.
    literal_len: u32,
    /// Padding duration in tenths of a millisecond.
    pad_tenths: u32,
    /// Padding is multiplied by the number of affected lines (`$<n*>`).
    pad_per_line: bool,
}

impl Capability {
    /// An absent capability.
    pub const fn unsupported() -> Self {
        Self {
            template: None,
            literal_len: 0,
            pad_tenths: 0,
            pad_per_line: false,
        }
    }

    /// Build a capability from a terminfo-style template.
    ///
    /// Padding directives are parsed out of the template here so that
    /// [`cost`](Self::cost) is a table lookup, not a parse.
    pub fn new(template: &str) -> Self {
        let (pad_tenths, pad_per_line) = parse_padding(template.as_bytes());
        Self {
            template: Some(template.into()),
            literal_len: estimate_len(template.as_bytes()),
            pad_tenths,
            pad_per_line,
        }
    }

    /// Whether the capability exists on this terminal.
    #[inline]
    pub const fn is_supported(&self) -> bool {
        self.template.is_some()
    }

    /// The raw template, if present.
    #[inline]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Transmission cost for `affected` lines at the given baud rate.
    ///
    /// Unsupported capabilities cost [`Cost::INFINITE`].
    pub fn cost(&self, affected: u16, baud: u32) -> Cost {
        if self.template.is_none() {
            return Cost::INFINITE;
        }
        // 9 bits per byte on the wire, expressed in tenths of a millisecond:
        // seconds-per-byte = 9 / baud, tenths-of-ms = 90_000 / baud.
        let tenths_per_byte = 90_000 / baud.max(1);
        let pad = if self.pad_per_line {
            self.pad_tenths.saturating_mul(affected.max(1) as u32)
        } else {
            self.pad_tenths
        };
        Cost {
            time: self.literal_len.saturating_mul(tenths_per_byte).saturating_add(pad),
            bytes: self.literal_len,
        }
    }

    /// Expand the template with positional parameters.
    ///
    /// Returns `None` when the capability is unsupported.
    pub fn expand(&self, params: &[i32]) -> Option<Vec<u8>> {
        let mut out = Vec::new();
        self.expand_into(params, &mut out).then_some(out)
    }

    /// Expand the template, appending to `out`.
    ///
    /// Returns `false` (leaving `out` untouched) when unsupported.
    pub fn expand_into(&self, params: &[i32], out: &mut Vec<u8>) -> bool {
        let Some(template) = self.template.as_deref() else {
            return false;
        };
        expand_template(template.as_bytes(), params, out);
        true
    }
}

/// Parse `$<n>` / `$<n.m>` / `$<n*>` padding out of a template.
///
/// Returns total padding in tenths of a millisecond and whether any directive
/// carried the per-line `*` flag.
fn parse_padding(bytes: &[u8]) -> (u32, bool) {
    let mut tenths = 0u32;
    let mut per_line = false;
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'<' {
            let mut j = i + 2;
            let mut whole = 0u32;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                whole = whole * 10 + (bytes[j] - b'0') as u32;
                j += 1;
            }
            let mut t = whole * 10;
            if j < bytes.len() && bytes[j] == b'.' {
                j += 1;
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    t += (bytes[j] - b'0') as u32;
                    j += 1;
                }
            }
            while j < bytes.len() && bytes[j] != b'>' {
                if bytes[j] == b'*' {
                    per_line = true;
                }
                j += 1;
            }
            tenths = tenths.saturating_add(t);
            i = j + 1;
        } else {
            i += 1;
        }
    }
    (tenths, per_line)
}

/// Estimate the emitted byte length of a template.
///
/// `%`-operators that push or transform parameters emit nothing; `%d` is
/// counted as two bytes (the common case for cursor coordinates). This is an
/// estimate used only for cost comparison, never for buffer sizing.
fn estimate_len(bytes: &[u8]) -> u32 {
    let mut len = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if i + 1 < bytes.len() && bytes[i + 1] == b'<' => {
                while i < bytes.len() && bytes[i] != b'>' {
                    i += 1;
                }
                i += 1;
            }
            b'%' if i + 1 < bytes.len() => {
                let op = bytes[i + 1];
                i += 2;
                match op {
                    b'%' => len += 1,
                    b'd' => len += 2,
                    b'c' => len += 1,
                    b'p' => i += 1,
                    b'{' => {
                        while i < bytes.len() && bytes[i] != b'}' {
                            i += 1;
                        }
                        i += 1;
                    }
                    b'\'' => i += 2,
                    b'0' | b'2' | b'3' => {
                        // Width-prefixed decimal; count the width.
                        len += if op == b'0' { 2 } else { (op - b'0') as u32 };
                        while i < bytes.len() && bytes[i] != b'd' {
                            i += 1;
                        }
                        i += 1;
                    }
                    _ => {}
                }
            }
            _ => {
                len += 1;
                i += 1;
            }
        }
    }
    len
}

/// Run the terminfo parameter stack machine.
///
/// Supported operators: `%%`, `%p1`..`%p9`, `%d` (with optional `2`/`3`
/// width, zero-padded or not), `%c`, `%i`, `%{n}`, `%'c'`,
/// `%+ %- %* %/ %m`, `%& %| %^`, `%= %> %<`, `%A %O`, `%! %~`, and the
/// `%? %t %e %;` conditional. Unknown operators are ignored. Padding
/// directives are stripped.
fn expand_template(bytes: &[u8], params: &[i32], out: &mut Vec<u8>) {
    let mut p = [0i32; 9];
    for (slot, &v) in p.iter_mut().zip(params.iter()) {
        *slot = v;
    }

    let mut stack: SmallVec<[i32; 8]> = SmallVec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'<' {
            while i < bytes.len() && bytes[i] != b'>' {
                i += 1;
            }
            i += 1;
            continue;
        }
        if b != b'%' {
            out.push(b);
            i += 1;
            continue;
        }
        i += 1;
        if i >= bytes.len() {
            break;
        }
        let op = bytes[i];
        i += 1;
        match op {
            b'%' => out.push(b'%'),
            b'i' => {
                p[0] = p[0].wrapping_add(1);
                p[1] = p[1].wrapping_add(1);
            }
            b'p' => {
                if i < bytes.len() && bytes[i].is_ascii_digit() {
                    let n = (bytes[i] - b'0') as usize;
                    i += 1;
                    if (1..=9).contains(&n) {
                        stack.push(p[n - 1]);
                    }
                }
            }
            b'd' => push_decimal(stack.pop().unwrap_or(0), 0, false, out),
            b'0' | b'2' | b'3' => {
                // Width-prefixed %d: %2d, %3d, %02d, %03d.
                let zero_pad = op == b'0';
                let width = if zero_pad {
                    let w = bytes.get(i).copied().unwrap_or(b'0');
                    i += 1;
                    (w - b'0') as usize
                } else {
                    (op - b'0') as usize
                };
                if bytes.get(i) == Some(&b'd') {
                    i += 1;
                    push_decimal(stack.pop().unwrap_or(0), width, zero_pad, out);
                }
            }
            b'c' => out.push(stack.pop().unwrap_or(0) as u8),
            b'{' => {
                let mut v = 0i32;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    v = v.wrapping_mul(10).wrapping_add((bytes[i] - b'0') as i32);
                    i += 1;
                }
                if bytes.get(i) == Some(&b'}') {
                    i += 1;
                }
                stack.push(v);
            }
            b'\'' => {
                if i < bytes.len() {
                    stack.push(bytes[i] as i32);
                    i += 1;
                }
                if bytes.get(i) == Some(&b'\'') {
                    i += 1;
                }
            }
            b'+' | b'-' | b'*' | b'/' | b'm' | b'&' | b'|' | b'^' | b'=' | b'>' | b'<' | b'A'
            | b'O' => {
                let y = stack.pop().unwrap_or(0);
                let x = stack.pop().unwrap_or(0);
                let v = match op {
                    b'+' => x.wrapping_add(y),
                    b'-' => x.wrapping_sub(y),
                    b'*' => x.wrapping_mul(y),
                    b'/' => {
                        if y == 0 {
                            0
                        } else {
                            x.wrapping_div(y)
                        }
                    }
                    b'm' => {
                        if y == 0 {
                            0
                        } else {
                            x.wrapping_rem(y)
                        }
                    }
                    b'&' => x & y,
                    b'|' => x | y,
                    b'^' => x ^ y,
                    b'=' => (x == y) as i32,
                    b'>' => (x > y) as i32,
                    b'<' => (x < y) as i32,
                    b'A' => (x != 0 && y != 0) as i32,
                    _ => (x != 0 || y != 0) as i32,
                };
                stack.push(v);
            }
            b'!' => {
                let x = stack.pop().unwrap_or(0);
                stack.push((x == 0) as i32);
            }
            b'~' => {
                let x = stack.pop().unwrap_or(0);
                stack.push(!x);
            }
            b'?' => {}
            b't' => {
                let cond = stack.pop().unwrap_or(0);
                if cond == 0 {
                    i = skip_to_else_or_end(bytes, i);
                }
            }
            b'e' => {
                // Reached after an executed then-branch: skip the else part.
                i = skip_to_end(bytes, i);
            }
            b';' => {}
            _ => {}
        }
    }
}

/// After a false `%t`, advance past the matching `%e` or `%;`.
fn skip_to_else_or_end(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 0u32;
    while i + 1 < bytes.len() {
        if bytes[i] == b'%' {
            match bytes[i + 1] {
                b'?' => depth += 1,
                b';' => {
                    if depth == 0 {
                        return i + 2;
                    }
                    depth -= 1;
                }
                b'e' if depth == 0 => return i + 2,
                _ => {}
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// After an executed then-branch hits `%e`, advance past the matching `%;`.
fn skip_to_end(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 0u32;
    while i + 1 < bytes.len() {
        if bytes[i] == b'%' {
            match bytes[i + 1] {
                b'?' => depth += 1,
                b';' => {
                    if depth == 0 {
                        return i + 2;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    bytes.len()
}

fn push_decimal(v: i32, width: usize, zero_pad: bool, out: &mut Vec<u8>) {
    let mut buf = [0u8; 12];
    let mut n = v.unsigned_abs();
    let mut len = 0;
    loop {
        buf[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
        if n == 0 {
            break;
        }
    }
    let digits = len + (v < 0) as usize;
    if digits < width {
        let fill = if zero_pad { b'0' } else { b' ' };
        if zero_pad && v < 0 {
            out.push(b'-');
        }
        for _ in 0..width - digits {
            out.push(fill);
        }
        if !zero_pad && v < 0 {
            out.push(b'-');
        }
    } else if v < 0 {
        out.push(b'-');
    }
    while len > 0 {
        len -= 1;
        out.push(buf[len]);
    }
}

#[cfg(test)]
mod tests {
    use super::{Capability, Cost};

    const CUP: &str = "\x1b[%i%p1%d;%p2%dH";
    // Real xterm-256color setaf: exercises %?, %t, %e, %;, %{n}, %<, %-.
    const SETAF_256: &str =
        "\x1b[%?%p1%{8}%<%t3%p1%d%e%p1%{16}%<%t9%p1%{8}%-%d%e38;5;%p1%d%;m";

    #[test]
    fn unsupported_expands_to_none() {
        let cap = Capability::unsupported();
        assert!(!cap.is_supported());
        assert_eq!(cap.expand(&[]), None);
    }

    #[test]
    fn unsupported_costs_infinite() {
        let cap = Capability::unsupported();
        assert_eq!(cap.cost(1, 9600), Cost::INFINITE);
        assert_eq!(cap.cost(1, 9600).add(Cost::ZERO), Cost::INFINITE);
    }

    #[test]
    fn cup_expands_one_indexed() {
        let cap = Capability::new(CUP);
        // %i converts 0-indexed params to 1-indexed.
        assert_eq!(cap.expand(&[0, 0]).unwrap(), b"\x1b[1;1H");
        assert_eq!(cap.expand(&[5, 10]).unwrap(), b"\x1b[6;11H");
    }

    #[test]
    fn setaf_256_picks_the_right_branch() {
        let cap = Capability::new(SETAF_256);
        assert_eq!(cap.expand(&[1]).unwrap(), b"\x1b[31m");
        assert_eq!(cap.expand(&[9]).unwrap(), b"\x1b[91m");
        assert_eq!(cap.expand(&[123]).unwrap(), b"\x1b[38;5;123m");
    }

    #[test]
    fn literal_percent_and_char_const() {
        let cap = Capability::new("x%%y%'A'%c");
        assert_eq!(cap.expand(&[]).unwrap(), b"x%yA");
    }

    #[test]
    fn padding_is_stripped_but_costed() {
        let cap = Capability::new("\x1b[7m$<2>");
        assert_eq!(cap.expand(&[]).unwrap(), b"\x1b[7m");
        // 2ms of padding = 20 tenths, independent of baud.
        let fast = cap.cost(1, 1_000_000);
        assert_eq!(fast.time, 20);
        assert_eq!(fast.bytes, 4);
    }

    #[test]
    fn per_line_padding_scales_with_affected() {
        let cap = Capability::new("x$<1*>");
        assert_eq!(cap.cost(1, 1_000_000).time, 10);
        assert_eq!(cap.cost(4, 1_000_000).time, 40);
    }

    #[test]
    fn fractional_padding() {
        let cap = Capability::new("x$<0.5>");
        assert_eq!(cap.cost(1, 1_000_000).time, 5);
    }

    #[test]
    fn cost_scales_with_baud() {
        let cap = Capability::new("\x1b[H");
        // 9600 baud: 90000/9600 = 9 tenths of a ms per byte.
        assert_eq!(cap.cost(1, 9600).time, 27);
        // 115200 baud rounds to zero time; byte length still discriminates.
        let fast = cap.cost(1, 115_200);
        assert_eq!(fast.time, 0);
        assert_eq!(fast.bytes, 3);
    }

    #[test]
    fn cost_ordering_ties_break_on_bytes() {
        let short = Cost { time: 0, bytes: 3 };
        let long = Cost { time: 0, bytes: 8 };
        assert!(short < long);
        assert!(short < Cost::INFINITE);
    }

    #[test]
    fn cost_add_saturates_at_infinite() {
        let c = Cost { time: 5, bytes: 2 };
        assert_eq!(c.add(Cost::INFINITE), Cost::INFINITE);
        assert_eq!(Cost::INFINITE.times(3), Cost::INFINITE);
    }

    #[test]
    fn expand_into_appends() {
        let cap = Capability::new("ab");
        let mut out = vec![b'x'];
        assert!(cap.expand_into(&[], &mut out));
        assert_eq!(out, b"xab");
    }

    #[test]
    fn expansion_is_deterministic() {
        let cap = Capability::new(SETAF_256);
        assert_eq!(cap.expand(&[200]), cap.expand(&[200]));
    }

    #[test]
    fn width_prefixed_decimal() {
        let cap = Capability::new("%p1%2d|%p1%02d");
        assert_eq!(cap.expand(&[7]).unwrap(), b" 7|07");
    }

    #[test]
    fn arithmetic_ops() {
        let cap = Capability::new("%p1%{3}%+%d");
        assert_eq!(cap.expand(&[4]).unwrap(), b"7");
        let cap = Capability::new("%p1%{2}%-%d");
        assert_eq!(cap.expand(&[10]).unwrap(), b"8");
    }

    #[test]
    fn nested_conditionals() {
        // if p1<2 then "a" else if p1<4 then "b" else "c"
        let cap = Capability::new("%?%p1%{2}%<%ta%e%?%p1%{4}%<%tb%ec%;%;");
        assert_eq!(cap.expand(&[1]).unwrap(), b"a");
        assert_eq!(cap.expand(&[3]).unwrap(), b"b");
        assert_eq!(cap.expand(&[9]).unwrap(), b"c");
    }
}
