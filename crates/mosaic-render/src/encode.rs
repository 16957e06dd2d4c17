#![forbid(unsafe_code)]

//! Glyph wire encodings.
//!
//! The compositor is Unicode inside; what goes on the wire depends on the
//! terminal. UTF-8 terminals take the scalar bytes as-is. VT100-class
//! hardware draws lines through the alternate character set, PC terminals
//! through codepage 437, and a bare ASCII terminal gets transliterations.

/// Output encoding selected for a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// VT100 alternate character set for line drawing.
    Vt100,
    /// IBM codepage 437.
    Pc,
    /// 7-bit ASCII with transliterated line drawing.
    Ascii,
}

impl Encoding {
    /// The encoder implementing this encoding.
    pub fn encoder(self) -> &'static dyn GlyphEncoder {
        match self {
            Self::Utf8 => &Utf8Encoder,
            Self::Vt100 => &Vt100Encoder,
            Self::Pc => &PcEncoder,
            Self::Ascii => &AsciiEncoder,
        }
    }
}

/// Turns one glyph into wire bytes.
pub trait GlyphEncoder {
    /// Append the encoding of `ch` to `out`. Returns `true` when the bytes
    /// must be interpreted in the alternate character set, in which case
    /// the caller wraps them in the charset-switch capabilities.
    fn encode(&self, ch: char, out: &mut Vec<u8>) -> bool;
}

/// Pass-through UTF-8.
pub struct Utf8Encoder;

impl GlyphEncoder for Utf8Encoder {
    fn encode(&self, ch: char, out: &mut Vec<u8>) -> bool {
        if ch.is_control() {
            out.push(b'?');
        } else {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
        false
    }
}

/// VT100 line drawing via the alternate character set.
///
/// The mapping is the standard terminfo `acsc` alphabet.
pub struct Vt100Encoder;

/// ACS byte for a line-drawing glyph, per the VT100 special graphics set.
fn acs_byte(ch: char) -> Option<u8> {
    Some(match ch {
        '◆' => b'`',
        '▒' => b'a',
        '°' => b'f',
        '±' => b'g',
        '␤' => b'h',
        '┘' => b'j',
        '┐' => b'k',
        '┌' => b'l',
        '└' => b'm',
        '┼' => b'n',
        '⎺' => b'o',
        '⎻' => b'p',
        '─' => b'q',
        '⎼' => b'r',
        '⎽' => b's',
        '├' => b't',
        '┤' => b'u',
        '┴' => b'v',
        '┬' => b'w',
        '│' => b'x',
        '≤' => b'y',
        '≥' => b'z',
        'π' => b'{',
        '≠' => b'|',
        '£' => b'}',
        '·' => b'~',
        _ => return None,
    })
}

impl GlyphEncoder for Vt100Encoder {
    fn encode(&self, ch: char, out: &mut Vec<u8>) -> bool {
        if let Some(b) = acs_byte(ch) {
            out.push(b);
            return true;
        }
        out.push(ascii_fallback(ch));
        false
    }
}

/// Codepage 437 output.
pub struct PcEncoder;

/// CP437 byte for the graphics glyphs the compositor produces. ASCII is
/// identity; everything else falls back to transliteration.
fn cp437_byte(ch: char) -> Option<u8> {
    Some(match ch {
        '░' => 0xb0,
        '▒' => 0xb1,
        '▓' => 0xb2,
        '│' => 0xb3,
        '┤' => 0xb4,
        '╡' => 0xb5,
        '╢' => 0xb6,
        '╖' => 0xb7,
        '╕' => 0xb8,
        '╣' => 0xb9,
        '║' => 0xba,
        '╗' => 0xbb,
        '╝' => 0xbc,
        '╜' => 0xbd,
        '╛' => 0xbe,
        '┐' => 0xbf,
        '└' => 0xc0,
        '┴' => 0xc1,
        '┬' => 0xc2,
        '├' => 0xc3,
        '─' => 0xc4,
        '┼' => 0xc5,
        '╞' => 0xc6,
        '╟' => 0xc7,
        '╚' => 0xc8,
        '╔' => 0xc9,
        '╩' => 0xca,
        '╦' => 0xcb,
        '╠' => 0xcc,
        '═' => 0xcd,
        '╬' => 0xce,
        '┘' => 0xd9,
        '┌' => 0xda,
        '█' => 0xdb,
        '▄' => 0xdc,
        '▌' => 0xdd,
        '▐' => 0xde,
        '▀' => 0xdf,
        '·' => 0xfa,
        '±' => 0xf1,
        '°' => 0xf8,
        _ => return None,
    })
}

impl GlyphEncoder for PcEncoder {
    fn encode(&self, ch: char, out: &mut Vec<u8>) -> bool {
        if ch.is_ascii() && !ch.is_control() {
            out.push(ch as u8);
        } else if let Some(b) = cp437_byte(ch) {
            out.push(b);
        } else {
            out.push(ascii_fallback(ch));
        }
        false
    }
}

/// Plain ASCII with line-drawing transliteration.
pub struct AsciiEncoder;

impl GlyphEncoder for AsciiEncoder {
    fn encode(&self, ch: char, out: &mut Vec<u8>) -> bool {
        out.push(ascii_fallback(ch));
        false
    }
}

/// Best-effort single ASCII byte for a glyph.
fn ascii_fallback(ch: char) -> u8 {
    match ch {
        c if c.is_ascii() && !c.is_control() => c as u8,
        '─' | '═' | '⎺' | '⎻' | '⎼' | '⎽' => b'-',
        '│' | '║' => b'|',
        '┌' | '┐' | '└' | '┘' | '┼' | '├' | '┤' | '┬' | '┴' | '╔' | '╗' | '╚' | '╝'
        | '╬' | '╠' | '╣' | '╦' | '╩' | '╞' | '╟' | '╡' | '╢' | '╕' | '╖' | '╛'
        | '╜' | '╤' | '╥' | '╧' | '╨' | '╪' | '╫' | '╘' | '╙' | '╒' | '╓' | '╭'
        | '╮' | '╯' | '╰' => b'+',
        '░' | '▒' | '▓' | '█' | '▀' | '▄' | '▌' | '▐' => b'#',
        '·' | '◆' | '°' | '±' => b'*',
        _ => b'?',
    }
}
