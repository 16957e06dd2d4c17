#![forbid(unsafe_code)]

//! Cell types and invariants.
//!
//! The `Cell` is the atomic unit of screen content: a glyph, two color
//! indices, a rendition flag set, and two bookkeeping bits the wire
//! protocol never sees.
//!
//! # Layout (12 bytes)
//!
//! ```text
//! Cell {
//!     glyph: Glyph,      // 4 bytes - Unicode scalar or CONTINUATION
//!     fg: CellColor,     // 2 bytes - palette index or sentinel
//!     bg: CellColor,     // 2 bytes - palette index or sentinel
//!     flags: StyleFlags, // 2 bytes - rendition + compositing flags
//!     marks: CellMarks,  // 2 bytes - frame bookkeeping, never rendered
//! }
//! ```
//!
//! # Invariants
//!
//! - Size is exactly 12 bytes (verified by compile-time assert).
//! - Color values are a palette index or one of the two sentinels
//!   (`DEFAULT`, `UNDEFINED`); `UNDEFINED` is never emitted to the wire.
//! - The transparent-family flags are resolved by the compositor and never
//!   reach the attribute engine.
//! - `marks` never participates in visual comparison.

use crate::glyph_width;

/// A cell's character content: a Unicode scalar value or the continuation
/// marker filling the padding cell behind a fullwidth glyph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Glyph(u32);

impl Glyph {
    /// Blank glyph (space).
    pub const SPACE: Self = Self(b' ' as u32);

    /// Continuation marker for fullwidth glyphs.
    ///
    /// The value is outside the Unicode scalar range, so it can never be
    /// confused with printable content. Continuation cells are never
    /// independently printed.
    pub const CONTINUATION: Self = Self(0x7FFF_FFFF);

    /// Create a glyph from a character.
    #[inline]
    pub const fn from_char(c: char) -> Self {
        Self(c as u32)
    }

    /// Extract the character, unless this is the continuation marker.
    #[inline]
    pub fn as_char(self) -> Option<char> {
        if self.0 == Self::CONTINUATION.0 {
            None
        } else {
            char::from_u32(self.0)
        }
    }

    /// Check for the continuation marker.
    #[inline]
    pub const fn is_continuation(self) -> bool {
        self.0 == Self::CONTINUATION.0
    }

    /// Display width in cells (0 for continuation and control characters).
    #[inline]
    pub fn width(self) -> usize {
        match self.as_char() {
            Some(c) => glyph_width(c),
            None => 0,
        }
    }
}

impl core::fmt::Debug for Glyph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_continuation() {
            write!(f, "Glyph::CONTINUATION")
        } else if let Some(c) = self.as_char() {
            write!(f, "Glyph({c:?})")
        } else {
            write!(f, "Glyph(0x{:08x})", self.0)
        }
    }
}

/// A color index with two reserved sentinels.
///
/// Concrete palette indices occupy `0..=0xFFFD`; `DEFAULT` means "the
/// terminal's default color" and `UNDEFINED` means "not yet decided":
/// the compositor treats it as inherit and the attribute engine never
/// emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CellColor(u16);

impl CellColor {
    /// The terminal's default color.
    pub const DEFAULT: Self = Self(0xFFFE);

    /// No color decided; inherit/skip.
    pub const UNDEFINED: Self = Self(0xFFFF);

    /// Largest concrete palette index.
    pub const MAX_INDEX: u16 = 0xFFFD;

    /// A concrete palette index.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `index` is below the sentinel range.
    #[inline]
    pub const fn indexed(index: u16) -> Self {
        debug_assert!(index <= Self::MAX_INDEX, "palette index in sentinel range");
        Self(index)
    }

    /// The palette index, or `None` for either sentinel.
    #[inline]
    pub const fn index(self) -> Option<u16> {
        if self.0 <= Self::MAX_INDEX {
            Some(self.0)
        } else {
            None
        }
    }

    #[inline]
    pub const fn is_default(self) -> bool {
        self.0 == Self::DEFAULT.0
    }

    #[inline]
    pub const fn is_undefined(self) -> bool {
        self.0 == Self::UNDEFINED.0
    }
}

impl Default for CellColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

bitflags::bitflags! {
    /// Cell rendition and compositing flags.
    ///
    /// The low twelve bits are the visual rendition; the high four are the
    /// compositing family, consumed (and cleared) when surfaces are merged
    /// into the virtual screen.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u16 {
        const BOLD             = 1 << 0;
        const DIM              = 1 << 1;
        const ITALIC           = 1 << 2;
        const UNDERLINE        = 1 << 3;
        const DOUBLE_UNDERLINE = 1 << 4;
        const BLINK            = 1 << 5;
        const REVERSE          = 1 << 6;
        const STANDOUT         = 1 << 7;
        const INVISIBLE        = 1 << 8;
        const PROTECTED        = 1 << 9;
        const CROSSED_OUT      = 1 << 10;
        /// Glyph is drawn from the alternate (VT100/PC) character set.
        const ALT_CHARSET      = 1 << 11;
        /// Copy the glyph from the cell beneath; keep own colors.
        const TRANSPARENT      = 1 << 12;
        /// Copy the glyph from beneath and darken its colors (drop shadow).
        const SHADOW_TRANSPARENT = 1 << 13;
        /// Keep the glyph and styles beneath; replace only the colors.
        const COLOR_OVERLAY    = 1 << 14;
        /// Copy only the background color from beneath.
        const INHERIT_BG       = 1 << 15;
    }
}

impl StyleFlags {
    /// The visual rendition bits (everything the attribute engine emits).
    pub const RENDITION: Self = Self::from_bits_truncate(0x0FFF);

    /// The compositing family, resolved at merge time.
    pub const OVERLAY: Self = Self::from_bits_truncate(0xF000);

    /// Whether any compositing flag is set.
    #[inline]
    pub const fn is_overlay(self) -> bool {
        self.intersects(Self::OVERLAY)
    }

    /// Just the rendition bits.
    #[inline]
    pub const fn rendition(self) -> Self {
        self.intersection(Self::RENDITION)
    }
}

bitflags::bitflags! {
    /// Frame bookkeeping bits, invisible to rendition comparison.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellMarks: u16 {
        /// No visual change from the previous frame.
        const UNCHANGED = 1 << 0;
        /// Already written to the terminal.
        const SENT      = 1 << 1;
    }
}

/// A single terminal cell (12 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Cell {
    /// Character content.
    pub glyph: Glyph,
    /// Foreground color.
    pub fg: CellColor,
    /// Background color.
    pub bg: CellColor,
    /// Rendition and compositing flags.
    pub flags: StyleFlags,
    /// Frame bookkeeping; never part of the visual identity.
    pub marks: CellMarks,
}

// Compile-time size check
const _: () = assert!(core::mem::size_of::<Cell>() == 12);

impl Cell {
    /// A blank cell: space, default colors, no styles.
    pub const BLANK: Self = Self {
        glyph: Glyph::SPACE,
        fg: CellColor::DEFAULT,
        bg: CellColor::DEFAULT,
        flags: StyleFlags::empty(),
        marks: CellMarks::empty(),
    };

    /// The padding cell behind a fullwidth glyph.
    pub const CONTINUATION: Self = Self {
        glyph: Glyph::CONTINUATION,
        fg: CellColor::UNDEFINED,
        bg: CellColor::UNDEFINED,
        flags: StyleFlags::empty(),
        marks: CellMarks::empty(),
    };

    /// Create a cell from a single character with default colors.
    #[inline]
    pub const fn from_char(c: char) -> Self {
        Self {
            glyph: Glyph::from_char(c),
            ..Self::BLANK
        }
    }

    /// Check for the continuation marker.
    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.glyph.is_continuation()
    }

    /// Set the foreground color.
    #[inline]
    pub const fn with_fg(mut self, fg: CellColor) -> Self {
        self.fg = fg;
        self
    }

    /// Set the background color.
    #[inline]
    pub const fn with_bg(mut self, bg: CellColor) -> Self {
        self.bg = bg;
        self
    }

    /// Set the style flags.
    #[inline]
    pub const fn with_flags(mut self, flags: StyleFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Visual equality: glyph, colors, and flags; bookkeeping ignored.
    #[inline]
    pub fn same_look(&self, other: &Self) -> bool {
        (self.glyph == other.glyph)
            & (self.fg == other.fg)
            & (self.bg == other.bg)
            & (self.flags == other.flags)
    }

    /// Rendition equality: colors and rendition flags only (the comparison
    /// the attribute engine and the wire-side render state care about).
    #[inline]
    pub fn same_rendition(&self, other: &Self) -> bool {
        (self.fg == other.fg)
            & (self.bg == other.bg)
            & (self.flags.rendition() == other.flags.rendition())
    }

    /// Display width of the glyph.
    #[inline]
    pub fn width(&self) -> usize {
        self.glyph.width()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, CellColor, CellMarks, Glyph, StyleFlags};

    #[test]
    fn cell_is_12_bytes() {
        assert_eq!(core::mem::size_of::<Cell>(), 12);
    }

    #[test]
    fn glyph_round_trips_char() {
        let g = Glyph::from_char('中');
        assert_eq!(g.as_char(), Some('中'));
        assert_eq!(g.width(), 2);
        assert_eq!(Glyph::from_char('a').width(), 1);
    }

    #[test]
    fn continuation_has_no_char_and_no_width() {
        assert_eq!(Glyph::CONTINUATION.as_char(), None);
        assert_eq!(Glyph::CONTINUATION.width(), 0);
        assert!(Cell::CONTINUATION.is_continuation());
    }

    #[test]
    fn color_sentinels_have_no_index() {
        assert_eq!(CellColor::DEFAULT.index(), None);
        assert_eq!(CellColor::UNDEFINED.index(), None);
        assert_eq!(CellColor::indexed(7).index(), Some(7));
        assert!(CellColor::DEFAULT.is_default());
        assert!(CellColor::UNDEFINED.is_undefined());
    }

    #[test]
    fn rendition_mask_excludes_overlay_bits() {
        let all = StyleFlags::all();
        assert_eq!(
            all.rendition() | StyleFlags::OVERLAY,
            StyleFlags::all()
        );
        assert!(!StyleFlags::RENDITION.intersects(StyleFlags::OVERLAY));
        assert!(StyleFlags::TRANSPARENT.is_overlay());
        assert!(!StyleFlags::BOLD.is_overlay());
    }

    #[test]
    fn same_look_ignores_marks() {
        let a = Cell::from_char('x');
        let mut b = a;
        b.marks = CellMarks::SENT | CellMarks::UNCHANGED;
        assert!(a.same_look(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn same_rendition_ignores_glyph() {
        let a = Cell::from_char('x').with_flags(StyleFlags::BOLD);
        let b = Cell::from_char('y').with_flags(StyleFlags::BOLD);
        assert!(a.same_rendition(&b));
        assert!(!a.same_look(&b));
    }

    #[test]
    fn same_rendition_ignores_overlay_flags() {
        let a = Cell::from_char('x');
        let b = a.with_flags(StyleFlags::TRANSPARENT);
        assert!(a.same_rendition(&b));
    }

    #[test]
    fn blank_is_default() {
        assert_eq!(Cell::default(), Cell::BLANK);
        assert_eq!(Cell::BLANK.glyph.as_char(), Some(' '));
    }
}
