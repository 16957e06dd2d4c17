#![forbid(unsafe_code)]

//! The capability registry: named control-sequence slots plus terminal flags.
//!
//! A [`CapabilitySet`] is a plain value object. The owning application fills
//! it from whatever terminal database it trusts; this crate ships a handful
//! of predefined profiles for tests and simulation, mirroring real terminfo
//! entries.
//!
//! # Invariants
//!
//! 1. Every slot is a [`Capability`]; absent slots are
//!    [`Capability::unsupported`] and cost [`Cost::INFINITE`](crate::Cost::INFINITE).
//! 2. Profiles are deterministic: the same constructor always produces the
//!    same set.
//! 3. Capabilities never upgrade during a session; callers replace the whole
//!    set on terminal change.

use crate::capability::Capability;

bitflags::bitflags! {
    /// Style attributes a terminal cannot combine with colors
    /// (the terminfo `no_color_video` mask), and the key used to address
    /// per-style capability slots.
    ///
    /// Bit order follows the terminfo convention for the first nine entries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VideoMask: u16 {
        const STANDOUT         = 1 << 0;
        const UNDERLINE        = 1 << 1;
        const REVERSE          = 1 << 2;
        const BLINK            = 1 << 3;
        const DIM              = 1 << 4;
        const BOLD             = 1 << 5;
        const INVISIBLE        = 1 << 6;
        const PROTECTED        = 1 << 7;
        const ALT_CHARSET      = 1 << 8;
        const ITALIC           = 1 << 9;
        const CROSSED_OUT      = 1 << 10;
        const DOUBLE_UNDERLINE = 1 << 11;
    }
}

/// A style attribute with enter (and sometimes exit) capability slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleCap {
    Bold,
    Dim,
    Italic,
    Underline,
    DoubleUnderline,
    Blink,
    Reverse,
    Standout,
    Invisible,
    Protected,
    CrossedOut,
}

impl StyleCap {
    /// All style attributes, in emission order.
    pub const ALL: [Self; 11] = [
        Self::Standout,
        Self::Underline,
        Self::Reverse,
        Self::Blink,
        Self::Dim,
        Self::Bold,
        Self::Invisible,
        Self::Protected,
        Self::Italic,
        Self::CrossedOut,
        Self::DoubleUnderline,
    ];

    /// The corresponding [`VideoMask`] bit.
    #[must_use]
    pub const fn mask(self) -> VideoMask {
        match self {
            Self::Standout => VideoMask::STANDOUT,
            Self::Underline => VideoMask::UNDERLINE,
            Self::Reverse => VideoMask::REVERSE,
            Self::Blink => VideoMask::BLINK,
            Self::Dim => VideoMask::DIM,
            Self::Bold => VideoMask::BOLD,
            Self::Invisible => VideoMask::INVISIBLE,
            Self::Protected => VideoMask::PROTECTED,
            Self::Italic => VideoMask::ITALIC,
            Self::CrossedOut => VideoMask::CROSSED_OUT,
            Self::DoubleUnderline => VideoMask::DOUBLE_UNDERLINE,
        }
    }
}

/// Boolean and numeric terminal properties consumed by the planners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermFlags {
    /// Number of colors the terminal supports (0 = monochrome).
    pub max_color: u16,
    /// Styles that cannot be combined with colors.
    pub no_color_video: VideoMask,
    /// Cursor-left from column 0 wraps to the end of the previous row.
    pub auto_left_margin: bool,
    /// Output at the right margin wraps to the next row.
    pub auto_right_margin: bool,
    /// Newline is ignored after wrapping (the xenl glitch).
    pub eat_newline_glitch: bool,
    /// `CSI 39/49`-style default colors are understood.
    pub ansi_default_color: bool,
    /// Erase operations paint the current background color.
    pub back_color_erase: bool,
    /// Tab stop spacing; 0 means tabs are unusable for cursor motion.
    pub init_tabs: u16,
    /// Effective baud rate used for capability duration estimates.
    pub baud: u32,
}

impl TermFlags {
    /// A fast assumed rate for terminals that do not report one.
    pub const DEFAULT_BAUD: u32 = 115_200;
}

impl Default for TermFlags {
    fn default() -> Self {
        Self {
            max_color: 0,
            no_color_video: VideoMask::empty(),
            auto_left_margin: false,
            auto_right_margin: true,
            eat_newline_glitch: false,
            ansi_default_color: false,
            back_color_erase: false,
            init_tabs: 0,
            baud: Self::DEFAULT_BAUD,
        }
    }
}

/// Per-terminal table of named control sequences.
///
/// Slot names follow terminfo. Every slot defaults to unsupported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    // Cursor motion
    /// cup: absolute cursor address (row, col).
    pub cursor_address: Capability,
    /// vpa: absolute row.
    pub row_address: Capability,
    /// hpa: absolute column.
    pub column_address: Capability,
    /// home.
    pub cursor_home: Capability,
    /// ll: lower-left corner.
    pub cursor_to_ll: Capability,
    /// cr.
    pub carriage_return: Capability,
    /// cuu1 / cud1 / cub1 / cuf1: single steps.
    pub cursor_up: Capability,
    pub cursor_down: Capability,
    pub cursor_left: Capability,
    pub cursor_right: Capability,
    /// cuu / cud / cub / cuf: parameterized moves.
    pub parm_up_cursor: Capability,
    pub parm_down_cursor: Capability,
    pub parm_left_cursor: Capability,
    pub parm_right_cursor: Capability,
    /// ht / cbt.
    pub tab: Capability,
    pub back_tab: Capability,

    // Erasure
    /// el: clear to end of line.
    pub clr_eol: Capability,
    /// el1: clear to beginning of line.
    pub clr_bol: Capability,

    // Styles
    pub enter_bold_mode: Capability,
    pub enter_dim_mode: Capability,
    pub enter_italics_mode: Capability,
    pub enter_underline_mode: Capability,
    pub enter_double_underline_mode: Capability,
    pub enter_blink_mode: Capability,
    pub enter_reverse_mode: Capability,
    pub enter_standout_mode: Capability,
    pub enter_secure_mode: Capability,
    pub enter_protected_mode: Capability,
    pub enter_crossed_out_mode: Capability,
    pub exit_underline_mode: Capability,
    pub exit_standout_mode: Capability,
    pub exit_italics_mode: Capability,
    /// sgr0: reset all attributes and colors.
    pub exit_attribute_mode: Capability,

    // Colors
    /// setaf / setab.
    pub set_a_foreground: Capability,
    pub set_a_background: Capability,
    /// op: restore default color pair.
    pub orig_pair: Capability,

    // Alternate character set
    pub enter_alt_charset_mode: Capability,
    pub exit_alt_charset_mode: Capability,

    // Cursor visibility
    /// cnorm / civis.
    pub cursor_visible: Capability,
    pub cursor_invisible: Capability,

    pub flags: TermFlags,
}

impl CapabilitySet {
    /// Enter capability for a style attribute.
    #[must_use]
    pub fn enter_style(&self, style: StyleCap) -> &Capability {
        match style {
            StyleCap::Bold => &self.enter_bold_mode,
            StyleCap::Dim => &self.enter_dim_mode,
            StyleCap::Italic => &self.enter_italics_mode,
            StyleCap::Underline => &self.enter_underline_mode,
            StyleCap::DoubleUnderline => &self.enter_double_underline_mode,
            StyleCap::Blink => &self.enter_blink_mode,
            StyleCap::Reverse => &self.enter_reverse_mode,
            StyleCap::Standout => &self.enter_standout_mode,
            StyleCap::Invisible => &self.enter_secure_mode,
            StyleCap::Protected => &self.enter_protected_mode,
            StyleCap::CrossedOut => &self.enter_crossed_out_mode,
        }
    }

    /// Shared "absent" slot for styles with no dedicated exit capability.
    fn no_exit() -> &'static Capability {
        static UNSUPPORTED: Capability = Capability::unsupported();
        &UNSUPPORTED
    }

    /// Side-effect-free exit capability for a style attribute, if the
    /// terminal has one. Most styles only exit via `exit_attribute_mode`.
    #[must_use]
    pub fn exit_style(&self, style: StyleCap) -> &Capability {
        match style {
            StyleCap::Underline | StyleCap::DoubleUnderline => &self.exit_underline_mode,
            StyleCap::Standout => &self.exit_standout_mode,
            StyleCap::Italic => &self.exit_italics_mode,
            _ => Self::no_exit(),
        }
    }

    /// Standard xterm with the 256-color palette. Templates are the real
    /// terminfo entries, conditionals included.
    #[must_use]
    pub fn xterm_256color() -> Self {
        Self {
            cursor_address: Capability::new("\x1b[%i%p1%d;%p2%dH"),
            row_address: Capability::new("\x1b[%i%p1%dd"),
            column_address: Capability::new("\x1b[%i%p1%dG"),
            cursor_home: Capability::new("\x1b[H"),
            carriage_return: Capability::new("\r"),
            cursor_up: Capability::new("\x1b[A"),
            cursor_down: Capability::new("\n"),
            cursor_left: Capability::new("\x08"),
            cursor_right: Capability::new("\x1b[C"),
            parm_up_cursor: Capability::new("\x1b[%p1%dA"),
            parm_down_cursor: Capability::new("\x1b[%p1%dB"),
            parm_left_cursor: Capability::new("\x1b[%p1%dD"),
            parm_right_cursor: Capability::new("\x1b[%p1%dC"),
            tab: Capability::new("\t"),
            back_tab: Capability::new("\x1b[Z"),
            clr_eol: Capability::new("\x1b[K"),
            clr_bol: Capability::new("\x1b[1K"),
            enter_bold_mode: Capability::new("\x1b[1m"),
            enter_dim_mode: Capability::new("\x1b[2m"),
            enter_italics_mode: Capability::new("\x1b[3m"),
            enter_underline_mode: Capability::new("\x1b[4m"),
            enter_double_underline_mode: Capability::new("\x1b[21m"),
            enter_blink_mode: Capability::new("\x1b[5m"),
            enter_reverse_mode: Capability::new("\x1b[7m"),
            enter_standout_mode: Capability::new("\x1b[7m"),
            enter_secure_mode: Capability::new("\x1b[8m"),
            enter_crossed_out_mode: Capability::new("\x1b[9m"),
            exit_underline_mode: Capability::new("\x1b[24m"),
            exit_standout_mode: Capability::new("\x1b[27m"),
            exit_italics_mode: Capability::new("\x1b[23m"),
            exit_attribute_mode: Capability::new("\x1b[0m"),
            set_a_foreground: Capability::new(
                "\x1b[%?%p1%{8}%<%t3%p1%d%e%p1%{16}%<%t9%p1%{8}%-%d%e38;5;%p1%d%;m",
            ),
            set_a_background: Capability::new(
                "\x1b[%?%p1%{8}%<%t4%p1%d%e%p1%{16}%<%t10%p1%{8}%-%d%e48;5;%p1%d%;m",
            ),
            orig_pair: Capability::new("\x1b[39;49m"),
            enter_alt_charset_mode: Capability::new("\x0e"),
            exit_alt_charset_mode: Capability::new("\x0f"),
            cursor_visible: Capability::new("\x1b[?25h"),
            cursor_invisible: Capability::new("\x1b[?25l"),
            flags: TermFlags {
                max_color: 256,
                no_color_video: VideoMask::empty(),
                auto_left_margin: false,
                auto_right_margin: true,
                eat_newline_glitch: true,
                ansi_default_color: true,
                back_color_erase: true,
                init_tabs: 8,
                baud: TermFlags::DEFAULT_BAUD,
            },
            ..Self::default()
        }
    }

    /// Generic 8-color ANSI terminal. Standout and underline cannot combine
    /// with colors (`ncv#3`).
    #[must_use]
    pub fn ansi() -> Self {
        Self {
            cursor_address: Capability::new("\x1b[%i%p1%d;%p2%dH"),
            row_address: Capability::new("\x1b[%i%p1%dd"),
            column_address: Capability::new("\x1b[%i%p1%dG"),
            cursor_home: Capability::new("\x1b[H"),
            carriage_return: Capability::new("\r"),
            cursor_up: Capability::new("\x1b[A"),
            cursor_down: Capability::new("\x1b[B"),
            cursor_left: Capability::new("\x1b[D"),
            cursor_right: Capability::new("\x1b[C"),
            parm_up_cursor: Capability::new("\x1b[%p1%dA"),
            parm_down_cursor: Capability::new("\x1b[%p1%dB"),
            parm_left_cursor: Capability::new("\x1b[%p1%dD"),
            parm_right_cursor: Capability::new("\x1b[%p1%dC"),
            tab: Capability::new("\t"),
            back_tab: Capability::new("\x1b[Z"),
            clr_eol: Capability::new("\x1b[K"),
            clr_bol: Capability::new("\x1b[1K"),
            enter_bold_mode: Capability::new("\x1b[1m"),
            enter_underline_mode: Capability::new("\x1b[4m"),
            enter_blink_mode: Capability::new("\x1b[5m"),
            enter_reverse_mode: Capability::new("\x1b[7m"),
            enter_standout_mode: Capability::new("\x1b[7m"),
            enter_secure_mode: Capability::new("\x1b[8m"),
            exit_underline_mode: Capability::new("\x1b[24m"),
            exit_standout_mode: Capability::new("\x1b[27m"),
            exit_attribute_mode: Capability::new("\x1b[0m"),
            set_a_foreground: Capability::new("\x1b[3%p1%dm"),
            set_a_background: Capability::new("\x1b[4%p1%dm"),
            orig_pair: Capability::new("\x1b[39;49m"),
            enter_alt_charset_mode: Capability::new("\x0e"),
            exit_alt_charset_mode: Capability::new("\x0f"),
            cursor_visible: Capability::new("\x1b[?25h"),
            cursor_invisible: Capability::new("\x1b[?25l"),
            flags: TermFlags {
                max_color: 8,
                no_color_video: VideoMask::STANDOUT.union(VideoMask::UNDERLINE),
                auto_left_margin: false,
                auto_right_margin: true,
                eat_newline_glitch: false,
                ansi_default_color: true,
                back_color_erase: true,
                init_tabs: 8,
                baud: TermFlags::DEFAULT_BAUD,
            },
            ..Self::default()
        }
    }

    /// Monochrome VT100 with its historical padding requirements.
    #[must_use]
    pub fn vt100() -> Self {
        Self {
            cursor_address: Capability::new("\x1b[%i%p1%d;%p2%dH$<5>"),
            cursor_home: Capability::new("\x1b[H$<5>"),
            carriage_return: Capability::new("\r"),
            cursor_up: Capability::new("\x1b[A$<2>"),
            cursor_down: Capability::new("\n"),
            cursor_left: Capability::new("\x08"),
            cursor_right: Capability::new("\x1b[C$<2>"),
            parm_up_cursor: Capability::new("\x1b[%p1%dA"),
            parm_down_cursor: Capability::new("\x1b[%p1%dB"),
            parm_left_cursor: Capability::new("\x1b[%p1%dD"),
            parm_right_cursor: Capability::new("\x1b[%p1%dC"),
            tab: Capability::new("\t"),
            clr_eol: Capability::new("\x1b[K$<3>"),
            clr_bol: Capability::new("\x1b[1K$<3>"),
            enter_bold_mode: Capability::new("\x1b[1m$<2>"),
            enter_underline_mode: Capability::new("\x1b[4m$<2>"),
            enter_blink_mode: Capability::new("\x1b[5m$<2>"),
            enter_reverse_mode: Capability::new("\x1b[7m$<2>"),
            enter_standout_mode: Capability::new("\x1b[7m$<2>"),
            exit_underline_mode: Capability::new("\x1b[24m$<2>"),
            exit_standout_mode: Capability::new("\x1b[27m$<2>"),
            exit_attribute_mode: Capability::new("\x1b[m$<2>"),
            enter_alt_charset_mode: Capability::new("\x0e"),
            exit_alt_charset_mode: Capability::new("\x0f"),
            flags: TermFlags {
                max_color: 0,
                no_color_video: VideoMask::empty(),
                auto_left_margin: false,
                auto_right_margin: true,
                eat_newline_glitch: true,
                ansi_default_color: false,
                back_color_erase: false,
                init_tabs: 8,
                baud: 9600,
            },
            ..Self::default()
        }
    }

    /// A terminal with nothing but carriage return and line feed.
    #[must_use]
    pub fn dumb() -> Self {
        Self {
            carriage_return: Capability::new("\r"),
            cursor_down: Capability::new("\n"),
            flags: TermFlags {
                auto_right_margin: true,
                ..TermFlags::default()
            },
            ..Self::default()
        }
    }

    /// Test profile: absolute cursor addressing only, no relative motion.
    #[must_use]
    pub fn absolute_only() -> Self {
        Self {
            cursor_address: Capability::new("\x1b[%i%p1%d;%p2%dH"),
            flags: TermFlags::default(),
            ..Self::default()
        }
    }
}
