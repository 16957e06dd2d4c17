#![forbid(unsafe_code)]

//! Attribute transition planning.
//!
//! [`AttrPlanner`] computes the minimal escape sequence that takes the
//! terminal from one cell rendition to another. Two candidate plans are
//! costed against each other:
//!
//! - **incremental**: turn off the styles that must go (only possible when
//!   each has a side-effect-free exit capability), turn on the new ones,
//!   adjust colors;
//! - **reset**: `sgr0`, then re-enter every target style and recolor from
//!   the defaults.
//!
//! The shorter byte sequence wins; ties go to the incremental plan. The
//! alternate-character-set toggle is not part of either candidate: `sgr0`
//! is taken not to touch it, so the ACS exit is emitted before the plan
//! and the ACS enter after it.
//!
//! Planning is pure and never mutates its inputs. Capabilities the
//! terminal lacks degrade silently: the style is simply not produced.

use mosaic_caps::{CapabilitySet, StyleCap};

use crate::cell::{Cell, CellColor, StyleFlags};

/// Style bits paired with their capability key, in emission order.
const STYLE_BITS: [(StyleFlags, StyleCap); 11] = [
    (StyleFlags::STANDOUT, StyleCap::Standout),
    (StyleFlags::UNDERLINE, StyleCap::Underline),
    (StyleFlags::REVERSE, StyleCap::Reverse),
    (StyleFlags::BLINK, StyleCap::Blink),
    (StyleFlags::DIM, StyleCap::Dim),
    (StyleFlags::BOLD, StyleCap::Bold),
    (StyleFlags::INVISIBLE, StyleCap::Invisible),
    (StyleFlags::PROTECTED, StyleCap::Protected),
    (StyleFlags::ITALIC, StyleCap::Italic),
    (StyleFlags::CROSSED_OUT, StyleCap::CrossedOut),
    (StyleFlags::DOUBLE_UNDERLINE, StyleCap::DoubleUnderline),
];

/// Plans rendition transitions against one capability set.
pub struct AttrPlanner<'a> {
    caps: &'a CapabilitySet,
}

impl<'a> AttrPlanner<'a> {
    pub fn new(caps: &'a CapabilitySet) -> Self {
        Self { caps }
    }

    /// The escape sequence taking the terminal from `current`'s rendition
    /// to `target`'s. Empty when they already render the same.
    pub fn plan_attributes(&self, current: &Cell, target: &Cell) -> Vec<u8> {
        let mut out = Vec::new();
        self.plan_into(current, target, &mut out);
        out
    }

    /// As [`plan_attributes`](Self::plan_attributes), appending to `out`.
    pub fn plan_into(&self, current: &Cell, target: &Cell, out: &mut Vec<u8>) {
        let cur = self.effective(current, None);
        let tgt = self.effective(target, Some(&cur));

        if cur == tgt {
            return;
        }

        // ACS exit comes first so the plan applies in the primary charset.
        if cur.acs && !tgt.acs {
            self.caps.exit_alt_charset_mode.expand_into(&[], out);
        }

        if cur.flags != tgt.flags || cur.fg != tgt.fg || cur.bg != tgt.bg {
            let incremental = self.incremental(&cur, &tgt);
            let reset = self.reset(&tgt);
            match (incremental, reset) {
                (Some(a), Some(b)) if b.len() < a.len() => out.extend_from_slice(&b),
                (Some(a), _) => out.extend_from_slice(&a),
                (None, Some(b)) => out.extend_from_slice(&b),
                (None, None) => {
                    // No sgr0 either; do what the terminal allows.
                    let mut bytes = Vec::new();
                    self.enter_styles(tgt.flags.difference(cur.flags), &mut bytes);
                    self.recolor(cur.fg, cur.bg, tgt.fg, tgt.bg, &mut bytes);
                    out.extend_from_slice(&bytes);
                }
            }
        }

        if !cur.acs && tgt.acs {
            self.caps.enter_alt_charset_mode.expand_into(&[], out);
        }
    }

    /// Normalized rendition: colors clamped to the palette, fake reverse
    /// applied, `no_color_video` styles suppressed while colors are active.
    /// `base` supplies the colors an undefined color inherits.
    fn effective(&self, cell: &Cell, base: Option<&Rendition>) -> Rendition {
        let mut flags = cell.flags.rendition() & !StyleFlags::ALT_CHARSET;
        let mut fg = self.clamp(cell.fg);
        let mut bg = self.clamp(cell.bg);
        if fg.is_undefined() {
            fg = base.map_or(CellColor::DEFAULT, |b| b.fg);
        }
        if bg.is_undefined() {
            bg = base.map_or(CellColor::DEFAULT, |b| b.bg);
        }

        // Reverse video without a reverse capability: swap the colors.
        if flags.contains(StyleFlags::REVERSE)
            && !self.caps.enter_reverse_mode.is_supported()
            && !self.caps.enter_standout_mode.is_supported()
        {
            flags.remove(StyleFlags::REVERSE);
            if fg.index().is_some() && bg.index().is_some() {
                core::mem::swap(&mut fg, &mut bg);
            }
        }

        // Styles the terminal cannot combine with active colors.
        if (fg.index().is_some() || bg.index().is_some())
            && !self.caps.flags.no_color_video.is_empty()
        {
            for (bit, cap) in STYLE_BITS {
                if flags.contains(bit)
                    && self.caps.flags.no_color_video.contains(cap.mask())
                {
                    flags.remove(bit);
                }
            }
        }

        // A style the terminal cannot produce is excluded from comparison,
        // so it never forces a reset either.
        for (bit, cap) in STYLE_BITS {
            if flags.contains(bit) && !self.caps.enter_style(cap).is_supported() {
                flags.remove(bit);
            }
        }

        Rendition {
            flags,
            fg,
            bg,
            acs: cell.flags.contains(StyleFlags::ALT_CHARSET),
        }
    }

    fn clamp(&self, color: CellColor) -> CellColor {
        match color.index() {
            Some(_) if self.caps.flags.max_color == 0 => CellColor::DEFAULT,
            Some(i) if i >= self.caps.flags.max_color => {
                CellColor::indexed(self.caps.flags.max_color - 1)
            }
            _ => color,
        }
    }

    /// Exit-then-enter plan. `None` when some style to drop has no
    /// individual exit, or a default color is unreachable without a reset.
    fn incremental(&self, cur: &Rendition, tgt: &Rendition) -> Option<Vec<u8>> {
        let off = cur.flags.difference(tgt.flags);
        let on = tgt.flags.difference(cur.flags);

        let mut bytes = Vec::new();
        for (bit, cap) in STYLE_BITS {
            if off.contains(bit) {
                let exit = self.caps.exit_style(cap);
                if !exit.is_supported() {
                    return None;
                }
                exit.expand_into(&[], &mut bytes);
            }
        }
        self.enter_styles(on, &mut bytes);
        if !self.recolor(cur.fg, cur.bg, tgt.fg, tgt.bg, &mut bytes) {
            return None;
        }
        Some(bytes)
    }

    /// `sgr0` plan: reset, re-enter every target style, recolor from the
    /// defaults. `None` without `exit_attribute_mode`.
    fn reset(&self, tgt: &Rendition) -> Option<Vec<u8>> {
        if !self.caps.exit_attribute_mode.is_supported() {
            return None;
        }
        let mut bytes = self.caps.exit_attribute_mode.expand(&[])?;
        self.enter_styles(tgt.flags, &mut bytes);
        self.recolor(CellColor::DEFAULT, CellColor::DEFAULT, tgt.fg, tgt.bg, &mut bytes);
        Some(bytes)
    }

    fn enter_styles(&self, on: StyleFlags, out: &mut Vec<u8>) {
        for (bit, cap) in STYLE_BITS {
            if on.contains(bit) {
                self.caps.enter_style(cap).expand_into(&[], out);
            }
        }
    }

    /// Append the color changes from (`cur_fg`, `cur_bg`) to the targets.
    /// Returns false when a default color is needed but unreachable.
    fn recolor(
        &self,
        mut cur_fg: CellColor,
        mut cur_bg: CellColor,
        tgt_fg: CellColor,
        tgt_bg: CellColor,
        out: &mut Vec<u8>,
    ) -> bool {
        let need_default = (tgt_fg.is_default() && cur_fg != tgt_fg)
            || (tgt_bg.is_default() && cur_bg != tgt_bg);
        if need_default {
            if self.caps.flags.ansi_default_color && self.caps.orig_pair.is_supported() {
                self.caps.orig_pair.expand_into(&[], out);
                cur_fg = CellColor::DEFAULT;
                cur_bg = CellColor::DEFAULT;
            } else {
                return false;
            }
        }
        if let Some(i) = tgt_fg.index()
            && tgt_fg != cur_fg
        {
            self.caps
                .set_a_foreground
                .expand_into(&[i32::from(i)], out);
        }
        if let Some(i) = tgt_bg.index()
            && tgt_bg != cur_bg
        {
            self.caps
                .set_a_background
                .expand_into(&[i32::from(i)], out);
        }
        true
    }
}

/// A normalized rendition, the unit [`AttrPlanner`] compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rendition {
    flags: StyleFlags,
    fg: CellColor,
    bg: CellColor,
    acs: bool,
}

#[cfg(test)]
mod tests {
    use super::AttrPlanner;
    use crate::cell::{Cell, CellColor, StyleFlags};
    use mosaic_caps::{Capability, CapabilitySet};

    fn styled(flags: StyleFlags, fg: CellColor, bg: CellColor) -> Cell {
        Cell::BLANK.with_flags(flags).with_fg(fg).with_bg(bg)
    }

    #[test]
    fn identical_renditions_emit_nothing() {
        let caps = CapabilitySet::xterm_256color();
        let p = AttrPlanner::new(&caps);
        let c = styled(StyleFlags::BOLD, CellColor::indexed(2), CellColor::DEFAULT);
        assert!(p.plan_attributes(&c, &c).is_empty());
    }

    #[test]
    fn bold_underline_red_from_plain() {
        let caps = CapabilitySet::xterm_256color();
        let p = AttrPlanner::new(&caps);
        let target = styled(
            StyleFlags::BOLD | StyleFlags::UNDERLINE,
            CellColor::indexed(1),
            CellColor::DEFAULT,
        );
        let bytes = p.plan_attributes(&Cell::BLANK, &target);
        assert_eq!(bytes, b"\x1b[4m\x1b[1m\x1b[31m");
    }

    #[test]
    fn dropping_bold_forces_reset() {
        let caps = CapabilitySet::xterm_256color();
        let p = AttrPlanner::new(&caps);
        let cur = styled(
            StyleFlags::BOLD | StyleFlags::UNDERLINE,
            CellColor::DEFAULT,
            CellColor::DEFAULT,
        );
        let tgt = styled(StyleFlags::UNDERLINE, CellColor::DEFAULT, CellColor::DEFAULT);
        assert_eq!(p.plan_attributes(&cur, &tgt), b"\x1b[0m\x1b[4m");
    }

    #[test]
    fn dropping_underline_uses_its_exit() {
        let caps = CapabilitySet::xterm_256color();
        let p = AttrPlanner::new(&caps);
        let cur = styled(
            StyleFlags::BOLD | StyleFlags::UNDERLINE,
            CellColor::DEFAULT,
            CellColor::DEFAULT,
        );
        let tgt = styled(StyleFlags::BOLD, CellColor::DEFAULT, CellColor::DEFAULT);
        // rmul (5 bytes) beats sgr0 + bold (8 bytes).
        assert_eq!(p.plan_attributes(&cur, &tgt), b"\x1b[24m");
    }

    #[test]
    fn returning_to_defaults_prefers_the_shorter_reset() {
        let caps = CapabilitySet::xterm_256color();
        let p = AttrPlanner::new(&caps);
        let cur = styled(StyleFlags::empty(), CellColor::indexed(1), CellColor::DEFAULT);
        // orig_pair is 8 bytes, sgr0 is 4.
        assert_eq!(p.plan_attributes(&cur, &Cell::BLANK), b"\x1b[0m");
    }

    #[test]
    fn color_clamps_to_palette_size() {
        let caps = CapabilitySet::ansi();
        let p = AttrPlanner::new(&caps);
        let tgt = styled(StyleFlags::empty(), CellColor::indexed(200), CellColor::DEFAULT);
        assert_eq!(p.plan_attributes(&Cell::BLANK, &tgt), b"\x1b[37m");
    }

    #[test]
    fn monochrome_drops_colors_entirely() {
        let caps = CapabilitySet::vt100();
        let p = AttrPlanner::new(&caps);
        let tgt = styled(StyleFlags::BOLD, CellColor::indexed(3), CellColor::indexed(4));
        assert_eq!(p.plan_attributes(&Cell::BLANK, &tgt), b"\x1b[1m");
    }

    #[test]
    fn no_color_video_suppresses_conflicting_styles() {
        let caps = CapabilitySet::ansi(); // ncv = standout | underline
        let p = AttrPlanner::new(&caps);
        let tgt = styled(
            StyleFlags::UNDERLINE | StyleFlags::BOLD,
            CellColor::indexed(1),
            CellColor::DEFAULT,
        );
        assert_eq!(p.plan_attributes(&Cell::BLANK, &tgt), b"\x1b[1m\x1b[31m");
    }

    #[test]
    fn fake_reverse_swaps_defined_colors() {
        let mut caps = CapabilitySet::ansi();
        caps.enter_reverse_mode = Capability::unsupported();
        caps.enter_standout_mode = Capability::unsupported();
        let p = AttrPlanner::new(&caps);
        let tgt = styled(
            StyleFlags::REVERSE,
            CellColor::indexed(1),
            CellColor::indexed(4),
        );
        let bytes = p.plan_attributes(&Cell::BLANK, &tgt);
        // fg <- 4, bg <- 1
        assert_eq!(bytes, b"\x1b[34m\x1b[41m");
    }

    #[test]
    fn alt_charset_wraps_the_plan() {
        let caps = CapabilitySet::xterm_256color();
        let p = AttrPlanner::new(&caps);
        let tgt = styled(
            StyleFlags::BOLD | StyleFlags::ALT_CHARSET,
            CellColor::DEFAULT,
            CellColor::DEFAULT,
        );
        assert_eq!(p.plan_attributes(&Cell::BLANK, &tgt), b"\x1b[1m\x0e");
        // Leaving ACS: exit first, then the style change.
        let back = p.plan_attributes(&tgt, &Cell::BLANK);
        assert_eq!(back, b"\x0f\x1b[0m");
    }

    #[test]
    fn unsupported_style_degrades_silently() {
        let caps = CapabilitySet::vt100(); // no italics capability
        let p = AttrPlanner::new(&caps);
        let tgt = styled(StyleFlags::ITALIC, CellColor::DEFAULT, CellColor::DEFAULT);
        assert!(p.plan_attributes(&Cell::BLANK, &tgt).is_empty());
    }

    #[test]
    fn planning_is_pure() {
        let caps = CapabilitySet::xterm_256color();
        let p = AttrPlanner::new(&caps);
        let cur = styled(StyleFlags::BLINK, CellColor::indexed(2), CellColor::indexed(0));
        let tgt = styled(StyleFlags::BOLD, CellColor::indexed(5), CellColor::DEFAULT);
        let a = p.plan_attributes(&cur, &tgt);
        let b = p.plan_attributes(&cur, &tgt);
        assert_eq!(a, b);
    }
}
