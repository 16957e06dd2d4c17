#![forbid(unsafe_code)]

//! Screen compositing and terminal flush.
//!
//! [`Screen`] owns the full-terminal virtual surface and the desktop
//! surface beneath every window. [`Screen::compose`] merges a z-ordered
//! stack of [`Surface`]s into the virtual screen, resolving the
//! transparency family per cell; [`Screen::update_terminal`] diffs the
//! virtual screen against what the terminal last received and writes the
//! cheapest escape stream that reconciles them.
//!
//! # Invariants
//!
//! 1. Flushing twice with no intervening change writes zero bytes the
//!    second time.
//! 2. `RenderState` is mutated only by the flush path.
//! 3. The bottom-right cell is never printed on auto-margin terminals;
//!    printing it would scroll.

use std::io::{self, Write};

use mosaic_caps::{CapabilitySet, ResizeFlag};

use crate::attr::AttrPlanner;
use crate::cell::{Cell, CellColor, CellMarks, StyleFlags};
use crate::cursor_plan::CursorPlanner;
use crate::encode::Encoding;
use crate::geometry::Rect;
use crate::sgr_compact::compact_in_place;
use crate::surface::{PassCtx, ResizeError, Surface};

/// Blank-cell run length below which per-cell writes beat `clr_eol`.
const ERASE_THRESHOLD: u16 = 5;

/// How flush requests are honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Writes are suspended; requests accumulate as pending.
    Stop,
    /// Normal operation.
    #[default]
    Continue,
    /// The next flush repaints everything, then reverts to `Continue`.
    Start,
}

/// How a surface covers one virtual-screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Outside the surface (or the surface is hidden).
    NotCovered,
    /// Inside, but the cell lets content beneath show through.
    HalfCovered,
    /// Inside and opaque.
    FullyCovered,
}

/// Classify how `surface` covers the virtual position `(x, y)`.
pub fn coverage(surface: &Surface, x: i32, y: i32) -> Coverage {
    if !surface.visible {
        return Coverage::NotCovered;
    }
    let lx = x - surface.x;
    let ly = y - surface.y;
    if lx < 0 || ly < 0 || lx >= i32::from(surface.width()) || ly >= i32::from(surface.height()) {
        return Coverage::NotCovered;
    }
    match surface.get(lx as u16, ly as u16) {
        Some(c) if c.flags.is_overlay() => Coverage::HalfCovered,
        Some(_) => Coverage::FullyCovered,
        None => Coverage::NotCovered,
    }
}

/// What the terminal is known to hold, updated only by flush.
#[derive(Debug, Default)]
pub struct RenderState {
    /// Rendition of the last cell actually sent; `None` right after a
    /// reset or resize.
    last: Option<Cell>,
    /// Physical cursor position; `None` when unknown.
    cursor: Option<(u16, u16)>,
    /// Last visibility state sent, if any.
    cursor_shown: Option<bool>,
}

/// The virtual screen, the desktop beneath it, and the flush machinery.
pub struct Screen {
    caps: CapabilitySet,
    encoding: Encoding,
    virt: Surface,
    desktop: Surface,
    mode: UpdateMode,
    pending: bool,
    resize_flag: ResizeFlag,
    input_cursor: (u16, u16),
    cursor_wanted: bool,
    state: RenderState,
}

impl Screen {
    pub fn new(caps: CapabilitySet, encoding: Encoding, width: u16, height: u16) -> Self {
        Self {
            caps,
            encoding,
            virt: Surface::new(width, height),
            desktop: Surface::new(width, height),
            mode: UpdateMode::Continue,
            pending: false,
            resize_flag: ResizeFlag::new(),
            input_cursor: (0, 0),
            cursor_wanted: false,
            state: RenderState::default(),
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.virt.width()
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.virt.height()
    }

    #[inline]
    pub fn caps(&self) -> &CapabilitySet {
        &self.caps
    }

    /// The composed virtual screen.
    #[inline]
    pub fn virt(&self) -> &Surface {
        &self.virt
    }

    /// The desktop surface painted beneath every window.
    #[inline]
    pub fn desktop_mut(&mut self) -> &mut Surface {
        &mut self.desktop
    }

    /// The SIGWINCH flag to register with the signal handler.
    #[inline]
    pub fn resize_flag(&self) -> &ResizeFlag {
        &self.resize_flag
    }

    /// Consume a pending resize notification.
    pub fn take_resize(&mut self) -> bool {
        self.resize_flag.take()
    }

    pub fn set_update_mode(&mut self, mode: UpdateMode) {
        self.mode = mode;
    }

    /// Where the cursor parks after a flush.
    pub fn set_input_cursor(&mut self, x: u16, y: u16) {
        self.input_cursor = (x, y);
    }

    pub fn show_cursor(&mut self, wanted: bool) {
        self.cursor_wanted = wanted;
    }

    /// Note that a flush is wanted. Requests coalesce; in `Continue` mode
    /// a flush with no request pending writes nothing.
    pub fn request_update(&mut self) {
        self.pending = true;
    }

    /// Force a region of the virtual screen to be repainted on the next
    /// compose (e.g. after hiding a surface that covered it).
    pub fn damage(&mut self, area: Rect) {
        let area = area.intersection(Rect::from_size(self.width(), self.height()));
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                if let Some(c) = self.desktop.get(x, y).copied() {
                    self.desktop.set(x, y, c);
                }
            }
        }
    }

    /// Resize the virtual screen and desktop.
    ///
    /// On success the physical screen content is treated as unknown and
    /// everything repaints. On failure the old grids are kept and the
    /// screen is marked for a full repaint so a later retry recovers.
    pub fn resize(&mut self, width: u16, height: u16) -> Result<(), ResizeError> {
        let result = self
            .virt
            .resize(width, height)
            .and_then(|()| self.desktop.resize(width, height));
        self.virt.mark_all_dirty();
        self.clear_marks();
        self.state = RenderState::default();
        result
    }

    fn clear_marks(&mut self) {
        for y in 0..self.virt.height() {
            for x in 0..self.virt.width() {
                if let Some(c) = self.virt.get_mut_untracked(x, y) {
                    c.marks = CellMarks::empty();
                }
            }
        }
    }

    /// Merge one surface over the current virtual screen content, passes
    /// included. [`Screen::compose`] is the batched path; this is the
    /// painter's single step.
    pub fn put_area(&mut self, surface: &Surface) {
        if !surface.visible {
            return;
        }
        let (w, h) = (self.width(), self.height());
        let max_color = self.caps.flags.max_color;
        let (core, extended) = surface_rects(surface, w, h);
        if extended.is_empty() {
            return;
        }
        let ctx = PassCtx {
            core,
            extended,
            max_color,
        };

        for vy in extended.y..extended.bottom() {
            for vx in extended.x..extended.right() {
                let mut acc = self
                    .virt
                    .get(vx, vy)
                    .copied()
                    .unwrap_or(Cell::BLANK);
                acc.marks = CellMarks::empty();
                layer_surface(surface, &ctx, vx, vy, max_color, &mut acc);
                self.merge_virt(vx, vy, acc);
            }
            self.fix_wide_seams(vy, extended.x, extended.right().saturating_sub(1));
        }
    }

    /// Rebuild every virtual-screen region touched by a dirty surface (or
    /// the desktop), walking the stack bottom to top, then clear all
    /// dirty records.
    ///
    /// `stack` is in z-order, bottom first.
    pub fn compose<'s, I>(&mut self, stack: I)
    where
        I: IntoIterator<Item = &'s mut Surface>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("compose").entered();

        let surfaces: Vec<&mut Surface> = stack.into_iter().collect();
        let (w, h) = (self.width(), self.height());
        let max_color = self.caps.flags.max_color;

        // Union of dirty spans per virtual row.
        let mut spans: Vec<(u16, u16)> = vec![(u16::MAX, 0); h as usize];
        accumulate_spans(&self.desktop, &mut spans, w, h);
        for s in surfaces.iter().filter(|s| s.visible) {
            accumulate_spans(s, &mut spans, w, h);
        }

        let rects: Vec<(Rect, Rect)> = surfaces
            .iter()
            .map(|s| surface_rects(s, w, h))
            .collect();

        for vy in 0..h {
            let (a, b) = spans[vy as usize];
            if a > b {
                continue;
            }
            for vx in a..=b {
                let mut acc = self
                    .desktop
                    .get(vx, vy)
                    .copied()
                    .unwrap_or(Cell::BLANK);
                acc.marks = CellMarks::empty();
                acc.flags &= !StyleFlags::OVERLAY;
                for (s, (core, extended)) in surfaces.iter().zip(&rects) {
                    if !s.visible {
                        continue;
                    }
                    let ctx = PassCtx {
                        core: *core,
                        extended: *extended,
                        max_color,
                    };
                    layer_surface(s, &ctx, vx, vy, max_color, &mut acc);
                }
                self.merge_virt(vx, vy, acc);
            }
            self.fix_wide_seams(vy, a, b);
        }

        self.desktop.clear_dirty();
        for s in surfaces {
            s.clear_dirty();
        }
    }

    /// Write `cell` into the virtual screen, preserving the sent mark when
    /// the look is unchanged.
    fn merge_virt(&mut self, x: u16, y: u16, mut cell: Cell) {
        let Some(existing) = self.virt.get(x, y).copied() else {
            return;
        };
        if existing.same_look(&cell) {
            if let Some(c) = self.virt.get_mut_untracked(x, y) {
                c.marks = (existing.marks & CellMarks::SENT) | CellMarks::UNCHANGED;
            }
        } else {
            cell.marks = CellMarks::empty();
            self.virt.set(x, y, cell);
        }
    }

    /// Replace continuation cells whose head was clipped away (and heads
    /// whose continuation was) with spaces, within one row span.
    fn fix_wide_seams(&mut self, y: u16, a: u16, b: u16) {
        let w = self.width();
        if w == 0 {
            return;
        }
        let b = b.min(w - 1);
        for x in a..=b {
            let Some(cell) = self.virt.get(x, y).copied() else {
                continue;
            };
            if cell.is_continuation() {
                let headed = x > 0
                    && self
                        .virt
                        .get(x - 1, y)
                        .is_some_and(|h| h.width() == 2);
                if !headed {
                    self.virt.set(x, y, blank_like(&cell));
                }
            } else if cell.width() == 2 {
                let followed = x + 1 < w
                    && self
                        .virt
                        .get(x + 1, y)
                        .is_some_and(|c| c.is_continuation());
                if !followed {
                    self.virt.set(x, y, blank_like(&cell));
                }
            }
        }
    }

    /// Diff the virtual screen against the terminal and write the delta.
    ///
    /// Honors the update mode: `Stop` defers and latches the request,
    /// `Continue` flushes only when a request is pending, `Start` forces
    /// a full repaint. Assembles the whole frame in memory, runs it
    /// through the SGR compactor, and issues a single write.
    pub fn update_terminal<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        match self.mode {
            UpdateMode::Stop => {
                self.pending = true;
                return Ok(());
            }
            UpdateMode::Start => {
                self.virt.mark_all_dirty();
                self.clear_marks();
                self.state = RenderState::default();
                self.mode = UpdateMode::Continue;
            }
            UpdateMode::Continue => {
                if !self.pending {
                    return Ok(());
                }
            }
        }
        self.pending = false;

        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("update_terminal").entered();

        let Self {
            caps,
            encoding,
            virt,
            state,
            input_cursor,
            cursor_wanted,
            ..
        } = self;
        let caps: &CapabilitySet = caps;
        let (width, height) = (virt.width(), virt.height());
        let planner = CursorPlanner::new(caps, width, height);
        let attrs = AttrPlanner::new(caps);
        let encoder = encoding.encoder();

        let mut buf: Vec<u8> = Vec::new();

        for y in 0..height {
            let Some(range) = virt.row_range(y).copied() else {
                break;
            };
            if range.is_clean() {
                continue;
            }
            let mut first = range.first;
            let mut last = range.last.min(width - 1);

            // Cells the terminal already shows need no work.
            while first <= last && is_current(virt, first, y) {
                first += 1;
            }
            while last > first && is_current(virt, last, y) {
                last -= 1;
            }
            if first > last || (first == last && is_current(virt, first, y)) {
                continue;
            }

            // Trailing blank run: erase instead of printing.
            let erase = trailing_erase(caps, virt, y, first, width);

            // Leading blank run: clr_bol when enough dirty blanks precede
            // and clr_eol does not already cover them.
            let covered_by_eol = erase.is_some_and(|(_, k)| k <= first);
            if !covered_by_eol
                && let Some((bg, m)) = leading_erase(caps, virt, y, first, last, width)
                && Self::emit_move(&planner, state, &mut buf, (m - 1, y)).is_ok()
            {
                let erase_cell = Cell::BLANK.with_bg(bg);
                Self::emit_attrs(caps, &attrs, state, &mut buf, &erase_cell);
                caps.clr_bol.expand_into(&[], &mut buf);
                for x in 0..m {
                    mark_sent(virt, x, y);
                }
                first = first.max(m);
            }

            let stop = erase.map_or(last + 1, |(_, k)| k.min(last + 1));
            let mut x = first;
            while x < stop {
                let cell = match virt.get(x, y) {
                    Some(c) => *c,
                    None => break,
                };
                if cell.is_continuation() || is_current2(&cell) {
                    x += 1;
                    continue;
                }
                // Never print into the bottom-right corner of an
                // auto-margin terminal.
                if caps.flags.auto_right_margin && y == height - 1 && x == width - 1 {
                    break;
                }

                if Self::emit_move(&planner, state, &mut buf, (x, y)).is_err() {
                    // No addressing at all: walk with CR/LF and reprint
                    // the row prefix.
                    if !Self::dumb_walk(caps, &attrs, encoder, virt, state, &mut buf, x, y) {
                        break;
                    }
                }

                let w = cell.width().max(1) as u16;
                Self::emit_cell(caps, &attrs, encoder, state, &mut buf, &cell);
                mark_sent(virt, x, y);
                if w == 2 {
                    mark_sent(virt, x + 1, y);
                }
                advance_cursor(caps, state, width, w);
                x += w;
            }

            if let Some((bg, k)) = erase
                && k <= last
                && Self::emit_move(&planner, state, &mut buf, (k.max(first), y)).is_ok()
            {
                let erase_cell = Cell::BLANK.with_bg(bg);
                Self::emit_attrs(caps, &attrs, state, &mut buf, &erase_cell);
                caps.clr_eol.expand_into(&[], &mut buf);
                for ex in k..width {
                    mark_sent(virt, ex, y);
                }
            }
        }

        virt.clear_dirty();

        // Park the cursor where input is expected and settle visibility.
        let park = *input_cursor;
        let in_bounds = park.0 < width && park.1 < height;
        let show = *cursor_wanted && in_bounds;
        if show {
            let _ = Self::emit_move(&planner, state, &mut buf, park);
        }
        if state.cursor_shown != Some(show) {
            let cap = if show {
                &caps.cursor_visible
            } else {
                &caps.cursor_invisible
            };
            if cap.expand_into(&[], &mut buf) {
                state.cursor_shown = Some(show);
            }
        }

        if buf.is_empty() {
            return Ok(());
        }
        compact_in_place(&mut buf);
        out.write_all(&buf)?;
        out.flush()
    }

    fn emit_move(
        planner: &CursorPlanner<'_>,
        state: &mut RenderState,
        buf: &mut Vec<u8>,
        to: (u16, u16),
    ) -> Result<(), crate::cursor_plan::PlanError> {
        if state.cursor == Some(to) {
            return Ok(());
        }
        let bytes = planner.move_or_abs(state.cursor, to)?;
        buf.extend_from_slice(&bytes);
        state.cursor = Some(to);
        Ok(())
    }

    fn emit_attrs(
        caps: &CapabilitySet,
        attrs: &AttrPlanner<'_>,
        state: &mut RenderState,
        buf: &mut Vec<u8>,
        target: &Cell,
    ) {
        let current = match state.last {
            Some(c) => c,
            None => {
                // Unknown terminal state: reset to a known baseline first.
                caps.exit_attribute_mode.expand_into(&[], buf);
                Cell::BLANK
            }
        };
        attrs.plan_into(&current, target, buf);
        state.last = Some(*target);
    }

    fn emit_cell(
        caps: &CapabilitySet,
        attrs: &AttrPlanner<'_>,
        encoder: &dyn crate::encode::GlyphEncoder,
        state: &mut RenderState,
        buf: &mut Vec<u8>,
        cell: &Cell,
    ) {
        let ch = cell.glyph.as_char().unwrap_or(' ');
        let mut glyph_bytes = Vec::with_capacity(4);
        let wants_acs = encoder.encode(ch, &mut glyph_bytes);

        let mut target = *cell;
        target.flags &= !StyleFlags::OVERLAY;
        if wants_acs {
            target.flags |= StyleFlags::ALT_CHARSET;
        }
        Self::emit_attrs(caps, attrs, state, buf, &target);
        buf.extend_from_slice(&glyph_bytes);
    }

    /// Last-resort motion for terminals with no addressing: CR, LF down,
    /// then reprint the row up to the target column. Returns false when
    /// even that cannot reach the target.
    #[allow(clippy::too_many_arguments)]
    fn dumb_walk(
        caps: &CapabilitySet,
        attrs: &AttrPlanner<'_>,
        encoder: &dyn crate::encode::GlyphEncoder,
        virt: &mut Surface,
        state: &mut RenderState,
        buf: &mut Vec<u8>,
        x: u16,
        y: u16,
    ) -> bool {
        // With no way to query or address, the first walk assumes the
        // cursor starts on the top row.
        let cy = state.cursor.map_or(0, |(_, cy)| cy);
        if cy > y
            || !caps.carriage_return.is_supported()
            || !caps.cursor_down.is_supported()
        {
            return false;
        }
        caps.carriage_return.expand_into(&[], buf);
        for _ in cy..y {
            caps.cursor_down.expand_into(&[], buf);
        }
        state.cursor = Some((0, y));
        for px in 0..x {
            let cell = match virt.get(px, y) {
                Some(c) => *c,
                None => return false,
            };
            if cell.is_continuation() {
                continue;
            }
            let w = cell.width().max(1) as u16;
            Self::emit_cell(caps, attrs, encoder, state, buf, &cell);
            mark_sent(virt, px, y);
            if w == 2 {
                mark_sent(virt, px + 1, y);
            }
            state.cursor = Some((px + w, y));
        }
        true
    }
}

/// Core and shadow-extended rects of a surface, clipped to the screen.
fn surface_rects(surface: &Surface, w: u16, h: u16) -> (Rect, Rect) {
    let screen = Rect::from_size(w, h);
    let core = clip_rect(
        surface.x,
        surface.y,
        surface.width(),
        surface.height(),
        screen,
    );
    let extended = clip_rect(
        surface.x,
        surface.y,
        surface.total_width(),
        surface.total_height(),
        screen,
    );
    (core, extended)
}

fn clip_rect(x: i32, y: i32, w: u16, h: u16, screen: Rect) -> Rect {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i32::from(w)).clamp(0, i32::from(screen.right()));
    let y1 = (y + i32::from(h)).clamp(0, i32::from(screen.bottom()));
    if x1 <= x0 || y1 <= y0 {
        return Rect::new(0, 0, 0, 0);
    }
    Rect::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16)
}

/// Apply one surface's cell (and its passes) at a virtual position.
fn layer_surface(surface: &Surface, ctx: &PassCtx, vx: u16, vy: u16, max_color: u16, acc: &mut Cell) {
    let lx = i32::from(vx) - surface.x;
    let ly = i32::from(vy) - surface.y;
    let in_core = lx >= 0
        && ly >= 0
        && lx < i32::from(surface.width())
        && ly < i32::from(surface.height());
    if in_core {
        let top = surface.get(lx as u16, ly as u16).copied().unwrap_or(Cell::BLANK);
        *acc = composite_cell(&top, acc, max_color);
    }
    if !surface.passes().is_empty() {
        let in_ext = lx >= 0
            && ly >= 0
            && lx < i32::from(surface.total_width())
            && ly < i32::from(surface.total_height());
        if in_ext {
            for pass in surface.passes() {
                pass.apply(ctx, vx, vy, in_core, acc);
            }
        }
    }
}

/// Resolve `top` over `under` per the compositing flags. The result
/// carries no overlay flags.
pub fn composite_cell(top: &Cell, under: &Cell, max_color: u16) -> Cell {
    let mut out = *top;
    let flags = top.flags;

    if flags.contains(StyleFlags::SHADOW_TRANSPARENT) {
        out = *under;
        if max_color >= 8 {
            out.fg = CellColor::indexed(8);
            out.bg = CellColor::indexed(0);
        }
        out.flags |= StyleFlags::DIM;
    } else if flags.contains(StyleFlags::TRANSPARENT) {
        out.glyph = under.glyph;
        // The glyph carries its charset with it.
        out.flags = (flags & !StyleFlags::ALT_CHARSET)
            | (under.flags & StyleFlags::ALT_CHARSET);
        if out.fg.is_undefined() {
            out.fg = under.fg;
        }
        if out.bg.is_undefined() {
            out.bg = under.bg;
        }
    } else if flags.contains(StyleFlags::COLOR_OVERLAY) {
        out = *under;
        if !top.fg.is_undefined() {
            out.fg = top.fg;
        }
        if !top.bg.is_undefined() {
            out.bg = top.bg;
        }
    } else if flags.contains(StyleFlags::INHERIT_BG) {
        out.bg = under.bg;
    }

    out.flags &= !StyleFlags::OVERLAY;
    out.marks = CellMarks::empty();
    out
}

fn blank_like(cell: &Cell) -> Cell {
    let mut out = *cell;
    out.glyph = crate::cell::Glyph::SPACE;
    out
}

fn accumulate_spans(surface: &Surface, spans: &mut [(u16, u16)], w: u16, h: u16) {
    if !surface.visible {
        return;
    }
    for ly in 0..surface.total_height() {
        let Some(range) = surface.row_range(ly) else {
            continue;
        };
        if range.is_clean() {
            continue;
        }
        let vy = surface.y + i32::from(ly);
        if vy < 0 || vy >= i32::from(h) {
            continue;
        }
        let a = (surface.x + i32::from(range.first)).clamp(0, i32::from(w) - 1) as u16;
        let b = (surface.x + i32::from(range.last)).clamp(0, i32::from(w) - 1) as u16;
        let span = &mut spans[vy as usize];
        if a < span.0 {
            span.0 = a;
        }
        if b > span.1 {
            span.1 = b;
        }
    }
}

#[inline]
fn is_current(virt: &Surface, x: u16, y: u16) -> bool {
    virt.get(x, y).is_some_and(is_current2)
}

#[inline]
fn is_current2(cell: &Cell) -> bool {
    cell.marks
        .contains(CellMarks::UNCHANGED | CellMarks::SENT)
}

fn mark_sent(virt: &mut Surface, x: u16, y: u16) {
    if let Some(c) = virt.get_mut_untracked(x, y) {
        c.marks = CellMarks::UNCHANGED | CellMarks::SENT;
    }
}

fn advance_cursor(caps: &CapabilitySet, state: &mut RenderState, width: u16, w: u16) {
    if let Some((cx, cy)) = state.cursor {
        let nx = cx + w;
        if nx >= width {
            // Wrap behavior at the margin is terminal-specific; after the
            // glitch, position is unknowable.
            if caps.flags.auto_right_margin && !caps.flags.eat_newline_glitch {
                state.cursor = Some((0, cy + 1));
            } else {
                state.cursor = None;
            }
        } else {
            state.cursor = Some((nx, cy));
        }
    }
}

/// Uniform trailing run of blank cells worth a `clr_eol`, as
/// `(background, start_column)`.
fn trailing_erase(
    caps: &CapabilitySet,
    virt: &Surface,
    y: u16,
    first: u16,
    width: u16,
) -> Option<(CellColor, u16)> {
    if !caps.clr_eol.is_supported() {
        return None;
    }
    let last_cell = virt.get(width - 1, y)?;
    if !is_erasable(last_cell) {
        return None;
    }
    let bg = last_cell.bg;
    if !bg.is_default() && !caps.flags.back_color_erase {
        return None;
    }
    let mut k = width - 1;
    while k > first {
        let c = virt.get(k - 1, y)?;
        if !is_erasable(c) || c.bg != bg {
            break;
        }
        k -= 1;
    }
    if width - k > ERASE_THRESHOLD {
        Some((bg, k))
    } else {
        None
    }
}

/// Uniform leading run of blank cells worth a `clr_bol`, as
/// `(background, end_column_exclusive)`.
fn leading_erase(
    caps: &CapabilitySet,
    virt: &Surface,
    y: u16,
    first: u16,
    last: u16,
    width: u16,
) -> Option<(CellColor, u16)> {
    if !caps.clr_bol.is_supported() {
        return None;
    }
    let head = virt.get(0, y)?;
    if !is_erasable(head) {
        return None;
    }
    let bg = head.bg;
    if !bg.is_default() && !caps.flags.back_color_erase {
        return None;
    }
    let mut m = 0;
    while m < width {
        let c = virt.get(m, y)?;
        if !is_erasable(c) || c.bg != bg {
            break;
        }
        m += 1;
    }
    // Erasing must cover dirty cells, and enough of them to beat printing.
    if m > first && m <= last + 1 && m.saturating_sub(first) > ERASE_THRESHOLD {
        Some((bg, m))
    } else {
        None
    }
}

#[inline]
fn is_erasable(cell: &Cell) -> bool {
    cell.glyph == crate::cell::Glyph::SPACE && cell.flags.rendition().is_empty()
}
