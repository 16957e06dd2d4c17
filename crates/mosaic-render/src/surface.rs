#![forbid(unsafe_code)]

//! Surface grid storage and dirty tracking.
//!
//! A [`Surface`] is a 2D grid of [`Cell`]s with a position on the virtual
//! desktop, per-row dirty ranges, and an optional list of post-composition
//! passes (drop shadows and the like).
//!
//! # Layout
//!
//! Cells are stored in row-major order: `index = y * width + x`. The grid is
//! allocated `(width + shadow_right) * (height + shadow_bottom)` cells so a
//! shadow pass can draw outside the core rectangle without reallocating.
//!
//! # Invariants
//!
//! 1. `cells.len() == total_width * total_height`
//! 2. Dirty ranges cover every cell whose look changed since the last
//!    composition; a clean row is encoded as `first > last`
//! 3. `rows[y].transparent` counts cells in row `y` carrying any
//!    compositing flag, kept exact on every write

use crate::cell::{Cell, Glyph, StyleFlags};
use crate::geometry::Rect;

/// Dirty extent of one surface row.
///
/// `first > last` means clean. `transparent` is the number of cells in the
/// row whose flags include any of the compositing family; the compositor
/// uses it to skip the per-cell resolution entirely for opaque rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub first: u16,
    pub last: u16,
    pub transparent: u16,
}

impl RowRange {
    /// A clean row (empty dirty range).
    pub const CLEAN: Self = Self {
        first: u16::MAX,
        last: 0,
        transparent: 0,
    };

    /// Whether the dirty range is empty.
    #[inline]
    pub const fn is_clean(&self) -> bool {
        self.first > self.last
    }

    /// Grow the dirty range to include column `x`.
    #[inline]
    pub fn touch(&mut self, x: u16) {
        if x < self.first {
            self.first = x;
        }
        if x > self.last {
            self.last = x;
        }
    }

    /// Grow the dirty range to include `[a, b]`.
    #[inline]
    pub fn touch_span(&mut self, a: u16, b: u16) {
        if a < self.first {
            self.first = a;
        }
        if b > self.last {
            self.last = b;
        }
    }
}

impl Default for RowRange {
    fn default() -> Self {
        Self::CLEAN
    }
}

/// Failure to resize a surface.
///
/// On failure the surface keeps its previous grid and contents.
#[derive(Debug)]
pub enum ResizeError {
    /// The allocator refused the new grid.
    Alloc(std::collections::TryReserveError),
}

impl std::fmt::Display for ResizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alloc(e) => write!(f, "surface resize allocation failed: {e}"),
        }
    }
}

impl std::error::Error for ResizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Alloc(e) => Some(e),
        }
    }
}

/// Context handed to a [`SurfacePass`] when it runs against the virtual
/// screen after its surface has been composed.
pub struct PassCtx {
    /// The surface's core rectangle in virtual-screen coordinates.
    pub core: Rect,
    /// The core rectangle extended by the shadow margins, clipped to the
    /// virtual screen.
    pub extended: Rect,
    /// Highest usable palette index plus one (0 for monochrome).
    pub max_color: u16,
}

/// A post-composition effect applied to the virtual screen in the area a
/// surface covers (plus its shadow margins).
pub trait SurfacePass {
    /// Transform one virtual-screen cell.
    ///
    /// `x`/`y` are virtual-screen coordinates; `inside` is true when the
    /// cell lies inside the surface's core rectangle.
    fn apply(&self, ctx: &PassCtx, x: u16, y: u16, inside: bool, cell: &mut Cell);
}

/// Darkens the ring of cells between the core rectangle and the shadow
/// margins, producing a drop shadow under the surface.
#[derive(Debug, Default)]
pub struct ShadowPass;

impl SurfacePass for ShadowPass {
    fn apply(&self, ctx: &PassCtx, _x: u16, _y: u16, inside: bool, cell: &mut Cell) {
        if inside {
            return;
        }
        if ctx.max_color >= 8 {
            cell.fg = crate::cell::CellColor::indexed(8);
            cell.bg = crate::cell::CellColor::indexed(0);
        }
        cell.flags |= StyleFlags::DIM;
    }
}

/// A positioned cell grid with per-row dirty tracking.
pub struct Surface {
    /// Virtual-desktop position of the top-left corner. May be negative or
    /// beyond the screen; composition clips.
    pub x: i32,
    pub y: i32,
    width: u16,
    height: u16,
    shadow_right: u16,
    shadow_bottom: u16,
    cells: Vec<Cell>,
    rows: Vec<RowRange>,
    /// Write cursor used by [`Surface::put_str`].
    cursor: (u16, u16),
    /// Hidden surfaces are skipped during composition.
    pub visible: bool,
    passes: Vec<Box<dyn SurfacePass>>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("shadow_right", &self.shadow_right)
            .field("shadow_bottom", &self.shadow_bottom)
            .field("visible", &self.visible)
            .field("passes", &self.passes.len())
            .finish()
    }
}

impl Surface {
    /// Create a surface at the origin with no shadow margins.
    ///
    /// All cells start blank and every row starts fully dirty.
    ///
    /// # Panics
    ///
    /// Panics if width or height is 0.
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_shadow(width, height, 0, 0)
    }

    /// Create a surface with extra writable cells to the right and below
    /// the core rectangle for shadow passes.
    pub fn with_shadow(width: u16, height: u16, shadow_right: u16, shadow_bottom: u16) -> Self {
        assert!(width > 0, "surface width must be > 0");
        assert!(height > 0, "surface height must be > 0");

        let tw = width as usize + shadow_right as usize;
        let th = height as usize + shadow_bottom as usize;
        let mut s = Self {
            x: 0,
            y: 0,
            width,
            height,
            shadow_right,
            shadow_bottom,
            cells: vec![Cell::BLANK; tw * th],
            rows: vec![RowRange::CLEAN; th],
            cursor: (0, 0),
            visible: true,
            passes: Vec::new(),
        };
        s.mark_all_dirty();
        s
    }

    /// Position the surface on the virtual desktop.
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Attach a post-composition pass.
    pub fn with_pass(mut self, pass: Box<dyn SurfacePass>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Core width in cells.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Core height in cells.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Width including the right shadow margin.
    #[inline]
    pub const fn total_width(&self) -> u16 {
        self.width + self.shadow_right
    }

    /// Height including the bottom shadow margin.
    #[inline]
    pub const fn total_height(&self) -> u16 {
        self.height + self.shadow_bottom
    }

    /// Shadow margins `(right, bottom)`.
    #[inline]
    pub const fn shadow(&self) -> (u16, u16) {
        (self.shadow_right, self.shadow_bottom)
    }

    /// Core bounding rect in local coordinates.
    #[inline]
    pub const fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// The attached post-composition passes.
    #[inline]
    pub fn passes(&self) -> &[Box<dyn SurfacePass>] {
        &self.passes
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.total_width() && y < self.total_height() {
            Some(y as usize * self.total_width() as usize + x as usize)
        } else {
            None
        }
    }

    /// Cell at (x, y), or `None` out of bounds. Shadow-margin cells are
    /// addressable.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Mutable cell access that bypasses dirty and transparency tracking.
    ///
    /// For the compositor's bookkeeping marks only; changing a cell's look
    /// through this leaves the row ranges stale.
    #[inline]
    pub fn get_mut_untracked(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        self.index(x, y).map(move |i| &mut self.cells[i])
    }

    /// Row slice covering the core width.
    #[inline]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y >= self.total_height() {
            return None;
        }
        let start = y as usize * self.total_width() as usize;
        Some(&self.cells[start..start + self.width as usize])
    }

    /// Dirty range for row `y`.
    #[inline]
    pub fn row_range(&self, y: u16) -> Option<&RowRange> {
        self.rows.get(y as usize)
    }

    /// Write one cell, updating the row's dirty range and transparent count.
    ///
    /// Writes outside the grid are ignored. Writing a cell identical to the
    /// one already present still marks it dirty; callers batching identical
    /// writes should compare first.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let Some(i) = self.index(x, y) else { return };
        let old = self.cells[i];
        let row = &mut self.rows[y as usize];
        if old.flags.is_overlay() && !cell.flags.is_overlay() {
            row.transparent = row.transparent.saturating_sub(1);
        } else if !old.flags.is_overlay() && cell.flags.is_overlay() {
            row.transparent += 1;
        }
        row.touch(x);
        self.cells[i] = cell;
    }

    /// Write a character at the cursor, advancing it.
    ///
    /// Fullwidth glyphs occupy two cells, the second holding the
    /// continuation marker. Writing the last column wraps the cursor to
    /// the start of the next row immediately. `\n` moves to the start of
    /// the next row, `\r` to the start of the current one, and `\t` to
    /// the next multiple of 8. Output past the last row is dropped.
    pub fn put_char(&mut self, c: char, style: &Cell) {
        match c {
            '\n' => {
                self.cursor.0 = 0;
                self.cursor.1 = self.cursor.1.saturating_add(1);
                return;
            }
            '\r' => {
                self.cursor.0 = 0;
                return;
            }
            '\t' => {
                if self.cursor.1 >= self.height {
                    return;
                }
                let row = self.cursor.1;
                let next = ((self.cursor.0 / 8 + 1) * 8).min(self.width);
                while self.cursor.1 == row && self.cursor.0 < next {
                    self.put_char(' ', style);
                }
                return;
            }
            _ => {}
        }

        let w = crate::glyph_width(c) as u16;
        if w == 0 {
            return;
        }
        if self.cursor.0 + w > self.width {
            self.cursor.0 = 0;
            self.cursor.1 = self.cursor.1.saturating_add(1);
        }
        if self.cursor.1 >= self.height {
            return;
        }
        let (x, y) = self.cursor;
        let mut cell = *style;
        cell.glyph = Glyph::from_char(c);
        self.set(x, y, cell);
        if w == 2 {
            let mut cont = Cell::CONTINUATION;
            cont.fg = style.fg;
            cont.bg = style.bg;
            cont.flags = style.flags;
            self.set(x + 1, y, cont);
        }
        self.cursor.0 = x + w;
        if self.cursor.0 >= self.width {
            self.cursor.0 = 0;
            self.cursor.1 = self.cursor.1.saturating_add(1);
        }
    }

    /// Write a string at the cursor.
    pub fn put_str(&mut self, s: &str, style: &Cell) {
        for c in s.chars() {
            self.put_char(c, style);
        }
    }

    /// Write a pre-built run of cells at the cursor, advancing it.
    ///
    /// Cells are placed as-is (glyph, colors, flags); continuation cells
    /// in the run are honored, so a wide glyph followed by its marker
    /// lands intact. The run truncates at the right edge instead of
    /// wrapping.
    pub fn put_cells(&mut self, run: &[Cell]) {
        let (mut x, y) = self.cursor;
        if y >= self.height {
            return;
        }
        for cell in run {
            if x >= self.width {
                break;
            }
            self.set(x, y, *cell);
            x += 1;
        }
        self.cursor.0 = x;
    }

    /// Move the write cursor (clamped to the core rectangle).
    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cursor = (
            x.min(self.width.saturating_sub(1)),
            y.min(self.height.saturating_sub(1)),
        );
    }

    /// Current write cursor.
    #[inline]
    pub const fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    /// Fill the core rectangle with a cell and reset the write cursor.
    pub fn clear(&mut self, cell: Cell) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set(x, y, cell);
            }
        }
        self.cursor = (0, 0);
    }

    /// Fill a rectangle (clipped to the core) with a cell.
    pub fn fill(&mut self, area: Rect, cell: Cell) {
        let area = area.intersection(self.bounds());
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.set(x, y, cell);
            }
        }
    }

    /// Mark the whole grid (including shadow margins) dirty, recounting
    /// transparent cells per row.
    pub fn mark_all_dirty(&mut self) {
        let tw = self.total_width();
        for (y, row) in self.rows.iter_mut().enumerate() {
            let start = y * tw as usize;
            let transparent = self.cells[start..start + tw as usize]
                .iter()
                .filter(|c| c.flags.is_overlay())
                .count() as u16;
            *row = RowRange {
                first: 0,
                last: tw - 1,
                transparent,
            };
        }
    }

    /// Reset every row's dirty range (transparent counts are kept).
    pub fn clear_dirty(&mut self) {
        for row in &mut self.rows {
            row.first = u16::MAX;
            row.last = 0;
        }
    }

    /// Whether any row is dirty.
    pub fn is_dirty(&self) -> bool {
        self.rows.iter().any(|r| !r.is_clean())
    }

    /// Resize the grid, preserving overlapping content.
    ///
    /// New cells are blank. On allocation failure the old grid is kept
    /// and the whole surface is marked dirty so a later retry repaints
    /// it. A successful resize also marks the whole surface dirty.
    pub fn resize(&mut self, width: u16, height: u16) -> Result<(), ResizeError> {
        assert!(width > 0, "surface width must be > 0");
        assert!(height > 0, "surface height must be > 0");

        if width == self.width && height == self.height {
            return Ok(());
        }

        let tw = width as usize + self.shadow_right as usize;
        let th = height as usize + self.shadow_bottom as usize;

        let mut cells = Vec::new();
        if let Err(e) = cells.try_reserve_exact(tw * th) {
            self.mark_all_dirty();
            return Err(ResizeError::Alloc(e));
        }
        cells.resize(tw * th, Cell::BLANK);

        let mut rows = Vec::new();
        if let Err(e) = rows.try_reserve_exact(th) {
            self.mark_all_dirty();
            return Err(ResizeError::Alloc(e));
        }
        rows.resize(th, RowRange::CLEAN);

        let old_tw = self.total_width() as usize;
        let copy_w = old_tw.min(tw);
        let copy_h = (self.total_height() as usize).min(th);
        for y in 0..copy_h {
            let src = y * old_tw;
            let dst = y * tw;
            cells[dst..dst + copy_w].copy_from_slice(&self.cells[src..src + copy_w]);
        }

        self.cells = cells;
        self.rows = rows;
        self.width = width;
        self.height = height;
        self.cursor = (
            self.cursor.0.min(width - 1),
            self.cursor.1.min(height - 1),
        );
        self.mark_all_dirty();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{RowRange, Surface};
    use crate::cell::{Cell, CellColor, Glyph, StyleFlags};
    use crate::geometry::Rect;

    #[test]
    fn new_surface_is_fully_dirty() {
        let s = Surface::new(10, 4);
        for y in 0..4 {
            let r = s.row_range(y).unwrap();
            assert_eq!((r.first, r.last), (0, 9));
            assert_eq!(r.transparent, 0);
        }
    }

    #[test]
    fn put_cells_places_a_run_and_truncates_at_the_edge() {
        let mut s = Surface::new(4, 1);
        let run: Vec<Cell> = "abcdef".chars().map(Cell::from_char).collect();
        s.put_cells(&run);
        assert_eq!(s.get(0, 0).unwrap().glyph, Glyph::from_char('a'));
        assert_eq!(s.get(3, 0).unwrap().glyph, Glyph::from_char('d'));
        assert_eq!(s.cursor(), (4, 0));
    }

    #[test]
    fn set_updates_dirty_range() {
        let mut s = Surface::new(10, 4);
        s.clear_dirty();
        s.set(3, 1, Cell::from_char('a'));
        s.set(7, 1, Cell::from_char('b'));
        let r = s.row_range(1).unwrap();
        assert_eq!((r.first, r.last), (3, 7));
        assert!(s.row_range(0).unwrap().is_clean());
    }

    #[test]
    fn transparent_count_tracks_overlay_flags() {
        let mut s = Surface::new(5, 1);
        let t = Cell::BLANK.with_flags(StyleFlags::TRANSPARENT);
        s.set(0, 0, t);
        s.set(1, 0, t);
        assert_eq!(s.row_range(0).unwrap().transparent, 2);
        s.set(1, 0, Cell::from_char('x'));
        assert_eq!(s.row_range(0).unwrap().transparent, 1);
    }

    #[test]
    fn put_str_wraps_and_places_continuation() {
        let mut s = Surface::new(4, 2);
        s.put_str("ab中", &Cell::BLANK);
        assert_eq!(s.get(0, 0).unwrap().glyph, Glyph::from_char('a'));
        assert_eq!(s.get(2, 0).unwrap().glyph, Glyph::from_char('中'));
        assert!(s.get(3, 0).unwrap().is_continuation());
        assert_eq!(s.cursor(), (0, 1));
    }

    #[test]
    fn wide_glyph_wraps_instead_of_splitting() {
        let mut s = Surface::new(3, 2);
        s.put_str("ab中", &Cell::BLANK);
        // No room for both halves on row 0.
        assert_eq!(s.get(0, 1).unwrap().glyph, Glyph::from_char('中'));
        assert!(s.get(1, 1).unwrap().is_continuation());
    }

    #[test]
    fn tab_past_the_last_row_terminates_and_drops_output() {
        let mut s = Surface::new(8, 1);
        s.put_str("a\n\tb", &Cell::BLANK);
        assert_eq!(s.get(0, 0).unwrap().glyph, Glyph::from_char('a'));
        assert_eq!(s.get(1, 0).unwrap().glyph, Glyph::SPACE);
        assert_eq!(s.cursor(), (0, 1));
    }

    #[test]
    fn filling_a_row_wraps_the_cursor_eagerly() {
        let mut s = Surface::new(4, 2);
        s.put_str("abcd", &Cell::BLANK);
        assert_eq!(s.cursor(), (0, 1));
        s.put_str("e", &Cell::BLANK);
        assert_eq!(s.get(0, 1).unwrap().glyph, Glyph::from_char('e'));
    }

    #[test]
    fn control_chars_move_the_cursor() {
        let mut s = Surface::new(20, 3);
        s.put_str("a\tb\nc", &Cell::BLANK);
        assert_eq!(s.get(8, 0).unwrap().glyph, Glyph::from_char('b'));
        assert_eq!(s.get(0, 1).unwrap().glyph, Glyph::from_char('c'));
    }

    #[test]
    fn resize_preserves_overlap_and_marks_dirty() {
        let mut s = Surface::new(6, 3);
        s.set(2, 1, Cell::from_char('q'));
        s.clear_dirty();
        s.resize(4, 2).unwrap();
        assert_eq!(s.get(2, 1).unwrap().glyph, Glyph::from_char('q'));
        assert_eq!(s.width(), 4);
        assert!(s.is_dirty());
    }

    #[test]
    fn shadow_margin_cells_are_addressable() {
        let mut s = Surface::with_shadow(4, 2, 2, 1);
        assert_eq!(s.total_width(), 6);
        assert_eq!(s.total_height(), 3);
        s.set(5, 2, Cell::from_char('s'));
        assert_eq!(s.get(5, 2).unwrap().glyph, Glyph::from_char('s'));
        // Core accessors still clip to the core width.
        assert_eq!(s.row(0).unwrap().len(), 4);
    }

    #[test]
    fn fill_clips_to_core() {
        let mut s = Surface::new(4, 4);
        s.fill(
            Rect::new(2, 2, 10, 10),
            Cell::from_char('#').with_bg(CellColor::indexed(4)),
        );
        assert_eq!(s.get(3, 3).unwrap().glyph, Glyph::from_char('#'));
        assert_eq!(s.get(1, 1).unwrap().glyph, Glyph::SPACE);
    }

    #[test]
    fn clean_encoding() {
        assert!(RowRange::CLEAN.is_clean());
        let mut r = RowRange::CLEAN;
        r.touch(5);
        assert!(!r.is_clean());
        assert_eq!((r.first, r.last), (5, 5));
    }
}
