#![forbid(unsafe_code)]

//! Render kernel: cells, surfaces, planners, and the screen compositor.
//!
//! The pipeline is strictly layered. [`cell`] and [`surface`] hold state;
//! [`cursor_plan`] and [`attr`] turn state deltas into escape bytes;
//! [`sgr_compact`] squeezes the assembled byte stream; [`compositor`] owns
//! the virtual screen and drives everything on flush.

pub mod attr;
pub mod cell;
pub mod compositor;
pub mod cursor_plan;
pub mod encode;
pub mod geometry;
pub mod sgr_compact;
pub mod surface;

pub use attr::AttrPlanner;
pub use cell::{Cell, CellColor, CellMarks, Glyph, StyleFlags};
pub use compositor::{composite_cell, coverage, Coverage, RenderState, Screen, UpdateMode};
pub use cursor_plan::{CursorPlanner, PlanError};
pub use encode::{Encoding, GlyphEncoder};
pub use geometry::Rect;
pub use sgr_compact::{compact, compact_in_place};
pub use surface::{PassCtx, ResizeError, RowRange, ShadowPass, Surface, SurfacePass};

/// Display width of a single character in terminal cells.
///
/// Control characters measure zero (they are never emitted as glyphs);
/// everything else defers to `unicode-width`.
#[inline]
pub(crate) fn glyph_width(ch: char) -> usize {
    if ch.is_control() {
        return 0;
    }
    unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0)
}
