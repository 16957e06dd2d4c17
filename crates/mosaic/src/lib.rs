#![forbid(unsafe_code)]

//! Mosaic public facade crate.
//!
//! Re-exports the stable surface area of the capability and render crates
//! and offers a small prelude for day-to-day use.
//!
//! The pipeline in one paragraph: populate a [`CapabilitySet`] for the
//! terminal (or start from a profile), build a [`Screen`], draw into
//! [`Surface`]s, [`Screen::compose`] them in z-order, and call
//! [`Screen::update_terminal`] to put the cheapest possible byte stream
//! on the wire.
//!
//! ```
//! use mosaic::prelude::*;
//!
//! let caps = CapabilitySet::xterm_256color();
//! let mut screen = Screen::new(caps, Encoding::Utf8, 80, 24);
//! let mut win = Surface::new(20, 5).with_origin(4, 2);
//! win.put_str("hello", &Cell::BLANK.with_flags(StyleFlags::BOLD));
//! screen.compose([&mut win]);
//! let mut wire = Vec::new();
//! screen.request_update();
//! screen.update_terminal(&mut wire).unwrap();
//! assert!(!wire.is_empty());
//! ```

// --- Capability re-exports -------------------------------------------------

pub use mosaic_caps::{Capability, CapabilitySet, Cost, ResizeFlag, StyleCap, TermFlags, VideoMask};

// --- Render re-exports -----------------------------------------------------

pub use mosaic_render::{
    compact, compact_in_place, composite_cell, coverage, AttrPlanner, Cell, CellColor, CellMarks,
    Coverage, CursorPlanner, Encoding, Glyph, GlyphEncoder, PassCtx, PlanError, Rect, RenderState,
    ResizeError, RowRange, Screen, ShadowPass, StyleFlags, Surface, SurfacePass, UpdateMode,
};

/// Commonly used types, ready for one glob import.
pub mod prelude {
    pub use mosaic_caps::{Capability, CapabilitySet, ResizeFlag, TermFlags};
    pub use mosaic_render::{
        Cell, CellColor, Coverage, Encoding, Glyph, Rect, Screen, ShadowPass, StyleFlags, Surface,
        UpdateMode,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn facade_pipeline_smoke() {
        let mut screen = Screen::new(CapabilitySet::ansi(), Encoding::Utf8, 20, 4);
        let mut s = Surface::new(10, 2).with_origin(1, 1);
        s.put_str("ping", &Cell::BLANK);
        screen.compose([&mut s]);
        let mut out = Vec::new();
        screen.request_update();
        screen.update_terminal(&mut out).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("ping"));
    }
}
