//! End-to-end planner scenarios and algebraic properties.
//!
//! Covers the canonical cases: a registry with nothing but absolute
//! addressing, a bold+underline+red transition arriving on the wire as a
//! single merged SGR, and property tests for determinism and the
//! never-worse-than-absolute bound.

use mosaic_caps::CapabilitySet;
use mosaic_render::{
    Cell, CellColor, CursorPlanner, Encoding, Screen, StyleFlags, Surface,
};
use proptest::prelude::*;

#[test]
fn absolute_only_registry_reaches_everything() {
    let caps = CapabilitySet::absolute_only();
    let planner = CursorPlanner::new(&caps, 80, 24);
    for &(from, to) in &[
        ((0u16, 0u16), (79u16, 23u16)),
        ((40, 12), (40, 13)),
        ((5, 5), (6, 5)),
        ((79, 0), (0, 23)),
    ] {
        assert_eq!(planner.plan_move(Some(from), to), None, "{from:?}->{to:?}");
        let plan = planner.move_or_abs(Some(from), to).unwrap();
        assert_eq!(plan, planner.absolute(to).unwrap());
    }
}

#[test]
fn styled_text_arrives_as_one_merged_sgr() {
    let mut screen = Screen::new(CapabilitySet::xterm_256color(), Encoding::Utf8, 10, 1);
    let mut s = Surface::new(10, 1);
    s.put_str(
        "hi",
        &Cell::BLANK
            .with_flags(StyleFlags::BOLD | StyleFlags::UNDERLINE)
            .with_fg(CellColor::indexed(1)),
    );
    screen.compose([&mut s]);
    let mut out = Vec::new();
    screen.request_update();
    screen.update_terminal(&mut out).unwrap();
    let text = String::from_utf8_lossy(&out);
    // Reset, underline, bold, and red must fuse into one sequence.
    assert!(
        text.contains("\u{1b}[0;4;1;31m"),
        "expected merged SGR in {text:?}"
    );
    assert!(text.contains("hi"));
}

#[test]
fn relative_wins_only_when_cheaper_than_absolute() {
    let caps = CapabilitySet::xterm_256color();
    let planner = CursorPlanner::new(&caps, 80, 24);
    let abs_len = planner.absolute((5, 6)).unwrap().len();
    // One row down from the same column: a lone newline.
    let plan = planner.plan_move(Some((5, 5)), (5, 6)).unwrap();
    assert!(plan.len() < abs_len, "{plan:?} not cheaper than absolute");
}

proptest! {
    #[test]
    fn planning_is_deterministic(
        fx in 0u16..80, fy in 0u16..24,
        tx in 0u16..80, ty in 0u16..24,
    ) {
        let caps = CapabilitySet::xterm_256color();
        let planner = CursorPlanner::new(&caps, 80, 24);
        let a = planner.move_or_abs(Some((fx, fy)), (tx, ty)).unwrap();
        let b = planner.move_or_abs(Some((fx, fy)), (tx, ty)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn never_worse_than_absolute(
        fx in 0u16..80, fy in 0u16..24,
        tx in 0u16..80, ty in 0u16..24,
    ) {
        let caps = CapabilitySet::xterm_256color();
        let planner = CursorPlanner::new(&caps, 80, 24);
        let plan = planner.move_or_abs(Some((fx, fy)), (tx, ty)).unwrap();
        let abs = planner.absolute((tx, ty)).unwrap();
        prop_assert!(
            plan.len() <= abs.len(),
            "plan {:?} longer than absolute {:?}", plan, abs
        );
    }

    #[test]
    fn attribute_plans_are_pure(
        cur_flags in 0u16..0x0fff, tgt_flags in 0u16..0x0fff,
        cur_fg in prop::option::of(0u16..256), tgt_fg in prop::option::of(0u16..256),
    ) {
        let caps = CapabilitySet::xterm_256color();
        let attrs = mosaic_render::AttrPlanner::new(&caps);
        let mk = |flags: u16, fg: Option<u16>| {
            let mut c = Cell::BLANK.with_flags(StyleFlags::from_bits_truncate(flags));
            if let Some(i) = fg {
                c = c.with_fg(CellColor::indexed(i));
            }
            c
        };
        let cur = mk(cur_flags, cur_fg);
        let tgt = mk(tgt_flags, tgt_fg);
        let a = attrs.plan_attributes(&cur, &tgt);
        let b = attrs.plan_attributes(&cur, &tgt);
        prop_assert_eq!(a, b);
        // A rendition is always a fixed point of itself.
        prop_assert!(attrs.plan_attributes(&tgt, &tgt).is_empty());
    }
}
