//! Overlap resolution through the full compositing pipeline.
//!
//! Windows over windows, transparency over opaque content, shadows over
//! whatever lies beneath, and the repaint behavior when a surface is
//! hidden again.

use mosaic_caps::CapabilitySet;
use mosaic_render::{
    coverage, Cell, CellColor, Coverage, Encoding, Glyph, Rect, Screen, ShadowPass, StyleFlags,
    Surface,
};

fn screen(w: u16, h: u16) -> Screen {
    Screen::new(CapabilitySet::xterm_256color(), Encoding::Utf8, w, h)
}

fn filled(w: u16, h: u16, ch: char, fg: u16, bg: u16) -> Surface {
    let mut s = Surface::new(w, h);
    s.clear(
        Cell::from_char(ch)
            .with_fg(CellColor::indexed(fg))
            .with_bg(CellColor::indexed(bg)),
    );
    s
}

#[test]
fn three_layer_stack_resolves_top_down() {
    let mut scr = screen(12, 6);
    let mut a = filled(8, 4, 'a', 1, 0);
    a.x = 0;
    a.y = 0;
    let mut b = filled(6, 3, 'b', 2, 0);
    b.x = 3;
    b.y = 1;
    let mut c = filled(4, 2, 'c', 3, 0);
    c.x = 5;
    c.y = 2;
    scr.compose([&mut a, &mut b, &mut c]);

    assert_eq!(scr.virt().get(1, 1).unwrap().glyph, Glyph::from_char('a'));
    assert_eq!(scr.virt().get(4, 2).unwrap().glyph, Glyph::from_char('b'));
    assert_eq!(scr.virt().get(6, 3).unwrap().glyph, Glyph::from_char('c'));
    // c over b over a at their common point.
    assert_eq!(scr.virt().get(5, 2).unwrap().glyph, Glyph::from_char('c'));
}

#[test]
fn transparent_window_shows_text_beneath_in_its_own_colors() {
    let mut scr = screen(16, 4);
    let mut text = Surface::new(16, 1);
    text.put_str(
        "hello world",
        &Cell::BLANK.with_fg(CellColor::indexed(6)),
    );

    let mut pane = Surface::new(5, 1).with_origin(3, 0);
    pane.clear(
        Cell::BLANK
            .with_flags(StyleFlags::TRANSPARENT)
            .with_fg(CellColor::indexed(0))
            .with_bg(CellColor::indexed(7)),
    );
    scr.compose([&mut text, &mut pane]);

    for x in 3..8 {
        let cell = scr.virt().get(x, 0).unwrap();
        let expected = "hello world".as_bytes()[x as usize] as char;
        assert_eq!(cell.glyph, Glyph::from_char(expected), "column {x}");
        assert_eq!(cell.fg, CellColor::indexed(0));
        assert_eq!(cell.bg, CellColor::indexed(7));
        assert!(!cell.flags.is_overlay());
    }
    // Outside the pane the text keeps its color.
    assert_eq!(scr.virt().get(2, 0).unwrap().fg, CellColor::indexed(6));
}

#[test]
fn shadow_pass_darkens_the_margin_ring() {
    let mut scr = screen(20, 8);
    let mut below = filled(20, 8, '.', 7, 4);
    let mut window = Surface::with_shadow(6, 3, 2, 1)
        .with_origin(4, 2)
        .with_pass(Box::new(ShadowPass));
    window.clear(Cell::from_char('#').with_bg(CellColor::indexed(6)));
    scr.compose([&mut below, &mut window]);

    // Inside the window: untouched window content.
    let inside = scr.virt().get(5, 3).unwrap();
    assert_eq!(inside.glyph, Glyph::from_char('#'));
    assert!(!inside.flags.contains(StyleFlags::DIM));

    // Right margin ring: the backdrop glyph, darkened.
    let ring = scr.virt().get(10, 3).unwrap();
    assert_eq!(ring.glyph, Glyph::from_char('.'));
    assert!(ring.flags.contains(StyleFlags::DIM));
    assert_eq!(ring.fg, CellColor::indexed(8));

    // Bottom margin ring too.
    let below_ring = scr.virt().get(6, 5).unwrap();
    assert!(below_ring.flags.contains(StyleFlags::DIM));

    // Beyond the ring: untouched backdrop.
    let outside = scr.virt().get(12, 3).unwrap();
    assert!(!outside.flags.contains(StyleFlags::DIM));
    assert_eq!(outside.fg, CellColor::indexed(7));
}

#[test]
fn inherit_bg_floats_over_any_backdrop() {
    let mut scr = screen(10, 2);
    let mut back = filled(10, 2, ' ', 7, 5);
    let mut label = Surface::new(4, 1).with_origin(2, 0);
    label.put_str(
        "tag",
        &Cell::BLANK
            .with_flags(StyleFlags::INHERIT_BG)
            .with_fg(CellColor::indexed(0))
            .with_bg(CellColor::DEFAULT),
    );
    scr.compose([&mut back, &mut label]);

    let cell = scr.virt().get(2, 0).unwrap();
    assert_eq!(cell.glyph, Glyph::from_char('t'));
    assert_eq!(cell.fg, CellColor::indexed(0));
    // Background borrowed from the backdrop.
    assert_eq!(cell.bg, CellColor::indexed(5));
}

#[test]
fn coverage_reflects_cell_content() {
    let mut s = Surface::new(6, 2).with_origin(1, 1);
    s.set(2, 0, Cell::BLANK.with_flags(StyleFlags::COLOR_OVERLAY));
    assert_eq!(coverage(&s, 0, 0), Coverage::NotCovered);
    assert_eq!(coverage(&s, 1, 1), Coverage::FullyCovered);
    assert_eq!(coverage(&s, 3, 1), Coverage::HalfCovered);
    assert_eq!(coverage(&s, 7, 1), Coverage::NotCovered);
    assert_eq!(coverage(&s, 1, 3), Coverage::NotCovered);
}

#[test]
fn hiding_a_surface_and_damaging_restores_the_backdrop() {
    let mut scr = screen(12, 4);
    scr.desktop_mut().clear(Cell::from_char('~'));
    let mut win = filled(6, 2, 'W', 0, 7);
    win.x = 3;
    win.y = 1;
    scr.compose([&mut win]);
    assert_eq!(scr.virt().get(4, 1).unwrap().glyph, Glyph::from_char('W'));

    win.visible = false;
    scr.damage(Rect::new(3, 1, 6, 2));
    scr.compose([&mut win]);
    assert_eq!(scr.virt().get(4, 1).unwrap().glyph, Glyph::from_char('~'));
}

#[test]
fn overlap_flush_only_sends_visible_result() {
    // The covered portion of the bottom window must never hit the wire.
    let mut scr = screen(12, 3);
    let mut bottom = filled(12, 3, 'x', 1, 0);
    let mut top = filled(12, 3, 'o', 2, 0);
    scr.compose([&mut bottom, &mut top]);
    let mut out = Vec::new();
    scr.request_update();
    scr.update_terminal(&mut out).unwrap();
    let text = String::from_utf8_lossy(&out);
    assert!(text.contains('o'));
    assert!(!text.contains('x'), "covered glyph leaked: {text:?}");
}

#[test]
fn partial_offscreen_surface_composes_the_visible_part() {
    let mut scr = screen(8, 3);
    let mut s = filled(6, 3, 'p', 3, 0);
    s.x = 5;
    s.y = -1;
    scr.compose([&mut s]);
    assert_eq!(scr.virt().get(5, 0).unwrap().glyph, Glyph::from_char('p'));
    assert_eq!(scr.virt().get(7, 1).unwrap().glyph, Glyph::from_char('p'));
    // Left of the surface: still the blank desktop.
    assert_eq!(scr.virt().get(4, 0).unwrap().glyph, Glyph::SPACE);
}
