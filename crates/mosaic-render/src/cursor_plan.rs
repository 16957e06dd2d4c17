#![forbid(unsafe_code)]

//! Cursor movement planning.
//!
//! Given the cursor's current position (possibly unknown) and a target,
//! [`CursorPlanner`] emits the cheapest capability sequence that gets the
//! terminal's cursor there. Cheapness is the [`Cost`] ordering: estimated
//! transmission plus padding time first, byte count as the tiebreak.
//!
//! Six strategies are costed against each other:
//!
//! 0. absolute addressing (`cup`, or `vpa` + `hpa`)
//! 1. pure relative motion from the current position
//! 2. carriage return, then relative from column 0
//! 3. home, then relative from the origin
//! 4. lower-left (`ll`), then relative from the last row
//! 5. CR plus a backward wrap off column 0 onto the end of the previous
//!    row, then relative (only on wrap-capable terminals without the
//!    newline glitch)
//!
//! Planning is pure: the same inputs always produce the same bytes, and
//! no capability with infinite cost is ever chosen.

use mosaic_caps::{Capability, CapabilitySet, Cost};

/// Columns considered "near" the right edge, and the horizontal span above
/// which a move landing there is forced to absolute addressing. Relative
/// motion into the wrap zone risks the terminal's margin behavior.
const EDGE_THRESHOLD: u16 = 8;

/// No capability sequence can reach the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    Unreachable,
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable => write!(f, "no capability sequence reaches the target"),
        }
    }
}

impl std::error::Error for PlanError {}

/// Plans cursor motion against one capability set and screen size.
pub struct CursorPlanner<'a> {
    caps: &'a CapabilitySet,
    width: u16,
    height: u16,
}

impl<'a> CursorPlanner<'a> {
    pub fn new(caps: &'a CapabilitySet, width: u16, height: u16) -> Self {
        Self { caps, width, height }
    }

    #[inline]
    fn baud(&self) -> u32 {
        self.caps.flags.baud
    }

    #[inline]
    fn cap_cost(&self, cap: &Capability) -> Cost {
        cap.cost(1, self.baud())
    }

    /// Cheapest relative plan from `old` to `new`, or `None` when no
    /// relative strategy can reach the target or absolute addressing wins.
    ///
    /// Positions are `(x, y)`.
    pub fn plan_move(&self, old: Option<(u16, u16)>, new: (u16, u16)) -> Option<Vec<u8>> {
        let old = old?;
        if old == new {
            return Some(Vec::new());
        }

        // A two-directional move with no row- or column-absolute capability
        // is handed straight to cup.
        if old.0 != new.0
            && old.1 != new.1
            && !self.caps.row_address.is_supported()
            && !self.caps.column_address.is_supported()
            && self.caps.cursor_address.is_supported()
        {
            return None;
        }

        // Long horizontal travel landing near the right edge goes absolute;
        // stepping into the margin is where wrap glitches live.
        let span = old.0.abs_diff(new.0);
        if span > EDGE_THRESHOLD
            && new.0 >= self.width.saturating_sub(EDGE_THRESHOLD)
            && self.caps.cursor_address.is_supported()
        {
            return None;
        }

        let (bytes, cost) = self.best_relative(old, new)?;
        match self.absolute_cost(new) {
            Some(abs) if abs < cost => None,
            _ => Some(bytes),
        }
    }

    /// Absolute addressing sequence for `new`, or `None` when neither
    /// `cursor_address` nor the `row_address`/`column_address` pair exists.
    pub fn absolute(&self, new: (u16, u16)) -> Option<Vec<u8>> {
        if self.caps.cursor_address.is_supported() {
            return self
                .caps
                .cursor_address
                .expand(&[i32::from(new.1), i32::from(new.0)]);
        }
        if self.caps.row_address.is_supported() && self.caps.column_address.is_supported() {
            let mut out = self.caps.row_address.expand(&[i32::from(new.1)])?;
            self.caps
                .column_address
                .expand_into(&[i32::from(new.0)], &mut out);
            return Some(out);
        }
        None
    }

    /// Relative plan when it wins, absolute otherwise. Errs only when every
    /// strategy, including absolute, is impossible.
    pub fn move_or_abs(
        &self,
        old: Option<(u16, u16)>,
        new: (u16, u16),
    ) -> Result<Vec<u8>, PlanError> {
        if let Some(bytes) = self.plan_move(old, new) {
            return Ok(bytes);
        }
        if let Some(bytes) = self.absolute(new) {
            return Ok(bytes);
        }
        // No absolute addressing at all; take any relative plan, edge
        // rules notwithstanding.
        if let Some(old) = old
            && let Some((bytes, _)) = self.best_relative(old, new)
        {
            return Ok(bytes);
        }
        Err(PlanError::Unreachable)
    }

    fn absolute_cost(&self, new: (u16, u16)) -> Option<Cost> {
        if self.caps.cursor_address.is_supported() {
            // Cost the expanded form; parameter digits can render shorter
            // or longer than the template text.
            let bytes = self
                .caps
                .cursor_address
                .expand(&[i32::from(new.1), i32::from(new.0)])?;
            let n = bytes.len() as u32;
            Some(Cost {
                time: self.transmit_tenths(n),
                bytes: n,
            })
        } else if self.caps.row_address.is_supported() && self.caps.column_address.is_supported() {
            let a = self.caps.row_address.expand(&[i32::from(new.1)])?;
            let b = self.caps.column_address.expand(&[i32::from(new.0)])?;
            let n = (a.len() + b.len()) as u32;
            Some(Cost {
                time: self.transmit_tenths(n),
                bytes: n,
            })
        } else {
            None
        }
    }

    #[inline]
    fn transmit_tenths(&self, bytes: u32) -> u32 {
        let tenths_per_byte = 90_000 / self.baud().max(1);
        bytes.saturating_mul(tenths_per_byte)
    }

    /// Cheapest of the relative strategies (1, 2, 3, 4, 5). The first
    /// strategy computed wins ties, so planning is deterministic.
    fn best_relative(&self, old: (u16, u16), new: (u16, u16)) -> Option<(Vec<u8>, Cost)> {
        let mut best: Option<(Vec<u8>, Cost)> = None;

        let mut consider = |candidate: Option<(Vec<u8>, Cost)>| {
            if let Some((bytes, cost)) = candidate
                && best.as_ref().is_none_or(|(_, b)| cost < *b)
            {
                best = Some((bytes, cost));
            }
        };

        // 1: straight relative.
        consider(self.relative_from(old, new, Vec::new(), Cost::ZERO));

        // 2: CR, then relative from column 0.
        if self.caps.carriage_return.is_supported()
            && let Some(cr) = self.caps.carriage_return.expand(&[])
        {
            let cost = self.cap_cost(&self.caps.carriage_return);
            consider(self.relative_from((0, old.1), new, cr, cost));
        }

        // 3: home, then relative from the origin.
        if self.caps.cursor_home.is_supported()
            && let Some(home) = self.caps.cursor_home.expand(&[])
        {
            let cost = self.cap_cost(&self.caps.cursor_home);
            consider(self.relative_from((0, 0), new, home, cost));
        }

        // 4: lower-left, then relative from the last row.
        if self.caps.cursor_to_ll.is_supported()
            && self.height > 0
            && let Some(ll) = self.caps.cursor_to_ll.expand(&[])
        {
            let cost = self.cap_cost(&self.caps.cursor_to_ll);
            consider(self.relative_from((0, self.height - 1), new, ll, cost));
        }

        // 5: CR, then a backward wrap off column 0 onto the end of the
        // previous row.
        if self.caps.flags.auto_right_margin
            && !self.caps.flags.eat_newline_glitch
            && old.1 > 0
            && self.width > 0
            && self.caps.carriage_return.is_supported()
            && self.caps.cursor_left.is_supported()
            && let Some(mut prefix) = self.caps.carriage_return.expand(&[])
        {
            let mut cost = self.cap_cost(&self.caps.carriage_return);
            if self.caps.cursor_left.expand_into(&[], &mut prefix) {
                cost = cost.add(self.cap_cost(&self.caps.cursor_left));
                consider(self.relative_from((self.width - 1, old.1 - 1), new, prefix, cost));
            }
        }

        best.filter(|(_, c)| !c.is_infinite())
    }

    /// Relative motion from `start` to `new`, appended to an already-paid
    /// prefix. `None` when the vertical or horizontal leg is impossible.
    fn relative_from(
        &self,
        start: (u16, u16),
        new: (u16, u16),
        prefix: Vec<u8>,
        prefix_cost: Cost,
    ) -> Option<(Vec<u8>, Cost)> {
        let mut bytes = prefix;
        let mut cost = prefix_cost;

        if start.1 != new.1 {
            let c = self.vertical(start.1, new.1, &mut bytes)?;
            cost = cost.add(c);
        }
        if start.0 != new.0 {
            let c = self.horizontal(start.0, new.0, &mut bytes)?;
            cost = cost.add(c);
        }
        Some((bytes, cost))
    }

    fn vertical(&self, from: u16, to: u16, out: &mut Vec<u8>) -> Option<Cost> {
        let (parm, single) = if to > from {
            (&self.caps.parm_down_cursor, &self.caps.cursor_down)
        } else {
            (&self.caps.parm_up_cursor, &self.caps.cursor_up)
        };
        self.stepped(from.abs_diff(to), parm, single, out)
    }

    fn horizontal(&self, from: u16, to: u16, out: &mut Vec<u8>) -> Option<Cost> {
        let (parm, single, tab_cap, stop_before) = if to > from {
            (
                &self.caps.parm_right_cursor,
                &self.caps.cursor_right,
                &self.caps.tab,
                false,
            )
        } else {
            (
                &self.caps.parm_left_cursor,
                &self.caps.cursor_left,
                &self.caps.back_tab,
                true,
            )
        };

        let plain = self.stepped_bytes(from.abs_diff(to), parm, single);

        // Hop hardware tab stops across the travel path, stepping the
        // remainder.
        let tabbed = self.tabbed(from, to, tab_cap, parm, single, stop_before);

        let chosen = match (plain, tabbed) {
            (Some(p), Some(t)) => {
                if t.1 < p.1 {
                    t
                } else {
                    p
                }
            }
            (Some(p), None) => p,
            (None, Some(t)) => t,
            (None, None) => return None,
        };
        out.extend_from_slice(&chosen.0);
        Some(chosen.1)
    }

    /// Step `n` cells using the parameterized capability when it is
    /// supported and cheaper than repeating the single-step one.
    fn stepped(
        &self,
        n: u16,
        parm: &Capability,
        single: &Capability,
        out: &mut Vec<u8>,
    ) -> Option<Cost> {
        let (bytes, cost) = self.stepped_bytes(n, parm, single)?;
        out.extend_from_slice(&bytes);
        Some(cost)
    }

    fn stepped_bytes(
        &self,
        n: u16,
        parm: &Capability,
        single: &Capability,
    ) -> Option<(Vec<u8>, Cost)> {
        if n == 0 {
            return Some((Vec::new(), Cost::ZERO));
        }

        let repeated = if single.is_supported() {
            single.expand(&[]).map(|step| {
                let mut bytes = Vec::with_capacity(step.len() * n as usize);
                for _ in 0..n {
                    bytes.extend_from_slice(&step);
                }
                let cost = self.cap_cost(single).times(u32::from(n));
                (bytes, cost)
            })
        } else {
            None
        };

        let parameterized = if parm.is_supported() && n > 1 {
            parm.expand(&[i32::from(n)]).map(|bytes| {
                let n = bytes.len() as u32;
                let cost = Cost {
                    time: self.transmit_tenths(n),
                    bytes: n,
                };
                (bytes, cost)
            })
        } else {
            None
        };

        match (repeated, parameterized) {
            (Some(r), Some(p)) => Some(if p.1 < r.1 { p } else { r }),
            (Some(r), None) => Some(r),
            (None, Some(p)) => Some(p),
            (None, None) => None,
        }
    }

    /// Tab-assisted horizontal motion: ride tab (or back-tab) stops as far
    /// as they go without overshooting, then step the remainder.
    fn tabbed(
        &self,
        from: u16,
        to: u16,
        tab_cap: &Capability,
        parm: &Capability,
        single: &Capability,
        leftward: bool,
    ) -> Option<(Vec<u8>, Cost)> {
        let it = self.caps.flags.init_tabs;
        if it == 0 || !tab_cap.is_supported() {
            return None;
        }

        let (landing, hops) = if leftward {
            // Back-tab from `from` toward `to`: stops at multiples of `it`,
            // never overshooting below `to`.
            let mut pos = from;
            let mut hops = 0u16;
            loop {
                let prev = if pos % it == 0 {
                    pos.checked_sub(it)?
                } else {
                    (pos / it) * it
                };
                if prev < to {
                    break;
                }
                pos = prev;
                hops += 1;
                if pos == to {
                    break;
                }
            }
            (pos, hops)
        } else {
            let mut pos = from;
            let mut hops = 0u16;
            loop {
                let next = (pos / it + 1) * it;
                if next > to || next >= self.width {
                    break;
                }
                pos = next;
                hops += 1;
                if pos == to {
                    break;
                }
            }
            (pos, hops)
        };

        if hops == 0 {
            return None;
        }

        let hop = tab_cap.expand(&[])?;
        let mut bytes = Vec::with_capacity(hop.len() * hops as usize);
        for _ in 0..hops {
            bytes.extend_from_slice(&hop);
        }
        let mut cost = self.cap_cost(tab_cap).times(u32::from(hops));

        if landing != to {
            let (rest, rest_cost) = self.stepped_bytes(landing.abs_diff(to), parm, single)?;
            bytes.extend_from_slice(&rest);
            cost = cost.add(rest_cost);
        }
        Some((bytes, cost))
    }
}
