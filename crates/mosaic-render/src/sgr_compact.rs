#![forbid(unsafe_code)]

//! SGR sequence compaction.
//!
//! A flushed row often carries runs of attribute escapes back to back
//! (`CSI 0 m` `CSI 1 m` `CSI 31 m` ...). [`compact`] merges each strictly
//! adjacent run into a single `CSI p1;...;pn m`, preserving parameter
//! order, so the terminal parses one sequence instead of n. Any byte
//! between two sequences, including another kind of escape, breaks the
//! run.
//!
//! Recognition is deliberately narrow: `ESC [`, then digits and
//! semicolons only, within a bounded window, then `m`. `CSI m` is the
//! standard shorthand for `CSI 0 m` and merges as the parameter `0`.
//! Anything else passes through untouched.
//!
//! The output is never longer than the input, and compaction is
//! idempotent.

use memchr::memchr;

const ESC: u8 = 0x1b;

/// Parameter bytes accepted between `ESC [` and `m`. Real SGR runs are
/// far shorter; past this the scanner treats the escape as foreign.
const MAX_SGR_PARAM_BYTES: usize = 24;

/// End offset (past the `m`) of the SGR sequence starting at `at`, if any.
fn sgr_end(buf: &[u8], at: usize) -> Option<usize> {
    if buf.len() < at + 3 || buf[at] != ESC || buf[at + 1] != b'[' {
        return None;
    }
    let mut i = at + 2;
    let limit = (at + 2 + MAX_SGR_PARAM_BYTES).min(buf.len());
    while i < limit {
        match buf[i] {
            b'0'..=b'9' | b';' => i += 1,
            b'm' => return Some(i + 1),
            _ => return None,
        }
    }
    None
}

/// Merge adjacent SGR sequences in `buf`.
pub fn compact(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len());
    let mut i = 0;

    while i < buf.len() {
        let Some(esc) = memchr(ESC, &buf[i..]) else {
            out.extend_from_slice(&buf[i..]);
            break;
        };
        out.extend_from_slice(&buf[i..i + esc]);
        i += esc;

        let Some(first_end) = sgr_end(buf, i) else {
            out.push(ESC);
            i += 1;
            continue;
        };

        // Collect the strictly adjacent run.
        let run_start = i;
        let mut ends = vec![first_end];
        i = first_end;
        while let Some(end) = sgr_end(buf, i) {
            ends.push(end);
            i = end;
        }

        if ends.len() == 1 {
            // A lone sequence passes through verbatim; rewriting `CSI m`
            // to `CSI 0 m` here would grow the output.
            out.extend_from_slice(&buf[run_start..first_end]);
            continue;
        }

        out.extend_from_slice(b"\x1b[");
        let mut start = run_start;
        for (k, &end) in ends.iter().enumerate() {
            if k > 0 {
                out.push(b';');
            }
            let params = &buf[start + 2..end - 1];
            if params.is_empty() {
                out.push(b'0');
            } else {
                out.extend_from_slice(params);
            }
            start = end;
        }
        out.push(b'm');
    }

    out
}

/// In-place variant of [`compact`].
pub fn compact_in_place(buf: &mut Vec<u8>) {
    let compacted = compact(buf);
    if compacted.len() < buf.len() {
        *buf = compacted;
    }
}
