//! Structural diff of two programs.
//!
//! [`patch`] walks the old and the new program with independent cursors and
//! builds a program that, run on a fresh VM, produces the new tree. It never
//! needs an execution trace of the old program, and it never validates: a
//! malformed result surfaces when a VM runs it.
//!
//! While both cursors are in range:
//!
//! - matching opcodes with string operands (CREATE_ELEMENT, TEXT_NODE,
//!   SET_ATTRIBUTE, EVENT_LISTENER) emit the opcode followed by the *new*
//!   operand region. Each cursor then skips its own region, so the cursors
//!   drift apart when lengths differ;
//! - other matching bytes are copied and both cursors step by one;
//! - on a mismatch the new byte is emitted alone and only the new cursor
//!   moves. The old cursor is not resynchronized.
//!
//! Whatever remains of the new program is then copied verbatim.

use crate::isa::{self, Opcode};
use bytedom_log::trace;

/// Builds the program that supersedes `old` with `new`.
///
/// ```
/// use bytedom::patch;
///
/// let old = [0x01, 3, b'd', b'i', b'v'];
/// let new = [0x01, 4, b's', b'p', b'a', b'n'];
/// assert_eq!(patch(&old, &new), [0x01, 4, b's', b'p', b'a', b'n']);
/// ```
#[must_use]
pub fn patch(old: &[u8], new: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(new.len());
    let mut old_at = 0;
    let mut new_at = 0;

    while old_at < old.len() && new_at < new.len() {
        let old_op = old[old_at];
        let new_op = new[new_at];

        if old_op != new_op {
            out.push(new_op);
            new_at += 1;
            continue;
        }

        out.push(new_op);
        match Opcode::from_byte(new_op) {
            Some(
                op @ (Opcode::CreateElement
                | Opcode::TextNode
                | Opcode::SetAttribute
                | Opcode::EventListener),
            ) => {
                let old_width = isa::operand_width(old, old_at).unwrap_or(0);
                let new_width = isa::operand_width(new, new_at).unwrap_or(0);
                let region = clamp(new, new_at + 1, new_width);
                if old_width == new_width {
                    trace!("{op} at {new_at}: same width, replaced in place");
                } else {
                    trace!("{op} at {new_at}: width {old_width} -> {new_width}");
                }
                out.extend_from_slice(region);
                old_at += 1 + old_width;
                new_at += 1 + new_width;
            }
            _ => {
                old_at += 1;
                new_at += 1;
            }
        }
    }

    if new_at < new.len() {
        out.extend_from_slice(&new[new_at..]);
    }
    out
}

fn clamp(program: &[u8], start: usize, width: usize) -> &[u8] {
    let start = start.min(program.len());
    let end = start.saturating_add(width).min(program.len());
    &program[start..end]
}
