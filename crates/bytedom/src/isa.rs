//! The `bytedom` instruction set.
//!
//! Every instruction starts with a one-byte opcode. Inline operands follow
//! it directly; strings are always a one-byte length followed by exactly
//! that many bytes.
//!
//! | Opcode | Byte | Inline operands |
//! |---|---|---|
//! | `CreateElement` | `0x01` | tag length, tag bytes |
//! | `SetAttribute` | `0x02` | key length + 1, key bytes, `NOP`, value length, value bytes |
//! | `AppendChild` | `0x03` | none |
//! | `RemoveChild` | `0x04` | none (operand stack) |
//! | `ReplaceChild` | `0x05` | none (operand stack) |
//! | `TextNode` | `0x06` | text length, text bytes |
//! | `SetText` | `0x07` | none (operand stack) |
//! | `RemoveAttribute` | `0x08` | none (operand stack) |
//! | `Style` | `0x09` | none (operand stack) |
//! | `EventListener` | `0x0a` | event length, event bytes, callback index |
//! | `Nop` | `0x0b` | delimiter only, never dispatched |
//! | `AppendSibling` | `0x0c` | none |
//!
//! The attribute key length is stored as `len + 1` so the field also covers
//! the mandatory `NOP` delimiter between key and value.

use crate::error::{Error, Result};
use std::fmt;

pub const CREATE_ELEMENT: u8 = 0x01;
pub const SET_ATTRIBUTE: u8 = 0x02;
pub const APPEND_CHILD: u8 = 0x03;
pub const REMOVE_CHILD: u8 = 0x04;
pub const REPLACE_CHILD: u8 = 0x05;
pub const TEXT_NODE: u8 = 0x06;
pub const SET_TEXT: u8 = 0x07;
pub const REMOVE_ATTRIBUTE: u8 = 0x08;
pub const STYLE: u8 = 0x09;
pub const EVENT_LISTENER: u8 = 0x0a;
pub const NOP: u8 = 0x0b;
pub const APPEND_SIBLING: u8 = 0x0c;

/// Largest payload a one-byte length field can describe.
pub const MAX_FIELD_LEN: usize = u8::MAX as usize;

/// Largest attribute key: the field stores `len + 1`.
pub const MAX_KEY_LEN: usize = MAX_FIELD_LEN - 1;

/// A decoded opcode byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    CreateElement = CREATE_ELEMENT,
    SetAttribute = SET_ATTRIBUTE,
    AppendChild = APPEND_CHILD,
    RemoveChild = REMOVE_CHILD,
    ReplaceChild = REPLACE_CHILD,
    TextNode = TEXT_NODE,
    SetText = SET_TEXT,
    RemoveAttribute = REMOVE_ATTRIBUTE,
    Style = STYLE,
    EventListener = EVENT_LISTENER,
    Nop = NOP,
    AppendSibling = APPEND_SIBLING,
}

impl Opcode {
    /// Maps a raw byte to its opcode, or `None` for bytes outside the table.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            CREATE_ELEMENT => Opcode::CreateElement,
            SET_ATTRIBUTE => Opcode::SetAttribute,
            APPEND_CHILD => Opcode::AppendChild,
            REMOVE_CHILD => Opcode::RemoveChild,
            REPLACE_CHILD => Opcode::ReplaceChild,
            TEXT_NODE => Opcode::TextNode,
            SET_TEXT => Opcode::SetText,
            REMOVE_ATTRIBUTE => Opcode::RemoveAttribute,
            STYLE => Opcode::Style,
            EVENT_LISTENER => Opcode::EventListener,
            NOP => Opcode::Nop,
            APPEND_SIBLING => Opcode::AppendSibling,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Disassembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::CreateElement => "CREATE_ELEMENT",
            Opcode::SetAttribute => "SET_ATTRIBUTE",
            Opcode::AppendChild => "APPEND_CHILD",
            Opcode::RemoveChild => "REMOVE_CHILD",
            Opcode::ReplaceChild => "REPLACE_CHILD",
            Opcode::TextNode => "TEXT_NODE",
            Opcode::SetText => "SET_TEXT",
            Opcode::RemoveAttribute => "REMOVE_ATTRIBUTE",
            Opcode::Style => "STYLE",
            Opcode::EventListener => "EVENT_LISTENER",
            Opcode::Nop => "NOP",
            Opcode::AppendSibling => "APPEND_SIBLING",
        }
    }

    /// True for opcodes whose operands come from the operand stack.
    #[must_use]
    pub const fn is_stack_driven(self) -> bool {
        matches!(
            self,
            Opcode::RemoveChild
                | Opcode::ReplaceChild
                | Opcode::SetText
                | Opcode::RemoveAttribute
                | Opcode::Style
        )
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> std::result::Result<Self, u8> {
        Opcode::from_byte(byte).ok_or(byte)
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op.as_byte()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Returns the one-byte length field for `bytes`, or an encoding error if
/// the payload does not fit.
pub fn field_len(what: &'static str, bytes: &[u8]) -> Result<u8> {
    u8::try_from(bytes.len()).map_err(|_| Error::Encoding {
        what,
        len: bytes.len(),
    })
}

/// Returns the SET_ATTRIBUTE key field (`len + 1`) for `key`.
pub fn key_field_len(key: &[u8]) -> Result<u8> {
    if key.len() > MAX_KEY_LEN {
        return Err(Error::Encoding {
            what: "attribute key",
            len: key.len(),
        });
    }
    Ok(key.len() as u8 + 1)
}

/// Width of the inline operand region of the instruction at `at`, not
/// counting the opcode byte. Returns `None` when `program[at]` is not an
/// opcode or the region's length bytes are missing.
///
/// Stack-driven and structural opcodes have an empty region. The returned
/// width may extend past the end of `program` when the operands are
/// truncated; callers clamp.
#[must_use]
pub fn operand_width(program: &[u8], at: usize) -> Option<usize> {
    let op = Opcode::from_byte(*program.get(at)?)?;
    let len_at = |i: usize| program.get(i).map(|&b| usize::from(b));
    match op {
        Opcode::CreateElement | Opcode::TextNode => Some(1 + len_at(at + 1)?),
        Opcode::EventListener => Some(1 + len_at(at + 1)? + 1),
        Opcode::SetAttribute => {
            let key_field = len_at(at + 1)?;
            // key bytes and NOP are covered by the key field
            let value_len = len_at(at + 2 + key_field)?;
            Some(1 + key_field + 1 + value_len)
        }
        _ => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_byte_mapping() {
        for byte in 0x01..=0x0c {
            let op = Opcode::from_byte(byte).unwrap();
            assert_eq!(op.as_byte(), byte);
            assert_eq!(Opcode::try_from(byte), Ok(op));
        }
        assert_eq!(Opcode::from_byte(0x00), None);
        assert_eq!(Opcode::from_byte(0x0d), None);
        assert_eq!(Opcode::try_from(0xff), Err(0xff));
    }

    #[test]
    fn test_stack_driven_subset() {
        let driven: Vec<_> = (0x01..=0x0c)
            .filter_map(Opcode::from_byte)
            .filter(|op| op.is_stack_driven())
            .collect();
        assert_eq!(
            driven,
            vec![
                Opcode::RemoveChild,
                Opcode::ReplaceChild,
                Opcode::SetText,
                Opcode::RemoveAttribute,
                Opcode::Style
            ]
        );
    }

    #[test]
    fn test_field_len_limits() {
        assert_eq!(field_len("text", &[0; 255]), Ok(255));
        assert_eq!(
            field_len("text", &[0; 256]),
            Err(Error::Encoding {
                what: "text",
                len: 256
            })
        );
        assert_eq!(key_field_len(b"id"), Ok(3));
        assert_eq!(key_field_len(&[b'k'; 254]), Ok(255));
        assert!(key_field_len(&[b'k'; 255]).is_err());
    }

    #[test]
    fn test_operand_width() {
        let create = [CREATE_ELEMENT, 3, b'd', b'i', b'v'];
        assert_eq!(operand_width(&create, 0), Some(4));

        let attr = [SET_ATTRIBUTE, 3, b'i', b'd', NOP, 1, b'1'];
        assert_eq!(operand_width(&attr, 0), Some(6));

        let event = [EVENT_LISTENER, 5, b'c', b'l', b'i', b'c', b'k', 0];
        assert_eq!(operand_width(&event, 0), Some(7));

        assert_eq!(operand_width(&[APPEND_CHILD], 0), Some(0));
        assert_eq!(operand_width(&[CREATE_ELEMENT], 0), None);
        assert_eq!(operand_width(&[0xee], 0), None);
    }
}
