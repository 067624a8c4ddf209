//! Instruction decoding and disassembly.
//!
//! [`decode_at`] is the single place that knows how to read an instruction's
//! inline operands. The VM uses it to fetch, the disassembler to print.
//! Strings are decoded as UTF-8, with invalid sequences replaced.

use crate::error::{Error, Result};
use crate::isa::{NOP, Opcode};
use std::fmt::{self, Write};

/// A fully decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    CreateElement { tag: String },
    SetAttribute { key: String, value: String },
    AppendChild,
    RemoveChild,
    ReplaceChild,
    TextNode { text: String },
    SetText,
    RemoveAttribute,
    Style,
    EventListener { event: String, callback: u8 },
    AppendSibling,
}

impl Instruction {
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Instruction::CreateElement { .. } => Opcode::CreateElement,
            Instruction::SetAttribute { .. } => Opcode::SetAttribute,
            Instruction::AppendChild => Opcode::AppendChild,
            Instruction::RemoveChild => Opcode::RemoveChild,
            Instruction::ReplaceChild => Opcode::ReplaceChild,
            Instruction::TextNode { .. } => Opcode::TextNode,
            Instruction::SetText => Opcode::SetText,
            Instruction::RemoveAttribute => Opcode::RemoveAttribute,
            Instruction::Style => Opcode::Style,
            Instruction::EventListener { .. } => Opcode::EventListener,
            Instruction::AppendSibling => Opcode::AppendSibling,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode())?;
        match self {
            Instruction::CreateElement { tag } => write!(f, " {tag:?}"),
            Instruction::SetAttribute { key, value } => write!(f, " {key:?} = {value:?}"),
            Instruction::TextNode { text } => write!(f, " {text:?}"),
            Instruction::EventListener { event, callback } => {
                write!(f, " {event:?} -> #{callback}")
            }
            _ => Ok(()),
        }
    }
}

/// Outcome of decoding at one offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete instruction and the offset just past it.
    Instruction { instruction: Instruction, next: usize },
    /// The opcode is known but its operands run past the end of the program.
    Truncated,
    /// The byte is not a dispatchable opcode (this includes `NOP`).
    Unknown(u8),
}

struct Operands<'a> {
    program: &'a [u8],
    pos: usize,
}

impl<'a> Operands<'a> {
    fn byte(&mut self) -> Option<u8> {
        let byte = *self.program.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.program.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(bytes)
    }

    fn string(&mut self, len: usize) -> Option<String> {
        self.bytes(len)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    fn field(&mut self) -> Option<String> {
        let len = self.byte()?;
        self.string(usize::from(len))
    }
}

/// Decodes the instruction starting at `offset`.
///
/// Returns `Decoded::Unknown` when `offset` is out of range. Fails only on
/// a SET_ATTRIBUTE whose key is not followed by the `NOP` delimiter, or whose
/// key field is zero and so leaves no room for it.
pub fn decode_at(program: &[u8], offset: usize) -> Result<Decoded> {
    let Some(&byte) = program.get(offset) else {
        return Ok(Decoded::Unknown(0));
    };
    let Some(op) = Opcode::from_byte(byte) else {
        return Ok(Decoded::Unknown(byte));
    };

    let mut ops = Operands {
        program,
        pos: offset + 1,
    };
    let instruction = match op {
        Opcode::Nop => return Ok(Decoded::Unknown(byte)),
        Opcode::CreateElement => ops.field().map(|tag| Instruction::CreateElement { tag }),
        Opcode::TextNode => ops.field().map(|text| Instruction::TextNode { text }),
        Opcode::SetAttribute => match decode_attribute(&mut ops, offset)? {
            Some((key, value)) => Some(Instruction::SetAttribute { key, value }),
            None => None,
        },
        Opcode::EventListener => ops.field().and_then(|event| {
            let callback = ops.byte()?;
            Some(Instruction::EventListener { event, callback })
        }),
        Opcode::AppendChild => Some(Instruction::AppendChild),
        Opcode::AppendSibling => Some(Instruction::AppendSibling),
        Opcode::RemoveChild => Some(Instruction::RemoveChild),
        Opcode::ReplaceChild => Some(Instruction::ReplaceChild),
        Opcode::SetText => Some(Instruction::SetText),
        Opcode::RemoveAttribute => Some(Instruction::RemoveAttribute),
        Opcode::Style => Some(Instruction::Style),
    };

    Ok(match instruction {
        Some(instruction) => Decoded::Instruction {
            instruction,
            next: ops.pos,
        },
        None => Decoded::Truncated,
    })
}

fn decode_attribute(ops: &mut Operands<'_>, offset: usize) -> Result<Option<(String, String)>> {
    let Some(key_field) = ops.byte() else {
        return Ok(None);
    };
    let Some(key_len) = usize::from(key_field).checked_sub(1) else {
        return Err(Error::MalformedAttribute {
            offset,
            found: key_field,
        });
    };
    let Some(key) = ops.string(key_len) else {
        return Ok(None);
    };
    match ops.byte() {
        None => return Ok(None),
        Some(NOP) => {}
        Some(found) => return Err(Error::MalformedAttribute { offset, found }),
    }
    Ok(ops.field().map(|value| (key, value)))
}

/// Why a [`Decoder`] stopped before the end of its program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// A byte that is not a dispatchable opcode.
    Unknown { offset: usize, byte: u8 },
    /// An instruction whose operands are incomplete.
    Truncated { offset: usize },
}

/// Iterator over the instructions of a program.
///
/// Iteration ends at the end of the program, at the first unknown byte, at
/// the first truncated instruction, or after yielding a decode error.
/// [`Decoder::stop`] tells the first two apart from a clean end.
pub struct Decoder<'a> {
    program: &'a [u8],
    offset: usize,
    stop: Option<Stop>,
    failed: bool,
}

/// Decodes `program` from offset 0.
#[must_use]
pub fn decode(program: &[u8]) -> Decoder<'_> {
    Decoder {
        program,
        offset: 0,
        stop: None,
        failed: false,
    }
}

impl Decoder<'_> {
    /// The reason iteration stopped early, if it did.
    #[must_use]
    pub fn stop(&self) -> Option<Stop> {
        self.stop
    }
}

impl Iterator for Decoder<'_> {
    type Item = Result<(usize, Instruction)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.stop.is_some() || self.offset >= self.program.len() {
            return None;
        }
        let offset = self.offset;
        match decode_at(self.program, offset) {
            Ok(Decoded::Instruction { instruction, next }) => {
                self.offset = next;
                Some(Ok((offset, instruction)))
            }
            Ok(Decoded::Truncated) => {
                self.stop = Some(Stop::Truncated { offset });
                None
            }
            Ok(Decoded::Unknown(byte)) => {
                self.stop = Some(Stop::Unknown { offset, byte });
                None
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Renders `program` one instruction per line, prefixed by its offset.
///
/// ```
/// use bytedom::disassemble;
///
/// let text = disassemble(&[0x01, 3, b'd', b'i', b'v', 0xff]);
/// assert_eq!(text, "0000  CREATE_ELEMENT \"div\"\n0005  <halt 0xff>\n");
/// ```
#[must_use]
pub fn disassemble(program: &[u8]) -> String {
    let mut out = String::new();
    let mut decoder = decode(program);
    for item in decoder.by_ref() {
        match item {
            Ok((offset, instruction)) => {
                let _ = writeln!(out, "{offset:04}  {instruction}");
            }
            Err(e) => {
                let _ = writeln!(out, "error: {e}");
            }
        }
    }
    match decoder.stop() {
        Some(Stop::Unknown { offset, byte }) => {
            let _ = writeln!(out, "{offset:04}  <halt {byte:#04x}>");
        }
        Some(Stop::Truncated { offset }) => {
            let _ = writeln!(out, "{offset:04}  <truncated>");
        }
        None => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::*;

    #[test]
    fn test_decode_create_element() {
        let program = [CREATE_ELEMENT, 3, b'd', b'i', b'v'];
        assert_eq!(
            decode_at(&program, 0),
            Ok(Decoded::Instruction {
                instruction: Instruction::CreateElement { tag: "div".into() },
                next: 5
            })
        );
    }

    #[test]
    fn test_decode_attribute() {
        let program = [SET_ATTRIBUTE, 3, b'i', b'd', NOP, 1, b'1'];
        assert_eq!(
            decode_at(&program, 0),
            Ok(Decoded::Instruction {
                instruction: Instruction::SetAttribute {
                    key: "id".into(),
                    value: "1".into()
                },
                next: 7
            })
        );
    }

    #[test]
    fn test_decode_attribute_without_delimiter() {
        let program = [SET_ATTRIBUTE, 3, b'i', b'd', b'x', 1, b'1'];
        assert_eq!(
            decode_at(&program, 0),
            Err(Error::MalformedAttribute {
                offset: 0,
                found: b'x'
            })
        );

        let zero_key = [SET_ATTRIBUTE, 0, NOP, 0];
        assert!(matches!(
            decode_at(&zero_key, 0),
            Err(Error::MalformedAttribute { found: 0, .. })
        ));
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(decode_at(&[TEXT_NODE, 5, b'h'], 0), Ok(Decoded::Truncated));
        assert_eq!(decode_at(&[SET_ATTRIBUTE, 3, b'i'], 0), Ok(Decoded::Truncated));
        assert_eq!(
            decode_at(&[EVENT_LISTENER, 1, b'x'], 0),
            Ok(Decoded::Truncated)
        );
    }

    #[test]
    fn test_nop_is_not_dispatchable() {
        assert_eq!(decode_at(&[NOP], 0), Ok(Decoded::Unknown(NOP)));
    }

    #[test]
    fn test_decoder_reports_stop() {
        let program = [TEXT_NODE, 1, b'a', APPEND_CHILD, 0x7f, TEXT_NODE];
        let mut decoder = decode(&program);
        let items: Vec<_> = decoder.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], (3, Instruction::AppendChild));
        assert_eq!(
            decoder.stop(),
            Some(Stop::Unknown {
                offset: 4,
                byte: 0x7f
            })
        );
    }

    #[test]
    fn test_disassemble_listing() {
        let program = [
            CREATE_ELEMENT, 6, b'b', b'u', b't', b't', b'o', b'n', EVENT_LISTENER, 5, b'c',
            b'l', b'i', b'c', b'k', 2, TEXT_NODE, 2,
        ];
        assert_eq!(
            disassemble(&program),
            "0000  CREATE_ELEMENT \"button\"\n\
             0008  EVENT_LISTENER \"click\" -> #2\n\
             0016  <truncated>\n"
        );
    }
}
