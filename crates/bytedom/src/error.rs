//! Error types for encoding and executing `bytedom` programs.
//!
//! Every failure is fail-fast: the encoder or VM stops at the first contract
//! violation and hands the error to its caller. Unknown opcodes are not
//! errors (the VM treats them as end of program) and the patch engine never
//! validates, so neither has a variant here.

use std::fmt;

/// Errors raised by the encoder, the VM and the program builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// CREATE_ELEMENT decoded an empty or whitespace-only tag name.
    InvalidTag {
        /// The decoded tag name.
        tag: String,
    },

    /// SET_ATTRIBUTE is missing the NOP delimiter after its key.
    MalformedAttribute {
        /// Program offset of the SET_ATTRIBUTE opcode.
        offset: usize,
        /// The byte found where the delimiter was expected.
        found: u8,
    },

    /// An instruction addressed a node-table slot that is empty.
    InvalidElementId {
        /// The slot that was addressed, if one could be computed at all.
        id: Option<i64>,
    },

    /// APPEND_CHILD, APPEND_SIBLING, REMOVE_CHILD or REPLACE_CHILD could not
    /// resolve both of its nodes.
    InvalidParentOrChild {
        /// The parent slot, if one could be computed.
        parent: Option<i64>,
        /// The child slot, if one could be computed.
        child: Option<i64>,
    },

    /// A string does not fit a single-byte length field.
    Encoding {
        /// What was being encoded (tag, text, attribute key, ...).
        what: &'static str,
        /// Its length in bytes.
        len: usize,
    },

    /// A session ran out of one-byte callback indices.
    CallbackIndexExhausted,

    /// The operand stack has no free slot.
    StackOverflow {
        /// Configured capacity in slots, including the pointer slot.
        capacity: usize,
    },

    /// The operand stack is empty.
    StackUnderflow,

    /// A stack-driven opcode read text outside the scratch memory.
    ScratchOutOfBounds {
        /// Byte offset of the read.
        offset: usize,
        /// Requested length, as popped from the stack.
        len: i64,
    },

    /// An emitter was called on a locked program builder.
    BufferLocked,

    /// A complete program ended inside an instruction.
    TruncatedProgram {
        /// Offset of the incomplete instruction's opcode.
        offset: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidTag { tag } => write!(f, "Invalid tag name: {tag:?}"),
            Error::MalformedAttribute { offset, found } => {
                write!(
                    f,
                    "Malformed attribute at offset {offset}: expected NOP delimiter, found {found:#04x}"
                )
            }
            Error::InvalidElementId { id: Some(id) } => {
                write!(f, "Invalid element ID: {id}")
            }
            Error::InvalidElementId { id: None } => {
                write!(f, "Invalid element ID: node table is empty")
            }
            Error::InvalidParentOrChild { parent, child } => {
                write!(
                    f,
                    "Invalid parent or child: parent {}, child {}",
                    slot(*parent),
                    slot(*child)
                )
            }
            Error::Encoding { what, len } => {
                write!(
                    f,
                    "Encoding error: {what} is {len} bytes, the length field holds at most 255"
                )
            }
            Error::CallbackIndexExhausted => {
                write!(f, "Callback store has no free one-byte index left")
            }
            Error::StackOverflow { capacity } => {
                write!(f, "Operand stack overflow (capacity {capacity})")
            }
            Error::StackUnderflow => write!(f, "Operand stack underflow"),
            Error::ScratchOutOfBounds { offset, len } => {
                write!(
                    f,
                    "Scratch memory read of {len} bytes at offset {offset} is out of bounds"
                )
            }
            Error::BufferLocked => write!(f, "Program buffer is locked"),
            Error::TruncatedProgram { offset } => {
                write!(f, "Program ends inside the instruction at offset {offset}")
            }
        }
    }
}

fn slot(id: Option<i64>) -> String {
    id.map_or_else(|| "<none>".to_string(), |id| id.to_string())
}

impl std::error::Error for Error {}

/// Result type for `bytedom` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::InvalidTag { tag: " ".into() }.to_string(),
            "Invalid tag name: \" \""
        );
        assert_eq!(
            Error::MalformedAttribute {
                offset: 5,
                found: 0x41
            }
            .to_string(),
            "Malformed attribute at offset 5: expected NOP delimiter, found 0x41"
        );
        assert_eq!(
            Error::InvalidParentOrChild {
                parent: None,
                child: Some(0)
            }
            .to_string(),
            "Invalid parent or child: parent <none>, child 0"
        );
        assert_eq!(
            Error::InvalidElementId { id: None }.to_string(),
            "Invalid element ID: node table is empty"
        );
        assert_eq!(
            Error::TruncatedProgram { offset: 7 }.to_string(),
            "Program ends inside the instruction at offset 7"
        );
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(Error::StackUnderflow, Error::StackUnderflow);
        assert_ne!(
            Error::Encoding {
                what: "text",
                len: 256
            },
            Error::Encoding {
                what: "tag",
                len: 256
            }
        );
    }
}
