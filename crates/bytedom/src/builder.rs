//! A growable, lockable program buffer with one emitter per instruction.
//!
//! The encoder writes through this type, and embedders can use it directly
//! to produce programs by hand, including the stack-driven opcodes the
//! encoder never emits. Emitters validate field lengths before writing, so
//! a failed emit leaves the buffer unchanged.

use crate::error::{Error, Result};
use crate::isa::{self, NOP};

/// Initial capacity used by [`ProgramBuilder::new`].
const DEFAULT_CAPACITY: usize = 1024;

/// A bytecode buffer under construction.
///
/// # Example
///
/// ```
/// use bytedom::ProgramBuilder;
///
/// let mut b = ProgramBuilder::new();
/// b.create_element("div")?;
/// b.text_node("hello")?;
/// b.append_child()?;
/// assert_eq!(b.finish(), [1, 3, b'd', b'i', b'v', 6, 5, b'h', b'e', b'l', b'l', b'o', 3]);
/// # Ok::<(), bytedom::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramBuilder {
    buffer: Vec<u8>,
    locked: bool,
}

impl ProgramBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            locked: false,
        }
    }

    /// Concatenates several programs into a fresh, unlocked builder.
    #[must_use]
    pub fn merge(programs: &[&[u8]]) -> Self {
        let total = programs.iter().map(|p| p.len()).sum();
        let mut merged = Self::with_capacity(total);
        for program in programs {
            merged.buffer.extend_from_slice(program);
        }
        merged
    }

    /// Rejects every further write until [`unlock`](Self::unlock).
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn writable(&mut self) -> Result<&mut Vec<u8>> {
        if self.locked {
            return Err(Error::BufferLocked);
        }
        Ok(&mut self.buffer)
    }

    pub fn append_byte(&mut self, byte: u8) -> Result<()> {
        self.writable()?.push(byte);
        Ok(())
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writable()?.extend_from_slice(bytes);
        Ok(())
    }

    fn op_with_field(&mut self, op: u8, what: &'static str, bytes: &[u8]) -> Result<()> {
        let len = isa::field_len(what, bytes)?;
        let buf = self.writable()?;
        buf.push(op);
        buf.push(len);
        buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Emits CREATE_ELEMENT. Blank tags are rejected here rather than at
    /// run time.
    pub fn create_element(&mut self, tag: &str) -> Result<()> {
        if tag.trim().is_empty() {
            return Err(Error::InvalidTag { tag: tag.into() });
        }
        self.op_with_field(isa::CREATE_ELEMENT, "tag name", tag.as_bytes())
    }

    pub fn text_node(&mut self, text: &str) -> Result<()> {
        self.op_with_field(isa::TEXT_NODE, "text", text.as_bytes())
    }

    /// Emits SET_ATTRIBUTE with the `NOP` delimiter between key and value.
    pub fn set_attribute(&mut self, key: &str, value: &str) -> Result<()> {
        let key_field = isa::key_field_len(key.as_bytes())?;
        let value_len = isa::field_len("attribute value", value.as_bytes())?;
        let buf = self.writable()?;
        buf.push(isa::SET_ATTRIBUTE);
        buf.push(key_field);
        buf.extend_from_slice(key.as_bytes());
        buf.push(NOP);
        buf.push(value_len);
        buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn event_listener(&mut self, event: &str, callback: u8) -> Result<()> {
        if event.is_empty() {
            return Err(Error::Encoding {
                what: "event name",
                len: 0,
            });
        }
        self.op_with_field(isa::EVENT_LISTENER, "event name", event.as_bytes())?;
        self.buffer.push(callback);
        Ok(())
    }

    pub fn append_child(&mut self) -> Result<()> {
        self.append_byte(isa::APPEND_CHILD)
    }

    pub fn append_sibling(&mut self) -> Result<()> {
        self.append_byte(isa::APPEND_SIBLING)
    }

    pub fn remove_child(&mut self) -> Result<()> {
        self.append_byte(isa::REMOVE_CHILD)
    }

    pub fn replace_child(&mut self) -> Result<()> {
        self.append_byte(isa::REPLACE_CHILD)
    }

    pub fn set_text(&mut self) -> Result<()> {
        self.append_byte(isa::SET_TEXT)
    }

    pub fn remove_attribute(&mut self) -> Result<()> {
        self.append_byte(isa::REMOVE_ATTRIBUTE)
    }

    pub fn style(&mut self) -> Result<()> {
        self.append_byte(isa::STYLE)
    }

    pub fn nop(&mut self) -> Result<()> {
        self.append_byte(NOP)
    }

    /// Inserts a byte at `index`, shifting the tail right.
    ///
    /// `index == len()` appends. Indices past the end are ignored.
    pub fn insert_byte(&mut self, index: usize, byte: u8) -> Result<()> {
        let buf = self.writable()?;
        if index <= buf.len() {
            buf.insert(index, byte);
        }
        Ok(())
    }

    /// Removes and returns the byte at `index`, if there is one.
    pub fn remove_byte(&mut self, index: usize) -> Result<Option<u8>> {
        let buf = self.writable()?;
        Ok((index < buf.len()).then(|| buf.remove(index)))
    }

    #[must_use]
    pub fn get_byte(&self, index: usize) -> Option<u8> {
        self.buffer.get(index).copied()
    }

    /// Empties the buffer, keeping its allocation.
    pub fn clear(&mut self) -> Result<()> {
        self.writable()?.clear();
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::*;

    #[test]
    fn test_attribute_layout() {
        let mut b = ProgramBuilder::new();
        b.set_attribute("id", "1").unwrap();
        assert_eq!(b.as_bytes(), [SET_ATTRIBUTE, 3, b'i', b'd', NOP, 1, b'1']);
    }

    #[test]
    fn test_event_listener_layout() {
        let mut b = ProgramBuilder::new();
        b.event_listener("click", 7).unwrap();
        assert_eq!(
            b.as_bytes(),
            [EVENT_LISTENER, 5, b'c', b'l', b'i', b'c', b'k', 7]
        );
        assert!(b.event_listener("", 0).is_err());
    }

    #[test]
    fn test_oversized_fields_leave_buffer_untouched() {
        let mut b = ProgramBuilder::new();
        let long = "x".repeat(256);

        assert_eq!(
            b.text_node(&long),
            Err(Error::Encoding {
                what: "text",
                len: 256
            })
        );
        assert!(b.set_attribute("k", &long).is_err());
        assert!(b.set_attribute(&long[..255], "v").is_err());
        assert!(b.is_empty());

        b.text_node(&long[..255]).unwrap();
        assert_eq!(b.len(), 257);
    }

    #[test]
    fn test_blank_tag_rejected() {
        let mut b = ProgramBuilder::new();
        assert!(matches!(
            b.create_element("  "),
            Err(Error::InvalidTag { .. })
        ));
    }

    #[test]
    fn test_lock_rejects_writes() {
        let mut b = ProgramBuilder::new();
        b.append_child().unwrap();
        b.lock();

        assert!(b.is_locked());
        assert_eq!(b.append_sibling(), Err(Error::BufferLocked));
        assert_eq!(b.text_node("a"), Err(Error::BufferLocked));
        assert_eq!(b.clear(), Err(Error::BufferLocked));
        assert_eq!(b.get_byte(0), Some(APPEND_CHILD));

        b.unlock();
        b.append_sibling().unwrap();
        assert_eq!(b.as_bytes(), [APPEND_CHILD, APPEND_SIBLING]);
    }

    #[test]
    fn test_insert_and_remove_bytes() {
        let mut b = ProgramBuilder::new();
        b.append_bytes(&[1, 3]).unwrap();
        b.insert_byte(1, 2).unwrap();
        b.insert_byte(9, 9).unwrap();
        assert_eq!(b.as_bytes(), [1, 2, 3]);

        assert_eq!(b.remove_byte(0), Ok(Some(1)));
        assert_eq!(b.remove_byte(5), Ok(None));
        assert_eq!(b.as_bytes(), [2, 3]);
    }

    #[test]
    fn test_merge() {
        let merged = ProgramBuilder::merge(&[&[1, 2], &[], &[3]]);
        assert_eq!(merged.finish(), vec![1, 2, 3]);
    }

    #[test]
    fn test_stack_driven_emitters() {
        let mut b = ProgramBuilder::new();
        b.remove_child().unwrap();
        b.replace_child().unwrap();
        b.set_text().unwrap();
        b.remove_attribute().unwrap();
        b.style().unwrap();
        b.nop().unwrap();
        assert_eq!(
            b.finish(),
            vec![REMOVE_CHILD, REPLACE_CHILD, SET_TEXT, REMOVE_ATTRIBUTE, STYLE, NOP]
        );
    }
}
