//! Operand stack and scratch memory for the stack-driven opcodes.
//!
//! The stack is a fixed array of `i32` slots growing downward from the end.
//! Slot 0 is not a value: it holds the stack pointer, the index of the
//! current top value (or `capacity` when empty).
//!
//! Strings for the stack-driven opcodes live in a separate byte region, the
//! scratch memory, addressed through the same pointer: a string of `len`
//! bytes pushed with [`OperandStack::push_text`] occupies `ceil(len / 4)`
//! slots and is stored at byte offset `4 * sp` of scratch. Reading it back
//! releases those slots.

use crate::error::{Error, Result};

const SP: usize = 0;

pub struct OperandStack {
    slots: Box<[i32]>,
    scratch: Box<[u8]>,
}

const fn words(len: usize) -> usize {
    len.div_ceil(4)
}

impl OperandStack {
    /// Creates an empty stack. The capacity is clamped to `1..=i32::MAX`.
    #[must_use]
    pub fn new(capacity: usize, scratch_size: usize) -> Self {
        let capacity = capacity.clamp(1, i32::MAX as usize);
        let mut slots = vec![0; capacity].into_boxed_slice();
        slots[SP] = capacity as i32;
        Self {
            slots,
            scratch: vec![0; scratch_size].into_boxed_slice(),
        }
    }

    fn sp(&self) -> usize {
        self.slots[SP] as usize
    }

    fn set_sp(&mut self, sp: usize) {
        self.slots[SP] = sp as i32;
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied value slots (text words included).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.capacity() - self.sp()
    }

    /// Reserves `n` slots below the current top and returns the new pointer.
    fn reserve(&mut self, n: usize) -> Result<usize> {
        let sp = self.sp();
        // slot 0 can never hold a value
        if sp < n + 1 {
            return Err(Error::StackOverflow {
                capacity: self.capacity(),
            });
        }
        Ok(sp - n)
    }

    pub fn push(&mut self, value: i32) -> Result<()> {
        let sp = self.reserve(1)?;
        self.slots[sp] = value;
        self.set_sp(sp);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<i32> {
        let sp = self.sp();
        if sp >= self.capacity() {
            return Err(Error::StackUnderflow);
        }
        self.set_sp(sp + 1);
        Ok(self.slots[sp])
    }

    #[must_use]
    pub fn peek(&self) -> Option<i32> {
        let sp = self.sp();
        (sp < self.capacity()).then(|| self.slots[sp])
    }

    /// Pushes `text` into scratch memory, taking `ceil(len / 4)` slots.
    pub fn push_text(&mut self, text: &[u8]) -> Result<()> {
        let sp = self.reserve(words(text.len()))?;
        let offset = sp * 4;
        let region = self
            .scratch
            .get_mut(offset..offset + text.len())
            .ok_or(Error::ScratchOutOfBounds {
                offset,
                len: text.len() as i64,
            })?;
        region.copy_from_slice(text);
        self.set_sp(sp);
        Ok(())
    }

    /// Reads `len` bytes of text at the stack pointer and releases the
    /// slots they occupy.
    pub fn pop_text(&mut self, len: i32) -> Result<String> {
        let sp = self.sp();
        let offset = sp * 4;
        let out_of_bounds = Error::ScratchOutOfBounds {
            offset,
            len: i64::from(len),
        };
        let Ok(len) = usize::try_from(len) else {
            return Err(out_of_bounds);
        };
        if sp + words(len) > self.capacity() {
            return Err(Error::StackUnderflow);
        }
        let bytes = self
            .scratch
            .get(offset..offset + len)
            .ok_or(out_of_bounds)?;
        let text = String::from_utf8_lossy(bytes).into_owned();
        self.set_sp(sp + words(len));
        Ok(text)
    }
}
