//! The `bytedom` virtual machine.
//!
//! A [`Vm`] owns a program buffer, a program counter, an [`OperandStack`]
//! and a [`NodeTable`]. [`Vm::run`] decodes instructions from the current
//! PC and forwards their effects to a [`Host`].
//!
//! # Addressing
//!
//! Tree-building instructions never name nodes explicitly. They address the
//! live-node stack of the node table:
//!
//! - SET_ATTRIBUTE targets the most recent live node;
//! - EVENT_LISTENER targets the live node below it;
//! - APPEND_CHILD and APPEND_SIBLING pop the most recent node (the child)
//!   and attach it to the node below (the parent).
//!
//! Creation also pushes the new slot id onto the operand stack for the
//! stack-driven opcodes. Appending pops that id again when it is still on
//! top, and a full stack skips the push instead of failing the run.
//!
//! # Termination
//!
//! A run ends when PC reaches the end of the buffer ([`RunState::Done`]),
//! when an unrecognized opcode is read ([`RunState::Halted`], PC jumps to the
//! end so trailing data is ignored), or when an instruction's operands are
//! not all in the buffer yet ([`RunState::Pending`], PC stays on the opcode
//! so a later [`Vm::feed`] and `run` can resume).
//!
//! # Example
//!
//! ```
//! use bytedom::{Document, Vm};
//!
//! let mut doc = Document::new();
//! let mut vm = Vm::new(vec![1, 3, b'd', b'i', b'v', 6, 2, b'h', b'i', 3], &doc);
//! vm.run(&mut doc)?;
//!
//! let root = *vm.peek().unwrap();
//! assert_eq!(doc.to_html(root), "<div>hi</div>");
//! # Ok::<(), bytedom::Error>(())
//! ```

mod stack;
mod table;

pub use stack::OperandStack;
pub use table::{NodeTable, SlotId};

use crate::callback::{CallbackStore, EventHandler};
use crate::config::VmConfig;
use crate::decode::{Decoded, Instruction, decode_at};
use crate::error::{Error, Result};
use crate::host::Host;
use bytedom_log::{debug, trace};

/// How a call to [`Vm::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// PC reached the end of the program.
    Done,
    /// An unrecognized opcode ended the program early.
    Halted,
    /// The instruction at PC is incomplete; feed more bytes and run again.
    Pending,
}

/// A single-owner bytecode interpreter.
pub struct Vm<H: Host> {
    pc: usize,
    program: Vec<u8>,
    stack: OperandStack,
    table: NodeTable<H::Node>,
    callbacks: CallbackStore,
    defer_siblings: bool,
    deferred: Vec<(H::Node, H::Node)>,
}

impl<H: Host> Vm<H> {
    /// Creates a VM with a private callback store and default sizing.
    ///
    /// The host is only consulted for its capabilities.
    pub fn new(program: impl Into<Vec<u8>>, host: &H) -> Self {
        Self::with_config(program, host, CallbackStore::new(), &VmConfig::default())
    }

    /// Creates a VM resolving event callbacks through `callbacks`.
    pub fn with_config(
        program: impl Into<Vec<u8>>,
        host: &H,
        callbacks: CallbackStore,
        config: &VmConfig,
    ) -> Self {
        Self {
            pc: 0,
            program: program.into(),
            stack: OperandStack::new(config.stack_capacity, config.scratch_size),
            table: NodeTable::new(),
            callbacks,
            defer_siblings: host.capabilities().defer_sibling_insertion,
            deferred: Vec::new(),
        }
    }

    #[must_use]
    pub fn pc(&self) -> usize {
        self.pc
    }

    #[must_use]
    pub fn program(&self) -> &[u8] {
        &self.program
    }

    /// Appends a chunk to the program buffer. Chunks need not align with
    /// instruction boundaries.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.program.extend_from_slice(chunk);
    }

    /// The most recent live node: the root, once a whole tree has run.
    #[must_use]
    pub fn peek(&self) -> Option<&H::Node> {
        self.table.top().map(|(_, node)| node)
    }

    #[must_use]
    pub fn table(&self) -> &NodeTable<H::Node> {
        &self.table
    }

    #[must_use]
    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    /// Pushes a value for the stack-driven opcodes.
    pub fn push(&mut self, value: i32) -> Result<()> {
        self.stack.push(value)
    }

    pub fn pop(&mut self) -> Result<i32> {
        self.stack.pop()
    }

    /// Pushes a string into scratch memory for the stack-driven opcodes.
    /// Push its length separately, afterwards.
    pub fn push_text(&mut self, text: &str) -> Result<()> {
        self.stack.push_text(text.as_bytes())
    }

    /// Sibling insertions waiting for [`flush_deferred`](Self::flush_deferred).
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Applies deferred sibling insertions in program order. Call this at
    /// the host's next frame opportunity.
    pub fn flush_deferred(&mut self, host: &mut H) -> usize {
        let count = self.deferred.len();
        for (parent, child) in self.deferred.drain(..) {
            host.insert_after(&parent, &child);
        }
        if count > 0 {
            debug!("flushed {count} deferred sibling insertion(s)");
        }
        count
    }

    /// Executes from the current PC until the program ends, halts or needs
    /// more bytes.
    pub fn run(&mut self, host: &mut H) -> Result<RunState> {
        while self.pc < self.program.len() {
            let at = self.pc;
            match decode_at(&self.program, at)? {
                Decoded::Instruction { instruction, next } => {
                    trace!("{at:04} {instruction}");
                    self.pc = next;
                    self.execute(host, instruction)?;
                }
                Decoded::Truncated => {
                    debug!("instruction at {at} is incomplete, waiting for more bytes");
                    return Ok(RunState::Pending);
                }
                Decoded::Unknown(byte) => {
                    debug!("halting on byte {byte:#04x} at {at}");
                    self.pc = self.program.len();
                    return Ok(RunState::Halted);
                }
            }
        }
        Ok(RunState::Done)
    }

    fn execute(&mut self, host: &mut H, instruction: Instruction) -> Result<()> {
        match instruction {
            Instruction::CreateElement { tag } => {
                if tag.trim().is_empty() {
                    return Err(Error::InvalidTag { tag });
                }
                let node = host.create_element(&tag);
                let id = self.table.insert(node);
                self.push_created(id);
                Ok(())
            }
            Instruction::TextNode { text } => {
                let node = host.create_text_node(&text);
                let id = self.table.insert(node);
                self.push_created(id);
                Ok(())
            }
            Instruction::SetAttribute { key, value } => {
                let (_, node) = self
                    .table
                    .top()
                    .ok_or(Error::InvalidElementId { id: None })?;
                host.set_attribute(node, &key, &value);
                Ok(())
            }
            Instruction::EventListener { event, callback } => {
                let (_, node) = self
                    .table
                    .below_top()
                    .ok_or(Error::InvalidElementId { id: None })?;
                let handler = EventHandler::new(callback, self.callbacks.clone());
                host.add_event_listener(node, &event, handler);
                Ok(())
            }
            Instruction::AppendChild => {
                let (parent, child) = self.take_child()?;
                host.append_child(&parent, &child);
                Ok(())
            }
            Instruction::AppendSibling => {
                let (parent, child) = self.take_child()?;
                if self.defer_siblings {
                    debug!("deferring sibling insertion to the next frame");
                    self.deferred.push((parent, child));
                } else {
                    host.insert_after(&parent, &child);
                }
                Ok(())
            }
            Instruction::RemoveChild => {
                let child = self.stack.pop()?;
                let parent = self.stack.pop()?;
                let (parent, child) = self.resolve_pair(parent, child)?;
                host.remove_child(&parent, &child);
                Ok(())
            }
            Instruction::ReplaceChild => {
                let new_child = self.stack.pop()?;
                let old_child = self.stack.pop()?;
                let parent = self.stack.pop()?;
                let (_, new_child) = self.resolve_pair(parent, new_child)?;
                let (parent, old_child) = self.resolve_pair(parent, old_child)?;
                host.replace_child(&parent, &old_child, &new_child);
                Ok(())
            }
            Instruction::SetText => {
                let len = self.stack.pop()?;
                let text = self.stack.pop_text(len)?;
                let id = self.stack.pop()?;
                let node = self.resolve(id)?;
                host.set_text_content(&node, &text);
                Ok(())
            }
            Instruction::RemoveAttribute => {
                let len = self.stack.pop()?;
                let name = self.stack.pop_text(len)?;
                let id = self.stack.pop()?;
                let node = self.resolve(id)?;
                host.remove_attribute(&node, &name);
                Ok(())
            }
            Instruction::Style => {
                let name_len = self.stack.pop()?;
                let name = self.stack.pop_text(name_len)?;
                let value_len = self.stack.pop()?;
                let value = self.stack.pop_text(value_len)?;
                let id = self.stack.pop()?;
                let node = self.resolve(id)?;
                host.set_style_property(&node, &name, &value);
                Ok(())
            }
        }
    }

    /// Offers a fresh slot id to the operand stack. Tree building never
    /// reads these ids back, so a full stack only costs the stack-driven
    /// opcodes their handle on the node.
    fn push_created(&mut self, id: SlotId) {
        if self.stack.push(id.as_operand()).is_err() {
            debug!("operand stack full, {id} not pushed");
        }
    }

    /// Detaches the most recent live node from the one below it. If the
    /// child's id is still on top of the operand stack it is popped with it,
    /// so building a tree of any size leaves at most one id per live node.
    fn take_child(&mut self) -> Result<(H::Node, H::Node)> {
        let (parent_id, child_id) = self.table.top_pair_ids();
        let Some(pair) = self.table.take_child() else {
            return Err(Error::InvalidParentOrChild {
                parent: parent_id.map(|id| i64::from(id.as_u32())),
                child: child_id.map(|id| i64::from(id.as_u32())),
            });
        };
        if let Some(child_id) = child_id {
            if self.stack.peek() == Some(child_id.as_operand()) {
                let _ = self.stack.pop();
            }
        }
        Ok(pair)
    }

    fn lookup(&self, operand: i32) -> Option<H::Node> {
        SlotId::from_operand(operand)
            .and_then(|id| self.table.get(id))
            .cloned()
    }

    fn resolve(&self, operand: i32) -> Result<H::Node> {
        self.lookup(operand).ok_or(Error::InvalidElementId {
            id: Some(i64::from(operand)),
        })
    }

    fn resolve_pair(&self, parent: i32, child: i32) -> Result<(H::Node, H::Node)> {
        match (self.lookup(parent), self.lookup(child)) {
            (Some(p), Some(c)) => Ok((p, c)),
            _ => Err(Error::InvalidParentOrChild {
                parent: Some(i64::from(parent)),
                child: Some(i64::from(child)),
            }),
        }
    }
}
