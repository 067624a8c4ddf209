// Common test utilities for integration tests
//
// This module provides a host that records every call it receives, plus
// shared program fixtures.

#![allow(dead_code)]

use bytedom::{EventHandler, Host, HostCapabilities};

/// One host call, with node handles replaced by their creation index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    CreateElement(String),
    CreateText(String),
    SetAttribute(usize, String, String),
    RemoveAttribute(usize, String),
    SetStyle(usize, String, String),
    AppendChild(usize, usize),
    InsertAfter(usize, usize),
    RemoveChild(usize, usize),
    ReplaceChild(usize, usize, usize),
    SetText(usize, String),
    Listen(usize, String, u8),
}

/// A host whose nodes are plain indices and which keeps a call log.
#[derive(Default)]
pub struct RecordingHost {
    pub ops: Vec<Op>,
    pub handlers: Vec<(usize, String, EventHandler)>,
    pub defer: bool,
    created: usize,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deferring() -> Self {
        Self {
            defer: true,
            ..Self::default()
        }
    }

    fn next(&mut self) -> usize {
        self.created += 1;
        self.created - 1
    }

    /// Runs every handler registered on `node` for `event`.
    pub fn fire(&self, node: usize, event: &str) -> usize {
        self.handlers
            .iter()
            .filter(|(n, e, _)| *n == node && e == event)
            .filter(|(_, _, handler)| handler.invoke())
            .count()
    }
}

impl Host for RecordingHost {
    type Node = usize;

    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities {
            defer_sibling_insertion: self.defer,
        }
    }

    fn create_element(&mut self, tag: &str) -> usize {
        self.ops.push(Op::CreateElement(tag.to_string()));
        self.next()
    }

    fn create_text_node(&mut self, text: &str) -> usize {
        self.ops.push(Op::CreateText(text.to_string()));
        self.next()
    }

    fn set_attribute(&mut self, node: &usize, key: &str, value: &str) {
        self.ops
            .push(Op::SetAttribute(*node, key.to_string(), value.to_string()));
    }

    fn remove_attribute(&mut self, node: &usize, key: &str) {
        self.ops.push(Op::RemoveAttribute(*node, key.to_string()));
    }

    fn set_style_property(&mut self, node: &usize, name: &str, value: &str) {
        self.ops
            .push(Op::SetStyle(*node, name.to_string(), value.to_string()));
    }

    fn append_child(&mut self, parent: &usize, child: &usize) {
        self.ops.push(Op::AppendChild(*parent, *child));
    }

    fn insert_after(&mut self, parent: &usize, child: &usize) {
        self.ops.push(Op::InsertAfter(*parent, *child));
    }

    fn remove_child(&mut self, parent: &usize, child: &usize) {
        self.ops.push(Op::RemoveChild(*parent, *child));
    }

    fn replace_child(&mut self, parent: &usize, old_child: &usize, new_child: &usize) {
        self.ops
            .push(Op::ReplaceChild(*parent, *old_child, *new_child));
    }

    fn set_text_content(&mut self, node: &usize, text: &str) {
        self.ops.push(Op::SetText(*node, text.to_string()));
    }

    fn add_event_listener(&mut self, node: &usize, event: &str, handler: EventHandler) {
        self.ops
            .push(Op::Listen(*node, event.to_string(), handler.index()));
        self.handlers.push((*node, event.to_string(), handler));
    }
}

/// `<div>hello</div>`, byte for byte.
pub const DIV_HELLO: [u8; 13] = [
    0x01, 0x03, b'd', b'i', b'v', 0x06, 0x05, b'h', b'e', b'l', b'l', b'o', 0x03,
];

/// `<div id="main"><p>one</p><p>two</p></div>`.
pub fn nested_program() -> Vec<u8> {
    let mut b = bytedom::ProgramBuilder::new();
    b.create_element("div").unwrap();
    b.set_attribute("id", "main").unwrap();
    for text in ["one", "two"] {
        b.create_element("p").unwrap();
        b.text_node(text).unwrap();
        b.append_child().unwrap();
        b.append_child().unwrap();
    }
    b.finish()
}

/// Small deterministic generator for the robustness tests.
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    pub fn byte(&mut self) -> u8 {
        (self.next_u64() >> 24) as u8
    }

    pub fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    pub fn bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.byte()).collect()
    }
}
