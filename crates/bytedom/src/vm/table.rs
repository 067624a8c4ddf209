//! The VM's node table.
//!
//! Slots are handed out from a counter that only grows, so a slot id is
//! never reused. Next to the slot map sits an explicit stack of live slot
//! ids in creation order: "the most recent node" and "the node below it"
//! are simply its top two entries, and consuming a child pops the top.

use crate::Map;
use std::fmt;

/// Identifier of a node-table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(u32);

impl SlotId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// The value pushed on the operand stack for this slot.
    ///
    /// Slot counts are bounded by the operand stack capacity, which fits
    /// `i32`, so the conversion saturates only on pathological tables.
    #[must_use]
    pub fn as_operand(self) -> i32 {
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }

    /// Interprets a popped operand as a slot id. Negative values are never
    /// slots.
    #[must_use]
    pub fn from_operand(value: i32) -> Option<Self> {
        u32::try_from(value).ok().map(Self)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Slot id -> host node handle, plus the live-node stack.
pub struct NodeTable<N> {
    nodes: Map<u32, N>,
    live: Vec<SlotId>,
    next_id: u32,
}

impl<N> Default for NodeTable<N> {
    fn default() -> Self {
        Self {
            nodes: Map::default(),
            live: Vec::new(),
            next_id: 0,
        }
    }
}

impl<N: Clone> NodeTable<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `node` in a fresh slot and makes it the most recent live node.
    pub fn insert(&mut self, node: N) -> SlotId {
        let id = SlotId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id.0, node);
        self.live.push(id);
        id
    }

    #[must_use]
    pub fn get(&self, id: SlotId) -> Option<&N> {
        self.nodes.get(&id.0)
    }

    /// The most recent live node.
    #[must_use]
    pub fn top(&self) -> Option<(SlotId, &N)> {
        let id = *self.live.last()?;
        Some((id, self.nodes.get(&id.0)?))
    }

    /// The live node created just before the most recent one.
    #[must_use]
    pub fn below_top(&self) -> Option<(SlotId, &N)> {
        let id = *self.live.iter().rev().nth(1)?;
        Some((id, self.nodes.get(&id.0)?))
    }

    /// Slot ids of the top two live nodes, `(below_top, top)`, where known.
    #[must_use]
    pub fn top_pair_ids(&self) -> (Option<SlotId>, Option<SlotId>) {
        let mut rev = self.live.iter().rev().copied();
        let top = rev.next();
        (rev.next(), top)
    }

    /// Removes the most recent live node and returns `(parent, child)`: the
    /// handle below it (which stays live) and the removed handle.
    ///
    /// Returns `None`, changing nothing, with fewer than two live nodes.
    pub fn take_child(&mut self) -> Option<(N, N)> {
        let (Some(parent), Some(child)) = self.top_pair_ids() else {
            return None;
        };
        let parent = self.nodes.get(&parent.0)?.clone();
        let child = self.nodes.remove(&child.0)?;
        self.live.pop();
        Some((parent, child))
    }

    /// Number of live nodes.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// Number of slots ever handed out.
    #[must_use]
    pub fn created(&self) -> u32 {
        self.next_id
    }
}
