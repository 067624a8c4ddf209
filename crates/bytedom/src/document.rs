//! An in-memory, DOM-like [`Host`].
//!
//! Nodes live in an append-only arena and are addressed by [`NodeId`].
//! Elements keep their attributes and style properties in insertion order,
//! which makes rendered output deterministic. Nodes created by a VM start
//! detached; APPEND_SIBLING next to a detached node records both in the
//! document's top-level fragment, in order.

use crate::callback::EventHandler;
use crate::host::{Host, HostCapabilities};
use std::fmt::{self, Write};

/// Handle to a node of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        style: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(String, EventHandler)>,
}

/// Arena-backed node store.
#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<NodeData>,
    fragment: Vec<NodeId>,
    capabilities: HostCapabilities,
}

fn upsert(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    match pairs.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value.to_string(),
        None => pairs.push((key.to_string(), value.to_string())),
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A document that asks VMs to defer sibling insertion.
    #[must_use]
    pub fn with_deferred_siblings() -> Self {
        Self {
            capabilities: HostCapabilities {
                defer_sibling_insertion: true,
            },
            ..Self::default()
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        });
        id
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    /// Tag name, for elements.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.data(id).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    #[must_use]
    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.data(id).kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    #[must_use]
    pub fn style(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.data(id).kind {
            NodeKind::Element { style, .. } => {
                style.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
            }
            NodeKind::Text(_) => None,
        }
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    /// Top-level nodes placed side by side through APPEND_SIBLING.
    #[must_use]
    pub fn fragment(&self) -> &[NodeId] {
        &self.fragment
    }

    /// Concatenated text of `id` and its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.data(id).kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for &child in &self.data(id).children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Invokes every listener for `event` on `id`, in registration order.
    /// Returns how many callbacks actually ran.
    pub fn fire(&self, id: NodeId, event: &str) -> usize {
        // Snapshot so a callback cannot observe a half-iterated list.
        let handlers: Vec<EventHandler> = self
            .data(id)
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, handler)| handler.clone())
            .collect();
        handlers.iter().filter(|handler| handler.invoke()).count()
    }

    /// Number of listeners registered on `id` for `event`.
    #[must_use]
    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        self.data(id)
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.data_mut(child).parent.take() {
            self.data_mut(parent).children.retain(|&c| c != child);
        }
        self.fragment.retain(|&c| c != child);
    }

    /// Serializes `id` and its subtree as HTML.
    ///
    /// Text and attribute values are escaped; style properties are written
    /// as a `style` attribute after the regular ones.
    #[must_use]
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Serializes the top-level fragment, or nothing if it is empty.
    #[must_use]
    pub fn fragment_html(&self) -> String {
        let mut out = String::new();
        for &id in &self.fragment {
            self.write_html(id, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let data = self.data(id);
        match &data.kind {
            NodeKind::Text(text) => escape(text, out),
            NodeKind::Element {
                tag,
                attributes,
                style,
            } => {
                let _ = write!(out, "<{tag}");
                for (key, value) in attributes {
                    let _ = write!(out, " {key}=\"");
                    escape(value, out);
                    out.push('"');
                }
                if !style.is_empty() {
                    out.push_str(" style=\"");
                    for (name, value) in style {
                        escape(name, out);
                        out.push_str(": ");
                        escape(value, out);
                        out.push(';');
                    }
                    out.push('"');
                }
                out.push('>');
                for &child in &data.children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

fn escape(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

impl Host for Document {
    type Node = NodeId;

    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
            style: Vec::new(),
        })
    }

    fn create_text_node(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    fn set_attribute(&mut self, node: &NodeId, key: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.data_mut(*node).kind {
            upsert(attributes, key, value);
        }
    }

    fn remove_attribute(&mut self, node: &NodeId, key: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.data_mut(*node).kind {
            attributes.retain(|(k, _)| k != key);
        }
    }

    fn set_style_property(&mut self, node: &NodeId, name: &str, value: &str) {
        if let NodeKind::Element { style, .. } = &mut self.data_mut(*node).kind {
            upsert(style, name, value);
        }
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.detach(*child);
        self.data_mut(*child).parent = Some(*parent);
        self.data_mut(*parent).children.push(*child);
    }

    fn insert_after(&mut self, parent: &NodeId, child: &NodeId) {
        self.detach(*child);
        match self.data(*parent).parent {
            Some(grandparent) => {
                let siblings = &mut self.data_mut(grandparent).children;
                let at = siblings
                    .iter()
                    .position(|&c| c == *parent)
                    .map_or(siblings.len(), |i| i + 1);
                siblings.insert(at, *child);
                self.data_mut(*child).parent = Some(grandparent);
            }
            None => {
                let at = match self.fragment.iter().position(|&c| c == *parent) {
                    Some(i) => i + 1,
                    None => {
                        self.fragment.push(*parent);
                        self.fragment.len()
                    }
                };
                self.fragment.insert(at, *child);
            }
        }
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        if self.data(*child).parent == Some(*parent) {
            self.detach(*child);
        }
    }

    fn replace_child(&mut self, parent: &NodeId, old_child: &NodeId, new_child: &NodeId) {
        if self.data(*old_child).parent != Some(*parent) || old_child == new_child {
            return;
        }
        self.detach(*new_child);
        let siblings = &mut self.data_mut(*parent).children;
        if let Some(slot) = siblings.iter_mut().find(|c| **c == *old_child) {
            *slot = *new_child;
        }
        self.data_mut(*old_child).parent = None;
        self.data_mut(*new_child).parent = Some(*parent);
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) {
        if let NodeKind::Text(content) = &mut self.data_mut(*node).kind {
            *content = text.to_string();
            return;
        }
        let children = std::mem::take(&mut self.data_mut(*node).children);
        for child in children {
            self.data_mut(child).parent = None;
        }
        let text_node = self.create_text_node(text);
        self.append_child(node, &text_node);
    }

    fn add_event_listener(&mut self, node: &NodeId, event: &str, handler: EventHandler) {
        self.data_mut(*node).listeners.push((event.to_string(), handler));
    }
}
