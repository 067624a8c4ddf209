//! Node descriptors and their encoding into programs.
//!
//! Four node kinds make up a tree:
//!
//! - [`Text`]: a text leaf;
//! - [`Button`]: a `<button>` with attributes, events and a text label;
//! - [`Container`]: an element with a tag from [`Tag`], attributes, events
//!   and children;
//! - [`View`]: a grouping node that emits nothing of its own.
//!
//! Attributes and events are encoded as soon as `attr`/`on` is called and
//! are written in call order. Errors (oversized strings, exhausted callback
//! indices) are remembered and reported by [`Render::render`].
//!
//! # Listener placement
//!
//! EVENT_LISTENER attaches to the node *below* the most recent one. An
//! element's listeners are therefore written after its first child has been
//! materialized and before that child is appended, when the element sits
//! exactly one below the top. A container with listeners but no children
//! gets an empty text node as that first child, and the host keeps it.
//!
//! Children that are [`View`]s are flattened: each of their own children is
//! appended to the enclosing element in turn.
//!
//! # Example
//!
//! ```
//! use bytedom::view::{Container, Render, Text};
//!
//! let tree = Container::new(vec![Text::new("hello").into()]);
//! assert_eq!(
//!     tree.render()?,
//!     [0x01, 3, b'd', b'i', b'v', 0x06, 5, b'h', b'e', b'l', b'l', b'o', 0x03]
//! );
//! # Ok::<(), bytedom::Error>(())
//! ```

use crate::builder::ProgramBuilder;
use crate::callback::{Callback, CallbackStore};
use crate::error::Result;
use std::fmt;
use std::rc::Rc;

/// Anything that can be encoded into a program.
pub trait Render {
    /// Appends this node's encoding to `out`.
    fn render_into(&self, out: &mut ProgramBuilder) -> Result<()>;

    /// Encodes this node as a standalone program.
    fn render(&self) -> Result<Vec<u8>> {
        let mut out = ProgramBuilder::new();
        self.render_into(&mut out)?;
        Ok(out.finish())
    }
}

/// Tag names a [`Container`] may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tag {
    #[default]
    Div,
    Section,
    Header,
    Footer,
    Article,
    Aside,
    Main,
    Nav,
    Span,
    P,
    Ul,
    Li,
}

impl Tag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tag::Div => "div",
            Tag::Section => "section",
            Tag::Header => "header",
            Tag::Footer => "footer",
            Tag::Article => "article",
            Tag::Aside => "aside",
            Tag::Main => "main",
            Tag::Nav => "nav",
            Tag::Span => "span",
            Tag::P => "p",
            Tag::Ul => "ul",
            Tag::Li => "li",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute and event instructions accumulated by `attr` and `on`.
#[derive(Debug, Clone, Default)]
struct Decorations {
    attributes: ProgramBuilder,
    events: ProgramBuilder,
    error: Option<crate::Error>,
}

impl Decorations {
    fn record(&mut self, result: Result<()>) {
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
    }

    fn attr(&mut self, key: &str, value: &str) {
        let result = self.attributes.set_attribute(key, value);
        self.record(result);
    }

    fn on(&mut self, store: &CallbackStore, event: &str, callback: Callback) {
        let result = store
            .register(callback)
            .and_then(|index| self.events.event_listener(event, index));
        self.record(result);
    }

    fn check(&self) -> Result<()> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// A text leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Render for Text {
    fn render_into(&self, out: &mut ProgramBuilder) -> Result<()> {
        out.text_node(&self.text)
    }
}

/// A `<button>` element with a text label.
#[derive(Debug, Clone, Default)]
pub struct Button {
    label: String,
    decorations: Decorations,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            decorations: Decorations::default(),
        }
    }

    #[must_use]
    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.decorations.attr(key, value);
        self
    }

    /// Registers `callback` in `store` and listens for `event`. Each call
    /// takes a fresh callback index.
    #[must_use]
    pub fn on(mut self, store: &CallbackStore, event: &str, callback: impl Fn() + 'static) -> Self {
        self.decorations.on(store, event, Rc::new(callback));
        self
    }
}

impl Render for Button {
    fn render_into(&self, out: &mut ProgramBuilder) -> Result<()> {
        self.decorations.check()?;
        out.create_element("button")?;
        out.append_bytes(self.decorations.attributes.as_bytes())?;
        out.text_node(&self.label)?;
        out.append_bytes(self.decorations.events.as_bytes())?;
        out.append_child()
    }
}

/// An element with children.
///
/// A container with listeners but no children is rendered with an empty
/// text node as its only child, so that the listeners have a node to sit
/// below. That child is part of the host tree: it shows up in
/// [`Document::children`](crate::Document::children) and in any host that
/// walks child lists, though it serializes to nothing.
#[derive(Debug, Clone, Default)]
pub struct Container {
    tag: Tag,
    children: Vec<Node>,
    decorations: Decorations,
}

impl Container {
    #[must_use]
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            tag: Tag::Div,
            children,
            decorations: Decorations::default(),
        }
    }

    #[must_use]
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.decorations.attr(key, value);
        self
    }

    /// Registers `callback` in `store` and listens for `event`. Each call
    /// takes a fresh callback index.
    #[must_use]
    pub fn on(mut self, store: &CallbackStore, event: &str, callback: impl Fn() + 'static) -> Self {
        self.decorations.on(store, event, Rc::new(callback));
        self
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

impl Render for Container {
    fn render_into(&self, out: &mut ProgramBuilder) -> Result<()> {
        self.decorations.check()?;
        out.create_element(self.tag.as_str())?;
        out.append_bytes(self.decorations.attributes.as_bytes())?;

        let mut children = Vec::new();
        flatten(&self.children, &mut children);

        if children.is_empty() {
            if self.decorations.has_events() {
                out.text_node("")?;
                out.append_bytes(self.decorations.events.as_bytes())?;
                out.append_child()?;
            }
            return Ok(());
        }

        for (i, child) in children.into_iter().enumerate() {
            child.render_into(out)?;
            if i == 0 {
                out.append_bytes(self.decorations.events.as_bytes())?;
            }
            out.append_child()?;
        }
        Ok(())
    }
}

/// A group of nodes rendered back to back.
#[derive(Debug, Clone, Default)]
pub struct View {
    children: Vec<Node>,
}

impl View {
    #[must_use]
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }
}

impl Render for View {
    fn render_into(&self, out: &mut ProgramBuilder) -> Result<()> {
        self.children
            .iter()
            .try_for_each(|child| child.render_into(out))
    }
}

/// Any node of a tree.
#[derive(Debug, Clone)]
pub enum Node {
    Text(Text),
    Button(Button),
    Container(Container),
    View(View),
}

impl Render for Node {
    fn render_into(&self, out: &mut ProgramBuilder) -> Result<()> {
        match self {
            Node::Text(n) => n.render_into(out),
            Node::Button(n) => n.render_into(out),
            Node::Container(n) => n.render_into(out),
            Node::View(n) => n.render_into(out),
        }
    }
}

fn flatten<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
    for node in nodes {
        match node {
            Node::View(view) => flatten(&view.children, out),
            other => out.push(other),
        }
    }
}

impl From<Text> for Node {
    fn from(n: Text) -> Self {
        Node::Text(n)
    }
}

impl From<Button> for Node {
    fn from(n: Button) -> Self {
        Node::Button(n)
    }
}

impl From<Container> for Node {
    fn from(n: Container) -> Self {
        Node::Container(n)
    }
}

impl From<View> for Node {
    fn from(n: View) -> Self {
        Node::View(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::isa::*;

    #[test]
    fn test_text_layout() {
        assert_eq!(
            Text::new("hi").render().unwrap(),
            vec![TEXT_NODE, 2, b'h', b'i']
        );
        assert_eq!(Text::new("").render().unwrap(), vec![TEXT_NODE, 0]);
    }

    #[test]
    fn test_oversized_text_fails() {
        let err = Text::new("a".repeat(256)).render().unwrap_err();
        assert_eq!(
            err,
            Error::Encoding {
                what: "text",
                len: 256
            }
        );
    }

    #[test]
    fn test_container_layout() {
        let program = Container::new(vec![Text::new("a").into(), Text::new("b").into()])
            .tag(Tag::Section)
            .attr("id", "x")
            .render()
            .unwrap();

        let mut expected = vec![CREATE_ELEMENT, 7];
        expected.extend_from_slice(b"section");
        expected.extend_from_slice(&[SET_ATTRIBUTE, 3, b'i', b'd', NOP, 1, b'x']);
        expected.extend_from_slice(&[TEXT_NODE, 1, b'a', APPEND_CHILD]);
        expected.extend_from_slice(&[TEXT_NODE, 1, b'b', APPEND_CHILD]);
        assert_eq!(program, expected);
    }

    #[test]
    fn test_button_layout() {
        let store = CallbackStore::new();
        let program = Button::new("ok")
            .attr("type", "submit")
            .on(&store, "click", || {})
            .render()
            .unwrap();

        let mut expected = vec![CREATE_ELEMENT, 6];
        expected.extend_from_slice(b"button");
        expected.extend_from_slice(&[SET_ATTRIBUTE, 5]);
        expected.extend_from_slice(b"type");
        expected.extend_from_slice(&[NOP, 6]);
        expected.extend_from_slice(b"submit");
        expected.extend_from_slice(&[TEXT_NODE, 2, b'o', b'k']);
        expected.extend_from_slice(&[EVENT_LISTENER, 5]);
        expected.extend_from_slice(b"click");
        expected.extend_from_slice(&[0, APPEND_CHILD]);
        assert_eq!(program, expected);
    }

    #[test]
    fn test_container_events_follow_first_child() {
        let store = CallbackStore::new();
        let program = Container::new(vec![Text::new("a").into(), Text::new("b").into()])
            .on(&store, "x", || {})
            .render()
            .unwrap();

        assert_eq!(
            program,
            vec![
                CREATE_ELEMENT, 3, b'd', b'i', b'v', TEXT_NODE, 1, b'a', EVENT_LISTENER, 1,
                b'x', 0, APPEND_CHILD, TEXT_NODE, 1, b'b', APPEND_CHILD
            ]
        );
    }

    #[test]
    fn test_childless_container_with_events_gets_anchor() {
        let store = CallbackStore::new();
        let program = Container::new(vec![])
            .on(&store, "x", || {})
            .render()
            .unwrap();

        assert_eq!(
            program,
            vec![
                CREATE_ELEMENT, 3, b'd', b'i', b'v', TEXT_NODE, 0, EVENT_LISTENER, 1, b'x', 0,
                APPEND_CHILD
            ]
        );
    }

    #[test]
    fn test_on_allocates_fresh_indices() {
        let store = CallbackStore::new();
        let cb = Rc::new(|| {});
        let a = cb.clone();
        let b = cb.clone();
        let button = Button::new("b")
            .on(&store, "click", move || a())
            .on(&store, "click", move || b());

        assert_eq!(store.len(), 2);
        let program = button.render().unwrap();
        let indices: Vec<u8> = crate::decode(&program)
            .filter_map(|item| match item.unwrap().1 {
                crate::Instruction::EventListener { callback, .. } => Some(callback),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_view_is_concatenation() {
        let view = View::new(vec![Text::new("a").into(), Text::new("b").into()]);
        assert_eq!(
            view.render().unwrap(),
            vec![TEXT_NODE, 1, b'a', TEXT_NODE, 1, b'b']
        );
        assert!(View::default().render().unwrap().is_empty());
    }

    #[test]
    fn test_view_children_are_flattened_into_parent() {
        let program = Container::new(vec![
            View::new(vec![Text::new("a").into(), Text::new("b").into()]).into(),
        ])
        .render()
        .unwrap();

        assert_eq!(
            program,
            vec![
                CREATE_ELEMENT, 3, b'd', b'i', b'v', TEXT_NODE, 1, b'a', APPEND_CHILD, TEXT_NODE,
                1, b'b', APPEND_CHILD
            ]
        );
    }

    #[test]
    fn test_deferred_attribute_error() {
        let long = "v".repeat(300);
        let err = Container::default()
            .attr("ok", "fine")
            .attr("k", &long)
            .render()
            .unwrap_err();
        assert_eq!(
            err,
            Error::Encoding {
                what: "attribute value",
                len: 300
            }
        );
    }
}
