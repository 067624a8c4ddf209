//! The host collaborator: whatever actually owns the nodes.
//!
//! The VM never touches node contents itself. It asks the host to create
//! nodes, keeps the returned handles in its node table, and forwards every
//! mutation back to the host. A browser binding would implement [`Host`]
//! over real DOM nodes; [`Document`](crate::Document) implements it in
//! memory.

use crate::callback::EventHandler;

/// Behavior a host declares once, when a VM is constructed for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    /// The host cannot insert a sibling synchronously in the task that
    /// created the nodes. APPEND_SIBLING is then queued on the VM and
    /// applied by [`Vm::flush_deferred`](crate::Vm::flush_deferred) at the
    /// next frame opportunity. Node-table bookkeeping is never deferred.
    pub defer_sibling_insertion: bool,
}

/// Node creation and mutation, as seen by the VM.
pub trait Host {
    /// Opaque handle to an element or text node.
    type Node: Clone;

    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities::default()
    }

    fn create_element(&mut self, tag: &str) -> Self::Node;

    fn create_text_node(&mut self, text: &str) -> Self::Node;

    fn set_attribute(&mut self, node: &Self::Node, key: &str, value: &str);

    fn remove_attribute(&mut self, node: &Self::Node, key: &str);

    fn set_style_property(&mut self, node: &Self::Node, name: &str, value: &str);

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Places `child` immediately after `parent`, as its next sibling.
    fn insert_after(&mut self, parent: &Self::Node, child: &Self::Node);

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

    fn replace_child(&mut self, parent: &Self::Node, old_child: &Self::Node, new_child: &Self::Node);

    fn set_text_content(&mut self, node: &Self::Node, text: &str);

    /// Registers `handler` to run whenever `event` fires on `node`.
    fn add_event_listener(&mut self, node: &Self::Node, event: &str, handler: EventHandler);
}
