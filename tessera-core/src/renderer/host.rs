//! The host tree capability surface.

use serde::{Deserialize, Serialize};

use crate::reactive::Handler;

/// Opaque handle to a node owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle(u64);

impl NodeHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeHandle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Mutation primitives the renderer commits against.
///
/// The renderer never looks at host nodes beyond these operations, so any
/// tree (a DOM, a terminal buffer, a remote mirror) can sit behind it.
pub trait Host {
    fn create_element(&self, tag: &str) -> NodeHandle;

    fn create_text(&self, content: &str) -> NodeHandle;

    /// Replace the content of a text node.
    fn set_text(&self, node: NodeHandle, content: &str);

    /// Replace every child of an element with a single run of text.
    fn set_element_text(&self, el: NodeHandle, content: &str);

    fn set_attribute(&self, el: NodeHandle, name: &str, value: &str);

    fn remove_attribute(&self, el: NodeHandle, name: &str);

    /// Assign a boolean host property (`checked`, `disabled`, ...).
    fn set_property(&self, el: NodeHandle, name: &str, value: bool);

    fn set_style(&self, el: NodeHandle, name: &str, value: &str);

    fn clear_style(&self, el: NodeHandle, name: &str);

    fn add_listener(&self, el: NodeHandle, event: &str, handler: &Handler);

    fn remove_listener(&self, el: NodeHandle, event: &str, handler: &Handler);

    /// Insert `node` into `parent` before `anchor`, or last when `anchor` is
    /// `None`. A node that already has a parent is moved.
    fn insert_before(&self, parent: NodeHandle, node: NodeHandle, anchor: Option<NodeHandle>);

    /// Detach `node` from its parent.
    fn remove(&self, node: NodeHandle);

    fn parent(&self, node: NodeHandle) -> Option<NodeHandle>;

    fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle>;
}
