//! In-memory host.
//!
//! [`MemoryHost`] keeps a real node tree and records every mutation, which
//! makes it the host of choice for tests, benchmarks and for producing op
//! streams consumed elsewhere.

use std::cell::RefCell;
use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::trace;

use super::host::{Host, NodeHandle};
use super::ops::{HostOp, OpLog};
use crate::reactive::{Handler, Value};

#[derive(Debug, Clone)]
enum HostNodeKind {
    Element(String),
    Text(String),
}

#[derive(Debug)]
struct HostNode {
    kind: HostNodeKind,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    attributes: IndexMap<String, String>,
    style: IndexMap<String, String>,
    properties: IndexMap<String, bool>,
    listeners: IndexMap<String, Vec<Handler>>,
}

impl HostNode {
    fn new(kind: HostNodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            style: IndexMap::new(),
            properties: IndexMap::new(),
            listeners: IndexMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Tree {
    next_id: u64,
    nodes: HashMap<NodeHandle, HostNode>,
    ops: Vec<HostOp>,
}

impl Tree {
    fn alloc(&mut self, kind: HostNodeKind) -> NodeHandle {
        self.next_id += 1;
        let handle = NodeHandle::from_raw(self.next_id);
        self.nodes.insert(handle, HostNode::new(kind));
        handle
    }

    fn record(&mut self, op: HostOp) {
        trace!(?op, "host op");
        self.ops.push(op);
    }

    fn detach(&mut self, node: NodeHandle) -> Option<NodeHandle> {
        let parent = self.nodes.get_mut(&node)?.parent.take()?;
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|child| *child != node);
        }
        Some(parent)
    }
}

/// A host whose nodes live in memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    tree: RefCell<Tree>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container element. Not recorded as an op.
    pub fn create_root(&self) -> NodeHandle {
        self.tree.borrow_mut().alloc(HostNodeKind::Element("root".to_string()))
    }

    /// Every op recorded so far.
    pub fn ops(&self) -> Vec<HostOp> {
        self.tree.borrow().ops.clone()
    }

    /// Drain the recorded ops.
    pub fn take_ops(&self) -> OpLog {
        OpLog::from(std::mem::take(&mut self.tree.borrow_mut().ops))
    }

    pub fn clear_ops(&self) {
        self.tree.borrow_mut().ops.clear();
    }

    pub fn op_count(&self) -> usize {
        self.tree.borrow().ops.len()
    }

    /// Number of live nodes, containers included.
    pub fn node_count(&self) -> usize {
        self.tree.borrow().nodes.len()
    }

    pub fn children(&self, node: NodeHandle) -> Vec<NodeHandle> {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn tag(&self, node: NodeHandle) -> Option<String> {
        match &self.tree.borrow().nodes.get(&node)?.kind {
            HostNodeKind::Element(tag) => Some(tag.clone()),
            HostNodeKind::Text(_) => None,
        }
    }

    /// Text content of a node and its descendants.
    pub fn text(&self, node: NodeHandle) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        collect_text(&tree, node, &mut out);
        out
    }

    pub fn attribute(&self, node: NodeHandle, name: &str) -> Option<String> {
        self.tree.borrow().nodes.get(&node)?.attributes.get(name).cloned()
    }

    pub fn style(&self, node: NodeHandle, name: &str) -> Option<String> {
        self.tree.borrow().nodes.get(&node)?.style.get(name).cloned()
    }

    pub fn property(&self, node: NodeHandle, name: &str) -> Option<bool> {
        self.tree.borrow().nodes.get(&node)?.properties.get(name).copied()
    }

    pub fn listener_count(&self, node: NodeHandle, event: &str) -> usize {
        self.tree
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.listeners.get(event))
            .map_or(0, Vec::len)
    }

    /// Call every listener for `event` on `node`. Returns how many ran.
    pub fn dispatch(&self, node: NodeHandle, event: &str, payload: &Value) -> usize {
        let handlers: Vec<Handler> = self
            .tree
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.listeners.get(event))
            .cloned()
            .unwrap_or_default();

        for handler in &handlers {
            handler.call(payload);
        }
        handlers.len()
    }

    /// Markup for the children of `node`.
    pub fn inner_html(&self, node: NodeHandle) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        if let Some(n) = tree.nodes.get(&node) {
            for child in &n.children {
                write_html(&tree, *child, &mut out);
            }
        }
        out
    }

    /// Markup for `node` itself.
    pub fn to_html(&self, node: NodeHandle) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        write_html(&tree, node, &mut out);
        out
    }
}

fn collect_text(tree: &Tree, node: NodeHandle, out: &mut String) {
    let Some(n) = tree.nodes.get(&node) else {
        return;
    };
    match &n.kind {
        HostNodeKind::Text(content) => out.push_str(content),
        HostNodeKind::Element(_) => {
            for child in &n.children {
                collect_text(tree, *child, out);
            }
        }
    }
}

fn write_html(tree: &Tree, node: NodeHandle, out: &mut String) {
    let Some(n) = tree.nodes.get(&node) else {
        return;
    };
    match &n.kind {
        HostNodeKind::Text(content) => out.push_str(content),
        HostNodeKind::Element(tag) => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in &n.attributes {
                out.push_str(&format!(" {name}=\"{value}\""));
            }
            if !n.style.is_empty() {
                let style: Vec<String> = n.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                out.push_str(&format!(" style=\"{}\"", style.join("; ")));
            }
            for (name, _) in n.properties.iter().filter(|(_, on)| **on) {
                out.push(' ');
                out.push_str(name);
            }
            out.push('>');
            for child in &n.children {
                write_html(tree, *child, out);
            }
            out.push_str(&format!("</{tag}>"));
        }
    }
}

impl Host for MemoryHost {
    fn create_element(&self, tag: &str) -> NodeHandle {
        let mut tree = self.tree.borrow_mut();
        let node = tree.alloc(HostNodeKind::Element(tag.to_string()));
        tree.record(HostOp::CreateElement {
            node,
            tag: tag.to_string(),
        });
        node
    }

    fn create_text(&self, content: &str) -> NodeHandle {
        let mut tree = self.tree.borrow_mut();
        let node = tree.alloc(HostNodeKind::Text(content.to_string()));
        tree.record(HostOp::CreateText {
            node,
            content: content.to_string(),
        });
        node
    }

    fn set_text(&self, node: NodeHandle, content: &str) {
        let mut tree = self.tree.borrow_mut();
        if let Some(n) = tree.nodes.get_mut(&node) {
            n.kind = HostNodeKind::Text(content.to_string());
        }
        tree.record(HostOp::SetText {
            node,
            content: content.to_string(),
        });
    }

    fn set_element_text(&self, el: NodeHandle, content: &str) {
        let mut tree = self.tree.borrow_mut();
        let old_children = tree
            .nodes
            .get_mut(&el)
            .map(|n| std::mem::take(&mut n.children))
            .unwrap_or_default();
        for child in old_children {
            if let Some(c) = tree.nodes.get_mut(&child) {
                c.parent = None;
            }
        }
        if !content.is_empty() {
            let text = tree.alloc(HostNodeKind::Text(content.to_string()));
            if let Some(t) = tree.nodes.get_mut(&text) {
                t.parent = Some(el);
            }
            if let Some(n) = tree.nodes.get_mut(&el) {
                n.children.push(text);
            }
        }
        tree.record(HostOp::SetElementText {
            node: el,
            content: content.to_string(),
        });
    }

    fn set_attribute(&self, el: NodeHandle, name: &str, value: &str) {
        let mut tree = self.tree.borrow_mut();
        if let Some(n) = tree.nodes.get_mut(&el) {
            n.attributes.insert(name.to_string(), value.to_string());
        }
        tree.record(HostOp::SetAttribute {
            node: el,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn remove_attribute(&self, el: NodeHandle, name: &str) {
        let mut tree = self.tree.borrow_mut();
        if let Some(n) = tree.nodes.get_mut(&el) {
            n.attributes.shift_remove(name);
        }
        tree.record(HostOp::RemoveAttribute {
            node: el,
            name: name.to_string(),
        });
    }

    fn set_property(&self, el: NodeHandle, name: &str, value: bool) {
        let mut tree = self.tree.borrow_mut();
        if let Some(n) = tree.nodes.get_mut(&el) {
            n.properties.insert(name.to_string(), value);
        }
        tree.record(HostOp::SetProperty {
            node: el,
            name: name.to_string(),
            value,
        });
    }

    fn set_style(&self, el: NodeHandle, name: &str, value: &str) {
        let mut tree = self.tree.borrow_mut();
        if let Some(n) = tree.nodes.get_mut(&el) {
            n.style.insert(name.to_string(), value.to_string());
        }
        tree.record(HostOp::SetStyle {
            node: el,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn clear_style(&self, el: NodeHandle, name: &str) {
        let mut tree = self.tree.borrow_mut();
        if let Some(n) = tree.nodes.get_mut(&el) {
            n.style.shift_remove(name);
        }
        tree.record(HostOp::ClearStyle {
            node: el,
            name: name.to_string(),
        });
    }

    fn add_listener(&self, el: NodeHandle, event: &str, handler: &Handler) {
        let mut tree = self.tree.borrow_mut();
        if let Some(n) = tree.nodes.get_mut(&el) {
            n.listeners
                .entry(event.to_string())
                .or_default()
                .push(handler.clone());
        }
        tree.record(HostOp::AddListener {
            node: el,
            event: event.to_string(),
        });
    }

    fn remove_listener(&self, el: NodeHandle, event: &str, handler: &Handler) {
        let mut tree = self.tree.borrow_mut();
        if let Some(listeners) = tree.nodes.get_mut(&el).and_then(|n| n.listeners.get_mut(event)) {
            listeners.retain(|h| !h.ptr_eq(handler));
        }
        tree.record(HostOp::RemoveListener {
            node: el,
            event: event.to_string(),
        });
    }

    fn insert_before(&self, parent: NodeHandle, node: NodeHandle, anchor: Option<NodeHandle>) {
        let mut tree = self.tree.borrow_mut();
        let moved = tree.detach(node).is_some();

        let Some(parent_node) = tree.nodes.get_mut(&parent) else {
            return;
        };
        let index = anchor
            .and_then(|a| parent_node.children.iter().position(|c| *c == a))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(index, node);
        if let Some(n) = tree.nodes.get_mut(&node) {
            n.parent = Some(parent);
        }

        let op = if moved {
            HostOp::Move { parent, node, anchor }
        } else {
            HostOp::Insert { parent, node, anchor }
        };
        tree.record(op);
    }

    fn remove(&self, node: NodeHandle) {
        let mut tree = self.tree.borrow_mut();
        tree.detach(node);
        tree.record(HostOp::Remove { node });
    }

    fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.tree.borrow().nodes.get(&node)?.parent
    }

    fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
        let tree = self.tree.borrow();
        let parent = tree.nodes.get(&node)?.parent?;
        let siblings = &tree.nodes.get(&parent)?.children;
        let index = siblings.iter().position(|c| *c == node)?;
        siblings.get(index + 1).copied()
    }
}
