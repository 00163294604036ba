//! Virtual Nodes
//!
//! A [`VNode`] describes one node of the tree a render step wants. Nodes are
//! built with [`h`], compared and committed by the
//! [`Renderer`](crate::renderer::Renderer), and carry the host handles they
//! were mounted with so the next diff can reuse them.
//!
//! Dispatch uses two independent discriminants, see [`VNode::shape`]:
//! what the node is ([`NodeKind`]) and what its children are
//! ([`ChildrenKind`]).

mod list;
mod node;

pub use list::render_list;
pub use node::{
    h, normalize, Children, ChildrenKind, Fragment, Key, NodeKind, Props, Renderable, Shape, Text,
    VNode, VNodeType,
};
