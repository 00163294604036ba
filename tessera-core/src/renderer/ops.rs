//! Host mutation records.
//!
//! Every mutation the [`MemoryHost`](super::MemoryHost) applies is recorded
//! as a [`HostOp`]. An [`OpLog`] can be shipped to a remote host as
//! MessagePack.

use serde::{Deserialize, Serialize};

use super::host::NodeHandle;
use crate::error::Result;

/// One host mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostOp {
    CreateElement { node: NodeHandle, tag: String },
    CreateText { node: NodeHandle, content: String },
    SetText { node: NodeHandle, content: String },
    SetElementText { node: NodeHandle, content: String },
    SetAttribute { node: NodeHandle, name: String, value: String },
    RemoveAttribute { node: NodeHandle, name: String },
    SetProperty { node: NodeHandle, name: String, value: bool },
    SetStyle { node: NodeHandle, name: String, value: String },
    ClearStyle { node: NodeHandle, name: String },
    AddListener { node: NodeHandle, event: String },
    RemoveListener { node: NodeHandle, event: String },
    /// First insertion of a detached node.
    Insert {
        parent: NodeHandle,
        node: NodeHandle,
        anchor: Option<NodeHandle>,
    },
    /// Insertion of a node that already had a parent.
    Move {
        parent: NodeHandle,
        node: NodeHandle,
        anchor: Option<NodeHandle>,
    },
    Remove { node: NodeHandle },
}

impl HostOp {
    /// The node the operation applies to.
    pub fn node(&self) -> NodeHandle {
        match self {
            HostOp::CreateElement { node, .. }
            | HostOp::CreateText { node, .. }
            | HostOp::SetText { node, .. }
            | HostOp::SetElementText { node, .. }
            | HostOp::SetAttribute { node, .. }
            | HostOp::RemoveAttribute { node, .. }
            | HostOp::SetProperty { node, .. }
            | HostOp::SetStyle { node, .. }
            | HostOp::ClearStyle { node, .. }
            | HostOp::AddListener { node, .. }
            | HostOp::RemoveListener { node, .. }
            | HostOp::Insert { node, .. }
            | HostOp::Move { node, .. }
            | HostOp::Remove { node } => *node,
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, HostOp::Move { .. })
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, HostOp::Insert { .. })
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, HostOp::Remove { .. })
    }
}

/// An ordered batch of host mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpLog {
    pub ops: Vec<HostOp>,
}

impl OpLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: HostOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostOp> {
        self.ops.iter()
    }

    /// Encode as MessagePack with named fields.
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

impl From<Vec<HostOp>> for OpLog {
    fn from(ops: Vec<HostOp>) -> Self {
        Self { ops }
    }
}

impl IntoIterator for OpLog {
    type Item = HostOp;
    type IntoIter = std::vec::IntoIter<HostOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
