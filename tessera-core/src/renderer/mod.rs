//! Renderer
//!
//! The renderer reconciles a previously committed [`VNode`] tree against a
//! newly produced one and commits the difference to a [`Host`].
//!
//! # Patch
//!
//! 1. If the previous node has a different type, the host position right
//!    after it becomes the anchor, the previous node is unmounted and the new
//!    node is mounted from scratch.
//! 2. Otherwise the new node takes over the previous node's host handles (and
//!    component instance) and only the differences are committed: text content,
//!    props, and children.
//!
//! Children lists are diffed by index, or by key when both lists start with
//! a keyed node. See [`children`] for the keyed algorithm.

mod children;
mod host;
mod lis;
mod memory;
mod ops;
mod props;

pub use host::{Host, NodeHandle};
pub use lis::longest_increasing_subsequence;
pub use memory::MemoryHost;
pub use ops::{HostOp, OpLog};

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::component::{Instance, TemplateCompiler};
use crate::error::{RenderError, Result};
use crate::vnode::{Children, NodeKind, Props, VNode};

struct RendererInner {
    host: Rc<dyn Host>,
    compiler: Option<Rc<dyn TemplateCompiler>>,
    /// Committed tree per container passed to `render`.
    roots: RefCell<HashMap<NodeHandle, VNode>>,
}

/// Commits vnode trees to a host.
///
/// Cloning a `Renderer` yields another handle to the same renderer.
#[derive(Clone)]
pub struct Renderer {
    inner: Rc<RendererInner>,
}

/// A handle that does not keep the renderer alive.
#[derive(Clone)]
pub(crate) struct WeakRenderer(Weak<RendererInner>);

impl WeakRenderer {
    pub(crate) fn upgrade(&self) -> Option<Renderer> {
        self.0.upgrade().map(|inner| Renderer { inner })
    }
}

impl Renderer {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self::build(host, None)
    }

    /// A renderer that compiles template components with `compiler`.
    pub fn with_compiler(host: Rc<dyn Host>, compiler: Rc<dyn TemplateCompiler>) -> Self {
        Self::build(host, Some(compiler))
    }

    fn build(host: Rc<dyn Host>, compiler: Option<Rc<dyn TemplateCompiler>>) -> Self {
        Self {
            inner: Rc::new(RendererInner {
                host,
                compiler,
                roots: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn host(&self) -> &dyn Host {
        self.inner.host.as_ref()
    }

    pub(crate) fn compiler(&self) -> Option<&dyn TemplateCompiler> {
        self.inner.compiler.as_deref()
    }

    pub(crate) fn downgrade(&self) -> WeakRenderer {
        WeakRenderer(Rc::downgrade(&self.inner))
    }

    /// Render `vnode` as the content of `container`.
    ///
    /// The committed tree is remembered per container: the next call patches
    /// against it, and `None` unmounts it. If the patch fails the previous
    /// tree stays registered.
    pub fn render(&self, vnode: Option<VNode>, container: NodeHandle) -> Result<()> {
        let prev = self.inner.roots.borrow_mut().remove(&container);

        match (prev, vnode) {
            (Some(mut prev), None) => {
                debug!(container = container.raw(), "unmount root");
                self.unmount(&mut prev, true);
                Ok(())
            }
            (None, None) => Ok(()),
            (mut prev, Some(mut next)) => match self.patch(prev.as_mut(), &mut next, container, None) {
                Ok(()) => {
                    self.inner.roots.borrow_mut().insert(container, next);
                    Ok(())
                }
                Err(err) => {
                    if let Some(prev) = prev {
                        self.inner.roots.borrow_mut().insert(container, prev);
                    }
                    Err(err)
                }
            },
        }
    }

    /// Whether a tree is rendered into `container`.
    pub fn has_root(&self, container: NodeHandle) -> bool {
        self.inner.roots.borrow().contains_key(&container)
    }

    /// Reconcile `prev` against `next` inside `container`, inserting new host
    /// nodes before `anchor`. On return `next` holds the live host handles.
    pub fn patch(
        &self,
        prev: Option<&mut VNode>,
        next: &mut VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<()> {
        let mut prev = prev;
        let mut anchor = anchor;

        if let Some(old) = prev.as_deref_mut() {
            if !old.ty.same_type(&next.ty) {
                anchor = self
                    .last_host_node(old)
                    .and_then(|node| self.host().next_sibling(node));
                self.unmount(old, true);
                prev = None;
            }
        }

        match next.kind() {
            NodeKind::Component => self.process_component(prev, next, container, anchor),
            NodeKind::Text => {
                self.process_text(prev, next, container, anchor);
                Ok(())
            }
            NodeKind::Element => self.process_element(prev, next, container, anchor),
            NodeKind::Fragment => self.process_fragment(prev, next, container, anchor),
        }
    }

    fn process_text(
        &self,
        prev: Option<&mut VNode>,
        next: &mut VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) {
        let host = self.host();
        match prev.and_then(|p| p.el.map(|el| (el, p.text_content() == next.text_content()))) {
            Some((el, same)) => {
                next.el = Some(el);
                if !same {
                    host.set_text(el, next.text_content());
                }
            }
            None => {
                let el = host.create_text(next.text_content());
                next.el = Some(el);
                host.insert_before(container, el, anchor);
            }
        }
    }

    fn process_element(
        &self,
        prev: Option<&mut VNode>,
        next: &mut VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<()> {
        match prev {
            Some(prev) => {
                let el = prev.el.ok_or(RenderError::UnmountedNode)?;
                next.el = Some(el);
                props::patch_props(self.host(), el, &prev.props, &next.props);
                self.patch_children(prev, next, el, None)
            }
            None => self.mount_element(next, container, anchor),
        }
    }

    fn mount_element(
        &self,
        vnode: &mut VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<()> {
        let host = self.host();
        let tag = vnode.tag().unwrap_or_default();
        let el = host.create_element(tag);
        vnode.el = Some(el);

        props::patch_props(host, el, &Props::new(), &vnode.props);
        match &mut vnode.children {
            Children::Text(text) => host.set_element_text(el, text),
            Children::Nodes(nodes) => self.mount_children(nodes, el, None)?,
            Children::None => {}
        }

        host.insert_before(container, el, anchor);
        Ok(())
    }

    fn process_fragment(
        &self,
        prev: Option<&mut VNode>,
        next: &mut VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<()> {
        match prev {
            Some(prev) => {
                let (start, end) = match (prev.el, prev.anchor) {
                    (Some(start), Some(end)) => (start, end),
                    _ => return Err(RenderError::UnmountedNode.into()),
                };
                next.el = Some(start);
                next.anchor = Some(end);
                self.patch_children(prev, next, container, Some(end))
            }
            None => {
                let host = self.host();
                let start = host.create_text("");
                let end = host.create_text("");
                next.el = Some(start);
                next.anchor = Some(end);
                host.insert_before(container, start, anchor);
                host.insert_before(container, end, anchor);
                if let Children::Nodes(nodes) = &mut next.children {
                    self.mount_children(nodes, container, Some(end))?;
                }
                Ok(())
            }
        }
    }

    fn process_component(
        &self,
        prev: Option<&mut VNode>,
        next: &mut VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<()> {
        match prev.and_then(|p| p.component.clone()) {
            Some(instance) => {
                next.component = Some(instance.clone());
                let result = instance.force_update(&next.props);
                next.el = instance.host_el();
                result
            }
            None => Instance::mount(self, next, container, anchor),
        }
    }

    /// Release `vnode` and everything below it.
    ///
    /// Host nodes are removed from their parent only when `remove` is set;
    /// descendants of a removed element go with it, but nested components are
    /// still torn down.
    pub fn unmount(&self, vnode: &mut VNode, remove: bool) {
        let host = self.host();
        match vnode.kind() {
            NodeKind::Component => {
                if let Some(instance) = vnode.component.take() {
                    instance.unmount(self, remove);
                }
            }
            NodeKind::Fragment => {
                if remove {
                    if let Some(start) = vnode.el {
                        host.remove(start);
                    }
                }
                if let Children::Nodes(nodes) = &mut vnode.children {
                    for child in nodes {
                        self.unmount(child, remove);
                    }
                }
                if remove {
                    if let Some(end) = vnode.anchor {
                        host.remove(end);
                    }
                }
            }
            NodeKind::Element => {
                if let Children::Nodes(nodes) = &mut vnode.children {
                    for child in nodes {
                        self.unmount(child, false);
                    }
                }
                if remove {
                    if let Some(el) = vnode.el {
                        host.remove(el);
                    }
                }
            }
            NodeKind::Text => {
                if remove {
                    if let Some(el) = vnode.el {
                        host.remove(el);
                    }
                }
            }
        }
        vnode.el = None;
        vnode.anchor = None;
    }

    /// Move the host nodes of a mounted `vnode` before `anchor`.
    pub(crate) fn move_node(&self, vnode: &VNode, container: NodeHandle, anchor: Option<NodeHandle>) {
        let host = self.host();
        match vnode.kind() {
            NodeKind::Component => {
                if let Some(instance) = &vnode.component {
                    instance.with_subtree(|subtree| {
                        if let Some(subtree) = subtree {
                            self.move_node(subtree, container, anchor);
                        }
                    });
                }
            }
            NodeKind::Fragment => {
                if let Some(start) = vnode.el {
                    host.insert_before(container, start, anchor);
                }
                for child in vnode.children.as_nodes() {
                    self.move_node(child, container, anchor);
                }
                if let Some(end) = vnode.anchor {
                    host.insert_before(container, end, anchor);
                }
            }
            NodeKind::Element | NodeKind::Text => {
                if let Some(el) = vnode.el {
                    host.insert_before(container, el, anchor);
                }
            }
        }
    }

    /// The first host node of a mounted `vnode`.
    pub(crate) fn first_host_node(&self, vnode: &VNode) -> Option<NodeHandle> {
        match &vnode.component {
            Some(instance) => instance.host_el(),
            None => vnode.el,
        }
    }

    /// The last host node of a mounted `vnode`.
    pub(crate) fn last_host_node(&self, vnode: &VNode) -> Option<NodeHandle> {
        match vnode.kind() {
            NodeKind::Component => vnode.component.as_ref().and_then(|instance| {
                instance.with_subtree(|subtree| subtree.and_then(|s| self.last_host_node(s)))
            }),
            NodeKind::Fragment => vnode.anchor,
            NodeKind::Element | NodeKind::Text => vnode.el,
        }
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("roots", &self.inner.roots.borrow().len())
            .field("compiler", &self.inner.compiler.is_some())
            .finish()
    }
}
