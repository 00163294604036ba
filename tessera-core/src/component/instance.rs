//! Component instances.
//!
//! # Lifecycle
//!
//! ```text
//! Unmounted --mount--> Mounted --(prop or state change)--> Updating --> Mounted
//!                         \                                             /
//!                          `------------------ unmount ----------------'
//! ```
//!
//! Every instance owns an update effect. Its scheduler hook marks the
//! instance as having an update pending and queues a job, so state changes
//! re-render once per flush. A parent re-render forwards new props through
//! [`Instance::force_update`], which runs the effect synchronously and clears
//! the pending mark; a job queued earlier in the same tick then finds nothing
//! to do. A job whose instance has an ancestor with an update pending goes
//! back to the end of the queue, so the parent commits first and the child
//! renders once with both its new props and its own state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::context::{RenderContext, SetupContext, State};
use super::definition::ComponentDef;
use crate::error::{RenderError, Result};
use crate::reactive::{untracked, Effect, EffectOptions, EffectScheduler, Reactive, Value};
use crate::renderer::{NodeHandle, Renderer, WeakRenderer};
use crate::scheduler::{queue_job, Job, JobId};
use crate::vnode::{normalize, Props, VNode, VNodeType};

struct InstanceInner {
    def: Rc<ComponentDef>,
    /// The component whose render mounted this one.
    parent: Option<Weak<InstanceInner>>,
    props: Reactive,
    attrs: RefCell<Props>,
    state: Rc<State>,
    subtree: RefCell<Option<VNode>>,
    /// Props forwarded by a parent, applied on the next run of the update.
    next: RefCell<Option<Props>>,
    update: RefCell<Option<Effect>>,
    update_pending: Cell<bool>,
    el: Cell<Option<NodeHandle>>,
    mount_anchor: Cell<Option<NodeHandle>>,
    mounted: Cell<bool>,
    commits: Cell<usize>,
}

impl InstanceInner {
    fn has_pending_ancestor(&self) -> bool {
        let mut parent = self.parent.as_ref().and_then(Weak::upgrade);
        while let Some(inner) = parent {
            if inner.update_pending.get() {
                return true;
            }
            parent = inner.parent.as_ref().and_then(Weak::upgrade);
        }
        false
    }
}

thread_local! {
    /// Instances whose render or patch is running, innermost last.
    static RENDERING: RefCell<Vec<Weak<InstanceInner>>> = const { RefCell::new(Vec::new()) };
}

/// Marks an instance as rendering until dropped.
struct RenderingGuard;

impl RenderingGuard {
    fn enter(inner: &Rc<InstanceInner>) -> Self {
        RENDERING.with(|stack| stack.borrow_mut().push(Rc::downgrade(inner)));
        RenderingGuard
    }

    fn current() -> Option<Weak<InstanceInner>> {
        RENDERING.with(|stack| stack.borrow().last().cloned())
    }
}

impl Drop for RenderingGuard {
    fn drop(&mut self) {
        let _ = RENDERING.try_with(|stack| stack.borrow_mut().pop());
    }
}

/// A mounted component. Cloning yields another handle to the same instance.
#[derive(Clone)]
pub struct Instance {
    inner: Rc<InstanceInner>,
}

/// Split incoming props into declared props and pass-through attrs.
fn partition(def: &ComponentDef, incoming: &Props) -> (Props, Props) {
    incoming
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(key, _)| def.declares(key))
}

impl Instance {
    /// Create the instance for a component `vnode` and commit its first
    /// render into `container` before `anchor`.
    pub(crate) fn mount(
        renderer: &Renderer,
        vnode: &mut VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<()> {
        let VNodeType::Component(def) = &vnode.ty else {
            return Err(RenderError::UnmountedNode.into());
        };
        let def = Rc::clone(def);
        debug!(component = def.name(), "mount component");

        let (declared, attrs) = partition(&def, &vnode.props);
        let props = Reactive::from_fields(declared);

        let state = match def.setup_fn() {
            Some(setup) => {
                let ctx = SetupContext {
                    attrs: attrs.clone(),
                };
                untracked(|| setup(&props, &ctx))?
            }
            None => State::new(),
        };

        let instance = Instance {
            inner: Rc::new(InstanceInner {
                def,
                parent: RenderingGuard::current(),
                props,
                attrs: RefCell::new(attrs),
                state: Rc::new(state),
                subtree: RefCell::new(None),
                next: RefCell::new(None),
                update: RefCell::new(None),
                update_pending: Cell::new(false),
                el: Cell::new(None),
                mount_anchor: Cell::new(anchor),
                mounted: Cell::new(false),
                commits: Cell::new(0),
            }),
        };

        let effect = Effect::with_options(
            update_fn(Rc::downgrade(&instance.inner), renderer.downgrade(), container),
            EffectOptions {
                lazy: true,
                scheduler: Some(schedule_fn(Rc::downgrade(&instance.inner))),
            },
        )?;
        *instance.inner.update.borrow_mut() = Some(effect.clone());
        vnode.component = Some(instance.clone());

        if let Err(err) = effect.run() {
            debug!(component = instance.name(), "first render failed");
            effect.stop();
            instance.inner.update.borrow_mut().take();
            instance.inner.update_pending.set(false);
            vnode.component = None;
            return Err(err);
        }
        vnode.el = instance.host_el();
        Ok(())
    }

    /// Apply props forwarded by a parent and re-render now.
    pub(crate) fn force_update(&self, props: &Props) -> Result<()> {
        trace!(component = self.name(), "forced update");
        *self.inner.next.borrow_mut() = Some(props.clone());
        match self.update_effect() {
            Some(effect) => effect.run(),
            None => Ok(()),
        }
    }

    /// Stop reacting and release the current subtree.
    pub(crate) fn unmount(&self, renderer: &Renderer, remove: bool) {
        debug!(component = self.name(), "unmount component");
        let effect = self.inner.update.borrow_mut().take();
        if let Some(effect) = effect {
            effect.stop();
        }
        self.inner.mounted.set(false);
        self.inner.update_pending.set(false);

        let subtree = self.inner.subtree.borrow_mut().take();
        if let Some(mut subtree) = subtree {
            renderer.unmount(&mut subtree, remove);
        }
        self.inner.el.set(None);
    }

    /// Run the render step and commit it.
    fn update(&self, renderer: &Renderer, container: NodeHandle) -> Result<()> {
        let inner = &self.inner;
        inner.update_pending.set(false);

        let next = inner.next.borrow_mut().take();
        if let Some(next) = next {
            self.apply_props(&next);
        }

        let _rendering = RenderingGuard::enter(inner);
        let render = inner.def.render_fn(renderer.compiler())?;
        let ctx = self.render_context();
        let mut tree = normalize(render(&ctx)?);

        let attrs = inner.attrs.borrow().clone();
        for (name, value) in attrs {
            tree.props.insert(name, value);
        }

        let mut prev = inner.subtree.borrow_mut().take();
        let anchor = inner.mount_anchor.take();
        if let Err(err) = renderer.patch(prev.as_mut(), &mut tree, container, anchor) {
            *inner.subtree.borrow_mut() = prev;
            return Err(err);
        }

        inner.el.set(renderer.first_host_node(&tree));
        *inner.subtree.borrow_mut() = Some(tree);
        inner.mounted.set(true);
        inner.commits.set(inner.commits.get() + 1);
        trace!(component = self.name(), commits = inner.commits.get(), "committed");
        Ok(())
    }

    /// Update declared props in place and replace the attrs.
    fn apply_props(&self, incoming: &Props) {
        let (declared, attrs) = partition(&self.inner.def, incoming);

        for key in self.inner.props.raw().keys() {
            if !declared.contains_key(&key) {
                self.inner.props.remove(&key);
            }
        }
        for (key, value) in declared {
            self.inner.props.set(&key, value);
        }
        *self.inner.attrs.borrow_mut() = attrs;
    }

    fn render_context(&self) -> RenderContext {
        RenderContext::new(
            Rc::clone(&self.inner.def),
            self.inner.props.clone(),
            self.inner.attrs.borrow().clone(),
            Rc::clone(&self.inner.state),
        )
    }

    fn update_effect(&self) -> Option<Effect> {
        self.inner.update.borrow().clone()
    }

    pub(crate) fn with_subtree<R>(&self, f: impl FnOnce(Option<&VNode>) -> R) -> R {
        f(self.inner.subtree.borrow().as_ref())
    }

    pub fn name(&self) -> &str {
        self.inner.def.name()
    }

    pub fn definition(&self) -> &Rc<ComponentDef> {
        &self.inner.def
    }

    /// The reactive declared props.
    pub fn props(&self) -> &Reactive {
        &self.inner.props
    }

    pub fn attrs(&self) -> Props {
        self.inner.attrs.borrow().clone()
    }

    /// A value from the setup state.
    pub fn state(&self, name: &str) -> Option<Value> {
        self.inner.state.get(name).cloned()
    }

    /// First host node of the committed subtree.
    pub fn host_el(&self) -> Option<NodeHandle> {
        self.inner.el.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    /// Whether a self-driven update is queued and not yet applied.
    pub fn is_update_pending(&self) -> bool {
        self.inner.update_pending.get()
    }

    /// Number of renders committed so far.
    pub fn commit_count(&self) -> usize {
        self.inner.commits.get()
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

fn update_fn(
    instance: Weak<InstanceInner>,
    renderer: WeakRenderer,
    container: NodeHandle,
) -> impl Fn() -> Result<()> {
    move || {
        let (Some(inner), Some(renderer)) = (instance.upgrade(), renderer.upgrade()) else {
            return Ok(());
        };
        Instance { inner }.update(&renderer, container)
    }
}

/// Hook run when a dependency of the update effect changes.
fn schedule_fn(instance: Weak<InstanceInner>) -> EffectScheduler {
    Rc::new(move |effect: &Effect| {
        let Some(inner) = instance.upgrade() else {
            return;
        };
        inner.update_pending.set(true);
        queue_job(update_job(Weak::clone(&instance), effect.clone()));
    })
}

/// The queued self-driven update of an instance.
fn update_job(instance: Weak<InstanceInner>, effect: Effect) -> Job {
    Job::with_id(JobId::from_raw(effect.id().raw()), move || {
        let Some(inner) = instance.upgrade() else {
            return Ok(());
        };
        if !inner.update_pending.get() {
            return Ok(());
        }
        if inner.has_pending_ancestor() {
            trace!(component = inner.def.name(), "deferred behind parent update");
            queue_job(update_job(Weak::clone(&instance), effect.clone()));
            return Ok(());
        }
        effect.run()
    })
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("component", &self.name())
            .field("mounted", &self.is_mounted())
            .field("commits", &self.commit_count())
            .field("el", &self.host_el())
            .finish()
    }
}
