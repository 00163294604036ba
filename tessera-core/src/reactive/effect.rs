//! Effect Implementation
//!
//! An Effect is a re-runnable computation that records the reactive fields
//! it reads while running, and runs again when one of them changes.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies (unless it is lazy).
//!
//! 2. When any dependency changes, the effect either re-runs synchronously
//!    or, if it has a scheduler hook, hands itself to that hook.
//!
//! 3. Before re-running, the effect leaves every subscriber set it joined
//!    and re-collects its dependencies during execution. A branch that stops
//!    reading a field therefore stops reacting to it.
//!
//! # Differences from Memo
//!
//! - Memos return a value; effects do not.
//! - Memos are lazy (compute on access); effects run when deps change.
//! - Memos are built on top of a lazy effect with a scheduler hook.
//!
//! # Lifetime
//!
//! Effects are never destroyed automatically: the dependency map holds them
//! for as long as they are subscribed to something. [`Effect::stop`] detaches
//! an effect for good.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::runtime::Runtime;
use super::subscriber::{EffectId, TargetId};
use crate::error::Result;

/// Deferred re-run policy invoked by `trigger` instead of running the effect.
pub type EffectScheduler = Rc<dyn Fn(&Effect)>;

/// Options accepted by [`Effect::with_options`].
#[derive(Clone, Default)]
pub struct EffectOptions {
    /// Suppress the immediate first run.
    pub lazy: bool,

    /// Called with the effect when a dependency changes.
    pub scheduler: Option<EffectScheduler>,
}

struct EffectInner {
    id: EffectId,
    run: Rc<dyn Fn() -> Result<()>>,
    scheduler: Option<EffectScheduler>,
    /// (target, key) pairs this effect is subscribed to.
    dependencies: RefCell<SmallVec<[(TargetId, Rc<str>); 4]>>,
    active: Cell<bool>,
    run_count: Cell<usize>,
}

/// A re-runnable computation with dependency tracking.
///
/// Cloning an `Effect` yields another handle to the same computation.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let effect = Effect::new({
///     let count = count.clone();
///     move || println!("Count is: {}", count.get())
/// });
///
/// count.set(5);  // Prints: "Count is: 5"
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Create an effect and run it once.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + 'static,
    {
        let effect = Self::build(
            Rc::new(move || {
                run();
                Ok(())
            }),
            None,
        );
        // An infallible body cannot fail the first run.
        let _ = effect.run();
        effect
    }

    /// Create an effect without running it.
    pub fn lazy<F>(run: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self::build(
            Rc::new(move || {
                run();
                Ok(())
            }),
            None,
        )
    }

    /// Create a fallible effect and run it once, propagating its error.
    pub fn try_new<F>(run: F) -> Result<Self>
    where
        F: Fn() -> Result<()> + 'static,
    {
        Self::with_options(run, EffectOptions::default())
    }

    /// Create an effect with explicit options.
    ///
    /// Unless `options.lazy` is set, the effect runs immediately and an error
    /// from that first run is returned.
    pub fn with_options<F>(run: F, options: EffectOptions) -> Result<Self>
    where
        F: Fn() -> Result<()> + 'static,
    {
        let effect = Self::build(Rc::new(run), options.scheduler);
        if !options.lazy {
            effect.run()?;
        }
        Ok(effect)
    }

    /// Create a lazy effect that defers re-runs to `scheduler`.
    pub(crate) fn lazy_scheduled<F>(run: F, scheduler: EffectScheduler) -> Self
    where
        F: Fn() -> Result<()> + 'static,
    {
        Self::build(Rc::new(run), Some(scheduler))
    }

    fn build(run: Rc<dyn Fn() -> Result<()>>, scheduler: Option<EffectScheduler>) -> Self {
        Self {
            inner: Rc::new(EffectInner {
                id: EffectId::new(),
                run,
                scheduler,
                dependencies: RefCell::new(SmallVec::new()),
                active: Cell::new(true),
                run_count: Cell::new(0),
            }),
        }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Get the scheduler hook, if any.
    pub fn scheduler(&self) -> Option<EffectScheduler> {
        self.inner.scheduler.clone()
    }

    /// Execute the effect function with dependency tracking.
    ///
    /// Running an effect that is already on the call stack is a no-op.
    pub fn run(&self) -> Result<()> {
        let run = Rc::clone(&self.inner.run);
        if !self.is_active() {
            return run();
        }
        if ReactiveContext::is_running(self.id()) {
            return Ok(());
        }

        self.cleanup();
        self.inner.run_count.set(self.inner.run_count.get() + 1);

        let _ctx = ReactiveContext::enter(self);
        run()
    }

    /// Detach the effect from every dependency. It will never be triggered
    /// again; explicit runs execute the function untracked.
    pub fn stop(&self) {
        if self.inner.active.replace(false) {
            self.cleanup();
        }
    }

    /// Check if the effect still reacts to changes.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Get the number of times the effect has run with tracking.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Get the number of (target, key) pairs the effect is subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.borrow().len()
    }

    /// Check whether two handles refer to the same effect.
    pub fn ptr_eq(&self, other: &Effect) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn record_dependency(&self, target: TargetId, key: Rc<str>) {
        self.inner.dependencies.borrow_mut().push((target, key));
    }

    fn cleanup(&self) {
        let dependencies = std::mem::take(&mut *self.inner.dependencies.borrow_mut());
        if !dependencies.is_empty() {
            Runtime::unsubscribe(self.id(), &dependencies);
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("active", &self.is_active())
            .field("scheduled", &self.inner.scheduler.is_some())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, RenderError};
    use crate::reactive::Signal;

    #[test]
    fn effect_runs_on_creation() {
        let run_count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&run_count);

        let _effect = Effect::new(move || counter.set(counter.get() + 1));

        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn effect_lazy_does_not_run_on_creation() {
        let run_count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&run_count);

        let effect = Effect::lazy(move || counter.set(counter.get() + 1));

        assert_eq!(run_count.get(), 0);
        assert_eq!(effect.run_count(), 0);

        effect.run().unwrap();
        assert_eq!(run_count.get(), 1);
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn first_run_error_is_returned() {
        let result = Effect::try_new(|| Err(RenderError::MissingRender("X".into()).into()));
        assert!(matches!(result, Err(Error::Render(_))));
    }

    #[test]
    fn dependencies_are_recollected_each_run() {
        let toggle = Signal::new(true);
        let left = Signal::new(1);
        let right = Signal::new(2);
        let seen = Rc::new(Cell::new(0));

        let effect = Effect::new({
            let (toggle, left, right, seen) =
                (toggle.clone(), left.clone(), right.clone(), Rc::clone(&seen));
            move || {
                let value = if toggle.get() { left.get() } else { right.get() };
                seen.set(value);
            }
        });
        assert_eq!(effect.dependency_count(), 2);

        toggle.set(false);
        assert_eq!(seen.get(), 2);
        let runs = effect.run_count();

        // The left branch is no longer read, so writing it is not observed.
        left.set(10);
        assert_eq!(effect.run_count(), runs);

        right.set(20);
        assert_eq!(seen.get(), 20);
        assert_eq!(effect.run_count(), runs + 1);
    }

    #[test]
    fn stopped_effect_still_runs_untracked() {
        let signal = Signal::new(0);
        let run_count = Rc::new(Cell::new(0));

        let effect = Effect::new({
            let (signal, counter) = (signal.clone(), Rc::clone(&run_count));
            move || {
                signal.get();
                counter.set(counter.get() + 1);
            }
        });
        effect.stop();
        assert!(!effect.is_active());

        signal.set(1);
        assert_eq!(run_count.get(), 1);

        effect.run().unwrap();
        assert_eq!(run_count.get(), 2);
        assert_eq!(effect.dependency_count(), 0);
    }

    #[test]
    fn effect_does_not_retrigger_itself() {
        let signal = Signal::new(0);
        let effect = Effect::new({
            let signal = signal.clone();
            move || {
                let value = signal.get();
                if value < 5 {
                    signal.set(value + 1);
                }
            }
        });

        assert_eq!(signal.get_untracked(), 1);
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn effect_clone_shares_state() {
        let effect1 = Effect::new(|| {});
        let effect2 = effect1.clone();

        assert_eq!(effect1.id(), effect2.id());
        assert!(effect1.ptr_eq(&effect2));

        effect1.run().unwrap();
        assert_eq!(effect2.run_count(), 2);

        effect1.stop();
        assert!(!effect2.is_active());
    }
}
