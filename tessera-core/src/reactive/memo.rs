//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when one of the
//! reactive fields read by its getter changes, and only when it is read.
//!
//! # How Memos Work
//!
//! 1. A memo starts dirty. The getter runs inside a lazy effect, so the
//!    fields it reads are tracked against that effect.
//!
//! 2. When a dependency changes, the effect's scheduler hook marks the memo
//!    dirty and notifies whoever read the memo. Nothing is recomputed yet.
//!
//! 3. The next read recomputes once, caches the result and clears the flag.
//!    Reads while clean return the cache.
//!
//! Every read (clean or dirty) subscribes the reading effect to the memo,
//! since effects re-collect their dependencies on each run.
//!
//! # Why This Matters
//!
//! - A signal changes
//! - 10 memos depend on it
//! - Only the memos actually read will recompute
//! - Memos that are never read stay dirty (no wasted work)

use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug};
use std::rc::Rc;

use tracing::warn;

use super::context::untracked;
use super::effect::Effect;
use super::runtime::Runtime;
use super::signal::VALUE_KEY;
use super::subscriber::TargetId;
use crate::error::ReactiveError;

struct MemoInner<T> {
    target: TargetId,
    effect: Effect,
    getter: Rc<dyn Fn() -> T>,
    value: Rc<RefCell<Option<T>>>,
    dirty: Rc<Cell<bool>>,
    setter: Option<Box<dyn Fn(T)>>,
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        self.effect.stop();
    }
}

/// A cached derived value that recomputes only when dependencies change.
pub struct Memo<T: Clone + 'static> {
    inner: Rc<MemoInner<T>>,
}

impl<T: Clone + 'static> Memo<T> {
    /// Create a read-only memo. The getter runs on first access.
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self::build(getter, None)
    }

    /// Create a memo whose writes are forwarded to `setter`.
    pub fn with_setter<F, S>(getter: F, setter: S) -> Self
    where
        F: Fn() -> T + 'static,
        S: Fn(T) + 'static,
    {
        Self::build(getter, Some(Box::new(setter)))
    }

    fn build<F>(getter: F, setter: Option<Box<dyn Fn(T)>>) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let target = TargetId::new();
        let value = Rc::new(RefCell::new(None));
        let dirty = Rc::new(Cell::new(true));
        let getter: Rc<dyn Fn() -> T> = Rc::new(getter);

        let compute = Rc::clone(&getter);
        let slot = Rc::clone(&value);
        let flag = Rc::clone(&dirty);
        let effect = Effect::lazy_scheduled(
            move || {
                let computed = compute();
                *slot.borrow_mut() = Some(computed);
                Ok(())
            },
            Rc::new(move |_: &Effect| {
                if !flag.get() {
                    flag.set(true);
                    Runtime::trigger(target, VALUE_KEY);
                }
            }),
        );

        Self {
            inner: Rc::new(MemoInner {
                target,
                effect,
                getter,
                value,
                dirty,
                setter,
            }),
        }
    }

    /// Get the memo's tracking target.
    pub fn id(&self) -> TargetId {
        self.inner.target
    }

    /// Get the current value, recomputing if dirty.
    ///
    /// A read that re-enters the memo during its first evaluation gets a
    /// fresh untracked computation, since nothing is cached yet.
    pub fn get(&self) -> T {
        if self.inner.dirty.get() {
            self.inner.dirty.set(false);
            // The getter is infallible; the effect wrapper always returns Ok.
            let _ = self.inner.effect.run();
        }
        Runtime::track(self.inner.target, VALUE_KEY);

        let cached = self.inner.value.borrow().clone();
        match cached {
            Some(value) => value,
            None => {
                warn!(memo = self.inner.target.raw(), "memo read during its first evaluation");
                untracked(|| (self.inner.getter)())
            }
        }
    }

    /// Forward a write to the setter.
    ///
    /// A memo without a setter rejects the write with a warning.
    pub fn set(&self, value: T) -> Result<(), ReactiveError> {
        match &self.inner.setter {
            Some(setter) => {
                setter(value);
                Ok(())
            }
            None => {
                warn!(memo = self.inner.target.raw(), "write to a read-only memo ignored");
                Err(ReactiveError::ReadonlyMemo(self.inner.target.raw()))
            }
        }
    }

    /// Whether the next read will recompute.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// Get the number of effects subscribed to this memo.
    pub fn dependent_count(&self) -> usize {
        Runtime::subscriber_count(self.inner.target, VALUE_KEY)
    }

    /// Check whether two handles refer to the same memo.
    pub fn ptr_eq(&self, other: &Memo<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + 'static> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Debug + 'static> Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.id())
            .field("dirty", &self.is_dirty())
            .field("value", &*self.inner.value.borrow())
            .field("dependent_count", &self.dependent_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
