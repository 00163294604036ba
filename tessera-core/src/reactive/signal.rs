//! Signal Implementation
//!
//! A Signal is a boxed reactive value: a single tracked field named `value`.
//!
//! # How Signals Work
//!
//! 1. When a signal is read inside a running effect, the effect subscribes
//!    to the signal's `value` field.
//!
//! 2. When a signal is written with a value that differs from the current
//!    one (NaN-aware, see [`ReactiveValue`]), all subscribers are notified.
//!    Writing an equal value is a no-op.
//!
//! 3. Raw objects written into a `Signal<Value>` are stored wrapped, so
//!    reads through the signal are tracked deeply.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use super::runtime::Runtime;
use super::subscriber::TargetId;
use super::value::ReactiveValue;

/// The tracked field name shared by signals and memos.
pub(crate) const VALUE_KEY: &str = "value";

struct SignalInner<T> {
    target: TargetId,
    value: RefCell<T>,
}

/// A reactive cell holding a value of type `T`.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (notifies subscribers)
/// count.set(5);
/// ```
pub struct Signal<T: ReactiveValue> {
    inner: Rc<SignalInner<T>>,
}

impl<T: ReactiveValue> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                target: TargetId::new(),
                value: RefCell::new(value.into_stored()),
            }),
        }
    }

    /// Get the signal's tracking target.
    pub fn id(&self) -> TargetId {
        self.inner.target
    }

    /// Get the current value, subscribing the running effect.
    pub fn get(&self) -> T {
        Runtime::track(self.inner.target, VALUE_KEY);
        self.inner.value.borrow().clone()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Set a new value and notify subscribers if it changed.
    pub fn set(&self, value: T) {
        let value = value.into_stored();
        let changed = self.inner.value.borrow().has_changed(&value);
        if !changed {
            return;
        }

        *self.inner.value.borrow_mut() = value;
        Runtime::trigger(self.inner.target, VALUE_KEY);
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = f(&self.inner.value.borrow());
        self.set(new_value);
    }

    /// Get the number of effects subscribed to this signal.
    pub fn subscriber_count(&self) -> usize {
        Runtime::subscriber_count(self.inner.target, VALUE_KEY)
    }

    /// Check whether two handles refer to the same signal.
    pub fn ptr_eq(&self, other: &Signal<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: ReactiveValue> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: ReactiveValue + Debug> Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Effect, Object, Value};
    use std::cell::Cell;

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5);
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn equal_write_does_not_notify() {
        let signal = Signal::new(1);
        let seen = Rc::new(Cell::new(0));
        let runs = Rc::new(Cell::new(0));

        let _effect = Effect::new({
            let (signal, seen, runs) = (signal.clone(), Rc::clone(&seen), Rc::clone(&runs));
            move || {
                seen.set(signal.get());
                runs.set(runs.get() + 1);
            }
        });
        assert_eq!(runs.get(), 1);

        signal.set(1);
        assert_eq!(runs.get(), 1);

        signal.set(2);
        assert_eq!(runs.get(), 2);
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn nan_write_over_nan_does_not_notify() {
        let signal = Signal::new(f64::NAN);
        let runs = Rc::new(Cell::new(0));

        let _effect = Effect::new({
            let (signal, runs) = (signal.clone(), Rc::clone(&runs));
            move || {
                signal.get();
                runs.set(runs.get() + 1);
            }
        });

        signal.set(f64::NAN);
        assert_eq!(runs.get(), 1);

        signal.set(0.5);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn object_values_are_stored_wrapped() {
        let object = Object::new();
        let signal = Signal::new(Value::Null);
        signal.set(Value::Object(object.clone()));

        match signal.get_untracked() {
            Value::Reactive(wrapper) => assert!(wrapper.raw().ptr_eq(&object)),
            other => panic!("expected wrapped object, got {other:?}"),
        }
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);
        assert_eq!(signal1.id(), signal2.id());
    }

    #[test]
    fn signal_ids_are_unique() {
        let s1 = Signal::new(0);
        let s2 = Signal::new(0);
        assert_ne!(s1.id(), s2.id());
    }
}
