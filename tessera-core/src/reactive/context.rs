//! Reactive Context
//!
//! The reactive context tracks which effect is currently running. This
//! enables automatic dependency tracking: when a reactive field is read, the
//! effect on top of the stack is subscribed to it.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently executing effect.
//! Running an effect pushes it onto the stack; the returned guard pops it
//! again when dropped, on normal return, on `?` and on unwind alike.
//!
//! This design supports nested reactive contexts (e.g., a memo read inside
//! a component render): once the inner computation finishes, the outer
//! effect is the tracking target again.
//!
//! An entry of `None` suspends tracking for the duration of the guard. This
//! is what [`untracked`] uses.

use std::cell::RefCell;

use super::effect::Effect;
use super::subscriber::EffectId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Option<Effect>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the context when dropped.
///
/// This keeps the context stack balanced even if the computation returns
/// early or panics.
pub struct ReactiveContext {
    effect_id: Option<EffectId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given effect.
    ///
    /// While this context is active, any reactive field that is read will
    /// subscribe the effect.
    pub fn enter(effect: &Effect) -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(Some(effect.clone())));
        Self {
            effect_id: Some(effect.id()),
        }
    }

    /// Enter a context in which reads are not tracked.
    pub fn pause() -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(None));
        Self { effect_id: None }
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
    }

    /// Get the effect on top of the stack, if tracking is active.
    pub fn current() -> Option<Effect> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned().flatten())
    }

    /// Check whether the given effect is anywhere on the stack.
    pub fn is_running(id: EffectId) -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|entry| entry.as_ref().is_some_and(|e| e.id() == id))
        })
    }

    /// Current nesting depth.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.as_ref().map(Effect::id),
                    self.effect_id,
                    "ReactiveContext mismatch"
                );
            }
        });
    }
}

/// Run `f` without tracking any reads it performs.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let _ctx = ReactiveContext::pause();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_tracks_effect() {
        let effect = Effect::lazy(|| {});

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current().is_none());

        {
            let _ctx = ReactiveContext::enter(&effect);

            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::current().map(|e| e.id()), Some(effect.id()));
            assert!(ReactiveContext::is_running(effect.id()));
        }

        // Context should be cleaned up after drop
        assert!(!ReactiveContext::is_active());
        assert!(!ReactiveContext::is_running(effect.id()));
    }

    #[test]
    fn nested_contexts() {
        let outer = Effect::lazy(|| {});
        let inner = Effect::lazy(|| {});

        {
            let _ctx1 = ReactiveContext::enter(&outer);
            {
                let _ctx2 = ReactiveContext::enter(&inner);
                assert_eq!(ReactiveContext::current().map(|e| e.id()), Some(inner.id()));
                assert_eq!(ReactiveContext::depth(), 2);
            }

            // After inner context drops, outer should be current
            assert_eq!(ReactiveContext::current().map(|e| e.id()), Some(outer.id()));
        }

        assert!(ReactiveContext::current().is_none());
    }

    #[test]
    fn untracked_suspends_tracking() {
        let effect = Effect::lazy(|| {});
        let _ctx = ReactiveContext::enter(&effect);

        untracked(|| {
            assert!(!ReactiveContext::is_active());
            assert!(ReactiveContext::current().is_none());
        });

        assert!(ReactiveContext::is_active());
    }

    #[test]
    fn stack_is_restored_after_panic() {
        let effect = Effect::lazy(|| {});
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ctx = ReactiveContext::enter(&effect);
            panic!("boom");
        }));

        assert!(result.is_err());
        assert_eq!(ReactiveContext::depth(), 0);
    }
}
