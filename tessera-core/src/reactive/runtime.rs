//! Reactive Runtime
//!
//! The runtime owns the dependency map that connects reactive targets
//! (objects, signals, memos) to the effects that read them.
//!
//! # How It Works
//!
//! 1. When a reactive field is read inside a running effect, [`Runtime::track`]
//!    inserts that effect into the subscriber set for `(target, key)`.
//!
//! 2. When a reactive field changes, [`Runtime::trigger`]:
//!    a. Looks up the subscriber set for `(target, key)`
//!    b. Invokes the scheduler hook of effects that have one (memos mark
//!       themselves dirty here, components enqueue a job)
//!    c. Collects plain effects into a pending set
//!    d. Runs the pending set once the outermost trigger finishes
//!
//! Deferring plain effects to the end of the outermost trigger keeps diamond
//! shaped graphs glitch-free: every memo between the write and the effect is
//! already marked dirty by the time the effect re-runs, and the effect runs
//! once even if several of its inputs were invalidated by the same write.
//!
//! # Threading
//!
//! The runtime is single-threaded. All state lives in thread-locals and is
//! only borrowed for the duration of a lookup, never across user code.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{error, trace};

use super::context::ReactiveContext;
use super::effect::Effect;
use super::subscriber::{EffectId, TargetId};

/// Subscriber sets keyed by field, in subscription order.
type KeyMap = HashMap<Rc<str>, IndexMap<EffectId, Effect>>;

thread_local! {
    static DEPENDENCIES: RefCell<HashMap<TargetId, KeyMap>> = RefCell::new(HashMap::new());
    static BATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
    static PENDING_EFFECTS: RefCell<IndexMap<EffectId, Effect>> = RefCell::new(IndexMap::new());
}

/// Keeps the trigger batch depth balanced across early returns and unwinds.
struct BatchGuard;

impl BatchGuard {
    fn enter() -> Self {
        BATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
        BatchGuard
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        BATCH_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// The per-thread reactive runtime.
pub struct Runtime;

impl Runtime {
    /// Record that the running effect depends on `(target, key)`.
    ///
    /// Reads outside any effect, or inside [`untracked`](super::untracked),
    /// never subscribe anything.
    pub fn track(target: TargetId, key: &str) {
        let Some(effect) = ReactiveContext::current() else {
            return;
        };
        if !effect.is_active() {
            return;
        }

        let inserted = DEPENDENCIES.with(|deps| {
            let mut deps = deps.borrow_mut();
            let keys = deps.entry(target).or_default();
            // Reuse the interned key so every subscriber shares one allocation.
            let key: Rc<str> = match keys.get_key_value(key) {
                Some((existing, _)) => Rc::clone(existing),
                None => Rc::from(key),
            };
            let set = keys.entry(Rc::clone(&key)).or_default();
            if set.contains_key(&effect.id()) {
                None
            } else {
                set.insert(effect.id(), effect.clone());
                Some(key)
            }
        });

        if let Some(key) = inserted {
            trace!(target_id = %target, key = %key, effect = effect.id().raw(), "track");
            effect.record_dependency(target, key);
        }
    }

    /// Notify every effect subscribed to `(target, key)`.
    ///
    /// A pair that was never tracked is a no-op.
    pub fn trigger(target: TargetId, key: &str) {
        let subscribers: Vec<Effect> = DEPENDENCIES.with(|deps| {
            deps.borrow()
                .get(&target)
                .and_then(|keys| keys.get(key))
                .map(|set| set.values().cloned().collect())
                .unwrap_or_default()
        });

        if subscribers.is_empty() {
            return;
        }
        trace!(target_id = %target, key, subscribers = subscribers.len(), "trigger");

        {
            let _batch = BatchGuard::enter();
            for effect in subscribers {
                // An effect never re-triggers itself while it is running.
                if ReactiveContext::is_running(effect.id()) || !effect.is_active() {
                    continue;
                }
                match effect.scheduler() {
                    Some(scheduler) => scheduler(&effect),
                    None => {
                        PENDING_EFFECTS.with(|pending| {
                            pending.borrow_mut().insert(effect.id(), effect);
                        });
                    }
                }
            }
        }

        if BATCH_DEPTH.with(Cell::get) == 0 {
            Self::run_pending_effects();
        }
    }

    /// Run plain effects collected by the outermost trigger, in order.
    fn run_pending_effects() {
        loop {
            let next = PENDING_EFFECTS.with(|pending| pending.borrow_mut().shift_remove_index(0));
            let Some((id, effect)) = next else {
                break;
            };
            if let Err(err) = effect.run() {
                error!(effect = id.raw(), error = %err, "effect failed while re-running");
            }
        }
    }

    /// Remove an effect from every subscriber set it belongs to.
    ///
    /// Removed handles are dropped only after the map is released, since
    /// dropping an effect can drop memos that unsubscribe in turn.
    pub(crate) fn unsubscribe(effect: EffectId, dependencies: &[(TargetId, Rc<str>)]) {
        let mut removed = Vec::with_capacity(dependencies.len());
        // The maps may already be gone during thread teardown.
        let _ = DEPENDENCIES.try_with(|deps| {
            let Ok(mut deps) = deps.try_borrow_mut() else {
                return;
            };
            for (target, key) in dependencies {
                let Some(keys) = deps.get_mut(target) else {
                    continue;
                };
                if let Some(set) = keys.get_mut(key) {
                    removed.extend(set.shift_remove(&effect));
                    if set.is_empty() {
                        keys.remove(key);
                    }
                }
                if keys.is_empty() {
                    deps.remove(target);
                }
            }
        });
        let _ = PENDING_EFFECTS.try_with(|pending| {
            if let Ok(mut pending) = pending.try_borrow_mut() {
                removed.extend(pending.shift_remove(&effect));
            }
        });
        drop(removed);
    }

    /// Number of effects subscribed to `(target, key)`.
    pub fn subscriber_count(target: TargetId, key: &str) -> usize {
        DEPENDENCIES.with(|deps| {
            deps.borrow()
                .get(&target)
                .and_then(|keys| keys.get(key))
                .map_or(0, IndexMap::len)
        })
    }

    /// Check whether any subscriber set exists for `target`.
    pub fn has_dependents(target: TargetId) -> bool {
        DEPENDENCIES.with(|deps| deps.borrow().contains_key(&target))
    }

    /// Get the effect being tracked, if any.
    pub fn current_effect() -> Option<Effect> {
        ReactiveContext::current()
    }

    /// Check if we're inside a tracking context.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn trigger_without_track_is_noop() {
        let target = TargetId::new();
        Runtime::trigger(target, "value");
        assert!(!Runtime::has_dependents(target));
    }

    #[test]
    fn track_outside_effect_creates_no_entry() {
        let target = TargetId::new();
        Runtime::track(target, "value");
        assert_eq!(Runtime::subscriber_count(target, "value"), 0);
        assert!(!Runtime::has_dependents(target));
    }

    #[test]
    fn track_inside_effect_subscribes_once() {
        let target = TargetId::new();
        let effect = Effect::new(move || {
            Runtime::track(target, "a");
            Runtime::track(target, "a");
        });

        assert_eq!(Runtime::subscriber_count(target, "a"), 1);
        assert_eq!(effect.dependency_count(), 1);
    }

    #[test]
    fn trigger_reruns_plain_effect() {
        let target = TargetId::new();
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let _effect = Effect::new(move || {
            Runtime::track(target, "a");
            counter.set(counter.get() + 1);
        });

        Runtime::trigger(target, "a");
        Runtime::trigger(target, "b");
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn trigger_invokes_scheduler_instead_of_running() {
        let target = TargetId::new();
        let runs = Rc::new(Cell::new(0));
        let scheduled = Rc::new(Cell::new(0));

        let counter = Rc::clone(&runs);
        let hook = Rc::clone(&scheduled);
        let _effect = Effect::with_options(
            move || {
                Runtime::track(target, "a");
                counter.set(counter.get() + 1);
                Ok(())
            },
            crate::reactive::EffectOptions {
                lazy: false,
                scheduler: Some(Rc::new(move |_: &Effect| hook.set(hook.get() + 1))),
            },
        )
        .unwrap();

        Runtime::trigger(target, "a");
        assert_eq!(runs.get(), 1);
        assert_eq!(scheduled.get(), 1);
    }

    #[test]
    fn stopped_effect_is_unsubscribed() {
        let target = TargetId::new();
        let effect = Effect::new(move || Runtime::track(target, "a"));
        assert_eq!(Runtime::subscriber_count(target, "a"), 1);

        effect.stop();
        assert_eq!(Runtime::subscriber_count(target, "a"), 0);
        assert!(!Runtime::has_dependents(target));
    }
}
