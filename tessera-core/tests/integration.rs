//! Integration Tests for Reactive System
//!
//! These tests verify that reactive objects, signals, memos, and effects work
//! together correctly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tessera_core::reactive::{
    reactive, untracked, Effect, Memo, Object, Reactive, ReactiveContext, Runtime, Signal, Value,
};
use tessera_core::ReactiveError;

/// Test that a memo tracks signal dependencies.
#[test]
fn memo_tracks_signal_dependency() {
    let signal = Signal::new(10);

    let signal_clone = signal.clone();
    let memo = Memo::new(move || signal_clone.get() * 2);

    // First access computes the value
    assert_eq!(memo.get(), 20);

    // Writing the signal only marks the memo dirty
    signal.set(5);
    assert!(memo.is_dirty());
    assert_eq!(memo.get(), 10);
}

/// Test that an effect re-runs once per real change of a signal.
#[test]
fn effect_reruns_only_on_real_change() {
    let signal = Signal::new(1);
    let observed = Rc::new(RefCell::new(Vec::new()));

    let _effect = Effect::new({
        let (signal, observed) = (signal.clone(), Rc::clone(&observed));
        move || observed.borrow_mut().push(signal.get())
    });
    assert_eq!(*observed.borrow(), vec![1]);

    signal.set(1);
    assert_eq!(*observed.borrow(), vec![1]);

    signal.set(2);
    assert_eq!(*observed.borrow(), vec![1, 2]);
}

/// Test that NaN written over NaN is not a change.
#[test]
fn nan_write_does_not_notify() {
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

/// Test that memos cache values correctly.
#[test]
fn memo_caches_expensive_computation() {
    let compute_count = Rc::new(Cell::new(0));
    let counter = Rc::clone(&compute_count);

    let memo = Memo::new(move || {
        counter.set(counter.get() + 1);
        42
    });

    // Nothing is computed until the first read
    assert_eq!(compute_count.get(), 0);

    assert_eq!(memo.get(), 42);
    assert_eq!(memo.get(), 42);
    assert_eq!(memo.get(), 42);
    assert_eq!(compute_count.get(), 1);
}

/// Test that memos can depend on other memos.
#[test]
fn memo_depends_on_memo() {
    let base = Signal::new(5);

    let doubled = Memo::new({
        let base = base.clone();
        move || base.get() * 2
    });
    let plus_ten = Memo::new({
        let doubled = doubled.clone();
        move || doubled.get() + 10
    });

    assert_eq!(doubled.get(), 10);
    assert_eq!(plus_ten.get(), 20);

    base.set(10);
    assert!(doubled.is_dirty());
    assert!(plus_ten.is_dirty());

    assert_eq!(plus_ten.get(), 30);
    assert_eq!(doubled.get(), 20);
}

/// Test that a diamond runs the downstream effect once per write, with
/// consistent inputs.
#[test]
fn diamond_is_glitch_free() {
    let base = Signal::new(1);
    let left = Memo::new({
        let base = base.clone();
        move || base.get() + 1
    });
    let right = Memo::new({
        let base = base.clone();
        move || base.get() * 10
    });

    let seen = Rc::new(RefCell::new(Vec::new()));
    let _effect = Effect::new({
        let (left, right, seen) = (left.clone(), right.clone(), Rc::clone(&seen));
        move || seen.borrow_mut().push((left.get(), right.get()))
    });

    base.set(2);
    assert_eq!(*seen.borrow(), vec![(2, 10), (3, 20)]);
}

/// Test that writing a getter-only memo is rejected without effect.
#[test]
fn readonly_memo_rejects_writes() {
    let memo = Memo::new(|| 1);
    let err = memo.set(2).unwrap_err();
    assert!(matches!(err, ReactiveError::ReadonlyMemo(_)));
    assert_eq!(memo.get(), 1);
}

/// Test that a memo with a setter forwards writes.
#[test]
fn writable_memo_forwards_to_setter() {
    let celsius = Signal::new(0.0);
    let fahrenheit = Memo::with_setter(
        {
            let celsius = celsius.clone();
            move || celsius.get() * 9.0 / 5.0 + 32.0
        },
        {
            let celsius = celsius.clone();
            move |f: f64| celsius.set((f - 32.0) * 5.0 / 9.0)
        },
    );

    assert_eq!(fahrenheit.get(), 32.0);
    fahrenheit.set(212.0).unwrap();
    assert_eq!(celsius.get_untracked(), 100.0);
    assert_eq!(fahrenheit.get(), 212.0);
}

/// Test that stopped effects do not run.
#[test]
fn stopped_effect_does_not_run() {
    let signal = Signal::new(0);
    let run_count = Rc::new(Cell::new(0));

    let effect = Effect::new({
        let (signal, counter) = (signal.clone(), Rc::clone(&run_count));
        move || {
            signal.get();
            counter.set(counter.get() + 1);
        }
    });
    assert_eq!(run_count.get(), 1);

    effect.stop();
    signal.set(1);
    signal.set(2);
    signal.set(3);

    assert_eq!(run_count.get(), 1);
    assert_eq!(signal.subscriber_count(), 0);
}

/// Test that nested effects restore the outer effect on exit, so reads after
/// the inner run still subscribe the outer one.
#[test]
fn nested_reactive_contexts() {
    let inner_signal = Signal::new(0);
    let outer_signal = Signal::new(0);
    let outer_runs = Rc::new(Cell::new(0));
    let inner_effects = Rc::new(RefCell::new(Vec::new()));

    let outer = Effect::new({
        let (inner_signal, outer_signal) = (inner_signal.clone(), outer_signal.clone());
        let (outer_runs, inner_effects) = (Rc::clone(&outer_runs), Rc::clone(&inner_effects));
        move || {
            outer_runs.set(outer_runs.get() + 1);
            let inner_signal = inner_signal.clone();
            let inner = Effect::new(move || {
                inner_signal.get();
            });
            assert_eq!(ReactiveContext::depth(), 1);
            inner_effects.borrow_mut().push(inner);
            outer_signal.get();
        }
    });

    assert_eq!(outer.dependency_count(), 1);
    assert_eq!(outer_signal.subscriber_count(), 1);
    assert_eq!(inner_signal.subscriber_count(), 1);

    // The inner write re-runs only the inner effect
    inner_signal.set(1);
    assert_eq!(outer_runs.get(), 1);

    outer_signal.set(1);
    assert_eq!(outer_runs.get(), 2);
}

/// Test that reactive objects keep one wrapper per object and wrap nested
/// objects lazily.
#[test]
fn reactive_object_identity_and_nesting() {
    let inner: Object = [("n", Value::from(1))].into_iter().collect();
    let outer: Object = [("child", Value::Object(inner.clone()))].into_iter().collect();

    let first = reactive(&outer);
    let second = reactive(&outer);
    assert!(first.ptr_eq(&second));

    // Nested objects stay raw until read through the wrapper
    assert!(matches!(outer.get_raw("child"), Some(Value::Object(_))));
    let child = match first.get("child") {
        Value::Reactive(child) => child,
        other => panic!("expected a wrapped child, got {other:?}"),
    };
    assert!(child.ptr_eq(&reactive(&inner)));
}

/// Test that only fields read under tracking are observed.
#[test]
fn reactive_fields_are_tracked_individually() {
    let state = Reactive::from_fields([("a", Value::from(1)), ("b", Value::from(2))]);
    let runs = Rc::new(Cell::new(0));

    let _effect = Effect::new({
        let (state, runs) = (state.clone(), Rc::clone(&runs));
        move || {
            state.get("a");
            untracked(|| state.get("b"));
            runs.set(runs.get() + 1);
        }
    });

    state.set("b", 3);
    assert_eq!(runs.get(), 1);
    assert!(Runtime::has_dependents(state.id()));

    state.set("a", 5);
    assert_eq!(runs.get(), 2);
}

/// Test the complete reactive chain: object -> memo -> effect.
#[test]
fn full_reactive_chain_with_runtime() {
    let todos = Reactive::from_fields([("done", Value::from(0)), ("total", Value::from(3))]);

    let remaining = Memo::new({
        let todos = todos.clone();
        move || {
            let total = todos.get("total").as_f64().unwrap_or_default();
            let done = todos.get("done").as_f64().unwrap_or_default();
            total - done
        }
    });

    let log = Rc::new(RefCell::new(Vec::new()));
    let _effect = Effect::new({
        let (remaining, log) = (remaining.clone(), Rc::clone(&log));
        move || log.borrow_mut().push(remaining.get())
    });

    todos.set("done", 1);
    todos.set("done", 1);
    todos.set("total", 4);

    assert_eq!(*log.borrow(), vec![3.0, 2.0, 3.0]);
    assert_eq!(remaining.dependent_count(), 1);
}
