//! Reactive Primitives
//!
//! This module implements the reactive system: reactive objects, signals,
//! memos, and effects.
//!
//! # Concepts
//!
//! ## Reactive objects
//!
//! A [`Reactive`] wraps a raw [`Object`] so that every field read inside a
//! running effect is tracked, and every field write that changes the value
//! notifies the effects that read it.
//!
//! ## Signals
//!
//! A [`Signal`] is a boxed value: one tracked field named `value`.
//!
//! ## Memos
//!
//! A [`Memo`] is a derived value that caches its result and recomputes lazily,
//! on the first read after one of its inputs changed.
//!
//! ## Effects
//!
//! An [`Effect`] is a computation that re-runs whenever its dependencies
//! change, either synchronously or through a scheduler hook. Component
//! updates are effects whose hook enqueues a job on the
//! [`scheduler`](crate::scheduler).
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local stack of running effects to detect
//! dependencies automatically. When a field is read, the effect on top of the
//! stack is subscribed to it.

mod context;
mod effect;
mod memo;
mod object;
mod runtime;
mod signal;
mod subscriber;
mod value;

pub use context::{untracked, ReactiveContext};
pub use effect::{Effect, EffectOptions, EffectScheduler};
pub use memo::Memo;
pub use object::{reactive, to_raw, to_reactive, Object, Reactive};
pub use runtime::Runtime;
pub use signal::Signal;
pub use subscriber::{EffectId, TargetId};
pub use value::{Handler, ReactiveValue, Value};

pub(crate) use subscriber::next_id;
