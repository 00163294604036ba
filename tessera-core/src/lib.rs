//! Tessera Core
//!
//! This crate provides the core runtime for the Tessera reactive UI framework.
//! It implements:
//!
//! - Reactive primitives (reactive objects, signals, memos, effects)
//! - A batching job scheduler
//! - A virtual node model
//! - Components with setup state and scheduled re-rendering
//! - A renderer that diffs vnode trees and commits minimal host mutations
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Dependency tracking, reactive objects, signals, memos, effects
//! - `scheduler`: Deduplicating job queue flushed once per burst
//! - `vnode`: Virtual nodes, `h`, normalization, list rendering
//! - `component`: Component definitions and instances
//! - `renderer`: Reconciliation, the host trait, and an in-memory host
//! - `config`: Per-thread runtime settings
//!
//! Everything runs on one thread. State lives in thread-locals, so each thread
//! that renders has its own independent runtime.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use tessera_core::{h, props, ComponentDef, MemoryHost, Renderer, Signal, Value};
//!
//! let count = Signal::new(Value::from(0));
//! let counter = ComponentDef::new("Counter")
//!     .render({
//!         let count = count.clone();
//!         move |_| Ok(h("p", props! {}, count.get()).into())
//!     })
//!     .build();
//!
//! let host = Rc::new(MemoryHost::new());
//! let root = host.create_root();
//! let renderer = Renderer::new(host.clone());
//! renderer.render(Some(h(&counter, props! {}, ())), root)?;
//!
//! count.set(Value::from(1));
//! tessera_core::scheduler::flush_pending();
//! assert_eq!(host.text(root), "1");
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod reactive;
pub mod renderer;
pub mod scheduler;
pub mod vnode;

pub use component::{ComponentDef, Instance, RenderContext, SetupContext, State, TemplateCompiler};
pub use config::{FlushMode, RuntimeConfig};
pub use error::{Error, ReactiveError, RenderError, Result, SchedulerError};
pub use reactive::{reactive, untracked, Effect, Memo, Object, Reactive, Signal, Value};
pub use renderer::{Host, HostOp, MemoryHost, NodeHandle, OpLog, Renderer};
pub use scheduler::{next_tick, queue_job, Job};
pub use vnode::{h, normalize, render_list, Fragment, Key, Props, Renderable, Text, VNode};
