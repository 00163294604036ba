//! Components
//!
//! A [`ComponentDef`] declares props, an optional one-time setup step and a
//! render step (or a template compiled on first use). Mounting a component
//! node creates an [`Instance`] that owns the reactive props, the setup
//! state, the committed subtree and the update effect that re-renders it.
//!
//! # Props and attrs
//!
//! Incoming node props named in the definition become reactive props; the
//! rest are attrs. Attrs fall through onto the root node of every render,
//! overriding props of the same name.

mod context;
mod definition;
mod instance;

pub use context::{RenderContext, SetupContext, State};
pub use definition::{ComponentDef, RenderFn, SetupFn, TemplateCompiler};
pub use instance::Instance;
