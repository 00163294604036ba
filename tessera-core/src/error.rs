//! Error types for the runtime.
//!
//! Each subsystem has its own error enum; [`Error`] unifies them so that
//! component setup and render steps can use `?` across subsystem boundaries.

use thiserror::Error;

use crate::scheduler::JobId;

/// Errors raised by the reactive primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A write was attempted on a memo that has no setter.
    #[error("memo {0} is read-only: no setter was supplied")]
    ReadonlyMemo(u64),
}

/// Errors reported by the job scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job returned an error while being flushed.
    #[error("job {job:?} failed: {source}")]
    JobFailed {
        job: JobId,
        #[source]
        source: Box<Error>,
    },

    /// A job kept re-queueing itself during a single flush.
    #[error("job {job:?} exceeded the recursion limit of {limit} runs in one flush")]
    RecursionLimit { job: JobId, limit: usize },
}

/// Errors raised while mounting or updating components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The component has neither a render step nor a template.
    #[error("component `{0}` has no render function or template")]
    MissingRender(String),

    /// The component uses a template but no compiler is registered.
    #[error("component `{0}` uses a template but no template compiler is registered")]
    MissingCompiler(String),

    /// The template compiler rejected the template.
    #[error("failed to compile template of `{component}`: {message}")]
    Compile { component: String, message: String },

    /// A setup step failed.
    #[error("setup of `{component}` failed: {message}")]
    Setup { component: String, message: String },

    /// A render step failed.
    #[error("render of `{component}` failed: {message}")]
    Render { component: String, message: String },

    /// A host handle expected on a mounted node was missing.
    #[error("vnode has no host node attached")]
    UnmountedNode,
}

/// The crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Reactive(#[from] ReactiveError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to encode op log: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode op log: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
