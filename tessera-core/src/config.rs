//! Runtime configuration.
//!
//! Configuration is per thread, since the runtime itself is per thread. It
//! is installed with [`scheduler::configure`](crate::scheduler::configure).

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How a batched flush gets scheduled after the first job of a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
    /// The embedder calls [`flush_pending`](crate::scheduler::flush_pending)
    /// at its own checkpoint (for example after dispatching an event).
    #[default]
    Manual,

    /// A flush task is spawned with `tokio::task::spawn_local`. Jobs must
    /// then be queued from inside a `tokio::task::LocalSet`.
    SpawnLocal,
}

/// Per-thread runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub flush_mode: FlushMode,

    /// Maximum number of times one job may run within a single flush.
    pub recursion_limit: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            flush_mode: FlushMode::Manual,
            recursion_limit: 100,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }
}
