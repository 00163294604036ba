//! Job Scheduler
//!
//! The scheduler batches deferred work. Component update effects do not
//! re-render when their inputs change; their scheduler hook queues a job
//! here instead, and all queued jobs run together in one flush.
//!
//! # Algorithm
//!
//! 1. `queue_job` appends a job unless a job with the same identity is
//!    already waiting. Many writes in one synchronous burst therefore collapse
//!    into a single execution.
//! 2. The first job queued since the last flush requests a flush through the
//!    configured [`FlushMode`].
//! 3. `flush` runs jobs in first-queued order. Jobs queued while flushing run
//!    in the same flush. A failing job is reported and the flush continues.
//! 4. Once the queue is drained, every `next_tick` waiter is released.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use tokio::sync::oneshot;
use tracing::{debug, error, trace, warn};

use crate::config::{FlushMode, RuntimeConfig};
use crate::error::{Result, SchedulerError};
use crate::reactive::{next_id, Effect};

/// Identity of a job. Jobs built from an effect share the effect's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    pub fn new() -> Self {
        Self(next_id())
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// A deferred callback run during a flush.
#[derive(Clone)]
pub struct Job {
    id: JobId,
    run: Rc<dyn Fn() -> Result<()>>,
}

impl Job {
    /// Create a job with a fresh identity.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() -> Result<()> + 'static,
    {
        Self::with_id(JobId::new(), run)
    }

    /// Create a job with an explicit identity, for deduplication.
    pub fn with_id<F>(id: JobId, run: F) -> Self
    where
        F: Fn() -> Result<()> + 'static,
    {
        Self {
            id,
            run: Rc::new(run),
        }
    }

    /// A job that re-runs `effect`.
    pub fn from_effect(effect: &Effect) -> Self {
        let effect = effect.clone();
        Self::with_id(JobId::from_raw(effect.id().raw()), move || effect.run())
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn run(&self) -> Result<()> {
        (self.run)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("id", &self.id).finish()
    }
}

/// Outcome of one flush.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Jobs that ran to completion.
    pub executed: usize,

    /// Jobs that failed or were dropped, in the order it happened.
    pub failures: Vec<SchedulerError>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default)]
struct SchedulerState {
    config: RuntimeConfig,
    queue: VecDeque<Job>,
    queued: HashSet<JobId>,
    flush_requested: bool,
    flushing: bool,
    waiters: Vec<oneshot::Sender<()>>,
}

thread_local! {
    static SCHEDULER: RefCell<SchedulerState> = RefCell::new(SchedulerState::default());
}

/// Clears the flushing flag even if a job panics.
struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        let _ = SCHEDULER.try_with(|s| s.borrow_mut().flushing = false);
    }
}

/// Install the configuration for this thread.
pub fn configure(config: RuntimeConfig) {
    SCHEDULER.with(|s| s.borrow_mut().config = config);
}

/// The configuration in effect on this thread.
pub fn config() -> RuntimeConfig {
    SCHEDULER.with(|s| s.borrow().config.clone())
}

/// Queue a job unless one with the same identity is already waiting.
pub fn queue_job(job: Job) {
    let request = SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        if !s.queued.insert(job.id()) {
            trace!(job = job.id().raw(), "job already queued");
            return false;
        }
        trace!(job = job.id().raw(), "queue job");
        s.queue.push_back(job);
        claim_flush_request(&mut s)
    });

    if request {
        request_flush();
    }
}

/// Mark a flush as requested. Returns true if the caller must schedule it.
fn claim_flush_request(s: &mut SchedulerState) -> bool {
    if s.flush_requested || s.flushing {
        return false;
    }
    s.flush_requested = true;
    true
}

fn request_flush() {
    match config().flush_mode {
        FlushMode::Manual => trace!("flush requested; waiting for checkpoint"),
        FlushMode::SpawnLocal => {
            tokio::task::spawn_local(async {
                flush();
            });
        }
    }
}

/// Run every queued job.
///
/// A flush started while another flush is running on this thread returns an
/// empty report; the outer flush picks up the jobs.
pub fn flush() -> FlushReport {
    let limit = {
        let started = SCHEDULER.with(|s| {
            let mut s = s.borrow_mut();
            if s.flushing {
                return None;
            }
            s.flushing = true;
            s.flush_requested = false;
            Some(s.config.recursion_limit)
        });
        match started {
            Some(limit) => limit,
            None => return FlushReport::default(),
        }
    };

    let mut report = FlushReport::default();
    {
        let _guard = FlushGuard;
        let mut runs: HashMap<JobId, usize> = HashMap::new();

        while let Some(job) = next_job() {
            let id = job.id();
            let count = runs.entry(id).or_insert(0);
            *count += 1;
            if *count > limit {
                warn!(job = id.raw(), limit, "job exceeded recursion limit; dropped");
                report.failures.push(SchedulerError::RecursionLimit { job: id, limit });
                continue;
            }

            match job.run() {
                Ok(()) => report.executed += 1,
                Err(err) => {
                    error!(job = id.raw(), error = %err, "scheduled job failed");
                    report.failures.push(SchedulerError::JobFailed {
                        job: id,
                        source: Box::new(err),
                    });
                }
            }
        }
    }

    let waiters = SCHEDULER.with(|s| std::mem::take(&mut s.borrow_mut().waiters));
    for waiter in waiters {
        let _ = waiter.send(());
    }

    debug!(executed = report.executed, failed = report.failures.len(), "flush complete");
    report
}

fn next_job() -> Option<Job> {
    SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        let job = s.queue.pop_front()?;
        s.queued.remove(&job.id());
        Some(job)
    })
}

/// Flush if a flush was requested or someone awaits `next_tick`.
///
/// This is the checkpoint an embedder calls in [`FlushMode::Manual`].
pub fn flush_pending() -> Option<FlushReport> {
    let due = SCHEDULER.with(|s| {
        let s = s.borrow();
        !s.flushing && (s.flush_requested || !s.waiters.is_empty())
    });
    due.then(flush)
}

/// Resolves once the in-flight or next flush has completed.
///
/// With nothing queued, a flush is requested so the future still resolves.
pub fn next_tick() -> impl Future<Output = ()> {
    let (tx, rx) = oneshot::channel();
    let request = SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        s.waiters.push(tx);
        claim_flush_request(&mut s)
    });
    if request {
        request_flush();
    }

    async move {
        // A dropped sender means the thread's scheduler went away.
        let _ = rx.await;
    }
}

/// Number of jobs waiting for the next flush.
pub fn pending_jobs() -> usize {
    SCHEDULER.with(|s| s.borrow().queue.len())
}

/// Whether a flush has been requested and not yet started.
pub fn is_flush_pending() -> bool {
    SCHEDULER.with(|s| s.borrow().flush_requested)
}
