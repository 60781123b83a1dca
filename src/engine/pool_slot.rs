// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-processor state machine for pooled work: `Idle -> Dispatched -> Ready`.
//!
//! A processor keeps one [`PoolSlot`] per kind of background computation and
//! drives it from `process()`:
//!
//! ```ignore
//! match self.slot.poll(ctx.revision()) {
//!     PoolPoll::Pending => return Ok(ProcessOutcome::Pending),
//!     PoolPoll::Ready(value) => {
//!         ctx.set_output("result", value)?;
//!         return Ok(ProcessOutcome::Complete);
//!     }
//!     PoolPoll::Failed(e) => return Err(e.into()),
//!     PoolPoll::Idle => {}
//! }
//! let input = *ctx.input::<f64>("input")?;
//! self.slot.dispatch(ctx, move |_job| Ok(input * 2.0));
//! Ok(ProcessOutcome::Pending)
//! ```
//!
//! Every dispatch records the processor revision it was started for. Polling
//! with a different revision drops whatever the job produced, so a result
//! computed from superseded inputs is never published. [`StalePolicy`]
//! decides whether the superseded job is cancelled or left to finish.
//!
//! [`PoolBatch`] is the same machine for a group of jobs dispatched together
//! whose results are only useful as a whole.

use super::context::ProcessContext;
use super::pool::{JobContext, JobError, JobHandle};
use crate::errors::PoolError;
use crate::observability::messages::pool::StaleResultDiscarded;
use crate::observability::messages::StructuredLog;

/// Result of polling a [`PoolSlot`] or [`PoolBatch`].
#[derive(Debug, PartialEq)]
pub enum PoolPoll<T> {
    /// Nothing in flight for the current revision; dispatch new work.
    Idle,
    Pending,
    Ready(T),
    Failed(PoolError),
}

/// What happens to a job whose revision has been superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Request a stop right away.
    #[default]
    Cancel,
    /// Let the job finish and throw its result away. For work that cannot
    /// stop half way or whose side effects must complete.
    RunToCompletion,
}

/// Jobs of one dispatch and the results collected from them so far.
#[derive(Debug)]
struct InFlight<T> {
    handles: Vec<JobHandle<T>>,
    results: Vec<Option<T>>,
    revision: u64,
}

impl<T> InFlight<T> {
    fn new(handles: Vec<JobHandle<T>>, revision: u64) -> Self {
        let results = handles.iter().map(|_| None).collect();
        Self {
            handles,
            results,
            revision,
        }
    }

    /// `None` while any job is still running. The first failure settles the
    /// whole dispatch.
    fn collect(&mut self) -> Option<Result<Vec<T>, PoolError>> {
        let mut running = false;
        for (handle, result) in self.handles.iter_mut().zip(self.results.iter_mut()) {
            if result.is_some() {
                continue;
            }
            match handle.try_take() {
                None => running = true,
                Some(Ok(value)) => *result = Some(value),
                Some(Err(e)) => return Some(Err(e)),
            }
        }
        if running {
            return None;
        }
        Some(Ok(self.results.iter_mut().filter_map(Option::take).collect()))
    }
}

/// Shared bookkeeping of [`PoolSlot`] and [`PoolBatch`].
#[derive(Debug)]
struct Dispatches<T> {
    active: Option<InFlight<T>>,
    /// Superseded jobs kept alive under [`StalePolicy::RunToCompletion`].
    retired: Vec<InFlight<T>>,
    policy: StalePolicy,
}

impl<T> Default for Dispatches<T> {
    fn default() -> Self {
        Self {
            active: None,
            retired: Vec::new(),
            policy: StalePolicy::default(),
        }
    }
}

impl<T: Send + 'static> Dispatches<T> {
    fn poll(&mut self, revision: u64) -> PoolPoll<Vec<T>> {
        self.retired.retain_mut(|job| job.collect().is_none());

        let Some(mut job) = self.active.take() else {
            return PoolPoll::Idle;
        };

        if job.revision != revision {
            StaleResultDiscarded {
                dispatched_revision: job.revision,
                current_revision: revision,
            }
            .log();
            self.retire(job);
            return PoolPoll::Idle;
        }

        match job.collect() {
            None => {
                self.active = Some(job);
                PoolPoll::Pending
            }
            Some(Ok(values)) => PoolPoll::Ready(values),
            Some(Err(e)) => PoolPoll::Failed(e),
        }
    }

    fn start(&mut self, handles: Vec<JobHandle<T>>, revision: u64) {
        if let Some(previous) = self.active.take() {
            self.retire(previous);
        }
        self.active = Some(InFlight::new(handles, revision));
    }

    fn retire(&mut self, job: InFlight<T>) {
        match self.policy {
            // Dropping the handles requests the stop.
            StalePolicy::Cancel => drop(job),
            StalePolicy::RunToCompletion => self.retired.push(job),
        }
    }

    fn cancel(&mut self) {
        self.active = None;
        self.retired.clear();
    }
}

#[derive(Debug)]
pub struct PoolSlot<T> {
    dispatches: Dispatches<T>,
}

impl<T> Default for PoolSlot<T> {
    fn default() -> Self {
        Self {
            dispatches: Dispatches::default(),
        }
    }
}

impl<T: Send + 'static> PoolSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: StalePolicy) -> Self {
        let mut slot = Self::new();
        slot.set_policy(policy);
        slot
    }

    /// Applies to jobs superseded from now on.
    pub fn set_policy(&mut self, policy: StalePolicy) {
        self.dispatches.policy = policy;
    }

    pub fn policy(&self) -> StalePolicy {
        self.dispatches.policy
    }

    pub fn poll(&mut self, revision: u64) -> PoolPoll<T> {
        match self.dispatches.poll(revision) {
            PoolPoll::Idle => PoolPoll::Idle,
            PoolPoll::Pending => PoolPoll::Pending,
            PoolPoll::Ready(mut values) => match values.pop() {
                Some(value) => PoolPoll::Ready(value),
                None => PoolPoll::Failed(PoolError::Disconnected),
            },
            PoolPoll::Failed(e) => PoolPoll::Failed(e),
        }
    }

    /// Start `work` for the context's current revision. Anything already in
    /// flight is superseded according to the slot's [`StalePolicy`].
    pub fn dispatch<F>(&mut self, ctx: &ProcessContext<'_>, work: F)
    where
        F: FnOnce(&JobContext) -> Result<T, JobError> + Send + 'static,
    {
        let handle = ctx.dispatch(work);
        self.dispatches.start(vec![handle], ctx.revision());
    }

    pub fn is_dispatched(&self) -> bool {
        self.dispatches.active.is_some()
    }

    /// Revision the in-flight job was started for.
    pub fn dispatched_revision(&self) -> Option<u64> {
        self.dispatches.active.as_ref().map(|job| job.revision)
    }

    /// Superseded jobs kept alive and not yet collected.
    pub fn superseded_jobs(&self) -> usize {
        self.dispatches.retired.len()
    }

    /// Stop everything, superseded jobs included.
    pub fn cancel(&mut self) {
        self.dispatches.cancel();
    }

    #[cfg(test)]
    pub(crate) fn from_handle(handle: JobHandle<T>, revision: u64) -> Self {
        let mut slot = Self::new();
        slot.dispatches.start(vec![handle], revision);
        slot
    }

    #[cfg(test)]
    pub(crate) fn replace_with(&mut self, handle: JobHandle<T>, revision: u64) {
        self.dispatches.start(vec![handle], revision);
    }
}

/// A group of jobs dispatched together. Ready once every job has delivered,
/// with the results in dispatch order.
#[derive(Debug)]
pub struct PoolBatch<T> {
    dispatches: Dispatches<T>,
}

impl<T> Default for PoolBatch<T> {
    fn default() -> Self {
        Self {
            dispatches: Dispatches::default(),
        }
    }
}

impl<T: Send + 'static> PoolBatch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_policy(&mut self, policy: StalePolicy) {
        self.dispatches.policy = policy;
    }

    pub fn poll(&mut self, revision: u64) -> PoolPoll<Vec<T>> {
        self.dispatches.poll(revision)
    }

    /// Start one job per entry of `works`. Progress is the mean over the
    /// batch.
    pub fn dispatch_many<F>(&mut self, ctx: &ProcessContext<'_>, works: Vec<F>)
    where
        F: FnOnce(&JobContext) -> Result<T, JobError> + Send + 'static,
    {
        let handles = ctx.dispatch_many(works);
        self.dispatches.start(handles, ctx.revision());
    }

    pub fn is_dispatched(&self) -> bool {
        self.dispatches.active.is_some()
    }

    pub fn cancel(&mut self) {
        self.dispatches.cancel();
    }

    #[cfg(test)]
    pub(crate) fn from_handles(handles: Vec<JobHandle<T>>, revision: u64) -> Self {
        let mut batch = Self::new();
        batch.dispatches.start(handles, revision);
        batch
    }
}
