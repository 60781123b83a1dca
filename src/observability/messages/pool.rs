// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the background thread pool.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// The pool runtime started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PoolStarted<'a> {
    pub thread_name: &'a str,
    pub worker_threads: usize,
    pub max_blocking_threads: usize,
}

impl Display for PoolStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Thread pool '{}' started: worker_threads={}, max_blocking_threads={}",
            self.thread_name, self.worker_threads, self.max_blocking_threads
        )
    }
}

impl StructuredLog for PoolStarted<'_> {
    fn log(&self) {
        tracing::info!(
            thread_name = self.thread_name,
            worker_threads = self.worker_threads,
            max_blocking_threads = self.max_blocking_threads,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pool",
            span_name = name,
            thread_name = self.thread_name,
            worker_threads = self.worker_threads,
        )
    }
}

/// The pool is shutting down; outstanding jobs have been cancelled.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PoolShutdown<'a> {
    pub thread_name: &'a str,
    pub outstanding: usize,
}

impl Display for PoolShutdown<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Thread pool '{}' shutting down with {} outstanding jobs",
            self.thread_name, self.outstanding
        )
    }
}

impl StructuredLog for PoolShutdown<'_> {
    fn log(&self) {
        tracing::info!(
            thread_name = self.thread_name,
            outstanding = self.outstanding,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("pool_shutdown", span_name = name, thread_name = self.thread_name)
    }
}

/// A processor handed work to the pool.
///
/// # Log Level
/// `debug!` - Per-job event
///
/// # Example
/// ```
/// use procnet::observability::messages::pool::JobDispatched;
///
/// let msg = JobDispatched {
///     processor_id: "pooled_scale",
///     revision: 4,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct JobDispatched<'a> {
    pub processor_id: &'a str,
    pub revision: u64,
}

impl Display for JobDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' dispatched pool job for revision {}",
            self.processor_id, self.revision
        )
    }
}

impl StructuredLog for JobDispatched<'_> {
    fn log(&self) {
        tracing::debug!(
            processor_id = self.processor_id,
            revision = self.revision,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "pool_job",
            span_name = name,
            processor_id = self.processor_id,
            revision = self.revision,
        )
    }
}

/// A pool job panicked. The pool thread survives.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct JobPanicked<'a> {
    pub message: &'a str,
}

impl Display for JobPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Pool job panicked: {}", self.message)
    }
}

impl StructuredLog for JobPanicked<'_> {
    fn log(&self) {
        tracing::error!(panic = self.message, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("job_panicked", span_name = name)
    }
}

/// A job started for an older revision was cancelled and its result dropped.
///
/// # Log Level
/// `debug!` - Expected whenever inputs change while work is in flight
pub struct StaleResultDiscarded {
    pub dispatched_revision: u64,
    pub current_revision: u64,
}

impl Display for StaleResultDiscarded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Discarded pool job for revision {} (current revision {})",
            self.dispatched_revision, self.current_revision
        )
    }
}

impl StructuredLog for StaleResultDiscarded {
    fn log(&self) {
        tracing::debug!(
            dispatched_revision = self.dispatched_revision,
            current_revision = self.current_revision,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stale_result",
            span_name = name,
            dispatched_revision = self.dispatched_revision,
        )
    }
}
