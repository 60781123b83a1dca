// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for processor evaluation inside a pass.
//!
//! This module contains message types for logging events related to:
//! * `process()` calls that completed or left pool work pending
//! * Failures and panics caught by the evaluator
//! * Processors skipped because their inputs were not ready
//! * Calls that took longer than the configured threshold

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A processor completed and published its outputs.
///
/// # Log Level
/// `debug!` - Per-processor event
///
/// # Example
/// ```
/// use procnet::observability::messages::processor::ProcessorCompleted;
/// use std::time::Duration;
///
/// let msg = ProcessorCompleted {
///     processor_id: "scale",
///     duration: Duration::from_millis(3),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ProcessorCompleted<'a> {
    pub processor_id: &'a str,
    pub duration: Duration,
}

impl Display for ProcessorCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processor '{}' completed in {:?}", self.processor_id, self.duration)
    }
}

impl StructuredLog for ProcessorCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            processor_id = self.processor_id,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "processor_completed",
            span_name = name,
            processor_id = self.processor_id,
        )
    }
}

/// A processor is waiting on pool work.
///
/// # Log Level
/// `debug!` - Per-processor event
pub struct ProcessorPending<'a> {
    pub processor_id: &'a str,
    pub progress: f32,
}

impl Display for ProcessorPending<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' pending: {:.0}% done",
            self.processor_id,
            self.progress * 100.0
        )
    }
}

impl StructuredLog for ProcessorPending<'_> {
    fn log(&self) {
        tracing::debug!(
            processor_id = self.processor_id,
            progress = self.progress,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "processor_pending",
            span_name = name,
            processor_id = self.processor_id,
        )
    }
}

/// A processor returned an error or panicked and is now in the error state.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ProcessorFailed<'a> {
    pub processor_id: &'a str,
    pub error: &'a str,
}

impl Display for ProcessorFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processor '{}' failed: {}", self.processor_id, self.error)
    }
}

impl StructuredLog for ProcessorFailed<'_> {
    fn log(&self) {
        tracing::error!(
            processor_id = self.processor_id,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "processor_failed",
            span_name = name,
            processor_id = self.processor_id,
        )
    }
}

/// An invalid processor was not evaluated because it is not ready.
///
/// # Log Level
/// `trace!` - Expected for every processor downstream of pending work
pub struct ProcessorSkipped<'a> {
    pub processor_id: &'a str,
}

impl Display for ProcessorSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processor '{}' skipped: not ready", self.processor_id)
    }
}

impl StructuredLog for ProcessorSkipped<'_> {
    fn log(&self) {
        tracing::trace!(processor_id = self.processor_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "processor_skipped",
            span_name = name,
            processor_id = self.processor_id,
        )
    }
}

/// A `process()` call blocked the network thread for too long.
///
/// # Log Level
/// `warn!` - Work that belongs on the pool
pub struct SlowProcessor<'a> {
    pub processor_id: &'a str,
    pub duration: Duration,
    pub threshold: Duration,
}

impl Display for SlowProcessor<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' took {:?} on the network thread (threshold {:?})",
            self.processor_id, self.duration, self.threshold
        )
    }
}

impl StructuredLog for SlowProcessor<'_> {
    fn log(&self) {
        tracing::warn!(
            processor_id = self.processor_id,
            duration_ms = self.duration.as_millis() as u64,
            threshold_ms = self.threshold.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "slow_processor",
            span_name = name,
            processor_id = self.processor_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_shows_percentage() {
        let msg = ProcessorPending {
            processor_id: "pooled",
            progress: 0.5,
        };
        assert_eq!(msg.to_string(), "Processor 'pooled' pending: 50% done");
    }

    #[test]
    fn slow_processor_mentions_threshold() {
        let msg = SlowProcessor {
            processor_id: "heavy",
            duration: Duration::from_millis(400),
            threshold: Duration::from_millis(250),
        };
        let text = msg.to_string();
        assert!(text.contains("heavy"));
        assert!(text.contains("250ms"));
    }
}
