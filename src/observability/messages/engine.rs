// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for evaluation passes and the run loop.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// An evaluation pass is starting.
///
/// # Log Level
/// `debug!` - Emitted for every pass
///
/// # Example
/// ```
/// use procnet::observability::messages::engine::PassStarted;
///
/// let msg = PassStarted {
///     pass: 3,
///     processor_count: 5,
/// };
///
/// assert_eq!(msg.to_string(), "Evaluation pass 3 started: 5 processors");
/// ```
pub struct PassStarted {
    pub pass: u64,
    pub processor_count: usize,
}

impl Display for PassStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Evaluation pass {} started: {} processors",
            self.pass, self.processor_count
        )
    }
}

impl StructuredLog for PassStarted {
    fn log(&self) {
        tracing::debug!(
            pass = self.pass,
            processor_count = self.processor_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "evaluation_pass",
            span_name = name,
            pass = self.pass,
            processor_count = self.processor_count,
        )
    }
}

/// An evaluation pass finished.
///
/// # Log Level
/// `info!` when any processor ran or failed, `debug!` for an empty pass.
pub struct PassCompleted {
    pub pass: u64,
    pub completed: usize,
    pub pending: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl Display for PassCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Evaluation pass {} completed in {:?}: completed={}, pending={}, skipped={}, failed={}",
            self.pass, self.duration, self.completed, self.pending, self.skipped, self.failed
        )
    }
}

impl StructuredLog for PassCompleted {
    fn log(&self) {
        if self.completed + self.failed + self.pending == 0 {
            tracing::debug!(
                pass = self.pass,
                skipped = self.skipped,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        } else {
            tracing::info!(
                pass = self.pass,
                completed = self.completed,
                pending = self.pending,
                skipped = self.skipped,
                failed = self.failed,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "evaluation_pass_completed",
            span_name = name,
            pass = self.pass,
            duration = ?self.duration,
        )
    }
}

/// The run loop reached a state with nothing left to do.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunIdle {
    pub passes: u64,
    pub duration: Duration,
}

impl Display for RunIdle {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Network idle after {} passes in {:?}",
            self.passes, self.duration
        )
    }
}

impl StructuredLog for RunIdle {
    fn log(&self) {
        tracing::info!(
            passes = self.passes,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("run_idle", span_name = name, passes = self.passes)
    }
}

/// The run loop gave up before the network became idle.
///
/// # Log Level
/// `warn!` - Work may be left unfinished
///
/// # Example
/// ```
/// use procnet::observability::messages::engine::RunStopped;
///
/// let msg = RunStopped {
///     passes: 1000,
///     reason: "pass limit reached",
///     pending: 2,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct RunStopped<'a> {
    pub passes: u64,
    pub reason: &'a str,
    pub pending: usize,
}

impl Display for RunStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run stopped after {} passes ({}): {} processors still pending",
            self.passes, self.reason, self.pending
        )
    }
}

impl StructuredLog for RunStopped<'_> {
    fn log(&self) {
        tracing::warn!(
            passes = self.passes,
            reason = self.reason,
            pending = self.pending,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "run_stopped",
            span_name = name,
            passes = self.passes,
            reason = self.reason,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_completed_reports_every_bucket() {
        let msg = PassCompleted {
            pass: 2,
            completed: 3,
            pending: 1,
            skipped: 0,
            failed: 1,
            duration: Duration::from_millis(5),
        };
        let text = msg.to_string();
        assert!(text.contains("pass 2"));
        assert!(text.contains("completed=3"));
        assert!(text.contains("failed=1"));
    }

    #[test]
    fn run_stopped_mentions_reason() {
        let msg = RunStopped {
            passes: 10,
            reason: "idle timeout",
            pending: 1,
        };
        assert!(msg.to_string().contains("idle timeout"));
    }
}
