// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::context::{EvaluationEnv, ProcessContext};
use super::pool::{PoolOptions, ThreadPool};
use crate::config::consts::{
    DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_MAX_PASSES, DEFAULT_SLOW_PROCESSOR_WARN_MS,
};
use crate::errors::{panic_message, NetworkError, PoolError, ProcessingError};
use crate::network::{PortData, ProcessorId, ProcessorNetwork, ProcessorSlot};
use crate::observability::messages::engine::{PassCompleted, PassStarted, RunIdle, RunStopped};
use crate::observability::messages::processor::{
    ProcessorCompleted, ProcessorFailed, ProcessorPending, ProcessorSkipped, SlowProcessor,
};
use crate::observability::messages::StructuredLog;
use crate::services::Services;
use crate::traits::ProcessOutcome;

/// Tuning of the evaluation loop.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorOptions {
    /// How long [`NetworkEvaluator::run_until_idle`] waits for a pool job.
    pub idle_timeout: Duration,
    pub max_passes: u64,
    /// `process()` calls slower than this are logged.
    pub slow_processor_warn: Duration,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS),
            max_passes: DEFAULT_MAX_PASSES,
            slow_processor_warn: Duration::from_millis(DEFAULT_SLOW_PROCESSOR_WARN_MS),
        }
    }
}

/// What one evaluation pass did, by processor identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub completed: Vec<String>,
    /// Processors waiting on pool work.
    pub pending: Vec<String>,
    /// Invalid processors that were not ready.
    pub skipped: Vec<String>,
    /// Processors that returned an error or panicked, with the message.
    pub failed: Vec<(String, String)>,
    /// Queued commands the network refused at the start of the pass.
    pub rejected_commands: Vec<NetworkError>,
    pub duration: Duration,
}

impl PassReport {
    /// Whether the pass invoked no processor at all.
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.pending.is_empty() && self.failed.is_empty()
    }
}

/// Why [`NetworkEvaluator::run_until_idle`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing pending and no queued commands.
    Idle,
    /// A pool job did not finish within the idle timeout.
    TimedOut,
    PassLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub passes: u64,
    /// Completed `process()` calls over all passes.
    pub completed: usize,
    pub failed: Vec<(String, String)>,
    pub duration: Duration,
}

/// Evaluates a [`ProcessorNetwork`] one pass at a time.
///
/// A pass walks the network in stable topological order and calls
/// `process()` on every processor that is invalid, not in error, and ready.
/// Each call runs inside a failure boundary: an `Err` or a panic puts that
/// processor into the error state and the pass moves on, so independent
/// branches keep working.
///
/// The evaluator owns the background [`ThreadPool`] and the [`Services`]
/// handed to processors; the network stays with the caller.
///
/// # Examples
///
/// ```
/// use procnet::backends::local::processors::{ConstantSource, Scale};
/// use procnet::engine::NetworkEvaluator;
/// use procnet::network::ProcessorNetwork;
///
/// let mut network = ProcessorNetwork::new();
/// network.add_processor("source", Box::new(ConstantSource::new(2.0))).unwrap();
/// network.add_processor("double", Box::new(Scale::new(2.0))).unwrap();
/// network.add_connection("source.value", "double.input").unwrap();
///
/// let mut evaluator = NetworkEvaluator::with_defaults().unwrap();
/// let report = evaluator.evaluate(&mut network);
///
/// assert_eq!(report.completed, vec!["source", "double"]);
/// assert_eq!(*network.outport_data::<f64>("double.output").unwrap(), 4.0);
/// assert!(evaluator.evaluate(&mut network).is_empty());
/// ```
pub struct NetworkEvaluator {
    pool: ThreadPool,
    services: Arc<Services>,
    options: EvaluatorOptions,
    passes: u64,
}

impl NetworkEvaluator {
    pub fn new(pool: ThreadPool, services: Arc<Services>, options: EvaluatorOptions) -> Self {
        Self {
            pool,
            services,
            options,
            passes: 0,
        }
    }

    /// Default pool, fresh services, default options.
    pub fn with_defaults() -> Result<Self, PoolError> {
        let pool = ThreadPool::new(&PoolOptions::default())?;
        Ok(Self::new(
            pool,
            Arc::new(Services::init()),
            EvaluatorOptions::default(),
        ))
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    /// Passes performed since construction.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Perform exactly one evaluation pass.
    pub fn evaluate(&mut self, network: &mut ProcessorNetwork) -> PassReport {
        let start = Instant::now();
        self.passes += 1;

        let mut report = PassReport {
            rejected_commands: network.apply_pending_commands(),
            ..PassReport::default()
        };
        network.clear_evaluation_request();
        let order = network.topological_order().to_vec();

        let started = PassStarted {
            pass: self.passes,
            processor_count: order.len(),
        };
        let span = started.span("evaluate");
        let _entered = span.enter();
        started.log();

        let env = EvaluationEnv {
            pool: &self.pool,
            services: self.services.as_ref(),
            handle: network.handle(),
        };

        for id in order {
            let Some(slot) = network.slot(id) else {
                continue;
            };
            if slot.is_valid() || slot.error.is_some() {
                continue;
            }
            let identifier = slot.identifier.clone();
            if !network.is_ready(id) {
                ProcessorSkipped {
                    processor_id: &identifier,
                }
                .log();
                report.skipped.push(identifier);
                continue;
            }

            let call_start = Instant::now();
            let Some((result, staged)) = invoke(network, id, &env) else {
                continue;
            };
            let elapsed = call_start.elapsed();
            if elapsed > self.options.slow_processor_warn {
                SlowProcessor {
                    processor_id: &identifier,
                    duration: elapsed,
                    threshold: self.options.slow_processor_warn,
                }
                .log();
            }

            match result {
                Ok(ProcessOutcome::Complete) => {
                    network.complete_processor(id, staged);
                    ProcessorCompleted {
                        processor_id: &identifier,
                        duration: elapsed,
                    }
                    .log();
                    report.completed.push(identifier);
                }
                Ok(ProcessOutcome::Pending) => {
                    ProcessorPending {
                        processor_id: &identifier,
                        progress: network.progress(id).unwrap_or(0.0),
                    }
                    .log();
                    report.pending.push(identifier);
                }
                Err(error) => {
                    let message = error.to_string();
                    ProcessorFailed {
                        processor_id: &identifier,
                        error: &message,
                    }
                    .log();
                    network.fail_processor(id, message.clone());
                    report.failed.push((identifier, message));
                }
            }
        }

        report.duration = start.elapsed();
        PassCompleted {
            pass: self.passes,
            completed: report.completed.len(),
            pending: report.pending.len(),
            skipped: report.skipped.len(),
            failed: report.failed.len(),
            duration: report.duration,
        }
        .log();
        report
    }

    /// Evaluate until nothing is pending and no command is queued.
    ///
    /// Between passes this blocks only while pool work is outstanding,
    /// waiting for the job's wake-up command for at most the idle timeout.
    pub fn run_until_idle(&mut self, network: &mut ProcessorNetwork) -> RunSummary {
        let start = Instant::now();
        let mut passes = 0;
        let mut completed = 0;
        let mut failed = Vec::new();
        let mut pending = 0;

        let outcome = loop {
            if passes >= self.options.max_passes {
                break RunOutcome::PassLimit;
            }
            let report = self.evaluate(network);
            passes += 1;
            completed += report.completed.len();
            pending = report.pending.len();
            failed.extend(report.failed);

            if pending == 0 {
                if network.has_pending_commands() {
                    continue;
                }
                break RunOutcome::Idle;
            }
            if !network.wait_for_commands(self.options.idle_timeout) {
                break RunOutcome::TimedOut;
            }
        };

        let duration = start.elapsed();
        match outcome {
            RunOutcome::Idle => RunIdle { passes, duration }.log(),
            RunOutcome::TimedOut => RunStopped {
                passes,
                reason: "idle timeout",
                pending,
            }
            .log(),
            RunOutcome::PassLimit => RunStopped {
                passes,
                reason: "pass limit reached",
                pending,
            }
            .log(),
        }

        RunSummary {
            outcome,
            passes,
            completed,
            failed,
            duration,
        }
    }

    /// Cancel outstanding pool work and wait up to `timeout` for it.
    pub fn shutdown(self, timeout: Duration) {
        self.services.teardown();
        self.pool.shutdown(timeout);
    }
}

impl std::fmt::Debug for NetworkEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkEvaluator")
            .field("pool", &self.pool)
            .field("options", &self.options)
            .field("passes", &self.passes)
            .finish()
    }
}

type Invocation = (
    Result<ProcessOutcome, ProcessingError>,
    Vec<Option<PortData>>,
);

/// Call `process()` on one processor. A panic becomes
/// [`ProcessingError::Panicked`].
fn invoke(network: &mut ProcessorNetwork, id: ProcessorId, env: &EvaluationEnv<'_>) -> Option<Invocation> {
    let inputs = network.input_snapshot(id);
    let ProcessorSlot {
        identifier,
        processor,
        outports,
        properties,
        revision,
        progress,
        ..
    } = network.slot_mut(id)?;

    let mut ctx = ProcessContext::new(
        id,
        identifier.as_str(),
        &inputs,
        outports.as_slice(),
        properties.as_slice(),
        *revision,
        progress,
        env,
    );
    let result = panic::catch_unwind(AssertUnwindSafe(|| processor.process(&mut ctx)))
        .unwrap_or_else(|payload| Err(ProcessingError::Panicked(panic_message(payload.as_ref()))));
    Some((result, ctx.into_staged()))
}
