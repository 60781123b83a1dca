// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Evaluation of a processor network.
//!
//! * [`NetworkEvaluator`] - one pass in dependency order, honouring readiness
//! * [`ProcessContext`] - what a processor sees during `process()`
//! * [`ThreadPool`] / [`PoolSlot`] - background work with non-blocking handles

pub(crate) mod context;
mod evaluator;
mod pool;
mod pool_slot;


pub use context::ProcessContext;
pub use evaluator::{EvaluatorOptions, NetworkEvaluator, PassReport, RunOutcome, RunSummary};
pub use pool::{JobContext, JobError, JobHandle, PoolOptions, Progress, ThreadPool};
pub use pool_slot::{PoolBatch, PoolPoll, PoolSlot, StalePolicy};
