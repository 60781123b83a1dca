// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::{PoolPoll, PoolSlot, ProcessContext, StalePolicy};
use crate::errors::{PoolError, ProcessingError};
use crate::network::{PortDescriptor, Property};
use crate::traits::{ProcessOutcome, Processor};
use std::time::Duration;

const STEPS: u32 = 10;

/// `input * factor`, computed on the background pool after `delay_ms`.
///
/// Stands in for any expensive computation: the network thread never waits
/// for it, progress is reported in ten steps, and a change to the input or to
/// a property while the job runs discards the stale result and starts over.
/// With `finish_stale` set the superseded job is left to run out instead of
/// being cancelled; its result is still dropped.
pub struct PooledScale {
    initial_factor: f64,
    initial_delay_ms: i64,
    job: PoolSlot<f64>,
}

impl PooledScale {
    pub fn new(factor: f64, delay: Duration) -> Self {
        Self {
            initial_factor: factor,
            initial_delay_ms: i64::try_from(delay.as_millis()).unwrap_or(i64::MAX),
            job: PoolSlot::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.job.is_dispatched()
    }

    /// Superseded jobs left running under `finish_stale`.
    pub fn superseded_jobs(&self) -> usize {
        self.job.superseded_jobs()
    }
}

impl Default for PooledScale {
    fn default() -> Self {
        Self::new(1.0, Duration::ZERO)
    }
}

impl Processor for PooledScale {
    fn class_identifier(&self) -> &'static str {
        "pooled_scale"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::inport::<f64>("input"),
            PortDescriptor::outport::<f64>("output"),
        ]
    }

    fn properties(&self) -> Vec<Property> {
        vec![
            Property::new("factor", self.initial_factor),
            Property::new("delay_ms", self.initial_delay_ms),
            Property::new("finish_stale", false),
        ]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        self.job.set_policy(if ctx.property_bool("finish_stale")? {
            StalePolicy::RunToCompletion
        } else {
            StalePolicy::Cancel
        });

        match self.job.poll(ctx.revision()) {
            PoolPoll::Pending => return Ok(ProcessOutcome::Pending),
            PoolPoll::Ready(value) => {
                ctx.set_output("output", value)?;
                return Ok(ProcessOutcome::Complete);
            }
            PoolPoll::Failed(e) => return Err(e.into()),
            PoolPoll::Idle => {}
        }

        let value = *ctx.input::<f64>("input")?;
        let factor = ctx.property_float("factor")?;
        let delay_ms = u64::try_from(ctx.property_int("delay_ms")?).unwrap_or(0);
        let step = Duration::from_millis(delay_ms) / STEPS;

        self.job.dispatch(ctx, move |job| {
            for done in 1..=STEPS {
                if job.stop_requested() {
                    return Err(PoolError::Cancelled.into());
                }
                std::thread::sleep(step);
                job.report_steps(done as usize, STEPS as usize);
            }
            Ok(value * factor)
        });
        Ok(ProcessOutcome::Pending)
    }
}
