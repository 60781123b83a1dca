// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::{JobContext, JobError, PoolBatch, PoolPoll, ProcessContext};
use crate::errors::{PoolError, ProcessingError};
use crate::network::{PortDescriptor, Property};
use crate::traits::{ProcessOutcome, Processor};
use std::time::Duration;

/// Sum over a multi inport with one pool job per connection.
///
/// Each job waits `delay_ms` before handing back its term, so the visible
/// progress is the share of terms already in. Nothing is published until
/// every job of the batch has delivered.
pub struct PooledSum {
    initial_delay_ms: i64,
    batch: PoolBatch<f64>,
}

impl PooledSum {
    pub fn new(delay: Duration) -> Self {
        Self {
            initial_delay_ms: i64::try_from(delay.as_millis()).unwrap_or(i64::MAX),
            batch: PoolBatch::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.batch.is_dispatched()
    }
}

impl Default for PooledSum {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Processor for PooledSum {
    fn class_identifier(&self) -> &'static str {
        "pooled_sum"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::inport::<f64>("values").multi(None).optional(),
            PortDescriptor::outport::<f64>("total"),
        ]
    }

    fn properties(&self) -> Vec<Property> {
        vec![Property::new("delay_ms", self.initial_delay_ms)]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        match self.batch.poll(ctx.revision()) {
            PoolPoll::Pending => return Ok(ProcessOutcome::Pending),
            PoolPoll::Ready(terms) => {
                ctx.set_output("total", terms.iter().sum::<f64>())?;
                return Ok(ProcessOutcome::Complete);
            }
            PoolPoll::Failed(e) => return Err(e.into()),
            PoolPoll::Idle => {}
        }

        let terms = ctx.inputs::<f64>("values")?;
        if terms.is_empty() {
            ctx.set_output("total", 0.0)?;
            return Ok(ProcessOutcome::Complete);
        }

        let delay_ms = u64::try_from(ctx.property_int("delay_ms")?).unwrap_or(0);
        let delay = Duration::from_millis(delay_ms);
        let works: Vec<_> = terms
            .into_iter()
            .map(|term| {
                move |job: &JobContext| -> Result<f64, JobError> {
                    std::thread::sleep(delay);
                    if job.stop_requested() {
                        return Err(PoolError::Cancelled.into());
                    }
                    job.report_progress(1.0);
                    Ok(*term)
                }
            })
            .collect();

        self.batch.dispatch_many(ctx, works);
        Ok(ProcessOutcome::Pending)
    }
}
