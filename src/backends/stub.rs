// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test-only processors.

use crate::engine::ProcessContext;
use crate::errors::ProcessingError;
use crate::network::{PortDescriptor, Property};
use crate::traits::{ProcessOutcome, Processor};
use std::sync::{Arc, Mutex};

/// Shared record of which processors ran, in order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(log: &Option<CallLog>, ctx: &ProcessContext<'_>) {
    if let Some(log) = log {
        log.lock().unwrap().push(ctx.identifier().to_string());
    }
}

/// Forwards `in + extra` to `out`. Both inports optional so a lone
/// pass-through is a source emitting zero.
#[derive(Default)]
pub struct PassThrough {
    log: Option<CallLog>,
}

impl PassThrough {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logged(log: &CallLog) -> Self {
        Self {
            log: Some(Arc::clone(log)),
        }
    }
}

impl Processor for PassThrough {
    fn class_identifier(&self) -> &'static str {
        "pass_through"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::inport::<f64>("in").optional(),
            PortDescriptor::inport::<f64>("extra").optional(),
            PortDescriptor::outport::<f64>("out"),
        ]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        record(&self.log, ctx);
        let a = ctx.optional_input::<f64>("in")?.map(|v| *v).unwrap_or(0.0);
        let b = ctx.optional_input::<f64>("extra")?.map(|v| *v).unwrap_or(0.0);
        ctx.set_output("out", a + b)?;
        Ok(ProcessOutcome::Complete)
    }
}

/// Fails while its `fail` property is true; otherwise forwards `in + 1`.
pub struct FailingProcessor {
    log: Option<CallLog>,
}

impl FailingProcessor {
    pub fn logged(log: &CallLog) -> Self {
        Self {
            log: Some(Arc::clone(log)),
        }
    }
}

impl Processor for FailingProcessor {
    fn class_identifier(&self) -> &'static str {
        "failing"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::inport::<f64>("in").optional(),
            PortDescriptor::outport::<f64>("out"),
        ]
    }

    fn properties(&self) -> Vec<Property> {
        vec![Property::new("fail", true)]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        record(&self.log, ctx);
        if ctx.property_bool("fail")? {
            return Err(ProcessingError::failed("simulated processor failure"));
        }
        let input = ctx.optional_input::<f64>("in")?.map(|v| *v).unwrap_or(0.0);
        ctx.set_output("out", input + 1.0)?;
        Ok(ProcessOutcome::Complete)
    }
}

/// Panics inside `process()`.
pub struct PanickingProcessor;

impl Processor for PanickingProcessor {
    fn class_identifier(&self) -> &'static str {
        "panicking"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![PortDescriptor::outport::<f64>("out")]
    }

    fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        panic!("processor blew up");
    }
}

/// Never ready until `open` is set, regardless of its ports.
pub struct GatedProcessor {
    pub open: bool,
}

impl Processor for GatedProcessor {
    fn class_identifier(&self) -> &'static str {
        "gated"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![PortDescriptor::outport::<f64>("out")]
    }

    fn is_ready(&self) -> bool {
        self.open
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        ctx.set_output("out", 1.0_f64)?;
        Ok(ProcessOutcome::Complete)
    }
}
