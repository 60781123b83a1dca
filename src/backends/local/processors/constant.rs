// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::ProcessContext;
use crate::errors::ProcessingError;
use crate::network::{PortDescriptor, Property};
use crate::traits::{ProcessOutcome, Processor};

/// Source processor publishing its `value` property on the `value` outport.
pub struct ConstantSource {
    initial: f64,
}

impl ConstantSource {
    pub fn new(initial: f64) -> Self {
        Self { initial }
    }
}

impl Processor for ConstantSource {
    fn class_identifier(&self) -> &'static str {
        "constant"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![PortDescriptor::outport::<f64>("value")]
    }

    fn properties(&self) -> Vec<Property> {
        vec![Property::new("value", self.initial)]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        let value = ctx.property_float("value")?;
        ctx.set_output("value", value)?;
        Ok(ProcessOutcome::Complete)
    }
}
