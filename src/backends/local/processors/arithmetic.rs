// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Small numeric processors over `f64` ports.

use crate::engine::ProcessContext;
use crate::errors::ProcessingError;
use crate::network::{PortDescriptor, Property};
use crate::traits::{ProcessOutcome, Processor};

/// `input * factor`
pub struct Scale {
    initial_factor: f64,
}

impl Scale {
    pub fn new(factor: f64) -> Self {
        Self {
            initial_factor: factor,
        }
    }
}

impl Processor for Scale {
    fn class_identifier(&self) -> &'static str {
        "scale"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::inport::<f64>("input"),
            PortDescriptor::outport::<f64>("output"),
        ]
    }

    fn properties(&self) -> Vec<Property> {
        vec![Property::new("factor", self.initial_factor)]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        let value = *ctx.input::<f64>("input")?;
        let factor = ctx.property_float("factor")?;
        ctx.set_output("output", value * factor)?;
        Ok(ProcessOutcome::Complete)
    }
}

/// `lhs + rhs`; an unconnected `rhs` counts as zero.
#[derive(Default)]
pub struct Add;

impl Add {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for Add {
    fn class_identifier(&self) -> &'static str {
        "add"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::inport::<f64>("lhs"),
            PortDescriptor::inport::<f64>("rhs").optional(),
            PortDescriptor::outport::<f64>("sum"),
        ]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        let lhs = *ctx.input::<f64>("lhs")?;
        let rhs = ctx.optional_input::<f64>("rhs")?.map(|v| *v).unwrap_or(0.0);
        ctx.set_output("sum", lhs + rhs)?;
        Ok(ProcessOutcome::Complete)
    }
}

/// Sum over every connection of a multi inport.
pub struct Sum {
    max_inputs: Option<usize>,
}

impl Sum {
    pub fn new() -> Self {
        Self { max_inputs: None }
    }

    pub fn bounded(max_inputs: usize) -> Self {
        Self {
            max_inputs: Some(max_inputs),
        }
    }
}

impl Default for Sum {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Sum {
    fn class_identifier(&self) -> &'static str {
        "sum"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::inport::<f64>("values").multi(self.max_inputs),
            PortDescriptor::outport::<f64>("total"),
        ]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        let total: f64 = ctx.inputs::<f64>("values")?.iter().map(|v| **v).sum();
        ctx.set_output("total", total)?;
        Ok(ProcessOutcome::Complete)
    }
}
