// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::ProcessContext;
use crate::errors::ProcessingError;
use crate::network::{PortDescriptor, Property};
use crate::traits::{ProcessOutcome, Processor};

/// Renders a number as text: `"{label}{value:.precision$}"`.
#[derive(Default)]
pub struct Format;

impl Format {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for Format {
    fn class_identifier(&self) -> &'static str {
        "format"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::inport::<f64>("value"),
            PortDescriptor::outport::<String>("text"),
        ]
    }

    fn properties(&self) -> Vec<Property> {
        vec![
            Property::new("label", ""),
            Property::new("precision", 2_i64),
        ]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        let value = *ctx.input::<f64>("value")?;
        let precision = ctx.property_int("precision")?;
        let precision = usize::try_from(precision).map_err(|_| ProcessingError::Property {
            path: "precision".to_string(),
            reason: format!("must not be negative, got {}", precision),
        })?;
        let text = format!("{}{:.*}", ctx.property_text("label")?, precision, value);
        ctx.set_output("text", text)?;
        Ok(ProcessOutcome::Complete)
    }
}
