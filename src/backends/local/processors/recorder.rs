// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::ProcessContext;
use crate::errors::ProcessingError;
use crate::network::PortDescriptor;
use crate::services::ResourceInfo;
use crate::traits::{ProcessOutcome, Processor};

/// Sink that records every value it receives. It has no outports, so it is
/// evaluated purely for its side effect.
///
/// The history is registered with the resource registry under the
/// processor's identifier and is persisted as processor state.
#[derive(Debug, Default)]
pub struct Recorder {
    history: Vec<f64>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn last(&self) -> Option<f64> {
        self.history.last().copied()
    }
}

impl Processor for Recorder {
    fn class_identifier(&self) -> &'static str {
        "recorder"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![PortDescriptor::inport::<f64>("value")]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        let value = *ctx.input::<f64>("value")?;
        self.history.push(value);

        ctx.services().resources.add(
            ctx.identifier().to_string(),
            ResourceInfo {
                kind: "history".to_string(),
                bytes: (self.history.len() * std::mem::size_of::<f64>()) as u64,
            },
        );
        Ok(ProcessOutcome::Complete)
    }

    fn save_state(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({ "history": self.history }))
    }

    fn load_state(&mut self, state: &serde_json::Value) -> Result<(), ProcessingError> {
        let history = state
            .get("history")
            .cloned()
            .ok_or_else(|| ProcessingError::failed("state has no 'history' field"))?;
        self.history = serde_json::from_value(history)
            .map_err(|e| ProcessingError::failed(format!("invalid history: {}", e)))?;
        Ok(())
    }
}
