// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::ProcessContext;
use crate::errors::ProcessingError;
use crate::network::{PortDescriptor, Property};
use std::any::Any;

/// What a `process()` call achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Outputs staged during the call are published and the processor becomes valid.
    Complete,
    /// Background work is still outstanding; nothing is published and the
    /// processor stays invalid so it is polled again on the next pass.
    Pending,
}

/// Downcasting support for processors stored as trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A node in the processor network.
///
/// A processor declares its ports and properties once, when it is added to a
/// network; the network owns the resulting port and property state. During
/// evaluation the processor reads inputs and properties from the
/// [`ProcessContext`] and stages its outputs there.
///
/// `process()` must never block: long-running work goes through
/// [`ProcessContext::dispatch`] (usually via a [`PoolSlot`](crate::engine::PoolSlot))
/// and the processor returns [`ProcessOutcome::Pending`] until the result is in.
pub trait Processor: AsAny + Send {
    /// Class identifier the factory uses to build this processor.
    fn class_identifier(&self) -> &'static str;

    fn ports(&self) -> Vec<PortDescriptor>;

    fn properties(&self) -> Vec<Property> {
        Vec::new()
    }

    /// Extra readiness condition on top of port readiness, e.g. resources
    /// that must exist before `process()` can run.
    fn is_ready(&self) -> bool {
        true
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError>;

    /// Internal state worth persisting beyond property values.
    fn save_state(&self) -> Option<serde_json::Value> {
        None
    }

    fn load_state(&mut self, _state: &serde_json::Value) -> Result<(), ProcessingError> {
        Ok(())
    }
}
