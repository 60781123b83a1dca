// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The view a processor gets of the network during `process()`.
//!
//! Inputs are a snapshot of the connected outports' data taken right before
//! the call. Outputs are staged in the context and published by the
//! evaluator only if the call returns [`ProcessOutcome::Complete`], so
//! downstream processors never observe a half-finished result.
//!
//! [`ProcessOutcome::Complete`]: crate::traits::ProcessOutcome::Complete

use super::pool::{JobContext, JobError, JobHandle, Progress, ThreadPool};
use crate::errors::ProcessingError;
use crate::network::port::Outport;
use crate::network::{
    find_property, NetworkCommand, NetworkHandle, PortData, ProcessorId, Property, PropertyValue,
};
use crate::observability::messages::pool::JobDispatched;
use crate::observability::messages::StructuredLog;
use crate::services::Services;
use std::any::Any;
use std::sync::Arc;

/// Data visible on one inport at the start of a `process()` call.
#[derive(Debug, Clone)]
pub(crate) struct InputSnapshot {
    pub identifier: String,
    /// Published data of every connected outport, in connection order.
    pub data: Vec<PortData>,
    pub connections: usize,
    pub changed: bool,
}

/// Pass-wide collaborators shared by every context in the pass.
pub(crate) struct EvaluationEnv<'a> {
    pub pool: &'a ThreadPool,
    pub services: &'a Services,
    pub handle: NetworkHandle,
}

pub struct ProcessContext<'a> {
    processor: ProcessorId,
    identifier: &'a str,
    inputs: &'a [InputSnapshot],
    outports: &'a [Outport],
    staged: Vec<Option<PortData>>,
    properties: &'a [Property],
    revision: u64,
    progress: &'a Progress,
    env: &'a EvaluationEnv<'a>,
}

impl<'a> ProcessContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        processor: ProcessorId,
        identifier: &'a str,
        inputs: &'a [InputSnapshot],
        outports: &'a [Outport],
        properties: &'a [Property],
        revision: u64,
        progress: &'a Progress,
        env: &'a EvaluationEnv<'a>,
    ) -> Self {
        Self {
            processor,
            identifier,
            inputs,
            outports,
            staged: vec![None; outports.len()],
            properties,
            revision,
            progress,
            env,
        }
    }

    pub fn processor_id(&self) -> ProcessorId {
        self.processor
    }

    pub fn identifier(&self) -> &str {
        self.identifier
    }

    /// Input revision of this processor. It increases whenever a property
    /// changes or new data arrives on an inport, so background results can be
    /// matched against the inputs they were computed from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn inport(&self, port: &str) -> Result<&InputSnapshot, ProcessingError> {
        self.inputs
            .iter()
            .find(|input| input.identifier == port)
            .ok_or_else(|| ProcessingError::UnknownPort(port.to_string()))
    }

    /// Data from the first connection of `port`.
    pub fn input<T: Any + Send + Sync>(&self, port: &str) -> Result<Arc<T>, ProcessingError> {
        self.optional_input(port)?
            .ok_or_else(|| ProcessingError::MissingInput(port.to_string()))
    }

    /// Like [`input`](Self::input) but `None` for an unconnected optional port.
    pub fn optional_input<T: Any + Send + Sync>(
        &self,
        port: &str,
    ) -> Result<Option<Arc<T>>, ProcessingError> {
        let snapshot = self.inport(port)?;
        snapshot
            .data
            .first()
            .map(|data| downcast::<T>(port, data))
            .transpose()
    }

    /// Data from every connection of a multi inport, in connection order.
    pub fn inputs<T: Any + Send + Sync>(&self, port: &str) -> Result<Vec<Arc<T>>, ProcessingError> {
        self.inport(port)?
            .data
            .iter()
            .map(|data| downcast::<T>(port, data))
            .collect()
    }

    /// Whether new data arrived on `port` since this processor last completed.
    pub fn is_changed(&self, port: &str) -> bool {
        self.inport(port).map(|input| input.changed).unwrap_or(false)
    }

    pub fn is_connected(&self, port: &str) -> bool {
        self.inport(port)
            .map(|input| input.connections > 0)
            .unwrap_or(false)
    }

    pub fn set_output<T: Any + Send + Sync>(
        &mut self,
        port: &str,
        value: T,
    ) -> Result<(), ProcessingError> {
        self.set_output_shared(port, Arc::new(value))
    }

    /// Stage already shared data, e.g. an input forwarded unchanged.
    pub fn set_output_shared<T: Any + Send + Sync>(
        &mut self,
        port: &str,
        value: Arc<T>,
    ) -> Result<(), ProcessingError> {
        let index = self
            .outports
            .iter()
            .position(|outport| outport.descriptor.identifier == port)
            .ok_or_else(|| ProcessingError::UnknownPort(port.to_string()))?;

        let data_type = self.outports[index].descriptor.data_type;
        if !data_type.is::<T>() {
            return Err(ProcessingError::OutputTypeMismatch {
                port: port.to_string(),
                expected: data_type.name(),
                found: std::any::type_name::<T>(),
            });
        }

        self.staged[index] = Some(value as PortData);
        Ok(())
    }

    pub fn property(&self, path: &str) -> Result<&PropertyValue, ProcessingError> {
        find_property(self.properties, path)
            .and_then(|property| property.value())
            .ok_or_else(|| ProcessingError::Property {
                path: path.to_string(),
                reason: "no such value property".to_string(),
            })
    }

    pub fn property_float(&self, path: &str) -> Result<f64, ProcessingError> {
        let value = self.property(path)?;
        value.as_float().ok_or_else(|| kind_error(path, "float", value))
    }

    pub fn property_int(&self, path: &str) -> Result<i64, ProcessingError> {
        let value = self.property(path)?;
        value.as_int().ok_or_else(|| kind_error(path, "int", value))
    }

    pub fn property_bool(&self, path: &str) -> Result<bool, ProcessingError> {
        let value = self.property(path)?;
        value.as_bool().ok_or_else(|| kind_error(path, "bool", value))
    }

    pub fn property_text(&self, path: &str) -> Result<&str, ProcessingError> {
        let value = self.property(path)?;
        value.as_text().ok_or_else(|| kind_error(path, "text", value))
    }

    pub fn is_property_modified(&self, path: &str) -> bool {
        find_property(self.properties, path)
            .map(Property::is_modified)
            .unwrap_or(false)
    }

    pub fn services(&self) -> &Services {
        self.env.services
    }

    /// Handle for mutations that must wait until the current pass is over.
    pub fn network_handle(&self) -> &NetworkHandle {
        &self.env.handle
    }

    /// Submit `work` to the background pool and return at once.
    ///
    /// When the job finishes the network is woken up so this processor is
    /// polled again. Progress reported by the job is readable through
    /// [`ProcessorNetwork::progress`](crate::network::ProcessorNetwork::progress).
    pub fn dispatch<T, F>(&self, work: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&JobContext) -> Result<T, JobError> + Send + 'static,
    {
        JobDispatched {
            processor_id: self.identifier,
            revision: self.revision,
        }
        .log();

        let handle = self.env.handle.clone();
        let processor = self.processor;
        self.env.pool.submit(self.progress.clone(), work, move || {
            // The network may be gone already; then nobody is waiting.
            let _ = handle.send(NetworkCommand::JobFinished(processor));
        })
    }

    /// Submit a batch of jobs at once. Their progress is reported as one
    /// value, the mean over the batch, and the network is woken up as each
    /// job finishes.
    pub fn dispatch_many<T, F>(&self, works: Vec<F>) -> Vec<JobHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&JobContext) -> Result<T, JobError> + Send + 'static,
    {
        JobDispatched {
            processor_id: self.identifier,
            revision: self.revision,
        }
        .log();

        let handle = self.env.handle.clone();
        let processor = self.processor;
        self.env.pool.submit_many(self.progress.clone(), works, move || {
            let _ = handle.send(NetworkCommand::JobFinished(processor));
        })
    }

    pub(crate) fn into_staged(self) -> Vec<Option<PortData>> {
        self.staged
    }
}

fn downcast<T: Any + Send + Sync>(port: &str, data: &PortData) -> Result<Arc<T>, ProcessingError> {
    Arc::clone(data)
        .downcast::<T>()
        .map_err(|_| ProcessingError::InputTypeMismatch {
            port: port.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

fn kind_error(path: &str, expected: &str, found: &PropertyValue) -> ProcessingError {
    ProcessingError::Property {
        path: path.to_string(),
        reason: format!("expected a {} value, found {}", expected, found.kind()),
    }
}
