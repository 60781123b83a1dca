// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The processor graph: storage, structural mutation and invalidation.
//!
//! Processors live in an arena of slots indexed by [`ProcessorId`]. Every
//! cross reference (outport to inport, inport to outport, processor to port)
//! is an id looked up through the network, so removing a processor can never
//! leave a dangling pointer behind.
//!
//! # Invariants
//!
//! * The processor graph induced by the connections is acyclic after every
//!   public call. Structural operations validate first and mutate only once
//!   validation has passed, so a failed call leaves the network unchanged.
//! * Invalidation levels never decrease except when the evaluator records a
//!   completed `process()` call for that processor.
//!
//! # Examples
//!
//! ```
//! use procnet::backends::local::processors::{ConstantSource, Scale};
//! use procnet::network::{InvalidationLevel, ProcessorNetwork};
//!
//! let mut network = ProcessorNetwork::new();
//! let source = network.add_processor("source", Box::new(ConstantSource::new(2.0))).unwrap();
//! let scale = network.add_processor("scale", Box::new(Scale::new(3.0))).unwrap();
//! network.add_connection("source.value", "scale.input").unwrap();
//!
//! assert_eq!(network.topological_order(), &[source, scale]);
//! assert!(network
//!     .add_connection("scale.output", "source.value")
//!     .is_err());
//! assert_eq!(network.invalidation_level(scale), Some(InvalidationLevel::InvalidResources));
//! ```

use super::commands::{NetworkCommand, NetworkHandle};
use super::ids::{InportId, OutportId, PortConnection, ProcessorId};
use super::invalidation::InvalidationLevel;
use super::port::{Inport, Outport, PortData, PortDescriptor, PortDirection};
use super::property::{clear_modified, find_property, find_property_mut, Property, PropertyValue};
use crate::engine::context::InputSnapshot;
use crate::engine::Progress;
use crate::errors::NetworkError;
use crate::observability::messages::network::{
    CommandRejected, ConnectionAdded, ConnectionRemoved, ProcessorAdded, ProcessorRemoved,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Processor;
use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Evaluation state of a processor as seen from outside the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorState {
    /// Every required input is present and valid.
    Ready,
    /// Missing or stale inputs, or the processor's own readiness hook said no.
    NotReady,
    /// The last `process()` call failed. Sticky until the processor is
    /// invalidated again.
    Error(String),
}

pub(crate) struct ProcessorSlot {
    pub identifier: String,
    pub processor: Box<dyn Processor>,
    pub inports: Vec<Inport>,
    pub outports: Vec<Outport>,
    pub properties: Vec<Property>,
    pub level: InvalidationLevel,
    pub error: Option<String>,
    pub revision: u64,
    pub progress: Progress,
}

impl ProcessorSlot {
    /// Valid itself and on every outport. An outport invalidated on its own
    /// makes the processor due for evaluation again.
    pub fn is_valid(&self) -> bool {
        self.level.is_valid() && self.outports.iter().all(|port| port.level.is_valid())
    }

    fn inport_index(&self, port: &str) -> Option<usize> {
        self.inports
            .iter()
            .position(|p| p.descriptor.identifier == port)
    }

    fn outport_index(&self, port: &str) -> Option<usize> {
        self.outports
            .iter()
            .position(|p| p.descriptor.identifier == port)
    }
}

/// One step of the forward invalidation walk.
#[derive(Debug, Clone, Copy)]
enum Target {
    Processor(ProcessorId, InvalidationLevel),
    Outport(OutportId, InvalidationLevel),
    Inport(InportId, InvalidationLevel),
}

/// Processor and port identifiers are joined with '.' into port paths, so
/// neither may be empty or contain one.
fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty() && !identifier.contains('.')
}

pub struct ProcessorNetwork {
    slots: Vec<Option<ProcessorSlot>>,
    identifiers: HashMap<String, ProcessorId>,
    connections: Vec<PortConnection>,
    order: Option<Vec<ProcessorId>>,
    sender: Sender<NetworkCommand>,
    receiver: Receiver<NetworkCommand>,
    deferred: VecDeque<NetworkCommand>,
    evaluation_requested: bool,
    modified: bool,
}

impl Default for ProcessorNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorNetwork {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            slots: Vec::new(),
            identifiers: HashMap::new(),
            connections: Vec::new(),
            order: None,
            sender,
            receiver,
            deferred: VecDeque::new(),
            evaluation_requested: false,
            modified: false,
        }
    }

    // ----- lookup -----------------------------------------------------------

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn contains(&self, id: ProcessorId) -> bool {
        self.slot(id).is_some()
    }

    pub fn processor_id(&self, identifier: &str) -> Option<ProcessorId> {
        self.identifiers.get(identifier).copied()
    }

    pub fn identifier(&self, id: ProcessorId) -> Option<&str> {
        self.slot(id).map(|slot| slot.identifier.as_str())
    }

    /// All live processors in registration order.
    pub fn processor_ids(&self) -> Vec<ProcessorId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| ProcessorId::new(index as u32))
            .collect()
    }

    pub fn class_identifier(&self, id: ProcessorId) -> Option<&'static str> {
        self.slot(id).map(|slot| slot.processor.class_identifier())
    }

    /// Borrow a processor by identifier as its concrete type.
    pub fn processor<T: Any>(&self, identifier: &str) -> Option<&T> {
        let slot = self.slot(self.processor_id(identifier)?)?;
        let processor: &dyn Processor = slot.processor.as_ref();
        processor.as_any().downcast_ref::<T>()
    }

    pub fn processor_mut<T: Any>(&mut self, identifier: &str) -> Option<&mut T> {
        let id = self.processor_id(identifier)?;
        let slot = self.slot_mut(id)?;
        let processor: &mut dyn Processor = slot.processor.as_mut();
        processor.as_any_mut().downcast_mut::<T>()
    }

    /// Every connection in the order it was made.
    pub fn connections(&self) -> &[PortConnection] {
        &self.connections
    }

    /// Connections with at least one end on `id`.
    pub fn connections_of(&self, id: ProcessorId) -> Vec<PortConnection> {
        self.connections
            .iter()
            .filter(|c| c.source.processor == id || c.destination.processor == id)
            .copied()
            .collect()
    }

    pub fn is_connected(&self, source: &str, destination: &str) -> bool {
        match (self.resolve_outport(source), self.resolve_inport(destination)) {
            (Ok(source), Ok(destination)) => self.connections.contains(&PortConnection {
                source,
                destination,
            }),
            _ => false,
        }
    }

    pub fn outport_path(&self, id: OutportId) -> Option<String> {
        let slot = self.slot(id.processor)?;
        let port = slot.outports.get(id.index)?;
        Some(format!("{}.{}", slot.identifier, port.descriptor.identifier))
    }

    pub fn inport_path(&self, id: InportId) -> Option<String> {
        let slot = self.slot(id.processor)?;
        let port = slot.inports.get(id.index)?;
        Some(format!("{}.{}", slot.identifier, port.descriptor.identifier))
    }

    /// Port declarations of a processor as it was registered.
    pub fn port_descriptors(&self, id: ProcessorId) -> Vec<PortDescriptor> {
        self.slot(id)
            .map(|slot| {
                slot.inports
                    .iter()
                    .map(|p| p.descriptor.clone())
                    .chain(slot.outports.iter().map(|p| p.descriptor.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn properties(&self, id: ProcessorId) -> Option<&[Property]> {
        self.slot(id).map(|slot| slot.properties.as_slice())
    }

    pub fn property(&self, identifier: &str, path: &str) -> Option<&PropertyValue> {
        let slot = self.slot(self.processor_id(identifier)?)?;
        find_property(&slot.properties, path)?.value()
    }

    pub fn invalidation_level(&self, id: ProcessorId) -> Option<InvalidationLevel> {
        self.slot(id).map(|slot| slot.level)
    }

    pub fn outport_level(&self, path: &str) -> Option<InvalidationLevel> {
        let id = self.resolve_outport(path).ok()?;
        self.outport(id).map(|port| port.level)
    }

    pub fn inport_changed(&self, path: &str) -> Option<bool> {
        let id = self.resolve_inport(path).ok()?;
        self.inport(id).map(|port| port.changed)
    }

    /// Input revision of a processor; see [`ProcessContext::revision`](crate::engine::ProcessContext::revision).
    pub fn revision(&self, id: ProcessorId) -> Option<u64> {
        self.slot(id).map(|slot| slot.revision)
    }

    /// Last progress value reported by the processor's background work.
    pub fn progress(&self, id: ProcessorId) -> Option<f32> {
        self.slot(id).map(|slot| slot.progress.get())
    }

    pub fn processor_state(&self, id: ProcessorId) -> Option<ProcessorState> {
        let slot = self.slot(id)?;
        Some(match &slot.error {
            Some(message) => ProcessorState::Error(message.clone()),
            None if self.is_ready(id) => ProcessorState::Ready,
            None => ProcessorState::NotReady,
        })
    }

    /// Data last published on an outport, downcast to `T`.
    pub fn outport_data<T: Any + Send + Sync>(&self, path: &str) -> Option<Arc<T>> {
        let id = self.resolve_outport(path).ok()?;
        let data = self.outport(id)?.data.clone()?;
        data.downcast::<T>().ok()
    }

    // ----- structural mutation ---------------------------------------------

    /// Take ownership of `processor` under `identifier`.
    ///
    /// The processor starts at [`InvalidationLevel::InvalidResources`] so the
    /// next pass evaluates it once it is ready.
    pub fn add_processor(
        &mut self,
        identifier: impl Into<String>,
        processor: Box<dyn Processor>,
    ) -> Result<ProcessorId, NetworkError> {
        let identifier = identifier.into();
        if !is_valid_identifier(&identifier) {
            return Err(NetworkError::InvalidIdentifier(identifier));
        }
        if self.identifiers.contains_key(&identifier) {
            return Err(NetworkError::DuplicateIdentifier(identifier));
        }

        let mut seen = HashSet::new();
        let mut inports = Vec::new();
        let mut outports = Vec::new();
        for descriptor in processor.ports() {
            if !is_valid_identifier(&descriptor.identifier) {
                return Err(NetworkError::InvalidPortIdentifier {
                    processor: identifier,
                    port: descriptor.identifier,
                });
            }
            if !seen.insert(descriptor.identifier.clone()) {
                return Err(NetworkError::DuplicatePort {
                    processor: identifier,
                    port: descriptor.identifier,
                });
            }
            match descriptor.direction {
                PortDirection::Inport => inports.push(Inport::new(descriptor)),
                PortDirection::Outport => outports.push(Outport::new(descriptor)),
            }
        }

        let id = ProcessorId::new(self.slots.len() as u32);
        ProcessorAdded {
            processor_id: &identifier,
            class: processor.class_identifier(),
            inports: inports.len(),
            outports: outports.len(),
        }
        .log();

        let properties = processor.properties();
        self.identifiers.insert(identifier.clone(), id);
        self.slots.push(Some(ProcessorSlot {
            identifier,
            processor,
            inports,
            outports,
            properties,
            level: InvalidationLevel::InvalidResources,
            error: None,
            revision: 0,
            progress: Progress::new(),
        }));
        self.order = None;
        self.modified = true;
        self.evaluation_requested = true;
        Ok(id)
    }

    /// Remove a processor and every connection touching it, returning
    /// ownership of the processor to the caller.
    ///
    /// Processors that were fed by the removed one are invalidated. Dropping
    /// the returned box cancels any background jobs it still owns.
    pub fn remove_processor(&mut self, identifier: &str) -> Result<Box<dyn Processor>, NetworkError> {
        let id = self
            .processor_id(identifier)
            .ok_or_else(|| NetworkError::NotFound(identifier.to_string()))?;

        for connection in self.connections_of(id) {
            self.disconnect(connection);
        }

        let slot = self.slots[id.index()]
            .take()
            .ok_or_else(|| NetworkError::NotFound(identifier.to_string()))?;
        self.identifiers.remove(identifier);
        self.order = None;
        self.modified = true;

        ProcessorRemoved {
            processor_id: identifier,
            class: slot.processor.class_identifier(),
        }
        .log();
        Ok(slot.processor)
    }

    /// Connect the outport at `source` to the inport at `destination`, both
    /// given as `"<processor>.<port>"` paths.
    pub fn add_connection(&mut self, source: &str, destination: &str) -> Result<(), NetworkError> {
        let outport_id = self.resolve_outport(source)?;
        let inport_id = self.resolve_inport(destination)?;
        let connection = PortConnection {
            source: outport_id,
            destination: inport_id,
        };

        if self.connections.contains(&connection) {
            return Err(NetworkError::AlreadyConnected {
                outport: source.to_string(),
                inport: destination.to_string(),
            });
        }

        let (outport, inport) = match (self.outport(outport_id), self.inport(inport_id)) {
            (Some(outport), Some(inport)) => (outport, inport),
            _ => return Err(NetworkError::NotFound(source.to_string())),
        };

        if outport.descriptor.data_type != inport.descriptor.data_type {
            return Err(NetworkError::TypeMismatch {
                outport: source.to_string(),
                inport: destination.to_string(),
                outport_type: outport.descriptor.data_type.name(),
                inport_type: inport.descriptor.data_type.name(),
            });
        }

        if let Some(max) = inport.descriptor.multiplicity.max_connections() {
            if inport.connections.len() >= max {
                return Err(NetworkError::MultiplicityExceeded {
                    inport: destination.to_string(),
                    max,
                });
            }
        }

        if outport_id.processor == inport_id.processor
            || self.is_reachable(inport_id.processor, outport_id.processor)
        {
            return Err(NetworkError::CycleDetected {
                outport: source.to_string(),
                inport: destination.to_string(),
            });
        }

        if let Some(outport) = self.outport_mut(outport_id) {
            outport.connections.push(inport_id);
        }
        let has_data = self
            .outport(outport_id)
            .map(|port| port.data.is_some())
            .unwrap_or(false);
        if let Some(inport) = self.inport_mut(inport_id) {
            inport.connections.push(outport_id);
            inport.changed = inport.changed || has_data;
        }
        self.connections.push(connection);
        self.order = None;
        self.modified = true;

        ConnectionAdded {
            source,
            destination,
        }
        .log();

        self.bump_revision(inport_id.processor);
        self.propagate(vec![Target::Inport(inport_id, InvalidationLevel::InvalidOutput)]);
        Ok(())
    }

    pub fn remove_connection(&mut self, source: &str, destination: &str) -> Result<(), NetworkError> {
        let not_connected = || NetworkError::NotConnected {
            outport: source.to_string(),
            inport: destination.to_string(),
        };
        let connection = PortConnection {
            source: self.resolve_outport(source).map_err(|_| not_connected())?,
            destination: self.resolve_inport(destination).map_err(|_| not_connected())?,
        };
        if !self.connections.contains(&connection) {
            return Err(not_connected());
        }

        self.disconnect(connection);
        ConnectionRemoved {
            source,
            destination,
        }
        .log();
        Ok(())
    }

    /// Remove every processor and connection.
    pub fn clear(&mut self) {
        let identifiers: Vec<String> = self
            .processor_ids()
            .into_iter()
            .rev()
            .filter_map(|id| self.identifier(id).map(str::to_string))
            .collect();
        for identifier in identifiers {
            // Dropping the processor cancels its outstanding jobs.
            let _ = self.remove_processor(&identifier);
        }
    }

    /// Drop `connection` from the three places it is recorded and invalidate
    /// its destination.
    fn disconnect(&mut self, connection: PortConnection) {
        let PortConnection {
            source,
            destination,
        } = connection;
        self.connections.retain(|c| *c != connection);
        if let Some(outport) = self.outport_mut(source) {
            outport.connections.retain(|id| *id != destination);
        }
        if let Some(inport) = self.inport_mut(destination) {
            inport.connections.retain(|id| *id != source);
            inport.changed = true;
        }
        self.order = None;
        self.modified = true;
        self.bump_revision(destination.processor);
        self.propagate(vec![Target::Inport(destination, InvalidationLevel::InvalidOutput)]);
    }

    // ----- properties & invalidation ---------------------------------------

    /// Set a property value and invalidate its processor at the property's
    /// level. Returns `Ok(false)` when the value was already equal.
    pub fn set_property(
        &mut self,
        identifier: &str,
        path: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<bool, NetworkError> {
        let id = self
            .processor_id(identifier)
            .ok_or_else(|| NetworkError::NotFound(identifier.to_string()))?;
        let slot = self
            .slot_mut(id)
            .ok_or_else(|| NetworkError::NotFound(identifier.to_string()))?;
        let property = find_property_mut(&mut slot.properties, path).ok_or_else(|| {
            NetworkError::PropertyNotFound {
                processor: identifier.to_string(),
                path: path.to_string(),
            }
        })?;

        let value = value.into();
        let current = property
            .value()
            .ok_or_else(|| NetworkError::PropertyNotAssignable {
                processor: identifier.to_string(),
                path: path.to_string(),
            })?;
        let found = value.kind();
        let coerced = current
            .coerce(value)
            .ok_or_else(|| NetworkError::PropertyTypeMismatch {
                processor: identifier.to_string(),
                path: path.to_string(),
                expected: current.kind(),
                found,
            })?;

        if !property.assign(coerced) {
            return Ok(false);
        }
        let level = property.invalidation_level();
        slot.revision += 1;
        self.modified = true;
        self.propagate(vec![Target::Processor(id, level)]);
        Ok(true)
    }

    /// Invalidate a processor and everything downstream of it.
    ///
    /// Returns whether any stored state changed. Invalidating at a level the
    /// processor already has is a no-op, except that it clears a sticky
    /// error so the processor is retried.
    pub fn invalidate_processor(&mut self, id: ProcessorId, level: InvalidationLevel) -> bool {
        self.propagate(vec![Target::Processor(id, level)])
    }

    pub fn invalidate(&mut self, identifier: &str, level: InvalidationLevel) -> Result<bool, NetworkError> {
        let id = self
            .processor_id(identifier)
            .ok_or_else(|| NetworkError::NotFound(identifier.to_string()))?;
        Ok(self.invalidate_processor(id, level))
    }

    /// Invalidate an outport and everything connected downstream of it.
    pub fn invalidate_outport(&mut self, path: &str, level: InvalidationLevel) -> Result<bool, NetworkError> {
        let id = self.resolve_outport(path)?;
        Ok(self.propagate(vec![Target::Outport(id, level)]))
    }

    /// Iterative forward walk. A node whose level did not rise stops the
    /// walk along that branch.
    fn propagate(&mut self, seeds: Vec<Target>) -> bool {
        let mut stack = seeds;
        let mut changed = false;

        while let Some(target) = stack.pop() {
            match target {
                Target::Processor(id, level) => {
                    let Some(slot) = self.slot_mut(id) else { continue };
                    let cleared = slot.error.take().is_some();
                    let raised = slot.level.raise(level);
                    if !(raised || cleared) {
                        continue;
                    }
                    changed = true;
                    for index in (0..slot.outports.len()).rev() {
                        stack.push(Target::Outport(
                            OutportId {
                                processor: id,
                                index,
                            },
                            InvalidationLevel::InvalidOutput,
                        ));
                    }
                }
                Target::Outport(id, level) => {
                    let Some(outport) = self.outport_mut(id) else { continue };
                    if !outport.level.raise(level) {
                        continue;
                    }
                    changed = true;
                    for inport in outport.connections.iter().rev() {
                        stack.push(Target::Inport(*inport, level));
                    }
                }
                Target::Inport(id, level) => {
                    let Some(inport) = self.inport_mut(id) else { continue };
                    let raised = inport.level.raise(level);
                    changed |= raised;
                    // The owner is checked even when the inport already was
                    // invalid: it may have completed since.
                    stack.push(Target::Processor(id.processor, InvalidationLevel::InvalidOutput));
                }
            }
        }

        if changed {
            self.evaluation_requested = true;
        }
        changed
    }

    fn bump_revision(&mut self, id: ProcessorId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.revision += 1;
        }
    }

    // ----- evaluation support ----------------------------------------------

    /// Readiness predicate: every inport is either optional and unconnected,
    /// or every outport feeding it is valid and holds data; and the
    /// processor's own hook agrees.
    pub fn is_ready(&self, id: ProcessorId) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        let inputs_ready = slot.inports.iter().all(|inport| {
            if inport.connections.is_empty() {
                return inport.descriptor.optional;
            }
            inport.connections.iter().all(|source| {
                self.outport(*source)
                    .map(Outport::is_ready)
                    .unwrap_or(false)
            })
        });
        inputs_ready && slot.processor.is_ready()
    }

    /// Whether an invalidation happened since the last pass, or some
    /// processor is invalid, not in error, and ready to run. An invalid
    /// processor that is waiting on inputs does not count; the change that
    /// makes it ready requests evaluation by itself.
    pub fn needs_evaluation(&self) -> bool {
        self.evaluation_requested
            || self.slots.iter().enumerate().any(|(index, slot)| {
                slot.as_ref()
                    .is_some_and(|slot| slot.error.is_none() && !slot.is_valid())
                    && self.is_ready(ProcessorId::new(index as u32))
            })
    }

    pub(crate) fn clear_evaluation_request(&mut self) {
        self.evaluation_requested = false;
    }

    pub(crate) fn input_snapshot(&self, id: ProcessorId) -> Vec<InputSnapshot> {
        let Some(slot) = self.slot(id) else {
            return Vec::new();
        };
        slot.inports
            .iter()
            .map(|inport| InputSnapshot {
                identifier: inport.descriptor.identifier.clone(),
                data: inport
                    .connections
                    .iter()
                    .filter_map(|source| self.outport(*source).and_then(|o| o.data.clone()))
                    .collect(),
                connections: inport.connections.len(),
                changed: inport.changed,
            })
            .collect()
    }

    /// Record a completed `process()` call: publish staged outputs, reset
    /// the processor and its ports to valid, and flag new data downstream.
    pub(crate) fn complete_processor(&mut self, id: ProcessorId, staged: Vec<Option<PortData>>) {
        let mut published = Vec::new();
        {
            let Some(slot) = self.slot_mut(id) else { return };
            for (index, data) in staged.into_iter().enumerate() {
                if let (Some(data), Some(outport)) = (data, slot.outports.get_mut(index)) {
                    outport.data = Some(data);
                    published.extend(outport.connections.iter().copied());
                }
            }
            for outport in &mut slot.outports {
                outport.level = InvalidationLevel::Valid;
            }
            for inport in &mut slot.inports {
                inport.level = InvalidationLevel::Valid;
                inport.changed = false;
            }
            clear_modified(&mut slot.properties);
            slot.level = InvalidationLevel::Valid;
            slot.error = None;
        }

        for destination in published {
            if let Some(inport) = self.inport_mut(destination) {
                inport.changed = true;
            }
            self.bump_revision(destination.processor);
        }
    }

    /// Move a processor into the sticky error state. Its outports keep the
    /// data they last published.
    pub(crate) fn fail_processor(&mut self, id: ProcessorId, message: String) {
        if let Some(slot) = self.slot_mut(id) {
            slot.error = Some(message);
        }
    }

    pub(crate) fn slot(&self, id: ProcessorId) -> Option<&ProcessorSlot> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn slot_mut(&mut self, id: ProcessorId) -> Option<&mut ProcessorSlot> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    // ----- command queue ----------------------------------------------------

    /// Cloneable, `Send` handle for queueing mutations from other threads or
    /// from inside an evaluation pass.
    pub fn handle(&self) -> NetworkHandle {
        NetworkHandle::new(self.sender.clone())
    }

    pub fn has_pending_commands(&self) -> bool {
        !self.deferred.is_empty() || !self.receiver.is_empty()
    }

    /// Block until a command arrives or `timeout` elapses. This is the only
    /// blocking call in the network; hosts use it between passes.
    pub fn wait_for_commands(&mut self, timeout: Duration) -> bool {
        if !self.deferred.is_empty() {
            return true;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(command) => {
                self.deferred.push_back(command);
                true
            }
            Err(_) => false,
        }
    }

    /// Apply every command queued so far. Commands queued while applying
    /// (e.g. by a `Run` closure) wait for the next call. Rejected commands are
    /// logged and returned.
    pub fn apply_pending_commands(&mut self) -> Vec<NetworkError> {
        let mut batch: Vec<NetworkCommand> = self.deferred.drain(..).collect();
        batch.extend(self.receiver.try_iter());

        let mut errors = Vec::new();
        for command in batch {
            let name = command.name();
            if let Err(error) = self.apply_command(command) {
                CommandRejected {
                    command: name,
                    error: &error,
                }
                .log();
                errors.push(error);
            }
        }
        errors
    }

    fn apply_command(&mut self, command: NetworkCommand) -> Result<(), NetworkError> {
        match command {
            NetworkCommand::AddProcessor {
                identifier,
                processor,
            } => self.add_processor(identifier, processor).map(|_| ()),
            NetworkCommand::RemoveProcessor(identifier) => {
                self.remove_processor(&identifier).map(|_| ())
            }
            NetworkCommand::AddConnection {
                source,
                destination,
            } => self.add_connection(&source, &destination),
            NetworkCommand::RemoveConnection {
                source,
                destination,
            } => self.remove_connection(&source, &destination),
            NetworkCommand::SetProperty {
                processor,
                path,
                value,
            } => self.set_property(&processor, &path, value).map(|_| ()),
            NetworkCommand::Invalidate { processor, level } => {
                self.invalidate(&processor, level).map(|_| ())
            }
            NetworkCommand::JobFinished(id) => {
                // Ids are never reused, so a finished job of a removed
                // processor is simply ignored.
                if self.contains(id) {
                    self.evaluation_requested = true;
                }
                Ok(())
            }
            NetworkCommand::Run(f) => {
                f(self);
                Ok(())
            }
        }
    }

    // ----- dirty flag ---------------------------------------------------------

    /// Whether the network changed since the flag was last reset.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    // ----- port resolution ----------------------------------------------------

    fn split_path(path: &str) -> Result<(&str, &str), NetworkError> {
        path.rsplit_once('.')
            .filter(|(processor, port)| !processor.is_empty() && !port.is_empty())
            .ok_or_else(|| NetworkError::InvalidPortPath(path.to_string()))
    }

    pub fn resolve_outport(&self, path: &str) -> Result<OutportId, NetworkError> {
        let (processor, port) = Self::split_path(path)?;
        let not_found = || NetworkError::PortNotFound {
            path: path.to_string(),
            expected: PortDirection::Outport.as_str(),
        };
        let id = self.processor_id(processor).ok_or_else(not_found)?;
        let index = self
            .slot(id)
            .and_then(|slot| slot.outport_index(port))
            .ok_or_else(not_found)?;
        Ok(OutportId {
            processor: id,
            index,
        })
    }

    pub fn resolve_inport(&self, path: &str) -> Result<InportId, NetworkError> {
        let (processor, port) = Self::split_path(path)?;
        let not_found = || NetworkError::PortNotFound {
            path: path.to_string(),
            expected: PortDirection::Inport.as_str(),
        };
        let id = self.processor_id(processor).ok_or_else(not_found)?;
        let index = self
            .slot(id)
            .and_then(|slot| slot.inport_index(port))
            .ok_or_else(not_found)?;
        Ok(InportId {
            processor: id,
            index,
        })
    }

    pub(crate) fn outport(&self, id: OutportId) -> Option<&Outport> {
        self.slot(id.processor)?.outports.get(id.index)
    }

    fn outport_mut(&mut self, id: OutportId) -> Option<&mut Outport> {
        self.slot_mut(id.processor)?.outports.get_mut(id.index)
    }

    pub(crate) fn inport(&self, id: InportId) -> Option<&Inport> {
        self.slot(id.processor)?.inports.get(id.index)
    }

    fn inport_mut(&mut self, id: InportId) -> Option<&mut Inport> {
        self.slot_mut(id.processor)?.inports.get_mut(id.index)
    }

    // ----- cached order -------------------------------------------------------

    /// Stable topological order of every processor. Recomputed only after a
    /// structural change.
    pub fn topological_order(&mut self) -> &[ProcessorId] {
        if self.order.is_none() {
            self.order = Some(self.compute_topological_order());
        }
        self.order.as_deref().unwrap_or(&[])
    }
}

impl std::fmt::Debug for ProcessorNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorNetwork")
            .field("processors", &self.len())
            .field("connections", &self.connections.len())
            .field("modified", &self.modified)
            .finish()
    }
}
