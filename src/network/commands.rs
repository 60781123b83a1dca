//! Deferred mutations for the network thread.
//!
//! Nothing outside the network thread may touch a [`ProcessorNetwork`]
//! directly. Pool workers, processors in the middle of a pass, and host code
//! on other threads instead send [`NetworkCommand`]s through a cloneable
//! [`NetworkHandle`]; the network applies them at the start of the next
//! evaluation pass.

use super::ids::ProcessorId;
use super::invalidation::InvalidationLevel;
use super::property::PropertyValue;
use super::ProcessorNetwork;
use crate::errors::NetworkError;
use crate::traits::Processor;
use crossbeam_channel::Sender;
use std::fmt;

pub enum NetworkCommand {
    AddProcessor {
        identifier: String,
        processor: Box<dyn Processor>,
    },
    RemoveProcessor(String),
    AddConnection {
        source: String,
        destination: String,
    },
    RemoveConnection {
        source: String,
        destination: String,
    },
    SetProperty {
        processor: String,
        path: String,
        value: PropertyValue,
    },
    Invalidate {
        processor: String,
        level: InvalidationLevel,
    },
    /// A background job owned by this processor delivered its result.
    JobFinished(ProcessorId),
    /// Arbitrary work to run with exclusive access to the network.
    Run(Box<dyn FnOnce(&mut ProcessorNetwork) + Send>),
}

impl fmt::Debug for NetworkCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkCommand::AddProcessor { identifier, processor } => f
                .debug_struct("AddProcessor")
                .field("identifier", identifier)
                .field("class", &processor.class_identifier())
                .finish(),
            NetworkCommand::RemoveProcessor(identifier) => {
                f.debug_tuple("RemoveProcessor").field(identifier).finish()
            }
            NetworkCommand::AddConnection { source, destination } => f
                .debug_struct("AddConnection")
                .field("source", source)
                .field("destination", destination)
                .finish(),
            NetworkCommand::RemoveConnection { source, destination } => f
                .debug_struct("RemoveConnection")
                .field("source", source)
                .field("destination", destination)
                .finish(),
            NetworkCommand::SetProperty {
                processor,
                path,
                value,
            } => f
                .debug_struct("SetProperty")
                .field("processor", processor)
                .field("path", path)
                .field("value", value)
                .finish(),
            NetworkCommand::Invalidate { processor, level } => f
                .debug_struct("Invalidate")
                .field("processor", processor)
                .field("level", level)
                .finish(),
            NetworkCommand::JobFinished(id) => f.debug_tuple("JobFinished").field(id).finish(),
            NetworkCommand::Run(_) => f.write_str("Run(..)"),
        }
    }
}

impl NetworkCommand {
    pub fn name(&self) -> &'static str {
        match self {
            NetworkCommand::AddProcessor { .. } => "add_processor",
            NetworkCommand::RemoveProcessor(_) => "remove_processor",
            NetworkCommand::AddConnection { .. } => "add_connection",
            NetworkCommand::RemoveConnection { .. } => "remove_connection",
            NetworkCommand::SetProperty { .. } => "set_property",
            NetworkCommand::Invalidate { .. } => "invalidate",
            NetworkCommand::JobFinished(_) => "job_finished",
            NetworkCommand::Run(_) => "run",
        }
    }
}

/// Thread-safe sender for [`NetworkCommand`]s.
#[derive(Debug, Clone)]
pub struct NetworkHandle {
    sender: Sender<NetworkCommand>,
}

impl NetworkHandle {
    pub(crate) fn new(sender: Sender<NetworkCommand>) -> Self {
        Self { sender }
    }

    pub fn send(&self, command: NetworkCommand) -> Result<(), NetworkError> {
        self.sender
            .send(command)
            .map_err(|_| NetworkError::HandleDisconnected)
    }

    pub fn add_processor(
        &self,
        identifier: impl Into<String>,
        processor: Box<dyn Processor>,
    ) -> Result<(), NetworkError> {
        self.send(NetworkCommand::AddProcessor {
            identifier: identifier.into(),
            processor,
        })
    }

    pub fn remove_processor(&self, identifier: impl Into<String>) -> Result<(), NetworkError> {
        self.send(NetworkCommand::RemoveProcessor(identifier.into()))
    }

    pub fn add_connection(
        &self,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<(), NetworkError> {
        self.send(NetworkCommand::AddConnection {
            source: source.into(),
            destination: destination.into(),
        })
    }

    pub fn remove_connection(
        &self,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<(), NetworkError> {
        self.send(NetworkCommand::RemoveConnection {
            source: source.into(),
            destination: destination.into(),
        })
    }

    pub fn set_property(
        &self,
        processor: impl Into<String>,
        path: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), NetworkError> {
        self.send(NetworkCommand::SetProperty {
            processor: processor.into(),
            path: path.into(),
            value: value.into(),
        })
    }

    pub fn invalidate(
        &self,
        processor: impl Into<String>,
        level: InvalidationLevel,
    ) -> Result<(), NetworkError> {
        self.send(NetworkCommand::Invalidate {
            processor: processor.into(),
            level,
        })
    }

    pub fn run<F>(&self, f: F) -> Result<(), NetworkError>
    where
        F: FnOnce(&mut ProcessorNetwork) + Send + 'static,
    {
        self.send(NetworkCommand::Run(Box::new(f)))
    }
}
