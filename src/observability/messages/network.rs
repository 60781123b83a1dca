// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for processor network changes and persistence.
//!
//! This module contains message types for logging events related to:
//! * Processors entering and leaving the network
//! * Connections being made and broken
//! * Queued commands the network refused to apply
//! * Loading network documents

use crate::errors::NetworkError;
use crate::network::LoadWarning;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A processor was added to the network.
///
/// # Log Level
/// `debug!` - Structural change
///
/// # Example
/// ```
/// use procnet::observability::messages::network::ProcessorAdded;
///
/// let msg = ProcessorAdded {
///     processor_id: "scale",
///     class: "scale",
///     inports: 1,
///     outports: 1,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ProcessorAdded<'a> {
    pub processor_id: &'a str,
    pub class: &'a str,
    pub inports: usize,
    pub outports: usize,
}

impl Display for ProcessorAdded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' ({}) added: {} inports, {} outports",
            self.processor_id, self.class, self.inports, self.outports
        )
    }
}

impl StructuredLog for ProcessorAdded<'_> {
    fn log(&self) {
        tracing::debug!(
            processor_id = self.processor_id,
            class = self.class,
            inports = self.inports,
            outports = self.outports,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "processor_added",
            span_name = name,
            processor_id = self.processor_id,
            class = self.class,
        )
    }
}

/// A processor was removed from the network.
///
/// # Log Level
/// `debug!` - Structural change
pub struct ProcessorRemoved<'a> {
    pub processor_id: &'a str,
    pub class: &'a str,
}

impl Display for ProcessorRemoved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processor '{}' ({}) removed", self.processor_id, self.class)
    }
}

impl StructuredLog for ProcessorRemoved<'_> {
    fn log(&self) {
        tracing::debug!(
            processor_id = self.processor_id,
            class = self.class,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "processor_removed",
            span_name = name,
            processor_id = self.processor_id,
        )
    }
}

/// An outport was connected to an inport.
///
/// # Log Level
/// `debug!` - Structural change
pub struct ConnectionAdded<'a> {
    pub source: &'a str,
    pub destination: &'a str,
}

impl Display for ConnectionAdded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Connected '{}' -> '{}'", self.source, self.destination)
    }
}

impl StructuredLog for ConnectionAdded<'_> {
    fn log(&self) {
        tracing::debug!(
            source = self.source,
            destination = self.destination,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "connection_added",
            span_name = name,
            source = self.source,
            destination = self.destination,
        )
    }
}

/// A connection was removed.
///
/// # Log Level
/// `debug!` - Structural change
pub struct ConnectionRemoved<'a> {
    pub source: &'a str,
    pub destination: &'a str,
}

impl Display for ConnectionRemoved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Disconnected '{}' -> '{}'", self.source, self.destination)
    }
}

impl StructuredLog for ConnectionRemoved<'_> {
    fn log(&self) {
        tracing::debug!(
            source = self.source,
            destination = self.destination,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "connection_removed",
            span_name = name,
            source = self.source,
            destination = self.destination,
        )
    }
}

/// A queued command could not be applied. The network is unchanged.
///
/// # Log Level
/// `warn!` - The sender will not see the error otherwise
///
/// # Example
/// ```
/// use procnet::errors::NetworkError;
/// use procnet::observability::messages::network::CommandRejected;
///
/// let error = NetworkError::NotFound("missing".to_string());
/// let msg = CommandRejected {
///     command: "remove_processor",
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct CommandRejected<'a> {
    pub command: &'a str,
    pub error: &'a NetworkError,
}

impl Display for CommandRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Queued command '{}' rejected: {}", self.command, self.error)
    }
}

impl StructuredLog for CommandRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            command = self.command,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "command_rejected",
            span_name = name,
            command = self.command,
        )
    }
}

/// A network document finished loading.
///
/// # Log Level
/// `info!` when clean, `warn!` when anything was skipped
pub struct DocumentLoaded {
    pub processors: usize,
    pub connections: usize,
    pub warnings: usize,
}

impl Display for DocumentLoaded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Network document loaded: {} processors, {} connections, {} warnings",
            self.processors, self.connections, self.warnings
        )
    }
}

impl StructuredLog for DocumentLoaded {
    fn log(&self) {
        if self.warnings == 0 {
            tracing::info!(
                processors = self.processors,
                connections = self.connections,
                "{}", self
            );
        } else {
            tracing::warn!(
                processors = self.processors,
                connections = self.connections,
                warnings = self.warnings,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "document_loaded",
            span_name = name,
            processors = self.processors,
            connections = self.connections,
        )
    }
}

/// One part of a document was skipped while loading.
///
/// # Log Level
/// `warn!` - Partial load
pub struct LoadWarningEmitted<'a> {
    pub warning: &'a LoadWarning,
}

impl Display for LoadWarningEmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Network document: {}", self.warning)
    }
}

impl StructuredLog for LoadWarningEmitted<'_> {
    fn log(&self) {
        tracing::warn!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("load_warning", span_name = name, warning = %self.warning)
    }
}
