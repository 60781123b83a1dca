// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The processor network: ports, properties, connections and the graph
//! that owns them.

mod commands;
mod document;
mod ids;
mod invalidation;
pub mod port;
mod processor_network;
mod property;
mod traversal;

pub use commands::{NetworkCommand, NetworkHandle};
pub use document::{
    ConnectionEntry, LoadReport, LoadWarning, NetworkDocument, ProcessorEntry, FORMAT_VERSION,
};
pub use ids::{InportId, OutportId, PortConnection, ProcessorId};
pub use invalidation::InvalidationLevel;
pub use port::{DataType, Multiplicity, PortData, PortDescriptor, PortDirection};
pub use processor_network::{ProcessorNetwork, ProcessorState};
pub(crate) use processor_network::ProcessorSlot;
pub use property::{find_property, Property, PropertyValue};
pub use traversal::{Direction, VisitPattern};

#[cfg(test)]
mod tests;
