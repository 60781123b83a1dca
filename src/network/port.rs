//! Port descriptors and the runtime state the network keeps per port.
//!
//! Processors describe their ports with [`PortDescriptor`]s; the network turns
//! those into [`Inport`] / [`Outport`] records that live next to the processor
//! in its arena slot. Data travels between ports as [`PortData`], a shared
//! handle that every connected inport reads without copying.

use super::ids::{InportId, OutportId};
use super::invalidation::InvalidationLevel;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Immutable, shared port payload. A consumer that needs to mutate it clones
/// the underlying value first.
pub type PortData = Arc<dyn Any + Send + Sync>;

/// Runtime tag for the type a port carries.
#[derive(Clone, Copy)]
pub struct DataType {
    id: TypeId,
    name: &'static str,
}

impl DataType {
    pub fn of<T: Any + Send + Sync>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Whether `data` holds a value of this type.
    pub fn matches(&self, data: &PortData) -> bool {
        (**data).type_id() == self.id
    }
}

impl PartialEq for DataType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DataType {}

impl fmt::Debug for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Inport,
    Outport,
}

impl PortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            PortDirection::Inport => "inport",
            PortDirection::Outport => "outport",
        }
    }
}

/// How many connections an inport accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Multiplicity {
    #[default]
    Single,
    /// Ordered list of connections, optionally bounded.
    Multi { max: Option<usize> },
}

impl Multiplicity {
    pub fn max_connections(self) -> Option<usize> {
        match self {
            Multiplicity::Single => Some(1),
            Multiplicity::Multi { max } => max,
        }
    }
}

/// Declaration of a single port, as returned by `Processor::ports`.
#[derive(Debug, Clone, PartialEq)]
pub struct PortDescriptor {
    pub identifier: String,
    pub direction: PortDirection,
    pub data_type: DataType,
    pub multiplicity: Multiplicity,
    pub optional: bool,
}

impl PortDescriptor {
    pub fn inport<T: Any + Send + Sync>(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            direction: PortDirection::Inport,
            data_type: DataType::of::<T>(),
            multiplicity: Multiplicity::Single,
            optional: false,
        }
    }

    pub fn outport<T: Any + Send + Sync>(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            direction: PortDirection::Outport,
            data_type: DataType::of::<T>(),
            multiplicity: Multiplicity::Multi { max: None },
            optional: false,
        }
    }

    /// The inport may stay unconnected without blocking readiness.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Accept several connections, up to `max` when given.
    pub fn multi(mut self, max: Option<usize>) -> Self {
        self.multiplicity = Multiplicity::Multi { max };
        self
    }
}

#[derive(Debug)]
pub(crate) struct Inport {
    pub descriptor: PortDescriptor,
    /// Connected outports in connection order.
    pub connections: Vec<OutportId>,
    pub level: InvalidationLevel,
    /// Set when an upstream outport publishes, cleared when the owner completes.
    pub changed: bool,
}

impl Inport {
    pub fn new(descriptor: PortDescriptor) -> Self {
        Self {
            descriptor,
            connections: Vec::new(),
            level: InvalidationLevel::Valid,
            changed: false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Outport {
    pub descriptor: PortDescriptor,
    pub connections: Vec<InportId>,
    pub level: InvalidationLevel,
    pub data: Option<PortData>,
}

impl Outport {
    pub fn new(descriptor: PortDescriptor) -> Self {
        Self {
            descriptor,
            connections: Vec::new(),
            level: InvalidationLevel::InvalidOutput,
            data: None,
        }
    }

    /// Valid and holding data: what a connected inport needs to be ready.
    pub fn is_ready(&self) -> bool {
        self.level.is_valid() && self.data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_compares_by_type_id() {
        assert_eq!(DataType::of::<f64>(), DataType::of::<f64>());
        assert_ne!(DataType::of::<f64>(), DataType::of::<String>());
        assert!(DataType::of::<String>().is::<String>());
    }

    #[test]
    fn data_type_matches_port_data() {
        let data: PortData = Arc::new(1.5_f64);
        assert!(DataType::of::<f64>().matches(&data));
        assert!(!DataType::of::<i64>().matches(&data));
    }

    #[test]
    fn descriptor_builders() {
        let port = PortDescriptor::inport::<f64>("values").multi(Some(3)).optional();
        assert_eq!(port.direction, PortDirection::Inport);
        assert_eq!(port.multiplicity.max_connections(), Some(3));
        assert!(port.optional);

        let port = PortDescriptor::inport::<f64>("value");
        assert_eq!(port.multiplicity.max_connections(), Some(1));
    }
}
