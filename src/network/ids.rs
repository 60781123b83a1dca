//! Lightweight handles into the network's processor arena.

use std::fmt;

/// Index of a processor slot in a [`ProcessorNetwork`](super::ProcessorNetwork).
///
/// Ids are handed out in registration order and never reused, so comparing
/// two ids also compares the order in which their processors were added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessorId(u32);

impl ProcessorId {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An inport, addressed by owning processor and declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InportId {
    pub processor: ProcessorId,
    pub index: usize,
}

/// An outport, addressed by owning processor and declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutportId {
    pub processor: ProcessorId,
    pub index: usize,
}

/// A directed edge from an outport to an inport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortConnection {
    pub source: OutportId,
    pub destination: InportId,
}
