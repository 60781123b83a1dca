// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Structural errors raised by mutating operations on a
/// [`ProcessorNetwork`](crate::network::ProcessorNetwork).
///
/// Every operation that returns one of these leaves the network exactly as it
/// was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("a processor with identifier '{0}' already exists in the network")]
    DuplicateIdentifier(String),

    #[error("processor '{0}' not found")]
    NotFound(String),

    #[error("port '{path}' not found (expected an {expected})")]
    PortNotFound { path: String, expected: &'static str },

    #[error("invalid processor identifier '{0}': must be non-empty and contain no '.'")]
    InvalidIdentifier(String),

    #[error("processor '{processor}' declares invalid port identifier '{port}'")]
    InvalidPortIdentifier { processor: String, port: String },

    #[error("processor '{processor}' declares port '{port}' more than once")]
    DuplicatePort { processor: String, port: String },

    #[error("invalid port path '{0}', expected '<processor>.<port>'")]
    InvalidPortPath(String),

    #[error("cannot connect '{outport}' ({outport_type}) to '{inport}' ({inport_type})")]
    TypeMismatch {
        outport: String,
        inport: String,
        outport_type: &'static str,
        inport_type: &'static str,
    },

    #[error("inport '{inport}' accepts at most {max} connection(s)")]
    MultiplicityExceeded { inport: String, max: usize },

    #[error("connecting '{outport}' to '{inport}' would create a cycle")]
    CycleDetected { outport: String, inport: String },

    #[error("'{outport}' is not connected to '{inport}'")]
    NotConnected { outport: String, inport: String },

    #[error("'{outport}' is already connected to '{inport}'")]
    AlreadyConnected { outport: String, inport: String },

    #[error("processor '{processor}' has no property '{path}'")]
    PropertyNotFound { processor: String, path: String },

    #[error("property '{processor}.{path}' expects a {expected} value, got {found}")]
    PropertyTypeMismatch {
        processor: String,
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("property '{processor}.{path}' is a composite and holds no value")]
    PropertyNotAssignable { processor: String, path: String },

    #[error("network command queue is closed")]
    HandleDisconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_ports() {
        let err = NetworkError::CycleDetected {
            outport: "b.out".into(),
            inport: "a.in".into(),
        };
        assert_eq!(
            err.to_string(),
            "connecting 'b.out' to 'a.in' would create a cycle"
        );

        let err = NetworkError::MultiplicityExceeded {
            inport: "sum.values".into(),
            max: 2,
        };
        assert!(err.to_string().contains("at most 2"));

        let err = NetworkError::InvalidPortIdentifier {
            processor: "s".into(),
            port: "in.put".into(),
        };
        assert!(err.to_string().contains("'in.put'"));
    }
}
