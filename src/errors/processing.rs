// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failure reported by (or captured around) a processor's `process()` call.
///
/// The evaluator turns any of these into the processor's `Error` state; the
/// rest of the pass is unaffected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("{0}")]
    Failed(String),

    #[error("inport '{0}' has no data")]
    MissingInput(String),

    #[error("inport '{port}' does not carry {expected}")]
    InputTypeMismatch { port: String, expected: &'static str },

    #[error("outport '{port}' carries {expected}, not {found}")]
    OutputTypeMismatch {
        port: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("processor has no port named '{0}'")]
    UnknownPort(String),

    #[error("property '{path}': {reason}")]
    Property { path: String, reason: String },

    #[error("no active rendering context available")]
    ContextUnavailable,

    #[error("process() panicked: {0}")]
    Panicked(String),

    #[error("background job failed: {0}")]
    Pool(#[from] PoolError),
}

impl ProcessingError {
    pub fn failed(message: impl Into<String>) -> Self {
        ProcessingError::Failed(message.into())
    }
}

/// Outcome of a background job that did not produce a value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("{0}")]
    Failed(String),

    #[error("work function panicked: {0}")]
    Panicked(String),

    #[error("job was cancelled")]
    Cancelled,

    #[error("job result channel closed before a result was delivered")]
    Disconnected,

    #[error("failed to start thread pool: {0}")]
    Startup(String),
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_convert_into_processing_errors() {
        let err: ProcessingError = PoolError::Panicked("boom".into()).into();
        assert_eq!(
            err.to_string(),
            "background job failed: work function panicked: boom"
        );
    }

    #[test]
    fn panic_message_handles_both_payload_kinds() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
