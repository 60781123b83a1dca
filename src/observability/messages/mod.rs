// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `engine` - evaluator passes and run loop events
//! * `network` - processor network mutation and persistence events
//! * `pool` - thread pool and background job events
//! * `processor` - per-processor evaluation outcomes
//!
//! # Usage Pattern
//!
//! ```rust
//! use procnet::observability::messages::engine::PassStarted;
//! use procnet::observability::messages::StructuredLog;
//!
//! let msg = PassStarted {
//!     pass: 1,
//!     processor_count: 5,
//! };
//!
//! let _span = msg.span("evaluate").entered();
//! msg.log();
//! ```

use tracing::Span;

pub mod engine;
pub mod network;
pub mod pool;
pub mod processor;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// A span carrying the message's fields, for work done on its behalf.
    fn span(&self, name: &str) -> Span;
}
