// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic the engine emits is a message struct with a `Display`
//! implementation and a [`StructuredLog`](messages::StructuredLog)
//! implementation that picks the level and the structured fields. Call
//! sites never format log strings themselves.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - evaluation passes and the run loop
//! * `messages::network` - structural changes, command queue, documents
//! * `messages::pool` - background pool lifecycle and jobs
//! * `messages::processor` - per-processor outcomes inside a pass
//!
//! # Usage
//!
//! ```rust
//! use procnet::observability::messages::processor::ProcessorFailed;
//! use procnet::observability::messages::StructuredLog;
//!
//! let msg = ProcessorFailed {
//!     processor_id: "scale",
//!     error: "missing input 'value'",
//! };
//!
//! msg.log();
//! ```

pub mod messages;
