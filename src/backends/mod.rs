// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Processor implementations.
//!
//! # Local
//! In-process processors covering the common shapes of a network:
//! - **Sources**: `ConstantSource` publishes its `value` property
//! - **Transforms**: `Scale`, `Add`, `Sum`, `Format`
//! - **Pooled**: `PooledScale` and `PooledSum` hand their work to the
//!   evaluator's thread pool and report progress while it runs
//! - **Sinks**: `Recorder` keeps a history and registers resource usage
//!
//! Every local processor is reachable by class identifier through
//! [`local::ProcessorFactory`], which is what network documents use to
//! rebuild a saved network.
//!
//! # Stub (test-only)
//! Processors that log their calls, fail on demand, panic, or refuse to
//! become ready. Not available in production builds.
//!
//! ```rust
//! use procnet::backends::local::ProcessorFactory;
//!
//! let factory = ProcessorFactory::with_builtins();
//! let processor = factory.create("scale")?;
//! assert_eq!(processor.class_identifier(), "scale");
//! # Ok::<(), procnet::errors::FactoryError>(())
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
