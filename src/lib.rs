// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // processor implementations + factory
pub mod config;     // engine config + runtime builder
pub mod engine;     // evaluator, context, pool
pub mod errors;     // error handling
pub mod network;    // processor graph, ports, properties, documents
pub mod observability;
pub mod services;   // injected process-wide services
pub mod traits;     // processor abstraction
