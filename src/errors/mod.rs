// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod network;
mod persistence;
mod processing;

pub use config::{ConfigError, ValidationError};
pub use network::NetworkError;
pub use persistence::{FactoryError, PersistenceError};
pub use processing::{PoolError, ProcessingError};

pub(crate) use processing::panic_message;
