// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Fatal errors while reading or writing a network document. Unresolved
/// references inside an otherwise readable document are reported as
/// [`LoadWarning`](crate::network::LoadWarning)s instead.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Raised by the processor factory.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactoryError {
    #[error("unknown processor class '{0}'")]
    UnknownClass(String),
}
