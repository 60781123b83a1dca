// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

/// Errors produced while loading an engine configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("configuration validation failed:\n{}", join_lines(.0))]
    Invalid(Vec<ValidationError>),
}

/// A single out-of-range or inconsistent configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A numeric setting must be at least `minimum`
    BelowMinimum {
        field: &'static str,
        value: u64,
        minimum: u64,
    },
    /// A string setting may not be empty
    Empty { field: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::BelowMinimum {
                field,
                value,
                minimum,
            } => {
                write!(f, "'{}' is {} but must be at least {}", field, value, minimum)
            }
            ValidationError::Empty { field } => write!(f, "'{}' may not be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
