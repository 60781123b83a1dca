use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a pending change, totally ordered.
///
/// Propagation always keeps the maximum of the stored and incoming level; a
/// level only drops back to [`Valid`](InvalidationLevel::Valid) when the
/// owning processor completes a `process()` call.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationLevel {
    #[default]
    Valid,
    InvalidOutput,
    InvalidResources,
}

impl InvalidationLevel {
    pub fn is_valid(self) -> bool {
        self == InvalidationLevel::Valid
    }

    /// Raise `self` to `level` if that is an increase. Returns whether the
    /// stored level changed.
    pub fn raise(&mut self, level: InvalidationLevel) -> bool {
        if level > *self {
            *self = level;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for InvalidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvalidationLevel::Valid => "valid",
            InvalidationLevel::InvalidOutput => "invalid_output",
            InvalidationLevel::InvalidResources => "invalid_resources",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::InvalidationLevel::*;

    #[test]
    fn levels_are_totally_ordered() {
        assert!(Valid < InvalidOutput);
        assert!(InvalidOutput < InvalidResources);
        assert_eq!(InvalidOutput.max(InvalidResources), InvalidResources);
    }

    #[test]
    fn raise_only_increases() {
        let test_cases = vec![
            (Valid, InvalidOutput, true, InvalidOutput),
            (InvalidOutput, InvalidOutput, false, InvalidOutput),
            (InvalidResources, InvalidOutput, false, InvalidResources),
            (InvalidOutput, Valid, false, InvalidOutput),
        ];

        for (start, incoming, changed, expected) in test_cases {
            let mut level = start;
            assert_eq!(level.raise(incoming), changed, "{start} <- {incoming}");
            assert_eq!(level, expected);
        }
    }
}
