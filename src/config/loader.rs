// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_MAX_BLOCKING_THREADS, DEFAULT_MAX_PASSES,
    DEFAULT_POOL_THREAD_NAME, DEFAULT_SLOW_PROCESSOR_WARN_MS, DEFAULT_WORKER_THREADS,
};
use crate::engine::{EvaluatorOptions, PoolOptions};
use crate::errors::{ConfigError, ValidationError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Engine configuration.
///
/// Every section and every value is optional; anything left out falls back
/// to the built-in defaults in [`consts`](crate::config::consts).
///
/// # Example
/// ```yaml
/// pool:
///   worker_threads: 1
///   max_blocking_threads: 8
///   thread_name: procnet-pool
/// evaluator:
///   idle_timeout_ms: 5000
///   max_passes: 1000
///   slow_processor_warn_ms: 250
/// logging:
///   filter: "procnet=debug,info"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Background pool sizing.
#[derive(Debug, Default, Deserialize)]
pub struct PoolConfig {
    pub worker_threads: Option<usize>,
    pub max_blocking_threads: Option<usize>,
    pub thread_name: Option<String>,
}

impl PoolConfig {
    pub fn get_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or(DEFAULT_WORKER_THREADS)
    }

    pub fn get_max_blocking_threads(&self) -> usize {
        self.max_blocking_threads
            .unwrap_or(DEFAULT_MAX_BLOCKING_THREADS)
    }

    pub fn get_thread_name(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(DEFAULT_POOL_THREAD_NAME)
    }

    pub fn to_options(&self) -> PoolOptions {
        PoolOptions {
            worker_threads: self.get_worker_threads(),
            max_blocking_threads: self.get_max_blocking_threads(),
            thread_name: self.get_thread_name().to_string(),
        }
    }
}

/// Evaluation loop tuning.
#[derive(Debug, Default, Deserialize)]
pub struct EvaluatorConfig {
    pub idle_timeout_ms: Option<u64>,
    pub max_passes: Option<u64>,
    pub slow_processor_warn_ms: Option<u64>,
}

impl EvaluatorConfig {
    pub fn get_idle_timeout_ms(&self) -> u64 {
        self.idle_timeout_ms.unwrap_or(DEFAULT_IDLE_TIMEOUT_MS)
    }

    pub fn get_max_passes(&self) -> u64 {
        self.max_passes.unwrap_or(DEFAULT_MAX_PASSES)
    }

    pub fn get_slow_processor_warn_ms(&self) -> u64 {
        self.slow_processor_warn_ms
            .unwrap_or(DEFAULT_SLOW_PROCESSOR_WARN_MS)
    }

    pub fn to_options(&self) -> EvaluatorOptions {
        EvaluatorOptions {
            idle_timeout: Duration::from_millis(self.get_idle_timeout_ms()),
            max_passes: self.get_max_passes(),
            slow_processor_warn: Duration::from_millis(self.get_slow_processor_warn_ms()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives. `RUST_LOG` wins when set.
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn get_filter(&self) -> &str {
        self.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

impl EngineConfig {
    /// Check value ranges, collecting every problem rather than the first.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut at_least = |field: &'static str, value: u64, minimum: u64| {
            if value < minimum {
                errors.push(ValidationError::BelowMinimum {
                    field,
                    value,
                    minimum,
                });
            }
        };

        at_least("pool.worker_threads", self.pool.get_worker_threads() as u64, 1);
        at_least(
            "pool.max_blocking_threads",
            self.pool.get_max_blocking_threads() as u64,
            1,
        );
        at_least("evaluator.idle_timeout_ms", self.evaluator.get_idle_timeout_ms(), 1);
        at_least("evaluator.max_passes", self.evaluator.get_max_passes(), 1);

        if self.pool.get_thread_name().trim().is_empty() {
            errors.push(ValidationError::Empty {
                field: "pool.thread_name",
            });
        }
        if self.logging.get_filter().trim().is_empty() {
            errors.push(ValidationError::Empty {
                field: "logging.filter",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Load a config from a YAML file. An empty file is the default config.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    let cfg: EngineConfig = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load a config from a YAML file and check its value ranges.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let cfg = load_config(path)?;
    cfg.validate().map_err(ConfigError::Invalid)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
pool:
  worker_threads: 2
  max_blocking_threads: 8
  thread_name: workers
evaluator:
  idle_timeout_ms: 100
  max_passes: 50
  slow_processor_warn_ms: 10
logging:
  filter: debug
"#;

        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.pool.get_worker_threads(), 2);
        assert_eq!(cfg.pool.get_max_blocking_threads(), 8);
        assert_eq!(cfg.pool.get_thread_name(), "workers");
        assert_eq!(cfg.evaluator.get_max_passes(), 50);
        assert_eq!(
            cfg.evaluator.to_options().idle_timeout,
            Duration::from_millis(100)
        );
        assert_eq!(cfg.logging.get_filter(), "debug");
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg: EngineConfig = serde_yaml::from_str("evaluator:\n  max_passes: 7\n").unwrap();

        assert_eq!(cfg.evaluator.get_max_passes(), 7);
        assert_eq!(cfg.evaluator.get_idle_timeout_ms(), DEFAULT_IDLE_TIMEOUT_MS);
        assert_eq!(cfg.pool.get_thread_name(), DEFAULT_POOL_THREAD_NAME);
        assert_eq!(cfg.pool.to_options().worker_threads, DEFAULT_WORKER_THREADS);
        assert_eq!(cfg.logging.get_filter(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn load_empty_file_is_default() {
        let file = write_config("");
        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(cfg.evaluator.get_max_passes(), DEFAULT_MAX_PASSES);
    }

    #[test]
    fn load_and_validate_rejects_out_of_range_values() {
        let file = write_config(
            r#"
pool:
  worker_threads: 0
  thread_name: ""
evaluator:
  max_passes: 0
"#,
        );

        let err = load_and_validate_config(file.path()).unwrap_err();
        let ConfigError::Invalid(errors) = err else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::BelowMinimum {
            field: "pool.worker_threads",
            value: 0,
            minimum: 1,
        }));
        assert!(errors.contains(&ValidationError::Empty {
            field: "pool.thread_name"
        }));
    }

    #[test]
    fn validation_message_lists_every_problem() {
        let file = write_config("evaluator:\n  idle_timeout_ms: 0\n  max_passes: 0\n");
        let message = load_and_validate_config(file.path()).unwrap_err().to_string();
        assert!(message.contains("evaluator.idle_timeout_ms"));
        assert!(message.contains("evaluator.max_passes"));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let file = write_config("pool: [not, a, map]\n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(dir.path().join("absent.yaml")),
            Err(ConfigError::Io(_))
        ));
    }
}
