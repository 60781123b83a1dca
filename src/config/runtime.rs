// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::EngineConfig;
use crate::engine::{NetworkEvaluator, PassReport, RunSummary, ThreadPool};
use crate::errors::PoolError;
use crate::network::ProcessorNetwork;
use crate::services::Services;
use std::sync::Arc;
use std::time::Duration;

/// An empty network together with the evaluator that drives it.
#[derive(Debug)]
pub struct EngineRuntime {
    pub network: ProcessorNetwork,
    pub evaluator: NetworkEvaluator,
}

impl EngineRuntime {
    pub fn evaluate(&mut self) -> PassReport {
        self.evaluator.evaluate(&mut self.network)
    }

    pub fn run_until_idle(&mut self) -> RunSummary {
        self.evaluator.run_until_idle(&mut self.network)
    }

    /// Drop the network first so its processors cancel their jobs, then
    /// stop the pool.
    pub fn shutdown(self, timeout: Duration) {
        let EngineRuntime { network, evaluator } = self;
        drop(network);
        evaluator.shutdown(timeout);
    }
}

/// Runtime builder - assembles pool, services and evaluator from configuration.
///
/// # Examples
///
/// ```
/// use procnet::config::{EngineConfig, RuntimeBuilder};
///
/// let config = EngineConfig::default();
/// let mut runtime = RuntimeBuilder::from_config(&config).unwrap();
///
/// assert!(runtime.network.is_empty());
/// assert!(runtime.evaluate().is_empty());
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build a runtime with freshly initialised services.
    pub fn from_config(cfg: &EngineConfig) -> Result<EngineRuntime, PoolError> {
        Self::with_services(cfg, Services::init())
    }

    /// Build a runtime around services the host prepared, e.g. with an
    /// active rendering context.
    pub fn with_services(cfg: &EngineConfig, services: Services) -> Result<EngineRuntime, PoolError> {
        let pool = ThreadPool::new(&cfg.pool.to_options())?;
        let evaluator = NetworkEvaluator::new(pool, Arc::new(services), cfg.evaluator.to_options());
        Ok(EngineRuntime {
            network: ProcessorNetwork::new(),
            evaluator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::processors::ConstantSource;
    use crate::services::HeadlessContext;

    #[test]
    fn evaluator_options_come_from_config() {
        let cfg: EngineConfig =
            serde_yaml::from_str("evaluator:\n  max_passes: 3\n  idle_timeout_ms: 20\n").unwrap();
        let runtime = RuntimeBuilder::from_config(&cfg).unwrap();

        assert_eq!(runtime.evaluator.options().max_passes, 3);
        assert_eq!(runtime.evaluator.options().idle_timeout, Duration::from_millis(20));
    }

    #[test]
    fn supplied_services_reach_the_evaluator() {
        let services = Services::init().with_active_context(Arc::new(HeadlessContext::default()));
        let runtime = RuntimeBuilder::with_services(&EngineConfig::default(), services).unwrap();

        assert!(runtime.evaluator.services().require_context().is_ok());
    }

    #[test]
    fn runtime_runs_its_network() {
        let mut runtime = RuntimeBuilder::from_config(&EngineConfig::default()).unwrap();
        runtime
            .network
            .add_processor("c", Box::new(ConstantSource::new(4.0)))
            .unwrap();

        let summary = runtime.run_until_idle();

        assert_eq!(summary.completed, 1);
        assert_eq!(*runtime.network.outport_data::<f64>("c.value").unwrap(), 4.0);
        runtime.shutdown(Duration::from_millis(100));
    }
}
