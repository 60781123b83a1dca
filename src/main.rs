// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use procnet::backends::local::processors::Recorder;
use procnet::backends::local::ProcessorFactory;
use procnet::config::{load_and_validate_config, EngineConfig, RuntimeBuilder};
use procnet::engine::RunOutcome;
use procnet::network::{NetworkDocument, PortDirection, ProcessorNetwork};
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: procnet <network.yaml|network.json> [--config <engine.yaml>] [--save <out.yaml|out.json>]";

struct Args {
    network: String,
    config: Option<String>,
    save: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut network = None;
    let mut config = None;
    let mut save = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(args.next().context("--config needs a path")?),
            "--save" => save = Some(args.next().context("--save needs a path")?),
            "-h" | "--help" => bail!(USAGE),
            _ if network.is_none() => network = Some(arg),
            _ => bail!("unexpected argument '{}'\n{}", arg, USAGE),
        }
    }
    Ok(Args {
        network: network.context(USAGE)?,
        config,
        save,
    })
}

fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.get_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Render published outport data for the value types the built-in
/// processors produce.
fn render(network: &ProcessorNetwork, path: &str) -> Option<String> {
    if let Some(value) = network.outport_data::<f64>(path) {
        return Some(value.to_string());
    }
    if let Some(value) = network.outport_data::<String>(path) {
        return Some(format!("{:?}", value));
    }
    if let Some(value) = network.outport_data::<i64>(path) {
        return Some(value.to_string());
    }
    network
        .outport_data::<bool>(path)
        .map(|value| value.to_string())
}

fn print_outports(network: &ProcessorNetwork) {
    for id in network.processor_ids() {
        let Some(identifier) = network.identifier(id) else {
            continue;
        };
        let class = network.class_identifier(id).unwrap_or("?");
        let state = network
            .processor_state(id)
            .map(|state| format!("{:?}", state))
            .unwrap_or_default();
        println!("{} ({}) {}", identifier, class, state);

        // Sinks have no outports to show.
        if let Some(last) = network.processor::<Recorder>(identifier).and_then(Recorder::last) {
            println!("  last recorded = {}", last);
        }

        for descriptor in network.port_descriptors(id) {
            if descriptor.direction != PortDirection::Outport {
                continue;
            }
            let path = format!("{}.{}", identifier, descriptor.identifier);
            let value = render(network, &path).unwrap_or_else(|| match network.outport_level(&path) {
                Some(level) if level.is_valid() => format!("<{}>", descriptor.data_type.name()),
                _ => "<no data>".to_string(),
            });
            println!("  {} = {}", descriptor.identifier, value);
        }
    }
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => load_and_validate_config(path)
            .with_context(|| format!("loading engine config '{}'", path))?,
        None => EngineConfig::default(),
    };
    init_tracing(&config);

    let document = NetworkDocument::load(&args.network)
        .with_context(|| format!("loading network '{}'", args.network))?;

    let mut runtime = RuntimeBuilder::from_config(&config)?;
    let report = runtime
        .network
        .load_document(&document, &ProcessorFactory::with_builtins())?;
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }

    let summary = runtime.run_until_idle();
    println!(
        "{} passes, {} processors completed, {} failed ({:?})\n",
        summary.passes,
        summary.completed,
        summary.failed.len(),
        summary.duration
    );
    print_outports(&runtime.network);

    if let Some(path) = &args.save {
        runtime
            .network
            .to_document()
            .save(path)
            .with_context(|| format!("saving network to '{}'", path))?;
    }

    let outcome = summary.outcome;
    runtime.shutdown(Duration::from_millis(
        config.evaluator.get_idle_timeout_ms(),
    ));
    match outcome {
        RunOutcome::Idle => Ok(()),
        RunOutcome::TimedOut => bail!("network did not become idle: a pool job timed out"),
        RunOutcome::PassLimit => bail!("network did not become idle within the pass limit"),
    }
}
