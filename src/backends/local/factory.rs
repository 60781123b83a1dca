// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use super::processors::*;
use crate::errors::FactoryError;
use crate::traits::Processor;

type Constructor = Box<dyn Fn() -> Box<dyn Processor> + Send + Sync>;

/// Builds processors from class identifier strings.
///
/// Network documents and the CLI refer to processors only by class; the
/// factory maps each class to a constructor producing a processor with its
/// default property values.
///
/// Built-in classes (see [`ProcessorFactory::with_builtins`]):
/// - "constant" -> ConstantSource
/// - "scale" -> Scale
/// - "add" -> Add
/// - "sum" -> Sum (unbounded multi inport)
/// - "format" -> Format
/// - "pooled_scale" -> PooledScale
/// - "pooled_sum" -> PooledSum
/// - "recorder" -> Recorder
#[derive(Default)]
pub struct ProcessorFactory {
    constructors: BTreeMap<String, Constructor>,
}

impl ProcessorFactory {
    /// An empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register("constant", || Box::new(ConstantSource::new(0.0)));
        factory.register("scale", || Box::new(Scale::new(1.0)));
        factory.register("add", || Box::new(Add::new()));
        factory.register("sum", || Box::new(Sum::new()));
        factory.register("format", || Box::new(Format::new()));
        factory.register("pooled_scale", || Box::new(PooledScale::default()));
        factory.register("pooled_sum", || Box::new(PooledSum::default()));
        factory.register("recorder", || Box::new(Recorder::new()));
        factory
    }

    /// Register (or replace) the constructor for `class`.
    pub fn register<F>(&mut self, class: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Processor> + Send + Sync + 'static,
    {
        self.constructors.insert(class.into(), Box::new(constructor));
    }

    pub fn create(&self, class: &str) -> Result<Box<dyn Processor>, FactoryError> {
        self.constructors
            .get(class)
            .map(|constructor| constructor())
            .ok_or_else(|| FactoryError::UnknownClass(class.to_string()))
    }

    /// Registered classes in sorted order.
    pub fn classes(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    pub fn is_registered(&self, class: &str) -> bool {
        self.constructors.contains_key(class)
    }
}
