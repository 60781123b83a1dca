// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Persisted form of a processor network.
//!
//! A [`NetworkDocument`] stores the format version, every processor (class,
//! identifier, property values, optional processor state) and every
//! connection as a pair of port paths. Loading resolves everything by
//! identifier; anything that cannot be resolved becomes a [`LoadWarning`]
//! and the rest of the document still loads.
//!
//! # Example
//! ```yaml
//! version: 1
//! processors:
//!   - class: constant
//!     identifier: source
//!     properties:
//!       value: 21.0
//!   - class: scale
//!     identifier: double
//!     properties:
//!       factor: 2.0
//! connections:
//!   - source: source.value
//!     destination: double.input
//! ```

use super::invalidation::InvalidationLevel;
use super::property::{collect_values, PropertyValue};
use super::ProcessorNetwork;
use crate::backends::local::ProcessorFactory;
use crate::errors::{NetworkError, PersistenceError};
use crate::observability::messages::network::{DocumentLoaded, LoadWarningEmitted};
use crate::observability::messages::StructuredLog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    pub version: u32,
    #[serde(default)]
    pub processors: Vec<ProcessorEntry>,
    #[serde(default)]
    pub connections: Vec<ConnectionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorEntry {
    pub class: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEntry {
    pub source: String,
    pub destination: String,
}

/// A non-fatal problem found while loading a document.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    OlderVersion { found: u32 },
    UnknownClass { identifier: String, class: String },
    ProcessorRejected { identifier: String, error: NetworkError },
    PropertyRejected { identifier: String, path: String, error: NetworkError },
    StateRejected { identifier: String, reason: String },
    ConnectionRejected { source: String, destination: String, error: NetworkError },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::OlderVersion { found } => {
                write!(f, "document version {} is older than {}; loading anyway", found, FORMAT_VERSION)
            }
            LoadWarning::UnknownClass { identifier, class } => {
                write!(f, "skipped processor '{}': unknown class '{}'", identifier, class)
            }
            LoadWarning::ProcessorRejected { identifier, error } => {
                write!(f, "skipped processor '{}': {}", identifier, error)
            }
            LoadWarning::PropertyRejected {
                identifier,
                path,
                error,
            } => write!(f, "ignored property '{}.{}': {}", identifier, path, error),
            LoadWarning::StateRejected { identifier, reason } => {
                write!(f, "ignored saved state of '{}': {}", identifier, reason)
            }
            LoadWarning::ConnectionRejected {
                source,
                destination,
                error,
            } => write!(f, "skipped connection '{}' -> '{}': {}", source, destination, error),
        }
    }
}

/// Everything that was skipped while loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub processors_loaded: usize,
    pub connections_loaded: usize,
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, warning: LoadWarning) {
        LoadWarningEmitted { warning: &warning }.log();
        self.warnings.push(warning);
    }
}

impl NetworkDocument {
    pub fn from_yaml_str(content: &str) -> Result<Self, PersistenceError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, PersistenceError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json_string(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a document; `.json` files are parsed as JSON, anything else as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let content = fs::read_to_string(path.as_ref())?;
        if is_json(path.as_ref()) {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let content = if is_json(path.as_ref()) {
            self.to_json_string()?
        } else {
            self.to_yaml_string()?
        };
        fs::write(path, content)?;
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

impl ProcessorNetwork {
    /// Snapshot the network: processors in registration order, connections
    /// in the order they were made.
    pub fn to_document(&self) -> NetworkDocument {
        let processors = self
            .processor_ids()
            .into_iter()
            .filter_map(|id| self.slot(id))
            .map(|slot| ProcessorEntry {
                class: slot.processor.class_identifier().to_string(),
                identifier: slot.identifier.clone(),
                properties: collect_values(&slot.properties),
                state: slot.processor.save_state(),
            })
            .collect();

        let connections = self
            .connections()
            .iter()
            .filter_map(|c| {
                Some(ConnectionEntry {
                    source: self.outport_path(c.source)?,
                    destination: self.inport_path(c.destination)?,
                })
            })
            .collect();

        NetworkDocument {
            version: FORMAT_VERSION,
            processors,
            connections,
        }
    }

    /// Add the contents of `document` to this network.
    ///
    /// Only a document newer than [`FORMAT_VERSION`] is a hard error. Unknown
    /// classes, clashing identifiers, unresolvable properties and rejected
    /// connections are skipped and reported in the returned [`LoadReport`].
    pub fn load_document(
        &mut self,
        document: &NetworkDocument,
        factory: &ProcessorFactory,
    ) -> Result<LoadReport, PersistenceError> {
        if document.version > FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: document.version,
                supported: FORMAT_VERSION,
            });
        }

        let mut report = LoadReport::default();
        if document.version < FORMAT_VERSION {
            report.warn(LoadWarning::OlderVersion {
                found: document.version,
            });
        }

        for entry in &document.processors {
            let mut processor = match factory.create(&entry.class) {
                Ok(processor) => processor,
                Err(_) => {
                    report.warn(LoadWarning::UnknownClass {
                        identifier: entry.identifier.clone(),
                        class: entry.class.clone(),
                    });
                    continue;
                }
            };

            if let Some(state) = &entry.state {
                if let Err(e) = processor.load_state(state) {
                    report.warn(LoadWarning::StateRejected {
                        identifier: entry.identifier.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            let id = match self.add_processor(entry.identifier.clone(), processor) {
                Ok(id) => id,
                Err(error) => {
                    report.warn(LoadWarning::ProcessorRejected {
                        identifier: entry.identifier.clone(),
                        error,
                    });
                    continue;
                }
            };
            report.processors_loaded += 1;

            for (path, value) in &entry.properties {
                if let Err(error) = self.set_property(&entry.identifier, path, value.clone()) {
                    report.warn(LoadWarning::PropertyRejected {
                        identifier: entry.identifier.clone(),
                        path: path.clone(),
                        error,
                    });
                }
            }
            self.invalidate_processor(id, InvalidationLevel::InvalidResources);
        }

        for entry in &document.connections {
            match self.add_connection(&entry.source, &entry.destination) {
                Ok(()) => report.connections_loaded += 1,
                Err(error) => report.warn(LoadWarning::ConnectionRejected {
                    source: entry.source.clone(),
                    destination: entry.destination.clone(),
                    error,
                }),
            }
        }

        DocumentLoaded {
            processors: report.processors_loaded,
            connections: report.connections_loaded,
            warnings: report.warnings.len(),
        }
        .log();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::InvalidationLevel;

    const DOCUMENT: &str = r#"
version: 1
processors:
  - class: constant
    identifier: source
    properties:
      value: 21.0
  - class: scale
    identifier: double
    properties:
      factor: 2
  - class: recorder
    identifier: sink
connections:
  - source: source.value
    destination: double.input
  - source: double.output
    destination: sink.value
"#;

    #[test]
    fn loads_processors_properties_and_connections() {
        let document = NetworkDocument::from_yaml_str(DOCUMENT).unwrap();
        let mut network = ProcessorNetwork::new();
        let report = network
            .load_document(&document, &ProcessorFactory::with_builtins())
            .unwrap();

        assert!(report.is_clean(), "{:?}", report.warnings);
        assert_eq!(report.processors_loaded, 3);
        assert_eq!(report.connections_loaded, 2);
        assert_eq!(network.property("double", "factor"), Some(&PropertyValue::Float(2.0)));
        assert!(network.is_connected("double.output", "sink.value"));

        let double = network.processor_id("double").unwrap();
        assert_eq!(
            network.invalidation_level(double),
            Some(InvalidationLevel::InvalidResources)
        );
    }

    #[test]
    fn unresolved_references_are_warnings() {
        let yaml = r#"
version: 1
processors:
  - class: constant
    identifier: source
    properties:
      value: 1.0
      missing: 3
  - class: teleporter
    identifier: ghost
  - class: format
    identifier: label
connections:
  - source: ghost.out
    destination: source.value
  - source: label.text
    destination: source.value
"#;
        let document = NetworkDocument::from_yaml_str(yaml).unwrap();
        let mut network = ProcessorNetwork::new();
        let report = network
            .load_document(&document, &ProcessorFactory::with_builtins())
            .unwrap();

        assert_eq!(report.processors_loaded, 2);
        assert_eq!(report.connections_loaded, 0);
        assert_eq!(report.warnings.len(), 4);
        assert!(matches!(
            report.warnings[0],
            LoadWarning::PropertyRejected { ref path, .. } if path == "missing"
        ));
        assert!(matches!(
            report.warnings[1],
            LoadWarning::UnknownClass { ref class, .. } if class == "teleporter"
        ));
        assert!(matches!(
            report.warnings[2],
            LoadWarning::ConnectionRejected {
                error: NetworkError::PortNotFound { .. },
                ..
            }
        ));
        assert!(matches!(
            report.warnings[3],
            LoadWarning::ConnectionRejected {
                error: NetworkError::PortNotFound { .. },
                ..
            }
        ));
    }

    #[test]
    fn newer_versions_are_rejected_older_ones_warn() {
        let mut network = ProcessorNetwork::new();
        let factory = ProcessorFactory::with_builtins();

        let newer = NetworkDocument {
            version: FORMAT_VERSION + 1,
            processors: vec![],
            connections: vec![],
        };
        assert!(matches!(
            network.load_document(&newer, &factory),
            Err(PersistenceError::UnsupportedVersion { found, .. }) if found == FORMAT_VERSION + 1
        ));

        let older = NetworkDocument {
            version: 0,
            ..newer
        };
        let report = network.load_document(&older, &factory).unwrap();
        assert_eq!(report.warnings, vec![LoadWarning::OlderVersion { found: 0 }]);
    }

    #[test]
    fn yaml_and_json_files_round_trip() {
        let document = NetworkDocument::from_yaml_str(DOCUMENT).unwrap();
        let mut network = ProcessorNetwork::new();
        network
            .load_document(&document, &ProcessorFactory::with_builtins())
            .unwrap();
        let saved = network.to_document();

        let dir = tempfile::tempdir().unwrap();
        for name in ["network.yaml", "network.json"] {
            let path = dir.path().join(name);
            saved.save(&path).unwrap();
            assert_eq!(NetworkDocument::load(&path).unwrap(), saved);
        }
    }
}
