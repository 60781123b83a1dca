// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process-wide services handed to processors through their context.
//!
//! There are no global singletons: a host builds one [`Services`] value,
//! gives it to the evaluator, and tears it down when the network is gone.
//!
//! ```
//! use procnet::services::{HeadlessContext, ResourceInfo, Services};
//! use std::sync::Arc;
//!
//! let services = Services::init().with_active_context(Arc::new(HeadlessContext::default()));
//! services.resources.add(
//!     "mesh/0".to_string(),
//!     ResourceInfo { kind: "mesh".to_string(), bytes: 1024 },
//! );
//!
//! assert!(services.require_context().is_ok());
//! assert_eq!(services.resources.len(), 1);
//! services.teardown();
//! assert!(services.resources.is_empty());
//! ```

use crate::errors::ProcessingError;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The rendering (or other device) context processors may need to make
/// current before touching device resources.
pub trait ActiveContext: Send + Sync {
    fn is_current(&self) -> bool;

    /// Make this context current on the calling thread. Returns whether it
    /// is current afterwards.
    fn activate(&self) -> bool;
}

/// Context for hosts without a display. Always activatable.
#[derive(Debug, Default)]
pub struct HeadlessContext {
    current: AtomicBool,
}

impl ActiveContext for HeadlessContext {
    fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire)
    }

    fn activate(&self) -> bool {
        self.current.store(true, Ordering::Release);
        true
    }
}

/// Thread-safe key to metadata store.
#[derive(Debug)]
pub struct Registry<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V> Registry<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a HashMap half-updated.
    fn entries(&self) -> MutexGuard<'_, HashMap<K, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace, returning the previous value.
    pub fn add(&self, key: K, value: V) -> Option<V> {
        self.entries().insert(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries().remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl<K: Eq + Hash, V: Clone> Registry<K, V> {
    pub fn lookup(&self, key: &K) -> Option<V> {
        self.entries().get(key).cloned()
    }
}

/// What a processor registered under a resource key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    pub kind: String,
    pub bytes: u64,
}

#[derive(Default)]
pub struct Services {
    pub active_context: Option<Arc<dyn ActiveContext>>,
    /// Picking id to the identifier of the processor that owns it.
    pub picking: Registry<u32, String>,
    pub resources: Registry<String, ResourceInfo>,
}

impl Services {
    /// Services with empty registries and no active context.
    pub fn init() -> Self {
        Self::default()
    }

    pub fn with_active_context(mut self, context: Arc<dyn ActiveContext>) -> Self {
        self.active_context = Some(context);
        self
    }

    /// The active context, made current.
    pub fn require_context(&self) -> Result<&dyn ActiveContext, ProcessingError> {
        let context = self
            .active_context
            .as_deref()
            .ok_or(ProcessingError::ContextUnavailable)?;
        if context.is_current() || context.activate() {
            Ok(context)
        } else {
            Err(ProcessingError::ContextUnavailable)
        }
    }

    /// Drop everything registered. The active context stays with its owner.
    pub fn teardown(&self) {
        self.picking.clear();
        self.resources.clear();
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("active_context", &self.active_context.is_some())
            .field("picking", &self.picking.len())
            .field("resources", &self.resources.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LostContext;

    impl ActiveContext for LostContext {
        fn is_current(&self) -> bool {
            false
        }

        fn activate(&self) -> bool {
            false
        }
    }

    #[test]
    fn registry_add_replaces_and_returns_previous() {
        let registry = Registry::new();
        assert_eq!(registry.add(1u32, "a".to_string()), None);
        assert_eq!(registry.add(1u32, "b".to_string()), Some("a".to_string()));
        assert_eq!(registry.lookup(&1), Some("b".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_remove_and_clear() {
        let registry = Registry::new();
        registry.add("x".to_string(), 1);
        registry.add("y".to_string(), 2);
        assert_eq!(registry.remove(&"x".to_string()), Some(1));
        assert!(!registry.contains(&"x".to_string()));
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn missing_context_is_an_error() {
        let services = Services::init();
        assert!(matches!(
            services.require_context(),
            Err(ProcessingError::ContextUnavailable)
        ));
    }

    #[test]
    fn headless_context_activates_on_demand() {
        let context = Arc::new(HeadlessContext::default());
        let services = Services::init().with_active_context(context.clone());
        assert!(!context.is_current());
        assert!(services.require_context().is_ok());
        assert!(context.is_current());
    }

    #[test]
    fn context_that_cannot_activate_is_unavailable() {
        let services = Services::init().with_active_context(Arc::new(LostContext));
        assert!(services.require_context().is_err());
    }

    #[test]
    fn teardown_empties_registries() {
        let services = Services::init();
        services.picking.add(7, "picker".to_string());
        services.resources.add(
            "tex".to_string(),
            ResourceInfo {
                kind: "texture".to_string(),
                bytes: 16,
            },
        );
        services.teardown();
        assert!(services.picking.is_empty());
        assert!(services.resources.is_empty());
    }
}
