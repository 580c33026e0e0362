//! Test framework adapter registry
//!
//! Central registry for framework adapters. Handles registration, lookup
//! by name, and project detection. Detection runs adapters in
//! registration order and the first match wins, so more specific
//! frameworks must be registered before broader ones.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use gantry_core::{AdapterError, Result};

use crate::traits::TestFrameworkAdapter;
use crate::validate::SyntaxChecker;

/// Registry of test framework adapters
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn TestFrameworkAdapter>>,

    /// Registration order, which doubles as detection priority
    detection_order: Vec<String>,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
            detection_order: Vec::new(),
        }
    }

    /// Create a registry with all built-in adapters
    pub fn with_builtins(checker: Arc<dyn SyntaxChecker>) -> Self {
        let mut registry = Self::new();
        crate::frameworks::register_all(&mut registry, checker);
        registry
    }

    /// Register an adapter
    ///
    /// Re-registering a name replaces the adapter but keeps its original
    /// detection priority.
    pub fn register<A: TestFrameworkAdapter + 'static>(&mut self, adapter: A) {
        let name = adapter.name().to_string();
        debug!(adapter = %name, "registering test adapter");
        if !self.detection_order.contains(&name) {
            self.detection_order.push(name.clone());
        }
        self.adapters.insert(name, Arc::new(adapter));
    }

    /// Get an adapter by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn TestFrameworkAdapter>> {
        self.adapters.get(name).cloned()
    }

    /// All registered adapter names, in detection order
    pub fn ids(&self) -> Vec<&str> {
        self.detection_order.iter().map(|s| s.as_str()).collect()
    }

    /// Every adapter whose detection heuristics match the project,
    /// in detection order
    pub fn detect_all(&self, path: &Path) -> Vec<Arc<dyn TestFrameworkAdapter>> {
        debug!(path = %path.display(), "detecting test frameworks");
        let detected: Vec<_> = self
            .detection_order
            .iter()
            .filter_map(|name| self.adapters.get(name))
            .filter(|adapter| adapter.detect(path))
            .cloned()
            .collect();

        if let Some(best) = detected.first() {
            info!(
                detected_count = detected.len(),
                best = best.name(),
                "framework detection complete"
            );
        }
        detected
    }

    /// Resolve an adapter - by explicit name, or by detection
    pub fn resolve(
        &self,
        path: &Path,
        name: Option<&str>,
    ) -> Result<Arc<dyn TestFrameworkAdapter>> {
        if let Some(name) = name {
            return self.get(name).ok_or_else(|| AdapterError::UnknownAdapter {
                name: name.to_string(),
            });
        }

        self.detect_all(path)
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::NoFrameworkDetected {
                path: path.to_path_buf(),
                supported: self.ids().join(", "),
            })
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
