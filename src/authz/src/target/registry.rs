//! Concurrent registry of targets

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use super::types::{ContentClass, Target};

/// Thread-safe id → target map
#[derive(Default)]
pub struct TargetRegistry {
    targets: DashMap<String, Arc<Target>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a target, returning the previous one
    pub fn add(&self, target: Target) -> Option<Arc<Target>> {
        debug!(target_id = target.id(), "Registering repository target");
        self.targets.insert(target.id().to_string(), Arc::new(target))
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Target>> {
        self.targets.remove(id).map(|(_, target)| target)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Target>> {
        self.targets.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// All registered targets, sorted by id
    pub fn targets(&self) -> Vec<Arc<Target>> {
        let mut targets: Vec<_> = self.targets.iter().map(|e| Arc::clone(e.value())).collect();
        targets.sort_by(|a, b| a.id().cmp(b.id()));
        targets
    }

    /// Targets containing `path` for the given content class, sorted by id
    pub fn matching_targets(&self, content_class: &dyn ContentClass, path: &str) -> Vec<Arc<Target>> {
        let mut matching: Vec<_> = self
            .targets
            .iter()
            .filter(|entry| entry.value().is_path_contained(content_class, path))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        matching.sort_by(|a, b| a.id().cmp(b.id()));
        matching
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
