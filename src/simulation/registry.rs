//! Catalogue of known intersections
//!
//! Holds every intersection the setup side has produced, complete or not.
//! The animator is started from [`IntersectionRegistry::complete`].

use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::intersection::Intersection;
use super::types::IntersectionId;

#[derive(Debug, Default, Clone)]
pub struct IntersectionRegistry {
    intersections: HashMap<IntersectionId, Arc<Intersection>>,
}

impl IntersectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an intersection
    pub fn register(&mut self, intersection: Intersection) -> Arc<Intersection> {
        let shared = Arc::new(intersection);
        self.intersections.insert(shared.id, Arc::clone(&shared));
        shared
    }

    pub fn insert(&mut self, intersection: Arc<Intersection>) {
        self.intersections.insert(intersection.id, intersection);
    }

    pub fn get(&self, id: &IntersectionId) -> Option<&Arc<Intersection>> {
        self.intersections.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Intersection>> {
        self.intersections.values().find(|i| i.name == name)
    }

    pub fn remove(&mut self, id: &IntersectionId) -> Option<Arc<Intersection>> {
        self.intersections.remove(id)
    }

    /// Every intersection, sorted by name
    pub fn all(&self) -> Vec<Arc<Intersection>> {
        let mut all: Vec<Arc<Intersection>> = self.intersections.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Intersections ready to be animated
    pub fn complete(&self) -> Vec<Arc<Intersection>> {
        self.all().into_iter().filter(|i| i.is_complete()).collect()
    }

    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    pub fn clear(&mut self) {
        self.intersections.clear();
    }

    /// Load one intersection record
    pub fn load_file(path: &Path) -> Result<Intersection> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut intersection: Intersection = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse intersection record {}", path.display()))?;
        intersection.reindex();
        Ok(intersection)
    }

    /// Load every `*.json` record in a directory.
    ///
    /// A record that fails to parse is logged and skipped.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list intersection directory {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::load_file(&path) {
                Ok(intersection) => {
                    registry.register(intersection);
                }
                Err(e) => warn!("Skipping intersection record: {:#}", e),
            }
        }

        info!("Loaded {} intersections from {}", registry.len(), dir.display());
        Ok(registry)
    }

    /// Write one intersection as a JSON record named after its id
    pub fn save_file(intersection: &Intersection, dir: &Path) -> Result<()> {
        let path = dir.join(format!("{}.json", intersection.id));
        let json = serde_json::to_string_pretty(intersection).context("Failed to serialize intersection")?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
