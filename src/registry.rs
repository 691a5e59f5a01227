//! Registry of served resources: one Model per path segment.

use crate::backend::{MemoryBackend, PgBackend, QueryBackend};
use crate::config::ResourceConfig;
use crate::model::Model;
use sqlx::PgPool;
use std::sync::Arc;

/// Models in configuration order, looked up by path segment.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: Vec<(String, Model)>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every resource backed by its own in-process table.
    pub fn in_memory(resources: &[ResourceConfig]) -> Self {
        Self::build(resources, |r| Arc::new(MemoryBackend::for_model(&r.model)) as Arc<dyn QueryBackend>)
    }

    /// Every resource backed by its PostgreSQL table.
    pub fn postgres(pool: &PgPool, resources: &[ResourceConfig]) -> Self {
        Self::build(resources, |r| {
            Arc::new(PgBackend::for_model(pool.clone(), &r.model)) as Arc<dyn QueryBackend>
        })
    }

    fn build<F>(resources: &[ResourceConfig], backend: F) -> Self
    where
        F: Fn(&ResourceConfig) -> Arc<dyn QueryBackend>,
    {
        let mut registry = Self::new();
        for r in resources {
            registry.insert(r.path_segment.clone(), Model::new(r.model.clone(), backend(r)));
        }
        registry
    }

    /// Register `model` under `path_segment`, replacing any previous one.
    pub fn insert(&mut self, path_segment: impl Into<String>, model: Model) {
        let path_segment = path_segment.into();
        match self.models.iter_mut().find(|(p, _)| *p == path_segment) {
            Some(entry) => entry.1 = model,
            None => self.models.push((path_segment, model)),
        }
    }

    pub fn get(&self, path_segment: &str) -> Option<&Model> {
        self.models.iter().find(|(p, _)| p == path_segment).map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Model)> {
        self.models.iter().map(|(p, m)| (p.as_str(), m))
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|(p, _)| p.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_resources;
    use crate::model::{KeyType, ModelConfig};

    #[test]
    fn test_in_memory_registry_keeps_order() {
        let mut resources = default_resources();
        resources.push(ResourceConfig::new("users", ModelConfig::new("users").primary_key("uid", KeyType::Uuid)));
        let registry = ModelRegistry::in_memory(&resources);
        assert_eq!(registry.names(), vec!["products", "users"]);
        assert_eq!(registry.get("users").unwrap().config().primary_key, "uid");
        assert!(registry.get("orders").is_none());
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut registry = ModelRegistry::in_memory(&default_resources());
        let backend = Arc::new(MemoryBackend::new("id", KeyType::Number));
        registry.insert("products", Model::new(ModelConfig::new("items"), backend));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("products").unwrap().config().table, "items");
    }
}
