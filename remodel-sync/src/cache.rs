//! Cache invalidation hook.
//!
//! The engine never reads cached entities; it only drops them when a write
//! makes them stale. Keys come from [`EntityModel::cache_keys`].

use remodel_model::EntityModel;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Drops cached copies of an entity.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, entity: &EntityModel);
}

/// Invalidator for deployments without a cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl CacheInvalidator for NoopCache {
    fn invalidate(&self, _entity: &EntityModel) {}
}

/// A process-local cache keyed by entity cache keys.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Value>>,
    invalidated: Mutex<Vec<String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: impl Into<String>, value: Value) {
        lock(&self.entries).insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        lock(&self.entries).get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.entries).contains_key(key)
    }

    /// Caches an entity under every one of its keys.
    pub fn store(&self, entity: &EntityModel) {
        let value = entity.to_json();
        let mut entries = lock(&self.entries);
        for key in entity.cache_keys() {
            entries.insert(key, value.clone());
        }
    }

    /// Every key invalidated so far, in order.
    pub fn invalidated_keys(&self) -> Vec<String> {
        lock(&self.invalidated).clone()
    }
}

impl CacheInvalidator for InMemoryCache {
    fn invalidate(&self, entity: &EntityModel) {
        let keys = entity.cache_keys();
        debug!(?keys, "Invalidating cached entity");
        let mut entries = lock(&self.entries);
        for key in &keys {
            entries.remove(key);
        }
        lock(&self.invalidated).extend(keys);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
