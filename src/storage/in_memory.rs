//! In-memory implementation of Store for testing and development

use crate::core::key::Key;
use crate::storage::{MultiError, Store, StoreError};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

/// In-memory entity store
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// clones share the same entities.
pub struct InMemoryStore<T> {
    entities: Arc<RwLock<IndexMap<Key, T>>>,
}

impl<T> InMemoryStore<T> {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self {
            entities: Arc::new(RwLock::new(IndexMap::new())),
        }
    }
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            entities: self.entities.clone(),
        }
    }
}

fn poisoned(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Store<T> for InMemoryStore<T> {
    async fn get(&self, key: &Key) -> Result<T, StoreError> {
        let entities = self.entities.read().map_err(poisoned)?;
        entities.get(key).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_multi(&self, keys: &[Key]) -> Result<Vec<T>, StoreError> {
        let entities = self.entities.read().map_err(poisoned)?;
        let mut found = Vec::with_capacity(keys.len());
        let mut errors = Vec::with_capacity(keys.len());
        for key in keys {
            match entities.get(key) {
                Some(entity) => {
                    found.push(entity.clone());
                    errors.push(None);
                }
                None => errors.push(Some(StoreError::NotFound)),
            }
        }
        let errors = MultiError(errors);
        if errors.has_errors() {
            return Err(StoreError::Multi(errors));
        }
        Ok(found)
    }

    async fn put(&self, key: Key, entity: T) -> Result<(), StoreError> {
        let mut entities = self.entities.write().map_err(poisoned)?;
        entities.insert(key, entity);
        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<(), StoreError> {
        let mut entities = self.entities.write().map_err(poisoned)?;
        entities
            .shift_remove(key)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<(Key, T)>, StoreError> {
        let entities = self.entities.read().map_err(poisoned)?;
        Ok(entities
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
