//! Entity storage
//!
//! Handlers talk to storage through the [`Store`] trait. Its errors carry a
//! not-found sentinel that the dispatcher maps to `404 Not Found`, including
//! batch failures where every failed entry was missing.

pub mod in_memory;

pub use in_memory::InMemoryStore;

use crate::core::key::Key;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such entity")]
    NotFound,

    #[error(transparent)]
    Multi(MultiError),

    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this error only reports missing entities
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::NotFound => true,
            StoreError::Multi(multi) => multi.is_not_found(),
            StoreError::Backend(_) => false,
        }
    }
}

/// Per-entry outcome of a batch operation, `None` for entries that succeeded
#[derive(Debug, Default)]
pub struct MultiError(pub Vec<Option<StoreError>>);

impl MultiError {
    /// Whether every failed entry is a not-found error
    pub fn is_not_found(&self) -> bool {
        self.0.iter().flatten().all(StoreError::is_not_found)
    }

    /// Whether any entry failed
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Option::is_some)
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed: Vec<String> = self
            .0
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| format!("{}: {}", i, e)))
            .collect();
        write!(f, "{} of {} entries failed ({})", failed.len(), self.0.len(), failed.join("; "))
    }
}

impl std::error::Error for MultiError {}

/// Key-value storage of one entity type
#[async_trait]
pub trait Store<T: Send + Sync>: Send + Sync {
    /// Get an entity, failing with [`StoreError::NotFound`] when missing
    async fn get(&self, key: &Key) -> Result<T, StoreError>;

    /// Get several entities; failures are reported per entry
    async fn get_multi(&self, keys: &[Key]) -> Result<Vec<T>, StoreError>;

    /// Insert or replace an entity
    async fn put(&self, key: Key, entity: T) -> Result<(), StoreError>;

    /// Delete an entity, failing with [`StoreError::NotFound`] when missing
    async fn delete(&self, key: &Key) -> Result<(), StoreError>;

    /// All entities in insertion order
    async fn list(&self) -> Result<Vec<(Key, T)>, StoreError>;
}
