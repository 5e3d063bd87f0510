//! In-memory storage
//!
//! A `FxHashMap` behind a shared handle. Cloning a [`MemoryStorage`] shares
//! the underlying map, so several stores constructed over clones of one
//! handle see a single logical storage, the way every store in a browser
//! session shares that session's storage.

use std::{cell::RefCell, rc::Rc};

use rustc_hash::FxHashMap;

use crate::storage::{Storage, StorageError};

/// Shared in-memory key-value storage.
///
/// Deliberately not `Send`: the execution model is single-threaded and
/// run-to-completion, so single-threaded shared ownership is enough.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<FxHashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn set_then_get_returns_value() -> TestResult {
        let mut storage = MemoryStorage::new();

        storage.set("key", "value")?;

        assert_eq!(storage.get("key")?, Some("value".to_string()));

        Ok(())
    }

    #[test]
    fn get_missing_key_returns_none() -> TestResult {
        let storage = MemoryStorage::new();

        assert_eq!(storage.get("missing")?, None);

        Ok(())
    }

    #[test]
    fn remove_deletes_value() -> TestResult {
        let mut storage = MemoryStorage::new();

        storage.set("key", "value")?;
        storage.remove("key")?;

        assert_eq!(storage.get("key")?, None);

        Ok(())
    }

    #[test]
    fn remove_missing_key_is_not_an_error() -> TestResult {
        let mut storage = MemoryStorage::new();

        storage.remove("missing")?;

        Ok(())
    }

    #[test]
    fn clones_share_the_underlying_map() -> TestResult {
        let mut storage = MemoryStorage::new();
        let other = storage.clone();

        storage.set("key", "value")?;

        assert_eq!(other.get("key")?, Some("value".to_string()));
        assert_eq!(other.len(), 1);
        assert!(!other.is_empty());

        Ok(())
    }
}
