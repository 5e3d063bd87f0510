//! Storage substrate
//!
//! Synchronous, string-keyed key-value persistence. Every store serializes
//! its whole collection under a single key on each mutation; the substrate
//! only moves strings around.

use std::io;

use thiserror::Error;

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Keys for each persisted collection.
pub mod keys {
    /// Product catalog: array of product records.
    pub const CATALOG: &str = "storefront_catalog";

    /// Shopping cart: object with an `itens` array of line records.
    pub const CART: &str = "storefront_cart";

    /// Orders: array of order records.
    pub const ORDERS: &str = "storefront_orders";

    /// Reviews: array of review records.
    pub const REVIEWS: &str = "storefront_reviews";

    /// Users: array of user records.
    pub const USERS: &str = "storefront_users";

    /// Session: single serialized user record, or key absent.
    pub const SESSION: &str = "storefront_session";
}

/// Errors raised by the storage substrate.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure while reading or writing a key.
    #[error("storage i/o failure: {0}")]
    Io(#[from] io::Error),
}

/// A synchronous string-keyed key-value store.
///
/// Writes complete before the call returns; there is no batching and no
/// transaction boundary beyond a single `set`.
pub trait Storage {
    /// Read the raw value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`. Removing an absent key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}
