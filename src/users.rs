//! Users
//!
//! Registration, email lookup and plaintext credential checks. Passwords
//! are stored and compared verbatim; there is no security model here.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{Storage, StorageError, keys};

/// Errors raised by the user store.
#[derive(Debug, Error)]
pub enum UserError {
    /// A user with this email is already registered.
    #[error("email {0} is already registered")]
    EmailTaken(String),

    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Failure encoding the users for persistence.
    #[error("failed to encode users: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A buying customer.
    Customer,

    /// A seller with a store of their own.
    Seller,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, assigned by the store.
    pub id: u64,

    /// Display name.
    #[serde(rename = "nome")]
    pub name: String,

    /// Email address, the lookup key for authentication.
    pub email: String,

    /// Plaintext credential.
    #[serde(rename = "senha")]
    pub password: String,

    /// Store name, present for sellers.
    #[serde(rename = "nomeLoja")]
    pub store_name: Option<String>,

    /// Account role.
    #[serde(rename = "tipoUsuario")]
    pub role: Role,

    /// Registration time.
    #[serde(rename = "dataCriacao")]
    pub created_at: Timestamp,
}

/// A registration request; the store assigns id and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// Display name.
    pub name: String,

    /// Email address.
    pub email: String,

    /// Plaintext credential.
    pub password: String,

    /// Store name, for sellers.
    pub store_name: Option<String>,

    /// Account role.
    pub role: Role,
}

/// The user store.
#[derive(Debug)]
pub struct UserStore<S> {
    storage: S,
    users: Vec<User>,
    next_id: u64,
}

impl<S: Storage> UserStore<S> {
    /// Open the user store over the given storage.
    ///
    /// Unreadable persisted data is logged and discarded, leaving an empty
    /// store. The identifier counter recovers as highest-used + 1.
    ///
    /// # Errors
    ///
    /// Returns a [`UserError`] if storage cannot be read.
    pub fn open(storage: S) -> Result<Self, UserError> {
        let mut store = Self {
            storage,
            users: Vec::new(),
            next_id: 1,
        };

        if let Some(raw) = store.storage.get(keys::USERS)? {
            match serde_json::from_str::<Vec<User>>(&raw) {
                Ok(users) => {
                    store.next_id = users.iter().map(|u| u.id).max().map_or(1, |max| max + 1);
                    store.users = users;
                }
                Err(error) => {
                    tracing::warn!(%error, "discarding unreadable user data");
                }
            }
        }

        Ok(store)
    }

    /// Register a user, assigning the next identifier and creation time.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::EmailTaken`] if the email is already
    /// registered (the store is left unchanged), or a persistence error.
    pub fn add(&mut self, user: NewUser) -> Result<User, UserError> {
        if self.by_email(&user.email).is_some() {
            return Err(UserError::EmailTaken(user.email));
        }

        let id = self.next_id;
        self.next_id += 1;

        let stored = User {
            id,
            name: user.name,
            email: user.email,
            password: user.password,
            store_name: user.store_name,
            role: user.role,
            created_at: Timestamp::now(),
        };

        self.users.push(stored.clone());
        self.persist()?;

        Ok(stored)
    }

    /// Look up a user by email.
    #[must_use]
    pub fn by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    /// Look up a user by identifier.
    #[must_use]
    pub fn by_id(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Exact plaintext credential check; `None` on any mismatch.
    #[must_use]
    pub fn authenticate(&self, email: &str, password: &str) -> Option<&User> {
        self.by_email(email).filter(|user| user.password == password)
    }

    fn persist(&mut self) -> Result<(), UserError> {
        let raw = serde_json::to_string(&self.users)?;

        self.storage.set(keys::USERS, &raw)?;

        Ok(())
    }
}
