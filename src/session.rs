//! Session
//!
//! Holds at most one logged-in user, persisted under its own key so a
//! restart restores the login.

use thiserror::Error;

use crate::{
    storage::{Storage, StorageError, keys},
    users::User,
};

/// Errors raised by the session holder.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Failure encoding the session for persistence.
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The current-session holder.
#[derive(Debug)]
pub struct Session<S> {
    storage: S,
    current: Option<User>,
}

impl<S: Storage> Session<S> {
    /// Open the session over the given storage, restoring any persisted
    /// login. Unreadable data is logged and yields no session.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if storage cannot be read.
    pub fn open(storage: S) -> Result<Self, SessionError> {
        let mut session = Self {
            storage,
            current: None,
        };

        if let Some(raw) = session.storage.get(keys::SESSION)? {
            match serde_json::from_str::<User>(&raw) {
                Ok(user) => session.current = Some(user),
                Err(error) => {
                    tracing::warn!(%error, "discarding unreadable session data");
                }
            }
        }

        Ok(session)
    }

    /// Log a user in, replacing any current session.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the session cannot be persisted.
    pub fn login(&mut self, user: User) -> Result<(), SessionError> {
        let raw = serde_json::to_string(&user)?;

        self.storage.set(keys::SESSION, &raw)?;
        self.current = Some(user);

        Ok(())
    }

    /// Clear the current session.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the persisted session cannot be
    /// removed.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.storage.remove(keys::SESSION)?;
        self.current = None;

        Ok(())
    }

    /// The logged-in user, if any.
    #[must_use]
    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    /// Whether a user is logged in.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }
}
