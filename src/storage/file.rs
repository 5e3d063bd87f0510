//! File-backed storage
//!
//! One `<key>.json` file per key inside a directory. Reads of a missing
//! file map to an absent key; removing an absent key is a no-op.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::storage::{Storage, StorageError};

/// Directory-backed key-value storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();

        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    /// The directory backing this storage.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path_for(key), value)?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
