/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fs::{self, File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::DurableError;

/// A durable, file-locked, atomic-rename-backed store for a single serializable value.
///
/// Every mutation is a full read-modify-write cycle: [`snapshot`](Self::snapshot) loads the
/// whole value, the caller mutates it in memory, [`commit`](Self::commit) writes the whole
/// value back. The `.lock` sidecar is held only for the duration of one snapshot or commit,
/// never across the caller's own I/O in between.
pub struct DurableStore<T> {
    path: PathBuf,
    lock_path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> DurableStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");
        Self {
            lock_path: PathBuf::from(lock_path),
            path,
            _marker: PhantomData,
        }
    }

    fn lock_file(&self) -> Result<File, DurableError> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| DurableError::Lock(self.lock_path.display().to_string(), e))
    }

    /// Read the current value, holding an exclusive lock for the duration of the read.
    ///
    /// Returns [`DurableError::Missing`] if the file does not exist yet; callers at startup
    /// treat this as "start from empty", callers mid-run treat any error here as fatal.
    pub fn snapshot(&self) -> Result<T, DurableError> {
        let lock = self.lock_file()?;
        lock.lock_exclusive()
            .map_err(|e| DurableError::Lock(self.lock_path.display().to_string(), e))?;
        let result = (|| {
            if !self.path.exists() {
                return Err(DurableError::Missing(self.path.display().to_string()));
            }
            let bytes = fs::read(&self.path)
                .map_err(|e| DurableError::Io(self.path.display().to_string(), e))?;
            bincode::deserialize(&bytes)
                .map_err(|e| DurableError::Corrupt(self.path.display().to_string(), e))
        })();
        lock.unlock().ok();
        result
    }

    /// Serialize `value` to a `.tmp` sibling and atomically rename it over the target path.
    pub fn commit(&self, value: &T) -> Result<(), DurableError> {
        let lock = self.lock_file()?;
        lock.lock_exclusive()
            .map_err(|e| DurableError::Lock(self.lock_path.display().to_string(), e))?;
        let result = (|| {
            let mut tmp_path = self.path.clone().into_os_string();
            tmp_path.push(".tmp");
            let tmp_path = PathBuf::from(tmp_path);
            let bytes = bincode::serialize(value)
                .map_err(|e| DurableError::Corrupt(self.path.display().to_string(), e))?;
            fs::write(&tmp_path, &bytes)
                .map_err(|e| DurableError::Io(tmp_path.display().to_string(), e))?;
            fs::rename(&tmp_path, &self.path)
                .map_err(|e| DurableError::Io(self.path.display().to_string(), e))
        })();
        lock.unlock().ok();
        result
    }

    /// Load the store, falling back to `T::default()` and logging a warning if the file is
    /// missing or corrupt. Used by the startup path of every component: re-deriving state from
    /// the tree is preferred over blocking recovery on a truncated state file.
    pub fn snapshot_or_default(&self) -> T
    where
        T: Default,
    {
        match self.snapshot() {
            Ok(value) => value,
            Err(DurableError::Missing(_)) => T::default(),
            Err(err) => {
                log::warn!(
                    "durable state at '{}' unreadable, starting from empty: {}",
                    self.path.display(),
                    err
                );
                T::default()
            }
        }
    }

    /// Load the store for a steady-state (post-startup) read/modify/write cycle: an absent file
    /// is still "empty" (the store may simply never have been committed to yet), but any other
    /// error — a lock failure or a corrupt payload appearing after startup — is propagated rather
    /// than silently discarded, since continuing past it risks diverging from what was actually
    /// committed.
    pub fn snapshot_or_empty(&self) -> Result<T, DurableError>
    where
        T: Default,
    {
        match self.snapshot() {
            Ok(value) => Ok(value),
            Err(DurableError::Missing(_)) => Ok(T::default()),
            Err(err) => Err(err),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
