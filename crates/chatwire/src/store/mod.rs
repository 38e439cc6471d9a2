//! Persistence boundary for per-user state.
//!
//! Bot features keep small records keyed by the chat user they belong to.
//! The client does not prescribe a storage schema: a [`BlobStore`] maps a
//! key to an opaque byte blob, and [`put_json`] / [`get_json`] layer
//! `serde_json` encoding on top for typed records.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised by a [`BlobStore`] or the JSON helpers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed to read or write.
    #[error("storage backend failed: {message}")]
    Backend {
        /// Description supplied by the backend.
        message: String,
    },

    /// A record could not be encoded or decoded.
    #[error("failed to encode or decode record: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Key-value store of opaque blobs.
pub trait BlobStore: Send + Sync {
    /// Stores `blob` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the write fails.
    fn put(&self, key: &str, blob: &[u8]) -> Result<(), StoreError>;

    /// Returns the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the read fails.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Removes the blob under `key`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the delete fails.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl BlobStore for MemoryStore {
    fn put(&self, key: &str, blob: &[u8]) -> Result<(), StoreError> {
        self.lock().insert(key.to_owned(), blob.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock().remove(key).is_some())
    }
}

/// Serialises `value` as JSON and stores it under `key`.
///
/// # Errors
///
/// Returns [`StoreError::Codec`] when encoding fails, or the store's error.
pub fn put_json<T>(store: &dyn BlobStore, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
{
    let blob = serde_json::to_vec(value)?;
    store.put(key, &blob)
}

/// Loads and deserialises the JSON record stored under `key`.
///
/// # Errors
///
/// Returns [`StoreError::Codec`] when the stored blob is not a valid `T`,
/// or the store's error.
pub fn get_json<T>(store: &dyn BlobStore, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
{
    store
        .get(key)?
        .map(|blob| serde_json::from_slice(&blob).map_err(StoreError::from))
        .transpose()
}
