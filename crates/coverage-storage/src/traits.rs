//! World-state trait for the ledger storage abstraction.
//!
//! The world state is an opaque key/value collaborator: keys are composite
//! strings, values are byte blobs. Everything typed lives above it.

use async_trait::async_trait;

use crate::error::StorageError;

/// The key/value collaborator that all ledger backends must implement.
///
/// Implementations must be thread-safe (`Send + Sync`). An empty value is
/// indistinguishable from an absent one.
///
/// # Example
///
/// ```ignore
/// use coverage_storage::{StorageError, WorldState};
///
/// async fn exists(state: &dyn WorldState, key: &str) -> Result<bool, StorageError> {
///     Ok(state.get_state(key).await?.is_some_and(|v| !v.is_empty()))
/// }
/// ```
#[async_trait]
pub trait WorldState: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing keys.
    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` under `key`, overwriting whatever was there.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Backend` if the collaborator rejects the write.
    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Stores `value` under `key` only if the current value equals `expected`.
    ///
    /// `expected = None` means the key must be absent. Returns `false` when the
    /// current value did not match and nothing was written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unsupported` for backends without atomic
    /// compare-and-put.
    async fn compare_and_put(
        &self,
        _key: &str,
        _expected: Option<&[u8]>,
        _value: Vec<u8>,
    ) -> Result<bool, StorageError> {
        Err(StorageError::unsupported(self.backend_name(), "compare_and_put"))
    }

    /// Returns the name of the backend (for logging).
    fn backend_name(&self) -> &'static str;
}
