//! JSON snapshots of the in-memory world state.
//!
//! A snapshot is a JSON object mapping each raw key to its value as a UTF-8
//! string. Keys are written in sorted order so equal states produce equal
//! files.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use coverage_storage::StorageError;
use tracing::{debug, info};

use crate::state::InMemoryWorldState;

impl InMemoryWorldState {
    /// Loads a world state from a snapshot file.
    ///
    /// A missing file yields an empty state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Backend` if the file cannot be read or is not a
    /// snapshot.
    pub async fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No snapshot yet, starting empty");
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(StorageError::backend(format!(
                    "failed to read snapshot {}: {e}",
                    path.display()
                )));
            }
        };

        let entries: BTreeMap<String, String> = serde_json::from_slice(&raw).map_err(|e| {
            StorageError::backend(format!("invalid snapshot {}: {e}", path.display()))
        })?;

        let state = Self::new();
        for (key, value) in entries {
            state.data.insert(key, value.into_bytes());
        }
        info!(path = %path.display(), keys = state.len(), "Snapshot loaded");
        Ok(state)
    }

    /// Writes the current state to `path`, replacing any previous snapshot.
    ///
    /// The file is written next to its destination and renamed into place.
    pub async fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        let mut entries = BTreeMap::new();
        for entry in self.data.iter() {
            let value = String::from_utf8(entry.value().clone()).map_err(|_| {
                StorageError::backend(format!(
                    "value under {} is not UTF-8",
                    entry.key().escape_default()
                ))
            })?;
            entries.insert(entry.key().clone(), value);
        }

        let body = serde_json::to_vec_pretty(&entries)
            .map_err(|e| StorageError::backend(format!("failed to encode snapshot: {e}")))?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| StorageError::backend(format!("failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path).await.map_err(|e| {
            StorageError::backend(format!("failed to replace {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), keys = entries.len(), "Snapshot saved");
        Ok(())
    }
}
