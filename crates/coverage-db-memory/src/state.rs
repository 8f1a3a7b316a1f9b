use std::sync::Arc;

use async_trait::async_trait;
use coverage_storage::{StorageError, WorldState};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// In-memory world state backed by a concurrent map.
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorldState {
    pub(crate) data: Arc<DashMap<String, Vec<u8>>>,
}

impl InMemoryWorldState {
    /// Creates an empty world state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys (including keys holding empty values).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl WorldState for InMemoryWorldState {
    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    async fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
    ) -> Result<bool, StorageError> {
        // The entry guard holds the shard lock until the write completes
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let current = Some(entry.get().as_slice()).filter(|v| !v.is_empty());
                if current != expected {
                    return Ok(false);
                }
                entry.insert(value);
                Ok(true)
            }
            Entry::Vacant(entry) => {
                if expected.is_some() {
                    return Ok(false);
                }
                entry.insert(value);
                Ok(true)
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
