//! Typed resource store over the world-state collaborator.

use std::sync::Arc;

use coverage_core::codec::{self, parse_document};
use coverage_core::{CoreError, Resource, ResourceType, Result};
use tracing::{debug, instrument, warn};

use crate::error::StorageError;
use crate::key::CompositeKey;
use crate::traits::WorldState;

/// Reads and writes validated resources under composite keys.
///
/// Cloning is cheap; clones share the same world state.
#[derive(Clone)]
pub struct ResourceStore {
    state: Arc<dyn WorldState>,
}

impl ResourceStore {
    pub fn new(state: Arc<dyn WorldState>) -> Self {
        Self { state }
    }

    /// Name of the backing world state.
    pub fn backend_name(&self) -> &'static str {
        self.state.backend_name()
    }

    /// Reads the raw bytes stored for `(resource_type, id)`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if nothing (or an empty value) is stored.
    pub async fn get(&self, resource_type: ResourceType, id: &str) -> Result<Vec<u8>> {
        self.try_get(resource_type, id)
            .await?
            .ok_or_else(|| CoreError::not_found(resource_type.as_str(), id))
    }

    /// Like [`get`](Self::get), but a miss is `Ok(None)`.
    pub async fn try_get(&self, resource_type: ResourceType, id: &str) -> Result<Option<Vec<u8>>> {
        let key = CompositeKey::new(resource_type.as_str(), id)?;
        let value = self
            .state
            .get_state(key.as_str())
            .await
            .map_err(world_state_failure("get_state"))?;
        Ok(value.filter(|bytes| !bytes.is_empty()))
    }

    /// Stores `bytes` for `(resource_type, id)`, overwriting any previous value.
    #[instrument(skip(self, bytes), fields(backend = self.backend_name(), size = bytes.len()))]
    pub async fn put(&self, resource_type: ResourceType, id: &str, bytes: Vec<u8>) -> Result<()> {
        let key = CompositeKey::new(resource_type.as_str(), id)?;
        self.state
            .put_state(key.as_str(), bytes)
            .await
            .map_err(world_state_failure("put_state"))?;
        debug!(key = %key, "Record written");
        Ok(())
    }

    pub async fn exists(&self, resource_type: ResourceType, id: &str) -> Result<bool> {
        Ok(self.try_get(resource_type, id).await?.is_some())
    }

    /// Writes `bytes` only if the stored value still equals `expected`
    /// (`None` meaning absent).
    ///
    /// Returns `false` without writing when another writer got there first.
    ///
    /// # Errors
    ///
    /// Fails with `CoreError::Storage` if the backend has no conditional write.
    pub async fn put_if_current(
        &self,
        resource_type: ResourceType,
        id: &str,
        expected: Option<&[u8]>,
        bytes: Vec<u8>,
    ) -> Result<bool> {
        let key = CompositeKey::new(resource_type.as_str(), id)?;
        let written = self
            .state
            .compare_and_put(key.as_str(), expected, bytes)
            .await
            .map_err(world_state_failure("compare_and_put"))?;
        debug!(key = %key, written, "Conditional write");
        Ok(written)
    }

    /// Reads and decodes a stored resource.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` on a miss, and
    /// `CoreError::InternalInvariantViolation` if the stored bytes no longer
    /// pass validation.
    pub async fn load(&self, resource_type: ResourceType, id: &str) -> Result<Resource> {
        let bytes = self.get(resource_type, id).await?;
        decode_stored(resource_type, id, &bytes)
    }

    /// Like [`load`](Self::load), but a miss is `Ok(None)`.
    pub async fn try_load(&self, resource_type: ResourceType, id: &str) -> Result<Option<Resource>> {
        match self.try_get(resource_type, id).await? {
            Some(bytes) => decode_stored(resource_type, id, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Encodes and stores a resource under its own type and id.
    pub async fn save(&self, resource: &Resource) -> Result<()> {
        let bytes = codec::encode(resource)?;
        self.put(resource.resource_type(), resource.id(), bytes).await
    }
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("backend", &self.backend_name())
            .finish()
    }
}

fn world_state_failure(operation: &'static str) -> impl Fn(StorageError) -> CoreError {
    move |err| {
        warn!(
            operation,
            category = %err.category(),
            error = %err,
            "World state operation failed"
        );
        err.into()
    }
}

fn decode_stored(resource_type: ResourceType, id: &str, bytes: &[u8]) -> Result<Resource> {
    let corrupt = |err: CoreError| {
        CoreError::invariant_violation(
            format!("stored record {resource_type}/{id} is invalid: {err}"),
            err.issues().to_vec(),
        )
    };
    let value = parse_document(bytes).map_err(corrupt)?;
    codec::decode_value(resource_type, value).map_err(corrupt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MapState;
    use serde_json::json;

    fn store() -> ResourceStore {
        ResourceStore::new(Arc::new(MapState::default()))
    }

    fn patient(id: &str) -> Resource {
        let raw = serde_json::to_vec(&json!({"resourceType": "Patient", "id": id})).unwrap();
        coverage_core::decode("Patient", &raw).unwrap()
    }

    struct UnavailableState;

    #[async_trait::async_trait]
    impl WorldState for UnavailableState {
        async fn get_state(&self, _key: &str) -> std::result::Result<Option<Vec<u8>>, StorageError> {
            Err(StorageError::backend("peer unreachable"))
        }

        async fn put_state(&self, _key: &str, _value: Vec<u8>) -> std::result::Result<(), StorageError> {
            Err(StorageError::backend("peer unreachable"))
        }

        fn backend_name(&self) -> &'static str {
            "unavailable"
        }
    }

    #[tokio::test]
    async fn test_backend_failures_surface_as_storage_errors() {
        let store = ResourceStore::new(Arc::new(UnavailableState));
        let err = store.get(ResourceType::Patient, "p1").await.unwrap_err();
        assert!(matches!(err, CoreError::Storage(ref msg) if msg.contains("peer unreachable")));

        let err = store.save(&patient("p1")).await.unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = store();
        let err = store.get(ResourceType::Patient, "p1").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.exists(ResourceType::Patient, "p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_then_get_is_case_insensitive_on_id() {
        let store = store();
        store
            .put(ResourceType::Patient, "P1", b"{}".to_vec())
            .await
            .unwrap();
        assert_eq!(store.get(ResourceType::Patient, " p1 ").await.unwrap(), b"{}");
        assert!(!store.exists(ResourceType::Organization, "p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_value_counts_as_absent() {
        let store = store();
        store.put(ResourceType::Coverage, "c1", Vec::new()).await.unwrap();
        assert!(!store.exists(ResourceType::Coverage, "c1").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = store();
        let resource = patient("p1");
        store.save(&resource).await.unwrap();
        assert_eq!(store.load(ResourceType::Patient, "p1").await.unwrap(), resource);
        assert!(store.try_load(ResourceType::Patient, "p2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_an_invariant_violation() {
        let store = store();
        store
            .put(ResourceType::Patient, "p1", b"{\"resourceType\":\"Patient\"}".to_vec())
            .await
            .unwrap();
        let err = store.load(ResourceType::Patient, "p1").await.unwrap_err();
        assert!(matches!(err, CoreError::InternalInvariantViolation { .. }));
    }

    #[tokio::test]
    async fn test_put_if_current_unsupported_by_default() {
        let store = store();
        let err = store
            .put_if_current(ResourceType::Patient, "p1", None, b"{}".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected_before_storage() {
        let store = store();
        let err = store.get(ResourceType::Patient, "a\0b").await.unwrap_err();
        assert!(matches!(err, CoreError::MalformedInput(_)));
    }
}
