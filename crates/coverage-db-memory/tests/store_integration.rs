//! ResourceStore and ReferenceResolver running on the in-memory backend.

use std::sync::Arc;

use coverage_core::{ResourceType, decode};
use coverage_db_memory::InMemoryWorldState;
use coverage_storage::{ReferenceResolver, ResourceStore};
use serde_json::json;

fn store() -> ResourceStore {
    ResourceStore::new(Arc::new(InMemoryWorldState::new()))
}

#[tokio::test]
async fn test_conditional_update_through_the_store() {
    let store = store();
    let first = br#"{"resourceType":"Organization","id":"ins1","name":"A"}"#.to_vec();
    let second = br#"{"resourceType":"Organization","id":"ins1","name":"B"}"#.to_vec();

    assert!(
        store
            .put_if_current(ResourceType::Organization, "ins1", None, first.clone())
            .await
            .unwrap()
    );
    // Stale expectation loses
    assert!(
        !store
            .put_if_current(ResourceType::Organization, "INS1", None, second.clone())
            .await
            .unwrap()
    );
    assert!(
        store
            .put_if_current(ResourceType::Organization, "ins1", Some(first.as_slice()), second.clone())
            .await
            .unwrap()
    );
    assert_eq!(store.get(ResourceType::Organization, "ins1").await.unwrap(), second);
}

#[tokio::test]
async fn test_resolver_sees_latest_write() {
    let store = store();
    let resolver = ReferenceResolver::new(store.clone());

    let v1 = json!({"resourceType": "Organization", "id": "ins1", "name": "Before"});
    let v2 = json!({"resourceType": "Organization", "id": "ins1", "name": "After"});
    for doc in [v1, v2] {
        let raw = serde_json::to_vec(&doc).unwrap();
        store.save(&decode("Organization", &raw).unwrap()).await.unwrap();
        let resolved = resolver.resolve("Organization/ins1").await.unwrap();
        assert_eq!(resolved.to_value().unwrap()["name"], doc["name"]);
    }
}

#[tokio::test]
async fn test_snapshot_preserves_resources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let state = Arc::new(InMemoryWorldState::new());
    let raw = serde_json::to_vec(&json!({"resourceType": "Patient", "id": "p1", "gender": "male"}))
        .unwrap();
    let patient = decode("Patient", &raw).unwrap();
    ResourceStore::new(state.clone()).save(&patient).await.unwrap();
    state.save_snapshot(&path).await.unwrap();

    let restored = InMemoryWorldState::load_snapshot(&path).await.unwrap();
    let store = ResourceStore::new(Arc::new(restored));
    assert_eq!(store.load(ResourceType::Patient, "p1").await.unwrap(), patient);
}
