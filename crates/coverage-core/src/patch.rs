//! Merge-patch of a partial update onto an existing resource.
//!
//! Objects merge recursively key by key; every other value present in the
//! patch (scalars and arrays alike) replaces the existing value wholesale.
//! Arrays are never merged element-wise. Merging does not validate; callers
//! re-decode the result before persisting it.

use serde_json::{Map, Value};

use crate::codec::decode_value;
use crate::error::{CoreError, Result};
use crate::resource::Resource;
use crate::validation::ValidationIssue;

/// Deep-merge `patch` into `existing`, returning the merged document.
pub fn merge(existing: &Value, patch: &Value) -> Value {
    match (existing, patch) {
        (Value::Object(base), Value::Object(overlay)) => Value::Object(merge_objects(base, overlay)),
        (_, overlay) => overlay.clone(),
    }
}

fn merge_objects(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, patch_value) in overlay {
        let value = match merged.get(key) {
            Some(existing_value) => merge(existing_value, patch_value),
            None => patch_value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    merged
}

/// Merge two typed resources and re-decode the result.
///
/// The patch must name the same resource (type and id) as the existing
/// record; the merged document is validated against the schema.
pub fn merge_resources(existing: &Resource, patch: &Resource) -> Result<Resource> {
    let resource_type = existing.resource_type();
    if patch.resource_type() != resource_type {
        return Err(CoreError::schema_validation(
            resource_type.as_str(),
            vec![ValidationIssue::invalid_value(
                "resourceType",
                format!(
                    "patch of type {} cannot be applied to {}",
                    patch.resource_type(),
                    resource_type
                ),
            )],
        ));
    }
    // Ids are ASCII by schema; keys compare them case-insensitively
    if !patch.id().eq_ignore_ascii_case(existing.id()) {
        return Err(CoreError::schema_validation(
            resource_type.as_str(),
            vec![ValidationIssue::invalid_value(
                format!("{resource_type}.id"),
                format!(
                    "patch id '{}' does not match existing id '{}'",
                    patch.id(),
                    existing.id()
                ),
            )],
        ));
    }

    let merged = merge(&existing.to_value()?, &patch.to_value()?);
    decode_value(resource_type, merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use serde_json::json;

    fn coverage(value: Value) -> Resource {
        decode("Coverage", &serde_json::to_vec(&value).unwrap()).unwrap()
    }

    fn base_coverage() -> Value {
        json!({
            "resourceType": "Coverage",
            "id": "cov1",
            "status": "active",
            "beneficiary": {"reference": "Patient/p1"},
            "subscriber": {"reference": "Patient/p1"},
            "payor": [{"reference": "Organization/ins1"}, {"reference": "Organization/ins2"}],
            "period": {"start": "2024-01-01", "end": "2024-12-31"},
            "dependent": "01"
        })
    }

    #[test]
    fn test_absent_fields_are_retained() {
        let merged = merge(&base_coverage(), &json!({"status": "cancelled"}));
        assert_eq!(merged["status"], "cancelled");
        assert_eq!(merged["dependent"], "01");
        assert_eq!(merged["subscriber"]["reference"], "Patient/p1");
    }

    #[test]
    fn test_nested_objects_merge_key_by_key() {
        let merged = merge(&base_coverage(), &json!({"period": {"end": "2025-06-30"}}));
        assert_eq!(merged["period"], json!({"start": "2024-01-01", "end": "2025-06-30"}));
    }

    #[test]
    fn test_arrays_are_replaced_whole() {
        let merged = merge(
            &base_coverage(),
            &json!({"payor": [{"reference": "Organization/ins9"}]}),
        );
        assert_eq!(merged["payor"], json!([{"reference": "Organization/ins9"}]));
    }

    #[test]
    fn test_scalar_replaces_object_and_back() {
        assert_eq!(merge(&json!({"a": {"b": 1}}), &json!({"a": 2})), json!({"a": 2}));
        assert_eq!(merge(&json!({"a": 2}), &json!({"a": {"b": 1}})), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_merge_resources_revalidates() {
        let existing = coverage(base_coverage());
        let mut patch_doc = base_coverage();
        patch_doc["period"] = json!({"end": "2025-12-31"});
        patch_doc.as_object_mut().unwrap().remove("dependent");
        let patch = coverage(patch_doc);

        let merged = merge_resources(&existing, &patch).unwrap();
        let merged = merged.as_coverage().unwrap();
        let period = merged.period.as_ref().unwrap();
        assert_eq!(period.start.as_ref().unwrap().as_str(), "2024-01-01");
        assert_eq!(period.end.as_ref().unwrap().as_str(), "2025-12-31");
        assert_eq!(merged.extra["dependent"], "01");
    }

    #[test]
    fn test_merge_resources_rejects_other_identity() {
        let existing = coverage(base_coverage());
        let mut other = base_coverage();
        other["id"] = json!("cov2");
        let err = merge_resources(&existing, &coverage(other)).unwrap_err();
        assert!(matches!(err, CoreError::SchemaValidation { .. }));
    }
}
