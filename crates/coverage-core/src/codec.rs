//! Resource decoding (with schema validation) and encoding.

use serde_json::Value;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::fhir::ResourceType;
use crate::resource::Resource;
use crate::validation::{ValidationIssue, validate};

/// Parse raw bytes into a JSON document.
///
/// Anything that is not JSON fails with `MalformedInput`.
pub fn parse_document(raw: &[u8]) -> Result<Value> {
    serde_json::from_slice(raw)
        .map_err(|e| CoreError::malformed_input(format!("input is not valid JSON: {e}")))
}

/// Decode `raw` as a resource of the named type.
///
/// Fails with `UnsupportedResourceType` for names outside the five ledger
/// types, `MalformedInput` for non-JSON input and `SchemaValidation` with the
/// full diagnostic list otherwise.
pub fn decode(resource_type: &str, raw: &[u8]) -> Result<Resource> {
    let resource_type: ResourceType = resource_type.parse()?;
    let value = parse_document(raw)?;
    decode_value(resource_type, value)
}

/// Decode a document whose type is taken from its own `resourceType`.
pub fn decode_any(raw: &[u8]) -> Result<Resource> {
    let value = parse_document(raw)?;
    let resource_type = declared_type(&value)?;
    decode_value(resource_type, value)
}

/// Reads and checks the `resourceType` a document declares.
pub fn declared_type(value: &Value) -> Result<ResourceType> {
    match value.get("resourceType") {
        Some(Value::String(name)) => name.parse(),
        Some(_) => Err(CoreError::schema_validation(
            "Resource",
            vec![ValidationIssue::structure(
                "resourceType",
                "resourceType must be a string",
            )],
        )),
        None => Err(CoreError::schema_validation(
            "Resource",
            vec![ValidationIssue::required("resourceType")],
        )),
    }
}

/// Validate a parsed document and convert it into the typed model.
pub fn decode_value(resource_type: ResourceType, value: Value) -> Result<Resource> {
    let issues = validate(resource_type, &value);
    if !issues.is_empty() {
        debug!(
            resource_type = %resource_type,
            issues = issues.len(),
            "Resource failed schema validation"
        );
        return Err(CoreError::schema_validation(resource_type.as_str(), issues));
    }

    serde_json::from_value(value).map_err(|e| {
        CoreError::schema_validation(
            resource_type.as_str(),
            vec![ValidationIssue::structure(resource_type.as_str(), e.to_string())],
        )
    })
}

/// Check an already-typed resource against its schema.
pub fn revalidate(resource: &Resource) -> Result<()> {
    let value = resource.to_value()?;
    let issues = validate(resource.resource_type(), &value);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(CoreError::schema_validation(
            resource.resource_type().as_str(),
            issues,
        ))
    }
}

/// Serialize a resource to its stored byte form.
///
/// Output depends only on the resource value, so equal resources encode to
/// identical bytes.
pub fn encode(resource: &Resource) -> Result<Vec<u8>> {
    serde_json::to_vec(resource).map_err(|e| {
        CoreError::invariant_violation(format!("failed to encode resource: {e}"), Vec::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixtures() -> Vec<Value> {
        vec![
            json!({
                "resourceType": "Patient",
                "id": "p1",
                "active": true,
                "gender": "female",
                "birthDate": "1980-02-29",
                "name": [{"family": "Doe", "given": ["Jane"]}]
            }),
            json!({
                "resourceType": "Organization",
                "id": "ins1",
                "name": "Benefits Inc",
                "identifier": [{"system": "urn:oid:2.16.840.1", "value": "ins1"}]
            }),
            json!({
                "resourceType": "Coverage",
                "id": "cov1",
                "status": "active",
                "beneficiary": {"reference": "Patient/p1"},
                "subscriber": {"reference": "Patient/p1", "display": "Jane Doe"},
                "payor": [{"reference": "Organization/ins1"}],
                "period": {"start": "2024-01-01", "end": "2024-12-31"},
                "class": [{"value": "gold", "name": "Gold Plan"}]
            }),
            json!({
                "resourceType": "CoverageEligibilityRequest",
                "id": "req1",
                "status": "active",
                "purpose": ["validation"],
                "patient": {"reference": "Patient/p1"},
                "created": "2024-06-15T09:30:00+02:00",
                "insurer": {"reference": "Organization/ins1"},
                "insurance": [{"focal": true, "coverage": {"reference": "Coverage/cov1"}}]
            }),
            json!({
                "resourceType": "CoverageEligibilityResponse",
                "id": "req1",
                "status": "active",
                "purpose": ["validation"],
                "patient": {"reference": "Patient/p1"},
                "created": "2024-06-15",
                "request": {"reference": "CoverageEligibilityRequest/req1"},
                "outcome": "complete",
                "disposition": "Policy is currently in effect.",
                "insurer": {"reference": "Organization/ins1"},
                "insurance": [{"coverage": {"reference": "Coverage/cov1"}, "inforce": true}]
            }),
        ]
    }

    #[test]
    fn test_round_trip_for_every_type() {
        for fixture in fixtures() {
            let name = fixture["resourceType"].as_str().unwrap().to_string();
            let raw = serde_json::to_vec(&fixture).unwrap();
            let decoded = decode(&name, &raw).unwrap();
            assert_eq!(decoded.resource_type().as_str(), name);

            let encoded = encode(&decoded).unwrap();
            assert_eq!(decode(&name, &encoded).unwrap(), decoded);
            // Nothing is dropped on the way through the typed model
            assert_eq!(serde_json::from_slice::<Value>(&encoded).unwrap(), fixture);
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let raw = serde_json::to_vec(&fixtures()[2]).unwrap();
        let a = decode("Coverage", &raw).unwrap();
        let b = decode("Coverage", &raw).unwrap();
        assert_eq!(encode(&a).unwrap(), encode(&b).unwrap());
    }

    #[test]
    fn test_unsupported_type_always_fails() {
        let raw = br#"{"resourceType": "Observation", "id": "o1"}"#;
        let err = decode("Observation", raw).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedResourceType(_)));

        let err = decode_any(raw).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedResourceType(_)));

        // Checked before the payload is even parsed
        let err = decode("Claim", b"not json").unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedResourceType(_)));
    }

    #[test]
    fn test_structurally_invalid_record() {
        let raw = br#"{"resourceType": "Coverage", "id": "cov1", "status": "active"}"#;
        let err = decode("Coverage", raw).unwrap_err();
        match err {
            CoreError::SchemaValidation { resource_type, issues } => {
                assert_eq!(resource_type, "Coverage");
                assert_eq!(issues.len(), 2);
            }
            other => panic!("expected SchemaValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_input() {
        let err = decode("Patient", b"{ not json").unwrap_err();
        assert!(matches!(err, CoreError::MalformedInput(_)));
        let err = decode_any(b"").unwrap_err();
        assert!(matches!(err, CoreError::MalformedInput(_)));
    }

    #[test]
    fn test_decode_any_requires_resource_type() {
        let err = decode_any(br#"{"id": "p1"}"#).unwrap_err();
        assert!(matches!(err, CoreError::SchemaValidation { .. }));
    }

    #[test]
    fn test_revalidate_catches_invalid_typed_values() {
        let raw = serde_json::to_vec(&fixtures()[0]).unwrap();
        let mut resource = decode("Patient", &raw).unwrap();
        assert!(revalidate(&resource).is_ok());

        if let Resource::Patient(patient) = &mut resource {
            patient.gender = Some("robot".to_string());
        }
        assert!(matches!(
            revalidate(&resource),
            Err(CoreError::SchemaValidation { .. })
        ));
    }
}
