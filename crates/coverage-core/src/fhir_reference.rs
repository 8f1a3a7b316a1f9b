//! Parsing of FHIR `Reference.reference` strings.
//!
//! References are lookup keys into the world state, never pointers: a parsed
//! reference only names a `(type, id)` pair and is resolved per operation.
//!
//! Accepted forms:
//! - Relative: `Patient/123`
//! - Absolute URL under the configured base: `http://example.org/fhir/Patient/123`
//!
//! Contained (`#id`), URN (`urn:uuid:..`) and foreign absolute references
//! cannot be resolved against the ledger.
//!
//! ```
//! use coverage_core::fhir_reference::parse_reference;
//!
//! let r = parse_reference("Organization/ins1", None).unwrap();
//! assert_eq!(r.resource_type, "Organization");
//! assert_eq!(r.id, "ins1");
//! ```

use std::fmt;

/// A successfully parsed local reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceReference {
    /// The resource type named by the reference (not necessarily supported)
    pub resource_type: String,
    /// The resource ID
    pub id: String,
}

impl ResourceReference {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Returns the reference as a relative string (Type/id).
    pub fn to_relative(&self) -> String {
        format!("{}/{}", self.resource_type, self.id)
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_relative())
    }
}

/// Why a reference cannot be resolved against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvableReference {
    Contained(String),
    Urn(String),
    External(String),
    Invalid(String),
}

impl fmt::Display for UnresolvableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contained(id) => write!(f, "contained reference: #{id}"),
            Self::Urn(urn) => write!(f, "URN reference: {urn}"),
            Self::External(url) => write!(f, "external reference: {url}"),
            Self::Invalid(reason) => write!(f, "invalid reference: {reason}"),
        }
    }
}

impl std::error::Error for UnresolvableReference {}

/// Parse a reference string into its `(type, id)` components.
///
/// `base_url` is the ledger's own FHIR base; absolute URLs under it are
/// treated as local references, all other absolute URLs are external.
pub fn parse_reference(
    reference: &str,
    base_url: Option<&str>,
) -> Result<ResourceReference, UnresolvableReference> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(UnresolvableReference::Invalid("empty reference".to_string()));
    }

    if let Some(contained_id) = reference.strip_prefix('#') {
        return Err(UnresolvableReference::Contained(contained_id.to_string()));
    }

    if reference.starts_with("urn:") {
        return Err(UnresolvableReference::Urn(reference.to_string()));
    }

    let path = if reference.contains("://") {
        let Some(base) = base_url else {
            return Err(UnresolvableReference::External(reference.to_string()));
        };
        match reference.strip_prefix(base.trim_end_matches('/')) {
            Some(suffix) => suffix.trim_start_matches('/'),
            None => return Err(UnresolvableReference::External(reference.to_string())),
        }
    } else {
        reference
    };

    let mut parts = path.split('/');
    let (Some(resource_type), Some(id), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(UnresolvableReference::Invalid(format!(
            "reference must have the form Type/id: {reference}"
        )));
    };

    if !resource_type
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
    {
        return Err(UnresolvableReference::Invalid(format!(
            "resource type must start with uppercase letter: {resource_type}"
        )));
    }

    if id.is_empty() {
        return Err(UnresolvableReference::Invalid(
            "resource id cannot be empty".to_string(),
        ));
    }

    Ok(ResourceReference::new(resource_type, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_reference() {
        let r = parse_reference("Patient/p1", None).unwrap();
        assert_eq!(r, ResourceReference::new("Patient", "p1"));
        assert_eq!(r.to_string(), "Patient/p1");
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let r = parse_reference("  Coverage/cov-1 ", None).unwrap();
        assert_eq!(r.id, "cov-1");
    }

    #[test]
    fn test_absolute_url_under_base() {
        let r = parse_reference(
            "http://localhost:5000/fhir/Organization/ins1",
            Some("http://localhost:5000/fhir/"),
        )
        .unwrap();
        assert_eq!(r, ResourceReference::new("Organization", "ins1"));
    }

    #[test]
    fn test_absolute_url_without_base_is_external() {
        let result = parse_reference("http://other.example/fhir/Patient/p1", None);
        assert!(matches!(result, Err(UnresolvableReference::External(_))));

        let result = parse_reference(
            "http://other.example/fhir/Patient/p1",
            Some("http://localhost:5000/fhir"),
        );
        assert!(matches!(result, Err(UnresolvableReference::External(_))));
    }

    #[test]
    fn test_contained_and_urn_references() {
        assert!(matches!(
            parse_reference("#cov", None),
            Err(UnresolvableReference::Contained(id)) if id == "cov"
        ));
        assert!(matches!(
            parse_reference("urn:uuid:550e8400-e29b-41d4-a716-446655440000", None),
            Err(UnresolvableReference::Urn(_))
        ));
    }

    #[test]
    fn test_invalid_shapes() {
        for bad in ["", "   ", "Patient", "Patient/", "patient/p1", "Patient/p1/_history/2"] {
            assert!(
                matches!(parse_reference(bad, None), Err(UnresolvableReference::Invalid(_))),
                "expected invalid: {bad:?}"
            );
        }
    }
}
