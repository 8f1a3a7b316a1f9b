//! Composite keys that address records in the world state.
//!
//! A key is built from the resource type and the normalized id, framed by
//! U+0000 separators so no two `(type, id)` pairs can produce the same key:
//!
//! ```
//! use coverage_storage::CompositeKey;
//!
//! let key = CompositeKey::new("Patient", " P1 ").unwrap();
//! assert_eq!(key.as_str(), "\u{0}Patient\u{0}p1\u{0}");
//! assert_eq!(key.id(), "p1");
//! ```

use std::fmt;

use crate::error::StorageError;

const SEPARATOR: char = '\u{0}';

/// A world-state key for one `(type, id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    key: String,
    resource_type: String,
    id: String,
}

impl CompositeKey {
    /// Builds the key for `resource_type` and `id`.
    ///
    /// The id is normalized first (see [`normalize_id`]), so ids that differ
    /// only in case or surrounding whitespace address the same record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` if either component contains U+0000
    /// or is empty after normalization.
    pub fn new(resource_type: &str, id: &str) -> Result<Self, StorageError> {
        check_component(resource_type)?;
        check_component(id)?;

        let id = normalize_id(id);
        if resource_type.is_empty() || id.is_empty() {
            return Err(StorageError::invalid_key(
                format!("{resource_type}/{id}"),
                "key components must not be empty",
            ));
        }

        Ok(Self {
            key: format!("{SEPARATOR}{resource_type}{SEPARATOR}{id}{SEPARATOR}"),
            resource_type: resource_type.to_string(),
            id,
        })
    }

    /// The encoded key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// The normalized id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// Normalizes an id for key derivation: surrounding whitespace is trimmed and
/// letters are lowercased.
pub fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase()
}

fn check_component(component: &str) -> Result<(), StorageError> {
    if component.contains(SEPARATOR) {
        return Err(StorageError::invalid_key(
            component.escape_default().to_string(),
            "key components must not contain U+0000",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_collapses_case_and_whitespace() {
        let a = CompositeKey::new("Coverage", "COV1").unwrap();
        let b = CompositeKey::new("Coverage", "  cov1\t").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_type_is_part_of_the_key() {
        let patient = CompositeKey::new("Patient", "x1").unwrap();
        let org = CompositeKey::new("Organization", "x1").unwrap();
        assert_ne!(patient.as_str(), org.as_str());
    }

    #[test]
    fn test_separator_in_components_is_rejected() {
        assert!(CompositeKey::new("Patient", "a\0b").is_err());
        assert!(CompositeKey::new("Pat\0ient", "a").is_err());
    }

    #[test]
    fn test_empty_components_are_rejected() {
        assert!(CompositeKey::new("Patient", "   ").is_err());
        assert!(CompositeKey::new("", "p1").is_err());
    }

    #[test]
    fn test_components_are_exposed_normalized() {
        let key = CompositeKey::new("CoverageEligibilityRequest", "Req-1").unwrap();
        assert_eq!(key.resource_type(), "CoverageEligibilityRequest");
        assert_eq!(key.id(), "req-1");
        assert_eq!(key.to_string(), "CoverageEligibilityRequest/req-1");
    }
}
