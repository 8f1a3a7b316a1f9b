//! Storage error types for the world-state abstraction.

use std::fmt;

use coverage_core::CoreError;

/// Errors that can occur during world-state operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested record was not found.
    #[error("Resource not found: {resource_type}/{id}")]
    NotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// The ID of the resource that was not found.
        id: String,
    },

    /// A key component cannot be encoded into a composite key.
    #[error("Invalid key component '{component}': {message}")]
    InvalidKey {
        /// The rejected component.
        component: String,
        /// Why it was rejected.
        message: String,
    },

    /// The backend does not offer the requested capability.
    #[error("Operation not supported by {backend}: {operation}")]
    Unsupported {
        /// Backend name.
        backend: &'static str,
        /// The unsupported operation.
        operation: &'static str,
    },

    /// The world-state collaborator failed.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKey {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Unsupported` error.
    #[must_use]
    pub fn unsupported(backend: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidKey { .. } => ErrorCategory::Validation,
            Self::Unsupported { .. } => ErrorCategory::Capability,
            Self::Backend { .. } => ErrorCategory::Infrastructure,
        }
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { resource_type, id } => CoreError::not_found(resource_type, id),
            err @ StorageError::InvalidKey { .. } => CoreError::malformed_input(err.to_string()),
            other => CoreError::storage(other.to_string()),
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Record not found.
    NotFound,
    /// Key could not be built.
    Validation,
    /// Backend lacks a capability.
    Capability,
    /// Infrastructure/collaborator failure.
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Capability => write!(f, "capability"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("Patient", "p1");
        assert_eq!(err.to_string(), "Resource not found: Patient/p1");

        let err = StorageError::unsupported("memory", "compare_and_put");
        assert_eq!(
            err.to_string(),
            "Operation not supported by memory: compare_and_put"
        );
    }

    #[test]
    fn test_conversion_into_core_error() {
        let core: CoreError = StorageError::not_found("Coverage", "cov1").into();
        assert!(core.is_not_found());

        let core: CoreError = StorageError::backend("peer unavailable").into();
        assert!(matches!(core, CoreError::Storage(ref m) if m.contains("peer unavailable")));

        let core: CoreError = StorageError::invalid_key("a\0b", "contains U+0000").into();
        assert!(matches!(core, CoreError::MalformedInput(_)));
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found("Patient", "p1").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::invalid_key("a\0b", "contains U+0000").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            StorageError::backend("boom").category().to_string(),
            "infrastructure"
        );
    }
}
