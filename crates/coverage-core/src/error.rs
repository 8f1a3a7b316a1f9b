use thiserror::Error;

use crate::validation::ValidationIssue;

/// Caller-facing error taxonomy for resource operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Resource of type {resource_type} with id '{id}' does not exist")]
    NotFound { resource_type: String, id: String },

    #[error("Referenced resource '{reference}' could not be resolved: {reason}")]
    ReferenceNotFound { reference: String, reason: String },

    #[error("Unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    #[error("FHIR validation error for {resource_type}: {}", summarize(.issues))]
    SchemaValidation {
        resource_type: String,
        issues: Vec<ValidationIssue>,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Internal invariant violated: {message}")]
    InternalInvariantViolation {
        message: String,
        issues: Vec<ValidationIssue>,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoreError {
    /// Create a new NotFound error
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create a new ReferenceNotFound error
    pub fn reference_not_found(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ReferenceNotFound {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create a new UnsupportedResourceType error
    pub fn unsupported_resource_type(resource_type: impl Into<String>) -> Self {
        Self::UnsupportedResourceType(resource_type.into())
    }

    /// Create a new SchemaValidation error
    pub fn schema_validation(resource_type: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        Self::SchemaValidation {
            resource_type: resource_type.into(),
            issues,
        }
    }

    /// Create a new MalformedInput error
    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Create a new InternalInvariantViolation error
    pub fn invariant_violation(message: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        Self::InternalInvariantViolation {
            message: message.into(),
            issues,
        }
    }

    /// Create a new Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_reference_not_found(&self) -> bool {
        matches!(self, Self::ReferenceNotFound { .. })
    }

    /// Validation diagnostics carried by this error, if any
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::SchemaValidation { issues, .. }
            | Self::InternalInvariantViolation { issues, .. } => issues,
            _ => &[],
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::ReferenceNotFound { .. } => ErrorCategory::Reference,
            Self::UnsupportedResourceType(_) | Self::SchemaValidation { .. } => {
                ErrorCategory::Validation
            }
            Self::MalformedInput(_) => ErrorCategory::Serialization,
            Self::InternalInvariantViolation { .. } => ErrorCategory::Internal,
            Self::Storage(_) => ErrorCategory::Storage,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Reference,
    Serialization,
    Internal,
    Storage,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Reference => write!(f, "reference"),
            Self::Serialization => write!(f, "serialization"),
            Self::Internal => write!(f, "internal"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
