//! # coverage-core
//!
//! Resource model for the coverage ledger: the five supported FHIR resource
//! types, their schema validation, encoding and merge-patch semantics.

pub mod codec;
pub mod error;
pub mod fhir;
pub mod fhir_reference;
pub mod patch;
pub mod resource;
pub mod time;
pub mod validation;

pub use codec::{decode, decode_any, decode_value, encode};
pub use error::{CoreError, ErrorCategory, Result};
pub use fhir::ResourceType;
pub use fhir_reference::{ResourceReference, UnresolvableReference, parse_reference};
pub use patch::{merge, merge_resources};
pub use resource::{
    Coverage, CoverageEligibilityRequest, CoverageEligibilityResponse, Organization, Patient,
    Period, Reference, RequestInsurance, Resource, ResponseInsurance,
};
pub use self::time::FhirDate;
pub use validation::{IssueSeverity, ValidationIssue, operation_outcome};
