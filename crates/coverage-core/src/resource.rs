//! Typed model of the five ledger resource types.
//!
//! Each struct names the fields the ledger reads and keeps every other
//! element in `extra`, so decoding and re-encoding never drops data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fhir::ResourceType;
use crate::fhir_reference::ResourceReference;
use crate::time::FhirDate;

/// Elements not modelled explicitly, kept verbatim.
pub type Extra = Map<String, Value>;

/// A FHIR `Reference` datatype.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Reference {
    pub fn to(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            extra: Extra::new(),
        }
    }

    pub fn of(target: &ResourceReference) -> Self {
        Self::to(target.to_relative())
    }

    pub fn as_str(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

/// A FHIR `Period`; an absent bound is open-ended.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<FhirDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<FhirDate>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Period {
    /// Inclusive on both ends.
    pub fn contains(&self, date: time::Date) -> bool {
        let after_start = self.start.as_ref().is_none_or(|start| start.date() <= date);
        let before_end = self.end.as_ref().is_none_or(|end| date <= end.date());
        after_start && before_end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<FhirDate>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub id: String,
    pub status: String,
    pub beneficiary: Reference,
    pub payor: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriber: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInsurance {
    pub coverage: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageEligibilityRequest {
    pub id: String,
    pub status: String,
    pub purpose: Vec<String>,
    pub patient: Reference,
    pub created: FhirDate,
    pub insurer: Reference,
    pub insurance: Vec<RequestInsurance>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl CoverageEligibilityRequest {
    /// The coverage named by the first insurance entry.
    pub fn primary_coverage(&self) -> Option<&Reference> {
        self.insurance.first().map(|insurance| &insurance.coverage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseInsurance {
    pub coverage: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inforce: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageEligibilityResponse {
    pub id: String,
    pub status: String,
    pub purpose: Vec<String>,
    pub patient: Reference,
    pub created: FhirDate,
    pub request: Reference,
    pub outcome: String,
    pub insurer: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insurance: Vec<ResponseInsurance>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl CoverageEligibilityResponse {
    /// The in-force determination carried by the first insurance entry.
    pub fn inforce(&self) -> Option<bool> {
        self.insurance.first().and_then(|insurance| insurance.inforce)
    }
}

/// A schema-valid ledger resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Coverage(Coverage),
    CoverageEligibilityRequest(CoverageEligibilityRequest),
    CoverageEligibilityResponse(CoverageEligibilityResponse),
    Organization(Organization),
    Patient(Patient),
}

impl Resource {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Resource::Coverage(_) => ResourceType::Coverage,
            Resource::CoverageEligibilityRequest(_) => ResourceType::CoverageEligibilityRequest,
            Resource::CoverageEligibilityResponse(_) => ResourceType::CoverageEligibilityResponse,
            Resource::Organization(_) => ResourceType::Organization,
            Resource::Patient(_) => ResourceType::Patient,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Resource::Coverage(r) => &r.id,
            Resource::CoverageEligibilityRequest(r) => &r.id,
            Resource::CoverageEligibilityResponse(r) => &r.id,
            Resource::Organization(r) => &r.id,
            Resource::Patient(r) => &r.id,
        }
    }

    /// `Type/id` reference to this resource.
    pub fn reference(&self) -> ResourceReference {
        ResourceReference::new(self.resource_type().as_str(), self.id())
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn as_coverage(&self) -> Option<&Coverage> {
        match self {
            Resource::Coverage(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_eligibility_request(&self) -> Option<&CoverageEligibilityRequest> {
        match self {
            Resource::CoverageEligibilityRequest(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_eligibility_response(&self) -> Option<&CoverageEligibilityResponse> {
        match self {
            Resource::CoverageEligibilityResponse(r) => Some(r),
            _ => None,
        }
    }
}
