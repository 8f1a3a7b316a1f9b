use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Resource types handled by the coverage ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Coverage,
    CoverageEligibilityRequest,
    CoverageEligibilityResponse,
    Organization,
    Patient,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::Coverage,
        ResourceType::CoverageEligibilityRequest,
        ResourceType::CoverageEligibilityResponse,
        ResourceType::Organization,
        ResourceType::Patient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Coverage => "Coverage",
            ResourceType::CoverageEligibilityRequest => "CoverageEligibilityRequest",
            ResourceType::CoverageEligibilityResponse => "CoverageEligibilityResponse",
            ResourceType::Organization => "Organization",
            ResourceType::Patient => "Patient",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::unsupported_resource_type(s))
    }
}
