//! Coverage eligibility evaluation.
//!
//! A request is in force when the coverage it names is paid by the request's
//! insurer, subscribed by the request's patient, and its period contains the
//! request's `created` date (both bounds inclusive).

use coverage_core::codec::revalidate;
use coverage_core::resource::Extra;
use coverage_core::{
    CoreError, Coverage, CoverageEligibilityRequest, CoverageEligibilityResponse, FhirDate,
    Reference, Resource, ResourceType, ResponseInsurance, Result, parse_reference,
};
use coverage_storage::{ReferenceResolver, normalize_id};
use serde_json::json;
use time::Date;
use tracing::{debug, info, instrument};

use crate::config::EligibilityConfig;

const NARRATIVE: &str = "<div xmlns=\"http://www.w3.org/1999/xhtml\">A human-readable rendering of the CoverageEligibilityResponse.</div>";

/// Evaluates eligibility requests against the ledger.
#[derive(Debug, Clone)]
pub struct EligibilityEvaluator {
    resolver: ReferenceResolver,
    settings: EligibilityConfig,
}

impl EligibilityEvaluator {
    pub fn new(resolver: ReferenceResolver, settings: EligibilityConfig) -> Self {
        Self { resolver, settings }
    }

    /// Evaluate `request` and build the response stamped with `as_of`.
    ///
    /// # Errors
    ///
    /// `ReferenceNotFound` if the patient, insurer or coverage cannot be
    /// resolved; `InternalInvariantViolation` if the built response does not
    /// validate.
    #[instrument(skip(self, request), fields(request_id = %request.id, as_of = %as_of))]
    pub async fn evaluate(&self, request: &CoverageEligibilityRequest, as_of: Date) -> Result<Resource> {
        let patient = self
            .resolver
            .resolve_as(&request.patient, ResourceType::Patient)
            .await?;
        let insurer = self
            .resolver
            .resolve_as(&request.insurer, ResourceType::Organization)
            .await?;
        let coverage_ref = request.primary_coverage().ok_or_else(|| {
            CoreError::reference_not_found("", "request names no coverage to evaluate")
        })?;
        let coverage = self
            .resolver
            .resolve_as(coverage_ref, ResourceType::Coverage)
            .await?;
        let coverage = coverage.as_coverage().ok_or_else(|| {
            CoreError::invariant_violation("resolved coverage is not a Coverage", Vec::new())
        })?;
        debug!("Resolved patient, insurer and coverage");

        let inforce = self.is_in_force(request, coverage, &patient, &insurer);
        info!(inforce, "Eligibility determined");

        let response = self.build_response(request, coverage_ref, inforce, as_of);
        revalidate(&response).map_err(|err| {
            CoreError::invariant_violation(
                format!("generated eligibility response {} is invalid", request.id),
                err.issues().to_vec(),
            )
        })?;
        Ok(response)
    }

    fn is_in_force(
        &self,
        request: &CoverageEligibilityRequest,
        coverage: &Coverage,
        patient: &Resource,
        insurer: &Resource,
    ) -> bool {
        let payor_matches = coverage
            .payor
            .first()
            .is_some_and(|payor| self.names(payor, insurer));
        let subscriber_matches = coverage
            .subscriber
            .as_ref()
            .is_some_and(|subscriber| self.names(subscriber, patient));
        let created = request.created.date();
        let in_period = coverage
            .period
            .as_ref()
            .is_some_and(|period| period.contains(created));

        debug!(payor_matches, subscriber_matches, in_period, %created, "Coverage rule inputs");
        payor_matches && subscriber_matches && in_period
    }

    /// Whether `reference` points at `target`, comparing normalized keys.
    fn names(&self, reference: &Reference, target: &Resource) -> bool {
        reference
            .as_str()
            .and_then(|r| parse_reference(r, self.resolver.base_url()).ok())
            .is_some_and(|parsed| {
                parsed.resource_type == target.resource_type().as_str()
                    && normalize_id(&parsed.id) == normalize_id(target.id())
            })
    }

    fn build_response(
        &self,
        request: &CoverageEligibilityRequest,
        coverage: &Reference,
        inforce: bool,
        as_of: Date,
    ) -> Resource {
        let disposition = if inforce {
            &self.settings.in_force_disposition
        } else {
            &self.settings.not_in_force_disposition
        };

        let mut extra = Extra::new();
        extra.insert(
            "text".into(),
            json!({"status": "generated", "div": NARRATIVE}),
        );
        extra.insert(
            "identifier".into(),
            json!([{
                "system": format!("{}{}", self.settings.identifier_system, request.id),
                "value": request.id,
            }]),
        );

        Resource::CoverageEligibilityResponse(CoverageEligibilityResponse {
            id: request.id.clone(),
            status: "active".into(),
            purpose: vec!["validation".into()],
            patient: request.patient.clone(),
            created: FhirDate::new(as_of),
            request: Reference::to(format!("CoverageEligibilityRequest/{}", request.id)),
            outcome: "complete".into(),
            insurer: request.insurer.clone(),
            disposition: Some(disposition.clone()),
            insurance: vec![ResponseInsurance {
                coverage: coverage.clone(),
                inforce: Some(inforce),
                extra: Extra::new(),
            }],
            extra,
        })
    }
}
