//! Resolution of cross-resource references against the store.
//!
//! References are resolved per call and never cached: the store may be
//! mutated between operations.

use coverage_core::{CoreError, Reference, Resource, ResourceType, Result, parse_reference};
use tracing::debug;

use crate::store::ResourceStore;

/// Resolves `Type/id` references to stored resources.
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    store: ResourceStore,
    base_url: Option<String>,
}

impl ReferenceResolver {
    pub fn new(store: ResourceStore) -> Self {
        Self {
            store,
            base_url: None,
        }
    }

    /// Absolute references under `base_url` are treated as local.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Resolves a reference string to the resource it names.
    ///
    /// # Errors
    ///
    /// Every way a reference can dangle (malformed string, unsupported type,
    /// missing target) is reported as `CoreError::ReferenceNotFound`, distinct
    /// from the `NotFound` of a direct lookup. Storage failures pass through.
    pub async fn resolve(&self, reference: &str) -> Result<Resource> {
        let parsed = parse_reference(reference, self.base_url.as_deref())
            .map_err(|e| CoreError::reference_not_found(reference, e.to_string()))?;

        let resource_type: ResourceType = parsed.resource_type.parse().map_err(|_| {
            CoreError::reference_not_found(
                reference,
                format!("{} is not a ledger resource type", parsed.resource_type),
            )
        })?;

        let target = self
            .store
            .try_load(resource_type, &parsed.id)
            .await
            .map_err(|e| match e {
                CoreError::MalformedInput(reason) => CoreError::reference_not_found(reference, reason),
                other => other,
            })?;

        match target {
            Some(resource) => {
                debug!(reference, "Reference resolved");
                Ok(resource)
            }
            None => Err(CoreError::reference_not_found(
                reference,
                format!("{parsed} does not exist"),
            )),
        }
    }

    /// Resolves a `Reference` element and checks the target's type.
    pub async fn resolve_as(&self, reference: &Reference, expected: ResourceType) -> Result<Resource> {
        let Some(target) = reference.as_str() else {
            return Err(CoreError::reference_not_found(
                "",
                format!("reference to {expected} has no target"),
            ));
        };

        let resource = self.resolve(target).await?;
        if resource.resource_type() != expected {
            return Err(CoreError::reference_not_found(
                target,
                format!("expected a {expected}, found a {}", resource.resource_type()),
            ));
        }
        Ok(resource)
    }
}
