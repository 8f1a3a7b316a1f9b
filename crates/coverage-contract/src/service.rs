//! Resource operations over the ledger: query, add, replace and update.

use std::sync::Arc;

use coverage_core::codec::{declared_type, decode_value, parse_document};
use coverage_core::{
    CoreError, Resource, ResourceType, Result, ValidationIssue, decode_any, merge_resources,
};
use coverage_notifications::{EventPublisher, PublishAck};
use coverage_storage::{ResourceStore, normalize_id};
use serde_json::Value;
use time::Date;
use tracing::{info, instrument, warn};

use crate::eligibility::EligibilityEvaluator;

/// What happened to the event for an eligibility response.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishStatus {
    Published(PublishAck),
    /// Delivery failed; the stored record stands
    Failed(String),
}

impl PublishStatus {
    pub fn ack(&self) -> Option<&PublishAck> {
        match self {
            Self::Published(ack) => Some(ack),
            Self::Failed(_) => None,
        }
    }
}

/// Result of a successful `add`.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub stored: Resource,
    /// Whether the add overwrote an existing record
    pub replaced: bool,
    /// Eligibility response, for eligibility requests only
    pub response: Option<Resource>,
    pub publish: Option<PublishStatus>,
}

pub struct ResourceService {
    store: ResourceStore,
    evaluator: EligibilityEvaluator,
    publisher: Arc<EventPublisher>,
    subject: String,
}

impl ResourceService {
    pub fn new(
        store: ResourceStore,
        evaluator: EligibilityEvaluator,
        publisher: Arc<EventPublisher>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            store,
            evaluator,
            publisher,
            subject: subject.into(),
        }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Read a stored resource.
    #[instrument(skip(self))]
    pub async fn query(&self, id: &str, resource_type: &str) -> Result<Resource> {
        let resource_type: ResourceType = resource_type.parse()?;
        self.store.load(resource_type, id).await
    }

    /// Store a resource, creating or overwriting it.
    ///
    /// Eligibility requests are evaluated before anything is written, so a
    /// dangling reference leaves the ledger untouched. The response is
    /// published after the write; a failed publish is logged and reported on
    /// the outcome, never as an error.
    #[instrument(skip(self, raw))]
    pub async fn add(&self, id: &str, raw: &[u8], as_of: Date) -> Result<AddOutcome> {
        let resource = decode_any(raw)?;
        check_id(id, &resource)?;

        let response = match resource.as_eligibility_request() {
            Some(request) => Some(self.evaluator.evaluate(request, as_of).await.inspect_err(|e| {
                warn!(
                    category = %e.category(),
                    error = %e,
                    request_id = request.id.as_str(),
                    "Eligibility evaluation failed; nothing stored"
                );
            })?),
            None => None,
        };

        let replaced = self.write(&resource).await?;

        let publish = match &response {
            Some(response) => Some(self.publish(response).await),
            None => None,
        };

        Ok(AddOutcome {
            stored: resource,
            replaced,
            response,
            publish,
        })
    }

    /// Store a resource, creating it if absent.
    #[instrument(skip(self, raw))]
    pub async fn replace(&self, id: &str, raw: &[u8]) -> Result<Resource> {
        let resource = decode_any(raw)?;
        check_id(id, &resource)?;

        if !self.write(&resource).await? {
            info!(
                resource_type = %resource.resource_type(),
                id = resource.id(),
                "Resource did not exist; created"
            );
        }
        Ok(resource)
    }

    /// Merge a partial resource into an existing one.
    ///
    /// The existing record is read before the patch is validated.
    ///
    /// # Errors
    ///
    /// `NotFound` if the record does not exist; `SchemaValidation` if the
    /// patch or the merged result is invalid.
    #[instrument(skip(self, raw))]
    pub async fn update(&self, id: &str, raw: &[u8]) -> Result<Resource> {
        let document = parse_document(raw)?;
        let resource_type = declared_type(&document)?;

        let target = if id.trim().is_empty() {
            document.get("id").and_then(Value::as_str).unwrap_or_default()
        } else {
            id
        };
        if target.trim().is_empty() {
            return Err(CoreError::schema_validation(
                resource_type.as_str(),
                vec![ValidationIssue::required(format!("{resource_type}.id"))],
            ));
        }
        let existing = self.store.load(resource_type, target).await?;

        let patch = decode_value(resource_type, document)?;
        check_id(id, &patch)?;
        let merged = merge_resources(&existing, &patch)?;
        self.store.save(&merged).await?;

        info!(
            resource_type = %merged.resource_type(),
            id = merged.id(),
            "Resource updated"
        );
        Ok(merged)
    }

    /// Write `resource`, returning whether a record was overwritten.
    async fn write(&self, resource: &Resource) -> Result<bool> {
        let existed = self
            .store
            .exists(resource.resource_type(), resource.id())
            .await?;
        if existed {
            info!(
                resource_type = %resource.resource_type(),
                id = resource.id(),
                "Resource exists; replacing"
            );
        }
        self.store.save(resource).await?;
        info!(
            resource_type = %resource.resource_type(),
            id = resource.id(),
            backend = self.store.backend_name(),
            "Resource stored"
        );
        Ok(existed)
    }

    async fn publish(&self, response: &Resource) -> PublishStatus {
        match self.publisher.publish(&self.subject, response).await {
            Ok(ack) => PublishStatus::Published(ack),
            Err(e) => {
                warn!(
                    error = %e,
                    subject = %self.subject,
                    id = response.id(),
                    "Failed to publish eligibility response; stored record stands"
                );
                PublishStatus::Failed(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for ResourceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("store", &self.store)
            .field("publisher", &self.publisher)
            .field("subject", &self.subject)
            .finish()
    }
}

/// The operation's id argument must name the record it carries; an empty
/// argument defers to the record.
fn check_id(id: &str, resource: &Resource) -> Result<()> {
    if id.trim().is_empty() || normalize_id(id) == normalize_id(resource.id()) {
        return Ok(());
    }
    Err(CoreError::schema_validation(
        resource.resource_type().as_str(),
        vec![ValidationIssue::invalid_value(
            "id",
            format!(
                "operation id '{id}' does not match resource id '{}'",
                resource.id()
            ),
        )],
    ))
}
