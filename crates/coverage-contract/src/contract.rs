//! Named transactions of the coverage ledger over serialized resources.

use std::sync::Arc;

use coverage_core::{CoreError, Resource, Result, encode};
use coverage_notifications::{EventBus, EventPublisher, MemoryEventBus, NatsEventBus};
use coverage_storage::{ReferenceResolver, ResourceStore, WorldState};
use time::Date;
use tracing::info;

use crate::config::{AppConfig, BusBackend};
use crate::eligibility::EligibilityEvaluator;
use crate::service::{AddOutcome, ResourceService};

/// The ledger's transaction surface.
///
/// Every transaction takes and returns resources as JSON text; the typed
/// operations live on [`ResourceService`].
#[derive(Debug)]
pub struct CoverageContract {
    service: ResourceService,
}

impl CoverageContract {
    pub fn new(service: ResourceService) -> Self {
        Self { service }
    }

    /// Wire the contract from configuration, choosing the configured bus.
    pub fn from_config(config: &AppConfig, state: Arc<dyn WorldState>) -> std::result::Result<Self, String> {
        let bus: Arc<dyn EventBus> = match config.event_bus.backend {
            BusBackend::Nats => Arc::new(NatsEventBus::new(config.event_bus.nats_settings()?)),
            BusBackend::Memory => Arc::new(MemoryEventBus::new()),
        };
        Ok(Self::with_bus(config, state, bus))
    }

    /// Wire the contract from configuration with an explicit bus.
    pub fn with_bus(config: &AppConfig, state: Arc<dyn WorldState>, bus: Arc<dyn EventBus>) -> Self {
        let store = ResourceStore::new(state);
        let resolver = match &config.references.base_url {
            Some(base_url) => ReferenceResolver::new(store.clone()).with_base_url(base_url),
            None => ReferenceResolver::new(store.clone()),
        };
        let evaluator = EligibilityEvaluator::new(resolver, config.eligibility.clone());
        let publisher = Arc::new(EventPublisher::new(bus));
        Self::new(ResourceService::new(
            store,
            evaluator,
            publisher,
            config.event_bus.subject.clone(),
        ))
    }

    pub fn service(&self) -> &ResourceService {
        &self.service
    }

    /// No state to seed; kept so hosts can call it unconditionally.
    pub async fn init_ledger(&self) -> Result<()> {
        info!(backend = self.service.store().backend_name(), "Ledger initialized");
        Ok(())
    }

    pub async fn query_resource(&self, id: &str, resource_type: &str) -> Result<String> {
        let resource = self.service.query(id, resource_type).await?;
        to_text(&resource)
    }

    /// Returns the eligibility response when the resource was an eligibility
    /// request.
    pub async fn add_resource(&self, id: &str, raw: &str, as_of: Date) -> Result<Option<String>> {
        let AddOutcome { response, .. } = self.service.add(id, raw.as_bytes(), as_of).await?;
        response.as_ref().map(to_text).transpose()
    }

    pub async fn replace_resource(&self, id: &str, raw: &str) -> Result<()> {
        self.service.replace(id, raw.as_bytes()).await.map(|_| ())
    }

    pub async fn update_resource(&self, id: &str, raw: &str) -> Result<()> {
        self.service.update(id, raw.as_bytes()).await.map(|_| ())
    }
}

fn to_text(resource: &Resource) -> Result<String> {
    String::from_utf8(encode(resource)?).map_err(|e| {
        CoreError::invariant_violation(format!("encoded resource is not UTF-8: {e}"), Vec::new())
    })
}
