//! Publisher of resource events with a lazily opened, shared connection.

use std::sync::Arc;

use coverage_core::{Resource, codec};
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use crate::adapters::{BusConnection, EventBus};
use crate::error::PublishError;
use crate::types::{OutboundMessage, PublishAck};

/// Publishes resources to the event bus.
///
/// The connection is opened on first publish. Concurrent first publishes
/// share a single connection attempt; a failed attempt leaves the publisher
/// unconnected so the next publish tries again.
pub struct EventPublisher {
    bus: Arc<dyn EventBus>,
    connection: OnceCell<Arc<dyn BusConnection>>,
}

impl EventPublisher {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self {
            bus,
            connection: OnceCell::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    /// Publish `resource` on `subject`, deduplicated by the resource id.
    #[instrument(skip(self, resource), fields(bus = self.bus.name(), id = resource.id()))]
    pub async fn publish(&self, subject: &str, resource: &Resource) -> Result<PublishAck, PublishError> {
        let payload = codec::encode(resource).map_err(|e| PublishError::Encode(e.to_string()))?;
        let message = OutboundMessage::new(subject, resource.id(), payload);

        let connection = self.connection().await?;
        let ack = connection.publish(&message).await?;

        info!(
            stream = %ack.stream,
            sequence = ack.sequence,
            duplicate = ack.duplicate,
            "Event published"
        );
        Ok(ack)
    }

    async fn connection(&self) -> Result<&Arc<dyn BusConnection>, PublishError> {
        self.connection
            .get_or_try_init(|| async {
                info!(bus = self.bus.name(), "Opening event bus connection");
                self.bus.connect().await
            })
            .await
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("bus", &self.bus.name())
            .field("connected", &self.is_connected())
            .finish()
    }
}
