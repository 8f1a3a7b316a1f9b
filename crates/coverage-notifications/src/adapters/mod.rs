pub mod memory;
pub mod nats;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PublishError;
use crate::types::{OutboundMessage, PublishAck};

/// An event bus that can open connections
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Open a connection; called at most once per successful publisher
    async fn connect(&self) -> Result<Arc<dyn BusConnection>, PublishError>;

    /// Bus name for logging
    fn name(&self) -> &'static str;
}

/// An established connection to the event bus
#[async_trait]
pub trait BusConnection: Send + Sync {
    /// Publish a message and wait for the bus acknowledgement
    async fn publish(&self, message: &OutboundMessage) -> Result<PublishAck, PublishError>;
}

pub use memory::MemoryEventBus;
pub use nats::NatsEventBus;
