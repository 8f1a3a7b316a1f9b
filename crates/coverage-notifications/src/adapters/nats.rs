//! NATS JetStream adapter.
//!
//! Connects with an NKey and a trust-anchor certificate and publishes through
//! JetStream so that the `Nats-Msg-Id` header drives server-side
//! deduplication.

use std::sync::Arc;

use async_nats::jetstream::{self, Context};
use async_nats::{ConnectOptions, HeaderMap};
use async_trait::async_trait;
use tracing::{debug, info};

use super::{BusConnection, EventBus};
use crate::error::PublishError;
use crate::types::{MSG_ID_HEADER, NatsSettings, OutboundMessage, PublishAck};

pub struct NatsEventBus {
    settings: NatsSettings,
}

impl NatsEventBus {
    pub fn new(settings: NatsSettings) -> Self {
        Self { settings }
    }

    fn connect_options(&self) -> ConnectOptions {
        let options = match &self.settings.nkey_seed {
            Some(seed) => ConnectOptions::with_nkey(seed.clone()),
            None => ConnectOptions::new(),
        };

        let options = options
            .name(&self.settings.client_name)
            .connection_timeout(self.settings.connect_timeout);

        match &self.settings.ca_file {
            Some(ca_file) => options
                .add_root_certificates(ca_file.clone())
                .require_tls(true),
            None => options,
        }
    }
}

#[async_trait]
impl EventBus for NatsEventBus {
    async fn connect(&self) -> Result<Arc<dyn BusConnection>, PublishError> {
        info!("Connecting to NATS at {}", self.settings.server_address);

        let client = self
            .connect_options()
            .connect(&self.settings.server_address)
            .await
            .map_err(|e| PublishError::Connect(format!("Failed to connect: {}", e)))?;

        info!("Connected to NATS at {}", self.settings.server_address);

        Ok(Arc::new(NatsConnection {
            jetstream: jetstream::new(client),
        }))
    }

    fn name(&self) -> &'static str {
        "nats"
    }
}

struct NatsConnection {
    jetstream: Context,
}

#[async_trait]
impl BusConnection for NatsConnection {
    async fn publish(&self, message: &OutboundMessage) -> Result<PublishAck, PublishError> {
        let mut headers = HeaderMap::new();
        headers.insert(MSG_ID_HEADER, message.message_id.as_str());

        let ack = self
            .jetstream
            .publish_with_headers(message.subject.clone(), headers, message.payload.clone())
            .await
            .map_err(|e| PublishError::Publish(format!("Failed to publish: {}", e)))?
            .await
            .map_err(|e| PublishError::Ack(format!("Failed to confirm publish: {}", e)))?;

        debug!(
            stream = %ack.stream,
            sequence = ack.sequence,
            duplicate = ack.duplicate,
            "JetStream publish acknowledged"
        );

        Ok(PublishAck {
            stream: ack.stream,
            sequence: ack.sequence,
            duplicate: ack.duplicate,
        })
    }
}
