use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Default subject for coverage eligibility responses
pub const DEFAULT_SUBJECT: &str = "EVENTS.coverageeligibilityresponse";

/// Header carrying the deduplication key
pub const MSG_ID_HEADER: &str = "Nats-Msg-Id";

/// Acknowledgement returned by the event bus for a publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishAck {
    pub stream: String,
    pub sequence: u64,
    /// The bus already held a message with the same identifier
    pub duplicate: bool,
}

/// A message ready to hand to a bus connection
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub subject: String,
    /// Deduplication key, taken from the resource id
    pub message_id: String,
    pub payload: Bytes,
}

impl OutboundMessage {
    pub fn new(
        subject: impl Into<String>,
        message_id: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            subject: subject.into(),
            message_id: message_id.into(),
            payload: payload.into(),
        }
    }
}

/// Connection parameters for the NATS adapter
#[derive(Debug, Clone)]
pub struct NatsSettings {
    pub server_address: String,
    /// NKey seed used to sign the server's auth challenge
    pub nkey_seed: Option<String>,
    /// Trust anchor for the server certificate
    pub ca_file: Option<PathBuf>,
    pub client_name: String,
    pub connect_timeout: Duration,
}

impl Default for NatsSettings {
    fn default() -> Self {
        Self {
            server_address: "tls://nats-server:4222".to_string(),
            nkey_seed: None,
            ca_file: None,
            client_name: "coverage-ledger".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}
