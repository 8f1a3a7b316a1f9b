//! Event publishing for the coverage ledger.
//!
//! Eligibility responses are published to an event bus with a deduplication
//! key taken from the resource id. Two buses are provided: NATS JetStream for
//! deployments and an in-memory bus for tests and local runs.

pub mod adapters;
pub mod error;
pub mod publisher;
pub mod types;

pub use adapters::{BusConnection, EventBus, MemoryEventBus, NatsEventBus};
pub use error::PublishError;
pub use publisher::EventPublisher;
pub use types::{DEFAULT_SUBJECT, MSG_ID_HEADER, NatsSettings, OutboundMessage, PublishAck};
