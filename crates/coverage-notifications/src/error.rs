use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Publish not acknowledged: {0}")]
    Ack(String),
}

impl PublishError {
    /// Connection failures are retried on the next publish.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}
