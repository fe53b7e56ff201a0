//! Error types for the record consumer.

use thiserror::Error;

/// Errors that can occur while building or running the record consumer.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Building the underlying Kafka client failed.
    #[error("Failed to create consumer: {0}")]
    Create(#[source] rdkafka::error::KafkaError),

    /// Subscribing to the registered topics failed.
    #[error("Failed to subscribe to {topics}: {source}")]
    Subscribe {
        topics: String,
        #[source]
        source: rdkafka::error::KafkaError,
    },

    /// A handler is already registered for this topic.
    #[error("A handler is already registered for topic {0}")]
    HandlerExists(String),

    /// The consumer is polling; registration is closed and a second poll
    /// loop cannot start.
    #[error("Consumer is already polling")]
    AlreadyPolling,

    /// Polling was requested with no handlers registered.
    #[error("Cannot poll with no handlers registered")]
    NoHandlers,
}

impl ConsumerError {
    /// Returns `true` if the error is a wiring mistake in this process
    /// rather than a broker failure.
    #[must_use]
    pub const fn is_registration(&self) -> bool {
        matches!(
            self,
            Self::HandlerExists(_) | Self::AlreadyPolling | Self::NoHandlers
        )
    }
}
