pub mod config;
pub mod consumer;
pub mod error;
pub mod handler;

pub use config::{KafkaConfig, TopicConfig};
pub use consumer::RecordConsumer;
pub use error::ConsumerError;
pub use handler::{Record, RecordHandler};
