use serde::Deserialize;

const fn default_session_timeout_ms() -> u64 {
    6000
}

const fn default_max_batch_size() -> usize {
    64
}

const fn default_batch_linger_ms() -> u64 {
    50
}

fn default_inbound_topic() -> String {
    "inbound-emails".to_string()
}

/// Settings for the Kafka record consumer.
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// Comma-separated bootstrap brokers.
    pub brokers: String,

    /// Account name the consumer group is derived from.
    pub user: String,

    #[serde(default)]
    pub topics: TopicConfig,

    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// The most records dispatched between two commits.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// How long to keep draining follow-up records once a batch has opened.
    #[serde(default = "default_batch_linger_ms")]
    pub batch_linger_ms: u64,
}

/// The topics this service consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "default_inbound_topic")]
    pub inbound_emails: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            inbound_emails: default_inbound_topic(),
        }
    }
}

impl KafkaConfig {
    /// The consumer group this service joins.
    pub fn group_id(&self) -> String {
        format!("{}-email-svc", self.user)
    }
}
