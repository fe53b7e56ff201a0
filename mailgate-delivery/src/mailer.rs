//! The outbound mail transport seam.

use async_trait::async_trait;
use mailgate_common::envelope::Envelope;
use serde::Deserialize;

use crate::MailerError;

/// Receipt for a send the provider accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResponse {
    /// Identifier the provider assigned to the accepted message.
    pub message_id: String,
}

/// Provider-side view of a previously sent message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SentEmail {
    /// Provider message id.
    pub id: String,
    /// Address the message went out as.
    #[serde(default)]
    pub from: String,
    /// Destination addresses.
    #[serde(default)]
    pub to: Vec<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Provider delivery status, e.g. `queued` or `delivered`.
    #[serde(default)]
    pub status: String,
}

/// Async mail transport.
///
/// The forwarding logic only ever talks to the provider through this
/// trait, so tests can script a [`MockMailer`](crate::MockMailer) and
/// another provider can slot in without touching the pipeline.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Hand `envelope` to the provider for sending.
    async fn send(&self, envelope: &Envelope) -> Result<SendResponse, MailerError>;

    /// Look up a previously sent message by its provider id.
    ///
    /// This is the capability a dead-letter or status-tracking layer
    /// builds on; the forwarding path itself never calls it.
    async fn get_email(&self, message_id: &str) -> Result<SentEmail, MailerError>;
}
