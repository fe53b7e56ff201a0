//! The record handler bridging queue intake onto forwarding.

use std::sync::Arc;

use async_trait::async_trait;
use mailgate_common::envelope::Envelope;
use mailgate_queue::{Record, RecordHandler};
use mailgate_store::{EmailStore, NewEmailRecord};
use tracing::{debug, error, warn};

use crate::{DeliveryConfig, Mailer, forward::forward_inbound};

/// Handles records on the inbound-emails topic: decode, then forward.
///
/// Every outcome is terminal for the record and reported through the
/// logs alone, so one bad message can never hold up its batch or block
/// the commit of its siblings.
pub struct InboundEmailHandler {
    config: DeliveryConfig,
    mailer: Arc<dyn Mailer>,
    archive: Option<Arc<dyn EmailStore>>,
}

impl InboundEmailHandler {
    #[must_use]
    pub const fn new(
        config: DeliveryConfig,
        mailer: Arc<dyn Mailer>,
        archive: Option<Arc<dyn EmailStore>>,
    ) -> Self {
        Self {
            config,
            mailer,
            archive,
        }
    }

    /// Record a successful forward under its provider message id.
    async fn archive_forward(&self, envelope: &Envelope) {
        let (Some(archive), Some(message_id)) = (&self.archive, envelope.message_id()) else {
            return;
        };

        let record = NewEmailRecord {
            message_id: message_id.to_string(),
            sender: envelope.sender().address.clone(),
            recipients: envelope
                .recipients()
                .iter()
                .map(|recipient| recipient.address.clone())
                .collect(),
            subject: envelope.subject().to_string(),
        };

        // The send already happened; archiving is best-effort
        if let Err(error) = archive.create_email(record).await {
            warn!(message_id, %error, "Failed to archive forwarded email");
        }
    }
}

#[async_trait]
impl RecordHandler for InboundEmailHandler {
    async fn handle(&self, record: Record<'_>) {
        let mut envelope = match Envelope::parse(record.payload) {
            Ok(envelope) => envelope,
            Err(error) => {
                // Malformed input cannot become well-formed by reprocessing
                error!(
                    partition = record.partition,
                    offset = record.offset,
                    %error,
                    "Discarding undecodable inbound record"
                );
                return;
            }
        };

        match forward_inbound(&envelope, &self.config, self.mailer.as_ref()).await {
            Ok(outcome) => {
                debug!(
                    message_id = %outcome.message_id,
                    subject = envelope.subject(),
                    "Forwarded inbound email"
                );
                envelope.set_message_id(outcome.message_id);
                self.archive_forward(&envelope).await;
            }
            Err(error) => error!(
                partition = record.partition,
                offset = record.offset,
                status = error.status(),
                %error,
                "Dropping inbound email after failed forward"
            ),
        }
    }
}
