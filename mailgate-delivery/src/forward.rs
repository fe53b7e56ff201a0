//! The forwarding step between intake and the provider.

use mailgate_common::envelope::{Envelope, Mailbox};
use tracing::debug;

use crate::{DeliveryConfig, DeliveryError, Mailer};

/// What a successful forward produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// Identifier the provider assigned to the forwarded message.
    pub message_id: String,
}

/// Send `envelope` onward through `mailer`.
///
/// The message goes out as the configured forwarding identity with the
/// original sender in the reply-to seat, and each recipient runs through
/// the configured remapping. The provider is invoked exactly once; a
/// failure comes back classified, never retried. Redelivery, if any,
/// comes from the intake consumer's at-least-once semantics.
///
/// # Errors
///
/// The provider failure, classified permanent, retryable, or system;
/// see [`DeliveryError`].
pub async fn forward_inbound(
    envelope: &Envelope,
    config: &DeliveryConfig,
    mailer: &dyn Mailer,
) -> Result<SendOutcome, DeliveryError> {
    let outbound = envelope.forwarded(
        Mailbox::new(None, config.forward_from.clone()),
        |recipient| {
            config
                .destination(&recipient.address)
                .map(|destination| Mailbox::new(None, destination))
        },
    );

    let response = mailer.send(&outbound).await?;

    debug!(message_id = %response.message_id, "Forwarded inbound email");

    Ok(SendOutcome {
        message_id: response.message_id,
    })
}
