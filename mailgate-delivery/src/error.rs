//! Typed error handling for forwarding operations.
//!
//! Provider failures are split three ways:
//! - Permanent failures (4xx other than 429) - the request itself was
//!   rejected and resending it cannot help
//! - Retryable failures (429 and 5xx) - the provider may accept the same
//!   send later
//! - System failures - no provider verdict at all (transport trouble,
//!   malformed responses)
//!
//! Nothing in this crate retries. Classification exists so the drop is
//! logged with the right severity, and so a dead-letter route can be
//! built on top of it later without reworking the callers.

use thiserror::Error;

/// Failures raised by a [`Mailer`](crate::Mailer) implementation.
#[derive(Debug, Error)]
pub enum MailerError {
    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Provider {
        /// HTTP status the provider answered with.
        status: u16,
        /// Response body, for the logs.
        body: String,
    },

    /// The request never reached a provider verdict.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider accepted the send but returned no message id.
    #[error("provider response carries no message id")]
    MissingMessageId,
}

impl MailerError {
    /// The provider status code, when the failure carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            Self::Transport(source) => source.status().map(|status| status.as_u16()),
            Self::MissingMessageId => None,
        }
    }
}

/// Top-level forwarding error.
///
/// The variant records how the send failed; the policy for every variant
/// is currently the same (log and drop), so redelivery only ever comes
/// from the intake consumer's at-least-once semantics.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The provider's verdict is final; do not resend.
    #[error("permanent failure: {0}")]
    Permanent(MailerError),

    /// The provider might accept the same send later.
    #[error("retryable failure: {0}")]
    Retryable(MailerError),

    /// No provider verdict was reached.
    #[error("system failure: {0}")]
    System(MailerError),
}

impl DeliveryError {
    /// Returns `true` if the provider rejected the request outright.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    /// Returns `true` if the same send might succeed later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    /// Returns `true` if no provider verdict was reached.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }

    /// The provider status code, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Permanent(source) | Self::Retryable(source) | Self::System(source) => {
                source.status()
            }
        }
    }
}

/// Classify a provider failure by its HTTP status.
///
/// - **429 and 5xx** are retryable: rate limits clear and outages end
/// - **any other 4xx** is permanent: the request itself was rejected
/// - **everything else** is a system failure with no provider verdict
impl From<MailerError> for DeliveryError {
    fn from(error: MailerError) -> Self {
        match error.status() {
            Some(429) => Self::Retryable(error),
            Some(status) if (500..600).contains(&status) => Self::Retryable(error),
            Some(status) if (400..500).contains(&status) => Self::Permanent(error),
            _ => Self::System(error),
        }
    }
}
