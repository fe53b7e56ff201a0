//! Error types for the mailgate-common crate.

use thiserror::Error;

/// Errors that can occur while decoding an inbound message into an
/// [`Envelope`](crate::envelope::Envelope).
///
/// All of these are terminal for the message that produced them: a payload
/// that fails to decode will fail to decode on redelivery as well.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The raw payload is not parseable MIME.
    #[error("Failed to parse message: {0}")]
    Parse(#[from] mailparse::MailParseError),

    /// The message carries no usable `From` address.
    #[error("Message has no sender address")]
    MissingSender,

    /// The message carries no `To` or `Cc` recipients.
    #[error("Message has no recipients")]
    NoRecipients,
}

/// Errors that can occur while coordinating shutdown.
///
/// Failures inside individual cleanup handlers are logged by the
/// coordinator rather than surfaced here; this only covers failing to set
/// the coordinator up in the first place.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Failed to register an OS signal handler.
    #[error("Failed to register signal handler: {0}")]
    Signal(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_error_display() {
        let err = EnvelopeError::MissingSender;
        assert_eq!(err.to_string(), "Message has no sender address");

        let err = EnvelopeError::NoRecipients;
        assert_eq!(err.to_string(), "Message has no recipients");
    }

    #[test]
    fn test_shutdown_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = ShutdownError::Signal(io_err);
        assert_eq!(
            err.to_string(),
            "Failed to register signal handler: access denied"
        );
    }
}
