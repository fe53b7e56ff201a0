//! Parsed MIME representation of an inbound message.

use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;

/// A single address seat, with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub name: Option<String>,
    pub address: String,
}

impl Mailbox {
    pub fn new(name: Option<String>, address: impl Into<String>) -> Self {
        Self {
            name,
            address: address.into(),
        }
    }

    /// The bare address, lowercased for comparison and lookup.
    pub fn normalised(&self) -> String {
        self.address.to_ascii_lowercase()
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

impl From<&mailparse::SingleInfo> for Mailbox {
    fn from(info: &mailparse::SingleInfo) -> Self {
        Self {
            name: info.display_name.clone(),
            address: info.addr.clone(),
        }
    }
}

/// A decoded attachment part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: Option<String>,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// A decoded inbound message.
///
/// Built exclusively by [`Envelope::parse`]; immutable afterwards apart
/// from the provider-assigned [`message_id`](Envelope::message_id), which
/// is only known once the message has been handed off for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    sender: Mailbox,
    reply_to: Option<Mailbox>,
    recipients: Vec<Mailbox>,
    subject: String,
    text_body: Option<String>,
    html_body: Option<String>,
    attachments: Vec<Attachment>,
    message_id: Option<String>,
}

impl Envelope {
    /// Decode a raw MIME payload into an [`Envelope`].
    ///
    /// # Errors
    ///
    /// Fails if the payload is not parseable MIME, has no usable `From`
    /// address, or has neither `To` nor `Cc` recipients. An empty payload
    /// always fails.
    pub fn parse(raw: &[u8]) -> Result<Self, EnvelopeError> {
        let parsed = mailparse::parse_mail(raw)?;

        let sender = header_addresses(&parsed, "From")?
            .into_iter()
            .next()
            .ok_or(EnvelopeError::MissingSender)?;

        let reply_to = header_addresses(&parsed, "Reply-To")?.into_iter().next();

        let mut recipients = header_addresses(&parsed, "To")?;
        recipients.extend(header_addresses(&parsed, "Cc")?);

        if recipients.is_empty() {
            return Err(EnvelopeError::NoRecipients);
        }

        let subject = parsed
            .headers
            .get_first_value("Subject")
            .unwrap_or_default();

        let mut envelope = Self {
            sender,
            reply_to,
            recipients,
            subject,
            text_body: None,
            html_body: None,
            attachments: Vec::new(),
            message_id: None,
        };

        envelope.collect_parts(&parsed)?;

        Ok(envelope)
    }

    fn collect_parts(&mut self, part: &ParsedMail<'_>) -> Result<(), EnvelopeError> {
        if !part.subparts.is_empty() {
            for sub in &part.subparts {
                self.collect_parts(sub)?;
            }
            return Ok(());
        }

        let disposition = part.get_content_disposition();
        if disposition.disposition == DispositionType::Attachment {
            self.attachments.push(Attachment {
                filename: disposition.params.get("filename").cloned(),
                content_type: part.ctype.mimetype.clone(),
                body: part.get_body_raw()?,
            });
            return Ok(());
        }

        match part.ctype.mimetype.as_str() {
            "text/plain" => {
                if self.text_body.is_none() {
                    self.text_body = Some(part.get_body()?);
                }
            }
            "text/html" => {
                if self.html_body.is_none() {
                    self.html_body = Some(part.get_body()?);
                }
            }
            // Inline parts we don't render still travel with the message
            _ => self.attachments.push(Attachment {
                filename: disposition.params.get("filename").cloned(),
                content_type: part.ctype.mimetype.clone(),
                body: part.get_body_raw()?,
            }),
        }

        Ok(())
    }

    /// A copy of this message prepared for onward delivery.
    ///
    /// The copy is sent as `from`, keeps the original sender reachable
    /// through the reply-to seat, and runs every recipient through
    /// `remap`; recipients `remap` declines stay as they are.
    #[must_use]
    pub fn forwarded<F>(&self, from: Mailbox, remap: F) -> Self
    where
        F: Fn(&Mailbox) -> Option<Mailbox>,
    {
        let recipients = self
            .recipients
            .iter()
            .map(|recipient| remap(recipient).unwrap_or_else(|| recipient.clone()))
            .collect();

        Self {
            sender: from,
            reply_to: Some(self.sender.clone()),
            recipients,
            subject: self.subject.clone(),
            text_body: self.text_body.clone(),
            html_body: self.html_body.clone(),
            attachments: self.attachments.clone(),
            message_id: None,
        }
    }

    /// The sender taken from the message's `From` header.
    #[inline]
    pub const fn sender(&self) -> &Mailbox {
        &self.sender
    }

    /// The `Reply-To` seat, when one is set.
    #[inline]
    pub fn reply_to(&self) -> Option<&Mailbox> {
        self.reply_to.as_ref()
    }

    /// Every `To` and `Cc` recipient, in header order.
    #[inline]
    pub fn recipients(&self) -> &[Mailbox] {
        &self.recipients
    }

    #[inline]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[inline]
    pub fn text_body(&self) -> Option<&str> {
        self.text_body.as_deref()
    }

    #[inline]
    pub fn html_body(&self) -> Option<&str> {
        self.html_body.as_deref()
    }

    #[inline]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// The identifier the sending provider assigned to this message, if it
    /// has been sent.
    #[inline]
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn set_message_id(&mut self, id: impl Into<String>) {
        self.message_id = Some(id.into());
    }
}

fn header_addresses(
    mail: &ParsedMail<'_>,
    header: &str,
) -> Result<Vec<Mailbox>, EnvelopeError> {
    let Some(header) = mail.headers.get_first_header(header) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for addr in mailparse::addrparse_header(header)?.iter() {
        match addr {
            mailparse::MailAddr::Single(single) => out.push(Mailbox::from(single)),
            mailparse::MailAddr::Group(group) => {
                out.extend(group.addrs.iter().map(Mailbox::from));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{Envelope, Mailbox};
    use crate::error::EnvelopeError;

    #[test]
    fn parse_simple_message() {
        let raw = include_bytes!("../test/hello.eml");

        let envelope = Envelope::parse(raw).unwrap();

        assert_eq!(envelope.sender().address, "support@acme.test");
        assert_eq!(envelope.sender().name.as_deref(), Some("Customer Support"));
        assert_eq!(envelope.recipients().len(), 1);
        assert_eq!(envelope.recipients()[0].address, "intake@mailgate.test");
        assert_eq!(envelope.subject(), "Hello");
        assert_eq!(
            envelope.text_body().map(str::trim_end),
            Some("Hello from the outside.")
        );
        assert!(envelope.html_body().is_none());
        assert!(envelope.attachments().is_empty());
        assert!(envelope.message_id().is_none());
    }

    #[test]
    fn parse_multipart_message() {
        let raw = include_bytes!("../test/multipart.eml");

        let envelope = Envelope::parse(raw).unwrap();

        assert_eq!(envelope.subject(), "Your invoice");
        assert_eq!(envelope.recipients().len(), 2);
        assert_eq!(
            envelope.text_body().map(str::trim_end),
            Some("The invoice is attached.")
        );
        assert!(
            envelope
                .html_body()
                .is_some_and(|body| body.contains("<b>attached</b>"))
        );

        assert_eq!(envelope.attachments().len(), 1);
        let attachment = &envelope.attachments()[0];
        assert_eq!(attachment.filename.as_deref(), Some("invoice.pdf"));
        assert_eq!(attachment.content_type, "application/pdf");
        assert_eq!(attachment.body, b"%PDF-1.4\n");
    }

    #[test]
    fn parse_empty_payload_fails() {
        assert!(Envelope::parse(b"").is_err());
    }

    #[test]
    fn parse_without_sender_fails() {
        let raw = b"To: someone@example.com\r\nSubject: No sender\r\n\r\nBody\r\n";

        assert!(matches!(
            Envelope::parse(raw),
            Err(EnvelopeError::MissingSender)
        ));
    }

    #[test]
    fn parse_without_recipients_fails() {
        let raw = b"From: someone@example.com\r\nSubject: No recipients\r\n\r\nBody\r\n";

        assert!(matches!(
            Envelope::parse(raw),
            Err(EnvelopeError::NoRecipients)
        ));
    }

    #[test]
    fn forwarded_copy_rewrites_the_sender_seats() {
        let raw = include_bytes!("../test/hello.eml");
        let envelope = Envelope::parse(raw).unwrap();

        let forwarder = Mailbox::new(None, "forwarder@mailgate.test");
        let forwarded = envelope.forwarded(forwarder.clone(), |recipient| {
            (recipient.normalised() == "intake@mailgate.test")
                .then(|| Mailbox::new(None, "member@example.com"))
        });

        assert_eq!(forwarded.sender(), &forwarder);
        assert_eq!(forwarded.reply_to(), Some(envelope.sender()));
        assert_eq!(forwarded.recipients().len(), 1);
        assert_eq!(forwarded.recipients()[0].address, "member@example.com");
        assert_eq!(forwarded.subject(), envelope.subject());
        assert_eq!(forwarded.text_body(), envelope.text_body());
        assert!(forwarded.message_id().is_none());
    }

    #[test]
    fn forwarded_copy_keeps_unmapped_recipients() {
        let raw = include_bytes!("../test/multipart.eml");
        let envelope = Envelope::parse(raw).unwrap();

        let forwarded = envelope
            .forwarded(Mailbox::new(None, "forwarder@mailgate.test"), |_| None);

        assert_eq!(forwarded.recipients(), envelope.recipients());
    }

    #[test]
    fn mailbox_display() {
        let named = Mailbox::new(Some("Ada".to_string()), "ada@example.com");
        assert_eq!(named.to_string(), "Ada <ada@example.com>");

        let bare = Mailbox::new(None, "ada@example.com");
        assert_eq!(bare.to_string(), "ada@example.com");
    }

    #[test]
    fn mailbox_normalised_lowercases() {
        let mailbox = Mailbox::new(None, "Ada.Lovelace@Example.COM");
        assert_eq!(mailbox.normalised(), "ada.lovelace@example.com");
    }
}
