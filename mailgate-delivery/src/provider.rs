//! HTTP client for the outbound mail provider.

use std::time::Duration;

use base64::{Engine as _, prelude::BASE64_STANDARD};
use mailgate_common::envelope::{Envelope, Mailbox};
use serde::{Deserialize, Serialize};

use crate::{
    MailerError,
    config::MailerConfig,
    mailer::{Mailer, SendResponse, SentEmail},
};

/// Response header carrying the id of an accepted message.
const MESSAGE_ID_HEADER: &str = "x-message-id";

/// One address seat as the provider's API expects it.
#[derive(Debug, Serialize)]
struct AddressPayload<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<&'a Mailbox> for AddressPayload<'a> {
    fn from(mailbox: &'a Mailbox) -> Self {
        Self {
            email: &mailbox.address,
            name: mailbox.name.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AttachmentPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<&'a str>,
    content_type: &'a str,
    /// Base64 of the attachment bytes; JSON cannot carry them raw.
    content: String,
}

/// Body of a send request.
#[derive(Debug, Serialize)]
struct SendPayload<'a> {
    from: AddressPayload<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<AddressPayload<'a>>,
    to: Vec<AddressPayload<'a>>,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentPayload<'a>>,
}

impl<'a> From<&'a Envelope> for SendPayload<'a> {
    fn from(envelope: &'a Envelope) -> Self {
        Self {
            from: envelope.sender().into(),
            reply_to: envelope.reply_to().map(AddressPayload::from),
            to: envelope.recipients().iter().map(AddressPayload::from).collect(),
            subject: envelope.subject(),
            text: envelope.text_body(),
            html: envelope.html_body(),
            attachments: envelope
                .attachments()
                .iter()
                .map(|attachment| AttachmentPayload {
                    filename: attachment.filename.as_deref(),
                    content_type: &attachment.content_type,
                    content: BASE64_STANDARD.encode(&attachment.body),
                })
                .collect(),
        }
    }
}

/// Send response body, consulted when the message id header is absent.
#[derive(Debug, Deserialize)]
struct SendReceipt {
    message_id: Option<String>,
}

/// [`Mailer`] over the provider's JSON API.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpMailer {
    /// Build a client for the configured provider.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &MailerConfig) -> Result<Self, MailerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, envelope: &Envelope) -> Result<SendResponse, MailerError> {
        let response = self
            .client
            .post(format!("{}/v1/email", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SendPayload::from(envelope))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailerError::Provider {
                status: status.as_u16(),
                body: response.text().await?,
            });
        }

        let header_id = response
            .headers()
            .get(MESSAGE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        let message_id = match header_id {
            Some(id) => id,
            None => response
                .json::<SendReceipt>()
                .await?
                .message_id
                .ok_or(MailerError::MissingMessageId)?,
        };

        Ok(SendResponse { message_id })
    }

    async fn get_email(&self, message_id: &str) -> Result<SentEmail, MailerError> {
        let response = self
            .client
            .get(format!("{}/v1/messages/{message_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailerError::Provider {
                status: status.as_u16(),
                body: response.text().await?,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use mailgate_common::envelope::Envelope;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::SendPayload;

    const MULTIPART: &[u8] = b"From: Customer Support <support@acme.test>\r\n\
To: intake@mailgate.test\r\n\
Subject: Your invoice\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
--outer\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
The invoice is attached.\r\n\
--outer\r\n\
Content-Type: application/pdf\r\n\
Content-Disposition: attachment; filename=\"invoice.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0xLjQK\r\n\
--outer--\r\n";

    #[test]
    fn payload_matches_the_provider_shape() {
        let envelope = Envelope::parse(MULTIPART).unwrap();
        let payload = serde_json::to_value(SendPayload::from(&envelope)).unwrap();

        assert_eq!(
            payload["from"],
            json!({"email": "support@acme.test", "name": "Customer Support"})
        );
        assert_eq!(payload["to"], json!([{"email": "intake@mailgate.test"}]));
        assert_eq!(payload["subject"], json!("Your invoice"));
        assert!(
            payload["text"]
                .as_str()
                .unwrap()
                .starts_with("The invoice is attached.")
        );
        // An unsent inbound message has no reply-to and no HTML part
        assert_eq!(payload.get("reply_to"), None);
        assert_eq!(payload.get("html"), None);

        assert_eq!(
            payload["attachments"],
            json!([{
                "filename": "invoice.pdf",
                "content_type": "application/pdf",
                "content": "JVBERi0xLjQK",
            }])
        );
    }

    #[test]
    fn forwarded_payload_fills_the_reply_to_seat() {
        let envelope = Envelope::parse(MULTIPART).unwrap();
        let forwarded = envelope.forwarded(
            mailgate_common::envelope::Mailbox::new(None, "forwarder@mailgate.test"),
            |_| None,
        );

        let payload = serde_json::to_value(SendPayload::from(&forwarded)).unwrap();

        assert_eq!(payload["from"], json!({"email": "forwarder@mailgate.test"}));
        assert_eq!(
            payload["reply_to"],
            json!({"email": "support@acme.test", "name": "Customer Support"})
        );
    }
}
