//! Scriptable transport for tests.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use mailgate_common::envelope::Envelope;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{
    MailerError,
    mailer::{Mailer, SendResponse, SentEmail},
};

/// Scriptable [`Mailer`] for tests.
///
/// Records every envelope that reaches [`send`](Mailer::send), assigns
/// sequential message ids, and can be primed to fail with a chosen
/// provider status.
#[derive(Debug, Default)]
pub struct MockMailer {
    sent: Mutex<Vec<Envelope>>,
    emails: Mutex<HashMap<String, SentEmail>>,
    fail_status: Mutex<Option<u16>>,
    attempts: AtomicUsize,
    notify: Notify,
}

impl MockMailer {
    /// Create a mailer that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every following send with `status`.
    pub fn fail_with(&self, status: u16) {
        *self.fail_status.lock() = Some(status);
    }

    /// Accept every following send again.
    pub fn succeed(&self) {
        *self.fail_status.lock() = None;
    }

    /// Make `email` available to [`get_email`](Mailer::get_email).
    pub fn prime_email(&self, email: SentEmail) {
        self.emails.lock().insert(email.id.clone(), email);
    }

    /// How many times `send` was invoked, accepted or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Envelopes the mailer accepted, in send order.
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().clone()
    }

    /// Wait until at least `expected` envelopes have been accepted.
    ///
    /// Returns `false` if the timeout passes first.
    pub async fn wait_for_sends(&self, expected: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                if self.sent.lock().len() >= expected {
                    return;
                }
                self.notify.notified().await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, envelope: &Envelope) -> Result<SendResponse, MailerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = *self.fail_status.lock() {
            return Err(MailerError::Provider {
                status,
                body: "scripted failure".to_string(),
            });
        }

        let mut sent = self.sent.lock();
        sent.push(envelope.clone());
        let message_id = format!("mock-{}", sent.len());
        drop(sent);

        self.notify.notify_one();

        Ok(SendResponse { message_id })
    }

    async fn get_email(&self, message_id: &str) -> Result<SentEmail, MailerError> {
        self.emails
            .lock()
            .get(message_id)
            .cloned()
            .ok_or_else(|| MailerError::Provider {
                status: 404,
                body: format!("no message {message_id}"),
            })
    }
}
