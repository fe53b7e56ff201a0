//! Configuration for the provider client and the forwarding rules.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const fn default_request_timeout() -> u64 {
    30
}

/// Connection settings for the outbound mail provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    /// Base URL of the provider's HTTP API, without a trailing slash.
    pub base_url: String,
    /// Bearer credential for the provider account.
    pub api_key: String,
    /// Upper bound on any single provider request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// Forwarding rules applied to every inbound envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Identity outbound mail is sent as. Providers reject senders from
    /// unverified domains, so the original sender travels in the
    /// reply-to seat instead.
    pub forward_from: String,
    /// Inbound address to forwarding destination. Recipients without an
    /// entry pass through unchanged.
    #[serde(default)]
    pub remap: HashMap<String, String>,
}

impl DeliveryConfig {
    /// The forwarding destination configured for `address`, if any.
    ///
    /// Addresses compare case-insensitively.
    #[must_use]
    pub fn destination(&self, address: &str) -> Option<&str> {
        self.remap
            .iter()
            .find(|(inbound, _)| inbound.eq_ignore_ascii_case(address))
            .map(|(_, destination)| destination.as_str())
    }
}
