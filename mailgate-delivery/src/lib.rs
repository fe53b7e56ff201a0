//! Forwarding of inbound mail through an outbound provider.
//!
//! This crate owns:
//! - the mail transport seam ([`Mailer`]) and its HTTP provider client
//! - the forwarding step that rewrites an inbound envelope onto the
//!   configured destination and classifies the provider's verdict
//! - the record handler gluing decode and forward onto the intake
//!   consumer

mod config;
mod error;
mod forward;
mod inbound;
mod mailer;
mod mock;
mod provider;

pub use config::{DeliveryConfig, MailerConfig};
pub use error::{DeliveryError, MailerError};
pub use forward::{SendOutcome, forward_inbound};
pub use inbound::InboundEmailHandler;
pub use mailer::{Mailer, SendResponse, SentEmail};
pub use mock::MockMailer;
pub use provider::HttpMailer;
