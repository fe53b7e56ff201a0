//! HTTP surface for the mailgate service.
//!
//! A small JSON API over the user and email repositories, plus the
//! liveness endpoint deployments probe. The server binds eagerly and
//! drains through the shared cancellation token, so it participates in
//! the same coordinated shutdown as the consumer.

mod config;
mod error;
mod server;

pub use config::HttpConfig;
pub use error::{ApiError, HttpError};
pub use server::{AppState, HttpServer};
