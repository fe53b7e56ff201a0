//! Shared infrastructure for the end-to-end tests.

pub mod provider;

pub use provider::StubProvider;
