//! User and email persistence.
//!
//! Two repository seams ([`UserStore`], [`EmailStore`]) with a Postgres
//! implementation for production and an in-memory implementation for
//! tests. Validation and normalization live on the models, so both
//! implementations enforce the same rules and differ only in storage.

pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use memory::{MemoryEmailStore, MemoryUserStore};
pub use model::{EmailRecord, NewEmailRecord, NewUser, User, UserSearchTerms};
pub use postgres::{PgEmailStore, PgUserStore, connect};
pub use store::{EmailStore, UserStore};
