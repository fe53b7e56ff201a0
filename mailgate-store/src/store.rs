//! Repository seams.
//!
//! Ids cross these seams as strings so the repository itself gets to
//! classify a blank or malformed id as bad input rather than a miss.

use async_trait::async_trait;

use crate::{
    error::Result,
    model::{EmailRecord, NewEmailRecord, NewUser, User, UserSearchTerms},
};

/// Storage for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Validate, normalize, and persist a new user.
    ///
    /// # Errors
    ///
    /// `BadInput` for invalid requests, `Conflict` for a duplicate
    /// email, `Internal` when the backend fails.
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// `BadInput` for a blank or malformed id, `NotFound` when no user
    /// has it, `Internal` when the backend fails.
    async fn get_user(&self, id: &str) -> Result<User>;

    /// Find the single user matching the given terms.
    ///
    /// # Errors
    ///
    /// `BadInput` when the terms are empty, `NotFound` when nothing
    /// matches, `Internal` when the backend fails.
    async fn search_user(&self, terms: UserSearchTerms) -> Result<User>;
}

/// Storage for forwarded email records.
#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Validate and persist the record of a forwarded email.
    ///
    /// # Errors
    ///
    /// `BadInput` for invalid records, `Conflict` for a duplicate
    /// message id, `Internal` when the backend fails.
    async fn create_email(&self, record: NewEmailRecord) -> Result<EmailRecord>;

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// `BadInput` for a blank or malformed id, `NotFound` when no
    /// record has it, `Internal` when the backend fails.
    async fn get_email(&self, id: &str) -> Result<EmailRecord>;

    /// Fetch a record by the provider-assigned message id.
    ///
    /// # Errors
    ///
    /// `NotFound` when no record carries it, `Internal` when the
    /// backend fails.
    async fn find_by_message_id(&self, message_id: &str) -> Result<EmailRecord>;
}
