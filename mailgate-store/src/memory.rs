//! In-memory repositories for tests and local runs.
//!
//! These share the validation and normalization path with the Postgres
//! stores, so a handler tested against them sees the same error
//! classes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    error::{Result, StoreError},
    model::{EmailRecord, NewEmailRecord, NewUser, User, UserSearchTerms, parse_id},
    store::{EmailStore, UserStore},
};

/// [`UserStore`] over a map.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        new_user.validate()?;
        let NewUser {
            first_name,
            last_name,
            email,
            password,
        } = new_user.normalised();

        let mut users = self.users.write();
        if users.values().any(|user| user.email == email) {
            return Err(StoreError::Conflict(format!("duplicate email {email}")));
        }

        let user = User {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
            password,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<User> {
        let id = parse_id(id)?;

        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("no user {id}")))
    }

    async fn search_user(&self, terms: UserSearchTerms) -> Result<User> {
        let Some(email) = terms.email else {
            return Err(StoreError::BadInput("no search terms".to_string()));
        };
        let email = email.to_lowercase();

        self.users
            .read()
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("no user with email {email}")))
    }
}

/// [`EmailStore`] over a map.
#[derive(Debug, Default)]
pub struct MemoryEmailStore {
    emails: RwLock<HashMap<Uuid, EmailRecord>>,
}

impl MemoryEmailStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmailStore for MemoryEmailStore {
    async fn create_email(&self, record: NewEmailRecord) -> Result<EmailRecord> {
        record.validate()?;
        let NewEmailRecord {
            message_id,
            sender,
            recipients,
            subject,
        } = record;

        let mut emails = self.emails.write();
        if emails.values().any(|email| email.message_id == message_id) {
            return Err(StoreError::Conflict(format!(
                "duplicate message id {message_id}"
            )));
        }

        let record = EmailRecord {
            id: Uuid::new_v4(),
            message_id,
            sender,
            recipients,
            subject,
            created_at: Utc::now(),
        };
        emails.insert(record.id, record.clone());

        Ok(record)
    }

    async fn get_email(&self, id: &str) -> Result<EmailRecord> {
        let id = parse_id(id)?;

        self.emails
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("no email {id}")))
    }

    async fn find_by_message_id(&self, message_id: &str) -> Result<EmailRecord> {
        self.emails
            .read()
            .values()
            .find(|email| email.message_id == message_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("no email with message id {message_id}"))
            })
    }
}
