//! Postgres-backed repositories.

use std::time::Duration;

use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::StoreConfig,
    error::{Result, StoreError},
    model::{EmailRecord, NewEmailRecord, NewUser, User, UserSearchTerms, parse_id},
    store::{EmailStore, UserStore},
};

/// Open a connection pool and verify the database is reachable.
///
/// Connecting eagerly means a bad database configuration fails startup
/// instead of the first request.
///
/// # Errors
///
/// `Internal` when the database cannot be reached within the
/// configured timeout.
pub async fn connect(config: &StoreConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .connect(&config.url)
        .await?;

    Ok(pool)
}

/// [`UserStore`] backed by a Postgres `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create the store and ensure its table exists.
    ///
    /// # Errors
    ///
    /// `Internal` when the table cannot be created.
    pub async fn try_new(pool: PgPool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        debug!("Ensured users table exists");

        Ok(Self { pool })
    }

    fn row_to_user(row: &PgRow) -> Result<User> {
        Ok(User {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        new_user.validate()?;
        let NewUser {
            first_name,
            last_name,
            email,
            password,
        } = new_user.normalised();

        let user = User {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
            password,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, password, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<User> {
        let id = parse_id(id)?;

        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("no user {id}")))?;

        Self::row_to_user(&row)
    }

    async fn search_user(&self, terms: UserSearchTerms) -> Result<User> {
        let Some(email) = terms.email else {
            return Err(StoreError::BadInput("no search terms".to_string()));
        };
        let email = email.to_lowercase();

        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("no user with email {email}")))?;

        Self::row_to_user(&row)
    }
}

/// [`EmailStore`] backed by a Postgres `emails` table.
#[derive(Debug, Clone)]
pub struct PgEmailStore {
    pool: PgPool,
}

impl PgEmailStore {
    /// Create the store and ensure its table exists.
    ///
    /// # Errors
    ///
    /// `Internal` when the table cannot be created.
    pub async fn try_new(pool: PgPool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS emails (
                id UUID PRIMARY KEY,
                message_id TEXT NOT NULL UNIQUE,
                sender TEXT NOT NULL,
                recipients TEXT[] NOT NULL,
                subject TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        debug!("Ensured emails table exists");

        Ok(Self { pool })
    }

    fn row_to_email(row: &PgRow) -> Result<EmailRecord> {
        Ok(EmailRecord {
            id: row.try_get("id")?,
            message_id: row.try_get("message_id")?,
            sender: row.try_get("sender")?,
            recipients: row.try_get("recipients")?,
            subject: row.try_get("subject")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait::async_trait]
impl EmailStore for PgEmailStore {
    async fn create_email(&self, record: NewEmailRecord) -> Result<EmailRecord> {
        record.validate()?;
        let NewEmailRecord {
            message_id,
            sender,
            recipients,
            subject,
        } = record;

        let record = EmailRecord {
            id: Uuid::new_v4(),
            message_id,
            sender,
            recipients,
            subject,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO emails (id, message_id, sender, recipients, subject, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(&record.message_id)
        .bind(&record.sender)
        .bind(&record.recipients)
        .bind(&record.subject)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_email(&self, id: &str) -> Result<EmailRecord> {
        let id = parse_id(id)?;

        let row = sqlx::query("SELECT * FROM emails WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("no email {id}")))?;

        Self::row_to_email(&row)
    }

    async fn find_by_message_id(&self, message_id: &str) -> Result<EmailRecord> {
        let row = sqlx::query("SELECT * FROM emails WHERE message_id = $1")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!("no email with message id {message_id}"))
            })?;

        Self::row_to_email(&row)
    }
}
