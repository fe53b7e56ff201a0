//! Repository models, validation, and normalization.
//!
//! Validation lives here rather than in the store implementations so
//! Postgres and the in-memory stores cannot drift apart on what they
//! accept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Stored, never serialized back out.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Full display name.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A user creation request, before validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// Check that every field is present and the email looks like one.
    ///
    /// # Errors
    ///
    /// `BadInput` naming the offending field by its wire name.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::BadInput(format!("required {field} is blank")));
            }
        }

        if !is_email(&self.email) {
            return Err(StoreError::BadInput("invalid email".to_string()));
        }

        Ok(())
    }

    /// The same request with casing fixed: names title-cased, email
    /// lowercased.
    #[must_use]
    pub fn normalised(self) -> Self {
        Self {
            first_name: title_case(&self.first_name),
            last_name: title_case(&self.last_name),
            email: self.email.to_lowercase(),
            password: self.password,
        }
    }
}

/// Terms for looking up a single user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserSearchTerms {
    /// Returns `true` when there is nothing to search by.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
    }
}

/// The stored record of one forwarded email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub id: Uuid,
    /// Identifier the sending provider assigned on acceptance.
    pub message_id: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

/// An email record about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmailRecord {
    pub message_id: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
}

impl NewEmailRecord {
    /// Check the record can be keyed and attributed.
    ///
    /// # Errors
    ///
    /// `BadInput` naming the offending field by its wire name.
    pub fn validate(&self) -> Result<()> {
        if self.message_id.trim().is_empty() {
            return Err(StoreError::BadInput(
                "required messageId is blank".to_string(),
            ));
        }
        if self.recipients.is_empty() {
            return Err(StoreError::BadInput(
                "required recipients is empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse an externally supplied record id.
///
/// Blank and malformed ids are the caller's mistake, not a miss.
pub(crate) fn parse_id(id: &str) -> Result<Uuid> {
    if id.is_empty() {
        return Err(StoreError::BadInput("required id is blank".to_string()));
    }

    Uuid::parse_str(id).map_err(|_| StoreError::BadInput("invalid id".to_string()))
}

/// First character upper, the rest lower.
fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

/// Just enough of a shape check to catch obviously broken addresses.
fn is_email(value: &str) -> bool {
    value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{NewEmailRecord, NewUser, User, UserSearchTerms, parse_id, title_case};

    fn new_user() -> NewUser {
        NewUser {
            first_name: "ada".to_string(),
            last_name: "LOVELACE".to_string(),
            email: "Ada.Lovelace@Example.COM".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn title_case_fixes_mixed_input() {
        assert_eq!(title_case("alICE"), "Alice");
        assert_eq!(title_case("b"), "B");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn normalised_fixes_names_and_email() {
        let user = new_user().normalised();

        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Lovelace");
        assert_eq!(user.email, "ada.lovelace@example.com");
        assert_eq!(user.password, "secret");
    }

    #[test]
    fn blank_fields_fail_validation_by_wire_name() {
        let mut user = new_user();
        user.first_name = "  ".to_string();

        let error = user.validate().unwrap_err();
        assert!(error.is_bad_input());
        assert_eq!(error.to_string(), "bad input: required firstName is blank");
    }

    #[test]
    fn email_must_have_two_sides() {
        for email in ["nodomainhere", "@example.com", "ada@"] {
            let mut user = new_user();
            user.email = email.to_string();
            assert!(user.validate().is_err(), "{email} should fail");
        }

        assert!(new_user().validate().is_ok());
    }

    #[test]
    fn ids_are_validated_before_lookup() {
        assert_eq!(
            parse_id("").unwrap_err().to_string(),
            "bad input: required id is blank"
        );
        assert_eq!(
            parse_id("not-a-uuid").unwrap_err().to_string(),
            "bad input: invalid id"
        );
        assert!(parse_id("00000000-0000-0000-0000-000000000000").is_ok());
    }

    #[test]
    fn user_name_joins_both_parts() {
        let user = User {
            id: uuid::Uuid::nil(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: String::new(),
            created_at: chrono::Utc::now(),
        };

        assert_eq!(user.name(), "Ada Lovelace");
    }

    #[test]
    fn user_serializes_without_the_password() {
        let user = User {
            id: uuid::Uuid::nil(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            created_at: chrono::Utc::now(),
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["firstName"], serde_json::json!("Ada"));
        assert_eq!(value.get("password"), None);
    }

    #[test]
    fn search_terms_know_when_they_are_empty() {
        assert!(UserSearchTerms::default().is_empty());
        assert!(
            !UserSearchTerms {
                email: Some("ada@example.com".to_string()),
            }
            .is_empty()
        );
    }

    #[test]
    fn email_records_need_a_message_id_and_recipients() {
        let record = NewEmailRecord {
            message_id: String::new(),
            sender: "forwarder@mailgate.test".to_string(),
            recipients: vec!["member@example.com".to_string()],
            subject: "Hello".to_string(),
        };
        assert!(record.validate().unwrap_err().is_bad_input());

        let record = NewEmailRecord {
            message_id: "msg-1".to_string(),
            recipients: Vec::new(),
            ..record
        };
        assert!(record.validate().unwrap_err().is_bad_input());
    }
}
