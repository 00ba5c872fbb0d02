//! Vault records, drafts and input validation

use crate::error::{FieldErrors, Result, VaultError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Authenticated user identifier supplied by the identity provider
pub type UserId = i64;

/// Vault item primary key
pub type ItemId = i64;

/// Vault item as persisted; `username`, `password` and `notes` hold ciphertext
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct StoredVaultItem {
    pub id: ItemId,
    pub user_id: UserId,
    pub title: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vault item as presented to its owner, secrets in plaintext
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultItem {
    pub id: ItemId,
    pub title: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VaultItem {
    /// Combine the identity and timestamps of a stored row with the
    /// plaintext values of a draft
    pub fn from_draft(stored: &StoredVaultItem, draft: VaultItemDraft) -> Self {
        Self {
            id: stored.id,
            title: draft.title,
            username: draft.username,
            password: draft.password,
            url: draft.url,
            notes: draft.notes,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

/// Column values handed to a repository on insert or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedFields {
    pub title: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
}

/// Confirmation returned by a hard delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedVaultItem {
    pub id: ItemId,
    pub title: String,
}

/// Raw create/update payload
///
/// Every field is optional at the serde level so a missing title surfaces as
/// a field-level validation message rather than a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct VaultItemInput {
    #[serde(default)]
    #[validate(
        required(message = "The title field is required."),
        length(max = 255, message = "The title field must not be greater than 255 characters.")
    )]
    pub title: Option<String>,

    #[serde(default)]
    #[validate(length(
        max = 255,
        message = "The username field must not be greater than 255 characters."
    ))]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    #[validate(
        url(message = "The url field must be a valid URL."),
        length(max = 255, message = "The url field must not be greater than 255 characters.")
    )]
    pub url: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl VaultItemInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Trim, drop empty values and validate
    ///
    /// Passwords are kept byte-for-byte; only an empty password is dropped.
    pub fn into_draft(self) -> Result<VaultItemDraft> {
        let normalized = VaultItemInput {
            title: trimmed(self.title),
            username: trimmed(self.username),
            password: self.password.filter(|p| !p.is_empty()),
            url: trimmed(self.url),
            notes: trimmed(self.notes),
        };

        normalized
            .validate()
            .map_err(|e| VaultError::Validation(FieldErrors::from(e)))?;

        let title = normalized.title.ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.add("title", "The title field is required.");
            VaultError::Validation(errors)
        })?;

        Ok(VaultItemDraft {
            title,
            username: normalized.username,
            password: normalized.password,
            url: normalized.url,
            notes: normalized.notes,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validated plaintext values ready for encryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultItemDraft {
    pub title: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
}
