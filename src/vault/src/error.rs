//! Error types for the vault module

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Malformed or missing input, correctable by the user
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Record absent or owned by someone else
    #[error("Vault item not found")]
    NotFound,

    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Integrity check failed or the key does not match the ciphertext
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Storage unavailable; the caller may retry
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl VaultError {
    /// True for errors the end user can fix by changing the request
    pub fn is_user_error(&self) -> bool {
        matches!(self, VaultError::Validation(_) | VaultError::NotFound)
    }
}

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = match &err.message {
                    Some(message) => message.to_string(),
                    None => format!("The {} field is invalid.", field),
                };
                fields.add(field.to_string(), message);
            }
        }
        fields
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for VaultError {
    fn from(err: sqlx::Error) -> Self {
        VaultError::Persistence(err.to_string())
    }
}
