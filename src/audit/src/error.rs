//! Error types for the audit module

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Audit write timed out after {0} ms")]
    Timeout(u64),
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for AuditError {
    fn from(err: sqlx::Error) -> Self {
        AuditError::Persistence(err.to_string())
    }
}
