use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use vaultkeeper_audit::AuditError;
use vaultkeeper_vault::{FieldErrors, VaultError};

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Vault item not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Carries only the generic message shown to the client
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map a vault failure, hiding anything the user cannot act on
    ///
    /// `failure` is the client-facing message; the underlying error is logged.
    pub fn from_vault(err: VaultError, failure: &str) -> Self {
        match err {
            VaultError::Validation(fields) => ApiError::Validation(fields),
            VaultError::NotFound => ApiError::NotFound,
            other => {
                error!(error = %other, "{}", failure);
                ApiError::Internal(failure.to_string())
            }
        }
    }

    pub fn from_audit(err: AuditError, failure: &str) -> Self {
        error!(error = %err, "{}", failure);
        ApiError::Internal(failure.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(FieldErrors::from(errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation(fields) => Json(json!({
                "error": "Validation failed",
                "messages": fields,
            })),
            other => Json(json!({
                "error": other.to_string(),
            })),
        };

        (status, body).into_response()
    }
}
