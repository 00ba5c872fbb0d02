use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::Validate;
use vaultkeeper_audit::AuditLog;
use vaultkeeper_vault::{VaultItem, VaultItemInput};

/// Vault item create/update request
///
/// Updates replace the whole item: any field left out is cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct VaultItemRequest {
    /// Item title, stored in plaintext
    #[serde(default)]
    #[schema(example = "GitHub", max_length = 255)]
    pub title: Option<String>,

    #[serde(default)]
    #[schema(example = "alice", max_length = 255)]
    pub username: Option<String>,

    /// Stored exactly as sent, surrounding whitespace included
    #[serde(default)]
    pub password: Option<String>,

    /// Absolute URL, stored in plaintext
    #[serde(default)]
    #[schema(example = "https://github.com", max_length = 255)]
    pub url: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl From<VaultItemRequest> for VaultItemInput {
    fn from(req: VaultItemRequest) -> Self {
        VaultItemInput {
            title: req.title,
            username: req.username,
            password: req.password,
            url: req.url,
            notes: req.notes,
        }
    }
}

/// Vault item with secrets decrypted for its owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VaultItemResponse {
    pub id: i64,
    pub title: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VaultItem> for VaultItemResponse {
    fn from(item: VaultItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            username: item.username,
            password: item.password,
            url: item.url,
            notes: item.notes,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Audit log row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogResponse {
    pub id: i64,
    pub user_id: Option<i64>,
    #[schema(example = "created_vault_item")]
    pub action: String,
    #[schema(example = "Created vault item: GitHub")]
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(log: AuditLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            action: log.action,
            description: log.description,
            ip_address: log.ip_address,
            user_agent: log.user_agent,
            created_at: log.created_at,
        }
    }
}

/// Registration event reported by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisteredRequest {
    /// Display name of the new user
    #[validate(length(
        min = 1,
        max = 255,
        message = "The name field must be between 1 and 255 characters."
    ))]
    #[schema(example = "Alice")]
    #[serde(default)]
    pub name: String,
}

impl RegisteredRequest {
    /// Trim surrounding whitespace so blank names fail validation
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Validation error body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    #[schema(example = "Validation failed")]
    pub error: String,
    /// Messages keyed by field name
    pub messages: BTreeMap<String, Vec<String>>,
}
