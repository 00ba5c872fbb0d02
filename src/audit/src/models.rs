//! Audit rows and the action taxonomy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated user identifier supplied by the identity provider
pub type UserId = i64;

/// Known action tags
///
/// The recorder stores any string tag; this set is the convention callers
/// pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    UserLogin,
    UserLogout,
    UserRegistered,
    ViewedVault,
    CreatedVaultItem,
    UpdatedVaultItem,
    DeletedVaultItem,
}

impl AuditAction {
    pub const ALL: [AuditAction; 7] = [
        AuditAction::UserLogin,
        AuditAction::UserLogout,
        AuditAction::UserRegistered,
        AuditAction::ViewedVault,
        AuditAction::CreatedVaultItem,
        AuditAction::UpdatedVaultItem,
        AuditAction::DeletedVaultItem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserLogin => "user_login",
            AuditAction::UserLogout => "user_logout",
            AuditAction::UserRegistered => "user_registered",
            AuditAction::ViewedVault => "viewed_vault",
            AuditAction::CreatedVaultItem => "created_vault_item",
            AuditAction::UpdatedVaultItem => "updated_vault_item",
            AuditAction::DeletedVaultItem => "deleted_vault_item",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AuditAction> for String {
    fn from(action: AuditAction) -> Self {
        action.as_str().to_string()
    }
}

/// Request metadata captured by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// Audit row, never updated or removed once written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<UserId>,
    pub action: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub user_id: Option<UserId>,
    pub action: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditEntry {
    pub fn new(
        user_id: Option<UserId>,
        action: impl Into<String>,
        description: impl Into<String>,
        context: &RequestContext,
    ) -> Self {
        Self {
            user_id,
            action: action.into(),
            description: description.into(),
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
        }
    }
}
