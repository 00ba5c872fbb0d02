//! Best-effort audit recorder
//!
//! `record` returns an [`AuditOutcome`] instead of a `Result`: a failed or
//! slow write is logged here and reported as `Dropped`, so the primary
//! operation never has to handle it.

use crate::error::{AuditError, Result};
use crate::models::{AuditAction, AuditLog, NewAuditEntry, RequestContext, UserId};
use crate::storage::AuditStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Upper bound on a single audit write
pub const DEFAULT_RECORD_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a best-effort audit write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    Recorded(AuditLog),
    Dropped { reason: String },
}

impl AuditOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AuditOutcome::Recorded(_))
    }

    pub fn entry(&self) -> Option<&AuditLog> {
        match self {
            AuditOutcome::Recorded(entry) => Some(entry),
            AuditOutcome::Dropped { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
    timeout: Duration,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self {
            store,
            timeout: DEFAULT_RECORD_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Append one row; never fails the caller
    pub async fn record(
        &self,
        actor: Option<UserId>,
        action: impl Into<String>,
        description: impl Into<String>,
        context: &RequestContext,
    ) -> AuditOutcome {
        let entry = NewAuditEntry::new(actor, action, description, context);
        Self::write(self.store.clone(), self.timeout, entry).await
    }

    /// Fire-and-forget variant of [`AuditRecorder::record`]
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_record(
        &self,
        actor: Option<UserId>,
        action: impl Into<String>,
        description: impl Into<String>,
        context: &RequestContext,
    ) -> JoinHandle<AuditOutcome> {
        let entry = NewAuditEntry::new(actor, action, description, context);
        let store = self.store.clone();
        let timeout = self.timeout;

        tokio::spawn(async move { Self::write(store, timeout, entry).await })
    }

    /// Rows of `actor`, most recent first
    pub async fn list(&self, actor: UserId) -> Result<Vec<AuditLog>> {
        self.store.list_for(actor).await
    }

    pub async fn user_login(&self, actor: UserId, context: &RequestContext) -> AuditOutcome {
        self.record(Some(actor), AuditAction::UserLogin, "User logged in", context)
            .await
    }

    pub async fn user_logout(&self, actor: UserId, context: &RequestContext) -> AuditOutcome {
        self.record(Some(actor), AuditAction::UserLogout, "User logged out", context)
            .await
    }

    pub async fn user_registered(
        &self,
        actor: UserId,
        name: &str,
        context: &RequestContext,
    ) -> AuditOutcome {
        self.record(
            Some(actor),
            AuditAction::UserRegistered,
            format!("New user registered: {}", name),
            context,
        )
        .await
    }

    async fn write(
        store: Arc<dyn AuditStore>,
        timeout: Duration,
        entry: NewAuditEntry,
    ) -> AuditOutcome {
        let action = entry.action.clone();
        let actor = entry.user_id;

        let result = match tokio::time::timeout(timeout, store.append(entry)).await {
            Ok(result) => result,
            Err(_) => Err(AuditError::Timeout(timeout.as_millis() as u64)),
        };

        match result {
            Ok(row) => {
                debug!(audit_id = row.id, action = %action, actor = ?actor, "Audit entry recorded");
                AuditOutcome::Recorded(row)
            }
            Err(e) => {
                error!(action = %action, actor = ?actor, error = %e, "Audit log error");
                AuditOutcome::Dropped {
                    reason: e.to_string(),
                }
            }
        }
    }
}
