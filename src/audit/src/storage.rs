//! Append-only audit storage
//!
//! The trait exposes no update or delete.

use crate::error::Result;
use crate::models::{AuditLog, NewAuditEntry, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one row
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLog>;

    /// Rows of `actor`, most recent first
    async fn list_for(&self, actor: UserId) -> Result<Vec<AuditLog>>;
}

/// In-memory audit store
#[derive(Default)]
pub struct InMemoryAuditStore {
    rows: Arc<RwLock<Vec<AuditLog>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows across all actors
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLog> {
        let mut rows = self.rows.write().await;

        let row = AuditLog {
            id: rows.len() as i64 + 1,
            user_id: entry.user_id,
            action: entry.action,
            description: entry.description,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at: Utc::now(),
        };

        rows.push(row.clone());
        Ok(row)
    }

    async fn list_for(&self, actor: UserId) -> Result<Vec<AuditLog>> {
        let rows = self.rows.read().await;

        // Rows are appended in id order, so reverse iteration is newest first
        Ok(rows
            .iter()
            .rev()
            .filter(|row| row.user_id == Some(actor))
            .cloned()
            .collect())
    }
}
