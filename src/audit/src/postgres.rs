//! PostgreSQL audit store

use crate::error::Result;
use crate::models::{AuditLog, NewAuditEntry, UserId};
use crate::storage::AuditStore;
use async_trait::async_trait;
use sqlx::postgres::PgPool;

/// Audit store over the `audit_logs` table
///
/// # Schema
///
/// ```sql
/// CREATE TABLE audit_logs (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT,
///     action VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     ip_address VARCHAR(45),
///     user_agent TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX idx_audit_logs_user_id ON audit_logs (user_id);
/// ```
#[derive(Clone)]
pub struct PostgresAuditStore {
    pool: PgPool,
}

impl PostgresAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AuditStore for PostgresAuditStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLog> {
        let row = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (user_id, action, description, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, user_id, action, description, ip_address, user_agent, created_at
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.description)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_for(&self, actor: UserId) -> Result<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, user_id, action, description, ip_address, user_agent, created_at
            FROM audit_logs
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(actor)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
