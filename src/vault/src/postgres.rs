//! PostgreSQL vault repository

use crate::error::Result;
use crate::models::{EncryptedFields, ItemId, StoredVaultItem, UserId};
use crate::storage::VaultRepository;
use async_trait::async_trait;
use sqlx::postgres::PgPool;

const COLUMNS: &str = "id, user_id, title, username, password, url, notes, created_at, updated_at";

/// Vault repository over the `vault_items` table
///
/// # Schema
///
/// ```sql
/// CREATE TABLE vault_items (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL,
///     title VARCHAR(255) NOT NULL,
///     username TEXT,
///     password TEXT,
///     url VARCHAR(255),
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX idx_vault_items_user_id ON vault_items (user_id);
/// ```
#[derive(Clone)]
pub struct PostgresVaultRepository {
    pool: PgPool,
}

impl PostgresVaultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get database pool for advanced queries
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VaultRepository for PostgresVaultRepository {
    async fn list(&self, owner: UserId) -> Result<Vec<StoredVaultItem>> {
        let rows = sqlx::query_as::<_, StoredVaultItem>(&format!(
            "SELECT {} FROM vault_items WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find(&self, owner: UserId, id: ItemId) -> Result<Option<StoredVaultItem>> {
        let row = sqlx::query_as::<_, StoredVaultItem>(&format!(
            "SELECT {} FROM vault_items WHERE id = $1 AND user_id = $2",
            COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert(&self, owner: UserId, fields: EncryptedFields) -> Result<StoredVaultItem> {
        let row = sqlx::query_as::<_, StoredVaultItem>(&format!(
            r#"
            INSERT INTO vault_items (user_id, title, username, password, url, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(owner)
        .bind(&fields.title)
        .bind(&fields.username)
        .bind(&fields.password)
        .bind(&fields.url)
        .bind(&fields.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(
        &self,
        owner: UserId,
        id: ItemId,
        fields: EncryptedFields,
    ) -> Result<Option<StoredVaultItem>> {
        let row = sqlx::query_as::<_, StoredVaultItem>(&format!(
            r#"
            UPDATE vault_items
            SET title = $3, username = $4, password = $5, url = $6, notes = $7, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .bind(&fields.title)
        .bind(&fields.username)
        .bind(&fields.password)
        .bind(&fields.url)
        .bind(&fields.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, owner: UserId, id: ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vault_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
