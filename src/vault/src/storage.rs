//! Vault repository seam
//!
//! Every method takes the owning user id. A row that exists but belongs to
//! someone else is indistinguishable from a missing row.

use crate::error::Result;
use crate::models::{EncryptedFields, ItemId, StoredVaultItem, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Persistence for encrypted vault rows
#[async_trait]
pub trait VaultRepository: Send + Sync {
    /// All rows of `owner`, most recently created first
    async fn list(&self, owner: UserId) -> Result<Vec<StoredVaultItem>>;

    /// A single row if it exists and belongs to `owner`
    async fn find(&self, owner: UserId, id: ItemId) -> Result<Option<StoredVaultItem>>;

    /// Insert a new row for `owner`
    async fn insert(&self, owner: UserId, fields: EncryptedFields) -> Result<StoredVaultItem>;

    /// Replace every column of an owned row; `None` when absent or foreign
    async fn update(
        &self,
        owner: UserId,
        id: ItemId,
        fields: EncryptedFields,
    ) -> Result<Option<StoredVaultItem>>;

    /// Hard delete an owned row; `false` when absent or foreign
    async fn delete(&self, owner: UserId, id: ItemId) -> Result<bool>;
}

/// In-memory vault repository
pub struct InMemoryVaultRepository {
    items: Arc<RwLock<BTreeMap<ItemId, StoredVaultItem>>>,
    next_id: AtomicI64,
}

impl InMemoryVaultRepository {
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: AtomicI64::new(1),
        }
    }

    /// Raw rows of every owner, for inspecting what is actually stored
    pub async fn snapshot(&self) -> Vec<StoredVaultItem> {
        self.items.read().await.values().cloned().collect()
    }

    /// Overwrite a stored row as-is (simulates corruption in tests)
    pub async fn put_raw(&self, row: StoredVaultItem) {
        self.items.write().await.insert(row.id, row);
    }
}

impl Default for InMemoryVaultRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultRepository for InMemoryVaultRepository {
    async fn list(&self, owner: UserId) -> Result<Vec<StoredVaultItem>> {
        let items = self.items.read().await;

        let mut owned: Vec<StoredVaultItem> = items
            .values()
            .filter(|item| item.user_id == owner)
            .cloned()
            .collect();

        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(owned)
    }

    async fn find(&self, owner: UserId, id: ItemId) -> Result<Option<StoredVaultItem>> {
        let items = self.items.read().await;
        Ok(items.get(&id).filter(|item| item.user_id == owner).cloned())
    }

    async fn insert(&self, owner: UserId, fields: EncryptedFields) -> Result<StoredVaultItem> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();

        let row = StoredVaultItem {
            id,
            user_id: owner,
            title: fields.title,
            username: fields.username,
            password: fields.password,
            url: fields.url,
            notes: fields.notes,
            created_at: now,
            updated_at: now,
        };

        self.items.write().await.insert(id, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        owner: UserId,
        id: ItemId,
        fields: EncryptedFields,
    ) -> Result<Option<StoredVaultItem>> {
        let mut items = self.items.write().await;

        let Some(row) = items.get_mut(&id).filter(|item| item.user_id == owner) else {
            return Ok(None);
        };

        row.title = fields.title;
        row.username = fields.username;
        row.password = fields.password;
        row.url = fields.url;
        row.notes = fields.notes;
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }

    async fn delete(&self, owner: UserId, id: ItemId) -> Result<bool> {
        let mut items = self.items.write().await;

        match items.get(&id) {
            Some(item) if item.user_id == owner => {
                items.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str) -> EncryptedFields {
        EncryptedFields {
            title: title.to_string(),
            username: Some("c2VhbGVk".to_string()),
            password: None,
            url: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_timestamps() {
        let repo = InMemoryVaultRepository::new();

        let first = repo.insert(1, fields("a")).await.unwrap();
        let second = repo.insert(1, fields("b")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.user_id, 1);
        assert_eq!(first.created_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_list_scoped_and_newest_first() {
        let repo = InMemoryVaultRepository::new();

        repo.insert(1, fields("first")).await.unwrap();
        repo.insert(2, fields("foreign")).await.unwrap();
        repo.insert(1, fields("second")).await.unwrap();

        let titles: Vec<String> = repo
            .list(1)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.title)
            .collect();

        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_find_hides_foreign_rows() {
        let repo = InMemoryVaultRepository::new();
        let row = repo.insert(1, fields("mine")).await.unwrap();

        assert!(repo.find(1, row.id).await.unwrap().is_some());
        assert!(repo.find(2, row.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_all_columns() {
        let repo = InMemoryVaultRepository::new();
        let row = repo.insert(1, fields("old")).await.unwrap();

        let updated = repo
            .update(
                1,
                row.id,
                EncryptedFields {
                    title: "new".to_string(),
                    username: None,
                    password: None,
                    url: None,
                    notes: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "new");
        assert_eq!(updated.username, None);
        assert_eq!(updated.created_at, row.created_at);
        assert!(updated.updated_at >= row.updated_at);
    }

    #[tokio::test]
    async fn test_update_and_delete_refuse_foreign_rows() {
        let repo = InMemoryVaultRepository::new();
        let row = repo.insert(1, fields("mine")).await.unwrap();

        assert!(repo.update(2, row.id, fields("stolen")).await.unwrap().is_none());
        assert!(!repo.delete(2, row.id).await.unwrap());
        assert_eq!(repo.find(1, row.id).await.unwrap().unwrap().title, "mine");
    }

    #[tokio::test]
    async fn test_delete_is_hard() {
        let repo = InMemoryVaultRepository::new();
        let row = repo.insert(1, fields("gone")).await.unwrap();

        assert!(repo.delete(1, row.id).await.unwrap());
        assert!(!repo.delete(1, row.id).await.unwrap());
        assert!(repo.snapshot().await.is_empty());
    }
}
