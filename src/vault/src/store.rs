//! Vault store: owner-scoped CRUD with encryption at the read/write boundary

use crate::cipher::FieldCipher;
use crate::error::{Result, VaultError};
use crate::models::{
    DeletedVaultItem, EncryptedFields, ItemId, StoredVaultItem, UserId, VaultItem,
    VaultItemDraft, VaultItemInput,
};
use crate::storage::VaultRepository;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What `list` does when a stored secret cannot be decrypted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFailurePolicy {
    /// Fail the whole listing with `DecryptionError`
    #[default]
    FailFast,
    /// Log the item id and leave the item out
    SkipCorrupt,
}

/// Vault store service
pub struct VaultStore {
    repository: Arc<dyn VaultRepository>,
    cipher: Arc<dyn FieldCipher>,
    list_policy: ListFailurePolicy,
}

impl VaultStore {
    /// Create a store over a repository and the process-wide cipher
    pub fn new(repository: Arc<dyn VaultRepository>, cipher: Arc<dyn FieldCipher>) -> Self {
        Self {
            repository,
            cipher,
            list_policy: ListFailurePolicy::default(),
        }
    }

    pub fn with_list_policy(mut self, policy: ListFailurePolicy) -> Self {
        self.list_policy = policy;
        self
    }

    pub fn list_policy(&self) -> ListFailurePolicy {
        self.list_policy
    }

    /// All items of `owner`, newest first, secrets decrypted
    pub async fn list(&self, owner: UserId) -> Result<Vec<VaultItem>> {
        let rows = self.repository.list(owner).await?;
        let mut items = Vec::with_capacity(rows.len());

        for row in rows {
            let id = row.id;
            match self.decrypt_row(row) {
                Ok(item) => items.push(item),
                Err(e) => {
                    error!(owner, item_id = id, error = %e, "Failed to decrypt vault item");
                    match self.list_policy {
                        ListFailurePolicy::FailFast => return Err(e),
                        ListFailurePolicy::SkipCorrupt => {
                            warn!(owner, item_id = id, "Skipping undecryptable vault item");
                        }
                    }
                }
            }
        }

        debug!(owner, count = items.len(), "Listed vault items");
        Ok(items)
    }

    /// Validate, encrypt and persist a new item
    ///
    /// The returned secrets are the values just supplied, not a decryption of
    /// what was stored.
    pub async fn create(&self, owner: UserId, input: VaultItemInput) -> Result<VaultItem> {
        let draft = input.into_draft()?;
        let fields = self.seal(&draft)?;

        let row = self.repository.insert(owner, fields).await?;

        debug!(owner, item_id = row.id, "Created vault item");
        Ok(VaultItem::from_draft(&row, draft))
    }

    /// Replace every field of an owned item
    ///
    /// Ownership is checked before validation. Fields missing from `input`
    /// are cleared, not preserved.
    pub async fn update(
        &self,
        owner: UserId,
        id: ItemId,
        input: VaultItemInput,
    ) -> Result<VaultItem> {
        if self.repository.find(owner, id).await?.is_none() {
            return Err(VaultError::NotFound);
        }

        let draft = input.into_draft()?;
        let fields = self.seal(&draft)?;

        let row = self
            .repository
            .update(owner, id, fields)
            .await?
            .ok_or(VaultError::NotFound)?;

        debug!(owner, item_id = id, "Updated vault item");
        Ok(VaultItem::from_draft(&row, draft))
    }

    /// Hard delete an owned item
    pub async fn delete(&self, owner: UserId, id: ItemId) -> Result<DeletedVaultItem> {
        let row = self
            .repository
            .find(owner, id)
            .await?
            .ok_or(VaultError::NotFound)?;

        if !self.repository.delete(owner, id).await? {
            return Err(VaultError::NotFound);
        }

        debug!(owner, item_id = id, "Deleted vault item");
        Ok(DeletedVaultItem {
            id,
            title: row.title,
        })
    }

    fn seal(&self, draft: &VaultItemDraft) -> Result<EncryptedFields> {
        Ok(EncryptedFields {
            title: draft.title.clone(),
            username: self.seal_field(draft.username.as_deref())?,
            password: self.seal_field(draft.password.as_deref())?,
            url: draft.url.clone(),
            notes: self.seal_field(draft.notes.as_deref())?,
        })
    }

    fn seal_field(&self, value: Option<&str>) -> Result<Option<String>> {
        value.map(|v| self.cipher.encrypt(v)).transpose()
    }

    fn open_field(&self, value: Option<String>) -> Result<Option<String>> {
        value.map(|v| self.cipher.decrypt(&v)).transpose()
    }

    fn decrypt_row(&self, row: StoredVaultItem) -> Result<VaultItem> {
        Ok(VaultItem {
            id: row.id,
            title: row.title,
            username: self.open_field(row.username)?,
            password: self.open_field(row.password)?,
            url: row.url,
            notes: self.open_field(row.notes)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
