//! # Vaultkeeper Vault Module
//!
//! Owner-scoped storage of credential records with field-level encryption.
//!
//! ## Features
//!
//! - **Field Encryption**: username, password and notes are sealed one by one
//!   with AES-256-GCM under a fresh nonce; title and url stay in plaintext
//! - **Owner Scoping**: every repository call takes the owning user id
//! - **Validation**: field-keyed messages for malformed input
//! - **Storage Backends**: in-memory and PostgreSQL repositories
//!
//! ## Module Structure
//!
//! ```text
//! vault/
//! ├── keys       - Application key material
//! ├── cipher     - Authenticated field cipher
//! ├── models     - Records, drafts and input validation
//! ├── storage    - Repository trait and in-memory backend
//! ├── postgres   - PostgreSQL backend (feature `postgres`)
//! └── store      - VaultStore service (list/create/update/delete)
//! ```

pub mod cipher;
pub mod error;
pub mod keys;
pub mod models;
pub mod storage;
pub mod store;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use cipher::{AesGcmCipher, FieldCipher};
pub use error::{FieldErrors, Result, VaultError};
pub use keys::VaultKey;
pub use models::{
    DeletedVaultItem, EncryptedFields, ItemId, StoredVaultItem, UserId, VaultItem, VaultItemDraft,
    VaultItemInput,
};
pub use storage::{InMemoryVaultRepository, VaultRepository};
pub use store::{ListFailurePolicy, VaultStore};

#[cfg(feature = "postgres")]
pub use postgres::PostgresVaultRepository;
